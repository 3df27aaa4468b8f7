//! # Mining Trophies Core
//!
//! The trophy-drop decision pipeline.
//!
//! A "block was mined" fact goes in, an [`Outcome`] comes out. On the way
//! third parties get three synchronous checkpoints where they may observe,
//! modify or veto the decision.
//!
//! ## The Pipeline
//!
//! ```text
//! BlockBreak ──> Gates ──> Rate lookup ──> Modifier setup ──> Roll
//!                  │            │                               │
//!                  ▼            ▼                               ▼
//!            (ignored)    NoDrop(Gated)                 Roll checkpoint ──> NoDrop(FailedRoll)
//!                                                               │
//!                                                               ▼
//!                                   Simulated break (exemption window) ──> NoDrop(SimulatedVeto)
//!                                                               │
//!                                                               ▼
//!                                                      Reward checkpoint ──> NoDrop(Vetoed)
//!                                                               │
//!                                                               ▼
//!                                                      Dropped(item) + broadcast
//! ```
//!
//! ## Threading
//!
//! A decision runs to completion on the caller's thread. Observers run
//! inline and may mutate the record they are handed; strict sequencing,
//! not locking, keeps that sound. The only shared lookup structure, the
//! [`LoreIndex`], is built once at startup and is read-only afterwards.
//!
//! ## Example
//!
//! ```rust,ignore
//! use trophies_core::{Collaborators, DropDecisionPipeline, RngRolls};
//!
//! let pipeline = DropDecisionPipeline::new(collaborators);
//! let mut rolls = RngRolls::from_entropy();
//!
//! if let Some(outcome) = pipeline.handle_block_break(&mut event, &mut rolls) {
//!     tracing::info!(?outcome, "trophy decision");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod checkpoint;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod guards;
pub mod item;
pub mod mock;
pub mod modifier;
pub mod pipeline;
pub mod roll;
pub mod simulator;

pub use catalog::{strip_formatting, LoreIndex, TrophyKind};
pub use checkpoint::{
    BreakObserver, CheckpointError, CheckpointRegistry, PreAction, RewardObserver, RollObserver,
    TrophyDropEvent,
};
pub use collaborators::{
    Actor, ActorId, ActorKind, Block, BlockBreak, BreakOrigin, ConfigProvider, ExemptionAdapter,
    GameMode, ItemFactory, Location, NotificationSink, PermissionOracle, Recipient, Tool,
    WorldAccess,
};
pub use config::{SharedConfig, TomlConfig, DEFAULT_CONFIG};
pub use error::{TrophyError, TrophyResult};
pub use guards::TrophyGuards;
pub use item::{CatalogItemFactory, ItemStack, PotionData, PotionEffect, RewardOptions};
pub use modifier::{Modifier, ModifierChain, ModifierKind, BONUS_YIELD_KEY};
pub use pipeline::{
    Collaborators, DropDecisionPipeline, Gate, NoDropReason, Outcome, DEFAULT_DISALLOWED_TOOLS,
    PERMISSION_ALWAYS_REWARDED, PERMISSION_CAN_BE_REWARDED,
};
pub use roll::{FixedRolls, RngRolls, RollEvaluator, RollRecord, RollSource, UNCOMPUTED_RATE};
pub use simulator::{InteractionSimulator, SimulationReport, SuppressionWindow, FAST_BREAK_CHECK};
