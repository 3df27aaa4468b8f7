//! # Trophies Server
//!
//! A headless host for the trophy pipeline.
//!
//! The core crate only sees collaborator traits. This crate supplies a
//! world behind them, two veto systems that react to real and simulated
//! breaks alike, and a session that drains a host event queue through the
//! pipeline once per tick.
//!
//! ```text
//! ┌────────────┐  HostEvent   ┌──────────────┐   BlockBreak   ┌──────────────┐
//! │ HostWorld  │─────────────>│ HostSession  │───────────────>│ DropDecision │
//! │ (players,  │<─────────────│  (tick loop) │<───────────────│   Pipeline   │
//! │  blocks)   │  drop/clear  └──────────────┘    Outcome     └──────┬───────┘
//! └────────────┘                                                     │
//!                             FastBreakMonitor, RegionGuard <────────┘
//!                                   (simulated break)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod events;
pub mod session;
pub mod settings;
pub mod veto;
pub mod world;

pub use trophies_core as engine;

pub use events::{EventBus, EventReceiver, EventSender, HostEvent, DEFAULT_CAPACITY};
pub use session::{BreakReport, HostSession, SessionStats};
pub use settings::{HostSettings, RegionBox, DEFAULT_FAST_BREAK_TICKS};
pub use veto::{Clock, FastBreakMonitor, RegionGuard};
pub use world::{BlockPos, HostWorld, WorldItem};
