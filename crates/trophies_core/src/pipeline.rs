//! # Drop Decision Pipeline
//!
//! One block break in, one [`Outcome`] out.
//!
//! ```text
//! Start ─> Gates ─> RateLookup ─> ModifierSetup ─> Roll ─> RollCheckpoint
//!            │          │                                      │
//!            ▼          ▼                                      ▼
//!      NoDrop(Gated) NoDrop(Gated)                    NoDrop(FailedRoll)
//!                                                              │
//!        Simulate ────────> NoDrop(SimulatedVeto) (real break cancelled)
//!            │
//!        RewardCheckpoint ─> NoDrop(Vetoed)
//!            │
//!        Dropped(item)  (broadcast, drop at block)
//! ```
//!
//! Simulated breaks are ignored outright: [`DropDecisionPipeline::handle_block_break`]
//! returns `None` for them so the simulator can never recurse into the
//! pipeline.
//!
//! Gates and a zero base rate short-circuit before any [`RollRecord`] is
//! built or any sample is drawn.

use std::sync::Arc;

use crate::catalog::TrophyKind;
use crate::checkpoint::{CheckpointRegistry, TrophyDropEvent};
use crate::collaborators::{
    Actor, ActorKind, BlockBreak, ConfigProvider, ExemptionAdapter, ItemFactory,
    NotificationSink, PermissionOracle, WorldAccess,
};
use crate::item::{ItemStack, RewardOptions};
use crate::modifier::{Modifier, BONUS_YIELD_KEY};
use crate::roll::{RollEvaluator, RollRecord, RollSource};
use crate::simulator::InteractionSimulator;

/// Tools that never earn trophies, whatever `disallowedtools` says.
pub const DEFAULT_DISALLOWED_TOOLS: &[&str] = &["SHEARS"];

/// Permission required to receive trophies at all.
pub const PERMISSION_CAN_BE_REWARDED: &str = "miningtrophies.canberewarded";

/// Permission that forces every roll to win.
pub const PERMISSION_ALWAYS_REWARDED: &str = "miningtrophies.alwaysrewarded";

/// Why a break was rejected before rolling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// The block has no trophy.
    NoTrophyMapping,
    /// Nobody broke the block.
    NoMiner,
    /// The breaker is not a player.
    NotRewardable,
    /// Someone upstream already cancelled the break.
    AlreadyCancelled,
    /// The miner is in a reward-exempt mode.
    ExemptMode,
    /// The miner lacks [`PERMISSION_CAN_BE_REWARDED`].
    MissingPermission,
    /// The held tool is in [`DEFAULT_DISALLOWED_TOOLS`] or on the
    /// `disallowedtools` list.
    DisallowedTool,
    /// The held tool has silk touch.
    BypassEnchantment,
    /// The configured base rate is exactly zero.
    ZeroRate,
}

/// Why no trophy was granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoDropReason {
    /// Rejected before rolling.
    Gated(Gate),
    /// The roll lost (after the roll checkpoint).
    FailedRoll,
    /// An observer vetoed the simulated break.
    SimulatedVeto,
    /// An observer cancelled the reward.
    Vetoed,
}

/// Terminal state of one decision.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing was granted.
    NoDrop(NoDropReason),
    /// This item was dropped at the block.
    Dropped(ItemStack),
}

impl Outcome {
    /// Whether a trophy was granted.
    #[must_use]
    pub const fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }

    /// The granted item, if any.
    #[must_use]
    pub const fn item(&self) -> Option<&ItemStack> {
        match self {
            Self::Dropped(item) => Some(item),
            Self::NoDrop(_) => None,
        }
    }

    /// The rejection reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<NoDropReason> {
        match self {
            Self::NoDrop(reason) => Some(*reason),
            Self::Dropped(_) => None,
        }
    }
}

/// Everything the pipeline needs from the host.
#[derive(Clone)]
pub struct Collaborators {
    /// Rates and flags.
    pub config: Arc<dyn ConfigProvider>,
    /// Permission lookups.
    pub permissions: Arc<dyn PermissionOracle>,
    /// Reward construction.
    pub items: Arc<dyn ItemFactory>,
    /// Drops and block clearing.
    pub world: Arc<dyn WorldAccess>,
    /// Broadcasts.
    pub notifier: Arc<dyn NotificationSink>,
    /// External check system, if installed.
    pub exemptions: Option<Arc<dyn ExemptionAdapter>>,
}

impl Collaborators {
    /// Bundles the required collaborators, without an exemption adapter.
    #[must_use]
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        permissions: Arc<dyn PermissionOracle>,
        items: Arc<dyn ItemFactory>,
        world: Arc<dyn WorldAccess>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            permissions,
            items,
            world,
            notifier,
            exemptions: None,
        }
    }

    /// Installs the exemption adapter.
    #[must_use]
    pub fn with_exemptions(mut self, exemptions: Arc<dyn ExemptionAdapter>) -> Self {
        self.exemptions = Some(exemptions);
        self
    }
}

/// The trophy-drop state machine plus its observer registry.
pub struct DropDecisionPipeline {
    collaborators: Collaborators,
    simulator: InteractionSimulator,
    checkpoints: CheckpointRegistry,
}

impl DropDecisionPipeline {
    /// Creates a pipeline with an empty observer registry.
    #[must_use]
    pub fn new(collaborators: Collaborators) -> Self {
        let simulator = InteractionSimulator::new(collaborators.exemptions.clone());
        tracing::info!(
            exemptions = simulator.is_enabled(),
            "trophy pipeline created"
        );
        Self {
            collaborators,
            simulator,
            checkpoints: CheckpointRegistry::new(),
        }
    }

    /// The observer registry.
    #[must_use]
    pub fn checkpoints(&self) -> &CheckpointRegistry {
        &self.checkpoints
    }

    /// Mutable access to the observer registry, for registration.
    pub fn checkpoints_mut(&mut self) -> &mut CheckpointRegistry {
        &mut self.checkpoints
    }

    /// The interaction simulator.
    #[must_use]
    pub fn simulator(&self) -> &InteractionSimulator {
        &self.simulator
    }

    /// The host collaborators.
    #[must_use]
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Releases every registered observer.
    pub fn shutdown(&mut self) {
        self.checkpoints.shutdown();
    }

    /// Decides whether `event` produces a trophy, and grants it if so.
    ///
    /// Returns `None` for simulated breaks. On a simulated veto the real
    /// break is cancelled. On a drop with an exemption adapter installed
    /// the real break is cancelled and the block cleared.
    pub fn handle_block_break(
        &self,
        event: &mut BlockBreak,
        rolls: &mut dyn RollSource,
    ) -> Option<Outcome> {
        if event.is_simulated() {
            return None;
        }
        let outcome = self.decide(event, rolls);
        enforce_veto_consistency(&outcome, event);
        Some(outcome)
    }

    fn decide(&self, event: &mut BlockBreak, rolls: &mut dyn RollSource) -> Outcome {
        let (kind, miner) = match self.check_gates(event) {
            Ok(passed) => passed,
            Err(gate) => {
                tracing::debug!(?gate, material = %event.block.material, "break gated");
                return Outcome::NoDrop(NoDropReason::Gated(gate));
            }
        };

        let config = &self.collaborators.config;
        let base_rate = config.rate(kind);
        if base_rate == 0.0 {
            tracing::debug!(%kind, "zero drop rate");
            return Outcome::NoDrop(NoDropReason::Gated(Gate::ZeroRate));
        }

        let always = self
            .collaborators
            .permissions
            .has_permission(&miner, PERMISSION_ALWAYS_REWARDED);
        let mut record = RollRecord::new(
            kind,
            event.block.material.clone(),
            miner.id,
            always,
            rolls.sample(),
            base_rate,
        );
        let level = miner.tool.as_ref().map_or(0, |tool| tool.fortune);
        let bonus = 1.0 + config.number("fortunerate") * f64::from(level);
        record
            .modifiers_mut()
            .set(BONUS_YIELD_KEY, Modifier::multiply(bonus));
        RollEvaluator::apply_modifiers(&mut record);
        RollEvaluator::apply_drop_rate(&mut record);

        self.checkpoints.dispatch_roll(&mut record);
        tracing::debug!(
            %kind,
            roll = record.effective_roll(),
            rate = record.effective_rate(),
            success = record.success(),
            "trophy roll"
        );
        if !record.success() {
            return Outcome::NoDrop(NoDropReason::FailedRoll);
        }

        let report = self.simulator.simulate(&self.checkpoints, event, &miner);
        if report.cancelled {
            event.set_cancelled(true);
            tracing::debug!(%kind, miner = miner.id, "simulated break vetoed");
            return Outcome::NoDrop(NoDropReason::SimulatedVeto);
        }

        let item = self
            .collaborators
            .items
            .build_reward(kind, RewardOptions::from_config(config.as_ref()));
        let mut reward = TrophyDropEvent::new(kind, miner.id, event.block.clone(), item);
        self.checkpoints.dispatch_reward(&mut reward);
        if reward.is_cancelled() {
            tracing::debug!(%kind, miner = miner.id, "trophy reward vetoed");
            return Outcome::NoDrop(NoDropReason::Vetoed);
        }

        self.grant(event, &miner, kind, reward.into_item())
    }

    /// Returns the trophy kind and a copy of the miner when every gate passes.
    fn check_gates(&self, event: &BlockBreak) -> Result<(TrophyKind, Actor), Gate> {
        let kind = TrophyKind::from_block(&event.block.material).ok_or(Gate::NoTrophyMapping)?;
        let miner = event.miner.as_ref().ok_or(Gate::NoMiner)?;
        if miner.kind != ActorKind::Player {
            return Err(Gate::NotRewardable);
        }
        if event.is_cancelled() {
            return Err(Gate::AlreadyCancelled);
        }
        if miner.mode.is_reward_exempt() {
            return Err(Gate::ExemptMode);
        }
        if !self
            .collaborators
            .permissions
            .has_permission(miner, PERMISSION_CAN_BE_REWARDED)
        {
            return Err(Gate::MissingPermission);
        }
        if let Some(tool) = &miner.tool {
            let configured = self.collaborators.config.strings("disallowedtools");
            let disallowed = DEFAULT_DISALLOWED_TOOLS
                .iter()
                .copied()
                .chain(configured.iter().map(String::as_str))
                .any(|name| name.eq_ignore_ascii_case(&tool.material));
            if disallowed {
                return Err(Gate::DisallowedTool);
            }
            if tool.silk_touch > 0 {
                return Err(Gate::BypassEnchantment);
            }
        }
        Ok((kind, miner.clone()))
    }

    fn grant(
        &self,
        event: &mut BlockBreak,
        miner: &Actor,
        kind: TrophyKind,
        item: ItemStack,
    ) -> Outcome {
        self.broadcast(miner, kind);

        let location = event.block.location.clone();
        if self.simulator.is_enabled() {
            // The check system may swallow the break without cancelling it.
            event.set_cancelled(true);
            self.collaborators.world.clear_block(&location);
        }
        self.collaborators
            .world
            .drop_item_naturally(&location, item.clone());

        tracing::info!(%kind, miner = miner.id, name = %miner.display_name, "trophy dropped");
        Outcome::Dropped(item)
    }

    fn broadcast(&self, miner: &Actor, kind: TrophyKind) {
        let config = &self.collaborators.config;
        if !config.flag("broadcast") {
            return;
        }
        let message = format!("{} found a {}.", miner.display_name, kind.drop_name());
        let notifier = &self.collaborators.notifier;

        let range = config.int("broadcastrange");
        if range <= 0 {
            notifier.send_all(&message);
            return;
        }

        #[allow(clippy::cast_precision_loss)]
        let range_squared = (range as f64) * (range as f64);
        for recipient in notifier.recipients() {
            let in_range = miner
                .location
                .distance_squared(&recipient.location)
                .is_some_and(|d| d <= range_squared);
            if in_range {
                notifier.send(recipient.id, &message);
            }
        }
    }
}

/// A simulated veto must leave the real break cancelled.
fn enforce_veto_consistency(outcome: &Outcome, event: &mut BlockBreak) {
    if outcome.reason() == Some(NoDropReason::SimulatedVeto) && !event.is_cancelled() {
        tracing::error!(
            material = %event.block.material,
            "simulated veto left the real break uncancelled, forcing cancellation"
        );
        debug_assert!(
            event.is_cancelled(),
            "simulated veto must cancel the real break"
        );
        event.set_cancelled(true);
    }
}

impl std::fmt::Debug for DropDecisionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropDecisionPipeline")
            .field("simulator", &self.simulator)
            .field("observers", &self.checkpoints.len())
            .finish_non_exhaustive()
    }
}
