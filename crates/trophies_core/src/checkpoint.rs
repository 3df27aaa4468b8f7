//! # Checkpoints
//!
//! The three points where third parties can intervene in a decision:
//!
//! | Checkpoint       | Observer trait     | Observer may                          |
//! |------------------|--------------------|---------------------------------------|
//! | Roll             | [`RollObserver`]   | read/write every record field + chain |
//! | Simulated break  | [`BreakObserver`]  | cancel the simulated break            |
//! | Reward           | [`RewardObserver`] | cancel the grant, adjust the item     |
//!
//! Observers run synchronously in registration order. They are owned by a
//! per-pipeline [`CheckpointRegistry`], registered at startup and released
//! at shutdown.
//!
//! ## Failure isolation
//!
//! Before each observer runs, the state it may touch is snapshotted. If
//! the observer returns `Err` or panics, the snapshot is restored, which
//! means "no veto from that observer", and dispatch moves on to the next one.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::TrophyKind;
use crate::collaborators::{Actor, ActorId, Block, BlockBreak};
use crate::item::ItemStack;
use crate::roll::RollRecord;

/// Errors an observer can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    /// The observer failed to handle the event.
    #[error("observer failed: {0}")]
    Failed(String),

    /// The observer panicked.
    #[error("observer panicked: {0}")]
    Panicked(String),
}

/// Informational signals dispatched before a simulated break.
///
/// These mirror what an external monitor would see ahead of a real break.
#[derive(Clone, Copy, Debug)]
pub enum PreAction<'a> {
    /// The actor swung their arm.
    Animation {
        /// The swinging actor.
        actor: &'a Actor,
    },
    /// The actor started damaging a block.
    Damage {
        /// The mining actor.
        actor: &'a Actor,
        /// The damaged block.
        block: &'a Block,
        /// Whether the damage breaks the block at once.
        instant_break: bool,
    },
}

/// The cancellable "about to grant a trophy" notification.
#[derive(Clone, Debug, PartialEq)]
pub struct TrophyDropEvent {
    kind: TrophyKind,
    miner: ActorId,
    block: Block,
    item: ItemStack,
    cancelled: bool,
}

impl TrophyDropEvent {
    /// Creates an uncancelled event.
    #[must_use]
    pub fn new(kind: TrophyKind, miner: ActorId, block: Block, item: ItemStack) -> Self {
        Self {
            kind,
            miner,
            block,
            item,
            cancelled: false,
        }
    }

    /// Trophy class.
    #[must_use]
    pub const fn kind(&self) -> TrophyKind {
        self.kind
    }

    /// The mining actor.
    #[must_use]
    pub const fn miner(&self) -> ActorId {
        self.miner
    }

    /// The mined block.
    #[must_use]
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// The item about to be granted.
    #[must_use]
    pub fn item(&self) -> &ItemStack {
        &self.item
    }

    /// Mutable access to the item about to be granted.
    pub fn item_mut(&mut self) -> &mut ItemStack {
        &mut self.item
    }

    /// Consumes the event, returning the item.
    #[must_use]
    pub fn into_item(self) -> ItemStack {
        self.item
    }

    /// Whether the grant is cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Sets the cancellation state.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// Observer of the roll checkpoint.
pub trait RollObserver: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Called with the freshly evaluated record. The pipeline reads
    /// `success` back afterwards and treats it as authoritative.
    fn on_roll(&self, record: &mut RollRecord) -> Result<(), CheckpointError>;

    /// Called when the registry shuts down.
    fn on_shutdown(&self) {}
}

/// Observer of the simulated-break checkpoint.
///
/// External veto systems (anti-cheat, region protection) implement this.
pub trait BreakObserver: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Called with each pre-action signal.
    fn on_pre_action(&self, _signal: &PreAction<'_>) -> Result<(), CheckpointError> {
        Ok(())
    }

    /// Called with the simulated break. Cancel it to veto.
    fn on_simulated_break(&self, event: &mut BlockBreak) -> Result<(), CheckpointError>;

    /// Called when the registry shuts down.
    fn on_shutdown(&self) {}
}

/// Observer of the reward checkpoint.
pub trait RewardObserver: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Called before the trophy is granted. Cancel it to veto.
    fn on_reward(&self, event: &mut TrophyDropEvent) -> Result<(), CheckpointError>;

    /// Called when the registry shuts down.
    fn on_shutdown(&self) {}
}

/// Per-pipeline observer registry.
#[derive(Default)]
pub struct CheckpointRegistry {
    roll: Vec<Arc<dyn RollObserver>>,
    breaks: Vec<Arc<dyn BreakObserver>>,
    rewards: Vec<Arc<dyn RewardObserver>>,
}

impl CheckpointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a roll observer.
    pub fn register_roll(&mut self, observer: Arc<dyn RollObserver>) {
        tracing::info!(observer = observer.name(), "registered roll observer");
        self.roll.push(observer);
    }

    /// Registers a simulated-break observer.
    pub fn register_break(&mut self, observer: Arc<dyn BreakObserver>) {
        tracing::info!(observer = observer.name(), "registered break observer");
        self.breaks.push(observer);
    }

    /// Registers a reward observer.
    pub fn register_reward(&mut self, observer: Arc<dyn RewardObserver>) {
        tracing::info!(observer = observer.name(), "registered reward observer");
        self.rewards.push(observer);
    }

    /// Total number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roll.len() + self.breaks.len() + self.rewards.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the roll checkpoint.
    pub fn dispatch_roll(&self, record: &mut RollRecord) {
        for observer in &self.roll {
            let snapshot = record.clone();
            if let Err(e) = isolate(|| observer.on_roll(record)) {
                tracing::warn!(observer = observer.name(), error = %e, "roll observer failed, ignoring its changes");
                *record = snapshot;
            }
        }
    }

    /// Sends one pre-action signal to every break observer.
    pub fn dispatch_pre_action(&self, signal: &PreAction<'_>) {
        for observer in &self.breaks {
            if let Err(e) = isolate(|| observer.on_pre_action(signal)) {
                tracing::warn!(observer = observer.name(), error = %e, "pre-action observer failed");
            }
        }
    }

    /// Runs the simulated-break checkpoint.
    pub fn dispatch_simulated_break(&self, event: &mut BlockBreak) {
        for observer in &self.breaks {
            let snapshot = event.clone();
            if let Err(e) = isolate(|| observer.on_simulated_break(event)) {
                tracing::warn!(observer = observer.name(), error = %e, "break observer failed, treating as no veto");
                *event = snapshot;
            }
        }
    }

    /// Runs the reward checkpoint.
    pub fn dispatch_reward(&self, event: &mut TrophyDropEvent) {
        for observer in &self.rewards {
            let snapshot = event.clone();
            if let Err(e) = isolate(|| observer.on_reward(event)) {
                tracing::warn!(observer = observer.name(), error = %e, "reward observer failed, treating as no veto");
                *event = snapshot;
            }
        }
    }

    /// Notifies every observer of shutdown and releases them.
    pub fn shutdown(&mut self) {
        if self.is_empty() {
            return;
        }
        for observer in &self.roll {
            observer.on_shutdown();
        }
        for observer in &self.breaks {
            observer.on_shutdown();
        }
        for observer in &self.rewards {
            observer.on_shutdown();
        }
        tracing::info!(observers = self.len(), "checkpoint registry shut down");
        self.roll.clear();
        self.breaks.clear();
        self.rewards.clear();
    }
}

impl Drop for CheckpointRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs one observer call, turning a panic into an error.
fn isolate(f: impl FnOnce() -> Result<(), CheckpointError>) -> Result<(), CheckpointError> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(CheckpointError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Location;
    use parking_lot::Mutex;

    struct Named(&'static str);

    struct Cancel(Named);
    impl BreakObserver for Cancel {
        fn name(&self) -> &str {
            self.0 .0
        }
        fn on_simulated_break(&self, event: &mut BlockBreak) -> Result<(), CheckpointError> {
            event.set_cancelled(true);
            Ok(())
        }
    }

    struct CancelThenFail;
    impl BreakObserver for CancelThenFail {
        fn name(&self) -> &str {
            "cancel-then-fail"
        }
        fn on_simulated_break(&self, event: &mut BlockBreak) -> Result<(), CheckpointError> {
            event.set_cancelled(true);
            Err(CheckpointError::Failed("boom".into()))
        }
    }

    struct Panics;
    impl RewardObserver for Panics {
        fn name(&self) -> &str {
            "panics"
        }
        fn on_reward(&self, event: &mut TrophyDropEvent) -> Result<(), CheckpointError> {
            event.set_cancelled(true);
            panic!("reward observer exploded");
        }
    }

    struct Recorder(Mutex<Vec<&'static str>>, &'static str);
    impl RewardObserver for Recorder {
        fn name(&self) -> &str {
            self.1
        }
        fn on_reward(&self, _event: &mut TrophyDropEvent) -> Result<(), CheckpointError> {
            self.0.lock().push(self.1);
            Ok(())
        }
    }

    fn sample_break() -> BlockBreak {
        BlockBreak::new(
            Block::new("DIAMOND_ORE", Location::new("world", 0.0, 0.0, 0.0)),
            None,
        )
        .simulated_copy()
    }

    fn sample_reward() -> TrophyDropEvent {
        TrophyDropEvent::new(
            TrophyKind::DiamondOre,
            1,
            Block::new("DIAMOND_ORE", Location::new("world", 0.0, 0.0, 0.0)),
            ItemStack::new("DIAMOND", 1),
        )
    }

    #[test]
    fn test_failed_observer_is_no_veto() {
        let mut registry = CheckpointRegistry::new();
        registry.register_break(Arc::new(CancelThenFail));

        let mut event = sample_break();
        registry.dispatch_simulated_break(&mut event);
        assert!(!event.is_cancelled());
    }

    #[test]
    fn test_failure_does_not_undo_earlier_veto() {
        let mut registry = CheckpointRegistry::new();
        registry.register_break(Arc::new(Cancel(Named("region"))));
        registry.register_break(Arc::new(CancelThenFail));

        let mut event = sample_break();
        registry.dispatch_simulated_break(&mut event);
        assert!(event.is_cancelled());
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let log = Arc::new(Recorder(Mutex::new(Vec::new()), "after"));
        let mut registry = CheckpointRegistry::new();
        registry.register_reward(Arc::new(Panics));
        registry.register_reward(log.clone());

        let mut event = sample_reward();
        registry.dispatch_reward(&mut event);

        assert!(!event.is_cancelled());
        assert_eq!(*log.0.lock(), vec!["after"]);
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let shared = Arc::new(Mutex::new(Vec::new()));
        struct Ordered(Arc<Mutex<Vec<&'static str>>>, &'static str);
        impl RewardObserver for Ordered {
            fn name(&self) -> &str {
                self.1
            }
            fn on_reward(&self, _event: &mut TrophyDropEvent) -> Result<(), CheckpointError> {
                self.0.lock().push(self.1);
                Ok(())
            }
        }

        let mut registry = CheckpointRegistry::new();
        registry.register_reward(Arc::new(Ordered(shared.clone(), "first")));
        registry.register_reward(Arc::new(Ordered(shared.clone(), "second")));
        registry.dispatch_reward(&mut sample_reward());

        assert_eq!(*shared.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_shutdown_clears() {
        let mut registry = CheckpointRegistry::new();
        registry.register_break(Arc::new(Cancel(Named("region"))));
        assert_eq!(registry.len(), 1);
        registry.shutdown();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panic_message_extraction() {
        let err = isolate(|| panic!("with {}", "format"));
        assert_eq!(err, Err(CheckpointError::Panicked("with format".into())));
    }
}
