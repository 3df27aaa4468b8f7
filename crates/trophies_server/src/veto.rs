//! # Veto Systems
//!
//! Two independent systems that can reject a break. Both see real breaks
//! through the session and simulated breaks through the checkpoint
//! registry, so the pipeline's dry run predicts what they would do.
//!
//! - [`FastBreakMonitor`]: rejects a player's break that follows their
//!   previous one within a tick window. Supports exemptions, which is what
//!   the pipeline's suppression window uses: the simulated break arrives
//!   on the same tick as the real one and would otherwise always trip it.
//! - [`RegionGuard`]: rejects any break inside a protected box.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use trophies_core::{
    ActorId, BlockBreak, BreakObserver, CheckpointError, ExemptionAdapter, Location, PreAction,
    FAST_BREAK_CHECK,
};

use crate::settings::RegionBox;

/// Shared server tick counter.
pub type Clock = Arc<AtomicU64>;

/// Rejects breaks that come too soon after the same player's last one.
pub struct FastBreakMonitor {
    clock: Clock,
    window_ticks: u64,
    last_break: Mutex<HashMap<ActorId, u64>>,
    exemptions: Mutex<HashSet<(ActorId, String)>>,
    violations: AtomicUsize,
}

impl FastBreakMonitor {
    /// Creates a monitor reading time from `clock`.
    #[must_use]
    pub fn new(clock: Clock, window_ticks: u64) -> Self {
        Self {
            clock,
            window_ticks,
            last_break: Mutex::new(HashMap::new()),
            exemptions: Mutex::new(HashSet::new()),
            violations: AtomicUsize::new(0),
        }
    }

    /// Checks and records one break by `actor`. Returns `true` if the break
    /// is allowed.
    ///
    /// Exempt actors are always allowed and leave no record.
    pub fn check_break(&self, actor: ActorId) -> bool {
        if self.is_exempt(actor, FAST_BREAK_CHECK) {
            return true;
        }
        let now = self.clock.load(Ordering::Relaxed);
        let previous = self.last_break.lock().insert(actor, now);
        let too_fast = previous.is_some_and(|last| now.saturating_sub(last) < self.window_ticks);
        if too_fast {
            self.violations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(actor, now, "fast break rejected");
        }
        !too_fast
    }

    /// Breaks rejected so far.
    #[must_use]
    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::Relaxed)
    }

    /// The configured window.
    #[must_use]
    pub const fn window_ticks(&self) -> u64 {
        self.window_ticks
    }
}

impl ExemptionAdapter for FastBreakMonitor {
    fn is_exempt(&self, actor: ActorId, check: &str) -> bool {
        self.exemptions.lock().contains(&(actor, check.to_string()))
    }

    fn grant_exemption(&self, actor: ActorId, check: &str) {
        self.exemptions.lock().insert((actor, check.to_string()));
    }

    fn revoke_exemption(&self, actor: ActorId, check: &str) {
        self.exemptions.lock().remove(&(actor, check.to_string()));
    }
}

impl BreakObserver for FastBreakMonitor {
    fn name(&self) -> &str {
        "fast-break-monitor"
    }

    fn on_pre_action(&self, signal: &PreAction<'_>) -> Result<(), CheckpointError> {
        if let PreAction::Damage {
            actor,
            instant_break,
            ..
        } = signal
        {
            tracing::trace!(actor = actor.id, instant_break, "block damage");
        }
        Ok(())
    }

    fn on_simulated_break(&self, event: &mut BlockBreak) -> Result<(), CheckpointError> {
        let actor = event
            .miner
            .as_ref()
            .map(|miner| miner.id)
            .ok_or_else(|| CheckpointError::Failed("simulated break without a miner".into()))?;
        if !self.check_break(actor) {
            event.set_cancelled(true);
        }
        Ok(())
    }
}

/// Rejects breaks inside protected regions.
#[derive(Clone, Debug, Default)]
pub struct RegionGuard {
    regions: Vec<RegionBox>,
}

impl RegionGuard {
    /// Guards `regions`.
    #[must_use]
    pub fn new(regions: Vec<RegionBox>) -> Self {
        Self { regions }
    }

    /// Whether `location` is protected.
    #[must_use]
    pub fn protects(&self, location: &Location) -> bool {
        self.regions.iter().any(|region| region.contains(location))
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no region is guarded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl BreakObserver for RegionGuard {
    fn name(&self) -> &str {
        "region-guard"
    }

    fn on_simulated_break(&self, event: &mut BlockBreak) -> Result<(), CheckpointError> {
        if self.protects(&event.block.location) {
            event.set_cancelled(true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trophies_core::{Actor, Block};

    fn simulated_break(actor: ActorId, at: Location) -> BlockBreak {
        BlockBreak::new(
            Block::new("DIAMOND_ORE", at.clone()),
            Some(Actor::player(actor, "P", at)),
        )
        .simulated_copy()
    }

    #[test]
    fn test_window() {
        let clock = Clock::default();
        let monitor = FastBreakMonitor::new(clock.clone(), 5);

        assert!(monitor.check_break(1));
        clock.store(4, Ordering::Relaxed);
        assert!(!monitor.check_break(1));
        clock.store(9, Ordering::Relaxed);
        assert!(monitor.check_break(1));
        assert!(monitor.check_break(2), "players are tracked separately");
        assert_eq!(monitor.violations(), 1);
    }

    #[test]
    fn test_exempt_breaks_leave_no_record() {
        let clock = Clock::default();
        let monitor = FastBreakMonitor::new(clock, 5);
        assert!(monitor.check_break(1));

        monitor.grant_exemption(1, FAST_BREAK_CHECK);
        assert!(monitor.check_break(1));
        monitor.revoke_exemption(1, FAST_BREAK_CHECK);

        let mut event = simulated_break(1, Location::new("world", 0.0, 0.0, 0.0));
        monitor.on_simulated_break(&mut event).expect("has miner");
        assert!(event.is_cancelled(), "still inside the window of the first break");
    }

    #[test]
    fn test_region_guard() {
        let guard = RegionGuard::new(vec![RegionBox {
            world: "world".into(),
            min: [0, 0, 0],
            max: [4, 4, 4],
        }]);

        let mut inside = simulated_break(1, Location::new("world", 2.0, 2.0, 2.0));
        guard.on_simulated_break(&mut inside).expect("infallible");
        assert!(inside.is_cancelled());

        let mut outside = simulated_break(1, Location::new("world", 5.0, 2.0, 2.0));
        guard.on_simulated_break(&mut outside).expect("infallible");
        assert!(!outside.is_cancelled());
    }
}
