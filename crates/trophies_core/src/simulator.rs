//! # Interaction Simulator
//!
//! Asks the shared event surface whether a break *would* be vetoed,
//! without performing it.
//!
//! ```text
//! pre = is_exempt(actor, check)          ┐
//! if !pre: grant_exemption               │ SuppressionWindow::open
//! dispatch PreAction::Animation          │
//! dispatch PreAction::Damage{instant}    │
//! dispatch simulated BlockBreak          │
//! if !pre: revoke_exemption              ┘ SuppressionWindow::drop
//! report simulated.is_cancelled()
//! ```
//!
//! The window is a drop guard, so the revoke runs on every exit path,
//! including a panic unwinding out of an observer.
//!
//! Without an exemption adapter the window steps are skipped entirely.
//! The signals and the simulated break are still dispatched, so other
//! veto systems (region protection) keep working.

use std::sync::Arc;

use crate::checkpoint::{CheckpointRegistry, PreAction};
use crate::collaborators::{Actor, ActorId, BlockBreak, ExemptionAdapter};

/// Check the window suppresses by default.
pub const FAST_BREAK_CHECK: &str = "BLOCKBREAK_FASTBREAK";

/// Temporary exemption held for the duration of a simulation.
///
/// Grants the exemption on [`open`](Self::open) only if the actor did not
/// already hold it, and revokes on drop only what it granted.
pub struct SuppressionWindow<'a> {
    adapter: &'a dyn ExemptionAdapter,
    actor: ActorId,
    check: &'a str,
    granted: bool,
}

impl<'a> SuppressionWindow<'a> {
    /// Opens the window.
    #[must_use = "dropping the window closes it immediately"]
    pub fn open(adapter: &'a dyn ExemptionAdapter, actor: ActorId, check: &'a str) -> Self {
        let pre = adapter.is_exempt(actor, check);
        if !pre {
            adapter.grant_exemption(actor, check);
            tracing::trace!(actor, check, "suppression window opened");
        }
        Self {
            adapter,
            actor,
            check,
            granted: !pre,
        }
    }

    /// Whether the actor held the exemption before the window opened.
    #[must_use]
    pub const fn was_already_exempt(&self) -> bool {
        !self.granted
    }
}

impl Drop for SuppressionWindow<'_> {
    fn drop(&mut self) {
        if self.granted {
            self.adapter.revoke_exemption(self.actor, self.check);
            tracing::trace!(actor = self.actor, check = self.check, "suppression window closed");
        }
    }
}

/// Result of one simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationReport {
    /// Whether any observer cancelled the simulated break.
    pub cancelled: bool,
    /// Whether a suppression window was managed at all.
    pub windowed: bool,
}

/// Dry-runs a break through the break observers.
#[derive(Clone)]
pub struct InteractionSimulator {
    exemptions: Option<Arc<dyn ExemptionAdapter>>,
    check: String,
}

impl InteractionSimulator {
    /// Creates a simulator suppressing [`FAST_BREAK_CHECK`].
    #[must_use]
    pub fn new(exemptions: Option<Arc<dyn ExemptionAdapter>>) -> Self {
        Self {
            exemptions,
            check: FAST_BREAK_CHECK.to_string(),
        }
    }

    /// Overrides the suppressed check.
    #[must_use]
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = check.into();
        self
    }

    /// Whether an exemption adapter is installed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.exemptions.is_some()
    }

    /// The suppressed check.
    #[must_use]
    pub fn check(&self) -> &str {
        &self.check
    }

    /// Runs the simulation for `real`, mined by `miner`.
    ///
    /// `real` is never modified. Observer failures are isolated by the
    /// registry; a panic that still escapes (from the adapter itself)
    /// unwinds through the window, which closes on the way out.
    pub fn simulate(
        &self,
        checkpoints: &CheckpointRegistry,
        real: &BlockBreak,
        miner: &Actor,
    ) -> SimulationReport {
        let window = self
            .exemptions
            .as_deref()
            .map(|adapter| SuppressionWindow::open(adapter, miner.id, &self.check));

        checkpoints.dispatch_pre_action(&PreAction::Animation { actor: miner });
        checkpoints.dispatch_pre_action(&PreAction::Damage {
            actor: miner,
            block: &real.block,
            instant_break: true,
        });

        let mut simulated = real.simulated_copy();
        checkpoints.dispatch_simulated_break(&mut simulated);

        let windowed = window.is_some();
        drop(window);

        SimulationReport {
            cancelled: simulated.is_cancelled(),
            windowed,
        }
    }
}

impl std::fmt::Debug for InteractionSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionSimulator")
            .field("enabled", &self.is_enabled())
            .field("check", &self.check)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExemptions;

    #[test]
    fn test_window_grants_and_revokes() {
        let exemptions = MockExemptions::new();
        {
            let window = SuppressionWindow::open(&exemptions, 7, FAST_BREAK_CHECK);
            assert!(!window.was_already_exempt());
            assert!(exemptions.is_exempt(7, FAST_BREAK_CHECK));
        }
        assert!(!exemptions.is_exempt(7, FAST_BREAK_CHECK));
        assert_eq!(exemptions.grants(), 1);
        assert_eq!(exemptions.revokes(), 1);
    }

    #[test]
    fn test_window_keeps_preexisting_exemption() {
        let exemptions = MockExemptions::new();
        exemptions.grant_exemption(7, FAST_BREAK_CHECK);
        {
            let window = SuppressionWindow::open(&exemptions, 7, FAST_BREAK_CHECK);
            assert!(window.was_already_exempt());
        }
        assert!(exemptions.is_exempt(7, FAST_BREAK_CHECK));
        assert_eq!(exemptions.revokes(), 0);
    }

    #[test]
    fn test_disabled_simulator_skips_window() {
        let simulator = InteractionSimulator::new(None);
        assert!(!simulator.is_enabled());
        assert_eq!(simulator.check(), FAST_BREAK_CHECK);
    }
}
