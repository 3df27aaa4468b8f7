//! # In-Memory Collaborators
//!
//! Recording doubles for every collaborator trait plus a few ready-made
//! observers. Used by the unit tests, the integration tests and the
//! benchmark.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::TrophyKind;
use crate::checkpoint::{
    BreakObserver, CheckpointError, PreAction, RewardObserver, RollObserver, TrophyDropEvent,
};
use crate::collaborators::{
    Actor, ActorId, BlockBreak, ConfigProvider, ExemptionAdapter, Location, NotificationSink,
    PermissionOracle, Recipient, WorldAccess,
};
use crate::item::{CatalogItemFactory, ItemStack};
use crate::pipeline::{Collaborators, DropDecisionPipeline, PERMISSION_CAN_BE_REWARDED};
use crate::roll::RollRecord;

// ============================================================================
// MOCK COLLABORATORS
// ============================================================================

/// Map-backed configuration. Missing keys read as the safe defaults.
#[derive(Default)]
pub struct MockConfig {
    numbers: RwLock<HashMap<String, f64>>,
    flags: RwLock<HashMap<String, bool>>,
    ints: RwLock<HashMap<String, i64>>,
    strings: RwLock<HashMap<String, Vec<String>>>,
}

impl MockConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a number.
    pub fn set_number(&self, key: &str, value: f64) {
        self.numbers.write().insert(key.to_string(), value);
    }

    /// Sets a flag.
    pub fn set_flag(&self, key: &str, value: bool) {
        self.flags.write().insert(key.to_string(), value);
    }

    /// Sets an integer.
    pub fn set_int(&self, key: &str, value: i64) {
        self.ints.write().insert(key.to_string(), value);
    }

    /// Sets a string list.
    pub fn set_strings(&self, key: &str, value: &[&str]) {
        let value = value.iter().map(ToString::to_string).collect();
        self.strings.write().insert(key.to_string(), value);
    }

    /// Sets the base rate of `kind`.
    pub fn set_rate(&self, kind: TrophyKind, rate: f64) {
        self.set_number(&kind.rate_key(), rate);
    }
}

impl ConfigProvider for MockConfig {
    fn number(&self, key: &str) -> f64 {
        self.numbers.read().get(key).copied().unwrap_or(0.0)
    }

    fn flag(&self, key: &str) -> bool {
        self.flags.read().get(key).copied().unwrap_or(false)
    }

    fn int(&self, key: &str) -> i64 {
        self.ints.read().get(key).copied().unwrap_or(0)
    }

    fn strings(&self, key: &str) -> Vec<String> {
        self.strings.read().get(key).cloned().unwrap_or_default()
    }
}

/// Permissions: a set of defaults every actor holds, plus per-actor
/// grants and revocations.
pub struct MockPermissions {
    defaults: RwLock<HashSet<String>>,
    granted: RwLock<HashSet<(ActorId, String)>>,
    revoked: RwLock<HashSet<(ActorId, String)>>,
}

impl MockPermissions {
    /// Everyone holds [`PERMISSION_CAN_BE_REWARDED`].
    #[must_use]
    pub fn new() -> Self {
        let defaults = HashSet::from([PERMISSION_CAN_BE_REWARDED.to_string()]);
        Self {
            defaults: RwLock::new(defaults),
            granted: RwLock::new(HashSet::new()),
            revoked: RwLock::new(HashSet::new()),
        }
    }

    /// Grants `permission` to `actor`.
    pub fn grant(&self, actor: ActorId, permission: &str) {
        let key = (actor, permission.to_string());
        self.revoked.write().remove(&key);
        self.granted.write().insert(key);
    }

    /// Revokes `permission` from `actor`, defaults included.
    pub fn revoke(&self, actor: ActorId, permission: &str) {
        let key = (actor, permission.to_string());
        self.granted.write().remove(&key);
        self.revoked.write().insert(key);
    }

    /// Clears the defaults.
    pub fn clear_defaults(&self) {
        self.defaults.write().clear();
    }
}

impl Default for MockPermissions {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionOracle for MockPermissions {
    fn has_permission(&self, actor: &Actor, permission: &str) -> bool {
        let key = (actor.id, permission.to_string());
        if self.revoked.read().contains(&key) {
            return false;
        }
        self.granted.read().contains(&key) || self.defaults.read().contains(permission)
    }
}

/// Exemption adapter with grant/revoke counters.
#[derive(Default)]
pub struct MockExemptions {
    exempt: Mutex<HashSet<(ActorId, String)>>,
    grants: AtomicUsize,
    revokes: AtomicUsize,
}

impl MockExemptions {
    /// Creates an adapter with nobody exempt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of grants so far.
    #[must_use]
    pub fn grants(&self) -> usize {
        self.grants.load(Ordering::Relaxed)
    }

    /// Number of revokes so far.
    #[must_use]
    pub fn revokes(&self) -> usize {
        self.revokes.load(Ordering::Relaxed)
    }
}

impl ExemptionAdapter for MockExemptions {
    fn is_exempt(&self, actor: ActorId, check: &str) -> bool {
        self.exempt.lock().contains(&(actor, check.to_string()))
    }

    fn grant_exemption(&self, actor: ActorId, check: &str) {
        self.grants.fetch_add(1, Ordering::Relaxed);
        self.exempt.lock().insert((actor, check.to_string()));
    }

    fn revoke_exemption(&self, actor: ActorId, check: &str) {
        self.revokes.fetch_add(1, Ordering::Relaxed);
        self.exempt.lock().remove(&(actor, check.to_string()));
    }
}

/// Records every message.
#[derive(Default)]
pub struct MockNotifier {
    recipients: Mutex<Vec<Recipient>>,
    sent: Mutex<Vec<(ActorId, String)>>,
    broadcasts: Mutex<Vec<String>>,
}

impl MockNotifier {
    /// Creates a notifier with no recipients.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a potential recipient.
    pub fn add_recipient(&self, id: ActorId, location: Location) {
        self.recipients.lock().push(Recipient { id, location });
    }

    /// Direct messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(ActorId, String)> {
        self.sent.lock().clone()
    }

    /// Global broadcasts sent so far.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().clone()
    }
}

impl NotificationSink for MockNotifier {
    fn send(&self, actor: ActorId, message: &str) {
        self.sent.lock().push((actor, message.to_string()));
    }

    fn send_all(&self, message: &str) {
        self.broadcasts.lock().push(message.to_string());
    }

    fn recipients(&self) -> Vec<Recipient> {
        self.recipients.lock().clone()
    }
}

/// Records drops and cleared blocks.
#[derive(Default)]
pub struct MockWorld {
    drops: Mutex<Vec<(Location, ItemStack)>>,
    cleared: Mutex<Vec<Location>>,
}

impl MockWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items dropped so far.
    #[must_use]
    pub fn drops(&self) -> Vec<(Location, ItemStack)> {
        self.drops.lock().clone()
    }

    /// Blocks cleared so far.
    #[must_use]
    pub fn cleared(&self) -> Vec<Location> {
        self.cleared.lock().clone()
    }
}

impl WorldAccess for MockWorld {
    fn drop_item_naturally(&self, location: &Location, item: ItemStack) {
        self.drops.lock().push((location.clone(), item));
    }

    fn clear_block(&self, location: &Location) {
        self.cleared.lock().push(location.clone());
    }
}

/// A full set of doubles, wired together.
///
/// Starts with every cosmetic flag on, `disallowedtools = ["SHEARS"]`,
/// no bonus rate, every base rate `0`, broadcasts off and no exemption
/// adapter.
pub struct MockHost {
    /// Configuration.
    pub config: Arc<MockConfig>,
    /// Permissions.
    pub permissions: Arc<MockPermissions>,
    /// Item factory.
    pub items: Arc<CatalogItemFactory>,
    /// World.
    pub world: Arc<MockWorld>,
    /// Notifications.
    pub notifier: Arc<MockNotifier>,
    /// Exemption adapter, if installed.
    pub exemptions: Option<Arc<MockExemptions>>,
}

impl MockHost {
    /// Creates the default host.
    #[must_use]
    pub fn new() -> Self {
        let config = MockConfig::new();
        config.set_flag("addenchants", true);
        config.set_flag("addeffects", true);
        config.set_flag("addlore", true);
        config.set_strings("disallowedtools", &["SHEARS"]);
        Self {
            config: Arc::new(config),
            permissions: Arc::new(MockPermissions::new()),
            items: Arc::new(CatalogItemFactory::new()),
            world: Arc::new(MockWorld::new()),
            notifier: Arc::new(MockNotifier::new()),
            exemptions: None,
        }
    }

    /// Sets a base rate.
    #[must_use]
    pub fn with_rate(self, kind: TrophyKind, rate: f64) -> Self {
        self.config.set_rate(kind, rate);
        self
    }

    /// Sets a number.
    #[must_use]
    pub fn with_number(self, key: &str, value: f64) -> Self {
        self.config.set_number(key, value);
        self
    }

    /// Sets a flag.
    #[must_use]
    pub fn with_flag(self, key: &str, value: bool) -> Self {
        self.config.set_flag(key, value);
        self
    }

    /// Sets an integer.
    #[must_use]
    pub fn with_int(self, key: &str, value: i64) -> Self {
        self.config.set_int(key, value);
        self
    }

    /// Installs a fresh exemption adapter.
    #[must_use]
    pub fn with_exemptions(mut self) -> Self {
        self.exemptions = Some(Arc::new(MockExemptions::new()));
        self
    }

    /// Collaborators backed by these doubles.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        let collaborators = Collaborators::new(
            self.config.clone(),
            self.permissions.clone(),
            self.items.clone(),
            self.world.clone(),
            self.notifier.clone(),
        );
        match &self.exemptions {
            Some(exemptions) => collaborators.with_exemptions(exemptions.clone()),
            None => collaborators,
        }
    }

    /// A pipeline with no observers.
    #[must_use]
    pub fn pipeline(&self) -> DropDecisionPipeline {
        DropDecisionPipeline::new(self.collaborators())
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MOCK OBSERVERS
// ============================================================================

/// Records every roll it sees, optionally forcing the outcome.
#[derive(Default)]
pub struct RollSpy {
    seen: Mutex<Vec<RollRecord>>,
    force: Option<bool>,
}

impl RollSpy {
    /// Observes without changing anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces `success` to `outcome` on every roll.
    #[must_use]
    pub fn forcing(outcome: bool) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            force: Some(outcome),
        }
    }

    /// Records seen so far, as handed in.
    #[must_use]
    pub fn seen(&self) -> Vec<RollRecord> {
        self.seen.lock().clone()
    }
}

impl RollObserver for RollSpy {
    fn name(&self) -> &str {
        "roll-spy"
    }

    fn on_roll(&self, record: &mut RollRecord) -> Result<(), CheckpointError> {
        self.seen.lock().push(record.clone());
        if let Some(outcome) = self.force {
            record.set_success(outcome);
        }
        Ok(())
    }
}

/// Cancels every simulated break and counts the signals it saw.
#[derive(Default)]
pub struct BreakVeto {
    signals: AtomicUsize,
    breaks: AtomicUsize,
}

impl BreakVeto {
    /// Creates the observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-action signals seen.
    #[must_use]
    pub fn signals(&self) -> usize {
        self.signals.load(Ordering::Relaxed)
    }

    /// Simulated breaks seen.
    #[must_use]
    pub fn breaks(&self) -> usize {
        self.breaks.load(Ordering::Relaxed)
    }
}

impl BreakObserver for BreakVeto {
    fn name(&self) -> &str {
        "break-veto"
    }

    fn on_pre_action(&self, _signal: &PreAction<'_>) -> Result<(), CheckpointError> {
        self.signals.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_simulated_break(&self, event: &mut BlockBreak) -> Result<(), CheckpointError> {
        self.breaks.fetch_add(1, Ordering::Relaxed);
        event.set_cancelled(true);
        Ok(())
    }
}

/// Cancels every reward.
#[derive(Default)]
pub struct RewardVeto {
    seen: AtomicUsize,
}

impl RewardVeto {
    /// Creates the observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewards seen.
    #[must_use]
    pub fn seen(&self) -> usize {
        self.seen.load(Ordering::Relaxed)
    }
}

impl RewardObserver for RewardVeto {
    fn name(&self) -> &str {
        "reward-veto"
    }

    fn on_reward(&self, event: &mut TrophyDropEvent) -> Result<(), CheckpointError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        event.set_cancelled(true);
        Ok(())
    }
}
