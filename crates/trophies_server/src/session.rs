//! # Host Session
//!
//! Owns the pipeline and everything around it, and turns host events
//! into decisions.
//!
//! ```text
//! tick():  clock += 1
//!          drain queue ─┬─ BlockBroken  ─> region/fast-break check ─> pipeline ─> remove block
//!                       ├─ BlockPlaced  ─> placement guard ─> set block
//!                       ├─ ItemSpawned  ─> repair guard
//!                       └─ ReloadConfig ─> SharedConfig::reload
//! ```
//!
//! The real veto systems judge the real break before the pipeline sees
//! it, which records the break in the fast-break monitor. The pipeline's
//! dry run on the same tick therefore only passes under an exemption.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rand_chacha::ChaCha8Rng;
use trophies_core::{
    ActorId, Block, BlockBreak, CatalogItemFactory, Collaborators, ConfigProvider,
    DropDecisionPipeline, ItemStack, Location, NoDropReason, Outcome, RngRolls, SharedConfig,
    TrophyGuards, TrophyResult, WorldAccess,
};

use crate::events::{EventBus, EventReceiver, EventSender, HostEvent};
use crate::settings::HostSettings;
use crate::veto::{Clock, FastBreakMonitor, RegionGuard};
use crate::world::{BlockPos, HostWorld};

/// What happened to one real break.
#[derive(Clone, Debug, PartialEq)]
pub struct BreakReport {
    /// Whether the real break ended cancelled.
    pub cancelled: bool,
    /// Whether the block is gone afterwards.
    pub block_removed: bool,
    /// The trophy decision.
    pub outcome: Option<Outcome>,
}

/// Session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Real breaks handled.
    pub breaks: u64,
    /// Real breaks cancelled by a veto system.
    pub cancelled_breaks: u64,
    /// Trophies dropped.
    pub drops: u64,
    /// Decisions stopped by a simulated veto.
    pub simulated_vetoes: u64,
    /// Placements refused.
    pub blocked_placements: u64,
    /// Item entities rebuilt.
    pub repaired_items: u64,
    /// Failed config reloads.
    pub failed_reloads: u64,
}

/// A running host.
pub struct HostSession {
    world: Arc<HostWorld>,
    config: Arc<SharedConfig>,
    items: Arc<CatalogItemFactory>,
    pipeline: DropDecisionPipeline,
    rolls: RngRolls<ChaCha8Rng>,
    guards: TrophyGuards,
    monitor: Arc<FastBreakMonitor>,
    regions: Arc<RegionGuard>,
    clock: Clock,
    bus: EventBus,
    receiver: EventReceiver,
    stats: SessionStats,
}

impl HostSession {
    /// Wires a session over `world` and `config`.
    #[must_use]
    pub fn new(world: Arc<HostWorld>, config: Arc<SharedConfig>, settings: &HostSettings) -> Self {
        let clock = Clock::default();
        let items = Arc::new(CatalogItemFactory::new());
        let monitor = Arc::new(FastBreakMonitor::new(
            clock.clone(),
            settings.fast_break_ticks,
        ));
        let regions = Arc::new(RegionGuard::new(settings.protected_regions.clone()));

        let mut collaborators = Collaborators::new(
            config.clone(),
            world.clone(),
            items.clone(),
            world.clone(),
            world.clone(),
        );
        if settings.fast_break_exemptions {
            collaborators = collaborators.with_exemptions(monitor.clone());
        }
        let mut pipeline = DropDecisionPipeline::new(collaborators);
        pipeline.checkpoints_mut().register_break(monitor.clone());
        pipeline.checkpoints_mut().register_break(regions.clone());

        let rolls = match settings.seed {
            Some(seed) => RngRolls::seeded(seed),
            None => RngRolls::from_entropy(),
        };

        let bus = EventBus::default();
        world.set_spawn_hook(bus.sender());
        let receiver = bus.receiver();

        tracing::info!(
            seed = ?settings.seed,
            fast_break_ticks = settings.fast_break_ticks,
            regions = regions.len(),
            "host session started"
        );

        Self {
            world,
            config,
            items,
            pipeline,
            rolls,
            guards: TrophyGuards::default(),
            monitor,
            regions,
            clock,
            bus,
            receiver,
            stats: SessionStats::default(),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// The world.
    #[must_use]
    pub fn world(&self) -> &Arc<HostWorld> {
        &self.world
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<SharedConfig> {
        &self.config
    }

    /// The pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &DropDecisionPipeline {
        &self.pipeline
    }

    /// Mutable pipeline access, for registering more observers.
    pub fn pipeline_mut(&mut self) -> &mut DropDecisionPipeline {
        &mut self.pipeline
    }

    /// The fast-break monitor.
    #[must_use]
    pub fn monitor(&self) -> &FastBreakMonitor {
        &self.monitor
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Current tick.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.clock.load(Ordering::Relaxed)
    }

    /// A handle for queueing host events.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.bus.sender()
    }

    // ========================================================================
    // EVENT HANDLING
    // ========================================================================

    /// Handles a real break by `actor` at `location`.
    pub fn break_block(&mut self, actor: ActorId, location: &Location) -> BreakReport {
        self.stats.breaks += 1;
        let pos = BlockPos::of(location).location();
        let material = self.world.block_at(&pos);
        let mut event = BlockBreak::new(Block::new(material, pos.clone()), self.world.actor(actor));

        if self.regions.protects(&pos) || !self.monitor.check_break(actor) {
            event.set_cancelled(true);
        }

        let outcome = self.pipeline.handle_block_break(&mut event, &mut self.rolls);
        match outcome.as_ref().and_then(Outcome::reason) {
            Some(NoDropReason::SimulatedVeto) => self.stats.simulated_vetoes += 1,
            None if outcome.is_some() => self.stats.drops += 1,
            _ => {}
        }

        let cancelled = event.is_cancelled();
        if !cancelled {
            self.world.clear_block(&pos);
        }
        // A drop under exemptions cancels the break but clears the block itself.
        let block_removed = self.world.block_at(&pos) == "AIR";
        if cancelled && !block_removed {
            self.stats.cancelled_breaks += 1;
        }

        BreakReport {
            cancelled,
            block_removed,
            outcome,
        }
    }

    /// Handles a placement. Returns `true` if the block was placed.
    pub fn place_block(&mut self, actor: ActorId, item: &ItemStack, location: &Location) -> bool {
        if self
            .guards
            .should_block_placement(item, self.config.as_ref())
        {
            self.stats.blocked_placements += 1;
            tracing::debug!(actor, material = %item.material, "trophy placement refused");
            return false;
        }
        self.world.set_block(location, item.material.clone());
        true
    }

    /// Handles a freshly spawned item entity. Returns `true` if it was rebuilt.
    pub fn item_spawned(&mut self, entity: u64) -> bool {
        let Some(item) = self.world.item(entity) else {
            return false;
        };
        let Some(replacement) =
            self.guards
                .repair_dropped(&item.stack, self.config.as_ref(), self.items.as_ref())
        else {
            return false;
        };
        let replaced = self.world.replace_item(entity, replacement);
        if replaced {
            self.stats.repaired_items += 1;
        }
        replaced
    }

    /// Re-reads the config file. The previous config stays on failure.
    ///
    /// # Errors
    ///
    /// See [`SharedConfig::reload`].
    pub fn reload_config(&mut self) -> TrophyResult<()> {
        let result = self.config.reload();
        if result.is_err() {
            self.stats.failed_reloads += 1;
        }
        result
    }

    /// Handles one queued event.
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::BlockBroken { actor, location } => {
                self.break_block(actor, &location);
            }
            HostEvent::BlockPlaced {
                actor,
                item,
                location,
            } => {
                self.place_block(actor, &item, &location);
            }
            HostEvent::ItemSpawned { entity } => {
                self.item_spawned(entity);
            }
            HostEvent::ReloadConfig => {
                // Logged by SharedConfig.
                let _ = self.reload_config();
            }
        }
    }

    /// Drains the queue. Events queued while draining (item spawns from
    /// drops) wait for the next call. Returns how many were handled.
    pub fn process_events(&mut self) -> usize {
        let events = self.receiver.drain();
        let count = events.len();
        for event in events {
            self.handle(event);
        }
        count
    }

    /// Advances the clock one tick and drains the queue.
    pub fn tick(&mut self) -> usize {
        self.clock.fetch_add(1, Ordering::Relaxed);
        self.process_events()
    }

    /// Releases the pipeline's observers.
    pub fn shutdown(&mut self) {
        self.pipeline.shutdown();
        tracing::info!(stats = ?self.stats, "host session stopped");
    }

    /// Whether trophy broadcasts are on.
    #[must_use]
    pub fn broadcasts_enabled(&self) -> bool {
        self.config.flag("broadcast")
    }
}
