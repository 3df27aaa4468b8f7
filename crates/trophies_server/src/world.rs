//! # Host World
//!
//! In-memory world state: players, blocks, item entities and chat.
//! Implements the permission, world and notification collaborators.
//!
//! All state sits behind `parking_lot` locks so the world can be shared
//! by `Arc` between the session, the pipeline and event producers.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use trophies_core::{
    Actor, ActorId, ItemStack, Location, NotificationSink, PermissionOracle, Recipient,
    WorldAccess,
};

use crate::events::{EventSender, HostEvent};

/// Integer block coordinates in a world.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockPos {
    /// World name.
    pub world: String,
    /// Block coordinates.
    pub xyz: [i64; 3],
}

impl BlockPos {
    /// The block containing `location`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of(location: &Location) -> Self {
        Self {
            world: location.world.clone(),
            xyz: [
                location.x.floor() as i64,
                location.y.floor() as i64,
                location.z.floor() as i64,
            ],
        }
    }

    /// The block's corner as a location.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn location(&self) -> Location {
        Location::new(
            self.world.clone(),
            self.xyz[0] as f64,
            self.xyz[1] as f64,
            self.xyz[2] as f64,
        )
    }
}

/// An item lying in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldItem {
    /// Entity id.
    pub entity: u64,
    /// Where it lies.
    pub location: Location,
    /// The stack.
    pub stack: ItemStack,
}

struct PlayerState {
    actor: Actor,
    permissions: HashSet<String>,
    online: bool,
}

/// The host's world.
pub struct HostWorld {
    players: RwLock<HashMap<ActorId, PlayerState>>,
    blocks: RwLock<HashMap<BlockPos, String>>,
    items: RwLock<Vec<WorldItem>>,
    inboxes: Mutex<HashMap<ActorId, Vec<String>>>,
    console: Mutex<Vec<String>>,
    next_entity: AtomicU64,
    spawn_hook: Mutex<Option<EventSender>>,
}

impl HostWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            blocks: RwLock::new(HashMap::new()),
            items: RwLock::new(Vec::new()),
            inboxes: Mutex::new(HashMap::new()),
            console: Mutex::new(Vec::new()),
            next_entity: AtomicU64::new(1),
            spawn_hook: Mutex::new(None),
        }
    }

    /// Queues an [`HostEvent::ItemSpawned`] on `sender` for every new item.
    pub fn set_spawn_hook(&self, sender: EventSender) {
        *self.spawn_hook.lock() = Some(sender);
    }

    // ========================================================================
    // PLAYERS
    // ========================================================================

    /// Adds (or replaces) an online player.
    pub fn add_player(&self, actor: Actor, permissions: &[&str]) {
        let permissions = permissions.iter().map(ToString::to_string).collect();
        tracing::debug!(id = actor.id, name = %actor.display_name, "player joined");
        self.players.write().insert(
            actor.id,
            PlayerState {
                actor,
                permissions,
                online: true,
            },
        );
    }

    /// Marks a player offline. Offline players receive no broadcasts.
    pub fn disconnect(&self, id: ActorId) {
        if let Some(state) = self.players.write().get_mut(&id) {
            state.online = false;
        }
    }

    /// A snapshot of the player.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<Actor> {
        self.players.read().get(&id).map(|state| state.actor.clone())
    }

    /// Edits a player in place. Returns `false` if unknown.
    pub fn update_actor(&self, id: ActorId, edit: impl FnOnce(&mut Actor)) -> bool {
        match self.players.write().get_mut(&id) {
            Some(state) => {
                edit(&mut state.actor);
                true
            }
            None => false,
        }
    }

    /// Grants a permission.
    pub fn grant(&self, id: ActorId, permission: &str) {
        if let Some(state) = self.players.write().get_mut(&id) {
            state.permissions.insert(permission.to_string());
        }
    }

    /// Revokes a permission.
    pub fn revoke(&self, id: ActorId, permission: &str) {
        if let Some(state) = self.players.write().get_mut(&id) {
            state.permissions.remove(permission);
        }
    }

    // ========================================================================
    // BLOCKS AND ITEMS
    // ========================================================================

    /// Sets the block at `location`.
    pub fn set_block(&self, location: &Location, material: impl Into<String>) {
        self.blocks.write().insert(BlockPos::of(location), material.into());
    }

    /// The block material at `location`, `AIR` if none.
    #[must_use]
    pub fn block_at(&self, location: &Location) -> String {
        self.blocks
            .read()
            .get(&BlockPos::of(location))
            .cloned()
            .unwrap_or_else(|| "AIR".to_string())
    }

    /// Number of non-air blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.read().len()
    }

    /// Every item entity.
    #[must_use]
    pub fn items(&self) -> Vec<WorldItem> {
        self.items.read().clone()
    }

    /// One item entity.
    #[must_use]
    pub fn item(&self, entity: u64) -> Option<WorldItem> {
        self.items.read().iter().find(|item| item.entity == entity).cloned()
    }

    /// Replaces an item entity's stack. Returns `false` if unknown.
    pub fn replace_item(&self, entity: u64, stack: ItemStack) -> bool {
        match self.items.write().iter_mut().find(|item| item.entity == entity) {
            Some(item) => {
                item.stack = stack;
                true
            }
            None => false,
        }
    }

    /// Spawns an item entity and returns its id.
    pub fn spawn_item(&self, location: &Location, stack: ItemStack) -> u64 {
        let entity = self.next_entity.fetch_add(1, Ordering::Relaxed);
        self.items.write().push(WorldItem {
            entity,
            location: location.clone(),
            stack,
        });
        if let Some(hook) = self.spawn_hook.lock().as_ref() {
            hook.send(HostEvent::ItemSpawned { entity });
        }
        entity
    }

    // ========================================================================
    // CHAT
    // ========================================================================

    /// Messages delivered to a player.
    #[must_use]
    pub fn inbox(&self, id: ActorId) -> Vec<String> {
        self.inboxes.lock().get(&id).cloned().unwrap_or_default()
    }

    /// Global broadcasts.
    #[must_use]
    pub fn console(&self) -> Vec<String> {
        self.console.lock().clone()
    }
}

impl Default for HostWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionOracle for HostWorld {
    fn has_permission(&self, actor: &Actor, permission: &str) -> bool {
        self.players
            .read()
            .get(&actor.id)
            .is_some_and(|state| state.permissions.contains(permission))
    }
}

impl WorldAccess for HostWorld {
    fn drop_item_naturally(&self, location: &Location, item: ItemStack) {
        // Centre of the block, slightly raised.
        let pos = BlockPos::of(location).location();
        let at = Location::new(pos.world, pos.x + 0.5, pos.y + 0.5, pos.z + 0.5);
        self.spawn_item(&at, item);
    }

    fn clear_block(&self, location: &Location) {
        self.blocks.write().remove(&BlockPos::of(location));
    }
}

impl NotificationSink for HostWorld {
    fn send(&self, actor: ActorId, message: &str) {
        self.inboxes
            .lock()
            .entry(actor)
            .or_default()
            .push(message.to_string());
    }

    fn send_all(&self, message: &str) {
        let online: Vec<ActorId> = self
            .players
            .read()
            .values()
            .filter(|state| state.online)
            .map(|state| state.actor.id)
            .collect();
        for id in online {
            self.send(id, message);
        }
        self.console.lock().push(message.to_string());
    }

    fn recipients(&self) -> Vec<Recipient> {
        self.players
            .read()
            .values()
            .filter(|state| state.online)
            .map(|state| Recipient {
                id: state.actor.id,
                location: state.actor.location.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    fn here() -> Location {
        Location::new("world", 3.7, 64.2, -1.5)
    }

    #[test]
    fn test_blocks_round_to_containing_block() {
        let world = HostWorld::new();
        world.set_block(&here(), "DIAMOND_ORE");
        assert_eq!(world.block_at(&Location::new("world", 3.0, 64.9, -1.0)), "DIAMOND_ORE");
        assert_eq!(BlockPos::of(&here()).xyz, [3, 64, -2]);

        world.clear_block(&here());
        assert_eq!(world.block_at(&here()), "AIR");
    }

    #[test]
    fn test_drop_spawns_item_and_notifies() {
        let world = HostWorld::new();
        let bus = EventBus::new(4);
        world.set_spawn_hook(bus.sender());

        world.drop_item_naturally(&here(), ItemStack::new("DIAMOND", 1));

        let items = world.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].location, Location::new("world", 3.5, 64.5, -1.5));
        assert_eq!(
            bus.receiver().drain(),
            vec![HostEvent::ItemSpawned { entity: items[0].entity }]
        );
    }

    #[test]
    fn test_permissions() {
        let world = HostWorld::new();
        let actor = Actor::player(1, "Ana", here());
        world.add_player(actor.clone(), &["miningtrophies.canberewarded"]);
        assert!(world.has_permission(&actor, "miningtrophies.canberewarded"));
        assert!(!world.has_permission(&actor, "miningtrophies.alwaysrewarded"));

        world.revoke(1, "miningtrophies.canberewarded");
        assert!(!world.has_permission(&actor, "miningtrophies.canberewarded"));

        let stranger = Actor::player(2, "Bo", here());
        assert!(!world.has_permission(&stranger, "miningtrophies.canberewarded"));
    }

    #[test]
    fn test_offline_players_get_no_broadcasts() {
        let world = HostWorld::new();
        world.add_player(Actor::player(1, "Ana", here()), &[]);
        world.add_player(Actor::player(2, "Bo", here()), &[]);
        world.disconnect(2);

        world.send_all("hello");
        assert_eq!(world.inbox(1), vec!["hello".to_string()]);
        assert!(world.inbox(2).is_empty());
        assert_eq!(world.console(), vec!["hello".to_string()]);
        assert_eq!(world.recipients().len(), 1);
    }
}
