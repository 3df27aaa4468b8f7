//! # Collaborator Interfaces
//!
//! The core never touches a real world. Everything it needs from the host
//! comes through the traits below, and everything it knows about a break
//! arrives as plain data ([`BlockBreak`], [`Actor`], [`Tool`]).
//!
//! ```text
//! Host implements:                 Core calls:
//! ┌──────────────────────┐         ┌──────────────────────────┐
//! │ ConfigProvider       │ <────── │ rate / flag / int lookup │
//! │ PermissionOracle     │ <────── │ gate + always-rewarded   │
//! │ ItemFactory          │ <────── │ reward construction      │
//! │ ExemptionAdapter     │ <────── │ suppression window only  │
//! │ NotificationSink     │ <────── │ trophy broadcast         │
//! │ WorldAccess          │ <────── │ grant (drop, clear)      │
//! └──────────────────────┘         └──────────────────────────┘
//! ```
//!
//! All traits take `&self`; implementations that need to mutate use
//! interior mutability.

use crate::catalog::TrophyKind;
use crate::item::{ItemStack, RewardOptions};

/// Identifier of an acting entity.
pub type ActorId = u64;

/// A point in a named world.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    /// World (spatial context) name.
    pub world: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Squared distance to `other`, or `None` when they are in different worlds.
    #[must_use]
    pub fn distance_squared(&self, other: &Location) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        Some(dx * dx + dy * dy + dz * dz)
    }
}

/// What kind of entity performed the break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    /// A player. The only rewardable kind.
    Player,
    /// Anything else (mobs, machines, explosions).
    Other,
}

/// Play mode of an actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Normal mining.
    #[default]
    Survival,
    /// Build mode. Blocks are destroyed, not mined.
    Creative,
    /// Restricted survival.
    Adventure,
    /// Observer mode.
    Spectator,
}

impl GameMode {
    /// Whether breaks in this mode are never rewarded.
    #[must_use]
    pub const fn is_reward_exempt(self) -> bool {
        matches!(self, Self::Creative)
    }
}

/// The tool held in the actor's main hand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tool {
    /// Material name, e.g. `DIAMOND_PICKAXE`.
    pub material: String,
    /// Bonus-yield enchantment level (fortune).
    pub fortune: u32,
    /// Bypass-mining-effort enchantment level (silk touch).
    pub silk_touch: u32,
}

impl Tool {
    /// A plain tool without enchantments.
    #[must_use]
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            ..Self::default()
        }
    }

    /// Sets the fortune level.
    #[must_use]
    pub fn with_fortune(mut self, level: u32) -> Self {
        self.fortune = level;
        self
    }

    /// Sets the silk touch level.
    #[must_use]
    pub fn with_silk_touch(mut self, level: u32) -> Self {
        self.silk_touch = level;
        self
    }
}

/// The entity that broke a block.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    /// Unique id.
    pub id: ActorId,
    /// Entity kind.
    pub kind: ActorKind,
    /// Shown in broadcasts.
    pub display_name: String,
    /// Current play mode.
    pub mode: GameMode,
    /// Main-hand tool, if any.
    pub tool: Option<Tool>,
    /// Where the actor stands.
    pub location: Location,
}

impl Actor {
    /// A survival-mode player with an empty hand.
    #[must_use]
    pub fn player(id: ActorId, display_name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            kind: ActorKind::Player,
            display_name: display_name.into(),
            mode: GameMode::Survival,
            tool: None,
            location,
        }
    }

    /// Sets the held tool.
    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Sets the play mode.
    #[must_use]
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A block in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Material name, e.g. `DIAMOND_ORE`.
    pub material: String,
    /// Block position.
    pub location: Location,
}

impl Block {
    /// Creates a block.
    #[must_use]
    pub fn new(material: impl Into<String>, location: Location) -> Self {
        Self {
            material: material.into(),
            location,
        }
    }
}

/// Whether a break event is real or a pipeline probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BreakOrigin {
    /// Dispatched by the host for a real break.
    #[default]
    Genuine,
    /// Dispatched by the interaction simulator. The pipeline ignores these.
    Simulated,
}

/// A block break, real or simulated.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockBreak {
    /// The block being broken.
    pub block: Block,
    /// The breaking entity, if any.
    pub miner: Option<Actor>,
    origin: BreakOrigin,
    cancelled: bool,
}

impl BlockBreak {
    /// A genuine, uncancelled break.
    #[must_use]
    pub fn new(block: Block, miner: Option<Actor>) -> Self {
        Self {
            block,
            miner,
            origin: BreakOrigin::Genuine,
            cancelled: false,
        }
    }

    /// Structurally identical copy tagged as [`BreakOrigin::Simulated`],
    /// uncancelled.
    #[must_use]
    pub fn simulated_copy(&self) -> Self {
        Self {
            block: self.block.clone(),
            miner: self.miner.clone(),
            origin: BreakOrigin::Simulated,
            cancelled: false,
        }
    }

    /// Where this event came from.
    #[must_use]
    pub const fn origin(&self) -> BreakOrigin {
        self.origin
    }

    /// Whether the simulator produced this event.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.origin == BreakOrigin::Simulated
    }

    /// Whether the break is cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Sets the cancellation state.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// Someone who can receive a broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct Recipient {
    /// Actor id.
    pub id: ActorId,
    /// Current location.
    pub location: Location,
}

/// Configuration lookups.
///
/// Implementations never fail: a missing or unparseable key yields the
/// safe default (`0.0`, `false`, `0`, empty).
pub trait ConfigProvider: Send + Sync {
    /// Floating-point value.
    fn number(&self, key: &str) -> f64;

    /// Boolean flag.
    fn flag(&self, key: &str) -> bool;

    /// Integer value.
    fn int(&self, key: &str) -> i64;

    /// List of strings.
    fn strings(&self, key: &str) -> Vec<String>;

    /// Configured base drop rate for a trophy kind.
    fn rate(&self, kind: TrophyKind) -> f64 {
        self.number(&kind.rate_key())
    }
}

/// Permission lookups.
pub trait PermissionOracle: Send + Sync {
    /// Whether `actor` holds `permission`.
    fn has_permission(&self, actor: &Actor, permission: &str) -> bool;
}

/// Builds reward items. The core treats the result as opaque.
pub trait ItemFactory: Send + Sync {
    /// Builds the reward for `kind`.
    fn build_reward(&self, kind: TrophyKind, options: RewardOptions) -> ItemStack;
}

/// Adapter to an external check system that can exempt actors.
///
/// Used only by the interaction simulator. Absent adapter means the
/// external system is not installed.
pub trait ExemptionAdapter: Send + Sync {
    /// Whether `actor` is currently exempt from `check`.
    fn is_exempt(&self, actor: ActorId, check: &str) -> bool;

    /// Exempts `actor` from `check` until revoked.
    fn grant_exemption(&self, actor: ActorId, check: &str);

    /// Removes the exemption.
    fn revoke_exemption(&self, actor: ActorId, check: &str);
}

/// Message delivery.
pub trait NotificationSink: Send + Sync {
    /// Sends `message` to one actor.
    fn send(&self, actor: ActorId, message: &str);

    /// Sends `message` to everyone.
    fn send_all(&self, message: &str);

    /// Everyone who could receive a ranged broadcast.
    fn recipients(&self) -> Vec<Recipient>;
}

/// World mutations performed when a trophy is granted.
pub trait WorldAccess: Send + Sync {
    /// Drops `item` at `location` as a world item.
    fn drop_item_naturally(&self, location: &Location, item: ItemStack);

    /// Turns the block at `location` into air.
    fn clear_block(&self, location: &Location);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_across_worlds_is_none() {
        let a = Location::new("world", 0.0, 0.0, 0.0);
        let b = Location::new("world_nether", 0.0, 0.0, 0.0);
        assert_eq!(a.distance_squared(&b), None);
    }

    #[test]
    fn test_distance_squared() {
        let a = Location::new("world", 1.0, 2.0, 3.0);
        let b = Location::new("world", 4.0, 6.0, 3.0);
        assert_eq!(a.distance_squared(&b), Some(25.0));
    }

    #[test]
    fn test_simulated_copy_is_tagged_and_uncancelled() {
        let block = Block::new("DIAMOND_ORE", Location::new("world", 0.0, 0.0, 0.0));
        let mut real = BlockBreak::new(block, None);
        real.set_cancelled(true);

        let copy = real.simulated_copy();
        assert!(copy.is_simulated());
        assert!(!copy.is_cancelled());
        assert_eq!(copy.block, real.block);
        assert_eq!(real.origin(), BreakOrigin::Genuine);
    }

    #[test]
    fn test_only_creative_is_reward_exempt() {
        assert!(GameMode::Creative.is_reward_exempt());
        assert!(!GameMode::Survival.is_reward_exempt());
        assert!(!GameMode::Adventure.is_reward_exempt());
    }
}
