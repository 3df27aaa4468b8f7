//! # Trophy Guards
//!
//! Two host-side protections for trophies already in the world:
//!
//! - placement: a trophy item must not be placed as a block
//!   (`disableplacement`);
//! - repair: a trophy item entity is rebuilt from the catalog when it
//!   spawns, picking up cosmetic changes (`fixdroppedtrophies`).

use std::sync::Arc;

use crate::catalog::{LoreIndex, TROPHY_MARKER};
use crate::collaborators::{ConfigProvider, ItemFactory};
use crate::item::{ItemStack, RewardOptions};

/// Placement and repair checks over a shared [`LoreIndex`].
#[derive(Clone, Debug)]
pub struct TrophyGuards {
    index: Arc<LoreIndex>,
}

impl TrophyGuards {
    /// Creates guards over `index`.
    #[must_use]
    pub fn new(index: Arc<LoreIndex>) -> Self {
        Self { index }
    }

    /// The lookup index.
    #[must_use]
    pub fn index(&self) -> &LoreIndex {
        &self.index
    }

    /// Whether placing `item` must be cancelled.
    #[must_use]
    pub fn should_block_placement(&self, item: &ItemStack, config: &dyn ConfigProvider) -> bool {
        config.flag("disableplacement") && item.lore.iter().any(|line| line.contains(TROPHY_MARKER))
    }

    /// Rebuilds a spawned trophy item.
    ///
    /// Returns the replacement stack, or `None` to keep `item` as is: when
    /// repair is off, when `item` is not a trophy, or when the factory
    /// returns air.
    #[must_use]
    pub fn repair_dropped(
        &self,
        item: &ItemStack,
        config: &dyn ConfigProvider,
        factory: &dyn ItemFactory,
    ) -> Option<ItemStack> {
        if !config.flag("fixdroppedtrophies") {
            return None;
        }
        let kind = self.index.identify_item(item)?;
        let replacement = factory.build_reward(kind, RewardOptions::from_config(config));
        if replacement.is_air() {
            tracing::warn!(%kind, "replacement trophy item was air");
            return None;
        }
        Some(replacement)
    }
}

impl Default for TrophyGuards {
    fn default() -> Self {
        Self::new(Arc::new(LoreIndex::build()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrophyKind;
    use crate::item::CatalogItemFactory;
    use crate::mock::MockConfig;

    struct AirFactory;
    impl ItemFactory for AirFactory {
        fn build_reward(&self, _kind: TrophyKind, _options: RewardOptions) -> ItemStack {
            ItemStack::new("AIR", 1)
        }
    }

    fn trophy(kind: TrophyKind) -> ItemStack {
        CatalogItemFactory::create_drop(kind, RewardOptions::default())
    }

    #[test]
    fn test_placement_blocked_only_when_enabled() {
        let guards = TrophyGuards::default();
        let config = MockConfig::new();
        let item = trophy(TrophyKind::Glowstone);

        assert!(!guards.should_block_placement(&item, &config));
        config.set_flag("disableplacement", true);
        assert!(guards.should_block_placement(&item, &config));
        assert!(!guards.should_block_placement(&ItemStack::new("GLOWSTONE", 1), &config));
    }

    #[test]
    fn test_repair_rebuilds_with_current_options() {
        let guards = TrophyGuards::default();
        let config = MockConfig::new();
        config.set_flag("fixdroppedtrophies", true);
        config.set_flag("addlore", true);

        let mut stale = trophy(TrophyKind::SeaLantern);
        stale.enchantments.push(("DURABILITY".into(), 3));

        let repaired = guards
            .repair_dropped(&stale, &config, &CatalogItemFactory::new())
            .expect("trophy is repaired");
        assert!(repaired.enchantments.is_empty(), "addenchants is off");
        assert_eq!(guards.index().identify_item(&repaired), Some(TrophyKind::SeaLantern));
    }

    #[test]
    fn test_repair_skips_plain_items_and_air() {
        let guards = TrophyGuards::default();
        let config = MockConfig::new();
        config.set_flag("fixdroppedtrophies", true);

        let plain = ItemStack::new("DIAMOND", 1);
        assert_eq!(guards.repair_dropped(&plain, &config, &CatalogItemFactory::new()), None);
        assert_eq!(guards.repair_dropped(&trophy(TrophyKind::Clay), &config, &AirFactory), None);
    }

    #[test]
    fn test_repair_disabled() {
        let guards = TrophyGuards::default();
        let config = MockConfig::new();
        let item = trophy(TrophyKind::Clay);
        assert_eq!(guards.repair_dropped(&item, &config, &CatalogItemFactory::new()), None);
    }
}
