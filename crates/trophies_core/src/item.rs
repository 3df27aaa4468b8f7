//! # Trophy Items
//!
//! Plain item data plus the default factory that dresses a trophy up
//! from the catalog. The pipeline hands the item around without looking
//! inside it.

use crate::catalog::{TrophyKind, RESET, YELLOW};
use crate::collaborators::{ConfigProvider, ItemFactory};

/// Server ticks per second.
pub const TICKS_PER_SECOND: u32 = 20;

/// A potion effect carried by a potion item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PotionEffect {
    /// Effect name, e.g. `GLOWING`.
    pub effect: String,
    /// Duration in ticks.
    pub duration_ticks: u32,
    /// Amplifier (0 = level I).
    pub amplifier: u32,
    /// Whether the effect is ambient.
    pub ambient: bool,
}

/// Potion-specific item data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PotionData {
    /// Liquid colour as `0xRRGGBB`.
    pub color: u32,
    /// Custom effects.
    pub effects: Vec<PotionEffect>,
    /// Hide the effect list in the tooltip.
    pub hide_effects: bool,
}

/// An item stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemStack {
    /// Material name.
    pub material: String,
    /// Stack size.
    pub amount: u32,
    /// Custom display name.
    pub display_name: Option<String>,
    /// Lore lines.
    pub lore: Vec<String>,
    /// `(enchantment, level)` pairs.
    pub enchantments: Vec<(String, u32)>,
    /// Hide the enchantment list in the tooltip.
    pub hide_enchants: bool,
    /// Potion data, for potions.
    pub potion: Option<PotionData>,
}

impl ItemStack {
    /// A plain stack of `amount` items.
    #[must_use]
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            ..Self::default()
        }
    }

    /// Whether this is an empty (air) stack.
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.amount == 0 || self.material.is_empty() || self.material.ends_with("AIR")
    }
}

/// Cosmetic switches for reward construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardOptions {
    /// Apply the glint enchantment.
    pub enchants: bool,
    /// Apply potion effects (ice trophy only).
    pub effects: bool,
    /// Attach lore, including the identifying line.
    pub lore: bool,
}

impl RewardOptions {
    /// Reads `addenchants`, `addeffects` and `addlore`.
    #[must_use]
    pub fn from_config(config: &dyn ConfigProvider) -> Self {
        Self {
            enchants: config.flag("addenchants"),
            effects: config.flag("addeffects"),
            lore: config.flag("addlore"),
        }
    }
}

impl Default for RewardOptions {
    fn default() -> Self {
        Self {
            enchants: true,
            effects: true,
            lore: true,
        }
    }
}

/// Builds trophy items from the catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogItemFactory;

impl CatalogItemFactory {
    /// Creates the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds one trophy item of `kind`.
    #[must_use]
    pub fn create_drop(kind: TrophyKind, options: RewardOptions) -> ItemStack {
        let mut stack = ItemStack::new(kind.drop_material(), 1);
        stack.display_name = Some(format!("{RESET}{YELLOW}{}", kind.drop_name()));

        if options.lore {
            stack.lore = kind.lore();
        }
        if options.enchants {
            stack.enchantments.push((kind.drop_enchantment().to_string(), 1));
            stack.hide_enchants = true;
        }
        if kind == TrophyKind::Ice {
            stack.potion = Some(shimmering_water(options.effects));
        }
        stack
    }
}

fn shimmering_water(with_effects: bool) -> PotionData {
    let mut potion = PotionData {
        color: 0x00_00FF,
        effects: Vec::new(),
        hide_effects: true,
    };
    if with_effects {
        potion.effects.push(PotionEffect {
            effect: "GLOWING".to_string(),
            duration_ticks: 300 * TICKS_PER_SECOND,
            amplifier: 1,
            ambient: true,
        });
        potion.effects.push(PotionEffect {
            effect: "SATURATION".to_string(),
            duration_ticks: 3 * TICKS_PER_SECOND,
            amplifier: 10,
            ambient: false,
        });
    }
    potion
}

impl ItemFactory for CatalogItemFactory {
    fn build_reward(&self, kind: TrophyKind, options: RewardOptions) -> ItemStack {
        Self::create_drop(kind, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{strip_formatting, LoreIndex};

    #[test]
    fn test_full_drop() {
        let item = CatalogItemFactory::create_drop(TrophyKind::DiamondOre, RewardOptions::default());
        assert_eq!(item.material, "DIAMOND");
        assert_eq!(item.amount, 1);
        assert_eq!(
            item.display_name.as_deref().map(strip_formatting).as_deref(),
            Some("Perfect Diamond")
        );
        assert_eq!(item.enchantments, vec![("LOOT_BONUS_BLOCKS".to_string(), 1)]);
        assert!(item.hide_enchants);
        assert!(item.potion.is_none());
        assert_eq!(LoreIndex::build().identify_item(&item), Some(TrophyKind::DiamondOre));
    }

    #[test]
    fn test_bare_drop_has_no_lore_or_enchants() {
        let options = RewardOptions {
            enchants: false,
            effects: false,
            lore: false,
        };
        let item = CatalogItemFactory::create_drop(TrophyKind::Glowstone, options);
        assert!(item.lore.is_empty());
        assert!(item.enchantments.is_empty());
        assert!(!item.hide_enchants);
        assert_eq!(LoreIndex::build().identify_item(&item), None);
    }

    #[test]
    fn test_ice_is_a_potion() {
        let item = CatalogItemFactory::create_drop(TrophyKind::Ice, RewardOptions::default());
        let potion = item.potion.expect("ice trophy is a potion");
        assert_eq!(potion.color, 0x0000FF);
        assert!(potion.hide_effects);
        assert_eq!(potion.effects.len(), 2);
        assert_eq!(potion.effects[0].duration_ticks, 6000);

        let quiet = CatalogItemFactory::create_drop(
            TrophyKind::Ice,
            RewardOptions {
                effects: false,
                ..RewardOptions::default()
            },
        );
        assert!(quiet.potion.is_some_and(|p| p.effects.is_empty()));
    }

    #[test]
    fn test_air_detection() {
        assert!(ItemStack::new("AIR", 1).is_air());
        assert!(ItemStack::new("CAVE_AIR", 1).is_air());
        assert!(ItemStack::new("DIAMOND", 0).is_air());
        assert!(!ItemStack::new("DIAMOND", 1).is_air());
    }
}
