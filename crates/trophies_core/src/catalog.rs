//! # Trophy Catalog
//!
//! The closed set of trophy classes, the block materials they are keyed
//! on, and the reverse lookup from an item's lore back to its class.
//!
//! ## Identification
//!
//! Every trophy item carries one identifying lore line:
//!
//! ```text
//! §r§5Diamond Ore §9§oMining Trophy      (as stored)
//! Diamond Ore Mining Trophy              (after strip_formatting)
//! ```
//!
//! [`LoreIndex`] maps the stripped line back to the [`TrophyKind`]. It is
//! built eagerly at startup and never mutated, so readers need no lock.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{TrophyError, TrophyResult};
use crate::item::ItemStack;

/// Formatting code prefix.
pub const FORMAT_PREFIX: char = '§';

/// Marker text present in every identifying lore line.
pub const TROPHY_MARKER: &str = "Mining Trophy";

pub(crate) const RESET: &str = "§r";
pub(crate) const DARK_PURPLE: &str = "§5";
pub(crate) const BLUE: &str = "§9";
pub(crate) const YELLOW: &str = "§e";
pub(crate) const ITALIC: &str = "§o";

/// Enchantment names used by trophy items.
pub mod enchantment {
    /// Bonus yield.
    pub const FORTUNE: &str = "LOOT_BONUS_BLOCKS";
    /// Fire aspect.
    pub const FIRE_ASPECT: &str = "FIRE_ASPECT";
    /// Aqua affinity.
    pub const AQUA_AFFINITY: &str = "WATER_WORKER";
}

/// A trophy class, keyed on the block material it is mined from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrophyKind {
    /// Perfect Diamond.
    DiamondOre,
    /// Perfect Emerald.
    EmeraldOre,
    /// Sparking Redstone.
    RedstoneOre,
    /// Marbled Lapis.
    LapisOre,
    /// Rose-Quartz.
    NetherQuartzOre,
    /// Pure Clay.
    Clay,
    /// Burning Glowstone.
    Glowstone,
    /// Scute of Shame.
    TurtleEgg,
    /// What-a-pane. Any unpaned stained glass counts as glass.
    Glass,
    /// Fuming Coal.
    CoalOre,
    /// Singing Shard.
    SeaLantern,
    /// Shimmering Water. Blue and packed ice count as ice.
    Ice,
}

impl TrophyKind {
    /// Every kind, in catalog order.
    pub const ALL: [TrophyKind; 12] = [
        Self::DiamondOre,
        Self::EmeraldOre,
        Self::RedstoneOre,
        Self::LapisOre,
        Self::NetherQuartzOre,
        Self::Clay,
        Self::Glowstone,
        Self::TurtleEgg,
        Self::Glass,
        Self::CoalOre,
        Self::SeaLantern,
        Self::Ice,
    ];

    /// Enum-style name, identical to the block material.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiamondOre => "DIAMOND_ORE",
            Self::EmeraldOre => "EMERALD_ORE",
            Self::RedstoneOre => "REDSTONE_ORE",
            Self::LapisOre => "LAPIS_ORE",
            Self::NetherQuartzOre => "NETHER_QUARTZ_ORE",
            Self::Clay => "CLAY",
            Self::Glowstone => "GLOWSTONE",
            Self::TurtleEgg => "TURTLE_EGG",
            Self::Glass => "GLASS",
            Self::CoalOre => "COAL_ORE",
            Self::SeaLantern => "SEA_LANTERN",
            Self::Ice => "ICE",
        }
    }

    /// Display name of the dropped trophy.
    #[must_use]
    pub const fn drop_name(self) -> &'static str {
        match self {
            Self::DiamondOre => "Perfect Diamond",
            Self::EmeraldOre => "Perfect Emerald",
            Self::RedstoneOre => "Sparking Redstone",
            Self::LapisOre => "Marbled Lapis",
            Self::NetherQuartzOre => "Rose-Quartz",
            Self::Clay => "Pure Clay",
            Self::Glowstone => "Burning Glowstone",
            Self::TurtleEgg => "Scute of Shame",
            Self::Glass => "What-a-pane",
            Self::CoalOre => "Fuming Coal",
            Self::SeaLantern => "Singing Shard",
            Self::Ice => "Shimmering Water",
        }
    }

    /// Material of the dropped trophy item.
    #[must_use]
    pub const fn drop_material(self) -> &'static str {
        match self {
            Self::DiamondOre => "DIAMOND",
            Self::EmeraldOre => "EMERALD",
            Self::RedstoneOre => "REDSTONE",
            Self::LapisOre => "LAPIS_LAZULI",
            Self::NetherQuartzOre => "QUARTZ",
            Self::Clay => "CLAY_BALL",
            Self::Glowstone => "GLOWSTONE_DUST",
            Self::TurtleEgg => "SCUTE",
            Self::Glass => "GLASS_PANE",
            Self::CoalOre => "COAL",
            Self::SeaLantern => "PRISMARINE_SHARD",
            Self::Ice => "POTION",
        }
    }

    /// Flavour lore line, if the kind has one.
    #[must_use]
    pub const fn flavour_lore(self) -> Option<&'static str> {
        match self {
            Self::TurtleEgg => Some("You know what you did."),
            Self::Glass => Some("For the experienced griefer."),
            Self::SeaLantern => Some("Hums with a strange energy."),
            _ => None,
        }
    }

    /// Enchantment applied to the trophy item for the glint.
    #[must_use]
    pub const fn drop_enchantment(self) -> &'static str {
        match self {
            Self::Glowstone => enchantment::FIRE_ASPECT,
            Self::TurtleEgg => enchantment::AQUA_AFFINITY,
            _ => enchantment::FORTUNE,
        }
    }

    /// Title-cased block name, e.g. `Nether Quartz Ore`.
    #[must_use]
    pub fn block_name(self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let lower = word.to_ascii_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lowercase name without separators, e.g. `netherquartzore`.
    #[must_use]
    pub fn short_name(self) -> String {
        self.name().replace('_', "").to_ascii_lowercase()
    }

    /// Config key holding this kind's base drop rate.
    #[must_use]
    pub fn rate_key(self) -> String {
        format!("{}droprate", self.short_name())
    }

    /// The formatted lore line that identifies a trophy of this kind.
    #[must_use]
    pub fn identifying_lore(self) -> String {
        format!(
            "{RESET}{DARK_PURPLE}{} {BLUE}{ITALIC}{TROPHY_MARKER}",
            self.block_name()
        )
    }

    /// Full lore: flavour line (if any) then the identifying line.
    #[must_use]
    pub fn lore(self) -> Vec<String> {
        let mut lore = Vec::with_capacity(2);
        if let Some(flavour) = self.flavour_lore() {
            lore.push(format!("{RESET}{DARK_PURPLE}{ITALIC}{flavour}"));
        }
        lore.push(self.identifying_lore());
        lore
    }

    /// Resolves the trophy kind mined from a block material.
    ///
    /// Unpaned stained glass resolves to [`TrophyKind::Glass`]; blue and
    /// packed ice resolve to [`TrophyKind::Ice`]; frosted ice never
    /// resolves.
    #[must_use]
    pub fn from_block(material: &str) -> Option<Self> {
        let material = material.to_ascii_uppercase();
        let material = if is_stained_glass_block(&material) {
            "GLASS"
        } else if is_ice_variant(&material) {
            "ICE"
        } else {
            material.as_str()
        };
        Self::ALL.into_iter().find(|kind| kind.name() == material)
    }

    /// Parses a kind from its enum-style name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`TrophyError::UnknownTrophy`] when no kind has that name.
    pub fn from_name(name: &str) -> TrophyResult<Self> {
        name.parse()
    }
}

fn is_stained_glass_block(material: &str) -> bool {
    material.contains("STAINED_GLASS") && !material.contains("PANE")
}

fn is_ice_variant(material: &str) -> bool {
    matches!(material, "BLUE_ICE" | "PACKED_ICE")
}

impl fmt::Display for TrophyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrophyKind {
    type Err = TrophyError;

    fn from_str(s: &str) -> TrophyResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TrophyError::UnknownTrophy(s.to_string()))
    }
}

/// Removes `§x` formatting codes from `text`.
#[must_use]
pub fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == FORMAT_PREFIX {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverse lookup from stripped identifying lore to trophy kind.
#[derive(Clone, Debug)]
pub struct LoreIndex {
    by_lore: HashMap<String, TrophyKind>,
}

impl LoreIndex {
    /// Builds the index for every kind.
    #[must_use]
    pub fn build() -> Self {
        let by_lore = TrophyKind::ALL
            .into_iter()
            .map(|kind| (strip_formatting(&kind.identifying_lore()), kind))
            .collect();
        Self { by_lore }
    }

    /// Identifies a single lore line, formatted or not.
    #[must_use]
    pub fn identify_lore(&self, line: &str) -> Option<TrophyKind> {
        self.by_lore.get(&strip_formatting(line)).copied()
    }

    /// Identifies an item by the first lore line that matches.
    #[must_use]
    pub fn identify_item(&self, item: &ItemStack) -> Option<TrophyKind> {
        item.lore.iter().find_map(|line| self.identify_lore(line))
    }

    /// Number of indexed kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_lore.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_lore.is_empty()
    }
}

impl Default for LoreIndex {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(TrophyKind::NetherQuartzOre.block_name(), "Nether Quartz Ore");
        assert_eq!(TrophyKind::NetherQuartzOre.short_name(), "netherquartzore");
        assert_eq!(TrophyKind::DiamondOre.rate_key(), "diamondoredroprate");
        assert_eq!(TrophyKind::Clay.block_name(), "Clay");
    }

    #[test]
    fn test_block_resolution() {
        assert_eq!(TrophyKind::from_block("DIAMOND_ORE"), Some(TrophyKind::DiamondOre));
        assert_eq!(TrophyKind::from_block("RED_STAINED_GLASS"), Some(TrophyKind::Glass));
        assert_eq!(TrophyKind::from_block("RED_STAINED_GLASS_PANE"), None);
        assert_eq!(TrophyKind::from_block("PACKED_ICE"), Some(TrophyKind::Ice));
        assert_eq!(TrophyKind::from_block("BLUE_ICE"), Some(TrophyKind::Ice));
        assert_eq!(TrophyKind::from_block("FROSTED_ICE"), None);
        assert_eq!(TrophyKind::from_block("STONE"), None);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("sea_lantern".parse::<TrophyKind>().ok(), Some(TrophyKind::SeaLantern));
        assert!(matches!(
            "bedrock".parse::<TrophyKind>(),
            Err(TrophyError::UnknownTrophy(name)) if name == "bedrock"
        ));
    }

    #[test]
    fn test_strip_formatting() {
        assert_eq!(
            strip_formatting(&TrophyKind::DiamondOre.identifying_lore()),
            "Diamond Ore Mining Trophy"
        );
        assert_eq!(strip_formatting("plain"), "plain");
    }

    #[test]
    fn test_lore_index_covers_every_kind() {
        let index = LoreIndex::build();
        assert_eq!(index.len(), TrophyKind::ALL.len());
        for kind in TrophyKind::ALL {
            assert_eq!(index.identify_lore(&kind.identifying_lore()), Some(kind));
        }
        assert_eq!(index.identify_lore("Stone Mining Trophy"), None);
    }

    #[test]
    fn test_flavour_lore_comes_first() {
        let lore = TrophyKind::TurtleEgg.lore();
        assert_eq!(lore.len(), 2);
        assert!(lore[0].contains("You know what you did."));
        assert_eq!(lore[1], TrophyKind::TurtleEgg.identifying_lore());
        assert_eq!(TrophyKind::CoalOre.lore().len(), 1);
    }
}
