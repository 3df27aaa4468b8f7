//! # Host Settings
//!
//! Host-only keys read from the same TOML file as the trophy settings.
//!
//! ```toml
//! seed = 1234              # deterministic rolls; omit for entropy
//! fastbreakticks = 5       # min ticks between one player's breaks
//! fastbreakexemptions = true  # let the pipeline exempt its dry runs
//!
//! [[protectedregion]]
//! world = "world"
//! min = [-16, 0, -16]
//! max = [16, 255, 16]
//! ```

use serde::Deserialize;
use trophies_core::{Location, TomlConfig, TrophyError, TrophyResult};

/// Default fast-break window in ticks.
pub const DEFAULT_FAST_BREAK_TICKS: u64 = 5;

/// An axis-aligned block box in one world.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RegionBox {
    /// World name.
    pub world: String,
    /// Inclusive minimum corner.
    pub min: [i64; 3],
    /// Inclusive maximum corner.
    pub max: [i64; 3],
}

impl RegionBox {
    /// Whether the block containing `location` lies inside the box.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn contains(&self, location: &Location) -> bool {
        if location.world != self.world {
            return false;
        }
        let block = [
            location.x.floor() as i64,
            location.y.floor() as i64,
            location.z.floor() as i64,
        ];
        (0..3).all(|axis| self.min[axis] <= block[axis] && block[axis] <= self.max[axis])
    }
}

/// Host settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostSettings {
    /// Roll seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Fast-break window in ticks.
    #[serde(rename = "fastbreakticks")]
    pub fast_break_ticks: u64,
    /// Whether the fast-break monitor is handed to the pipeline as its
    /// exemption adapter.
    #[serde(rename = "fastbreakexemptions")]
    pub fast_break_exemptions: bool,
    /// Protected regions.
    #[serde(rename = "protectedregion")]
    pub protected_regions: Vec<RegionBox>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            seed: None,
            fast_break_ticks: DEFAULT_FAST_BREAK_TICKS,
            fast_break_exemptions: true,
            protected_regions: Vec::new(),
        }
    }
}

impl HostSettings {
    /// Extracts the host keys from `config`. Unrelated keys are ignored.
    ///
    /// # Errors
    ///
    /// [`TrophyError::ConfigParse`] if a host key has the wrong shape.
    pub fn from_config(config: &TomlConfig) -> TrophyResult<Self> {
        toml::Value::Table(config.table().clone())
            .try_into()
            .map_err(|e: toml::de::Error| TrophyError::ConfigParse {
                origin: "host settings".to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_bundled_config() {
        let config = TomlConfig::defaults().expect("bundled config parses");
        let settings = HostSettings::from_config(&config).expect("host keys parse");
        assert_eq!(settings, HostSettings::default());
    }

    #[test]
    fn test_host_keys() {
        let config = TomlConfig::parse(
            r#"
            seed = 99
            fastbreakticks = 3
            diamondoredroprate = 0.5

            [[protectedregion]]
            world = "world"
            min = [0, 0, 0]
            max = [9, 9, 9]
            "#,
            "test",
        )
        .expect("valid toml");

        let settings = HostSettings::from_config(&config).expect("host keys parse");
        assert_eq!(settings.seed, Some(99));
        assert_eq!(settings.fast_break_ticks, 3);
        assert_eq!(settings.protected_regions.len(), 1);

        let region = &settings.protected_regions[0];
        assert!(region.contains(&Location::new("world", 9.9, 0.0, 0.5)));
        assert!(!region.contains(&Location::new("world", 10.0, 0.0, 0.5)));
        assert!(!region.contains(&Location::new("world_nether", 1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_bad_shape_is_an_error() {
        let config = TomlConfig::parse("seed = \"lucky\"", "test").expect("valid toml");
        assert!(matches!(
            HostSettings::from_config(&config),
            Err(TrophyError::ConfigParse { .. })
        ));
    }
}
