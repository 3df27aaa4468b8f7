//! # Configuration
//!
//! TOML-backed configuration provider.
//!
//! Lookups never fail. A missing key reads as the safe default
//! (`0.0`, `false`, `0`, empty list); a key of the wrong type does too,
//! with a warning. A rate that cannot be read therefore disables that
//! trophy instead of breaking the pipeline.
//!
//! ```toml
//! fortunerate = 0.5
//! broadcast = true
//! broadcastrange = 64
//! diamondoredroprate = 0.01
//! disallowedtools = ["SHEARS"]
//! ```

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use toml::{Table, Value};

use crate::collaborators::ConfigProvider;
use crate::error::{TrophyError, TrophyResult};

/// The bundled default configuration.
pub const DEFAULT_CONFIG: &str = r#"# Mining Trophies

# Per-level bonus for the fortune enchantment:
# effective rate = base rate * (1 + fortunerate * level)
fortunerate = 0.25

# Announce trophies. broadcastrange <= 0 means everyone.
broadcast = true
broadcastrange = 0

# Cosmetics of the dropped trophy.
addenchants = true
addeffects = true
addlore = true

# Stop trophies being placed as blocks.
disableplacement = true

# Rebuild trophy items when they spawn in the world.
fixdroppedtrophies = false

# Tools that never earn trophies.
disallowedtools = ["SHEARS"]

# Deterministic roll seed for the host. Remove for entropy.
# seed = 1234

# Base drop rates in [0, 1]. 0 disables the trophy.
diamondoredroprate = 0.001
emeraldoredroprate = 0.001
redstoneoredroprate = 0.0005
lapisoredroprate = 0.0005
netherquartzoredroprate = 0.0005
claydroprate = 0.001
glowstonedroprate = 0.0005
turtleeggdroprate = 0.01
glassdroprate = 0.0001
coaloredroprate = 0.0001
sealanterndroprate = 0.001
icedroprate = 0.0005
"#;

/// A parsed TOML configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TomlConfig {
    table: Table,
}

impl TomlConfig {
    /// Parses `text`. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`TrophyError::ConfigParse`] when `text` is not valid TOML.
    pub fn parse(text: &str, origin: &str) -> TrophyResult<Self> {
        let table = text.parse::<Table>().map_err(|e| TrophyError::ConfigParse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { table })
    }

    /// The bundled defaults.
    ///
    /// # Errors
    ///
    /// Only if [`DEFAULT_CONFIG`] itself is malformed.
    pub fn defaults() -> TrophyResult<Self> {
        Self::parse(DEFAULT_CONFIG, "<default>")
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// [`TrophyError::ConfigIo`] if the file cannot be read,
    /// [`TrophyError::ConfigParse`] if it is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> TrophyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TrophyError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// The raw table.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Sets a raw value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.table.insert(key.to_string(), value.into());
    }

    fn lookup(&self, key: &str, expected: &str) -> Option<&Value> {
        let value = self.table.get(key);
        if value.is_none() {
            tracing::trace!(key, expected, "config key missing, using default");
        }
        value
    }
}

fn mistyped(key: &str, expected: &str, value: &Value) {
    tracing::warn!(
        key,
        expected,
        found = value.type_str(),
        "config value has the wrong type, using default"
    );
}

impl ConfigProvider for TomlConfig {
    #[allow(clippy::cast_precision_loss)]
    fn number(&self, key: &str) -> f64 {
        match self.lookup(key, "float") {
            Some(Value::Float(f)) => *f,
            Some(Value::Integer(i)) => *i as f64,
            Some(other) => {
                mistyped(key, "float", other);
                0.0
            }
            None => 0.0,
        }
    }

    fn flag(&self, key: &str) -> bool {
        match self.lookup(key, "boolean") {
            Some(Value::Boolean(b)) => *b,
            Some(other) => {
                mistyped(key, "boolean", other);
                false
            }
            None => false,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn int(&self, key: &str) -> i64 {
        match self.lookup(key, "integer") {
            Some(Value::Integer(i)) => *i,
            Some(Value::Float(f)) if f.fract() == 0.0 => *f as i64,
            Some(other) => {
                mistyped(key, "integer", other);
                0
            }
            None => 0,
        }
    }

    fn strings(&self, key: &str) -> Vec<String> {
        match self.lookup(key, "array") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => {
                        mistyped(key, "string", other);
                        None
                    }
                })
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            Some(other) => {
                mistyped(key, "array", other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

/// A reloadable configuration.
///
/// The pipeline holds an `Arc<SharedConfig>` as its provider; the host
/// swaps the contents with [`reload`](Self::reload). Each lookup takes the
/// read lock once, so a single decision may see values from both sides of
/// a concurrent reload.
#[derive(Debug)]
pub struct SharedConfig {
    path: Option<PathBuf>,
    current: RwLock<TomlConfig>,
}

impl SharedConfig {
    /// Wraps an in-memory configuration. [`reload`](Self::reload) is a no-op.
    #[must_use]
    pub fn new(config: TomlConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(config),
        }
    }

    /// Loads from `path` and remembers it for reloads.
    ///
    /// # Errors
    ///
    /// See [`TomlConfig::load`].
    pub fn load(path: impl Into<PathBuf>) -> TrophyResult<Self> {
        let path = path.into();
        let config = TomlConfig::load(&path)?;
        tracing::info!(path = %path.display(), keys = config.table.len(), "config loaded");
        Ok(Self {
            path: Some(path),
            current: RwLock::new(config),
        })
    }

    /// The backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-reads the backing file. On failure the previous configuration
    /// stays in effect.
    ///
    /// # Errors
    ///
    /// See [`TomlConfig::load`].
    pub fn reload(&self) -> TrophyResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match TomlConfig::load(path) {
            Ok(config) => {
                *self.current.write() = config;
                tracing::info!(path = %path.display(), "config reloaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config reload failed, keeping previous");
                Err(e)
            }
        }
    }

    /// Replaces the configuration outright.
    pub fn replace(&self, config: TomlConfig) {
        *self.current.write() = config;
    }

    /// A copy of the current configuration.
    #[must_use]
    pub fn snapshot(&self) -> TomlConfig {
        self.current.read().clone()
    }
}

impl ConfigProvider for SharedConfig {
    fn number(&self, key: &str) -> f64 {
        self.current.read().number(key)
    }

    fn flag(&self, key: &str) -> bool {
        self.current.read().flag(key)
    }

    fn int(&self, key: &str) -> i64 {
        self.current.read().int(key)
    }

    fn strings(&self, key: &str) -> Vec<String> {
        self.current.read().strings(key)
    }
}
