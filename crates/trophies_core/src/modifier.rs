//! # Drop Rate Modifiers
//!
//! An ordered chain of named transforms folded over a base rate.
//!
//! ## Ordering
//!
//! ```text
//! set("fortune", x2)   order: [fortune]
//! set("a:luck", +0.1)  order: [fortune, a:luck]
//! set("fortune", x3)   order: [fortune, a:luck]      (overwrite keeps its slot)
//! remove("fortune")    order: [a:luck]
//! set("fortune", x3)   order: [a:luck, fortune]      (fresh insert appends)
//! ```
//!
//! `(0.1 * 2) + 0.1` and `(0.1 + 0.1) * 2` differ, so the order is part of
//! the chain's meaning. It is kept in an explicit key list next to the
//! value map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved key for the tool's bonus-yield modifier.
///
/// Unprefixed. External owners use [`ModifierChain::custom_key`] instead.
pub const BONUS_YIELD_KEY: &str = "fortune";

/// Operation a modifier performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    /// `x * value`
    Multiply,
    /// `x + value`
    Add,
}

/// A single immutable rate transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    kind: ModifierKind,
    value: f64,
}

impl Modifier {
    /// Creates a modifier of the given kind.
    #[must_use]
    pub const fn new(kind: ModifierKind, value: f64) -> Self {
        Self { kind, value }
    }

    /// Creates a multiplying modifier.
    #[must_use]
    pub const fn multiply(value: f64) -> Self {
        Self::new(ModifierKind::Multiply, value)
    }

    /// Creates an adding modifier.
    #[must_use]
    pub const fn add(value: f64) -> Self {
        Self::new(ModifierKind::Add, value)
    }

    /// The operation.
    #[must_use]
    pub const fn kind(&self) -> ModifierKind {
        self.kind
    }

    /// The operand.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Applies this modifier to `x`.
    #[inline]
    #[must_use]
    pub fn apply(&self, x: f64) -> f64 {
        match self.kind {
            ModifierKind::Multiply => x * self.value,
            ModifierKind::Add => x + self.value,
        }
    }
}

/// Insertion-ordered mapping of key to [`Modifier`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModifierChain {
    /// Keys in application order.
    order: Vec<String>,
    /// Modifier per key.
    entries: HashMap<String, Modifier>,
}

impl ModifierChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the namespaced key `{owner}:{name}` for external modifiers.
    #[must_use]
    pub fn custom_key(owner: &str, name: &str) -> String {
        format!("{owner}:{name}")
    }

    /// Inserts or replaces a modifier.
    ///
    /// Replacing keeps the key's position. Returns the previous modifier.
    pub fn set(&mut self, key: impl Into<String>, modifier: Modifier) -> Option<Modifier> {
        let key = key.into();
        if let Some(slot) = self.entries.get_mut(&key) {
            return Some(std::mem::replace(slot, modifier));
        }
        self.order.push(key.clone());
        self.entries.insert(key, modifier);
        None
    }

    /// Inserts or replaces a modifier under `{owner}:{name}`.
    pub fn set_custom(&mut self, owner: &str, name: &str, modifier: Modifier) -> Option<Modifier> {
        self.set(Self::custom_key(owner, name), modifier)
    }

    /// Looks up a modifier.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Modifier> {
        self.entries.get(key).copied()
    }

    /// Looks up a modifier stored under `{owner}:{name}`.
    #[must_use]
    pub fn get_custom(&self, owner: &str, name: &str) -> Option<Modifier> {
        self.get(&Self::custom_key(owner, name))
    }

    /// Removes a modifier. Re-adding the key later appends it at the end.
    pub fn remove(&mut self, key: &str) -> Option<Modifier> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    /// Replaces the whole chain with `entries`, in iteration order.
    pub fn replace_all<K, I>(&mut self, entries: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Modifier)>,
    {
        self.clear();
        for (key, modifier) in entries {
            self.set(key, modifier);
        }
    }

    /// Removes every modifier.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of modifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in application order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(key, modifier)` pairs in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Modifier)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|m| (key.as_str(), *m)))
    }

    /// Folds `base_rate` through every modifier, each exactly once, in order.
    #[must_use]
    pub fn apply_all(&self, base_rate: f64) -> f64 {
        self.iter().fold(base_rate, |rate, (_, modifier)| modifier.apply(rate))
    }
}
