//! # Roll Evaluation
//!
//! A [`RollRecord`] carries everything about one drop-probability
//! decision. [`RollEvaluator`] owns the only success predicate:
//!
//! ```text
//! success = effective_roll < effective_rate      (strict; equal fails)
//! ```
//!
//! Both the roll and the rate are stored, so a decision can be re-derived
//! from the record alone. Rolls are drawn through [`RollSource`] so tests
//! can script them and count draws.

use std::collections::VecDeque;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catalog::TrophyKind;
use crate::collaborators::ActorId;
use crate::modifier::{Modifier, ModifierChain};

/// Placeholder effective rate until the modifiers are first applied.
pub const UNCOMPUTED_RATE: f64 = 100.0;

/// State of one drop-probability decision.
#[derive(Clone, Debug, PartialEq)]
pub struct RollRecord {
    target: TrophyKind,
    material: String,
    miner: ActorId,
    miner_always_rewarded: bool,
    original_roll: f64,
    effective_roll: f64,
    original_rate: f64,
    effective_rate: f64,
    success: bool,
    modifiers: ModifierChain,
}

impl RollRecord {
    /// Creates a record for a fresh roll.
    ///
    /// `effective_roll` starts at `original_roll`, `effective_rate` at
    /// [`UNCOMPUTED_RATE`], `success` at `false`, and the chain empty.
    #[must_use]
    pub fn new(
        target: TrophyKind,
        material: impl Into<String>,
        miner: ActorId,
        miner_always_rewarded: bool,
        original_roll: f64,
        original_rate: f64,
    ) -> Self {
        Self {
            target,
            material: material.into(),
            miner,
            miner_always_rewarded,
            original_roll,
            effective_roll: original_roll,
            original_rate,
            effective_rate: UNCOMPUTED_RATE,
            success: false,
            modifiers: ModifierChain::new(),
        }
    }

    /// Trophy class being rolled for.
    #[must_use]
    pub const fn target(&self) -> TrophyKind {
        self.target
    }

    /// Material of the mined block (before glass/ice folding).
    #[must_use]
    pub fn material(&self) -> &str {
        &self.material
    }

    /// The mining actor.
    #[must_use]
    pub const fn miner(&self) -> ActorId {
        self.miner
    }

    /// Whether the miner always gets a winning roll.
    #[must_use]
    pub const fn miner_always_rewarded(&self) -> bool {
        self.miner_always_rewarded
    }

    /// The raw sample in `[0, 1)`.
    #[must_use]
    pub const fn original_roll(&self) -> f64 {
        self.original_roll
    }

    /// The roll compared against the rate.
    #[must_use]
    pub const fn effective_roll(&self) -> f64 {
        self.effective_roll
    }

    /// Sets the roll compared against the rate. Takes effect on the next
    /// [`RollEvaluator::apply_drop_rate`].
    pub fn set_effective_roll(&mut self, roll: f64) {
        self.effective_roll = roll;
    }

    /// The configured base rate.
    #[must_use]
    pub const fn original_rate(&self) -> f64 {
        self.original_rate
    }

    /// The base rate after modifiers.
    #[must_use]
    pub const fn effective_rate(&self) -> f64 {
        self.effective_rate
    }

    /// Overrides the effective rate. The next
    /// [`RollEvaluator::apply_modifiers`] discards this.
    pub fn set_effective_rate(&mut self, rate: f64) {
        self.effective_rate = rate;
    }

    /// Whether the roll succeeded.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Forces the outcome.
    pub fn set_success(&mut self, success: bool) {
        self.success = success;
    }

    /// The modifier chain.
    #[must_use]
    pub fn modifiers(&self) -> &ModifierChain {
        &self.modifiers
    }

    /// Mutable access to the modifier chain.
    pub fn modifiers_mut(&mut self) -> &mut ModifierChain {
        &mut self.modifiers
    }

    /// Stores a modifier under `{owner}:{name}`, optionally recalculating.
    pub fn set_custom_modifier(
        &mut self,
        owner: &str,
        name: &str,
        modifier: Modifier,
        recalculate: bool,
    ) {
        self.modifiers.set_custom(owner, name, modifier);
        if recalculate {
            self.recalculate(true);
        }
    }

    /// Shorthand for [`RollEvaluator::recalculate`].
    pub fn recalculate(&mut self, reapply_modifiers: bool) {
        RollEvaluator::recalculate(self, reapply_modifiers);
    }
}

/// Pure evaluation over a [`RollRecord`].
pub struct RollEvaluator;

impl RollEvaluator {
    /// Decides success from the stored roll and rate.
    ///
    /// Always-rewarded miners get their effective roll forced to `0`.
    pub fn apply_drop_rate(record: &mut RollRecord) {
        if record.miner_always_rewarded {
            record.effective_roll = 0.0;
        }
        record.success = record.effective_roll < record.effective_rate;
    }

    /// Recomputes the effective rate from the original rate and the chain.
    /// Does not touch `success`.
    pub fn apply_modifiers(record: &mut RollRecord) {
        record.effective_rate = record.modifiers.apply_all(record.original_rate);
    }

    /// [`apply_modifiers`](Self::apply_modifiers) when asked, then always
    /// [`apply_drop_rate`](Self::apply_drop_rate). Idempotent without
    /// outside mutation in between.
    pub fn recalculate(record: &mut RollRecord, reapply_modifiers: bool) {
        if reapply_modifiers {
            Self::apply_modifiers(record);
        }
        Self::apply_drop_rate(record);
    }
}

/// Source of roll samples in `[0, 1)`.
pub trait RollSource {
    /// Draws one sample.
    fn sample(&mut self) -> f64;
}

/// Adapts any `rand` generator.
#[derive(Clone, Debug)]
pub struct RngRolls<R> {
    rng: R,
}

impl<R: RngCore> RngRolls<R> {
    /// Wraps a generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngRolls<ChaCha8Rng> {
    /// Deterministic rolls from `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Rolls seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: RngCore> RollSource for RngRolls<R> {
    fn sample(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays scripted samples and counts draws.
///
/// Once the script runs out every further draw returns `fallback`.
#[derive(Clone, Debug)]
pub struct FixedRolls {
    script: VecDeque<f64>,
    fallback: f64,
    draws: usize,
}

impl FixedRolls {
    /// Replays `samples` in order, then `0.999_999`.
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: samples.into_iter().collect(),
            fallback: 0.999_999,
            draws: 0,
        }
    }

    /// Always returns `sample`.
    #[must_use]
    pub fn constant(sample: f64) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: sample,
            draws: 0,
        }
    }

    /// How many samples have been drawn.
    #[must_use]
    pub const fn draws(&self) -> usize {
        self.draws
    }
}

impl RollSource for FixedRolls {
    fn sample(&mut self) -> f64 {
        self.draws += 1;
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::BONUS_YIELD_KEY;

    fn record(roll: f64, rate: f64, always: bool) -> RollRecord {
        RollRecord::new(TrophyKind::DiamondOre, "DIAMOND_ORE", 1, always, roll, rate)
    }

    #[test]
    fn test_new_record_defaults() {
        let r = record(0.3, 0.1, false);
        assert_eq!(r.effective_roll(), 0.3);
        assert_eq!(r.effective_rate(), UNCOMPUTED_RATE);
        assert!(!r.success());
        assert!(r.modifiers().is_empty());
    }

    #[test]
    fn test_strict_less_than() {
        let mut r = record(0.25, 0.25, false);
        RollEvaluator::recalculate(&mut r, true);
        assert!(!r.success(), "equality must fail");

        let mut r = record(0.249, 0.25, false);
        RollEvaluator::recalculate(&mut r, true);
        assert!(r.success());
    }

    #[test]
    fn test_always_rewarded_forces_zero_roll() {
        let mut r = record(0.99, 0.01, true);
        RollEvaluator::recalculate(&mut r, true);
        assert_eq!(r.effective_roll(), 0.0);
        assert_eq!(r.original_roll(), 0.99);
        assert!(r.success());
    }

    #[test]
    fn test_always_rewarded_still_needs_positive_rate() {
        let mut r = record(0.5, 0.0, true);
        RollEvaluator::recalculate(&mut r, true);
        assert!(!r.success());

        r.modifiers_mut().set("bonus", Modifier::add(0.01));
        RollEvaluator::recalculate(&mut r, true);
        assert!(r.success());
    }

    #[test]
    fn test_apply_modifiers_discards_override_and_keeps_success() {
        let mut r = record(0.5, 0.2, false);
        r.modifiers_mut().set(BONUS_YIELD_KEY, Modifier::multiply(2.0));
        r.set_effective_rate(0.9);
        r.set_success(true);

        RollEvaluator::apply_modifiers(&mut r);
        assert_eq!(r.effective_rate(), 0.4);
        assert!(r.success(), "apply_modifiers must not touch success");
    }

    #[test]
    fn test_recalculate_without_modifiers_keeps_rate() {
        let mut r = record(0.5, 0.2, false);
        r.set_effective_rate(0.6);
        RollEvaluator::recalculate(&mut r, false);
        assert_eq!(r.effective_rate(), 0.6);
        assert!(r.success());
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut r = record(0.35, 0.2, false);
        r.modifiers_mut().set(BONUS_YIELD_KEY, Modifier::multiply(2.0));
        RollEvaluator::recalculate(&mut r, true);
        let once = r.clone();
        RollEvaluator::recalculate(&mut r, true);
        assert_eq!(r, once);
    }

    #[test]
    fn test_custom_modifier_with_recalculate() {
        let mut r = record(0.15, 0.1, false);
        RollEvaluator::recalculate(&mut r, true);
        assert!(!r.success());

        r.set_custom_modifier("LuckyPlugin", "charm", Modifier::add(0.1), true);
        assert!(r.success());
        assert!(r.modifiers().contains_key("LuckyPlugin:charm"));
    }

    #[test]
    fn test_fixed_rolls_counts_draws() {
        let mut rolls = FixedRolls::new([0.1, 0.2]);
        assert_eq!(rolls.sample(), 0.1);
        assert_eq!(rolls.sample(), 0.2);
        assert_eq!(rolls.sample(), 0.999_999);
        assert_eq!(rolls.draws(), 3);
    }

    #[test]
    fn test_seeded_rolls_are_deterministic_and_in_range() {
        let mut a = RngRolls::seeded(7);
        let mut b = RngRolls::seeded(7);
        for _ in 0..1000 {
            let x = a.sample();
            assert_eq!(x, b.sample());
            assert!((0.0..1.0).contains(&x));
        }
    }
}
