//! Property tests for the modifier chain, roll evaluation and zero-rate gating.

use proptest::prelude::*;

use trophies_core::mock::MockHost;
use trophies_core::{
    Actor, Block, BlockBreak, FixedRolls, Gate, Location, Modifier, ModifierChain, NoDropReason,
    Outcome, RollEvaluator, RollRecord, Tool, TrophyKind, PERMISSION_ALWAYS_REWARDED,
};

fn modifier() -> impl Strategy<Value = Modifier> {
    (any::<bool>(), -4.0..4.0f64).prop_map(|(multiply, value)| {
        if multiply {
            Modifier::multiply(value)
        } else {
            Modifier::add(value)
        }
    })
}

fn chain() -> impl Strategy<Value = ModifierChain> {
    proptest::collection::vec(modifier(), 0..12).prop_map(|mods| {
        let mut chain = ModifierChain::new();
        for (i, m) in mods.into_iter().enumerate() {
            chain.set(format!("k{i}"), m);
        }
        chain
    })
}

fn owned_keys(chain: &ModifierChain) -> Vec<String> {
    chain.keys().map(str::to_string).collect()
}

proptest! {
    #[test]
    fn prop_apply_all_is_a_deterministic_left_fold(chain in chain(), base in -1.0..1.0f64) {
        let once = chain.apply_all(base);
        let twice = chain.apply_all(base);
        prop_assert_eq!(once.to_bits(), twice.to_bits());

        let folded = chain.iter().fold(base, |acc, (_, m)| m.apply(acc));
        prop_assert_eq!(once.to_bits(), folded.to_bits());
    }

    #[test]
    fn prop_overwrite_keeps_position(
        mut chain in chain(),
        pick in any::<prop::sample::Index>(),
        replacement in modifier(),
    ) {
        prop_assume!(!chain.is_empty());
        let before = owned_keys(&chain);
        let key = before[pick.index(before.len())].clone();

        chain.set(key.clone(), replacement);

        prop_assert_eq!(owned_keys(&chain), before);
        prop_assert_eq!(chain.get(&key), Some(replacement));
    }

    #[test]
    fn prop_fresh_key_appends(mut chain in chain(), m in modifier()) {
        let mut expected = owned_keys(&chain);
        chain.set("fresh", m);
        expected.push("fresh".to_string());
        prop_assert_eq!(owned_keys(&chain), expected);
    }

    #[test]
    fn prop_remove_then_readd_moves_to_end(
        mut chain in chain(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!chain.is_empty());
        let keys = owned_keys(&chain);
        let key = keys[pick.index(keys.len())].clone();

        let removed = chain.remove(&key).expect("present");
        chain.set(key.clone(), removed);

        let after = owned_keys(&chain);
        prop_assert_eq!(after.last(), Some(&key));
        prop_assert_eq!(after.len(), keys.len());
    }

    #[test]
    fn prop_recalculate_is_idempotent(
        chain in chain(),
        roll in 0.0..1.0f64,
        rate in 0.0..1.0f64,
        always in any::<bool>(),
    ) {
        let mut record = RollRecord::new(TrophyKind::Clay, "CLAY", 1, always, roll, rate);
        *record.modifiers_mut() = chain;

        RollEvaluator::recalculate(&mut record, true);
        let first = record.clone();
        RollEvaluator::recalculate(&mut record, true);
        prop_assert_eq!(record, first);
    }

    #[test]
    fn prop_always_rewarded_wins_whenever_rate_is_positive(
        chain in chain(),
        roll in 0.0..1.0f64,
        rate in 0.0..1.0f64,
    ) {
        let mut record = RollRecord::new(TrophyKind::Clay, "CLAY", 1, true, roll, rate);
        *record.modifiers_mut() = chain;
        RollEvaluator::recalculate(&mut record, true);

        prop_assert_eq!(record.success(), record.effective_rate() > 0.0);
    }

    #[test]
    fn prop_zero_rate_never_draws(
        rolls in proptest::collection::vec(0.0..1.0f64, 0..4),
        always in any::<bool>(),
        fortune in 0u32..5,
    ) {
        let host = MockHost::new()
            .with_rate(TrophyKind::TurtleEgg, 0.0)
            .with_number("fortunerate", 1.0);
        if always {
            host.permissions.grant(7, PERMISSION_ALWAYS_REWARDED);
        }
        let pipeline = host.pipeline();
        let miner = Actor::player(7, "Kai", Location::new("world", 0.0, 0.0, 0.0))
            .with_tool(Tool::new("GOLDEN_PICKAXE").with_fortune(fortune));
        let mut event = BlockBreak::new(
            Block::new("TURTLE_EGG", Location::new("world", 0.0, 0.0, 1.0)),
            Some(miner),
        );
        let mut source = FixedRolls::new(rolls);

        let outcome = pipeline.handle_block_break(&mut event, &mut source);

        prop_assert_eq!(outcome, Some(Outcome::NoDrop(NoDropReason::Gated(Gate::ZeroRate))));
        prop_assert_eq!(source.draws(), 0);
    }
}
