//! Benchmark for trophy drop decisions.
//!
//! A decision runs inline on the host's event thread, so it has to stay
//! in the low microseconds even with observers and an exemption window.
//!
//! Run with: cargo bench --package trophies_core --bench pipeline_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use trophies_core::mock::{BreakVeto, MockHost};
use trophies_core::{
    Actor, Block, BlockBreak, Location, Modifier, ModifierChain, RngRolls, Tool, TrophyKind,
};

fn diamond_break() -> BlockBreak {
    let miner = Actor::player(1, "Bench", Location::new("world", 0.0, 64.0, 0.0))
        .with_tool(Tool::new("DIAMOND_PICKAXE").with_fortune(3));
    BlockBreak::new(
        Block::new("DIAMOND_ORE", Location::new("world", 1.0, 63.0, 0.0)),
        Some(miner),
    )
}

fn benchmark_gated_break(c: &mut Criterion) {
    let host = MockHost::new();
    let pipeline = host.pipeline();
    let mut rolls = RngRolls::seeded(1);
    let template = BlockBreak::new(
        Block::new("STONE", Location::new("world", 0.0, 0.0, 0.0)),
        diamond_break().miner,
    );

    c.bench_function("gated_break", |b| {
        b.iter(|| {
            let mut event = template.clone();
            black_box(pipeline.handle_block_break(black_box(&mut event), &mut rolls))
        });
    });
}

fn benchmark_full_decision(c: &mut Criterion) {
    let host = MockHost::new()
        .with_rate(TrophyKind::DiamondOre, 0.5)
        .with_number("fortunerate", 0.25)
        .with_exemptions();
    let mut pipeline = host.pipeline();
    pipeline.checkpoints_mut().register_break(Arc::new(BreakVeto::new()));
    let mut rolls = RngRolls::seeded(2);
    let template = diamond_break();

    let mut group = c.benchmark_group("full_decision");
    group.throughput(Throughput::Elements(1));
    group.bench_function("roll_and_simulate", |b| {
        b.iter(|| {
            let mut event = template.clone();
            black_box(pipeline.handle_block_break(black_box(&mut event), &mut rolls))
        });
    });
    group.finish();
}

fn benchmark_modifier_chain(c: &mut Criterion) {
    let mut chain = ModifierChain::new();
    for i in 0..16 {
        let modifier = if i % 2 == 0 {
            Modifier::multiply(1.01)
        } else {
            Modifier::add(0.001)
        };
        chain.set(format!("bench:{i}"), modifier);
    }

    c.bench_function("apply_all_16", |b| {
        b.iter(|| black_box(chain.apply_all(black_box(0.01))));
    });
}

criterion_group!(
    benches,
    benchmark_gated_break,
    benchmark_full_decision,
    benchmark_modifier_chain
);
criterion_main!(benches);
