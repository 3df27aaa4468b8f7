//! # Trophy Host
//!
//! Headless driver: loads the config, builds a small ore field, lets two
//! players mine it and prints what the pipeline decided.
//!
//! ```bash
//! # Bundled defaults, 40 breaks
//! trophy_host
//!
//! # Own config and break count
//! RUST_LOG=trophies_core=debug trophy_host miningtrophies.toml 200
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trophies_server::engine::{
    Actor, Location, SharedConfig, Tool, TomlConfig, TrophyResult, PERMISSION_ALWAYS_REWARDED,
    PERMISSION_CAN_BE_REWARDED,
};
use trophies_server::{HostEvent, HostSession, HostSettings, HostWorld};

const DEFAULT_BREAKS: usize = 40;

const ORES: [&str; 4] = ["DIAMOND_ORE", "EMERALD_ORE", "COAL_ORE", "STONE"];

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let breaks = match args.next().map(|raw| raw.parse::<usize>()) {
        None => DEFAULT_BREAKS,
        Some(Ok(breaks)) => breaks,
        Some(Err(e)) => {
            tracing::error!("invalid break count: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config_path, breaks) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<String>, breaks: usize) -> TrophyResult<()> {
    let config = match config_path {
        Some(path) => SharedConfig::load(path)?,
        None => {
            tracing::info!("no config file given, using bundled defaults");
            SharedConfig::new(TomlConfig::defaults()?)
        }
    };
    let settings = HostSettings::from_config(&config.snapshot())?;
    let world = Arc::new(HostWorld::new());
    let mut session = HostSession::new(world.clone(), Arc::new(config), &settings);

    let spawn = Location::new("world", 0.5, 64.0, 0.5);
    world.add_player(
        Actor::player(1, "Ana", spawn.clone()),
        &[PERMISSION_CAN_BE_REWARDED, PERMISSION_ALWAYS_REWARDED],
    );
    world.add_player(
        Actor::player(2, "Bo", spawn).with_tool(Tool::new("DIAMOND_PICKAXE").with_fortune(3)),
        &[PERMISSION_CAN_BE_REWARDED],
    );

    let sender = session.sender();
    let mut placed = 0_u32;

    // Each round both players break one block, then the clock moves past
    // the fast-break window.
    for round in 0..breaks.div_ceil(2) {
        for (slot, actor) in [1, 2].into_iter().enumerate() {
            if round * 2 + slot >= breaks {
                break;
            }
            let location = Location::new("world", f64::from(placed), 60.0, 8.0);
            world.set_block(&location, ORES[placed as usize % ORES.len()]);
            placed += 1;
            sender.send(HostEvent::BlockBroken { actor, location });
        }
        for _ in 0..settings.fast_break_ticks.max(1) {
            session.tick();
        }
    }
    session.tick();

    let stats = session.stats();
    println!("breaks:            {}", stats.breaks);
    println!("cancelled breaks:  {}", stats.cancelled_breaks);
    println!("trophies dropped:  {}", stats.drops);
    println!("simulated vetoes:  {}", stats.simulated_vetoes);
    println!("repaired items:    {}", stats.repaired_items);
    println!("fast-break hits:   {}", session.monitor().violations());
    println!("blocks left:       {}", world.block_count());
    for line in world.console() {
        println!("  [broadcast] {line}");
    }
    for item in world.items() {
        println!(
            "  [item #{}] {} x{} at ({}, {}, {})",
            item.entity,
            item.stack.material,
            item.stack.amount,
            item.location.x,
            item.location.y,
            item.location.z
        );
    }

    session.shutdown();
    Ok(())
}
