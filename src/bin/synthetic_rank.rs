use anyhow::Result;
use tracing_subscriber::EnvFilter;

use scout_rank::config::{FeatureGroup, RankingConfig};
use scout_rank::pipeline::rank_populations;
use scout_rank::report::render_table;
use scout_rank::synthetic::{DEFAULT_METRICS, synthetic_regions};

const DEFAULT_SEED: u64 = 2026;
const DEFAULT_PLAYERS: usize = 60;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let seed = parse_u64_arg("--seed").unwrap_or(DEFAULT_SEED);
    let players = parse_u64_arg("--players")
        .map(|v| v as usize)
        .unwrap_or(DEFAULT_PLAYERS);
    let grouped = std::env::args().skip(1).any(|arg| arg == "--grouped");

    let populations = synthetic_regions(seed, &["North", "South", "East"], players, &DEFAULT_METRICS);
    let mut config = RankingConfig::new(DEFAULT_METRICS).with_weight("Goals", 3)?;
    if grouped {
        config = config
            .with_group(FeatureGroup::new("Attack", ["Goals", "Expected goals", "Assists"]))
            .with_group(FeatureGroup::new("Defence", ["Tackles won", "Interceptions"]));
    }
    if let Some(top) = parse_u64_arg("--top") {
        config = config.with_top_k(top as usize);
    }
    config.apply_env_overrides();

    let report = rank_populations(&populations, &config)?;
    println!("Synthetic ranking (seed {seed}, {players} players per region)");
    print!("{}", render_table(&report, true));
    Ok(())
}

fn parse_u64_arg(flag: &str) -> Option<u64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix)
            && let Ok(value) = raw.trim().parse::<u64>()
        {
            return Some(value);
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && let Ok(value) = next.trim().parse::<u64>()
        {
            return Some(value);
        }
    }
    None
}
