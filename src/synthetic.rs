use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::player_table::PlayerTable;

pub const DEFAULT_METRICS: [&str; 8] = [
    "Goals",
    "Expected goals",
    "Assists",
    "Key passes",
    "Successful dribbles",
    "Tackles won",
    "Interceptions",
    "Aerial duels won",
];

/// Seeded fake population. Each player has a latent quality that drives every
/// metric, plus per-metric noise, so rankings are non-trivial but stable.
pub fn synthetic_population(seed: u64, players: usize, metrics: &[&str]) -> PlayerTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let scales: Vec<f64> = metrics.iter().map(|_| rng.gen_range(0.5..12.0)).collect();
    let mut table = PlayerTable::new(metrics.iter().copied());

    for idx in 0..players {
        let quality: f64 = rng.gen_range(0.0..1.0);
        let values = scales
            .iter()
            .map(|scale| {
                let noise: f64 = rng.gen_range(0.0..1.0);
                round2(scale * (0.7 * quality + 0.3 * noise))
            })
            .collect();
        table
            .push_row(format!("Player {:03}", idx + 1), values)
            .expect("synthetic row matches the metric columns");
    }
    table
}

/// Several regions with different stat scales, named `"<region> Player NNN"`.
pub fn synthetic_regions(
    seed: u64,
    regions: &[&str],
    players_per_region: usize,
    metrics: &[&str],
) -> Vec<PlayerTable> {
    regions
        .iter()
        .enumerate()
        .map(|(offset, region)| {
            let base = synthetic_population(seed.wrapping_add(offset as u64), players_per_region, metrics);
            let factor = 1.0 + offset as f64 * 0.5;
            let mut out = PlayerTable::new(metrics.iter().copied());
            for (name, row) in base.names().iter().zip(base.rows()) {
                let scaled = row.iter().map(|v| round2(v * factor)).collect();
                out.push_row(format!("{region} {name}"), scaled)
                    .expect("scaled row keeps the metric columns");
            }
            out
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
