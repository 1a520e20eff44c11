use crate::player_table::PlayerTable;

/// Lower bound of every normalized column.
pub const NORMALIZED_FLOOR: f64 = 0.01;

/// Min–max rescale into `[NORMALIZED_FLOOR, 1]`. A constant column maps to the floor.
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let Some((min, max)) = min_max(values) else {
        return Vec::new();
    };
    let span = max - min;
    if span == 0.0 {
        return vec![NORMALIZED_FLOOR; values.len()];
    }
    values
        .iter()
        .map(|v| NORMALIZED_FLOOR + ((v - min) / span) * (1.0 - NORMALIZED_FLOOR))
        .collect()
}

/// Normalizes every column of `table` on its own min/max.
pub fn normalize_table(table: &PlayerTable) -> PlayerTable {
    let width = table.columns().len();
    let scaled: Vec<Vec<f64>> = (0..width)
        .map(|idx| min_max_scale(&table.column_values(idx)))
        .collect();
    let rows = (0..table.len())
        .map(|r| scaled.iter().map(|col| col[r]).collect())
        .collect();
    PlayerTable::from_parts(table.names().to_vec(), table.columns().to_vec(), rows)
}

/// Normalizes each population on its own min/max, then stacks them in order.
pub fn normalize_populations(populations: &[PlayerTable]) -> PlayerTable {
    let normalized: Vec<PlayerTable> = populations.iter().map(normalize_table).collect();
    PlayerTable::concat(&normalized)
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}
