use serde::Serialize;

use crate::error::{RankingError, RankingResult};
use crate::player_table::PlayerTable;

pub const REFERENCE_LABEL: &str = "Maximum Player";

/// Synthetic player holding the best observed value of every compared feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencePlayer {
    pub label: String,
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

/// Compared feature space with the reference appended as the last row.
#[derive(Debug, Clone)]
pub struct WorkingTable {
    table: PlayerTable,
    reference: ReferencePlayer,
}

impl WorkingTable {
    pub fn table(&self) -> &PlayerTable {
        &self.table
    }

    pub fn reference(&self) -> &ReferencePlayer {
        &self.reference
    }

    pub fn reference_index(&self) -> usize {
        self.table.len() - 1
    }

    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    /// Real players in row order, reference excluded.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        (0..self.reference_index()).filter_map(|idx| self.table.row(idx))
    }

    pub fn reference_values(&self) -> &[f64] {
        &self.reference.values
    }
}

pub fn synthesize_reference(table: &PlayerTable) -> RankingResult<ReferencePlayer> {
    if table.is_empty() {
        return Err(RankingError::InsufficientData {
            context: "reference player synthesis".to_string(),
            rows: 0,
            required: 1,
        });
    }
    let values = (0..table.columns().len())
        .map(|idx| {
            table
                .column_values(idx)
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect();
    Ok(ReferencePlayer {
        label: reserved_label(table),
        columns: table.columns().to_vec(),
        values,
    })
}

/// Synthesizes the reference from the real players and appends it once.
pub fn build_working_table(table: &PlayerTable) -> RankingResult<WorkingTable> {
    let reference = synthesize_reference(table)?;
    let mut working = table.clone();
    working.push_row(reference.label.clone(), reference.values.clone())?;
    Ok(WorkingTable {
        table: working,
        reference,
    })
}

fn reserved_label(table: &PlayerTable) -> String {
    if !table.contains_name(REFERENCE_LABEL) {
        return REFERENCE_LABEL.to_string();
    }
    (2usize..)
        .map(|n| format!("{REFERENCE_LABEL} #{n}"))
        .find(|label| !table.contains_name(label))
        .unwrap_or_else(|| REFERENCE_LABEL.to_string())
}
