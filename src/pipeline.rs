use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{RankedPlayer, merge_scores, top_k};
use crate::config::RankingConfig;
use crate::error::{RankingError, RankingResult};
use crate::normalize::normalize_populations;
use crate::player_table::PlayerTable;
use crate::projection::project_features;
use crate::reference::{ReferencePlayer, build_working_table};
use crate::similarity::{MethodScores, SimilarityMethod, run_battery};

/// A similarity that could not be bounded. An empty `players` list means the
/// method failed for everyone and was scored as 0 across the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndefinedNote {
    pub method: SimilarityMethod,
    pub players: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub generated_at: String,
    pub features: Vec<String>,
    pub reference: ReferencePlayer,
    pub candidates: usize,
    pub rows: Vec<RankedPlayer>,
    pub undefined: Vec<UndefinedNote>,
}

/// Ranks raw per-region populations: selects the configured features,
/// normalizes each population on its own range, stacks them and ranks.
pub fn rank_populations(
    populations: &[PlayerTable],
    config: &RankingConfig,
) -> RankingResult<RankingReport> {
    config.validate()?;
    let rows: usize = populations.iter().map(PlayerTable::len).sum();
    if rows == 0 {
        return Err(RankingError::InsufficientData {
            context: "player populations".to_string(),
            rows: 0,
            required: 1,
        });
    }

    let selected = populations
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.select_columns(&config.features))
        .collect::<RankingResult<Vec<_>>>()?;
    let normalized = normalize_populations(&selected);
    debug!(
        populations = selected.len(),
        players = normalized.len(),
        "normalized populations"
    );
    rank_normalized(&normalized, config)
}

/// Ranks a table whose selected features are already normalized.
pub fn rank_normalized(table: &PlayerTable, config: &RankingConfig) -> RankingResult<RankingReport> {
    config.validate()?;
    let stray = config.stray_weight_keys();
    if !stray.is_empty() {
        warn!(keys = ?stray, "weights for keys outside the compared features are ignored");
    }
    let compared = project_features(table, config)?;
    let working = build_working_table(&compared)?;
    debug!(
        features = compared.columns().len(),
        players = compared.len(),
        reference = %working.reference().label,
        "working table ready"
    );

    let (methods, undefined) = collect_outcomes(run_battery(&working, &config.weights));

    let merged = merge_scores(working.candidates().map(|(name, _)| name), &methods);
    let candidates = merged.len();
    let rows = top_k(merged, config.top_k);
    info!(
        candidates,
        returned = rows.len(),
        top = rows.first().map(|r| r.name.as_str()).unwrap_or("-"),
        "ranking complete"
    );

    Ok(RankingReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        features: compared.columns().to_vec(),
        reference: working.reference().clone(),
        candidates,
        rows,
        undefined,
    })
}

/// Splits battery outcomes into usable scores and notes. A failed method
/// contributes no scores, so its component is 0 for every player.
pub fn collect_outcomes(
    outcomes: Vec<RankingResult<MethodScores>>,
) -> (Vec<MethodScores>, Vec<UndefinedNote>) {
    let mut methods = Vec::with_capacity(outcomes.len());
    let mut undefined = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(scores) => {
                let players: Vec<String> = scores
                    .scores
                    .iter()
                    .filter(|(_, s)| s.is_none())
                    .map(|(name, _)| name.clone())
                    .collect();
                if !players.is_empty() {
                    warn!(method = %scores.method, players = players.len(), "similarity undefined for some players");
                    undefined.push(UndefinedNote {
                        method: scores.method,
                        message: format!(
                            "{} similarity is undefined for {} player(s)",
                            scores.method,
                            players.len()
                        ),
                        players,
                    });
                }
                methods.push(scores);
            }
            Err(err) => {
                let method = match &err {
                    RankingError::UndefinedSimilarity { method, .. } => Some(*method),
                    _ => None,
                };
                warn!(error = %err, "similarity method failed, scoring as 0");
                if let Some(method) = method {
                    undefined.push(UndefinedNote {
                        method,
                        players: Vec::new(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }
    (methods, undefined)
}
