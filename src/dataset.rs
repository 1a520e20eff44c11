use std::collections::HashSet;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::player_table::PlayerTable;

pub const DEFAULT_MIN_MINUTES_FRACTION: f64 = 0.25;

/// Metadata column names in the source CSV files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_position_column")]
    pub position_column: String,
    #[serde(default = "default_minutes_column")]
    pub minutes_column: String,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            name_column: default_name_column(),
            position_column: default_position_column(),
            minutes_column: default_minutes_column(),
        }
    }
}

fn default_name_column() -> String {
    "Player".to_string()
}

fn default_position_column() -> String {
    "Position".to_string()
}

fn default_minutes_column() -> String {
    "Minutes played".to_string()
}

fn default_min_minutes_fraction() -> f64 {
    DEFAULT_MIN_MINUTES_FRACTION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub schema: DatasetSchema,
    /// Keep only players whose position matches (case-insensitive).
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default = "default_min_minutes_fraction")]
    pub min_minutes_fraction: f64,
    /// Stack all sources into one population before filtering and normalizing.
    #[serde(default)]
    pub pooled: bool,
}

impl DatasetConfig {
    /// `SCOUT_POSITION` overrides the configured position filter.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var("SCOUT_POSITION") {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.position = Some(trimmed.to_string());
            }
        }
    }
}

/// One source file after parsing: numeric columns (minutes included) plus
/// the per-row position labels when the file has a position column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSource {
    pub label: String,
    pub table: PlayerTable,
    pub positions: Option<Vec<String>>,
    pub minutes_column: String,
}

impl RawSource {
    fn retain(&self, keep: &[bool]) -> RawSource {
        let mut idx = 0usize;
        let table = self.table.filter_rows(|_, _| {
            let k = keep.get(idx).copied().unwrap_or(false);
            idx += 1;
            k
        });
        let positions = self.positions.as_ref().map(|all| {
            all.iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(p, _)| p.clone())
                .collect()
        });
        RawSource {
            label: self.label.clone(),
            table,
            positions,
            minutes_column: self.minutes_column.clone(),
        }
    }
}

/// Parses a player CSV. Every column other than name and position is numeric;
/// empty or unparsable cells become 0.
pub fn read_player_csv<R: Read>(label: &str, rdr: R, schema: &DatasetSchema) -> Result<RawSource> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader
        .headers()
        .with_context(|| format!("read headers of {label}"))?
        .clone();

    let name_idx = headers
        .iter()
        .position(|h| h.trim() == schema.name_column)
        .ok_or_else(|| anyhow!("{label}: missing name column `{}`", schema.name_column))?;
    if !headers.iter().any(|h| h.trim() == schema.minutes_column) {
        return Err(anyhow!(
            "{label}: missing minutes column `{}`",
            schema.minutes_column
        ));
    }
    let position_idx = headers
        .iter()
        .position(|h| h.trim() == schema.position_column);

    let numeric: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != name_idx && Some(*idx) != position_idx)
        .map(|(idx, h)| (idx, h.trim().to_string()))
        .collect();

    let mut table = PlayerTable::new(numeric.iter().map(|(_, h)| h.clone()));
    let mut positions = position_idx.map(|_| Vec::new());
    let mut coerced: HashSet<String> = HashSet::new();

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{label}: row {}", line + 1))?;
        let name = record.get(name_idx).unwrap_or_default().trim().to_string();
        if name.is_empty() {
            warn!(source = label, row = line + 1, "skipping row without player name");
            continue;
        }
        let values = numeric
            .iter()
            .map(|(idx, column)| {
                let raw = record.get(*idx).unwrap_or_default();
                parse_cell(raw).unwrap_or_else(|| {
                    if coerced.insert(column.clone()) {
                        warn!(source = label, column = %column, "non-numeric cells coerced to 0");
                    }
                    0.0
                })
            })
            .collect();
        table
            .push_row(name, values)
            .with_context(|| format!("{label}: row {}", line + 1))?;
        if let (Some(out), Some(idx)) = (positions.as_mut(), position_idx) {
            out.push(record.get(idx).unwrap_or_default().trim().to_string());
        }
    }

    debug!(source = label, players = table.len(), columns = table.columns().len(), "parsed player csv");
    Ok(RawSource {
        label: label.to_string(),
        table,
        positions,
        minutes_column: schema.minutes_column.clone(),
    })
}

fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Keeps players with minutes strictly above `fraction` of the source maximum.
pub fn filter_min_minutes(source: &RawSource, fraction: f64) -> RawSource {
    let Some(idx) = source.table.column_index(&source.minutes_column) else {
        return source.clone();
    };
    let minutes = source.table.column_values(idx);
    let max = minutes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = fraction * max;
    let keep: Vec<bool> = minutes.iter().map(|m| *m > threshold).collect();
    source.retain(&keep)
}

/// Keeps players whose position matches, ignoring case. Sources without a
/// position column are returned unchanged.
pub fn filter_position(source: &RawSource, position: &str) -> RawSource {
    let Some(positions) = source.positions.as_ref() else {
        return source.clone();
    };
    let wanted = position.trim().to_lowercase();
    let keep: Vec<bool> = positions
        .iter()
        .map(|p| p.trim().to_lowercase() == wanted)
        .collect();
    source.retain(&keep)
}

/// Stacks sources into one. Position labels are kept only if every source has them.
pub fn concat_sources(label: &str, sources: &[RawSource]) -> RawSource {
    let tables: Vec<PlayerTable> = sources.iter().map(|s| s.table.clone()).collect();
    let positions = sources
        .iter()
        .map(|s| s.positions.clone())
        .collect::<Option<Vec<Vec<String>>>>()
        .map(|all| all.into_iter().flatten().collect());
    RawSource {
        label: label.to_string(),
        table: PlayerTable::concat(&tables),
        positions,
        minutes_column: sources
            .first()
            .map(|s| s.minutes_column.clone())
            .unwrap_or_else(default_minutes_column),
    }
}

/// Applies the minutes threshold and position filter, then drops metadata.
/// Pooled mode stacks the sources first and yields a single population.
pub fn build_populations(sources: &[RawSource], config: &DatasetConfig) -> Vec<PlayerTable> {
    let prepared: Vec<RawSource> = if config.pooled {
        vec![concat_sources("pooled", sources)]
    } else {
        sources.to_vec()
    };

    prepared
        .iter()
        .map(|source| {
            let mut filtered = filter_min_minutes(source, config.min_minutes_fraction);
            if let Some(position) = config.position.as_deref() {
                filtered = filter_position(&filtered, position);
            }
            debug!(
                source = %source.label,
                before = source.table.len(),
                after = filtered.table.len(),
                "filtered population"
            );
            filtered.table.drop_columns(&[source.minutes_column.as_str()])
        })
        .collect()
}

pub fn load_sources(config: &DatasetConfig) -> Result<Vec<RawSource>> {
    if config.sources.is_empty() {
        return Err(anyhow!("no dataset sources configured"));
    }
    config
        .sources
        .iter()
        .map(|source| {
            let file = File::open(&source.path)
                .with_context(|| format!("open {}", source.path.display()))?;
            read_player_csv(&source.label, file, &config.schema)
        })
        .collect()
}

pub fn load_populations(config: &DatasetConfig) -> Result<Vec<PlayerTable>> {
    let sources = load_sources(config)?;
    Ok(build_populations(&sources, config))
}
