use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RankingError, RankingResult};

/// One player with named numeric metrics. The name is the join key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub metrics: HashMap<String, f64>,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metrics: HashMap::new(),
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(metric.into(), value);
        self
    }
}

/// Row-major numeric table keyed by player name.
///
/// Row order is meaningful: it is the tie-break order of the final ranking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerTable {
    names: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl PlayerTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Vec::new(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_records<I, S>(columns: I, records: &[PlayerRecord]) -> RankingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for record in records {
            table.push_record(record)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, name: impl Into<String>, values: Vec<f64>) -> RankingResult<()> {
        let name = name.into();
        if values.len() != self.columns.len() {
            return Err(RankingError::ShapeMismatch {
                player: name,
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(RankingError::InvalidValue {
                player: name,
                column: self.columns[idx].clone(),
            });
        }
        self.names.push(name);
        self.rows.push(values);
        Ok(())
    }

    /// Metrics the record lacks are stored as 0.
    pub fn push_record(&mut self, record: &PlayerRecord) -> RankingResult<()> {
        let values = self
            .columns
            .iter()
            .map(|col| record.metrics.get(col).copied().unwrap_or(0.0))
            .collect();
        self.push_row(record.name.clone(), values)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<(&str, &[f64])> {
        let name = self.names.get(idx)?;
        let row = self.rows.get(idx)?;
        Some((name.as_str(), row.as_slice()))
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn column_values(&self, idx: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[idx]).collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn records(&self) -> impl Iterator<Item = PlayerRecord> + '_ {
        self.names.iter().zip(&self.rows).map(|(name, row)| PlayerRecord {
            name: name.clone(),
            metrics: self.columns.iter().cloned().zip(row.iter().copied()).collect(),
        })
    }

    /// Projects the table onto `columns`, in the order given.
    pub fn select_columns<S: AsRef<str>>(&self, columns: &[S]) -> RankingResult<Self> {
        let mut indices = Vec::with_capacity(columns.len());
        for col in columns {
            let col = col.as_ref();
            let idx = self
                .column_index(col)
                .ok_or_else(|| RankingError::UnknownFeature(col.to_string()))?;
            indices.push(idx);
        }
        Ok(Self {
            names: self.names.clone(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&idx| row[idx]).collect())
                .collect(),
        })
    }

    /// Removes the named columns; names not present are ignored.
    pub fn drop_columns<S: AsRef<str>>(&self, columns: &[S]) -> Self {
        let drop: HashSet<&str> = columns.iter().map(|c| c.as_ref()).collect();
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&idx| !drop.contains(self.columns[idx].as_str()))
            .collect();
        Self {
            names: self.names.clone(),
            columns: keep.iter().map(|&idx| self.columns[idx].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&idx| row[idx]).collect())
                .collect(),
        }
    }

    pub fn filter_rows(&self, mut keep: impl FnMut(&str, &[f64]) -> bool) -> Self {
        let mut out = Self::new(self.columns.iter().cloned());
        for (name, row) in self.names.iter().zip(&self.rows) {
            if keep(name, row) {
                out.names.push(name.clone());
                out.rows.push(row.clone());
            }
        }
        out
    }

    /// Stacks tables in order. Columns are the union in first-seen order;
    /// cells a table does not have are filled with 0.
    pub fn concat(tables: &[PlayerTable]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for table in tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut out = Self::new(columns.iter().cloned());
        for table in tables {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|col| table.column_index(col)).collect();
            for (name, row) in table.names.iter().zip(&table.rows) {
                out.names.push(name.clone());
                out.rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map(|i| row[i]).unwrap_or(0.0))
                        .collect(),
                );
            }
        }
        out
    }

    pub(crate) fn from_parts(names: Vec<String>, columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self {
            names,
            columns,
            rows,
        }
    }
}
