use tracing::debug;

use crate::config::{FeatureGroup, RankingConfig};
use crate::error::{RankingError, RankingResult};
use crate::normalize::min_max_scale;
use crate::player_table::PlayerTable;

const JACOBI_MAX_SWEEPS: usize = 64;
const JACOBI_TOLERANCE: f64 = 1e-22;

/// Builds the compared feature space: ungrouped features pass through, each
/// non-empty group is replaced by one projected column named by its id.
///
/// `table` must already be normalized and hold every selected feature.
pub fn project_features(table: &PlayerTable, config: &RankingConfig) -> RankingResult<PlayerTable> {
    let ungrouped = config.ungrouped_features();
    let passthrough = table.select_columns(&ungrouped)?;

    let mut projected: Vec<Vec<f64>> = Vec::new();
    for group in config.active_groups() {
        projected.push(project_group(table, group)?);
        debug!(group = %group.id, members = group.members.len(), "projected feature group");
    }

    let rows = passthrough
        .rows()
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let mut out = row.clone();
            out.extend(projected.iter().map(|col| col[r]));
            out
        })
        .collect();
    Ok(PlayerTable::from_parts(
        table.names().to_vec(),
        config.compared_keys(),
        rows,
    ))
}

/// Standardizes the group's columns, projects onto the first principal
/// component and rescales the scores into the normalized range.
pub fn project_group(table: &PlayerTable, group: &FeatureGroup) -> RankingResult<Vec<f64>> {
    let members = table.select_columns(&group.members)?;
    let rows = members.len();
    let width = group.members.len();
    if rows == 0 || rows < width {
        return Err(RankingError::InsufficientData {
            context: format!("projection of group `{}`", group.id),
            rows,
            required: width.max(1),
        });
    }

    let standardized = standardize(members.rows(), width);
    let axis = first_principal_axis(&standardized, width);
    let scores: Vec<f64> = standardized
        .iter()
        .map(|row| row.iter().zip(&axis).map(|(x, w)| x * w).sum())
        .collect();
    Ok(min_max_scale(&scores))
}

/// Zero mean, unit population variance per column. Zero-variance columns are
/// only centered.
fn standardize(rows: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    let stats: Vec<(f64, f64)> = (0..width)
        .map(|c| column_mean_std(rows.iter().map(|row| row[c])))
        .collect();
    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&stats)
                .map(|(v, (mean, std))| {
                    let scale = if *std > 0.0 { *std } else { 1.0 };
                    (v - mean) / scale
                })
                .collect()
        })
        .collect()
}

fn column_mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count().max(1) as f64;
    let mean = values.clone().sum::<f64>() / n;
    let var = values
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean, var.sqrt())
}

/// Unit loading vector of the largest-variance direction, oriented so its
/// largest-magnitude entry is positive.
fn first_principal_axis(standardized: &[Vec<f64>], width: usize) -> Vec<f64> {
    let n = standardized.len().max(1) as f64;
    let mut cov = vec![vec![0.0; width]; width];
    for row in standardized {
        for i in 0..width {
            for j in i..width {
                cov[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..width {
        for j in i..width {
            cov[i][j] /= n;
            cov[j][i] = cov[i][j];
        }
    }

    let (eigenvalues, eigenvectors) = symmetric_eigen(cov);
    let mut best = 0usize;
    for (idx, value) in eigenvalues.iter().enumerate() {
        if *value > eigenvalues[best] {
            best = idx;
        }
    }
    let mut axis: Vec<f64> = eigenvectors.iter().map(|row| row[best]).collect();

    let mut pivot = 0usize;
    for (idx, value) in axis.iter().enumerate() {
        if value.abs() > axis[pivot].abs() {
            pivot = idx;
        }
    }
    if axis[pivot] < 0.0 {
        axis.iter_mut().for_each(|v| *v = -*v);
    }
    axis
}

/// Cyclic Jacobi rotation. Returns eigenvalues and a matrix whose columns are
/// the matching eigenvectors.
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |j| *j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off < JACOBI_TOLERANCE {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p][q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
