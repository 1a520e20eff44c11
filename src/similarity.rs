use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::config::WeightMap;
use crate::error::{RankingError, RankingResult};
use crate::reference::WorkingTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SimilarityMethod {
    BrayCurtis,
    Euclidean,
    Cosine,
    Manhattan,
    Canberra,
    Kulczynski,
}

impl SimilarityMethod {
    /// Fixed merge order; Bray–Curtis first.
    pub const ALL: [SimilarityMethod; 6] = [
        SimilarityMethod::BrayCurtis,
        SimilarityMethod::Euclidean,
        SimilarityMethod::Cosine,
        SimilarityMethod::Manhattan,
        SimilarityMethod::Canberra,
        SimilarityMethod::Kulczynski,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SimilarityMethod::BrayCurtis => "Bray-Curtis",
            SimilarityMethod::Euclidean => "Euclidean",
            SimilarityMethod::Cosine => "Cosine",
            SimilarityMethod::Manhattan => "Manhattan",
            SimilarityMethod::Canberra => "Canberra",
            SimilarityMethod::Kulczynski => "Kulczynski",
        }
    }

    pub fn compute(self, working: &WorkingTable, weights: &WeightMap) -> RankingResult<MethodScores> {
        match self {
            SimilarityMethod::BrayCurtis => bray_curtis(working, weights),
            SimilarityMethod::Euclidean => euclidean(working, weights),
            SimilarityMethod::Cosine => cosine(working, weights),
            SimilarityMethod::Manhattan => manhattan(working, weights),
            SimilarityMethod::Canberra => canberra(working, weights),
            SimilarityMethod::Kulczynski => kulczynski(working, weights),
        }
    }
}

impl fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One method's similarity per real player, in row order.
/// `None` marks a player whose similarity is undefined for this method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodScores {
    pub method: SimilarityMethod,
    pub scores: Vec<(String, Option<f64>)>,
}

impl MethodScores {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, score)| *score)
    }

    /// One entry per player name holding that name's best score (`None`
    /// ranks lowest), at the position where the name first appears.
    pub fn dedup_by_name(self) -> Self {
        let mut slots: HashMap<String, usize> = HashMap::with_capacity(self.scores.len());
        let mut scores: Vec<(String, Option<f64>)> = Vec::with_capacity(self.scores.len());
        for (name, score) in self.scores {
            match slots.get(&name) {
                Some(&idx) => {
                    if beats(score, scores[idx].1) {
                        scores[idx].1 = score;
                    }
                }
                None => {
                    slots.insert(name.clone(), scores.len());
                    scores.push((name, score));
                }
            }
        }
        Self {
            method: self.method,
            scores,
        }
    }
}

fn beats(candidate: Option<f64>, current: Option<f64>) -> bool {
    match (candidate, current) {
        (Some(c), Some(cur)) => c > cur,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Runs all six methods over the same frozen working table. Results come back
/// in `SimilarityMethod::ALL` order, each deduplicated by player name.
pub fn run_battery(working: &WorkingTable, weights: &WeightMap) -> Vec<RankingResult<MethodScores>> {
    SimilarityMethod::ALL
        .par_iter()
        .map(|method| {
            let out = method.compute(working, weights).map(MethodScores::dedup_by_name);
            debug!(method = %method, ok = out.is_ok(), "similarity method finished");
            out
        })
        .collect()
}

pub fn bray_curtis(working: &WorkingTable, weights: &WeightMap) -> RankingResult<MethodScores> {
    let (candidates, reference) = weighted_vectors(working, weights);
    let scores = candidates
        .into_iter()
        .map(|(name, x)| {
            let (num, den) = x.iter().zip(&reference).fold((0.0_f64, 0.0_f64), |(num, den), (a, b)| {
                (num + (a - b).abs(), den + (a + b))
            });
            let sim = if den == 0.0 { 0.0 } else { clip_unit(1.0 - num / den) };
            (name, Some(sim))
        })
        .collect();
    Ok(MethodScores {
        method: SimilarityMethod::BrayCurtis,
        scores,
    })
}

pub fn euclidean(working: &WorkingTable, weights: &WeightMap) -> RankingResult<MethodScores> {
    let (candidates, reference) = weighted_vectors(working, weights);
    let distances: Vec<(String, f64)> = candidates
        .into_iter()
        .map(|(name, x)| {
            let d = x
                .iter()
                .zip(&reference)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt();
            (name, d)
        })
        .collect();
    Ok(MethodScores {
        method: SimilarityMethod::Euclidean,
        scores: similarity_from_distances(distances),
    })
}

pub fn cosine(working: &WorkingTable, weights: &WeightMap) -> RankingResult<MethodScores> {
    let (candidates, reference) = weighted_vectors(working, weights);
    let ref_norm = norm(&reference);
    let scores = candidates
        .into_iter()
        .map(|(name, x)| {
            let denom = norm(&x) * ref_norm;
            let sim = if denom == 0.0 {
                0.0
            } else {
                let dot: f64 = x.iter().zip(&reference).map(|(a, b)| a * b).sum();
                clip_unit(dot / denom)
            };
            (name, Some(sim))
        })
        .collect();
    Ok(MethodScores {
        method: SimilarityMethod::Cosine,
        scores,
    })
}

pub fn manhattan(working: &WorkingTable, weights: &WeightMap) -> RankingResult<MethodScores> {
    let (candidates, reference) = weighted_vectors(working, weights);
    let distances: Vec<(String, f64)> = candidates
        .into_iter()
        .map(|(name, x)| {
            let d: f64 = x.iter().zip(&reference).map(|(a, b)| (a - b).abs()).sum();
            (name, d)
        })
        .collect();
    Ok(MethodScores {
        method: SimilarityMethod::Manhattan,
        scores: similarity_from_distances(distances),
    })
}

pub fn canberra(working: &WorkingTable, weights: &WeightMap) -> RankingResult<MethodScores> {
    let (candidates, reference) = weighted_vectors(working, weights);
    let distances: Vec<(String, f64)> = candidates
        .into_iter()
        .map(|(name, x)| (name, canberra_distance(&x, &reference)))
        .collect();
    Ok(MethodScores {
        method: SimilarityMethod::Canberra,
        scores: canberra_similarities(distances)?,
    })
}

pub fn kulczynski(working: &WorkingTable, weights: &WeightMap) -> RankingResult<MethodScores> {
    let (candidates, reference) = weighted_vectors(working, weights);
    let scores = candidates
        .into_iter()
        .map(|(name, x)| {
            let terms: Vec<f64> = x
                .iter()
                .zip(&reference)
                .filter(|(a, b)| *a + *b != 0.0)
                .map(|(a, b)| (a - b).abs() / (a + b))
                .collect();
            let sim = if terms.is_empty() {
                None
            } else {
                let mean = terms.iter().sum::<f64>() / terms.len() as f64;
                Some(clip_unit(1.0 - mean))
            };
            (name, sim)
        })
        .collect();
    Ok(MethodScores {
        method: SimilarityMethod::Kulczynski,
        scores,
    })
}

/// Sum of `|x-y| / (|x|+|y|)`; terms with a zero denominator contribute 0.
/// A NaN total is promoted to +inf.
pub fn canberra_distance(x: &[f64], y: &[f64]) -> f64 {
    let d: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| {
            let den = a.abs() + b.abs();
            if den == 0.0 { 0.0 } else { (a - b).abs() / den }
        })
        .sum();
    if d.is_nan() { f64::INFINITY } else { d }
}

/// Infinite distances take the largest finite distance before `1 - d/max_d`.
/// With no finite distance at all the method is undefined.
pub fn canberra_similarities(
    distances: Vec<(String, f64)>,
) -> RankingResult<Vec<(String, Option<f64>)>> {
    let max_finite = distances
        .iter()
        .map(|(_, d)| *d)
        .filter(|d| d.is_finite())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))));
    let Some(max_finite) = max_finite else {
        return Err(RankingError::UndefinedSimilarity {
            method: SimilarityMethod::Canberra,
            reason: "every player is at infinite distance from the reference".to_string(),
        });
    };
    let capped = distances
        .into_iter()
        .map(|(name, d)| (name, if d.is_finite() { d } else { max_finite }))
        .collect();
    Ok(similarity_from_distances(capped))
}

/// `1 - d / max_d`, clipped; every player scores 1 when `max_d` is 0.
fn similarity_from_distances(distances: Vec<(String, f64)>) -> Vec<(String, Option<f64>)> {
    let max_d = distances.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    distances
        .into_iter()
        .map(|(name, d)| {
            let sim = if max_d == 0.0 { 1.0 } else { clip_unit(1.0 - d / max_d) };
            (name, Some(sim))
        })
        .collect()
}

/// Candidate and reference vectors, each coordinate multiplied by its weight.
fn weighted_vectors(working: &WorkingTable, weights: &WeightMap) -> (Vec<(String, Vec<f64>)>, Vec<f64>) {
    let w = weights.vector_for(working.columns());
    let candidates = working
        .candidates()
        .map(|(name, row)| (name.to_string(), apply_weights(row, &w)))
        .collect();
    (candidates, apply_weights(working.reference_values(), &w))
}

pub fn apply_weights(values: &[f64], weights: &[f64]) -> Vec<f64> {
    values.iter().zip(weights).map(|(v, w)| v * w).collect()
}

fn norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn clip_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
