use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::similarity::{MethodScores, SimilarityMethod};

/// Relative weight of each method in the composite score.
pub fn method_weight(method: SimilarityMethod) -> f64 {
    match method {
        SimilarityMethod::BrayCurtis => 5.0,
        _ => 1.0,
    }
}

pub fn total_method_weight() -> f64 {
    SimilarityMethod::ALL.iter().copied().map(method_weight).sum()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComponentScores {
    pub bray_curtis: Option<f64>,
    pub euclidean: Option<f64>,
    pub cosine: Option<f64>,
    pub manhattan: Option<f64>,
    pub canberra: Option<f64>,
    pub kulczynski: Option<f64>,
}

impl ComponentScores {
    pub fn get(&self, method: SimilarityMethod) -> Option<f64> {
        match method {
            SimilarityMethod::BrayCurtis => self.bray_curtis,
            SimilarityMethod::Euclidean => self.euclidean,
            SimilarityMethod::Cosine => self.cosine,
            SimilarityMethod::Manhattan => self.manhattan,
            SimilarityMethod::Canberra => self.canberra,
            SimilarityMethod::Kulczynski => self.kulczynski,
        }
    }

    pub fn set(&mut self, method: SimilarityMethod, value: Option<f64>) {
        let slot = match method {
            SimilarityMethod::BrayCurtis => &mut self.bray_curtis,
            SimilarityMethod::Euclidean => &mut self.euclidean,
            SimilarityMethod::Cosine => &mut self.cosine,
            SimilarityMethod::Manhattan => &mut self.manhattan,
            SimilarityMethod::Canberra => &mut self.canberra,
            SimilarityMethod::Kulczynski => &mut self.kulczynski,
        };
        *slot = value;
    }

    /// Weighted mean of the six components; a missing component counts as 0.
    pub fn composite(&self) -> f64 {
        let sum: f64 = SimilarityMethod::ALL
            .iter()
            .map(|m| method_weight(*m) * self.get(*m).unwrap_or(0.0))
            .sum();
        let score = sum / total_method_weight();
        if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub name: String,
    pub score: f64,
    pub components: ComponentScores,
}

impl RankedPlayer {
    pub fn score_percent(&self) -> String {
        format_percent(self.score)
    }
}

pub fn format_percent(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

/// Left-joins every method's scores onto `names` (first occurrence wins) and
/// computes the composite for each player, keeping `names` order.
pub fn merge_scores<'a>(
    names: impl IntoIterator<Item = &'a str>,
    methods: &[MethodScores],
) -> Vec<RankedPlayer> {
    let lookups: Vec<(SimilarityMethod, HashMap<&str, Option<f64>>)> = methods
        .iter()
        .map(|m| {
            let mut map = HashMap::with_capacity(m.scores.len());
            for (name, score) in &m.scores {
                map.entry(name.as_str()).or_insert(*score);
            }
            (m.method, map)
        })
        .collect();

    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(*name))
        .map(|name| {
            let mut components = ComponentScores::default();
            for (method, map) in &lookups {
                components.set(*method, map.get(name).copied().flatten());
            }
            RankedPlayer {
                name: name.to_string(),
                score: components.composite(),
                components,
            }
        })
        .collect()
}

/// Stable descending sort by composite score, truncated to `top_k`.
pub fn top_k(mut rows: Vec<RankedPlayer>, top_k: usize) -> Vec<RankedPlayer> {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
    rows.truncate(top_k);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(method: SimilarityMethod, rows: &[(&str, Option<f64>)]) -> MethodScores {
        MethodScores {
            method,
            scores: rows.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
        }
    }

    #[test]
    fn weights_sum_to_ten() {
        assert_eq!(total_method_weight(), 10.0);
    }

    #[test]
    fn composite_weights_bray_curtis_five_times() {
        let mut only_bc = ComponentScores::default();
        only_bc.set(SimilarityMethod::BrayCurtis, Some(1.0));
        assert!((only_bc.composite() - 0.5).abs() < 1e-12);

        let mut only_cos = ComponentScores::default();
        only_cos.set(SimilarityMethod::Cosine, Some(1.0));
        assert!((only_cos.composite() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn composite_is_monotonic_in_each_component() {
        for method in SimilarityMethod::ALL {
            let mut low = ComponentScores::default();
            for m in SimilarityMethod::ALL {
                low.set(m, Some(0.4));
            }
            let mut high = low;
            high.set(method, Some(0.6));
            assert!(high.composite() > low.composite(), "{method}");
        }
    }

    #[test]
    fn missing_components_count_as_zero() {
        let merged = merge_scores(
            ["a", "b"],
            &[
                scores(SimilarityMethod::BrayCurtis, &[("a", Some(1.0)), ("b", Some(1.0))]),
                scores(SimilarityMethod::Kulczynski, &[("a", None), ("b", Some(1.0))]),
            ],
        );
        assert_eq!(merged[0].components.kulczynski, None);
        assert!((merged[0].score - 0.5).abs() < 1e-12);
        assert!((merged[1].score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn merge_keeps_first_duplicate_and_sort_is_stable() {
        let merged = merge_scores(
            ["a", "b", "a", "c"],
            &[scores(
                SimilarityMethod::BrayCurtis,
                &[("a", Some(0.2)), ("b", Some(0.2)), ("a", Some(0.9)), ("c", Some(0.8))],
            )],
        );
        assert_eq!(merged.len(), 3);
        let ranked = top_k(merged, 30);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(top_k(ranked, 1).len(), 1);
    }

    #[test]
    fn percent_has_two_decimals() {
        assert_eq!(format_percent(0.87254), "87.25%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_percent(0.0), "0.00%");
    }
}
