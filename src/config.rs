use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetConfig;
use crate::error::{RankingError, RankingResult};

pub const MAX_GROUPS: usize = 3;
pub const MAX_WEIGHT: u8 = 10;
pub const DEFAULT_WEIGHT: u8 = 1;
pub const DEFAULT_TOP_K: usize = 30;

/// Caller-defined subset of features compressed into one projected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGroup {
    pub id: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl FeatureGroup {
    pub fn new<I, S>(id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Feature-or-group key to integer weight. Missing keys weigh `DEFAULT_WEIGHT`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap(BTreeMap<String, u8>);

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, weight: u8) -> RankingResult<()> {
        let key = key.into();
        if weight > MAX_WEIGHT {
            return Err(RankingError::InvalidConfig(format!(
                "weight {weight} for `{key}` is outside 0..={MAX_WEIGHT}"
            )));
        }
        self.0.insert(key, weight);
        Ok(())
    }

    pub fn get(&self, key: &str) -> u8 {
        self.0.get(key).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Weights for `keys` in order, as multipliers.
    pub fn vector_for<S: AsRef<str>>(&self, keys: &[S]) -> Vec<f64> {
        keys.iter().map(|k| f64::from(self.get(k.as_ref()))).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(k, w)| (k.as_str(), *w))
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Everything one ranking run needs besides the player data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub features: Vec<String>,
    #[serde(default)]
    pub groups: Vec<FeatureGroup>,
    #[serde(default)]
    pub weights: WeightMap,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl RankingConfig {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            groups: Vec::new(),
            weights: WeightMap::new(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_group(mut self, group: FeatureGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_weight(mut self, key: impl Into<String>, weight: u8) -> RankingResult<Self> {
        self.weights.set(key, weight)?;
        Ok(self)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Groups with at least one member; empty groups mean "do not group".
    pub fn active_groups(&self) -> impl Iterator<Item = &FeatureGroup> {
        self.groups.iter().filter(|g| !g.members.is_empty())
    }

    pub fn uses_grouping(&self) -> bool {
        self.active_groups().next().is_some()
    }

    /// Selected features that belong to no group, in selection order.
    pub fn ungrouped_features(&self) -> Vec<&str> {
        let grouped: HashSet<&str> = self
            .active_groups()
            .flat_map(|g| g.members.iter().map(String::as_str))
            .collect();
        self.features
            .iter()
            .map(String::as_str)
            .filter(|f| !grouped.contains(f))
            .collect()
    }

    /// Column keys of the compared feature vector: ungrouped features, then one per group.
    pub fn compared_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .ungrouped_features()
            .into_iter()
            .map(str::to_string)
            .collect();
        keys.extend(self.active_groups().map(|g| g.id.clone()));
        keys
    }

    /// Weight keys naming neither an ungrouped feature nor a group id. They
    /// have no effect on the ranking.
    pub fn stray_weight_keys(&self) -> Vec<&str> {
        let compared: HashSet<String> = self.compared_keys().into_iter().collect();
        self.weights
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !compared.contains(*key))
            .collect()
    }

    pub fn validate(&self) -> RankingResult<()> {
        if self.features.is_empty() {
            return Err(RankingError::NoFeaturesSelected);
        }
        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.as_str()) {
                return Err(invalid(format!("feature `{feature}` selected twice")));
            }
        }
        if self.groups.len() > MAX_GROUPS {
            return Err(invalid(format!(
                "{} groups configured, at most {MAX_GROUPS} allowed",
                self.groups.len()
            )));
        }

        let mut group_ids = HashSet::new();
        let mut grouped = HashSet::new();
        for group in self.active_groups() {
            if group.id.trim().is_empty() {
                return Err(invalid("group id must not be empty".to_string()));
            }
            if !group_ids.insert(group.id.as_str()) {
                return Err(invalid(format!("group id `{}` used twice", group.id)));
            }
            if seen.contains(group.id.as_str()) {
                return Err(invalid(format!(
                    "group id `{}` collides with a feature name",
                    group.id
                )));
            }
            for member in &group.members {
                if !seen.contains(member.as_str()) {
                    return Err(invalid(format!(
                        "group `{}` member `{member}` is not a selected feature",
                        group.id
                    )));
                }
                if !grouped.insert(member.as_str()) {
                    return Err(invalid(format!(
                        "feature `{member}` belongs to more than one group"
                    )));
                }
            }
        }

        if let Some((key, w)) = self.weights.iter().find(|(_, w)| *w > MAX_WEIGHT) {
            return Err(invalid(format!(
                "weight {w} for `{key}` is outside 0..={MAX_WEIGHT}"
            )));
        }
        if self.top_k == 0 {
            return Err(invalid("top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// `SCOUT_TOP_K` overrides the configured result count.
    pub fn apply_env_overrides(&mut self) {
        if let Some(top_k) = env::var("SCOUT_TOP_K")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .filter(|k| *k > 0)
        {
            self.top_k = top_k;
        }
    }
}

fn invalid(message: String) -> RankingError {
    RankingError::InvalidConfig(message)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<PathBuf>,
    #[serde(default)]
    pub xlsx: Option<PathBuf>,
    #[serde(default)]
    pub show_components: bool,
}

/// Top-level config file consumed by the `scout_rank` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub ranking: RankingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn apply_env_overrides(&mut self) {
        self.ranking.apply_env_overrides();
        self.dataset.apply_env_overrides();
    }
}

pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config = serde_json::from_str::<AppConfig>(&raw)
        .with_context(|| format!("parse config {}", path.display()))?;
    Ok(config)
}

pub fn config_path_from_env() -> Option<PathBuf> {
    env::var("SCOUT_CONFIG")
        .ok()
        .map(|s| PathBuf::from(s.trim()))
        .filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RankingConfig {
        RankingConfig::new(["goals", "xg", "assists", "key_passes"])
    }

    #[test]
    fn compared_keys_put_ungrouped_first() {
        let cfg = base().with_group(FeatureGroup::new("Finishing", ["goals", "xg"]));
        assert_eq!(cfg.compared_keys(), vec!["assists", "key_passes", "Finishing"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_groups_are_ignored() {
        let cfg = base().with_group(FeatureGroup::new("Group 1", Vec::<String>::new()));
        assert!(!cfg.uses_grouping());
        assert_eq!(cfg.compared_keys().len(), 4);
    }

    #[test]
    fn validate_rejects_bad_configs() {
        assert_eq!(
            RankingConfig::new(Vec::<String>::new()).validate(),
            Err(RankingError::NoFeaturesSelected)
        );

        let overlapping = base()
            .with_group(FeatureGroup::new("A", ["goals"]))
            .with_group(FeatureGroup::new("B", ["goals", "xg"]));
        assert!(matches!(overlapping.validate(), Err(RankingError::InvalidConfig(_))));

        let outside = base().with_group(FeatureGroup::new("A", ["tackles"]));
        assert!(matches!(outside.validate(), Err(RankingError::InvalidConfig(_))));

        let too_many = base()
            .with_group(FeatureGroup::new("A", ["goals"]))
            .with_group(FeatureGroup::new("B", ["xg"]))
            .with_group(FeatureGroup::new("C", ["assists"]))
            .with_group(FeatureGroup::new("D", ["key_passes"]));
        assert!(matches!(too_many.validate(), Err(RankingError::InvalidConfig(_))));

        let clash = base().with_group(FeatureGroup::new("goals", ["xg"]));
        assert!(matches!(clash.validate(), Err(RankingError::InvalidConfig(_))));

        assert!(matches!(base().with_top_k(0).validate(), Err(RankingError::InvalidConfig(_))));
    }

    #[test]
    fn weights_default_to_one_and_cap_at_ten() {
        let mut weights = WeightMap::new();
        assert_eq!(weights.get("goals"), DEFAULT_WEIGHT);
        weights.set("goals", 0).unwrap();
        assert_eq!(weights.vector_for(&["goals", "xg"]), vec![0.0, 1.0]);
        assert!(weights.set("xg", 11).is_err());
    }

    #[test]
    fn weights_on_grouped_members_are_stray() {
        let cfg = base()
            .with_group(FeatureGroup::new("Finishing", ["goals", "xg"]))
            .with_weight("goals", 5)
            .unwrap()
            .with_weight("Finishing", 3)
            .unwrap()
            .with_weight("assists", 2)
            .unwrap()
            .with_weight("tackles", 4)
            .unwrap();
        assert_eq!(cfg.stray_weight_keys(), vec!["goals", "tackles"]);
        assert!(base().with_weight("xg", 2).unwrap().stray_weight_keys().is_empty());
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: RankingConfig =
            serde_json::from_str(r#"{"features":["goals"],"weights":{"goals":4}}"#).unwrap();
        assert_eq!(cfg.top_k, DEFAULT_TOP_K);
        assert!(cfg.groups.is_empty());
        assert_eq!(cfg.weights.get("goals"), 4);

        let bad: RankingConfig =
            serde_json::from_str(r#"{"features":["goals"],"weights":{"goals":40}}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
