use thiserror::Error;

use crate::similarity::SimilarityMethod;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankingError {
    #[error("no features selected; choose at least one metric")]
    NoFeaturesSelected,

    #[error("insufficient data for {context}: {rows} rows, need at least {required}")]
    InsufficientData {
        context: String,
        rows: usize,
        required: usize,
    },

    #[error("{method} similarity is undefined: {reason}")]
    UndefinedSimilarity {
        method: SimilarityMethod,
        reason: String,
    },

    #[error("unknown feature `{0}`")]
    UnknownFeature(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("non-finite value for player `{player}` in column `{column}`")]
    InvalidValue { player: String, column: String },

    #[error("row for `{player}` has {got} values, table has {expected} columns")]
    ShapeMismatch {
        player: String,
        expected: usize,
        got: usize,
    },
}

impl RankingError {
    /// Short stable tag for the failure kind, used in rendered reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RankingError::NoFeaturesSelected => "NoFeaturesSelected",
            RankingError::InsufficientData { .. } => "InsufficientData",
            RankingError::UndefinedSimilarity { .. } => "UndefinedSimilarity",
            RankingError::UnknownFeature(_) => "UnknownFeature",
            RankingError::InvalidConfig(_) => "InvalidConfig",
            RankingError::InvalidValue { .. } => "InvalidValue",
            RankingError::ShapeMismatch { .. } => "ShapeMismatch",
        }
    }
}

pub type RankingResult<T> = Result<T, RankingError>;
