pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod player_table;
pub mod projection;
pub mod reference;
pub mod report;
pub mod similarity;
pub mod synthetic;

pub use config::{FeatureGroup, RankingConfig, WeightMap};
pub use error::{RankingError, RankingResult};
pub use pipeline::{RankingReport, rank_normalized, rank_populations};
pub use player_table::{PlayerRecord, PlayerTable};
pub use similarity::SimilarityMethod;
