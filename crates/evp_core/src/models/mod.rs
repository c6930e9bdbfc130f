pub mod config;
pub mod lineup;
pub mod scores;

pub use config::{EvpConfig, NormalizationScope};
pub use lineup::{
    split_group, AnnotatedLineup, LineupRecord, NormalizedLineup, PartitionKey, PlayerId,
    LINEUP_SIZE,
};
pub use scores::{PartitionScores, ScoreBook};
