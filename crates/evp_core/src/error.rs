use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvpError {
    #[error("no lineups survived the appearance filter (min_appearances = {min_appearances})")]
    NoSurvivingLineups { min_appearances: u32 },

    #[error(
        "metric normalization is undefined: all {count} surviving lineups share the value {value}"
    )]
    DegenerateNormalization { value: f64, count: usize },

    #[error("malformed lineup group '{group}': expected 5 players, found {found}")]
    MalformedLineup { group: String, found: usize },

    #[error("player '{player}' has no lineup backing a self score")]
    UnresolvableSelfScore { player: String },

    #[error(
        "self-score product for '{row_player}' x '{col_player}' is negative; \
         geometric-mean fallback is undefined"
    )]
    NegativeFallbackProduct {
        row_player: String,
        col_player: String,
    },

    #[error("eigen solver did not converge for a {size}x{size} contribution matrix")]
    EigenSolveFailure { size: usize },

    #[error("player '{player}' from group '{group}' is missing from the partition score table")]
    ScoreLookupMiss { player: String, group: String },

    #[error("partition processing was cancelled")]
    Cancelled,
}

impl EvpError {
    /// True for violations of the input data contract (bad rows, broken
    /// invariants), false for numeric/solver failures and cancellation.
    pub fn is_data_contract(&self) -> bool {
        match self {
            EvpError::NoSurvivingLineups { .. } => true,
            EvpError::DegenerateNormalization { .. } => true,
            EvpError::MalformedLineup { .. } => true,
            EvpError::UnresolvableSelfScore { .. } => true,
            EvpError::ScoreLookupMiss { .. } => true,
            EvpError::NegativeFallbackProduct { .. } => false,
            EvpError::EigenSolveFailure { .. } => false,
            EvpError::Cancelled => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EvpError>;
