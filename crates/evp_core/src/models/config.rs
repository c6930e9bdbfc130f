//! # Engine Configuration

use serde::{Deserialize, Serialize};

/// Scope over which the min-max metric rescaling is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationScope {
    /// One rescaling over the entire surviving table. Scores stay on a
    /// common metric scale, so a degenerate table fails the whole run.
    #[serde(rename = "global")]
    Global,
    /// Rescale within each partition independently. A degenerate partition
    /// fails alone; scores lose cross-partition comparability.
    #[serde(rename = "per_partition")]
    PerPartition,
}

/// Tunable inputs of an engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvpConfig {
    /// Rows with `appearances <= min_appearances` are dropped before
    /// anything else happens.
    pub min_appearances: u32,
    pub normalization: NormalizationScope,
}

impl Default for EvpConfig {
    fn default() -> Self {
        Self {
            // Lineups need a handful of joint appearances before their
            // outcome metric carries signal.
            min_appearances: 9,
            normalization: NormalizationScope::Global,
        }
    }
}
