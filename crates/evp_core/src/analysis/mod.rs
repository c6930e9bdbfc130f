//! # Analysis Module
//!
//! The eigenvalue-productivity computation, leaves first:
//!
//! - `filter` - appearance filter and min-max metric normalization
//! - `matrix` - pairwise score matrix S and contribution matrix G
//! - `eigen` - dominant eigenpair extraction
//! - `dispersion` - per-lineup score standard deviation
//! - `pipeline` - per-partition orchestration and aggregation

pub mod dispersion;
pub mod eigen;
pub mod filter;
pub mod matrix;
pub mod pipeline;

pub use dispersion::{annotate_lineups, sample_std};
pub use eigen::{dominant_eigen, DominantEigen};
pub use filter::{filter_by_appearances, normalize_metric};
pub use matrix::{build_score_matrix, player_universe, PartitionLineup, ScoreMatrix};
pub use pipeline::{run, run_with_cancel, EvpOutput, PartitionFailure, PartitionStage, RunState};
