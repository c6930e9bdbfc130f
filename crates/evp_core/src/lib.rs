//! # evp_core - Eigenvalue Productivity Engine
//!
//! Estimates each player's latent productivity from outcomes that are only
//! observed in five-player lineup form. For every (season, team) partition
//! the engine builds a pairwise skill matrix from overlapping lineups,
//! column-normalizes it into a relative-contribution matrix, and takes the
//! dominant eigenvector's absolute value as the per-player scores; every
//! surviving lineup row is annotated with its members' score dispersion.
//!
//! The engine is a pure function of (records, config): acquisition of
//! lineup tables, file persistence and downstream modeling live in other
//! crates and only exchange the typed rows defined in [`models`].
//!
//! ## Example
//!
//! ```
//! use evp_core::{run, EvpConfig, LineupRecord};
//!
//! let records = vec![
//!     LineupRecord {
//!         group: "A - B - C - D - E".into(),
//!         season: 2016,
//!         team: "BOS".into(),
//!         appearances: 20,
//!         metric: 5.0,
//!     },
//!     LineupRecord {
//!         group: "A - B - C - D - F".into(),
//!         season: 2016,
//!         team: "BOS".into(),
//!         appearances: 15,
//!         metric: -3.0,
//!     },
//! ];
//!
//! let output = run(records, &EvpConfig::default()).unwrap();
//! assert_eq!(output.scores.len(), 1);
//! assert!(output.failures.is_empty());
//! ```

// Loop style over matrix indices mirrors the two-index fill the algorithm
// is specified with.
#![allow(clippy::needless_range_loop)]

pub mod analysis;
pub mod error;
pub mod models;

pub use analysis::pipeline::{
    run, run_with_cancel, EvpOutput, PartitionFailure, PartitionStage, RunState,
};
pub use error::{EvpError, Result};
pub use models::{
    AnnotatedLineup, EvpConfig, LineupRecord, NormalizationScope, NormalizedLineup, PartitionKey,
    PartitionScores, PlayerId, ScoreBook, LINEUP_SIZE,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
