//! # Lineup Data Model
//!
//! Typed rows for observed five-player lineups. The engine consumes a
//! caller-supplied, schema-conformant table of [`LineupRecord`]s; acquisition
//! and persistence of that table live outside this crate.

use serde::{Deserialize, Serialize};

use crate::error::{EvpError, Result};

/// Players are identified by opaque strings (names or ids, as the upstream
/// table provides them).
pub type PlayerId = String;

/// Every lineup holds exactly five players.
pub const LINEUP_SIZE: usize = 5;

/// Separator between player tokens inside a composite group identifier,
/// e.g. `"C. Paul - J. Harden - C. Capela - P. Tucker - E. Gordon"`.
pub const GROUP_SEPARATOR: &str = " - ";

/// Independent context a lineup was observed in. Partitions are processed
/// in isolation, each with its own player universe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub season: u16,
    pub team: String,
}

impl PartitionKey {
    pub fn new(season: u16, team: impl Into<String>) -> Self {
        Self { season, team: team.into() }
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.season, self.team)
    }
}

/// One observed lineup row.
///
/// `appearances` is the joint appearance count used as the weight of this
/// observation; `metric` is the raw outcome attached to the whole lineup
/// (e.g. plus/minus). Individual players are never observed directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupRecord {
    /// Composite identifier splitting into exactly five player tokens.
    pub group: String,
    pub season: u16,
    pub team: String,
    pub appearances: u32,
    pub metric: f64,
}

impl LineupRecord {
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey { season: self.season, team: self.team.clone() }
    }
}

/// A surviving row with its metric rescaled to the unit interval.
/// Immutable once produced by the filter/normalize stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLineup {
    pub record: LineupRecord,
    pub normalized_metric: f64,
}

/// A surviving row annotated with the standard deviation of its five
/// members' productivity scores. The union of these across partitions is
/// one of the two output artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedLineup {
    pub record: LineupRecord,
    pub players: [PlayerId; LINEUP_SIZE],
    pub normalized_metric: f64,
    pub dispersion: f64,
}

/// Split a composite group identifier into its five player tokens.
///
/// Exactly five non-empty tokens are required; anything else is a data
/// contract violation and fails loudly rather than truncating or padding.
pub fn split_group(group: &str) -> Result<[PlayerId; LINEUP_SIZE]> {
    let tokens: Vec<&str> = group
        .split(GROUP_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != LINEUP_SIZE {
        return Err(EvpError::MalformedLineup {
            group: group.to_string(),
            found: tokens.len(),
        });
    }
    Ok([
        tokens[0].to_string(),
        tokens[1].to_string(),
        tokens[2].to_string(),
        tokens[3].to_string(),
        tokens[4].to_string(),
    ])
}
