//! # Productivity Score Artifacts
//!
//! The per-partition player → score mapping is the durable output of a run;
//! it outlives the matrices it was derived from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lineup::{PartitionKey, PlayerId};

/// Productivity scores for one partition's player universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionScores {
    pub key: PartitionKey,
    /// One finite, non-negative score per player in the universe.
    pub scores: BTreeMap<PlayerId, f64>,
}

impl PartitionScores {
    pub fn score(&self, player: &str) -> Option<f64> {
        self.scores.get(player).copied()
    }
}

/// All partitions' scores, kept sorted by partition key so iteration and
/// serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBook {
    partitions: Vec<PartitionScores>,
}

impl ScoreBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a partition's scores, keeping the book sorted by key.
    /// A second insert for the same key replaces the first.
    pub fn insert(&mut self, scores: PartitionScores) {
        match self.partitions.binary_search_by(|p| p.key.cmp(&scores.key)) {
            Ok(idx) => self.partitions[idx] = scores,
            Err(idx) => self.partitions.insert(idx, scores),
        }
    }

    pub fn scores_for(&self, key: &PartitionKey) -> Option<&PartitionScores> {
        self.partitions
            .binary_search_by(|p| p.key.cmp(key))
            .ok()
            .map(|idx| &self.partitions[idx])
    }

    pub fn partitions(&self) -> &[PartitionScores] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
