//! # Lineup Score Dispersion
//!
//! Annotates every surviving lineup row with the standard deviation of its
//! five members' productivity scores. Uses the **sample** convention
//! (denominator n - 1), matching the upstream statistical tooling the
//! artifact is consumed by.

use crate::error::{EvpError, Result};
use crate::models::{AnnotatedLineup, NormalizedLineup, PartitionScores, PlayerId, LINEUP_SIZE};

/// Sample standard deviation (denominator n - 1). Returns 0 for fewer than
/// two values, where the sample convention is undefined.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (n - 1) as f64).sqrt()
}

/// Attach the score dispersion to every row of a partition.
///
/// `split` carries the decomposed players of each row, index-aligned with
/// `rows`. Every member must resolve in the partition's score table; the
/// universe invariant guarantees it, so a miss is a contract violation
/// surfaced with the offending player and group.
pub fn annotate_lineups(
    rows: &[NormalizedLineup],
    split: &[[PlayerId; LINEUP_SIZE]],
    scores: &PartitionScores,
) -> Result<Vec<AnnotatedLineup>> {
    rows.iter()
        .zip(split)
        .map(|(row, players)| {
            let mut member_scores = [0.0; LINEUP_SIZE];
            for (slot, player) in players.iter().enumerate() {
                member_scores[slot] =
                    scores.score(player).ok_or_else(|| EvpError::ScoreLookupMiss {
                        player: player.clone(),
                        group: row.record.group.clone(),
                    })?;
            }
            Ok(AnnotatedLineup {
                record: row.record.clone(),
                players: players.clone(),
                normalized_metric: row.normalized_metric,
                dispersion: sample_std(&member_scores),
            })
        })
        .collect()
}
