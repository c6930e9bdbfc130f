//! # Run Orchestration
//!
//! Drives the full pipeline: appearance filter, metric normalization,
//! partitioning by (season, team), then per partition the score matrix,
//! contribution matrix, eigen solve and dispersion annotation.
//!
//! Partitions are fully independent (each owns its matrices and score
//! table), so they run in parallel. A partition failure is captured with
//! the stage it occurred in and never aborts the run or touches another
//! partition's result. Aggregation is sequential in key order, which keeps
//! the output deterministic regardless of scheduling.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::dispersion::annotate_lineups;
use crate::analysis::eigen::dominant_eigen;
use crate::analysis::filter::{filter_by_appearances, normalize_metric};
use crate::analysis::matrix::{build_score_matrix, PartitionLineup};
use crate::error::{EvpError, Result};
use crate::models::{
    split_group, AnnotatedLineup, EvpConfig, LineupRecord, NormalizationScope, NormalizedLineup,
    PartitionKey, PartitionScores, ScoreBook,
};

/// Outer pipeline states, traversed in order for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Loaded,
    Filtered,
    PartitionIterating,
    Aggregated,
}

/// Stages of one partition's processing. A failure carries the stage it
/// occurred in; `Queued` marks a partition that never started (cancelled
/// before its first stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionStage {
    Queued,
    NormalizeMetric,
    SplitLineups,
    ScoreMatrix,
    ContributionMatrix,
    EigenSolve,
    Annotate,
}

/// An isolated per-partition failure.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionFailure {
    pub key: PartitionKey,
    pub stage: PartitionStage,
    pub error: EvpError,
}

/// The two output artifacts plus any isolated partition failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvpOutput {
    /// One productivity score table per successfully processed partition.
    pub scores: ScoreBook,
    /// The union of annotated rows across partitions, in partition-key
    /// order; row order within a partition matches the input.
    pub annotated: Vec<AnnotatedLineup>,
    pub failures: Vec<PartitionFailure>,
}

/// Run the engine over a lineup table.
///
/// Returns `Err` only for whole-run failures: nothing surviving the
/// appearance filter, or a degenerate global normalization. Everything
/// partition-scoped is reported through [`EvpOutput::failures`].
pub fn run(records: Vec<LineupRecord>, config: &EvpConfig) -> Result<EvpOutput> {
    let cancel = AtomicBool::new(false);
    run_with_cancel(records, config, &cancel)
}

/// [`run`], honoring a cancellation flag at partition granularity: a
/// partition that has not started when the flag is raised fails with
/// [`EvpError::Cancelled`]; partitions already in flight complete normally.
pub fn run_with_cancel(
    records: Vec<LineupRecord>,
    config: &EvpConfig,
    cancel: &AtomicBool,
) -> Result<EvpOutput> {
    log::debug!("state: {:?}", RunState::Loaded);
    let total = records.len();

    let kept = filter_by_appearances(records, config.min_appearances);
    if kept.is_empty() {
        return Err(EvpError::NoSurvivingLineups { min_appearances: config.min_appearances });
    }
    log::info!(
        "{} of {} lineups kept by the appearance filter (> {})",
        kept.len(),
        total,
        config.min_appearances
    );
    log::debug!("state: {:?}", RunState::Filtered);

    // Under the global scope the whole table is rescaled before any
    // partition work, so a degenerate table fails the run up front. Under
    // the per-partition scope a degenerate partition only fails itself.
    let (work, mut failures) = match config.normalization {
        NormalizationScope::Global => {
            let rows = normalize_metric(kept)?;
            (group_by_key(rows, |row| row.record.partition_key()), Vec::new())
        }
        NormalizationScope::PerPartition => {
            let mut work = Vec::new();
            let mut failures = Vec::new();
            for (key, rows) in group_by_key(kept, LineupRecord::partition_key) {
                match normalize_metric(rows) {
                    Ok(normalized) => work.push((key, normalized)),
                    Err(error) => {
                        log::warn!("partition {key} failed during metric normalization: {error}");
                        failures.push(PartitionFailure {
                            key,
                            stage: PartitionStage::NormalizeMetric,
                            error,
                        });
                    }
                }
            }
            (work, failures)
        }
    };

    log::debug!("state: {:?} ({} partitions)", RunState::PartitionIterating, work.len());
    let results: Vec<(PartitionKey, PartitionResult)> = work
        .into_par_iter()
        .map(|(key, rows)| {
            if cancel.load(Ordering::Relaxed) {
                return (key, Err((PartitionStage::Queued, EvpError::Cancelled)));
            }
            let outcome = process_partition(&key, &rows);
            (key, outcome)
        })
        .collect();

    let mut output = EvpOutput { scores: ScoreBook::new(), annotated: Vec::new(), failures };
    for (key, outcome) in results {
        match outcome {
            Ok((scores, annotated)) => {
                output.scores.insert(scores);
                output.annotated.extend(annotated);
            }
            Err((stage, error)) => {
                log::warn!("partition {key} failed during {stage:?}: {error}");
                output.failures.push(PartitionFailure { key, stage, error });
            }
        }
    }
    output.failures.sort_by(|a, b| a.key.cmp(&b.key));

    log::debug!("state: {:?}", RunState::Aggregated);
    log::info!(
        "aggregated {} partitions, {} annotated lineups, {} failures",
        output.scores.len(),
        output.annotated.len(),
        output.failures.len()
    );
    Ok(output)
}

type PartitionResult =
    std::result::Result<(PartitionScores, Vec<AnnotatedLineup>), (PartitionStage, EvpError)>;

fn process_partition(key: &PartitionKey, rows: &[NormalizedLineup]) -> PartitionResult {
    log::debug!("partition {key}: {:?}", PartitionStage::SplitLineups);
    let mut split = Vec::with_capacity(rows.len());
    for row in rows {
        let players =
            split_group(&row.record.group).map_err(|e| (PartitionStage::SplitLineups, e))?;
        split.push(players);
    }
    let lineups: Vec<PartitionLineup> = rows
        .iter()
        .zip(&split)
        .map(|(row, players)| PartitionLineup {
            players: players.clone(),
            weight: row.record.appearances,
            normalized_metric: row.normalized_metric,
        })
        .collect();

    log::debug!("partition {key}: {:?}", PartitionStage::ScoreMatrix);
    let s = build_score_matrix(&lineups).map_err(|e| (PartitionStage::ScoreMatrix, e))?;

    log::debug!("partition {key}: {:?} ({} players)", PartitionStage::ContributionMatrix, s.len());
    let g = s.contribution();

    log::debug!("partition {key}: {:?}", PartitionStage::EigenSolve);
    let eigen = dominant_eigen(&g).map_err(|e| (PartitionStage::EigenSolve, e))?;

    let scores = PartitionScores {
        key: key.clone(),
        scores: s
            .players()
            .iter()
            .cloned()
            .zip(eigen.productivity.iter().copied())
            .collect(),
    };

    log::debug!("partition {key}: {:?}", PartitionStage::Annotate);
    let annotated =
        annotate_lineups(rows, &split, &scores).map_err(|e| (PartitionStage::Annotate, e))?;
    Ok((scores, annotated))
}

/// Group rows by partition key, preserving input order within each group.
fn group_by_key<T>(
    rows: Vec<T>,
    key_of: impl Fn(&T) -> PartitionKey,
) -> Vec<(PartitionKey, Vec<T>)> {
    let mut groups: BTreeMap<PartitionKey, Vec<T>> = BTreeMap::new();
    for row in rows {
        groups.entry(key_of(&row)).or_default().push(row);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(season: u16, team: &str, group: &str, appearances: u32, metric: f64) -> LineupRecord {
        LineupRecord {
            group: group.to_string(),
            season,
            team: team.to_string(),
            appearances,
            metric,
        }
    }

    fn fixture() -> Vec<LineupRecord> {
        vec![
            rec(2016, "BOS", "A - B - C - D - E", 20, 5.0),
            rec(2016, "BOS", "A - B - C - D - F", 15, -3.0),
            rec(2016, "BOS", "B - C - D - E - F", 12, 1.0),
            rec(2016, "LAL", "P - Q - R - S - T", 30, 8.0),
            rec(2016, "LAL", "P - Q - R - S - U", 10, -8.0),
        ]
    }

    #[test]
    fn test_end_to_end_scores_every_player() {
        let output = run(fixture(), &EvpConfig::default()).unwrap();

        assert!(output.failures.is_empty(), "failures: {:?}", output.failures);
        assert_eq!(output.scores.len(), 2);
        assert_eq!(output.annotated.len(), 5);

        let bos = output.scores.scores_for(&PartitionKey::new(2016, "BOS")).unwrap();
        assert_eq!(bos.scores.len(), 6, "BOS universe is A..F");
        for (player, score) in &bos.scores {
            assert!(score.is_finite(), "score for {player} must be finite");
            assert!(*score >= 0.0, "score for {player} must be non-negative");
        }

        let lal = output.scores.scores_for(&PartitionKey::new(2016, "LAL")).unwrap();
        assert_eq!(lal.scores.len(), 6, "LAL universe is P..U");
        for row in &output.annotated {
            assert!(row.dispersion.is_finite());
            assert!(row.dispersion >= 0.0);
        }
    }

    #[test]
    fn test_threshold_row_fully_excluded() {
        let mut records = fixture();
        // Exactly at the default threshold of 9: dropped, so its players
        // never reach the universe, the matrices or the annotated table.
        records.push(rec(2016, "BOS", "X1 - X2 - X3 - X4 - X5", 9, 2.0));

        let output = run(records, &EvpConfig::default()).unwrap();
        let bos = output.scores.scores_for(&PartitionKey::new(2016, "BOS")).unwrap();
        assert!(bos.score("X1").is_none(), "filtered players must not be scored");
        assert!(
            output.annotated.iter().all(|row| !row.record.group.contains("X1")),
            "filtered rows must not be annotated"
        );
    }

    #[test]
    fn test_idempotent_bitwise() {
        let first = run(fixture(), &EvpConfig::default()).unwrap();
        let second = run(fixture(), &EvpConfig::default()).unwrap();
        assert_eq!(first, second, "same input must reproduce the output bit for bit");
    }

    #[test]
    fn test_partition_failure_is_isolated() {
        let mut records = fixture();
        records.push(rec(2016, "BOS", "A - B - C - D", 25, 2.0));

        let output = run(records, &EvpConfig::default()).unwrap();
        assert_eq!(output.failures.len(), 1);
        let failure = &output.failures[0];
        assert_eq!(failure.key, PartitionKey::new(2016, "BOS"));
        assert_eq!(failure.stage, PartitionStage::SplitLineups);
        assert!(matches!(failure.error, EvpError::MalformedLineup { found: 4, .. }));

        // The healthy partition is untouched.
        assert!(output.scores.scores_for(&PartitionKey::new(2016, "LAL")).is_some());
        assert!(output.scores.scores_for(&PartitionKey::new(2016, "BOS")).is_none());
        assert_eq!(output.annotated.len(), 2, "only LAL rows are annotated");
    }

    #[test]
    fn test_global_degenerate_normalization_fails_run() {
        let records = vec![
            rec(2016, "BOS", "A - B - C - D - E", 20, 3.0),
            rec(2016, "LAL", "P - Q - R - S - T", 30, 3.0),
        ];
        let err = run(records, &EvpConfig::default()).unwrap_err();
        assert_eq!(err, EvpError::DegenerateNormalization { value: 3.0, count: 2 });
    }

    #[test]
    fn test_per_partition_scope_isolates_degenerate_partition() {
        let records = vec![
            // BOS is degenerate on its own; LAL is fine.
            rec(2016, "BOS", "A - B - C - D - E", 20, 3.0),
            rec(2016, "BOS", "A - B - C - D - F", 15, 3.0),
            rec(2016, "LAL", "P - Q - R - S - T", 30, 8.0),
            rec(2016, "LAL", "P - Q - R - S - U", 10, -8.0),
        ];
        let config = EvpConfig {
            normalization: NormalizationScope::PerPartition,
            ..EvpConfig::default()
        };
        let output = run(records, &config).unwrap();

        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].key, PartitionKey::new(2016, "BOS"));
        assert_eq!(output.failures[0].stage, PartitionStage::NormalizeMetric);
        assert!(output.scores.scores_for(&PartitionKey::new(2016, "LAL")).is_some());
    }

    #[test]
    fn test_nothing_survives_filter() {
        let records = vec![rec(2016, "BOS", "A - B - C - D - E", 3, 5.0)];
        let err = run(records, &EvpConfig::default()).unwrap_err();
        assert_eq!(err, EvpError::NoSurvivingLineups { min_appearances: 9 });
    }

    #[test]
    fn test_cancellation_at_partition_granularity() {
        let cancel = AtomicBool::new(true);
        let output = run_with_cancel(fixture(), &EvpConfig::default(), &cancel).unwrap();

        assert!(output.scores.is_empty());
        assert!(output.annotated.is_empty());
        assert_eq!(output.failures.len(), 2, "every queued partition is abandoned");
        for failure in &output.failures {
            assert_eq!(failure.stage, PartitionStage::Queued);
            assert_eq!(failure.error, EvpError::Cancelled);
        }
    }

    #[test]
    fn test_seeded_table_is_reproducible() {
        use rand::seq::SliceRandom;
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pool: Vec<String> = (0..15).map(|i| format!("P{i:02}")).collect();
        let mut records = Vec::new();
        for season in [2016u16, 2017] {
            for team in ["BOS", "LAL", "HOU"] {
                for _ in 0..20 {
                    let picks: Vec<&String> = pool.choose_multiple(&mut rng, 5).collect();
                    let group =
                        picks.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(" - ");
                    records.push(rec(
                        season,
                        team,
                        &group,
                        rng.gen_range(10..60),
                        rng.gen_range(-12.0..12.0),
                    ));
                }
            }
        }

        let first = run(records.clone(), &EvpConfig::default()).unwrap();
        let second = run(records, &EvpConfig::default()).unwrap();
        assert!(first.failures.is_empty(), "failures: {:?}", first.failures);
        assert_eq!(first, second);
        assert_eq!(first.scores.len(), 6);
        for partition in first.scores.partitions() {
            for (player, score) in &partition.scores {
                assert!(
                    score.is_finite() && *score >= 0.0,
                    "{player} in {} got {score}",
                    partition.key
                );
            }
        }
    }

    #[test]
    fn test_annotated_rows_keep_intra_partition_order() {
        let output = run(fixture(), &EvpConfig::default()).unwrap();
        let bos_groups: Vec<&str> = output
            .annotated
            .iter()
            .filter(|row| row.record.team == "BOS")
            .map(|row| row.record.group.as_str())
            .collect();
        assert_eq!(
            bos_groups,
            vec!["A - B - C - D - E", "A - B - C - D - F", "B - C - D - E - F"],
            "row identity within a partition follows the input order"
        );
    }

    #[cfg(all(test, feature = "proptest"))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_records() -> impl Strategy<Value = Vec<LineupRecord>> {
            let pool = ["a", "b", "c", "d", "e", "f", "g", "h"];
            proptest::collection::vec(
                (
                    proptest::sample::subsequence(pool.to_vec(), 5),
                    1u32..40,
                    -50.0f64..50.0,
                    prop_oneof![Just("BOS"), Just("LAL")],
                ),
                1..12,
            )
            .prop_map(|rows| {
                rows.into_iter()
                    .map(|(players, appearances, metric, team)| LineupRecord {
                        group: players.join(" - "),
                        season: 2016,
                        team: team.to_string(),
                        appearances,
                        metric,
                    })
                    .collect()
            })
        }

        proptest! {
            /// Property: a successful run only ever emits finite,
            /// non-negative scores, whatever the table looks like.
            #[test]
            fn prop_scores_finite_non_negative(records in arb_records()) {
                let config = EvpConfig { min_appearances: 0, ..EvpConfig::default() };
                if let Ok(output) = run(records, &config) {
                    for partition in output.scores.partitions() {
                        for score in partition.scores.values() {
                            prop_assert!(score.is_finite());
                            prop_assert!(*score >= 0.0);
                        }
                    }
                }
            }
        }
    }
}
