//! # Appearance Filter & Metric Normalization
//!
//! First pipeline stage: drop thin lineups, then rescale the outcome metric
//! to the unit interval with min-max normalization. The surviving rows are
//! immutable afterwards; every later stage only reads them.

use crate::error::{EvpError, Result};
use crate::models::{LineupRecord, NormalizedLineup};

/// Keep only rows with `appearances > min_appearances`.
///
/// A row at exactly the threshold is dropped: it contributes to neither the
/// player universe nor any matrix.
pub fn filter_by_appearances(records: Vec<LineupRecord>, min_appearances: u32) -> Vec<LineupRecord> {
    records
        .into_iter()
        .filter(|r| r.appearances > min_appearances)
        .collect()
}

/// Rescale `metric` to `[0, 1]` over the whole slice of surviving rows:
/// `(x - min) / (max - min)`.
///
/// Fails with [`EvpError::DegenerateNormalization`] when every row shares
/// one metric value (the rescaling denominator would be zero); no partial
/// result is produced. An empty input yields an empty output; the
/// pipeline rejects an empty table before this stage runs.
pub fn normalize_metric(records: Vec<LineupRecord>) -> Result<Vec<NormalizedLineup>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for r in &records {
        min = min.min(r.metric);
        max = max.max(r.metric);
    }
    if max == min {
        return Err(EvpError::DegenerateNormalization { value: min, count: records.len() });
    }

    let span = max - min;
    Ok(records
        .into_iter()
        .map(|record| {
            let normalized_metric = (record.metric - min) / span;
            NormalizedLineup { record, normalized_metric }
        })
        .collect())
}
