//! # Pairwise Score Matrix (S) and Contribution Matrix (G)
//!
//! For one partition, S holds a weighted co-occurrence mean per ordered
//! player pair; the diagonal is each player's self-score over every lineup
//! containing them. G column-normalizes S by its diagonal and is the input
//! to the eigen solve.
//!
//! Missing pairs are carried as explicit `None` cells and resolved in a
//! separate pass once every diagonal is known, so the fill order can never
//! change the result. Each cell is a pure function of the read-only lineup
//! slice, which keeps the n x n fill trivially parallelizable if a
//! partition ever grows large enough to warrant it.

use std::collections::BTreeSet;

use nalgebra::DMatrix;

use crate::error::{EvpError, Result};
use crate::models::{PlayerId, LINEUP_SIZE};

/// A lineup reduced to what the matrix pass reads.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionLineup {
    pub players: [PlayerId; LINEUP_SIZE],
    pub weight: u32,
    pub normalized_metric: f64,
}

/// The resolved n x n score matrix over a partition's sorted player
/// universe. Owned by one partition's computation and discarded once the
/// contribution matrix is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    players: Vec<PlayerId>,
    cells: DMatrix<f64>,
}

impl ScoreMatrix {
    /// The partition's player universe, sorted and de-duplicated. Row and
    /// column `i` of the matrix belong to `players()[i]`.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn cells(&self) -> &DMatrix<f64> {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Derive the relative-contribution matrix G.
    ///
    /// Column c is S's column c divided by the self-score `S[c,c]`, so
    /// `G[c,c] == 1` whenever the self-score is non-zero. A zero self-score
    /// zeroes the whole column: there is no meaningful comparison against a
    /// zero-ability denominator. Non-finite ratios are coerced to 0: "no
    /// contribution" is the defined semantics, not an error.
    pub fn contribution(&self) -> DMatrix<f64> {
        let n = self.players.len();
        let mut g = DMatrix::zeros(n, n);
        for c in 0..n {
            let denom = self.cells[(c, c)];
            if denom == 0.0 {
                continue;
            }
            for r in 0..n {
                let ratio = self.cells[(r, c)] / denom;
                g[(r, c)] = if ratio.is_finite() { ratio } else { 0.0 };
            }
        }
        g
    }
}

/// Collect the sorted, de-duplicated set of players appearing in a
/// partition's lineups.
pub fn player_universe(lineups: &[PartitionLineup]) -> Vec<PlayerId> {
    let set: BTreeSet<&PlayerId> = lineups.iter().flat_map(|l| l.players.iter()).collect();
    set.into_iter().cloned().collect()
}

/// Build the score matrix for one partition.
///
/// Every ordered pair cell is the appearance-weighted mean of
/// `normalized_metric` over the lineups containing both players (the
/// player's own lineup set on the diagonal). Pairs that never share a
/// lineup are filled afterwards with the geometric mean of the two
/// self-scores.
pub fn build_score_matrix(lineups: &[PartitionLineup]) -> Result<ScoreMatrix> {
    let players = player_universe(lineups);
    let n = players.len();

    let mut grid: Vec<Option<f64>> = vec![None; n * n];
    for r in 0..n {
        for c in 0..n {
            grid[r * n + c] = weighted_pair_mean(lineups, &players[r], &players[c]);
        }
    }

    let cells = resolve_missing_pairs(&grid, &players)?;
    Ok(ScoreMatrix { players, cells: DMatrix::from_row_slice(n, n, &cells) })
}

/// Appearance-weighted mean of the normalized metric over every lineup
/// containing both `a` and `b` (just `a`'s lineups when `a == b`).
/// `None` when no lineup qualifies or all qualifying weights are zero.
fn weighted_pair_mean(lineups: &[PartitionLineup], a: &str, b: &str) -> Option<f64> {
    let mut weight_sum = 0.0;
    let mut weighted_metric = 0.0;
    for lineup in lineups {
        if !lineup.players.iter().any(|p| p == a) {
            continue;
        }
        if a != b && !lineup.players.iter().any(|p| p == b) {
            continue;
        }
        let w = f64::from(lineup.weight);
        weight_sum += w;
        weighted_metric += w * lineup.normalized_metric;
    }
    if weight_sum == 0.0 {
        None
    } else {
        Some(weighted_metric / weight_sum)
    }
}

/// Fill unresolved off-diagonal cells with `sqrt(S[r,r] * S[c,c])`.
///
/// Runs only after the full pairwise pass: every diagonal must already be
/// resolved (an unresolved one means a player without any backing lineup,
/// which the universe construction rules out but is still checked). A
/// negative self-score product leaves the fallback undefined and fails the
/// partition; normalization into the unit interval keeps self-scores
/// non-negative, so this is unreachable for conforming input.
fn resolve_missing_pairs(grid: &[Option<f64>], players: &[PlayerId]) -> Result<Vec<f64>> {
    let n = players.len();

    let mut diag = Vec::with_capacity(n);
    for (i, player) in players.iter().enumerate() {
        match grid[i * n + i] {
            Some(v) => diag.push(v),
            None => return Err(EvpError::UnresolvableSelfScore { player: player.clone() }),
        }
    }

    let mut cells = vec![0.0; n * n];
    for r in 0..n {
        for c in 0..n {
            cells[r * n + c] = match grid[r * n + c] {
                Some(v) => v,
                None => {
                    let product = diag[r] * diag[c];
                    if product < 0.0 {
                        return Err(EvpError::NegativeFallbackProduct {
                            row_player: players[r].clone(),
                            col_player: players[c].clone(),
                        });
                    }
                    product.sqrt()
                }
            };
        }
    }
    Ok(cells)
}
