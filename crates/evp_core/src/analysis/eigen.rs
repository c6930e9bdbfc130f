//! # Dominant Eigenpair Extraction
//!
//! The contribution matrix G is a general real square matrix; nothing about
//! its construction makes it symmetric, so its spectrum may contain complex
//! conjugate pairs. The productivity vector is the element-wise absolute
//! value of the eigenvector attached to the eigenvalue with the largest
//! real part.

use nalgebra::{Complex, DMatrix, DVector};

use crate::error::{EvpError, Result};

/// Iteration cap shared by the Schur and SVD solves.
const MAX_SOLVER_ITERATIONS: usize = 10_000;

/// Relative threshold above which the imaginary part of the selected
/// eigenvalue is reported before the real part is used on its own.
const IMAGINARY_TOLERANCE: f64 = 1e-9;

/// The selected eigenvalue and its per-player productivity vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantEigen {
    pub eigenvalue: Complex<f64>,
    /// Element-wise absolute value of the associated eigenvector. Sign and
    /// scale of an eigenvector are arbitrary; only relative magnitudes
    /// carry meaning, and no further normalization is applied.
    pub productivity: DVector<f64>,
}

/// Extract the dominant eigenpair of a general real square matrix.
///
/// Eigenvalues come from a Schur decomposition. Selection is by **largest
/// real part**; among equal real parts the first in decomposition order is
/// kept. A conjugate pair ties on the real part and both members yield the
/// same vector, since only the real part enters the solve below. When the
/// selected eigenvalue has a non-negligible imaginary part a warning is
/// logged and the real part is used on its own.
///
/// The eigenvector is recovered as the null-space direction of
/// `G - Re(lambda) * I`: the right-singular vector of its smallest singular
/// value.
pub fn dominant_eigen(g: &DMatrix<f64>) -> Result<DominantEigen> {
    let n = g.nrows();
    if n == 0 || g.ncols() != n {
        return Err(EvpError::EigenSolveFailure { size: n });
    }

    let schur = nalgebra::linalg::Schur::try_new(g.clone(), f64::EPSILON, MAX_SOLVER_ITERATIONS)
        .ok_or(EvpError::EigenSolveFailure { size: n })?;
    let eigenvalues = schur.complex_eigenvalues();

    let mut best = 0;
    for idx in 1..eigenvalues.len() {
        if eigenvalues[idx].re > eigenvalues[best].re {
            best = idx;
        }
    }
    let eigenvalue = eigenvalues[best];

    if eigenvalue.im.abs() > IMAGINARY_TOLERANCE * eigenvalue.re.abs().max(1.0) {
        log::warn!(
            "dominant eigenvalue {:.6}{:+.6}i is complex; productivity scores use its real part",
            eigenvalue.re,
            eigenvalue.im
        );
    }

    let shifted = g - DMatrix::identity(n, n) * eigenvalue.re;
    let svd =
        nalgebra::linalg::SVD::try_new(shifted, false, true, f64::EPSILON, MAX_SOLVER_ITERATIONS)
            .ok_or(EvpError::EigenSolveFailure { size: n })?;
    let v_t = svd.v_t.as_ref().ok_or(EvpError::EigenSolveFailure { size: n })?;

    let mut smallest = 0;
    for idx in 1..svd.singular_values.len() {
        if svd.singular_values[idx] < svd.singular_values[smallest] {
            smallest = idx;
        }
    }

    let productivity = v_t.row(smallest).transpose().map(|v: f64| v.abs());
    Ok(DominantEigen { eigenvalue, productivity })
}
