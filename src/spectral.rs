//! Bottom-spectrum extraction from the alignment matrix.

use log::debug;
use ndarray::{s, Array2};
use ndarray_linalg::{Eigh, UPLO};

use crate::error::{LtsaError, LtsaResult};

/// Returns the eigenvectors of the `n_components` smallest non-trivial
/// eigenvalues of a symmetric matrix, as an n×`n_components` matrix with
/// orthonormal columns ordered by ascending eigenvalue.
///
/// Eigenvalues whose magnitude is at most `tolerance` times the spectral
/// norm belong to the trivial/degenerate subspace and are skipped. At
/// least one eigenvector is always skipped: the constant direction sits
/// in the alignment matrix's null space by construction and carries no
/// geometric information, whether or not it clears the tolerance
/// numerically. Fails with [`LtsaError::InsufficientSpectrum`] when fewer
/// than `n_components` eigenvectors remain.
pub fn smallest_nontrivial_eigenvectors(
    matrix: &Array2<f64>,
    n_components: usize,
    tolerance: f64,
) -> LtsaResult<Array2<f64>> {
    let (eigenvalues, eigenvectors) = matrix
        .eigh(UPLO::Upper)
        .map_err(|e| LtsaError::Linalg(format!("eigendecomposition of alignment matrix failed: {e}")))?;

    // LAPACK returns eigenvalues in ascending order; the trivial subspace
    // occupies the bottom of the spectrum.
    let n = eigenvalues.len();
    let spectral_norm = eigenvalues
        .iter()
        .fold(0.0_f64, |acc, &value| acc.max(value.abs()));
    let threshold = spectral_norm * tolerance;
    let n_trivial = eigenvalues
        .iter()
        .take_while(|&&value| value.abs() <= threshold)
        .count()
        .max(1);
    debug!(
        "Skipping {} trivial eigenvalues (threshold {:.3e}, spectral norm {:.3e}).",
        n_trivial, threshold, spectral_norm
    );

    if n_trivial + n_components > n {
        return Err(LtsaError::InsufficientSpectrum {
            available: n - n_trivial,
            requested: n_components,
        });
    }

    Ok(eigenvectors
        .slice(s![.., n_trivial..n_trivial + n_components])
        .to_owned())
}
