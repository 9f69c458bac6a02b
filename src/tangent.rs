//! Local tangent-space estimation.
//!
//! For each point, the tangent plane of the manifold is approximated by
//! the dominant singular directions of the point's centered neighborhood.
//! The alignment step consumes the neighbors' *local coordinates* in that
//! plane, i.e. the leading left singular vectors of the centered k×d
//! neighborhood matrix.

use log::debug;
use ndarray::{s, Array2, ArrayView2, Axis};
use ndarray_linalg::SVD;

use crate::error::{LtsaError, LtsaResult};

/// Relative singular-value threshold below which a direction is treated
/// as numerically absent when counting the neighborhood's effective rank.
const RANK_TOLERANCE: f64 = 1e-12;

/// Computes the k×`n_components` local coordinate basis of one
/// neighborhood (k neighbor rows, the point itself excluded).
///
/// The columns are orthonormal; their signs are unconstrained, which is
/// immaterial because the sign is absorbed by the global
/// eigendecomposition later on. When the neighborhood's effective rank is
/// below `n_components` (duplicate or collinear neighbors), the missing
/// columns are filled from the orthonormal complement delivered by the
/// full SVD; this padding is a defined fallback, not a failure. Only a
/// neighborhood whose centered matrix is exactly zero fails, with
/// [`LtsaError::DegenerateNeighborhood`].
pub fn local_coordinate_basis(
    neighborhood: ArrayView2<'_, f64>,
    n_components: usize,
    point: usize,
) -> LtsaResult<Array2<f64>> {
    let centroid = neighborhood
        .mean_axis(Axis(0))
        .ok_or_else(|| LtsaError::Linalg("empty neighborhood has no centroid".to_string()))?;
    let mut centered = neighborhood.to_owned();
    centered -= &centroid;

    if centered.iter().all(|&value| value == 0.0) {
        return Err(LtsaError::DegenerateNeighborhood { point });
    }

    let (left, singular_values, _) = centered.svd(true, false).map_err(|e| {
        LtsaError::Linalg(format!("SVD of neighborhood of point {point} failed: {e}"))
    })?;
    let left = left.ok_or_else(|| {
        LtsaError::Linalg(format!(
            "SVD of neighborhood of point {point} returned no left singular vectors"
        ))
    })?;

    let largest = singular_values[0];
    let effective_rank = singular_values
        .iter()
        .take_while(|&&sigma| sigma > largest * RANK_TOLERANCE)
        .count();
    if effective_rank < n_components {
        debug!(
            "Neighborhood of point {} has rank {} < {}; padding the basis from the orthonormal complement.",
            point, effective_rank, n_components
        );
    }

    Ok(left.slice(s![.., ..n_components]).to_owned())
}
