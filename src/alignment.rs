//! Alignment-matrix assembly.
//!
//! Every point contributes a small symmetric projector confined to the
//! index block of its neighborhood; the global embedding is read off the
//! bottom of the assembled matrix's spectrum. Per-point projectors are
//! computed in parallel, while the scatter-add into the shared
//! accumulator is a single sequential pass, since neighborhoods overlap.

use log::debug;
use ndarray::{s, Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::error::LtsaResult;
use crate::neighbors::NeighborGraph;
use crate::tangent;

/// Symmetric n×n accumulator for the per-neighborhood projectors.
///
/// Conceptually sparse (each point touches only its neighborhood block)
/// but stored densely, matching how the downstream eigendecomposition
/// consumes it.
#[derive(Debug)]
pub struct AlignmentMatrix {
    data: Array2<f64>,
}

impl AlignmentMatrix {
    /// Creates a zero-initialized accumulator for `n_samples` points.
    pub fn new(n_samples: usize) -> Self {
        Self {
            data: Array2::zeros((n_samples, n_samples)),
        }
    }

    /// Scatter-adds a k×k projector into the `neighbors × neighbors`
    /// sub-block. Contributions sum; overlapping neighborhoods never
    /// overwrite each other.
    pub fn accumulate(&mut self, neighbors: &[usize], projector: &Array2<f64>) {
        debug_assert_eq!(projector.nrows(), neighbors.len());
        debug_assert_eq!(projector.ncols(), neighbors.len());
        for (a, &row) in neighbors.iter().enumerate() {
            for (b, &col) in neighbors.iter().enumerate() {
                self.data[[row, col]] += projector[[a, b]];
            }
        }
    }

    /// Borrows the assembled matrix.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Consumes the accumulator and returns the assembled matrix.
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

/// Builds the local projector W = I − G·Gᵀ for one neighborhood, where
/// G's first column is the constant vector 1/√k and the remaining columns
/// are the neighbors' local tangent coordinates.
///
/// W is symmetric and idempotent; it annihilates exactly the directions a
/// consistent global embedding is allowed to vary along within this
/// neighborhood (the constant offset plus the tangent plane).
pub fn local_projector(basis: &Array2<f64>) -> Array2<f64> {
    let k = basis.nrows();
    let m = basis.ncols();

    let mut frame = Array2::<f64>::zeros((k, m + 1));
    frame.column_mut(0).fill((k as f64).sqrt().recip());
    frame.slice_mut(s![.., 1..]).assign(basis);

    let mut projector = -frame.dot(&frame.t());
    for i in 0..k {
        projector[[i, i]] += 1.0;
    }
    projector
}

/// Runs the per-point tangent estimation over the whole neighbor graph
/// and accumulates every local projector into one alignment matrix.
pub fn assemble_alignment_matrix(
    samples: &Array2<f64>,
    graph: &NeighborGraph,
    n_components: usize,
) -> LtsaResult<AlignmentMatrix> {
    let projectors = graph
        .par_iter()
        .enumerate()
        .map(|(point, neighbor_indices)| -> LtsaResult<Array2<f64>> {
            let neighborhood = samples.select(Axis(0), neighbor_indices);
            let basis = tangent::local_coordinate_basis(neighborhood.view(), n_components, point)?;
            Ok(local_projector(&basis))
        })
        .collect::<LtsaResult<Vec<Array2<f64>>>>()?;

    let mut accumulator = AlignmentMatrix::new(samples.nrows());
    for (neighbor_indices, projector) in graph.iter().zip(projectors.iter()) {
        accumulator.accumulate(neighbor_indices, projector);
    }
    debug!(
        "Assembled {}x{} alignment matrix from {} neighborhoods.",
        samples.nrows(),
        samples.nrows(),
        graph.len()
    );
    Ok(accumulator)
}
