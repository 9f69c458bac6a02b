//! Nearest-neighbor graph construction.
//!
//! Both search modes are brute-force Euclidean scans, parallelized per
//! point; each point's search reads only the shared sample matrix and
//! writes its own output row, so no synchronization is needed.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;

use crate::error::{LtsaError, LtsaResult};

/// For each point, its neighbor indices ordered by ascending distance.
pub type NeighborGraph = Vec<Vec<usize>>;

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

/// Sorts candidates by distance, breaking exact ties by ascending index,
/// and keeps the `n_neighbors` closest.
fn select_nearest(mut candidates: Vec<(f64, usize)>, n_neighbors: usize) -> Vec<usize> {
    candidates.sort_unstable_by(|left, right| {
        left.0
            .partial_cmp(&right.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.1.cmp(&right.1))
    });
    candidates.truncate(n_neighbors);
    candidates.into_iter().map(|(_, index)| index).collect()
}

/// Finds the `n_neighbors` nearest other points for every sample row.
///
/// Fails with [`LtsaError::InvalidNeighborCount`] when `n_neighbors` is
/// zero or not smaller than the number of samples.
pub fn training_neighbors(samples: &Array2<f64>, n_neighbors: usize) -> LtsaResult<NeighborGraph> {
    let n_samples = samples.nrows();
    if n_neighbors < 1 || n_neighbors >= n_samples {
        return Err(LtsaError::InvalidNeighborCount {
            n_neighbors,
            n_samples,
        });
    }

    let graph = (0..n_samples)
        .into_par_iter()
        .map(|i| {
            let point = samples.row(i);
            let candidates = (0..n_samples)
                .filter(|&j| j != i)
                .map(|j| (squared_distance(point, samples.row(j)), j))
                .collect();
            select_nearest(candidates, n_neighbors)
        })
        .collect();
    Ok(graph)
}

/// Finds, for every query row, its `n_neighbors` nearest rows of the
/// training matrix. Queries are not excluded from the candidate set: a
/// training point queried against its own training set finds itself at
/// distance zero.
///
/// Fails with [`LtsaError::InvalidNeighborCount`] when `n_neighbors` is
/// zero or not smaller than the number of training rows.
pub fn query_neighbors(
    queries: &Array2<f64>,
    training: &Array2<f64>,
    n_neighbors: usize,
) -> LtsaResult<NeighborGraph> {
    let n_training = training.nrows();
    if n_neighbors < 1 || n_neighbors >= n_training {
        return Err(LtsaError::InvalidNeighborCount {
            n_neighbors,
            n_samples: n_training,
        });
    }

    let graph = (0..queries.nrows())
        .into_par_iter()
        .map(|i| {
            let point = queries.row(i);
            let candidates = (0..n_training)
                .map(|j| (squared_distance(point, training.row(j)), j))
                .collect();
            select_nearest(candidates, n_neighbors)
        })
        .collect();
    Ok(graph)
}
