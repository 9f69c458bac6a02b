//! The LTSA estimator: fitting, out-of-sample projection, persistence.

use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_linalg::Solve;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

use crate::alignment;
use crate::error::{LtsaError, LtsaResult};
use crate::neighbors;
use crate::spectral;

/// Configuration for the LTSA estimator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LtsaConfig {
    /// Target embedding dimension m. Must be at least 1 and smaller than
    /// the ambient dimension of the samples.
    pub n_components: usize,
    /// Neighborhood size k. Must be greater than `n_components` (a local
    /// frame needs more neighbors than tangent directions) and smaller
    /// than the number of samples.
    pub n_neighbors: usize,
    /// Eigenvalues of the alignment matrix whose magnitude is at most
    /// this fraction of the spectral norm are treated as the trivial
    /// subspace and excluded from the embedding. The constant direction
    /// is always excluded regardless. Default: `1e-12`.
    pub null_space_tolerance: f64,
    /// Ridge term added to the local Gram matrix when solving for
    /// out-of-sample reconstruction weights, scaled by `trace(C)/k`.
    /// Default: `1e-3`.
    pub reconstruction_regularization: f64,
}

impl Default for LtsaConfig {
    fn default() -> Self {
        Self {
            n_components: 2,
            n_neighbors: 10,
            null_space_tolerance: 1e-12,
            reconstruction_regularization: 1e-3,
        }
    }
}

/// A computed embedding.
///
/// The shape convention follows the estimator family this algorithm
/// belongs to: a one-dimensional embedding is exposed as a flat vector of
/// length n rather than an n×1 matrix. The variant is chosen by the
/// fitted `n_components`, never inferred from container shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum Embedding {
    /// One coordinate per sample (`n_components == 1`).
    Vector(Array1<f64>),
    /// One coordinate row per sample (`n_components > 1`).
    Matrix(Array2<f64>),
}

impl Embedding {
    fn from_matrix(matrix: Array2<f64>) -> Self {
        if matrix.ncols() == 1 {
            Embedding::Vector(matrix.column(0).to_owned())
        } else {
            Embedding::Matrix(matrix)
        }
    }

    /// Number of embedded samples.
    pub fn n_samples(&self) -> usize {
        match self {
            Embedding::Vector(coordinates) => coordinates.len(),
            Embedding::Matrix(coordinates) => coordinates.nrows(),
        }
    }

    /// Embedding dimension (1 for the vector form).
    pub fn n_components(&self) -> usize {
        match self {
            Embedding::Vector(_) => 1,
            Embedding::Matrix(coordinates) => coordinates.ncols(),
        }
    }

    /// The embedding as an n×m matrix, re-expanding the vector form to a
    /// single column.
    pub fn to_matrix(&self) -> Array2<f64> {
        match self {
            Embedding::Vector(coordinates) => coordinates
                .view()
                .insert_axis(ndarray::Axis(1))
                .to_owned(),
            Embedding::Matrix(coordinates) => coordinates.clone(),
        }
    }

    /// Borrows the flat coordinates, if this is the vector form.
    pub fn as_vector(&self) -> Option<&Array1<f64>> {
        match self {
            Embedding::Vector(coordinates) => Some(coordinates),
            Embedding::Matrix(_) => None,
        }
    }

    /// Borrows the coordinate matrix, if this is the matrix form.
    pub fn as_matrix(&self) -> Option<&Array2<f64>> {
        match self {
            Embedding::Vector(_) => None,
            Embedding::Matrix(coordinates) => Some(coordinates),
        }
    }
}

/// State installed by a successful `fit`, immutable thereafter.
#[derive(Debug, Serialize, Deserialize)]
struct FittedModel {
    /// Training samples, kept to rebuild neighbor graphs for `transform`.
    training: Array2<f64>,
    /// The n×m training embedding.
    embedding: Array2<f64>,
}

/// Local tangent space alignment estimator.
///
/// Created unfitted; `fit` (or `fit_transform`) installs the model state,
/// after which `transform` maps new samples into the embedding space.
/// `fit` either fully succeeds or leaves the model unfit.
#[derive(Debug, Serialize, Deserialize)]
pub struct LocalTangentSpaceAlignment {
    config: LtsaConfig,
    fitted: Option<FittedModel>,
}

impl Default for LocalTangentSpaceAlignment {
    fn default() -> Self {
        Self::with_config(LtsaConfig::default())
    }
}

impl LocalTangentSpaceAlignment {
    /// Creates an unfitted estimator with the given embedding dimension
    /// and neighborhood size, and default numerics.
    pub fn new(n_components: usize, n_neighbors: usize) -> Self {
        Self::with_config(LtsaConfig {
            n_components,
            n_neighbors,
            ..LtsaConfig::default()
        })
    }

    /// Creates an unfitted estimator with an explicit configuration.
    pub fn with_config(config: LtsaConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// The configured embedding dimension.
    pub fn n_components(&self) -> usize {
        self.config.n_components
    }

    /// The configured neighborhood size.
    pub fn n_neighbors(&self) -> usize {
        self.config.n_neighbors
    }

    /// The full configuration.
    pub fn config(&self) -> &LtsaConfig {
        &self.config
    }

    /// Whether a model has been fitted.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn validate_hyperparameters(&self, n_samples: usize, n_features: usize) -> LtsaResult<()> {
        let m = self.config.n_components;
        let k = self.config.n_neighbors;
        if m < 1 || m >= n_features {
            return Err(LtsaError::InvalidComponentCount {
                n_components: m,
                n_features,
            });
        }
        if k < 1 || k >= n_samples || k <= m {
            return Err(LtsaError::InvalidNeighborCount {
                n_neighbors: k,
                n_samples,
            });
        }
        Ok(())
    }

    /// Fits the model: neighbor graph, per-point tangent bases, alignment
    /// matrix, and its bottom non-trivial spectrum.
    ///
    /// # Errors
    ///
    /// [`LtsaError::InvalidComponentCount`] when `n_components` is zero or
    /// not smaller than the feature count;
    /// [`LtsaError::InvalidNeighborCount`] when `n_neighbors` is
    /// infeasible for the sample count (or does not exceed
    /// `n_components`); [`LtsaError::DegenerateNeighborhood`] and
    /// [`LtsaError::InsufficientSpectrum`] for totally degenerate inputs.
    pub fn fit(&mut self, samples: &Array2<f64>) -> LtsaResult<()> {
        let n_samples = samples.nrows();
        let n_features = samples.ncols();
        self.validate_hyperparameters(n_samples, n_features)?;

        let start = Instant::now();
        info!(
            "Fitting LTSA: {} samples, {} features, n_neighbors={}, n_components={}.",
            n_samples, n_features, self.config.n_neighbors, self.config.n_components
        );

        let graph = neighbors::training_neighbors(samples, self.config.n_neighbors)?;
        debug!("Neighbor graph built.");

        let accumulator =
            alignment::assemble_alignment_matrix(samples, &graph, self.config.n_components)?;
        let alignment_matrix = accumulator.into_inner();

        let embedding = spectral::smallest_nontrivial_eigenvectors(
            &alignment_matrix,
            self.config.n_components,
            self.config.null_space_tolerance,
        )?;

        self.fitted = Some(FittedModel {
            training: samples.clone(),
            embedding,
        });
        info!("LTSA fit completed in {:.2?}.", start.elapsed());
        Ok(())
    }

    /// Fits the model and returns the training embedding.
    pub fn fit_transform(&mut self, samples: &Array2<f64>) -> LtsaResult<Embedding> {
        self.fit(samples)?;
        self.embedding()
    }

    /// The training-time embedding of the fitted model.
    ///
    /// # Errors
    ///
    /// [`LtsaError::ModelNotFitted`] before a successful `fit`.
    pub fn embedding(&self) -> LtsaResult<Embedding> {
        let fitted = self.fitted.as_ref().ok_or(LtsaError::ModelNotFitted)?;
        Ok(Embedding::from_matrix(fitted.embedding.clone()))
    }

    /// Maps new samples into the fitted embedding space through locally
    /// linear reconstruction weights against the training set. The
    /// fitted state is never mutated; concurrent calls are safe.
    ///
    /// # Errors
    ///
    /// [`LtsaError::ModelNotFitted`] before a successful `fit`;
    /// [`LtsaError::ShapeMismatch`] when the query feature dimension
    /// differs from the training one;
    /// [`LtsaError::InvalidNeighborCount`] when `n_neighbors` is
    /// infeasible against the training set size.
    pub fn transform(&self, new_samples: &Array2<f64>) -> LtsaResult<Embedding> {
        let fitted = self.fitted.as_ref().ok_or(LtsaError::ModelNotFitted)?;
        if new_samples.ncols() != fitted.training.ncols() {
            return Err(LtsaError::ShapeMismatch {
                expected: format!("query rows with {} features", fitted.training.ncols()),
                got: format!("{} features", new_samples.ncols()),
            });
        }

        let graph =
            neighbors::query_neighbors(new_samples, &fitted.training, self.config.n_neighbors)?;

        let n_queries = new_samples.nrows();
        let n_components = fitted.embedding.ncols();
        let mut projected = Array2::<f64>::zeros((n_queries, n_components));
        for (query_index, neighbor_indices) in graph.iter().enumerate() {
            let weights = reconstruction_weights(
                new_samples.row(query_index),
                &fitted.training,
                neighbor_indices,
                self.config.reconstruction_regularization,
            )?;
            let mut output_row = projected.row_mut(query_index);
            for (&weight, &neighbor) in weights.iter().zip(neighbor_indices.iter()) {
                output_row.scaled_add(weight, &fitted.embedding.row(neighbor));
            }
        }
        Ok(Embedding::from_matrix(projected))
    }

    /// Saves the fitted model (training samples, embedding, and
    /// hyperparameters) to a file using bincode. Neighbor graphs and
    /// local bases are not persisted; they are recomputed on demand.
    ///
    /// # Errors
    ///
    /// [`LtsaError::ModelNotFitted`] for an unfitted estimator, or I/O
    /// and serialization failures.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> LtsaResult<()> {
        if self.fitted.is_none() {
            return Err(LtsaError::ModelNotFitted);
        }
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| LtsaError::Serialization(format!("failed to serialize LTSA model: {e}")))?;
        Ok(())
    }

    /// Loads a model previously saved with [`Self::save_model`],
    /// validating that the stored state is internally consistent.
    pub fn load_model<P: AsRef<Path>>(path: P) -> LtsaResult<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let model: Self =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| {
                    LtsaError::Serialization(format!("failed to deserialize LTSA model: {e}"))
                })?;
        model.validate_loaded()?;
        Ok(model)
    }

    fn validate_loaded(&self) -> LtsaResult<()> {
        let fitted = match &self.fitted {
            Some(fitted) => fitted,
            None => return Ok(()),
        };
        if fitted.embedding.nrows() != fitted.training.nrows() {
            return Err(LtsaError::Serialization(format!(
                "loaded model is inconsistent: embedding has {} rows but training data has {}",
                fitted.embedding.nrows(),
                fitted.training.nrows()
            )));
        }
        if fitted.embedding.ncols() != self.config.n_components {
            return Err(LtsaError::Serialization(format!(
                "loaded model is inconsistent: embedding has {} columns but n_components is {}",
                fitted.embedding.ncols(),
                self.config.n_components
            )));
        }
        if self.config.n_neighbors >= fitted.training.nrows() {
            return Err(LtsaError::Serialization(format!(
                "loaded model is inconsistent: n_neighbors ({}) is not smaller than the stored training set ({} rows)",
                self.config.n_neighbors,
                fitted.training.nrows()
            )));
        }
        if fitted
            .embedding
            .iter()
            .chain(fitted.training.iter())
            .any(|value| !value.is_finite())
        {
            return Err(LtsaError::Serialization(
                "loaded model contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }
}

/// Solves for the constrained reconstruction weights of one query point:
/// minimize the residual of reconstructing the query from its neighbors,
/// subject to the weights summing to one. Solved on the local Gram matrix
/// of difference vectors with a trace-scaled ridge term; a breakdown of
/// the solve falls back to uniform weights rather than failing.
fn reconstruction_weights(
    query: ArrayView1<'_, f64>,
    training: &Array2<f64>,
    neighbor_indices: &[usize],
    regularization: f64,
) -> LtsaResult<Array1<f64>> {
    let k = neighbor_indices.len();
    let n_features = training.ncols();

    let mut differences = Array2::<f64>::zeros((k, n_features));
    for (j, &neighbor) in neighbor_indices.iter().enumerate() {
        let difference = &query - &training.row(neighbor);
        differences.row_mut(j).assign(&difference);
    }

    let mut gram = differences.dot(&differences.t());
    let trace = gram.diag().sum();
    // A zero trace means the query coincides with every neighbor; keep
    // the system solvable with a plain ridge in that case.
    let ridge = if trace > 0.0 {
        regularization * trace / k as f64
    } else {
        regularization
    };
    for j in 0..k {
        gram[[j, j]] += ridge;
    }

    let ones = Array1::<f64>::ones(k);
    let mut weights = match gram.solve(&ones) {
        Ok(solution) => solution,
        Err(e) => {
            warn!("Local Gram solve failed ({e}); falling back to uniform weights.");
            Array1::from_elem(k, 1.0 / k as f64)
        }
    };

    let total = weights.sum();
    if !total.is_finite() || total.abs() < f64::EPSILON {
        warn!("Reconstruction weights were unusable; falling back to uniform weights.");
        weights = Array1::from_elem(k, 1.0 / k as f64);
    } else {
        weights.mapv_inplace(|value| value / total);
    }
    Ok(weights)
}
