//! Error types for LTSA fitting and projection.

use thiserror::Error;

/// Result type for LTSA operations.
pub type LtsaResult<T> = std::result::Result<T, LtsaError>;

/// Errors that can occur while fitting an LTSA model or projecting
/// samples through one.
#[derive(Debug, Error)]
pub enum LtsaError {
    /// The neighbor count is out of range for the available samples.
    ///
    /// `n_neighbors` must be at least 1, greater than the number of
    /// embedding components, and smaller than the number of samples the
    /// search runs against.
    #[error("invalid neighbor count: n_neighbors ({n_neighbors}) is out of range for {n_samples} samples")]
    InvalidNeighborCount { n_neighbors: usize, n_samples: usize },

    /// The embedding dimension is out of range for the ambient dimension.
    #[error("invalid component count: n_components ({n_components}) must be at least 1 and smaller than the number of features ({n_features})")]
    InvalidComponentCount {
        n_components: usize,
        n_features: usize,
    },

    /// Every neighbor of the point coincides with the neighborhood
    /// centroid, so no tangent direction exists at all.
    #[error("neighborhood of point {point} has rank zero; its local tangent basis is undefined")]
    DegenerateNeighborhood { point: usize },

    /// The alignment matrix does not carry enough non-trivial
    /// eigenvectors for the requested embedding dimension.
    #[error("alignment matrix has only {available} non-trivial eigenvectors but {requested} were requested")]
    InsufficientSpectrum { available: usize, requested: usize },

    /// `transform` or embedding access before a successful `fit`.
    #[error("model has not been fitted; call fit before transform or embedding access")]
    ModelNotFitted,

    /// Input dimensions do not line up with the fitted model.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// A delegated LAPACK routine (eigendecomposition, SVD, or linear
    /// solve) failed.
    #[error("linear algebra routine failed: {0}")]
    Linalg(String),

    /// File I/O failed while saving or loading a model.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A model could not be serialized, or a loaded model was malformed
    /// or internally inconsistent.
    #[error("serialization error: {0}")]
    Serialization(String),
}
