// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error types for atlas operations.

Only contract violations and storage failures are errors. Missing or
incomplete atlas content is reported through
[`AtlasWarning`](crate::AtlasWarning) instead, so that a batch run over many
atlases keeps going.
*/

/// Result type for atlas operations
pub type AtlasResult<T> = Result<T, AtlasError>;

/// Errors that can occur while resolving atlas queries
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("No naming convention matched the atlas region hierarchy: {0}")]
    UnresolvedConvention(String),

    #[error("Query constrains both depth and height; at most one principal-axis field may be used")]
    ConflictingAxis,

    #[error("Cannot sample positions from an empty region: {0}")]
    EmptyRegion(String),

    #[error("Layer {0} is not part of the configured layer stack")]
    UnknownLayer(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Shape mismatch for {dataset}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        dataset: String,
        expected: (usize, usize, usize),
        actual: Vec<usize>,
    },

    #[error("Invalid acronym pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Atlas store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<regex::Error> for AtlasError {
    fn from(err: regex::Error) -> Self {
        AtlasError::InvalidPattern(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AtlasError {
    fn from(err: ndarray::ShapeError) -> Self {
        AtlasError::InvalidData(err.to_string())
    }
}

impl From<serde_json::Error> for AtlasError {
    fn from(err: serde_json::Error) -> Self {
        AtlasError::InvalidData(format!("hierarchy JSON: {}", err))
    }
}
