use std::io;

/// Errors raised while loading a model or producing a recommendation.
///
/// None of these are transient: every variant stems from a missing or
/// mismatched artifact, so callers should surface them rather than retry.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    /// The model artifact is missing, corrupt or in a format we cannot read.
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// The feature vector does not match the model's declared input schema.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    /// The model requires a field the feature assembler cannot produce.
    #[error("Missing feature: model requires '{0}', which cannot be assembled from player metrics")]
    MissingFeature(String),
    /// The model predicted a role that the catalog does not list.
    #[error("Unknown role: model predicted '{0}', which is not in the role catalog")]
    UnknownRole(String),
    /// Inference failed below the adapter.
    #[error("Prediction error: {0}")]
    Prediction(String),
    /// The role catalog file could not be read or is malformed.
    #[error("Catalog error: {0}")]
    Catalog(String),
    /// The configuration file could not be read or is malformed.
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RecommendError>;

impl RecommendError {
    pub(crate) fn model_io(path: &std::path::Path, err: io::Error) -> Self {
        Self::ModelLoad(format!("failed to read {}: {}", path.display(), err))
    }
}

impl From<ort::Error> for RecommendError {
    fn from(err: ort::Error) -> Self {
        RecommendError::ModelLoad(err.to_string())
    }
}
