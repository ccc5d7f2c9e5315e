use std::path::Path;
use std::sync::Arc;

use log::{error, info};

mod linear;
mod model;
mod onnx;
mod utils;

pub use linear::{LinearModelArtifact, LinearRoleModel};
pub use model::{RoleClassifier, Schema};
pub use onnx::{OnnxRoleModel, CLASSES_KEY, FEATURE_NAMES_KEY, LABEL_OUTPUT};

use crate::error::{RecommendError, Result};
use crate::runtime::RuntimeConfig;

/// Serialisation formats a model artifact can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// ONNX graph, executed with ONNX Runtime.
    Onnx,
    /// Linear multinomial classifier stored as JSON.
    LinearJson,
}

impl ModelFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("onnx") => Ok(Self::Onnx),
            Some("json") => Ok(Self::LinearJson),
            _ => Err(RecommendError::ModelLoad(format!(
                "unsupported model format for {} (expected .onnx or .json)",
                path.display()
            ))),
        }
    }
}

/// Options applied while loading a model artifact.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Lower-case hex SHA-256 the artifact must match.
    pub expected_sha256: Option<String>,
    pub runtime: RuntimeConfig,
}

/// Loads a model with default options.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Arc<dyn RoleClassifier>> {
    load_with(path, &LoadOptions::default())
}

/// Loads the model at `path`, choosing the backend from its extension.
///
/// # Errors
/// `ModelLoad` if the file is missing, fails its checksum, or cannot be
/// deserialised into a valid classifier.
pub fn load_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Arc<dyn RoleClassifier>> {
    let path = path.as_ref();
    let format = ModelFormat::from_path(path)?;
    if !path.is_file() {
        return Err(RecommendError::ModelLoad(format!("model file not found: {}", path.display())));
    }

    if let Some(expected) = &options.expected_sha256 {
        let actual = utils::file_sha256(path)?;
        info!("Model digest: {}", actual);
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            error!("Model hash mismatch: expected {}, got {}", expected, actual);
            return Err(RecommendError::ModelLoad(format!(
                "hash mismatch for {}: expected {}, got {}",
                path.display(),
                expected,
                actual
            )));
        }
    }

    let model: Arc<dyn RoleClassifier> = match format {
        ModelFormat::Onnx => Arc::new(OnnxRoleModel::from_file(path, &options.runtime)?),
        ModelFormat::LinearJson => Arc::new(LinearRoleModel::from_file(path)?),
    };
    Ok(model)
}
