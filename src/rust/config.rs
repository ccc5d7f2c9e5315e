use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::Deserialize;

use crate::catalog::RoleCatalog;
use crate::classifier::{self, LoadOptions, RoleClassifier};
use crate::error::{RecommendError, Result};
use crate::recommender::Recommender;
use crate::runtime::RuntimeConfig;

/// Environment variable overriding the default model location.
pub const MODEL_PATH_ENV: &str = "AGENT_RECOMMENDER_MODEL";

/// Model location used when nothing else is configured.
pub const DEFAULT_MODEL_PATH: &str = "models/role_model.json";

/// Everything needed to stand up a [`Recommender`].
///
/// Can be read from a JSON file; every key is optional:
///
/// ```json
/// {
///   "model_path": "models/role_model.onnx",
///   "catalog_path": "roles.json",
///   "model_sha256": "…",
///   "runtime": { "intra_threads": 2, "optimization_level": "basic" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommenderConfig {
    #[serde(default = "RecommenderConfig::default_model_path")]
    pub model_path: PathBuf,
    /// JSON role catalog; the built-in roster is used when unset.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Expected SHA-256 of the model artifact.
    #[serde(default)]
    pub model_sha256: Option<String>,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            model_path: Self::default_model_path(),
            catalog_path: None,
            model_sha256: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl RecommenderConfig {
    /// `$AGENT_RECOMMENDER_MODEL` if set and non-empty, else [`DEFAULT_MODEL_PATH`].
    pub fn default_model_path() -> PathBuf {
        Self::model_path_from(|key| env::var(key).ok())
    }

    fn model_path_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        match lookup(MODEL_PATH_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }

    /// Reads a JSON config file. Relative paths inside it are resolved
    /// against the working directory, like the CLI flags.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| RecommendError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| RecommendError::Config(format!("invalid config {}: {}", path.display(), e)))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Loads the model artifact on its own, without checking it against the
    /// feature assembler or the catalog.
    pub fn load_model(&self) -> Result<Arc<dyn RoleClassifier>> {
        let options = LoadOptions {
            expected_sha256: self.model_sha256.clone(),
            runtime: self.runtime.clone(),
        };
        info!("Loading model from {:?}", self.model_path);
        classifier::load_with(&self.model_path, &options)
    }

    /// The configured catalog file, or the built-in roster.
    pub fn load_catalog(&self) -> Result<RoleCatalog> {
        match &self.catalog_path {
            Some(path) => RoleCatalog::from_file(path),
            None => Ok(RoleCatalog::builtin()),
        }
    }

    /// Wires an already loaded model into a [`Recommender`] with the
    /// configured catalog.
    pub fn build_with(&self, model: Arc<dyn RoleClassifier>) -> Result<Recommender> {
        Recommender::new(model, self.load_catalog()?)
    }

    /// Loads the model and catalog and wires them into a [`Recommender`].
    pub fn build(&self) -> Result<Recommender> {
        self.build_with(self.load_model()?)
    }
}
