//! Predicts a player's role from seven per-match metrics and recommends agents
//! for that role.
//!
//! A request flows through three steps: the metrics are assembled into the
//! exact row a trained model expects, the model predicts a role, and the role
//! is looked up in a [`RoleCatalog`] and truncated to three agents.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use agent_recommender::{recommend, LinearRoleModel, PlayerMetrics, RoleCatalog};
//!
//! let model = LinearRoleModel::from_json_str(r#"{
//!     "feature_names": ["acs", "utility_usage", "playstyle_Aim-Focused Duelists"],
//!     "classes": ["Duelist", "Initiator"],
//!     "coefficients": [[0.01, 0.0, 1.0], [0.0, 6.0, 1.0]],
//!     "intercepts": [0.0, 0.0]
//! }"#)?;
//!
//! let metrics = PlayerMetrics { utility_usage: 0.9, ..PlayerMetrics::default() };
//! let recommendation = recommend(&metrics, &model, &RoleCatalog::builtin())?;
//! assert_eq!(recommendation.role.as_str(), "Initiator");
//! assert_eq!(recommendation.agents, ["Sova", "Breach", "Skye"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Loaded models are read-only, so a [`Recommender`] can be shared across
//! threads behind an `Arc` without locking.

pub mod catalog;
pub mod classifier;
pub mod config;
mod error;
pub mod features;
pub mod recommender;
mod runtime;

pub use catalog::{Role, RoleCatalog};
pub use classifier::{load, load_with, LinearRoleModel, LoadOptions, OnnxRoleModel, RoleClassifier, Schema};
pub use config::RecommenderConfig;
pub use error::{RecommendError, Result};
pub use features::{assemble, FeatureAssembler, FeatureVector, Metric, PlayerMetrics};
pub use recommender::{recommend, Recommendation, Recommender, MAX_RECOMMENDED_AGENTS};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
