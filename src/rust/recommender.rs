use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::catalog::{Role, RoleCatalog};
use crate::classifier::{RoleClassifier, Schema};
use crate::error::{RecommendError, Result};
use crate::features::{FeatureAssembler, FeaturePlan, PlayerMetrics};

/// Number of agents returned for the predicted role.
pub const MAX_RECOMMENDED_AGENTS: usize = 3;

/// A predicted role and the agents suggested for it, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub role: Role,
    pub agents: Vec<String>,
}

fn lookup(role: Role, catalog: &RoleCatalog) -> Result<Recommendation> {
    let agents = catalog
        .agents_for(&role)
        .ok_or_else(|| RecommendError::UnknownRole(role.to_string()))?;
    let agents = agents.iter().take(MAX_RECOMMENDED_AGENTS).cloned().collect();
    Ok(Recommendation { role, agents })
}

/// Predicts a role for `metrics` and returns up to three agents for it.
///
/// # Errors
/// - `MissingFeature` if the model needs a column we cannot assemble
/// - `SchemaMismatch` / `Prediction` from the classifier
/// - `UnknownRole` if the predicted role is not in `catalog`
pub fn recommend(
    metrics: &PlayerMetrics,
    model: &dyn RoleClassifier,
    catalog: &RoleCatalog,
) -> Result<Recommendation> {
    let features = FeatureAssembler::default().assemble(metrics, model.schema())?;
    let role = model.predict(&features)?;
    lookup(role, catalog)
}

/// A ready-to-serve recommender: a loaded model, its resolved feature plan
/// and the role catalog.
///
/// The schema is queried and resolved once at construction, so a model that
/// needs a column we cannot produce is rejected before any request is served.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use agent_recommender::{LinearRoleModel, PlayerMetrics, Recommender, RoleCatalog};
///
/// let model = LinearRoleModel::from_json_str(r#"{
///     "feature_names": ["kills_per_match", "utility_usage", "headshot_pct"],
///     "classes": ["Duelist", "Controller"],
///     "coefficients": [[0.25, 0.0, 1.0], [0.0, 8.0, 0.0]],
///     "intercepts": [0.0, 0.0]
/// }"#)?;
/// let recommender = Recommender::new(Arc::new(model), RoleCatalog::builtin())?;
///
/// let recommendation = recommender.recommend(&PlayerMetrics::default())?;
/// assert_eq!(recommendation.role.as_str(), "Duelist");
/// assert_eq!(recommendation.agents, ["Jett", "Reyna", "Raze"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Recommender {
    model: Arc<dyn RoleClassifier>,
    catalog: RoleCatalog,
    plan: FeaturePlan,
}

impl Recommender {
    pub fn new(model: Arc<dyn RoleClassifier>, catalog: RoleCatalog) -> Result<Self> {
        Self::with_assembler(model, catalog, &FeatureAssembler::default())
    }

    pub fn with_assembler(
        model: Arc<dyn RoleClassifier>,
        catalog: RoleCatalog,
        assembler: &FeatureAssembler,
    ) -> Result<Self> {
        let plan = assembler.plan(model.schema())?;

        if let Some(classes) = model.classes() {
            for role in classes.iter().filter(|r| !catalog.contains(r)) {
                warn!("Model can predict role '{}', which the catalog does not list", role);
            }
        }

        info!(
            "Recommender ready: {} model fields, {} catalog roles",
            plan.len(),
            catalog.len()
        );
        Ok(Self { model, catalog, plan })
    }

    pub fn schema(&self) -> &Schema {
        self.model.schema()
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    pub fn recommend(&self, metrics: &PlayerMetrics) -> Result<Recommendation> {
        let features = self.plan.fill(metrics);
        let role = self.model.predict(&features)?;
        debug!("Predicted role {} for {:?}", role, metrics);
        lookup(role, &self.catalog)
    }
}
