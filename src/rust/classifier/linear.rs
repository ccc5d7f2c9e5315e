use std::fs;
use std::path::Path;

use log::info;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::model::{RoleClassifier, Schema};
use super::utils::argmax;
use crate::catalog::Role;
use crate::error::{RecommendError, Result};
use crate::features::FeatureVector;

/// On-disk form of a linear multinomial classifier.
///
/// `coefficients` holds one row per class and one column per feature.
/// `mean`/`scale` describe an optional standardisation applied before the
/// linear step, as exported from a scaler + logistic regression pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub coefficients: Vec<Vec<f32>>,
    pub intercepts: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f32>>,
}

/// A role classifier scoring `W · ((x - mean) / scale) + b` and taking the argmax.
#[derive(Debug, Clone)]
pub struct LinearRoleModel {
    schema: Schema,
    classes: Vec<Role>,
    weights: Array2<f32>,
    intercepts: Array1<f32>,
    mean: Array1<f32>,
    scale: Array1<f32>,
}

fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

impl LinearRoleModel {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| RecommendError::model_io(path, e))?;
        let model = Self::from_json_str(&raw)
            .map_err(|e| RecommendError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        info!(
            "Loaded linear model from {:?} ({} features, {} classes)",
            path,
            model.schema.len(),
            model.classes.len()
        );
        Ok(model)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let artifact: LinearModelArtifact = serde_json::from_str(raw)
            .map_err(|e| RecommendError::ModelLoad(format!("invalid linear model: {}", e)))?;
        Self::from_artifact(artifact)
    }

    /// Validates shapes and parameters of `artifact`.
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self> {
        let schema = Schema::new(artifact.feature_names)?;
        let n_features = schema.len();
        let n_classes = artifact.classes.len();

        if n_classes == 0 {
            return Err(RecommendError::ModelLoad("model declares no classes".into()));
        }
        if let Some(pos) = artifact.classes.iter().position(|c| c.is_empty()) {
            return Err(RecommendError::ModelLoad(format!("class {} has an empty label", pos)));
        }
        if artifact.coefficients.len() != n_classes || artifact.intercepts.len() != n_classes {
            return Err(RecommendError::ModelLoad(format!(
                "expected {} coefficient rows and intercepts, got {} and {}",
                n_classes,
                artifact.coefficients.len(),
                artifact.intercepts.len()
            )));
        }
        if let Some(row) = artifact.coefficients.iter().position(|r| r.len() != n_features) {
            return Err(RecommendError::ModelLoad(format!(
                "coefficient row {} has {} values, expected {}",
                row,
                artifact.coefficients[row].len(),
                n_features
            )));
        }

        let mean = artifact.mean.unwrap_or_else(|| vec![0.0; n_features]);
        let scale = artifact.scale.unwrap_or_else(|| vec![1.0; n_features]);
        if mean.len() != n_features || scale.len() != n_features {
            return Err(RecommendError::ModelLoad(format!(
                "mean and scale must have {} values",
                n_features
            )));
        }
        if scale.iter().any(|&s| s == 0.0) {
            return Err(RecommendError::ModelLoad("scale cannot contain zeros".into()));
        }

        let flat: Vec<f32> = artifact.coefficients.into_iter().flatten().collect();
        if !all_finite(&flat) || !all_finite(&artifact.intercepts) || !all_finite(&mean) || !all_finite(&scale) {
            return Err(RecommendError::ModelLoad("model parameters must be finite".into()));
        }
        let weights = Array2::from_shape_vec((n_classes, n_features), flat)
            .map_err(|e| RecommendError::ModelLoad(format!("failed to shape coefficients: {}", e)))?;

        Ok(Self {
            schema,
            classes: artifact.classes.into_iter().map(Role::from).collect(),
            weights,
            intercepts: Array1::from(artifact.intercepts),
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }

    /// Raw per-class scores for one row, in class order.
    pub fn decision_function(&self, features: &FeatureVector) -> Result<Array1<f32>> {
        self.schema.check(features)?;
        let x = Array1::from(features.values().to_vec());
        let z = (x - &self.mean) / &self.scale;
        Ok(self.weights.dot(&z) + &self.intercepts)
    }
}

impl RoleClassifier for LinearRoleModel {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<Role> {
        let scores = self.decision_function(features)?;
        let best = argmax(scores.view()).ok_or_else(|| {
            RecommendError::Prediction(format!("model produced non-finite scores: {:?}", scores))
        })?;
        Ok(self.classes[best].clone())
    }

    fn classes(&self) -> Option<&[Role]> {
        Some(&self.classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> LinearModelArtifact {
        LinearModelArtifact {
            feature_names: vec!["kills_per_match".into(), "utility_usage".into()],
            classes: vec!["Duelist".into(), "Controller".into()],
            coefficients: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            intercepts: vec![0.0, 0.0],
            mean: Some(vec![20.0, 0.5]),
            scale: Some(vec![10.0, 0.25]),
        }
    }

    #[test]
    fn test_standardised_scores() {
        let model = LinearRoleModel::from_artifact(artifact()).unwrap();
        let row = FeatureVector::from_columns(vec![("kills_per_match", 30.0), ("utility_usage", 0.5)]);
        let scores = model.decision_function(&row).unwrap();
        assert_eq!(scores.to_vec(), vec![1.0, 0.0]);
        assert_eq!(model.predict(&row).unwrap(), Role::from("Duelist"));

        let row = FeatureVector::from_columns(vec![("kills_per_match", 20.0), ("utility_usage", 1.0)]);
        assert_eq!(model.predict(&row).unwrap(), Role::from("Controller"));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let mut bad = artifact();
        bad.coefficients[1].push(0.5);
        assert!(matches!(LinearRoleModel::from_artifact(bad), Err(RecommendError::ModelLoad(_))));

        let mut bad = artifact();
        bad.intercepts.pop();
        assert!(matches!(LinearRoleModel::from_artifact(bad), Err(RecommendError::ModelLoad(_))));

        let mut bad = artifact();
        bad.scale = Some(vec![0.0, 1.0]);
        assert!(matches!(LinearRoleModel::from_artifact(bad), Err(RecommendError::ModelLoad(_))));

        let mut bad = artifact();
        bad.intercepts[0] = f32::INFINITY;
        assert!(matches!(LinearRoleModel::from_artifact(bad), Err(RecommendError::ModelLoad(_))));

        let mut bad = artifact();
        bad.classes.clear();
        bad.coefficients.clear();
        bad.intercepts.clear();
        assert!(matches!(LinearRoleModel::from_artifact(bad), Err(RecommendError::ModelLoad(_))));
    }

    #[test]
    fn test_non_finite_input_is_prediction_error() {
        let model = LinearRoleModel::from_artifact(artifact()).unwrap();
        let row = FeatureVector::from_columns(vec![("kills_per_match", f32::NAN), ("utility_usage", 0.5)]);
        assert!(matches!(model.predict(&row), Err(RecommendError::Prediction(_))));
    }
}
