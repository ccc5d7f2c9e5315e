use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info};
use ndarray::Array2;
use ort::session::Session;
use ort::value::{DynValue, Tensor, ValueType};

use super::model::{RoleClassifier, Schema};
use crate::catalog::Role;
use crate::error::{RecommendError, Result};
use crate::features::FeatureVector;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Custom metadata key holding the ordered input columns as a JSON array.
pub const FEATURE_NAMES_KEY: &str = "feature_names";
/// Custom metadata key holding the class labels as a JSON array.
pub const CLASSES_KEY: &str = "classes";
/// Output carrying the predicted label in converted scikit-learn classifiers.
pub const LABEL_OUTPUT: &str = "output_label";

/// How the graph expects its single row.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputLayout {
    /// One `[1, n]` float tensor under the given input name.
    Tensor(String),
    /// One `[1, 1]` float tensor per column, named after the column.
    PerColumn,
}

/// A role classifier backed by an ONNX graph.
///
/// The schema is read from the artifact itself: either from the
/// `feature_names` metadata entry (single tensor input) or from the input
/// names of a graph that takes one input per column.
#[derive(Debug)]
pub struct OnnxRoleModel {
    session: Arc<Session>,
    schema: Schema,
    layout: InputLayout,
    classes: Option<Vec<Role>>,
    label_output: String,
}

fn parse_string_list(key: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| {
        RecommendError::ModelLoad(format!("metadata '{}' is not a JSON string array: {}", key, e))
    })
}

impl OnnxRoleModel {
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RecommendError::ModelLoad(format!("model file not found: {}", path.display())));
        }

        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| {
                error!("Failed to load ONNX model {:?}: {}", path, e);
                RecommendError::ModelLoad(format!("{}: {}", path.display(), e))
            })?;

        let (feature_names, classes) = {
            let metadata = session.metadata()?;
            (metadata.custom(FEATURE_NAMES_KEY)?, metadata.custom(CLASSES_KEY)?)
        };

        let (schema, layout) = Self::discover_inputs(&session, feature_names.as_deref())?;
        let classes = classes
            .map(|raw| parse_string_list(CLASSES_KEY, &raw))
            .transpose()?
            .map(|labels| labels.into_iter().map(Role::from).collect());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name == LABEL_OUTPUT)
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| RecommendError::ModelLoad("model declares no outputs".into()))?;

        info!(
            "Loaded ONNX model from {:?} ({} features, label output '{}')",
            path,
            schema.len(),
            label_output
        );

        Ok(Self {
            session: Arc::new(session),
            schema,
            layout,
            classes,
            label_output,
        })
    }

    fn discover_inputs(session: &Session, feature_names: Option<&str>) -> Result<(Schema, InputLayout)> {
        match (feature_names, session.inputs.as_slice()) {
            (Some(raw), [input]) => {
                let schema = Schema::new(parse_string_list(FEATURE_NAMES_KEY, raw)?)?;
                if let ValueType::Tensor { dimensions, .. } = &input.input_type {
                    let width = dimensions.last().copied().unwrap_or(-1);
                    if width > 0 && width as usize != schema.len() {
                        return Err(RecommendError::ModelLoad(format!(
                            "input '{}' takes {} columns but metadata lists {}",
                            input.name,
                            width,
                            schema.len()
                        )));
                    }
                }
                Ok((schema, InputLayout::Tensor(input.name.clone())))
            }
            (Some(_), inputs) => Err(RecommendError::ModelLoad(format!(
                "metadata '{}' requires a single input tensor, model has {}",
                FEATURE_NAMES_KEY,
                inputs.len()
            ))),
            (None, inputs) if inputs.len() > 1 => {
                let names = inputs.iter().map(|i| i.name.clone()).collect();
                Ok((Schema::new(names)?, InputLayout::PerColumn))
            }
            (None, _) => Err(RecommendError::ModelLoad(format!(
                "model does not declare its input columns; add a '{}' metadata entry",
                FEATURE_NAMES_KEY
            ))),
        }
    }

    fn label_from_output(&self, value: &DynValue) -> Result<Role> {
        if let Ok(labels) = value.try_extract_string_tensor() {
            return labels
                .iter()
                .next()
                .map(|label| Role::new(label.as_str()))
                .ok_or_else(|| RecommendError::Prediction("model returned an empty label tensor".into()));
        }

        let indices = value.try_extract_tensor::<i64>().map_err(|e| {
            RecommendError::Prediction(format!("unsupported label output '{}': {}", self.label_output, e))
        })?;
        let index = indices
            .iter()
            .next()
            .copied()
            .ok_or_else(|| RecommendError::Prediction("model returned an empty label tensor".into()))?;
        let classes = self.classes.as_deref().ok_or_else(|| {
            RecommendError::Prediction(format!(
                "model returned class index {} but declares no '{}' metadata",
                index, CLASSES_KEY
            ))
        })?;
        usize::try_from(index)
            .ok()
            .and_then(|i| classes.get(i))
            .cloned()
            .ok_or_else(|| RecommendError::Prediction(format!("class index {} out of range", index)))
    }
}

impl RoleClassifier for OnnxRoleModel {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<Role> {
        self.schema.check(features)?;

        let mut input_tensors = HashMap::new();
        match &self.layout {
            InputLayout::Tensor(name) => {
                let row = Array2::from_shape_vec((1, features.len()), features.values().to_vec())
                    .map_err(|e| RecommendError::Prediction(format!("Failed to create input array: {}", e)))?;
                input_tensors.insert(
                    name.as_str(),
                    Tensor::from_array(row)
                        .map_err(|e| RecommendError::Prediction(format!("Failed to create input tensor: {}", e)))?,
                );
            }
            InputLayout::PerColumn => {
                for (name, value) in features.iter() {
                    let cell = Array2::from_elem((1, 1), value);
                    input_tensors.insert(
                        name,
                        Tensor::from_array(cell).map_err(|e| {
                            RecommendError::Prediction(format!("Failed to create tensor for '{}': {}", name, e))
                        })?,
                    );
                }
            }
        }

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| RecommendError::Prediction(format!("Failed to run model: {}", e)))?;
        let role = self.label_from_output(&outputs[self.label_output.as_str()])?;
        debug!("ONNX model predicted {}", role);
        Ok(role)
    }

    fn classes(&self) -> Option<&[Role]> {
        self.classes.as_deref()
    }
}
