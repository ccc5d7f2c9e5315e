use serde::Serialize;

use crate::catalog::Role;
use crate::error::{RecommendError, Result};
use crate::features::FeatureVector;

/// The ordered input columns a model was trained with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    /// Creates a schema, rejecting empty or duplicated field lists.
    pub fn new(fields: Vec<String>) -> Result<Self> {
        if fields.is_empty() {
            return Err(RecommendError::ModelLoad("model declares no input fields".into()));
        }
        if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
            return Err(RecommendError::ModelLoad(format!("input field {} has an empty name", pos)));
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].contains(field) {
                return Err(RecommendError::ModelLoad(format!(
                    "input field '{}' is declared more than once",
                    field
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Ensures `features` carries exactly these columns in this order.
    pub fn check(&self, features: &FeatureVector) -> Result<()> {
        let names = features.names();
        if names.len() != self.fields.len() {
            return Err(RecommendError::SchemaMismatch(format!(
                "expected {} fields, got {}",
                self.fields.len(),
                names.len()
            )));
        }
        if let Some(i) = self.fields.iter().zip(names).position(|(want, got)| want != got) {
            return Err(RecommendError::SchemaMismatch(format!(
                "column {}: expected '{}', got '{}'",
                i, self.fields[i], names[i]
            )));
        }
        Ok(())
    }
}

/// A loaded, read-only role classifier.
///
/// Implementations hold no per-request state, so a single instance can be
/// shared across threads behind an `Arc`.
pub trait RoleClassifier: Send + Sync {
    /// The exact input columns [`predict`](Self::predict) accepts, in order.
    fn schema(&self) -> &Schema;

    /// Predicts a role for one row.
    ///
    /// # Errors
    /// - `SchemaMismatch` if `features` does not match [`schema`](Self::schema)
    /// - `Prediction` if inference itself fails
    fn predict(&self, features: &FeatureVector) -> Result<Role>;

    /// Role labels the model can emit, when the artifact declares them.
    fn classes(&self) -> Option<&[Role]> {
        None
    }
}
