use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

/// A role label as produced by the trained model (e.g. `"Duelist"`).
///
/// The set of roles is fixed by training, so the label is carried as an
/// opaque string and only interpreted through a [`RoleCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Maps each role to an ordered list of agents, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleCatalog {
    roles: BTreeMap<String, Vec<String>>,
}

impl RoleCatalog {
    /// The agent roster the recommender ships with.
    pub fn builtin() -> Self {
        const ROSTER: &[(&str, &[&str])] = &[
            ("Duelist", &["Jett", "Reyna", "Raze", "Phoenix", "Neon", "Yoru", "Iso"]),
            ("Controller", &["Omen", "Brimstone", "Viper", "Astra", "Harbor", "Clove"]),
            ("Sentinel", &["Sage", "Cypher", "Killjoy", "Chamber", "Deadlock"]),
            ("Initiator", &["Sova", "Breach", "Skye", "Fade", "Gekko", "KAY/O"]),
        ];

        let roles = ROSTER
            .iter()
            .map(|(role, agents)| {
                (role.to_string(), agents.iter().map(|a| a.to_string()).collect())
            })
            .collect();
        Self { roles }
    }

    /// Builds a catalog from `(role, agents)` pairs, rejecting empty entries.
    pub fn from_entries<R, A>(entries: impl IntoIterator<Item = (R, Vec<A>)>) -> Result<Self>
    where
        R: Into<String>,
        A: Into<String>,
    {
        let roles = entries
            .into_iter()
            .map(|(role, agents)| (role.into(), agents.into_iter().map(Into::into).collect()))
            .collect();
        let catalog = Self { roles };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads a catalog from a JSON object of `role -> [agent, ...]`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| RecommendError::Catalog(format!("failed to read {}: {}", path.display(), e)))?;
        let catalog: Self = serde_json::from_str(&raw)
            .map_err(|e| RecommendError::Catalog(format!("invalid catalog {}: {}", path.display(), e)))?;
        catalog.validate()?;
        info!("Loaded role catalog with {} roles from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(RecommendError::Catalog("catalog lists no roles".into()));
        }
        for (role, agents) in &self.roles {
            if role.is_empty() {
                return Err(RecommendError::Catalog("role name cannot be empty".into()));
            }
            if agents.is_empty() {
                return Err(RecommendError::Catalog(format!("role '{}' lists no agents", role)));
            }
            if let Some(pos) = agents.iter().position(|a| a.is_empty()) {
                return Err(RecommendError::Catalog(format!(
                    "agent {} of role '{}' cannot be empty",
                    pos + 1,
                    role
                )));
            }
        }
        Ok(())
    }

    /// Agents for `role` in catalog order, or `None` if the role is unknown.
    pub fn agents_for(&self, role: &Role) -> Option<&[String]> {
        self.roles.get(role.as_str()).map(Vec::as_slice)
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains_key(role.as_str())
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.keys().map(|r| Role::new(r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
