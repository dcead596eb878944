//! Process-graph handling.
//!
//! Process graphs are caller-supplied and fully opaque: the lifecycle
//! layer never interprets process semantics, it only stores the graph and
//! forwards it to the compute backend. The only check performed at
//! submission time is that the requested API version is present in the
//! external catalog's supported set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An opaque, caller-supplied description of the computation to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessGraph(serde_json::Value);

impl ProcessGraph {
    pub fn new(graph: serde_json::Value) -> Self {
        Self(graph)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for ProcessGraph {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// API-version tag attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(String);

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ApiVersion {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ApiVersion {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supported-version set of the external process catalog.
///
/// Version negotiation itself is the API layer's job; the lifecycle core
/// only rejects submissions whose version tag is not in this set.
#[derive(Debug, Clone)]
pub struct ProcessCatalog {
    supported: BTreeSet<String>,
}

impl ProcessCatalog {
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported: versions.into_iter().map(Into::into).collect(),
        }
    }

    /// Reject submissions carrying a version tag outside the supported set.
    pub fn check(&self, version: &ApiVersion) -> Result<(), CoreError> {
        if self.supported.contains(version.as_str()) {
            Ok(())
        } else {
            Err(CoreError::UnsupportedApiVersion {
                requested: version.as_str().to_string(),
                supported: self
                    .supported
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }

    pub fn supported_versions(&self) -> impl Iterator<Item = &str> {
        self.supported.iter().map(String::as_str)
    }
}

impl Default for ProcessCatalog {
    /// Versions of the processing API the catalog currently ships.
    fn default() -> Self {
        Self::new(["1.0.0", "1.1.0", "1.2.0"])
    }
}
