//! Opaque identifier newtypes and time aliases.
//!
//! Job identifiers, user references, and backend handles are all opaque
//! strings at the API boundary. Newtypes keep them from being mixed up
//! in function signatures.

use serde::{Deserialize, Serialize};

/// UTC timestamp used for all job record fields.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Unique identifier of a job record.
///
/// Minted once at submission time and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Mint a fresh job identifier (`j-` prefix plus a UUID v4).
    pub fn new() -> Self {
        Self(format!("j-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to an authenticated user.
///
/// Issued by the external identity provider; never validated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier assigned by the compute backend for a submitted job.
///
/// Set at most once on a job record, when submission succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendHandle(String);

impl BackendHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BackendHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BackendHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_are_unique_and_prefixed() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("j-"));
    }

    #[test]
    fn job_id_serializes_as_plain_string() {
        let id = JobId::from("j-abc123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"j-abc123\"");
    }
}
