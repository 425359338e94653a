//! Storage-assigned record identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Length of a storage identifier (simple-form UUID).
pub const ID_LENGTH: usize = 32;

/// Identifier rejected before it reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid identifier '{0}': expected {ID_LENGTH} lowercase hex characters")]
pub struct InvalidId(pub String);

fn is_valid_id(s: &str) -> bool {
    s.len() == ID_LENGTH && s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Internal identifier of a candidate document.
///
/// Distinct from the client-supplied `UUID` carried inside the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    /// Generate a new random candidate ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse an ID received from a client or read back from storage.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        if is_valid_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidId(s.to_string()))
        }
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal identifier of a user document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from a string read back from storage.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_id_generation() {
        let id1 = CandidateId::new();
        let id2 = CandidateId::new();
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), ID_LENGTH);
    }

    #[test]
    fn test_generated_id_parses() {
        let id = CandidateId::new();
        assert_eq!(CandidateId::parse(id.as_str()), Ok(id));
    }

    #[test]
    fn test_malformed_ids_rejected() {
        assert!(CandidateId::parse("").is_err());
        assert!(CandidateId::parse("not-an-id").is_err());
        assert!(CandidateId::parse("64b7f0c2e1a9d3b4c5f6a7b8").is_err());
        assert!(CandidateId::parse("0123456789ABCDEF0123456789abcdef").is_err());
        assert!(CandidateId::parse("../../0123456789abcdef0123456789").is_err());
    }
}
