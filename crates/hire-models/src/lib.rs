//! Shared data models for the candidate registry.
//!
//! This crate provides Serde-serializable types for:
//! - Users and their access tokens
//! - Candidate profiles, stored records and partial updates
//! - Storage identifiers
//! - Skill term extraction for text search

pub mod candidate;
pub mod id;
pub mod search;
pub mod user;

// Re-export common types
pub use candidate::{
    fields, Candidate, CandidatePatch, CandidateRecord, Gender, UnknownGender, UpdateOutcome,
};
pub use id::{CandidateId, InvalidId, UserId};
pub use search::{matches_any, query_terms, skill_terms, MAX_QUERY_TERMS};
pub use user::{AccessToken, NewUser, User};
