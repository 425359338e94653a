//! Firestore REST API client.
//!
//! This crate provides:
//! - Typed repositories for users and candidates
//! - Service account authentication via gcp_auth, or the local emulator
//! - Masked updates with update-time preconditions
//! - Retry with backoff, tracing spans and request metrics

pub mod auth;
pub mod candidate_repo;
pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod types;
pub mod user_repo;


pub use auth::Credentials;
pub use candidate_repo::CandidateRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use retry::RetryConfig;
pub use types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};
pub use user_repo::UserRepository;
