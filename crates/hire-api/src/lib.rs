//! Axum HTTP API server for the candidate registry.
//!
//! This crate provides:
//! - Token-authenticated candidate CRUD and skill search
//! - A streamed CSV report of all candidates
//! - Pluggable storage (Firestore or in-memory)
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod report;
pub mod routes;
pub mod state;
pub mod store;

pub use auth::{AccessPolicy, AuthUser, Capability, FlatPolicy, Principal};
pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use store::{CandidateStore, MemoryStore, StoreError, UserStore};
