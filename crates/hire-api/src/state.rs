//! Application state.

use std::sync::Arc;

use tracing::info;

use hire_firestore::{CandidateRepository, FirestoreClient, UserRepository};

use crate::auth::{AccessPolicy, FlatPolicy};
use crate::config::{ApiConfig, StoreBackend};
use crate::store::{CandidateStore, MemoryStore, UserStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub users: Arc<dyn UserStore>,
    pub candidates: Arc<dyn CandidateStore>,
    pub policy: Arc<dyn AccessPolicy>,
}

impl AppState {
    /// Create new application state for the configured backend.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        match config.store_backend {
            StoreBackend::Firestore => {
                let client = FirestoreClient::from_env().await?;
                info!(
                    project = %client.config().project_id,
                    emulator = client.config().emulator_host.is_some(),
                    "Using Firestore store"
                );
                let users = UserRepository::new(client.clone(), config.users_collection.clone());
                let candidates = CandidateRepository::new(client, config.candidates_collection.clone());
                Ok(Self::with_stores(config, Arc::new(users), Arc::new(candidates)))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Ok(Self::in_memory(config))
            }
        }
    }

    /// State backed by one fresh [`MemoryStore`].
    pub fn in_memory(config: ApiConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    pub fn with_stores(
        config: ApiConfig,
        users: Arc<dyn UserStore>,
        candidates: Arc<dyn CandidateStore>,
    ) -> Self {
        Self {
            config,
            users,
            candidates,
            policy: Arc::new(FlatPolicy),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }
}
