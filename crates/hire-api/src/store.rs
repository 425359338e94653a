//! Storage ports used by the handlers.
//!
//! Handlers only see [`UserStore`] and [`CandidateStore`]. The Firestore
//! repositories implement them for production; [`memory::MemoryStore`]
//! implements them for local runs and tests.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use hire_firestore::{CandidateRepository, FirestoreError, UserRepository};
use hire_models::{Candidate, CandidateId, CandidatePatch, CandidateRecord, UpdateOutcome, User, UserId};

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<FirestoreError> for StoreError {
    fn from(e: FirestoreError) -> Self {
        match e {
            FirestoreError::NotFound(msg) => StoreError::NotFound(msg),
            FirestoreError::AlreadyExists(msg) | FirestoreError::PreconditionFailed(msg) => {
                StoreError::Conflict(msg)
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// One page of an id-ordered candidate scan.
#[derive(Debug, Default)]
pub struct CandidatePage {
    pub records: Vec<CandidateRecord>,
    /// Cursor for the following page, `None` after the last one.
    pub next: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a registered user.
    async fn create_user(&self, user: &User) -> StoreResult<UserId>;

    /// Find the user whose token equals `token` exactly.
    async fn find_by_token(&self, token: &str) -> StoreResult<Option<(UserId, User)>>;
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn create_candidate(&self, candidate: &Candidate) -> StoreResult<CandidateId>;

    async fn get_candidate(&self, id: &CandidateId) -> StoreResult<Option<CandidateRecord>>;

    /// Candidates matching any of `terms`; every candidate when `terms` is empty.
    async fn search(&self, terms: &[String]) -> StoreResult<Vec<CandidateRecord>>;

    async fn list_page(&self, page_size: u32, cursor: Option<&str>) -> StoreResult<CandidatePage>;

    /// `NotFound` if the record does not exist.
    async fn update_candidate(&self, id: &CandidateId, patch: &CandidatePatch) -> StoreResult<UpdateOutcome>;

    /// `NotFound` if nothing was deleted.
    async fn delete_candidate(&self, id: &CandidateId) -> StoreResult<()>;

    /// Make stored records searchable; returns how many were touched.
    async fn prepare_search_index(&self) -> StoreResult<usize>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, user: &User) -> StoreResult<UserId> {
        Ok(self.create(user).await?)
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<(UserId, User)>> {
        Ok(UserRepository::find_by_token(self, token).await?)
    }
}

#[async_trait]
impl CandidateStore for CandidateRepository {
    async fn create_candidate(&self, candidate: &Candidate) -> StoreResult<CandidateId> {
        Ok(self.create(candidate).await?)
    }

    async fn get_candidate(&self, id: &CandidateId) -> StoreResult<Option<CandidateRecord>> {
        Ok(self.get(id).await?)
    }

    async fn search(&self, terms: &[String]) -> StoreResult<Vec<CandidateRecord>> {
        Ok(CandidateRepository::search(self, terms).await?)
    }

    async fn list_page(&self, page_size: u32, cursor: Option<&str>) -> StoreResult<CandidatePage> {
        let (records, next) = CandidateRepository::list_page(self, page_size, cursor).await?;
        Ok(CandidatePage { records, next })
    }

    async fn update_candidate(&self, id: &CandidateId, patch: &CandidatePatch) -> StoreResult<UpdateOutcome> {
        Ok(self.update(id, patch).await?)
    }

    async fn delete_candidate(&self, id: &CandidateId) -> StoreResult<()> {
        Ok(self.delete(id).await?)
    }

    async fn prepare_search_index(&self) -> StoreResult<usize> {
        Ok(self.backfill_skill_terms().await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client().get_document("_health", "_check").await?;
        Ok(())
    }
}
