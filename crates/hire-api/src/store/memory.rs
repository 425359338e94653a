//! In-process store.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use hire_models::{
    matches_any, skill_terms, Candidate, CandidateId, CandidatePatch, CandidateRecord, UpdateOutcome, User, UserId,
};

use super::{CandidatePage, CandidateStore, StoreError, StoreResult, UserStore};

/// Users and candidates kept in memory, candidates ordered by id.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, (UserId, User)>>,
    candidates: RwLock<BTreeMap<String, Candidate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn record(id: &str, candidate: &Candidate) -> StoreResult<CandidateRecord> {
    let id = CandidateId::parse(id).map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(CandidateRecord {
        id,
        candidate: candidate.clone(),
    })
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<UserId> {
        let mut users = self.users.write().await;
        let token = user.token.as_str().to_string();
        if users.contains_key(&token) {
            return Err(StoreError::Conflict("token already issued".to_string()));
        }
        let id = UserId::new();
        users.insert(token, (id.clone(), user.clone()));
        Ok(id)
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<(UserId, User)>> {
        Ok(self.users.read().await.get(token).cloned())
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn create_candidate(&self, candidate: &Candidate) -> StoreResult<CandidateId> {
        let id = CandidateId::new();
        self.candidates
            .write()
            .await
            .insert(id.as_str().to_string(), candidate.clone());
        Ok(id)
    }

    async fn get_candidate(&self, id: &CandidateId) -> StoreResult<Option<CandidateRecord>> {
        self.candidates
            .read()
            .await
            .get(id.as_str())
            .map(|c| record(id.as_str(), c))
            .transpose()
    }

    async fn search(&self, terms: &[String]) -> StoreResult<Vec<CandidateRecord>> {
        self.candidates
            .read()
            .await
            .iter()
            .filter(|(_, c)| terms.is_empty() || matches_any(&skill_terms(&c.skills), terms))
            .map(|(id, c)| record(id, c))
            .collect()
    }

    async fn list_page(&self, page_size: u32, cursor: Option<&str>) -> StoreResult<CandidatePage> {
        let candidates = self.candidates.read().await;
        let start = match cursor {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        let mut page = candidates.range((start, Bound::Unbounded));
        let records = page
            .by_ref()
            .take(page_size as usize)
            .map(|(id, c)| record(id, c))
            .collect::<StoreResult<Vec<_>>>()?;

        let next = if page.next().is_some() {
            records.last().map(|r| r.id.as_str().to_string())
        } else {
            None
        };
        Ok(CandidatePage { records, next })
    }

    async fn update_candidate(&self, id: &CandidateId, patch: &CandidatePatch) -> StoreResult<UpdateOutcome> {
        let mut candidates = self.candidates.write().await;
        let candidate = candidates
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(format!("candidate {}", id)))?;
        Ok(UpdateOutcome::from_changed(patch.apply(candidate)))
    }

    async fn delete_candidate(&self, id: &CandidateId) -> StoreResult<()> {
        self.candidates
            .write()
            .await
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("candidate {}", id)))
    }

    async fn prepare_search_index(&self) -> StoreResult<usize> {
        // Terms are derived on every search.
        Ok(0)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
