//! Typed repository for candidate documents.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use hire_models::{
    fields, skill_terms, Candidate, CandidateId, CandidatePatch, CandidateRecord, Gender, UpdateOutcome,
};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FieldOperator, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

/// Derived search field holding the tokenized skills.
pub const SKILL_TERMS: &str = "skill_terms";
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// Page size used when walking the whole collection.
const SCAN_PAGE_SIZE: u32 = 300;

/// Repository for candidate documents in a top-level collection.
#[derive(Clone)]
pub struct CandidateRepository {
    client: FirestoreClient,
    collection: String,
}

impl CandidateRepository {
    const MAX_UPDATE_RETRIES: u32 = 3;

    pub fn new(client: FirestoreClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    pub fn client(&self) -> &FirestoreClient {
        &self.client
    }

    /// Store a new candidate under a fresh internal id.
    pub async fn create(&self, candidate: &Candidate) -> FirestoreResult<CandidateId> {
        let id = CandidateId::new();
        let now = Utc::now();
        let mut fields = candidate_to_fields(candidate);
        fields.insert(CREATED_AT.to_string(), now.to_firestore_value());
        fields.insert(UPDATED_AT.to_string(), now.to_firestore_value());

        self.client
            .create_document(&self.collection, id.as_str(), fields)
            .await?;
        info!("Created candidate record: {}", id);
        Ok(id)
    }

    /// Get a candidate by internal id.
    pub async fn get(&self, id: &CandidateId) -> FirestoreResult<Option<CandidateRecord>> {
        match self.client.get_document(&self.collection, id.as_str()).await? {
            Some(doc) => Ok(Some(document_to_record(&doc)?)),
            None => Ok(None),
        }
    }

    /// One page of candidates in id order, plus the token of the next page.
    pub async fn list_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> FirestoreResult<(Vec<CandidateRecord>, Option<String>)> {
        let response = self
            .client
            .list_documents(&self.collection, Some(page_size), page_token)
            .await?;

        let records = response
            .documents
            .unwrap_or_default()
            .iter()
            .filter_map(|doc| self.decode_or_skip(doc))
            .collect();

        let next = response.next_page_token.filter(|t| !t.is_empty());
        Ok((records, next))
    }

    /// Every candidate in the collection.
    pub async fn list_all(&self) -> FirestoreResult<Vec<CandidateRecord>> {
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let (records, next) = self.list_page(SCAN_PAGE_SIZE, page_token.as_deref()).await?;
            all.extend(records);
            match next {
                Some(token) => page_token = Some(token),
                None => return Ok(all),
            }
        }
    }

    /// Candidates whose skill terms contain any of `terms`.
    ///
    /// No terms means no filter.
    pub async fn search(&self, terms: &[String]) -> FirestoreResult<Vec<CandidateRecord>> {
        if terms.is_empty() {
            return self.list_all().await;
        }

        let query = StructuredQuery::collection(&self.collection).filter(
            SKILL_TERMS,
            FieldOperator::ArrayContainsAny,
            terms.to_vec().to_firestore_value(),
        );
        let docs = self.client.run_query(query).await?;
        debug!(terms = terms.len(), matched = docs.len(), "Candidate search");

        Ok(docs.iter().filter_map(|doc| self.decode_or_skip(doc)).collect())
    }

    /// Apply a partial update.
    ///
    /// Read-modify-write guarded by the document's update time; a concurrent
    /// writer causes a re-read, up to `MAX_UPDATE_RETRIES` times.
    pub async fn update(&self, id: &CandidateId, patch: &CandidatePatch) -> FirestoreResult<UpdateOutcome> {
        let mut last_error = None;

        for attempt in 0..Self::MAX_UPDATE_RETRIES {
            let doc = self
                .client
                .get_document(&self.collection, id.as_str())
                .await?
                .ok_or_else(|| FirestoreError::not_found(format!("{}/{}", self.collection, id)))?;

            let mut record = document_to_record(&doc)?;
            let changed = patch.apply(&mut record.candidate);
            if changed.is_empty() {
                return Ok(UpdateOutcome::Unchanged);
            }

            let all = candidate_to_fields(&record.candidate);
            let mut mask: Vec<&str> = changed.clone();
            let mut fields: HashMap<String, Value> = changed
                .iter()
                .filter_map(|name| all.get(*name).map(|v| (name.to_string(), v.clone())))
                .collect();
            if changed.contains(&fields::SKILLS) {
                mask.push(SKILL_TERMS);
                if let Some(terms) = all.get(SKILL_TERMS) {
                    fields.insert(SKILL_TERMS.to_string(), terms.clone());
                }
            }
            mask.push(UPDATED_AT);
            fields.insert(UPDATED_AT.to_string(), Utc::now().to_firestore_value());

            match self
                .client
                .update_document(&self.collection, id.as_str(), fields, &mask, doc.update_time.as_deref())
                .await
            {
                Ok(_) => {
                    info!("Updated candidate {}: {:?}", id, changed);
                    return Ok(UpdateOutcome::Updated(changed));
                }
                Err(e) if e.is_precondition_failed() => {
                    debug!(
                        "Candidate update precondition failed for {} (attempt {}), retrying",
                        id,
                        attempt + 1
                    );
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(50 * (attempt as u64 + 1))).await;
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            "Candidate update failed after {} attempts for {}: {:?}",
            Self::MAX_UPDATE_RETRIES,
            id,
            last_error
        );
        Err(FirestoreError::PreconditionFailed(format!(
            "Candidate {} kept changing during update",
            id
        )))
    }

    /// Delete a candidate; `NotFound` if there was nothing to delete.
    pub async fn delete(&self, id: &CandidateId) -> FirestoreResult<()> {
        self.client
            .delete_existing_document(&self.collection, id.as_str())
            .await?;
        info!("Deleted candidate record: {}", id);
        Ok(())
    }

    /// Derive `skill_terms` on documents written without it.
    ///
    /// Returns the number of documents updated.
    pub async fn backfill_skill_terms(&self) -> FirestoreResult<usize> {
        let mut updated = 0;
        let mut page_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_documents(&self.collection, Some(SCAN_PAGE_SIZE), page_token.as_deref())
                .await?;

            for doc in response.documents.iter().flatten() {
                if doc.has_field(SKILL_TERMS) {
                    continue;
                }
                let Some(doc_id) = doc.id() else { continue };
                let skills: Vec<String> = doc.get(fields::SKILLS).unwrap_or_default();

                let mut fields = HashMap::new();
                fields.insert(SKILL_TERMS.to_string(), skill_terms(&skills).to_firestore_value());

                match self
                    .client
                    .update_document(&self.collection, doc_id, fields, &[SKILL_TERMS], doc.update_time.as_deref())
                    .await
                {
                    Ok(_) => updated += 1,
                    // A concurrent write went through the repository and set the field.
                    Err(e) if e.is_precondition_failed() || matches!(e, FirestoreError::NotFound(_)) => {
                        debug!("Skipping skill term backfill for {}: {}", doc_id, e);
                    }
                    Err(e) => return Err(e),
                }
            }

            match response.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if updated > 0 {
            info!("Backfilled skill terms on {} candidate documents", updated);
        }
        Ok(updated)
    }

    fn decode_or_skip(&self, doc: &Document) -> Option<CandidateRecord> {
        match document_to_record(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection = %self.collection, "Skipping unreadable candidate document: {}", e);
                None
            }
        }
    }
}

fn candidate_to_fields(candidate: &Candidate) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(fields::FIRST_NAME.to_string(), candidate.first_name.to_firestore_value());
    fields.insert(fields::LAST_NAME.to_string(), candidate.last_name.to_firestore_value());
    fields.insert(fields::EMAIL.to_string(), candidate.email.to_firestore_value());
    fields.insert(fields::UUID.to_string(), candidate.uuid.to_firestore_value());
    fields.insert(fields::CAREER_LEVEL.to_string(), candidate.career_level.to_firestore_value());
    fields.insert(fields::JOB_MAJOR.to_string(), candidate.job_major.to_firestore_value());
    fields.insert(
        fields::YEARS_OF_EXPERIENCE.to_string(),
        candidate.years_of_experience.to_firestore_value(),
    );
    fields.insert(fields::DEGREE_TYPE.to_string(), candidate.degree_type.to_firestore_value());
    fields.insert(fields::SKILLS.to_string(), candidate.skills.to_firestore_value());
    fields.insert(fields::NATIONALITY.to_string(), candidate.nationality.to_firestore_value());
    fields.insert(fields::CITY.to_string(), candidate.city.to_firestore_value());
    fields.insert(fields::SALARY.to_string(), candidate.salary.to_firestore_value());
    fields.insert(fields::GENDER.to_string(), candidate.gender.as_str().to_firestore_value());
    fields.insert(SKILL_TERMS.to_string(), skill_terms(&candidate.skills).to_firestore_value());
    fields
}

fn document_to_record(doc: &Document) -> FirestoreResult<CandidateRecord> {
    let doc_id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_response("Document has no name"))?;
    let id = CandidateId::parse(doc_id).map_err(|e| FirestoreError::invalid_response(e.to_string()))?;

    let fields = doc.fields.as_ref().ok_or_else(|| {
        FirestoreError::InvalidResponse(format!("Candidate {} has no fields", doc_id))
    })?;

    let get_string = |key: &str| -> String {
        fields
            .get(key)
            .and_then(String::from_firestore_value)
            .unwrap_or_default()
    };

    let gender: Gender = get_string(fields::GENDER)
        .parse()
        .map_err(|e: hire_models::UnknownGender| {
            FirestoreError::invalid_response(format!("Candidate {}: {}", doc_id, e))
        })?;

    Ok(CandidateRecord {
        id,
        candidate: Candidate {
            first_name: get_string(fields::FIRST_NAME),
            last_name: get_string(fields::LAST_NAME),
            email: get_string(fields::EMAIL),
            uuid: get_string(fields::UUID),
            career_level: get_string(fields::CAREER_LEVEL),
            job_major: get_string(fields::JOB_MAJOR),
            years_of_experience: fields
                .get(fields::YEARS_OF_EXPERIENCE)
                .and_then(u32::from_firestore_value)
                .unwrap_or(0),
            degree_type: get_string(fields::DEGREE_TYPE),
            skills: fields
                .get(fields::SKILLS)
                .and_then(Vec::<String>::from_firestore_value)
                .unwrap_or_default(),
            nationality: get_string(fields::NATIONALITY),
            city: get_string(fields::CITY),
            salary: fields
                .get(fields::SALARY)
                .and_then(f64::from_firestore_value)
                .unwrap_or(0.0),
            gender,
        },
    })
}
