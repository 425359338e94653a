//! Candidate CRUD and search handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hire_models::{query_terms, Candidate, CandidateId, CandidatePatch, CandidateRecord, UpdateOutcome};

use crate::auth::{AuthUser, Capability};
use crate::error::{ApiError, ApiResult, ValidJson};
use crate::handlers::health::MessageResponse;
use crate::state::AppState;
use crate::store::StoreError;

const NOT_FOUND: &str = "Candidate not found";

fn parse_id(raw: &str) -> ApiResult<CandidateId> {
    CandidateId::parse(raw).map_err(|e| ApiError::validation(e.to_string()))
}

fn candidate_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound(_) => ApiError::not_found(NOT_FOUND),
        other => other.into(),
    }
}

#[derive(Serialize)]
pub struct CreateCandidateResponse {
    pub message: String,
    pub candidate_id: String,
}

/// Create a candidate.
pub async fn create_candidate(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(candidate): ValidJson<Candidate>,
) -> ApiResult<Json<CreateCandidateResponse>> {
    user.require(state.policy.as_ref(), Capability::CreateCandidate)?;

    let id = state.candidates.create_candidate(&candidate).await?;
    info!(candidate_id = %id, user_id = %user.0.user_id.as_str(), "Candidate created");

    Ok(Json(CreateCandidateResponse {
        message: "Candidate created successfully".to_string(),
        candidate_id: id.to_string(),
    }))
}

/// List/search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListCandidatesParams {
    pub query: Option<String>,
    /// Accepted for client compatibility; does not narrow the search.
    pub field: Option<String>,
}

#[derive(Serialize)]
pub struct CandidateListResponse {
    pub candidates: Vec<Candidate>,
}

/// List candidates, optionally filtered by skill terms.
pub async fn list_candidates(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListCandidatesParams>,
) -> ApiResult<Json<CandidateListResponse>> {
    user.require(state.policy.as_ref(), Capability::ReadCandidates)?;

    let terms = params.query.as_deref().map(query_terms).unwrap_or_default();
    if params.field.is_some() {
        debug!(field = ?params.field, "Ignoring field selector");
    }

    let records = state.candidates.search(&terms).await?;
    debug!(terms = terms.len(), results = records.len(), "Candidates listed");

    Ok(Json(CandidateListResponse {
        candidates: records.into_iter().map(|r| r.candidate).collect(),
    }))
}

/// Get one candidate by internal id.
pub async fn get_candidate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<CandidateRecord>> {
    user.require(state.policy.as_ref(), Capability::ReadCandidates)?;
    let id = parse_id(&id)?;

    state
        .candidates
        .get_candidate(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// Apply a partial update. Responds with an empty body.
pub async fn update_candidate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<CandidatePatch>,
) -> ApiResult<StatusCode> {
    user.require(state.policy.as_ref(), Capability::UpdateCandidate)?;
    let id = parse_id(&id)?;

    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    match state
        .candidates
        .update_candidate(&id, &patch)
        .await
        .map_err(candidate_error)?
    {
        UpdateOutcome::Updated(fields) => {
            info!(candidate_id = %id, fields = ?fields, "Candidate updated");
            Ok(StatusCode::OK)
        }
        UpdateOutcome::Unchanged => Err(ApiError::not_found(
            "Candidate not found or no fields modified",
        )),
    }
}

/// Delete a candidate.
pub async fn delete_candidate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    user.require(state.policy.as_ref(), Capability::DeleteCandidate)?;
    let id = parse_id(&id)?;

    state
        .candidates
        .delete_candidate(&id)
        .await
        .map_err(candidate_error)?;
    info!(candidate_id = %id, "Candidate deleted");

    Ok(Json(MessageResponse::new("Candidate deleted successfully")))
}
