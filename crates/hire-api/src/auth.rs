//! Token authentication and capability checks.
//!
//! Clients send the token issued at registration verbatim in the
//! `authorization` header. A token resolves to a [`Principal`]; each
//! operation then asks the configured [`AccessPolicy`] for a [`Capability`].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use hire_models::UserId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CreateCandidate,
    ReadCandidates,
    UpdateCandidate,
    DeleteCandidate,
    ExportReport,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CreateCandidate => "create_candidate",
            Capability::ReadCandidates => "read_candidates",
            Capability::UpdateCandidate => "update_candidate",
            Capability::DeleteCandidate => "delete_candidate",
            Capability::ExportReport => "export_report",
        }
    }
}

/// A registered user making the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
}

/// Decides which capabilities a principal holds.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, principal: &Principal, capability: Capability) -> bool;
}

/// Every registered user may do everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPolicy;

impl AccessPolicy for FlatPolicy {
    fn allows(&self, _principal: &Principal, _capability: Capability) -> bool {
        true
    }
}

/// Axum extractor for an authenticated user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    /// Fail with `Forbidden` unless the policy grants `capability`.
    pub fn require(&self, policy: &dyn AccessPolicy, capability: Capability) -> ApiResult<()> {
        if policy.allows(&self.0, capability) {
            Ok(())
        } else {
            debug!(user_id = %self.0.user_id.as_str(), capability = capability.as_str(), "Capability denied");
            Err(ApiError::forbidden(format!(
                "Not allowed to {}",
                capability.as_str().replace('_', " ")
            )))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization token"))?;

        let (user_id, user) = state
            .users
            .find_by_token(token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization token"))?;

        Ok(AuthUser(Principal {
            user_id,
            email: user.email,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    impl AccessPolicy for ReadOnly {
        fn allows(&self, _principal: &Principal, capability: Capability) -> bool {
            capability == Capability::ReadCandidates
        }
    }

    fn user() -> AuthUser {
        AuthUser(Principal {
            user_id: UserId::new(),
            email: "a@example.com".to_string(),
        })
    }

    #[test]
    fn test_flat_policy_allows_everything() {
        let user = user();
        for capability in [
            Capability::CreateCandidate,
            Capability::ReadCandidates,
            Capability::UpdateCandidate,
            Capability::DeleteCandidate,
            Capability::ExportReport,
        ] {
            assert!(user.require(&FlatPolicy, capability).is_ok());
        }
    }

    #[test]
    fn test_denied_capability_is_forbidden() {
        let user = user();
        assert!(user.require(&ReadOnly, Capability::ReadCandidates).is_ok());
        let err = user.require(&ReadOnly, Capability::ExportReport).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
