//! Access tokens for the Firestore REST API.
//!
//! Production requests carry an OAuth token minted from the service account
//! in `GOOGLE_APPLICATION_CREDENTIALS`. Tokens are cached and refreshed a
//! minute before they expire; concurrent callers share one refresh. Against
//! the emulator a fixed `owner` token is sent instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

/// OAuth scope for Firestore access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Token accepted by the Firestore emulator as an admin credential.
pub const EMULATOR_TOKEN: &str = "owner";

/// Refresh this long before the reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the provider reports an expiry we cannot convert.
const FALLBACK_TTL: Duration = Duration::from_secs(50 * 60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }

    fn unexpired(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Where request credentials come from.
#[derive(Clone)]
pub struct Credentials {
    source: Source,
}

#[derive(Clone)]
enum Source {
    ServiceAccount {
        provider: Arc<dyn TokenProvider>,
        cache: Arc<RwLock<Option<CachedToken>>>,
    },
    Emulator,
}

impl Credentials {
    /// Credentials for the local emulator or a test double.
    pub fn emulator() -> Self {
        Self {
            source: Source::Emulator,
        }
    }

    /// Load the service account named by `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn service_account_from_env() -> FirestoreResult<Self> {
        let account = CustomServiceAccount::from_env()
            .map_err(|e| FirestoreError::auth_error(format!("Failed to load service account: {}", e)))?
            .ok_or_else(|| {
                FirestoreError::auth_error(
                    "GOOGLE_APPLICATION_CREDENTIALS not set. \
                     Set it to the path of your service account JSON file.",
                )
            })?;

        Ok(Self {
            source: Source::ServiceAccount {
                provider: Arc::new(account),
                cache: Arc::new(RwLock::new(None)),
            },
        })
    }

    /// Current bearer token.
    pub async fn token(&self) -> FirestoreResult<String> {
        let (provider, cache) = match &self.source {
            Source::Emulator => return Ok(EMULATOR_TOKEN.to_string()),
            Source::ServiceAccount { provider, cache } => (provider, cache),
        };

        if let Some(cached) = cache.read().await.as_ref().filter(|c| c.fresh()) {
            return Ok(cached.value.clone());
        }

        let mut slot = cache.write().await;
        // Another task may have refreshed while this one waited for the lock.
        if let Some(cached) = slot.as_ref().filter(|c| c.fresh()) {
            return Ok(cached.value.clone());
        }

        match provider.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let remaining = token.expires_at() - Utc::now();
                let ttl = if remaining > chrono::Duration::zero() {
                    remaining.to_std().unwrap_or(FALLBACK_TTL)
                } else {
                    Duration::ZERO
                };
                let value = token.as_str().to_string();
                *slot = Some(CachedToken {
                    value: value.clone(),
                    expires_at: Instant::now() + ttl,
                });
                debug!(ttl_secs = ttl.as_secs(), "Refreshed Firestore access token");
                Ok(value)
            }
            Err(e) => match slot.as_ref().filter(|c| c.unexpired()) {
                Some(cached) => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(cached.value.clone())
                }
                None => Err(FirestoreError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                ))),
            },
        }
    }

    /// Drop the cached token so the next call mints a new one.
    pub async fn invalidate(&self) {
        if let Source::ServiceAccount { cache, .. } = &self.source {
            *cache.write().await = None;
        }
    }
}
