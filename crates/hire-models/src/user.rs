//! User (API consumer) models.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Opaque access token issued at registration.
///
/// Compared verbatim against the `authorization` header. `Debug` output is
/// redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Issue a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a token presented by a caller or read back from storage.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Registration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    #[validate(email)]
    pub email: String,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub token: AccessToken,
}

impl User {
    /// Build a user from a registration request, issuing a new token.
    pub fn register(new_user: NewUser) -> Self {
        Self {
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            token: AccessToken::generate(),
        }
    }
}
