//! Repository for registered users.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use hire_models::{AccessToken, User, UserId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FieldOperator, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

const TOKEN: &str = "token";

#[derive(Clone)]
pub struct UserRepository {
    client: FirestoreClient,
    collection: String,
}

impl UserRepository {
    pub fn new(client: FirestoreClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    /// Persist a registered user and return its storage id.
    pub async fn create(&self, user: &User) -> FirestoreResult<UserId> {
        let id = UserId::new();
        self.client
            .create_document(&self.collection, id.as_str(), user_to_fields(user))
            .await?;
        info!("Registered user {}", id.as_str());
        Ok(id)
    }

    /// Look up the user holding `token`.
    pub async fn find_by_token(&self, token: &str) -> FirestoreResult<Option<(UserId, User)>> {
        let query = StructuredQuery::collection(&self.collection)
            .filter(TOKEN, FieldOperator::Equal, token.to_firestore_value())
            .limit(1);

        match self.client.run_query(query).await?.first() {
            Some(doc) => Ok(Some(document_to_user(doc)?)),
            None => Ok(None),
        }
    }
}

fn user_to_fields(user: &User) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("first_name".to_string(), user.first_name.to_firestore_value());
    fields.insert("last_name".to_string(), user.last_name.to_firestore_value());
    fields.insert("email".to_string(), user.email.to_firestore_value());
    fields.insert(TOKEN.to_string(), user.token.as_str().to_firestore_value());
    fields.insert("created_at".to_string(), Utc::now().to_firestore_value());
    fields
}

fn document_to_user(doc: &Document) -> FirestoreResult<(UserId, User)> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_response("User document has no name"))?;
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse(format!("User {} has no fields", id)))?;

    let get_string = |key: &str| -> String {
        fields
            .get(key)
            .and_then(String::from_firestore_value)
            .unwrap_or_default()
    };

    Ok((
        UserId::from_string(id),
        User {
            first_name: get_string("first_name"),
            last_name: get_string("last_name"),
            email: get_string("email"),
            token: AccessToken::from_string(get_string(TOKEN)),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hire_models::NewUser;

    #[test]
    fn test_user_document_round_trip() {
        let user = User::register(NewUser {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
        });
        let mut doc = Document::new(user_to_fields(&user));
        doc.name = Some("projects/p/databases/(default)/documents/users/abc123".to_string());

        let (id, decoded) = document_to_user(&doc).unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(decoded.email, user.email);
        assert_eq!(decoded.token.as_str(), user.token.as_str());
        assert!(doc.has_field("created_at"));
    }
}
