//! Firestore REST API client.
//!
//! Features:
//! - Cached OAuth tokens, or the fixed emulator token
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{info_span, Instrument};

use crate::auth::Credentials;
use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_documents_returned, record_request};
use crate::retry::{with_retry, RetryConfig};
use crate::types::{Document, ListDocumentsResponse, RunQueryRequest, RunQueryResponse, StructuredQuery, Value};

const PRODUCTION_HOST: &str = "https://firestore.googleapis.com";

/// Project used against the emulator when none is configured.
const EMULATOR_PROJECT: &str = "demo-hire";

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Emulator address; when set no OAuth token is minted
    pub emulator_host: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let emulator_host = std::env::var("FIRESTORE_EMULATOR_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty());

        let project_id = match std::env::var("GCP_PROJECT_ID").or_else(|_| std::env::var("FIREBASE_PROJECT_ID")) {
            Ok(id) if !id.is_empty() => id,
            Ok(_) => {
                return Err(FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
                ))
            }
            Err(_) if emulator_host.is_some() => EMULATOR_PROJECT.to_string(),
            Err(_) => {
                return Err(FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                ))
            }
        };

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            emulator_host,
            timeout: env_secs("FIRESTORE_TIMEOUT_SECS", 30),
            connect_timeout: env_secs("FIRESTORE_CONNECT_TIMEOUT_SECS", 5),
            retry: RetryConfig::from_env(),
        })
    }

    /// Config for an emulator (or any plain HTTP double) at `host`.
    pub fn emulator(host: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: "(default)".to_string(),
            emulator_host: Some(host.into()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    fn host(&self) -> String {
        match &self.emulator_host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("http://{}", host.trim_end_matches('/')),
            None => PRODUCTION_HOST.to_string(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    credentials: Credentials,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let credentials = if config.emulator_host.is_some() {
            Credentials::emulator()
        } else {
            Credentials::service_account_from_env()?
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("hire-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let base_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            config.host(),
            config.project_id,
            config.database_id
        );

        Ok(Self {
            http,
            config,
            base_url,
            credentials,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        let config = FirestoreConfig::from_env()?;
        Self::new(config).await
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, doc_id)
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document, `None` if it does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);
        let url = url.as_str();

        self.execute_request("get_document", collection, Some(doc_id), move || async move {
            let response = self.send(|token| self.http.get(url).bearer_auth(token)).await?;
            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(Self::handle_error_response(status, url, response).await),
            }
        })
        .await
    }

    /// Create a document with a caller-chosen id.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = format!(
            "{}/{}?documentId={}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        );
        let url = url.as_str();
        let body = Document::new(fields);
        let body = &body;

        self.execute_request("create_document", collection, Some(doc_id), move || async move {
            let response = self
                .send(|token| self.http.post(url).bearer_auth(token).json(body))
                .await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                status => Err(Self::handle_error_response(status, url, response).await),
            }
        })
        .await
    }

    /// Overwrite the masked fields of an existing document.
    ///
    /// With `update_time` the write only applies if the document has not been
    /// modified since; otherwise it only applies if the document exists.
    /// A lost race surfaces as `PreconditionFailed`, a missing document as
    /// `NotFound`.
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        mask: &[&str],
        update_time: Option<&str>,
    ) -> FirestoreResult<Document> {
        let mut params: Vec<String> = mask
            .iter()
            .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
            .collect();
        match update_time {
            Some(ts) => params.push(format!("currentDocument.updateTime={}", urlencoding::encode(ts))),
            None => params.push("currentDocument.exists=true".to_string()),
        }
        let url = format!("{}?{}", self.document_path(collection, doc_id), params.join("&"));
        let url = url.as_str();
        let body = Document::new(fields);
        let body = &body;

        self.execute_request("update_document", collection, Some(doc_id), move || async move {
            let response = self
                .send(|token| self.http.patch(url).bearer_auth(token).json(body))
                .await?;
            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                StatusCode::NOT_FOUND => Err(FirestoreError::not_found(format!("{}/{}", collection, doc_id))),
                StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => {
                    let body_text = response.text().await.unwrap_or_default();
                    Err(FirestoreError::PreconditionFailed(body_text))
                }
                status => {
                    let err = Self::handle_error_response(status, url, response).await;
                    // A missing document fails the exists precondition.
                    if update_time.is_none() && err.is_precondition_failed() {
                        Err(FirestoreError::not_found(format!("{}/{}", collection, doc_id)))
                    } else {
                        Err(err)
                    }
                }
            }
        })
        .await
    }

    /// Delete a document that must exist; a missing one is `NotFound`.
    pub async fn delete_existing_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<()> {
        let url = format!(
            "{}?currentDocument.exists=true",
            self.document_path(collection, doc_id)
        );
        let url = url.as_str();

        self.execute_request("delete_document", collection, Some(doc_id), move || async move {
            let response = self.send(|token| self.http.delete(url).bearer_auth(token)).await?;
            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                StatusCode::NOT_FOUND => Err(FirestoreError::not_found(format!("{}/{}", collection, doc_id))),
                status => {
                    let err = Self::handle_error_response(status, url, response).await;
                    if err.is_precondition_failed() {
                        Err(FirestoreError::not_found(format!("{}/{}", collection, doc_id)))
                    } else {
                        Err(err)
                    }
                }
            }
        })
        .await
    }

    /// List one page of a collection, ordered by document id.
    pub async fn list_documents(
        &self,
        collection: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> FirestoreResult<ListDocumentsResponse> {
        let mut url = format!("{}/{}", self.base_url, collection);
        let mut params = Vec::new();
        if let Some(size) = page_size {
            params.push(format!("pageSize={}", size));
        }
        if let Some(token) = page_token {
            params.push(format!("pageToken={}", urlencoding::encode(token)));
        }
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }
        let url = url.as_str();

        self.execute_request("list_documents", collection, None, move || async move {
            let response = self.send(|token| self.http.get(url).bearer_auth(token)).await?;
            match response.status() {
                StatusCode::OK => {
                    let list: ListDocumentsResponse = response.json().await?;
                    record_documents_returned(collection, list.documents.as_ref().map_or(0, Vec::len));
                    Ok(list)
                }
                status => Err(Self::handle_error_response(status, url, response).await),
            }
        })
        .await
    }

    /// Run a structured query against top-level collections.
    pub async fn run_query(&self, query: StructuredQuery) -> FirestoreResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.base_url);
        let url = url.as_str();
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let collection = collection.as_str();
        let request = RunQueryRequest {
            structured_query: query,
        };
        let request = &request;

        self.execute_request("run_query", collection, None, move || async move {
            let response = self
                .send(|token| self.http.post(url).bearer_auth(token).json(request))
                .await?;
            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await.unwrap_or_default();
                    // runQuery returns a JSON array; entries without a document
                    // only carry progress information.
                    let responses: Vec<RunQueryResponse> =
                        serde_json::from_str(&body).map_err(|e| {
                            FirestoreError::invalid_response(format!(
                                "Failed to parse runQuery response: {} (body prefix: {})",
                                e,
                                body.chars().take(200).collect::<String>()
                            ))
                        })?;

                    let docs: Vec<Document> = responses.into_iter().filter_map(|r| r.document).collect();
                    record_documents_returned(collection, docs.len());
                    Ok(docs)
                }
                status => Err(Self::handle_error_response(status, url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send a request, minting a new token once if the current one expired.
    async fn send<B>(&self, build: B) -> FirestoreResult<Response>
    where
        B: Fn(&str) -> RequestBuilder,
    {
        let token = self.credentials.token().await?;
        let response = build(token.as_str()).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(FirestoreError::from_http_status(401, body));
        }

        self.credentials.invalidate().await;
        let token = self.credentials.token().await?;
        Ok(build(token.as_str()).send().await?)
    }

    /// Execute a request with retries, tracing and metrics.
    async fn execute_request<T, F, Fut>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        op: F,
    ) -> FirestoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = FirestoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("firestore_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = with_retry(&self.config.retry, operation, op)
            .instrument(span)
            .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}
