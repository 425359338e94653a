//! API integration tests against the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hire_api::{create_router, AccessPolicy, ApiConfig, AppState, Capability, Principal};

fn test_config() -> ApiConfig {
    ApiConfig {
        store_backend: hire_api::StoreBackend::Memory,
        ..ApiConfig::default()
    }
}

fn test_app() -> Router {
    create_router(AppState::in_memory(test_config()), None)
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

async fn send_raw(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse { status, headers, body }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", token);
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_raw(app, request).await
}

async fn register(app: &Router) -> String {
    let response = send(
        app,
        Method::POST,
        "/user",
        None,
        Some(json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com"
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    response.json()["user"]["token"].as_str().unwrap().to_string()
}

fn candidate_json(first_name: &str, skills: &[&str]) -> Value {
    json!({
        "first_name": first_name,
        "last_name": "Doe",
        "email": format!("{}@example.com", first_name.to_lowercase()),
        "UUID": format!("ext-{}", first_name),
        "career_level": "Senior",
        "job_major": "Computer Science",
        "years_of_experience": 7,
        "degree_type": "Bachelor",
        "skills": skills,
        "nationality": "Canadian",
        "city": "Toronto",
        "salary": 50000,
        "gender": "Female"
    })
}

async fn create(app: &Router, token: &str, first_name: &str, skills: &[&str]) -> String {
    let response = send(
        app,
        Method::POST,
        "/candidate",
        Some(token),
        Some(candidate_json(first_name, skills)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    response.json()["candidate_id"].as_str().unwrap().to_string()
}

fn first_names(response: &TestResponse) -> HashSet<String> {
    response.json()["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["first_name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_root_and_health() {
    let app = test_app();

    let response = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Hello World! API is running");

    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "healthy");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert!(response.headers.contains_key("x-request-id"));

    let response = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ready");
}

#[tokio::test]
async fn test_register_returns_user_with_token() {
    let app = test_app();
    let response = send(
        &app,
        Method::POST,
        "/user",
        None,
        Some(json!({"first_name": "Alan", "last_name": "Turing", "email": "alan@example.com"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["user"]["email"], "alan@example.com");
    assert!(!body["user"]["token"].as_str().unwrap().is_empty());
    assert!(!body["user_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let app = test_app();
    let response = send(
        &app,
        Method::POST,
        "/user",
        None,
        Some(json!({"first_name": "Alan", "last_name": "Turing", "email": "not-an-email"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_unauthorized() {
    let app = test_app();

    let response = send(&app, Method::GET, "/all-candidates", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.json()["detail"].is_string());

    let response = send(&app, Method::GET, "/all-candidates", Some("bogus"), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        Method::POST,
        "/candidate",
        Some("bogus"),
        Some(candidate_json("Eve", &["Rust"])),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

struct ReadOnly;

impl AccessPolicy for ReadOnly {
    fn allows(&self, _principal: &Principal, capability: Capability) -> bool {
        capability == Capability::ReadCandidates
    }
}

#[tokio::test]
async fn test_policy_denial_is_forbidden() {
    let state = AppState::in_memory(test_config()).with_policy(Arc::new(ReadOnly));
    let app = create_router(state, None);
    let token = register(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/candidate",
        Some(&token),
        Some(candidate_json("Eve", &["Rust"])),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = send(&app, Method::GET, "/generate-report", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = send(&app, Method::GET, "/all-candidates", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = test_app();
    let token = register(&app).await;

    let mut bad_gender = candidate_json("Eve", &["Rust"]);
    bad_gender["gender"] = json!("Other");
    let response = send(&app, Method::POST, "/candidate", Some(&token), Some(bad_gender)).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut negative_salary = candidate_json("Eve", &["Rust"]);
    negative_salary["salary"] = json!(-1);
    let response = send(&app, Method::POST, "/candidate", Some(&token), Some(negative_salary)).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut bad_email = candidate_json("Eve", &["Rust"]);
    bad_email["email"] = json!("eve-at-example");
    let response = send(&app, Method::POST, "/candidate", Some(&token), Some(bad_email)).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut missing_field = candidate_json("Eve", &["Rust"]);
    missing_field.as_object_mut().unwrap().remove("city");
    let response = send(&app, Method::POST, "/candidate", Some(&token), Some(missing_field)).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/candidate")
        .header("authorization", token.as_str())
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send_raw(&app, request).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.json()["detail"].is_string());

    let response = send(&app, Method::GET, "/all-candidates", Some(&token), None).await;
    assert!(response.json()["candidates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_search_use_or_semantics() {
    let app = test_app();
    let token = register(&app).await;
    create(&app, &token, "Ana", &["Rust", "Go"]).await;
    create(&app, &token, "Ben", &["Python"]).await;
    create(&app, &token, "Cid", &["Java"]).await;

    let response = send(&app, Method::GET, "/all-candidates", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(first_names(&response).len(), 3);
    for candidate in response.json()["candidates"].as_array().unwrap() {
        assert!(candidate.get("_id").is_none());
        assert!(candidate.get("UUID").is_some());
    }

    let response = send(
        &app,
        Method::GET,
        "/all-candidates?query=rust%20PYTHON&field=skills",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let names = first_names(&response);
    assert_eq!(names, HashSet::from(["Ana".to_string(), "Ben".to_string()]));

    let response = send(&app, Method::GET, "/all-candidates?query=", Some(&token), None).await;
    assert_eq!(first_names(&response).len(), 3);

    let response = send(&app, Method::GET, "/all-candidates?query=haskell", Some(&token), None).await;
    assert!(first_names(&response).is_empty());
}

#[tokio::test]
async fn test_get_candidate() {
    let app = test_app();
    let token = register(&app).await;
    let id = create(&app, &token, "Ana", &["Rust"]).await;

    let response = send(&app, Method::GET, &format!("/candidate/{}", id), Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["_id"], id.as_str());
    assert_eq!(body["first_name"], "Ana");
    assert_eq!(body["skills"], json!(["Rust"]));

    let response = send(&app, Method::GET, "/candidate/not-an-id", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing = "0123456789abcdef0123456789abcdef";
    let response = send(&app, Method::GET, &format!("/candidate/{}", missing), Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["detail"], "Candidate not found");
}

#[tokio::test]
async fn test_update_candidate() {
    let app = test_app();
    let token = register(&app).await;
    let id = create(&app, &token, "Ana", &["Rust"]).await;
    let uri = format!("/candidate/{}", id);

    let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({"city": "Toronto"}))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["detail"], "Candidate not found or no fields modified");

    let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({"gender": "Other"}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({"salary": -5}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({"favorite_color": "red"}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({"city": "Berlin", "skills": ["Haskell"]})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());

    let response = send(&app, Method::GET, &uri, Some(&token), None).await;
    let body = response.json();
    assert_eq!(body["city"], "Berlin");
    assert_eq!(body["first_name"], "Ana");

    let response = send(&app, Method::GET, "/all-candidates?query=haskell", Some(&token), None).await;
    assert_eq!(first_names(&response), HashSet::from(["Ana".to_string()]));

    let missing = "/candidate/0123456789abcdef0123456789abcdef";
    let response = send(&app, Method::PUT, missing, Some(&token), Some(json!({"city": "Oslo"}))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_candidate() {
    let app = test_app();
    let token = register(&app).await;
    let id = create(&app, &token, "Ana", &["Rust"]).await;
    let uri = format!("/candidate/{}", id);

    let response = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Candidate deleted successfully");

    let response = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_requires_token() {
    let app = test_app();
    let response = send(&app, Method::GET, "/generate-report", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_report_streams_every_page() {
    let config = ApiConfig {
        report_page_size: 2,
        ..test_config()
    };
    let app = create_router(AppState::in_memory(config), None);
    let token = register(&app).await;
    for name in ["Ana", "Ben", "Cid", "Dee", "Eli"] {
        create(&app, &token, name, &["Rust", "Go"]).await;
    }

    let response = send(&app, Method::GET, "/generate-report", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers[CONTENT_DISPOSITION],
        "attachment; filename=\"candidates_report.csv\""
    );

    let text = response.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "first_name,last_name,email,UUID,career_level,job_major,years_of_experience,degree_type,skills,nationality,city,salary,gender"
    );
    assert!(lines[1..].contains(
        &"Ana,Doe,ana@example.com,,Senior,Computer Science,7,Bachelor,\"Rust, Go\",Canadian,Toronto,50000.0,Female"
    ));
    let names: HashSet<&str> = lines[1..].iter().filter_map(|l| l.split(',').next()).collect();
    assert_eq!(names.len(), 5);
}

#[tokio::test]
async fn test_report_with_no_candidates_is_header_only() {
    let app = test_app();
    let token = register(&app).await;

    let response = send(&app, Method::GET, "/generate-report", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text().lines().count(), 1);
}

#[tokio::test]
async fn test_concurrent_reports_are_independent() {
    let app = test_app();
    let token = register(&app).await;
    create(&app, &token, "Ana", &["Rust"]).await;
    create(&app, &token, "Ben", &["Go"]).await;

    let (a, b) = tokio::join!(
        send(&app, Method::GET, "/generate-report", Some(&token), None),
        send(&app, Method::GET, "/generate-report", Some(&token), None),
    );
    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(b.status, StatusCode::OK);
    assert_eq!(a.text(), b.text());
    assert_eq!(a.text().lines().count(), 3);
}

#[tokio::test]
async fn test_rate_limit_per_client_ip() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        ..test_config()
    };
    let app = create_router(AppState::in_memory(config), None);

    let request = || {
        Request::builder()
            .uri("/all-candidates")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap()
    };

    let first = send_raw(&app, request()).await;
    assert_eq!(first.status, StatusCode::UNAUTHORIZED);

    let second = send_raw(&app, request()).await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers["retry-after"], "1");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = ApiConfig {
        max_body_size: 64,
        ..test_config()
    };
    let app = create_router(AppState::in_memory(config), None);
    let token = register_small(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/candidate",
        Some(&token),
        Some(candidate_json("Ana", &["Rust"])),
    )
    .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
}

/// Registers with a body that fits under a 64 byte limit.
async fn register_small(app: &Router) -> String {
    let response = send(
        app,
        Method::POST,
        "/user",
        None,
        Some(json!({"first_name": "A", "last_name": "B", "email": "a@b.io"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    response.json()["user"]["token"].as_str().unwrap().to_string()
}
