//! Firestore emulator integration tests.
//!
//! Run with `FIRESTORE_EMULATOR_HOST` set, e.g. `localhost:8080`.

use hire_firestore::{CandidateRepository, FirestoreClient, UserRepository};
use hire_models::{Candidate, CandidatePatch, Gender, NewUser, UpdateOutcome, User};

async fn emulator_client() -> FirestoreClient {
    dotenvy::dotenv().ok();
    FirestoreClient::from_env()
        .await
        .expect("Failed to create Firestore client")
}

fn candidate(skills: &[&str]) -> Candidate {
    Candidate {
        first_name: "Integration".to_string(),
        last_name: "Test".to_string(),
        email: "integration@example.com".to_string(),
        uuid: "ext-integration".to_string(),
        career_level: "Junior".to_string(),
        job_major: "Physics".to_string(),
        years_of_experience: 1,
        degree_type: "Bachelor".to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        nationality: "Irish".to_string(),
        city: "Dublin".to_string(),
        salary: 42000.0,
        gender: Gender::Male,
    }
}

#[tokio::test]
#[ignore = "requires Firestore emulator"]
async fn test_health_document_lookup() {
    let client = emulator_client().await;
    let doc = client
        .get_document("_health", "_check")
        .await
        .expect("Health check read failed");
    assert!(doc.is_none());
}

#[tokio::test]
#[ignore = "requires Firestore emulator"]
async fn test_user_token_lookup() {
    let client = emulator_client().await;
    let repo = UserRepository::new(client, "it_users");

    let user = User::register(NewUser {
        first_name: "Katherine".to_string(),
        last_name: "Johnson".to_string(),
        email: "katherine@example.com".to_string(),
    });
    let user_id = repo.create(&user).await.expect("Failed to create user");

    let (found_id, found) = repo
        .find_by_token(user.token.as_str())
        .await
        .expect("Lookup failed")
        .expect("User not found by token");
    assert_eq!(found_id, user_id);
    assert_eq!(found.email, user.email);

    assert!(repo.find_by_token("no-such-token").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Firestore emulator"]
async fn test_candidate_repository_lifecycle() {
    let client = emulator_client().await;
    let repo = CandidateRepository::new(client, "it_candidates");

    let id = repo.create(&candidate(&["Fortran", "MATLAB"])).await.expect("Failed to create candidate");

    let record = repo.get(&id).await.unwrap().expect("Candidate missing");
    assert_eq!(record.candidate.skills, vec!["Fortran", "MATLAB"]);

    let hits = repo.search(&["fortran".to_string()]).await.unwrap();
    assert!(hits.iter().any(|r| r.id == id));

    let patch = CandidatePatch {
        city: Some("Cork".to_string()),
        ..Default::default()
    };
    assert!(matches!(repo.update(&id, &patch).await.unwrap(), UpdateOutcome::Updated(_)));
    assert_eq!(repo.update(&id, &patch).await.unwrap(), UpdateOutcome::Unchanged);

    repo.delete(&id).await.expect("Failed to delete candidate");
    assert!(repo.get(&id).await.unwrap().is_none());
    assert!(repo.delete(&id).await.is_err());
}
