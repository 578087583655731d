//! API Integration Tests for Patient Records
//!
//! Runs the real server on a random port against the in-memory backend.

use patient_records::server::{AppState, create_router};
use patient_records::{PatientStore, StorageBuilder};
use serde_json::{Value, json};
use tokio::net::TcpListener;

// =============================================================================
// Test Helpers
// =============================================================================

/// Start test server and return base URL plus a handle to its store.
async fn start_test_server() -> (String, PatientStore) {
    let store = StorageBuilder::memory()
        .build()
        .expect("Failed to build storage");
    let router = create_router(AppState::new(store.clone()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (format!("http://{}", addr), store)
}

// =============================================================================
// Health Probe Tests
// =============================================================================

#[tokio::test]
async fn test_health_probes() {
    let (base_url, store) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/healthz", base_url))
        .send()
        .await
        .expect("Failed to send healthz request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse healthz response");
    assert_eq!(body["status"], "ok");

    let resp = client
        .get(format!("{}/readyz", base_url))
        .send()
        .await
        .expect("Failed to send readyz request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse readyz response");
    assert_eq!(body["db"], "ready");
    assert_eq!(body["backend"], "memory");

    store.close().await;
}

// =============================================================================
// Patient Page Tests
// =============================================================================

#[tokio::test]
async fn test_add_list_and_delete() {
    let (base_url, store) = start_test_server().await;
    let client = reqwest::Client::new();

    // Form submission redirects back to the listing
    let resp = client
        .post(format!("{}/add", base_url))
        .form(&[
            ("first_name", "Ann"),
            ("last_name", "Lee"),
            ("contact_number", "555-0100"),
            ("medical_history", "Asthma"),
            ("treatment_notes", "Inhaler"),
        ])
        .send()
        .await
        .expect("Failed to add patient");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.url().path(), "/");
    let page = resp.text().await.unwrap();
    assert!(page.contains("Lee"));

    // JSON bodies are accepted too
    let resp = client
        .post(format!("{}/add", base_url))
        .json(&json!({"first_name": "Bob", "last_name": "Ames"}))
        .send()
        .await
        .expect("Failed to add patient via JSON");
    assert_eq!(resp.status(), 200);

    let rows = store.list_all().await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.last_name.as_str()).collect();
    assert_eq!(names, vec!["Ames", "Lee"]);

    let page = client
        .get(format!("{}/", base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let ames = page.find("Ames").expect("Ames listed");
    let lee = page.find("Lee").expect("Lee listed");
    assert!(ames < lee, "listing is ordered by last name");

    // Delete by the assigned id
    let lee_id = rows.iter().find(|r| r.last_name == "Lee").unwrap().id;
    let resp = client
        .post(format!("{}/delete/{}", base_url, lee_id))
        .send()
        .await
        .expect("Failed to delete patient");
    assert_eq!(resp.status(), 200);

    let remaining = store.list_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.iter().all(|r| r.id != lee_id));

    // Deleting again is a no-op
    let resp = client
        .post(format!("{}/delete/{}", base_url, lee_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_pages() {
    let (base_url, _store) = start_test_server().await;
    let client = reqwest::Client::new();

    for (first, last) in [("Will", "Smith"), ("Jane", "Doe")] {
        client
            .post(format!("{}/add", base_url))
            .form(&[("first_name", first), ("last_name", last)])
            .send()
            .await
            .unwrap();
    }

    let resp = client
        .get(format!("{}/search", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("search_term"));

    let page = client
        .post(format!("{}/search", base_url))
        .form(&[("search_term", "SMITH"), ("visit_date", "")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Smith"));
    assert!(!page.contains("Doe"));

    // Everyone was visited today; a day far in the past matches nobody
    let page = client
        .post(format!("{}/search", base_url))
        .form(&[("search_term", ""), ("visit_date", "2000-01-01")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("No patients found"));
}

#[tokio::test]
async fn test_records_page() {
    let (base_url, store) = start_test_server().await;
    store
        .insert(patient_records::NewPatient::new("Ann", "Lee"))
        .await
        .unwrap();

    let resp = reqwest::get(format!("{}/records", base_url)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let page = resp.text().await.unwrap();
    assert!(page.contains("Lee, Ann"));
}
