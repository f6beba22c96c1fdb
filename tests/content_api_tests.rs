use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use nexus_board::api::{self, AppState};
use nexus_board::auth::AuthService;
use nexus_board::metrics::MetricsCollector;
use nexus_board::models::Account;
use nexus_board::store::Store;

fn test_auth_service() -> Arc<AuthService> {
    // Content endpoints are public; no admin credential needed here
    Arc::new(AuthService::new("test_secret".to_string(), String::new()))
}

/// Seed an account directly in the store so content tests don't depend on
/// the admin endpoints.
fn seed_account(store: &Store, name: &str, user_id: &str) {
    let mut account = Account {
        id: String::new(),
        account_name: name.to_string(),
        user_id: user_id.to_string(),
        created_at: Utc::now(),
    };
    store.create_account(&mut account).unwrap();
}

// ==================== Create Content Tests ====================

#[actix_web::test]
async fn test_create_content_defaults() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();
    seed_account(&store, "Asha", "asha01");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/user-content")
        .set_json(json!({
            "userId": "asha01",
            "contentType": "repo",
            "title": "My Lib"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["content"]["user_id"], "asha01");
    assert_eq!(body["content"]["content_type"], "repo");
    assert_eq!(body["content"]["title"], "My Lib");
    assert!(body["content"]["description"].is_null());
    assert!(body["content"]["url"].is_null());
    assert_eq!(body["content"]["tags"], json!([]));
    assert!(body["content"]["id"].is_string());
}

#[actix_web::test]
async fn test_create_content_with_tags_and_links() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();
    seed_account(&store, "Asha", "asha01");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/user-content")
        .set_json(json!({
            "userId": "asha01",
            "contentType": "blog",
            "title": "Writing Rust",
            "description": "A post about the club's tooling",
            "url": "https://blog.example.com/writing-rust",
            "tags": ["rust", "tooling"]
        }))
        .to_request();

    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["content"]["tags"], json!(["rust", "tooling"]));
    assert_eq!(body["content"]["url"], "https://blog.example.com/writing-rust");
}

#[actix_web::test]
async fn test_create_content_missing_fields_rejected() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();
    seed_account(&store, "Asha", "asha01");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    for body in [
        json!({ "contentType": "repo", "title": "My Lib" }),
        json!({ "userId": "asha01", "title": "My Lib" }),
        json!({ "userId": "asha01", "contentType": "repo" }),
        json!({ "userId": "asha01", "contentType": "repo", "title": "" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/user-content")
            .set_json(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }
}

#[actix_web::test]
async fn test_create_content_rejects_unknown_kind() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();
    seed_account(&store, "Asha", "asha01");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    // "note" is not one of thought/repo/blog, even with everything else valid
    let req = test::TestRequest::post()
        .uri("/api/user-content")
        .set_json(json!({
            "userId": "asha01",
            "contentType": "note",
            "title": "Valid title"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "contentType must be thought, repo, or blog");
}

#[actix_web::test]
async fn test_create_content_for_unknown_user_rejected() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/user-content")
        .set_json(json!({
            "userId": "ghost",
            "contentType": "thought",
            "title": "No owner"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User not found");
}

// ==================== Update Content Tests ====================

#[actix_web::test]
async fn test_update_content_roundtrip() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();
    seed_account(&store, "Asha", "asha01");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/user-content")
        .set_json(json!({
            "userId": "asha01",
            "contentType": "blog",
            "title": "Old",
            "description": "kept as-is",
            "tags": ["a", "b"]
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = body["content"]["id"].as_str().unwrap().to_string();
    let updated_at_before = body["content"]["updated_at"].as_str().unwrap().to_string();

    std::thread::sleep(std::time::Duration::from_millis(5));

    // Only the title is provided; everything else must survive untouched
    let req = test::TestRequest::put()
        .uri("/api/user-content")
        .set_json(json!({ "id": id, "title": "New" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/user-content?contentId={}", id))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let item = &body["content"].as_array().unwrap()[0];
    assert_eq!(item["title"], "New");
    assert_eq!(item["description"], "kept as-is");
    assert_eq!(item["tags"], json!(["a", "b"]));

    let before = chrono::DateTime::parse_from_rfc3339(&updated_at_before).unwrap();
    let after = chrono::DateTime::parse_from_rfc3339(item["updated_at"].as_str().unwrap()).unwrap();
    assert!(after > before);
}

#[actix_web::test]
async fn test_update_content_missing_id_rejected() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/user-content")
        .set_json(json!({ "title": "New" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_update_unknown_content_rejected() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/user-content")
        .set_json(json!({ "id": "never-existed", "title": "New" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

// ==================== List Content Tests ====================

#[actix_web::test]
async fn test_list_content_filters_are_anded() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();
    seed_account(&store, "Asha", "asha01");
    seed_account(&store, "Ben", "ben02");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    for (user_id, kind, title) in [
        ("asha01", "blog", "A blog"),
        ("asha01", "thought", "A thought"),
        ("ben02", "blog", "B blog"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/user-content")
            .set_json(json!({ "userId": user_id, "contentType": kind, "title": title }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
    }

    // Combined filter is a subset of the single-user filter
    let req = test::TestRequest::get()
        .uri("/api/user-content?userId=asha01")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let asha_all = body["content"].as_array().unwrap().clone();
    assert_eq!(asha_all.len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/user-content?userId=asha01&contentType=blog")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let asha_blogs = body["content"].as_array().unwrap();
    assert_eq!(asha_blogs.len(), 1);
    assert_eq!(asha_blogs[0]["title"], "A blog");
    assert!(asha_all.iter().any(|c| c["id"] == asha_blogs[0]["id"]));
}

#[actix_web::test]
async fn test_list_content_for_unknown_user_is_empty() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/user-content?userId=ghost")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["content"].as_array().unwrap().is_empty());
}

// ==================== Delete Content Tests ====================

#[actix_web::test]
async fn test_delete_content() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();
    seed_account(&store, "Asha", "asha01");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/user-content")
        .set_json(json!({ "userId": "asha01", "contentType": "thought", "title": "Gone soon" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = body["content"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/user-content?id={}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Content deleted successfully");

    let req = test::TestRequest::get()
        .uri(&format!("/api/user-content?contentId={}", id))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["content"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_delete_content_missing_id_rejected() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = test_auth_service();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: MetricsCollector::new(),
            }))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::delete().uri("/api/user-content").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
