use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::{AdminAuth, AuthService};
use crate::error::ApiError;
use crate::metrics::MetricsCollector;
use crate::models::*;
use crate::store::{ContentFilter, Store, StoreError};

pub struct AppState {
    pub store: Arc<Store>,
    pub auth_service: Arc<AuthService>,
    pub metrics: MetricsCollector,
}

type ApiResult = Result<HttpResponse, ApiError>;

/// Required-field check: an absent key and an empty string both fail
/// validation, matching what the browser UI may send either way.
fn require(field: &Option<String>, msg: &str) -> Result<String, ApiError> {
    match field {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ApiError::Validation(msg.to_string())),
    }
}

// ==================== Health Check ====================

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// ==================== Admin Session ====================

pub async fn admin_login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult {
    if !state.auth_service.verify_admin_password(&body.password) {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state
        .auth_service
        .generate_token()
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))?;

    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

// ==================== Accounts Endpoints ====================

#[derive(Deserialize)]
pub struct DeleteAccountQuery {
    id: Option<String>,
}

pub async fn list_accounts(state: web::Data<AppState>) -> ApiResult {
    let accounts = state.store.list_accounts()?;
    Ok(HttpResponse::Ok().json(json!({ "accounts": accounts })))
}

pub async fn create_account(
    state: web::Data<AppState>,
    _admin: AdminAuth,
    body: web::Json<CreateAccountRequest>,
) -> ApiResult {
    let account_name = require(&body.account_name, "Account name and user ID are required")?;
    let user_id = require(&body.user_id, "Account name and user ID are required")?;

    let mut account = Account {
        id: String::new(),
        account_name,
        user_id,
        created_at: Utc::now(),
    };
    state.store.create_account(&mut account)?;

    Ok(HttpResponse::Created().json(json!({ "account": account })))
}

pub async fn delete_account(
    state: web::Data<AppState>,
    _admin: AdminAuth,
    query: web::Query<DeleteAccountQuery>,
) -> ApiResult {
    let id = require(&query.id, "Account ID is required")?;
    state.store.delete_account(&id)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Account deleted successfully" })))
}

// ==================== Content Endpoints ====================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContentQuery {
    user_id: Option<String>,
    content_id: Option<String>,
    content_type: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteContentQuery {
    id: Option<String>,
}

pub async fn list_content(
    state: web::Data<AppState>,
    query: web::Query<ListContentQuery>,
) -> ApiResult {
    let filter = ContentFilter {
        user_id: query.user_id.as_deref().filter(|s| !s.is_empty()),
        content_id: query.content_id.as_deref().filter(|s| !s.is_empty()),
        content_type: query.content_type.as_deref().filter(|s| !s.is_empty()),
    };
    let content = state.store.list_content(&filter)?;

    Ok(HttpResponse::Ok().json(json!({ "content": content })))
}

pub async fn create_content(
    state: web::Data<AppState>,
    body: web::Json<CreateContentRequest>,
) -> ApiResult {
    let user_id = require(&body.user_id, "userId, contentType, and title are required")?;
    let kind_raw = require(&body.content_type, "userId, contentType, and title are required")?;
    let title = require(&body.title, "userId, contentType, and title are required")?;

    let content_type = ContentKind::parse(&kind_raw)
        .ok_or_else(|| ApiError::Validation("contentType must be thought, repo, or blog".to_string()))?;

    // The owning account must exist before content can reference it
    if state.store.get_account_by_user_id(&user_id)?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let mut item = ContentItem {
        id: String::new(),
        user_id,
        content_type,
        title,
        description: body.description.clone(),
        url: body.url.clone(),
        tags: body.tags.clone(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    state.store.create_content(&mut item)?;

    Ok(HttpResponse::Created().json(json!({ "content": item })))
}

pub async fn update_content(
    state: web::Data<AppState>,
    body: web::Json<UpdateContentRequest>,
) -> ApiResult {
    let id = require(&body.id, "Content ID is required")?;

    let mut item = state.store.get_content(&id).map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::NotFound("Content not found".to_string()),
        other => other.into(),
    })?;

    // Apply only the fields the caller provided; the store refreshes updated_at
    if let Some(ref title) = body.title {
        item.title = title.clone();
    }
    if let Some(ref description) = body.description {
        item.description = Some(description.clone());
    }
    if let Some(ref url) = body.url {
        item.url = Some(url.clone());
    }
    if let Some(ref tags) = body.tags {
        item.tags = tags.clone();
    }

    state.store.update_content(&mut item)?;

    Ok(HttpResponse::Ok().json(json!({ "content": item })))
}

pub async fn delete_content(
    state: web::Data<AppState>,
    query: web::Query<DeleteContentQuery>,
) -> ApiResult {
    let id = require(&query.id, "Content ID is required")?;
    state.store.delete_content(&id)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Content deleted successfully" })))
}

// ==================== Admin Likes Endpoints ====================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeQuery {
    content_id: Option<String>,
}

/// GET /api/admin-likes serves two reads: with ?contentId= it reports the
/// liked-status of one item, without it it returns the full showcase.
pub async fn like_status_or_showcase(
    state: web::Data<AppState>,
    query: web::Query<LikeQuery>,
) -> ApiResult {
    if let Some(content_id) = query.content_id.as_deref().filter(|s| !s.is_empty()) {
        let like = state.store.get_like(content_id)?;
        return Ok(HttpResponse::Ok().json(json!({ "liked": like.is_some(), "like": like })));
    }

    let showcased = state.store.list_showcased()?;
    Ok(HttpResponse::Ok().json(json!({ "showcased": showcased })))
}

pub async fn like_content(
    state: web::Data<AppState>,
    _admin: AdminAuth,
    body: web::Json<LikeRequest>,
) -> ApiResult {
    let content_id = require(&body.content_id, "contentId is required")?;

    // The target must exist before it can be featured
    match state.store.get_content(&content_id) {
        Ok(_) => {}
        Err(StoreError::NotFound(_)) => {
            return Err(ApiError::NotFound("Content not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    // Re-liking is fail-soft: the existing entry is returned unchanged
    if let Some(existing) = state.store.get_like(&content_id)? {
        return Ok(HttpResponse::Ok().json(json!({ "like": existing })));
    }

    let mut like = AdminLike {
        id: String::new(),
        content_id,
        notes: body.notes.clone(),
        display_order: body.display_order.unwrap_or(0),
        liked_at: Utc::now(),
    };
    match state.store.create_like(&mut like) {
        Ok(()) => Ok(HttpResponse::Created().json(json!({ "like": like }))),
        // Lost a concurrent race on the unique content_id; answer with the
        // entry that won.
        Err(StoreError::Conflict(_)) => {
            let existing = state.store.get_like(&like.content_id)?;
            Ok(HttpResponse::Ok().json(json!({ "like": existing })))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update_like(
    state: web::Data<AppState>,
    _admin: AdminAuth,
    body: web::Json<LikeRequest>,
) -> ApiResult {
    let content_id = require(&body.content_id, "contentId is required")?;

    let mut like = state
        .store
        .get_like(&content_id)?
        .ok_or_else(|| ApiError::NotFound("Content is not featured".to_string()))?;

    if let Some(ref notes) = body.notes {
        like.notes = Some(notes.clone());
    }
    if let Some(display_order) = body.display_order {
        like.display_order = display_order;
    }

    state.store.update_like(&like)?;

    Ok(HttpResponse::Ok().json(json!({ "like": like })))
}

pub async fn unlike_content(
    state: web::Data<AppState>,
    _admin: AdminAuth,
    query: web::Query<LikeQuery>,
) -> ApiResult {
    let content_id = require(&query.content_id, "contentId is required")?;
    state.store.delete_like(&content_id)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Content unliked successfully" })))
}

// ==================== Metrics ====================

pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.metrics.snapshot())
}

// ==================== Route Configuration ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health))
        // Admin session
        .route("/api/admin/login", web::post().to(admin_login))
        // Accounts
        .route("/api/accounts", web::get().to(list_accounts))
        .route("/api/accounts", web::post().to(create_account))
        .route("/api/accounts", web::delete().to(delete_account))
        // Member content
        .route("/api/user-content", web::get().to(list_content))
        .route("/api/user-content", web::post().to(create_content))
        .route("/api/user-content", web::put().to(update_content))
        .route("/api/user-content", web::delete().to(delete_content))
        // Moderation ledger / showcase
        .route("/api/admin-likes", web::get().to(like_status_or_showcase))
        .route("/api/admin-likes", web::post().to(like_content))
        .route("/api/admin-likes", web::put().to(update_like))
        .route("/api/admin-likes", web::delete().to(unlike_content))
        // Metrics
        .route("/api/metrics", web::get().to(metrics));
}
