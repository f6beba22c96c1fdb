use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account is a registered club member identity. The `user_id` handle is what
/// content items reference as their owner and what member URLs are built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub account_name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// The three kinds of content a member can post to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Thought,
    Repo,
    Blog,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Thought => "thought",
            ContentKind::Repo => "repo",
            ContentKind::Blog => "blog",
        }
    }

    pub fn parse(s: &str) -> Option<ContentKind> {
        match s {
            "thought" => Some(ContentKind::Thought),
            "repo" => Some(ContentKind::Repo),
            "blog" => Some(ContentKind::Blog),
            _ => None,
        }
    }
}

/// ContentItem is a single piece of member-submitted material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub user_id: String,
    pub content_type: ContentKind,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AdminLike records an administrator's decision to feature a content item on
/// the public showcase. At most one like exists per content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLike {
    pub id: String,
    pub content_id: String,
    pub notes: Option<String>,
    pub display_order: i64,
    pub liked_at: DateTime<Utc>,
}

/// ShowcasedContent is the derived join of like x content x account backing
/// the public showcase page. Never stored; recomputed per query.
#[derive(Debug, Clone, Serialize)]
pub struct ShowcasedContent {
    pub content_id: String,
    pub user_id: String,
    pub account_name: String,
    pub content_type: ContentKind,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub display_order: i64,
    pub liked_at: DateTime<Utc>,
}

// Request/Response types for API
//
// The browser UI sends camelCase keys; rows are returned with their
// snake_case column names. Required fields deserialize as Option so the
// handlers can answer missing input with the shared error shape instead of
// the framework's default body.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub account_name: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    pub user_id: Option<String>,
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Body for both liking (POST) and editing a like (PUT).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub content_id: Option<String>,
    pub notes: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}
