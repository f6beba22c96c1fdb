use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Equality filters for content listing. Omitted fields mean no constraint;
/// provided fields are ANDed. Filters compare raw column text, so an unknown
/// content type simply matches nothing.
#[derive(Debug, Default)]
pub struct ContentFilter<'a> {
    pub user_id: Option<&'a str>,
    pub content_id: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

/// Thread-safe SQLite store
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        // user_content.user_id deliberately carries no foreign key: deleting
        // an account leaves its content behind as orphaned rows.
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                account_name TEXT NOT NULL,
                user_id TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_content (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                content_type TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                url TEXT,
                tags TEXT DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS admin_likes (
                id TEXT PRIMARY KEY,
                content_id TEXT UNIQUE NOT NULL,
                notes TEXT,
                display_order INTEGER DEFAULT 0,
                liked_at TEXT NOT NULL,
                FOREIGN KEY (content_id) REFERENCES user_content(id)
            );

            CREATE INDEX IF NOT EXISTS idx_content_user_id ON user_content(user_id);
            CREATE INDEX IF NOT EXISTS idx_content_type ON user_content(content_type);
            CREATE INDEX IF NOT EXISTS idx_content_created_at ON user_content(created_at);
            CREATE INDEX IF NOT EXISTS idx_likes_content_id ON admin_likes(content_id);
            "#,
        )?;
        Ok(())
    }

    // ==================== Account Operations ====================

    pub fn create_account(&self, account: &mut Account) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        account.id = Uuid::new_v4().to_string();
        account.created_at = Utc::now();

        conn.execute(
            r#"INSERT INTO accounts (id, account_name, user_id, created_at)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![
                &account.id,
                &account.account_name,
                &account.user_id,
                account.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| constraint_to_conflict(e, format!("Account {}", account.user_id)))?;
        Ok(())
    }

    pub fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM accounts ORDER BY created_at DESC")?;
        let rows = stmt.query_map([], |row| self.row_to_account(row))?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    pub fn get_account_by_user_id(&self, user_id: &str) -> StoreResult<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let account = conn
            .query_row(
                "SELECT * FROM accounts WHERE user_id = ?1",
                params![user_id],
                |row| self.row_to_account(row),
            )
            .optional()?;
        Ok(account)
    }

    /// Delete by primary key. Deleting an absent id is a no-op: the caller
    /// observes the same end state either way.
    pub fn delete_account(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn row_to_account(&self, row: &rusqlite::Row) -> rusqlite::Result<Account> {
        Ok(Account {
            id: row.get("id")?,
            account_name: row.get("account_name")?,
            user_id: row.get("user_id")?,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
        })
    }

    // ==================== Content Operations ====================

    pub fn create_content(&self, item: &mut ContentItem) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        item.id = Uuid::new_v4().to_string();
        let now = Utc::now();
        item.created_at = now;
        item.updated_at = now;

        let tags_json = serde_json::to_string(&item.tags)?;

        conn.execute(
            r#"INSERT INTO user_content (id, user_id, content_type, title, description, url, tags, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                &item.id,
                &item.user_id,
                item.content_type.as_str(),
                &item.title,
                &item.description,
                &item.url,
                &tags_json,
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_content(&self, id: &str) -> StoreResult<ContentItem> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM user_content WHERE id = ?1",
            params![id],
            |row| self.row_to_content(row),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("Content {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn list_content(&self, filter: &ContentFilter) -> StoreResult<Vec<ContentItem>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT * FROM user_content");
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(user_id) = filter.user_id {
            clauses.push("user_id = ?");
            args.push(user_id.to_string());
        }
        if let Some(content_id) = filter.content_id {
            clauses.push("id = ?");
            args.push(content_id.to_string());
        }
        if let Some(content_type) = filter.content_type {
            clauses.push("content_type = ?");
            args.push(content_type.to_string());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            self.row_to_content(row)
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Write the item back in full and refresh `updated_at`. Partial-update
    /// semantics come from the caller fetching the row first and overwriting
    /// only the fields it was given.
    pub fn update_content(&self, item: &mut ContentItem) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        item.updated_at = Utc::now();

        let tags_json = serde_json::to_string(&item.tags)?;

        let rows = conn.execute(
            r#"UPDATE user_content SET title = ?1, description = ?2, url = ?3, tags = ?4, updated_at = ?5
               WHERE id = ?6"#,
            params![
                &item.title,
                &item.description,
                &item.url,
                &tags_json,
                item.updated_at.to_rfc3339(),
                &item.id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("Content {}", item.id)));
        }
        Ok(())
    }

    pub fn delete_content(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM user_content WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn row_to_content(&self, row: &rusqlite::Row) -> rusqlite::Result<ContentItem> {
        let tags_str: String = row.get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&tags_str).unwrap_or_default();

        let kind_str: String = row.get("content_type")?;
        let content_type = ContentKind::parse(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown content type: {}", kind_str).into(),
            )
        })?;

        Ok(ContentItem {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            content_type,
            title: row.get("title")?,
            description: row.get("description")?,
            url: row.get("url")?,
            tags,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
        })
    }

    // ==================== Like Operations ====================

    /// A missing like is a normal outcome, so this returns Option instead of
    /// treating absence as an error.
    pub fn get_like(&self, content_id: &str) -> StoreResult<Option<AdminLike>> {
        let conn = self.conn.lock().unwrap();
        let like = conn
            .query_row(
                "SELECT * FROM admin_likes WHERE content_id = ?1",
                params![content_id],
                |row| self.row_to_like(row),
            )
            .optional()?;
        Ok(like)
    }

    pub fn create_like(&self, like: &mut AdminLike) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        like.id = Uuid::new_v4().to_string();
        like.liked_at = Utc::now();

        conn.execute(
            r#"INSERT INTO admin_likes (id, content_id, notes, display_order, liked_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                &like.id,
                &like.content_id,
                &like.notes,
                like.display_order,
                like.liked_at.to_rfc3339(),
            ],
        )
        .map_err(|e| constraint_to_conflict(e, format!("Like for content {}", like.content_id)))?;
        Ok(())
    }

    pub fn update_like(&self, like: &AdminLike) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE admin_likes SET notes = ?1, display_order = ?2 WHERE content_id = ?3",
            params![&like.notes, like.display_order, &like.content_id],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!(
                "Like for content {}",
                like.content_id
            )));
        }
        Ok(())
    }

    pub fn delete_like(&self, content_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM admin_likes WHERE content_id = ?1",
            params![content_id],
        )?;
        Ok(())
    }

    fn row_to_like(&self, row: &rusqlite::Row) -> rusqlite::Result<AdminLike> {
        Ok(AdminLike {
            id: row.get("id")?,
            content_id: row.get("content_id")?,
            notes: row.get("notes")?,
            display_order: row.get("display_order")?,
            liked_at: parse_datetime(row.get::<_, String>("liked_at")?),
        })
    }

    // ==================== Showcase ====================

    /// The derived showcase view: likes joined with their content and the
    /// owning account's display name. Content whose account was deleted
    /// drops out of the join.
    pub fn list_showcased(&self) -> StoreResult<Vec<ShowcasedContent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"SELECT c.id AS content_id, c.user_id, a.account_name, c.content_type,
                      c.title, c.description, c.url, c.tags, c.created_at,
                      l.notes, l.display_order, l.liked_at
               FROM admin_likes l
               JOIN user_content c ON c.id = l.content_id
               JOIN accounts a ON a.user_id = c.user_id
               ORDER BY l.display_order DESC, l.liked_at DESC"#,
        )?;
        let rows = stmt.query_map([], |row| self.row_to_showcased(row))?;

        let mut showcased = Vec::new();
        for row in rows {
            showcased.push(row?);
        }
        Ok(showcased)
    }

    fn row_to_showcased(&self, row: &rusqlite::Row) -> rusqlite::Result<ShowcasedContent> {
        let tags_str: String = row.get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&tags_str).unwrap_or_default();

        let kind_str: String = row.get("content_type")?;
        let content_type = ContentKind::parse(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown content type: {}", kind_str).into(),
            )
        })?;

        Ok(ShowcasedContent {
            content_id: row.get("content_id")?,
            user_id: row.get("user_id")?,
            account_name: row.get("account_name")?,
            content_type,
            title: row.get("title")?,
            description: row.get("description")?,
            url: row.get("url")?,
            tags,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
            notes: row.get("notes")?,
            display_order: row.get("display_order")?,
            liked_at: parse_datetime(row.get::<_, String>("liked_at")?),
        })
    }
}

fn constraint_to_conflict(e: rusqlite::Error, what: String) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(format!("{} already exists", what))
        }
        _ => StoreError::Database(e),
    }
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
