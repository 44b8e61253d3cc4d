//! SQLite persistence for sessions and messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// A persisted chat session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted message
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Open a connection pool for the given connection string and create
/// the schema when missing.
pub async fn connect(url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // In-memory databases are per-connection; a pool of one keeps the
    // schema visible to every query.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Create the relational schema.
///
/// Session deletion cascades to messages and message metadata; the
/// original schema left orphaned rows behind.
pub async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS message_metadata (
            id TEXT PRIMARY KEY,
            message_id TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            metadata TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a session with a server-generated UUID and return the row.
/// No uniqueness check on (user_id, name).
pub async fn insert_session(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
) -> sqlx::Result<SessionRow> {
    let row = SessionRow {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO sessions (id, user_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.user_id)
    .bind(&row.name)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(pool)
    .await?;

    Ok(row)
}

/// All sessions for a user, in storage order
pub async fn list_sessions(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<SessionRow>> {
    sqlx::query_as::<_, SessionRow>(
        "SELECT id, user_id, name, created_at, updated_at FROM sessions WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Insert a message. The foreign key constraint rejects unknown session
/// ids; there is no pre-check here.
pub async fn insert_message(
    pool: &SqlitePool,
    session_id: &str,
    role: &str,
    content: &str,
) -> sqlx::Result<MessageRow> {
    let row = MessageRow {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        role: role.to_string(),
        content: content.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO messages (id, session_id, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.session_id)
    .bind(&row.role)
    .bind(&row.content)
    .bind(row.created_at)
    .execute(pool)
    .await?;

    Ok(row)
}

/// Attach an opaque metadata blob to a message
pub async fn insert_message_metadata(
    pool: &SqlitePool,
    message_id: &str,
    metadata: &serde_json::Value,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO message_metadata (id, message_id, metadata) VALUES (?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(message_id)
        .bind(metadata.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// All messages for a session, in storage order
pub async fn list_messages(pool: &SqlitePool, session_id: &str) -> sqlx::Result<Vec<MessageRow>> {
    sqlx::query_as::<_, MessageRow>(
        "SELECT id, session_id, role, content, created_at FROM messages WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
}

/// Count metadata rows for a message
pub async fn count_message_metadata(pool: &SqlitePool, message_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM message_metadata WHERE message_id = ?")
        .bind(message_id)
        .fetch_one(pool)
        .await
}
