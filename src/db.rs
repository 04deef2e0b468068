use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

// users.anonymous_name is nullable so release() can unassign it before the
// row is deleted; the UNIQUE index still rejects a double allocation.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY,
    username        TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,
    anonymous_name  TEXT UNIQUE,
    created_at      INTEGER NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1
);

-- no FK on user_id: posts outlive their author and project as 'Anonymous'
CREATE TABLE IF NOT EXISTS posts (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    content     TEXT NOT NULL,
    upvotes     INTEGER NOT NULL DEFAULT 0,
    downvotes   INTEGER NOT NULL DEFAULT 0,
    impressions INTEGER NOT NULL DEFAULT 0,
    fake_region TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS posts_created_at ON posts (created_at DESC);
CREATE INDEX IF NOT EXISTS posts_upvotes ON posts (upvotes DESC);

CREATE TABLE IF NOT EXISTS votes (
    user_id    TEXT NOT NULL,
    post_id    TEXT NOT NULL,
    vote_type  TEXT NOT NULL CHECK (vote_type IN ('upvote', 'downvote')),
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, post_id)
);
"#;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Current wall clock as unix milliseconds, the storage format for all
/// timestamps (keeps the trending divisor plain SQL arithmetic).
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn rfc3339(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}

/// A post joined with its author's display name. The credential-facing
/// username never leaves the users table.
#[derive(Debug, Clone, FromRow)]
pub struct PostRecord {
    pub id: String,
    pub content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub impressions: i64,
    pub fake_region: String,
    pub created_at: i64,
    pub author: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub impressions: i64,
    pub fake_region: String,
    pub created_at: String,
    pub author: String,
}

impl From<PostRecord> for PostView {
    fn from(r: PostRecord) -> Self {
        PostView {
            id: r.id,
            content: r.content,
            upvotes: r.upvotes,
            downvotes: r.downvotes,
            impressions: r.impressions,
            fake_region: r.fake_region,
            created_at: rfc3339(r.created_at),
            author: r.author,
        }
    }
}

const POST_PROJECTION: &str = r#"
SELECT p.id, p.content, p.upvotes, p.downvotes, p.impressions,
       p.fake_region, p.created_at,
       COALESCE(u.anonymous_name, 'Anonymous') AS author
FROM posts p
LEFT JOIN users u ON u.id = p.user_id
WHERE p.id = ?
"#;

pub async fn fetch_post(
    pool: &SqlitePool,
    post_id: &str,
) -> Result<Option<PostRecord>, sqlx::Error> {
    sqlx::query_as(POST_PROJECTION)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use uuid::Uuid;

    /// One-connection pool: every connection to `sqlite::memory:` is its
    /// own database, so tests must not fan out across connections.
    pub async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        init_schema(&pool).await.expect("schema");
        pool
    }

    pub async fn insert_user(pool: &SqlitePool, username: &str, anon: &str) -> String {
        let id = Uuid::now_v7().to_string();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, anonymous_name, created_at)
             VALUES (?, ?, 'x', ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(anon)
        .bind(now_millis())
        .execute(pool)
        .await
        .expect("insert user");
        id
    }

    pub async fn insert_post(
        pool: &SqlitePool,
        user_id: &str,
        content: &str,
        created_at: i64,
    ) -> String {
        let id = Uuid::now_v7().to_string();
        sqlx::query(
            "INSERT INTO posts (id, user_id, content, fake_region, created_at)
             VALUES (?, ?, ?, 'Urban Core', ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(content)
        .bind(created_at)
        .execute(pool)
        .await
        .expect("insert post");
        id
    }
}
