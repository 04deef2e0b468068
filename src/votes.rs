//! One-vote-per-user-per-post ledger.
//!
//! The vote row and the post counters move inside a single transaction,
//! so a crash cannot leave one updated without the other. Counters are
//! floored at zero; an actual clamp means the two diverged out-of-band
//! and is logged rather than ignored.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::warn;

use crate::db;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    fn as_str(self) -> &'static str {
        match self {
            VoteKind::Upvote => "upvote",
            VoteKind::Downvote => "downvote",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upvote" => Some(VoteKind::Upvote),
            "downvote" => Some(VoteKind::Downvote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Upvote,
    Downvote,
    Remove,
}

/// The post's counters after the action, the voter's effective vote, and
/// whether anything actually changed (no-ops must not broadcast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_vote: Option<VoteKind>,
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    next: Option<VoteKind>,
    up_delta: i64,
    down_delta: i64,
}

/// The per-pair state machine: {NoVote, Up, Down} x {up, down, remove}.
/// Repeating the current direction and removing a missing vote are no-ops.
fn transition(current: Option<VoteKind>, action: VoteAction) -> Transition {
    use VoteKind::*;
    match (current, action) {
        (None, VoteAction::Upvote) => Transition { next: Some(Upvote), up_delta: 1, down_delta: 0 },
        (None, VoteAction::Downvote) => Transition { next: Some(Downvote), up_delta: 0, down_delta: 1 },
        (None, VoteAction::Remove) => Transition { next: None, up_delta: 0, down_delta: 0 },
        (Some(Upvote), VoteAction::Upvote) => Transition { next: Some(Upvote), up_delta: 0, down_delta: 0 },
        (Some(Downvote), VoteAction::Downvote) => Transition { next: Some(Downvote), up_delta: 0, down_delta: 0 },
        (Some(Upvote), VoteAction::Downvote) => Transition { next: Some(Downvote), up_delta: -1, down_delta: 1 },
        (Some(Downvote), VoteAction::Upvote) => Transition { next: Some(Upvote), up_delta: 1, down_delta: -1 },
        (Some(Upvote), VoteAction::Remove) => Transition { next: None, up_delta: -1, down_delta: 0 },
        (Some(Downvote), VoteAction::Remove) => Transition { next: None, up_delta: 0, down_delta: -1 },
    }
}

pub async fn apply_vote(
    pool: &SqlitePool,
    user_id: &str,
    post_id: &str,
    action: VoteAction,
) -> Result<VoteOutcome, sqlx::Error> {
    let mut conn = pool.acquire().await?;

    // Take the write lock before reading. A deferred transaction would read
    // first and fail its upgrade under contention; with IMMEDIATE, parallel
    // voters serialize behind sqlite's busy handler instead.
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    match apply_locked(&mut conn, user_id, post_id, action).await {
        Ok(outcome) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(outcome)
        }
        Err(e) => {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            Err(e)
        }
    }
}

async fn apply_locked(
    conn: &mut SqliteConnection,
    user_id: &str,
    post_id: &str,
    action: VoteAction,
) -> Result<VoteOutcome, sqlx::Error> {
    let current: Option<(String,)> =
        sqlx::query_as("SELECT vote_type FROM votes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .fetch_optional(&mut *conn)
            .await?;
    let current = current.and_then(|(v,)| VoteKind::parse(&v));

    let (upvotes, downvotes): (i64, i64) =
        sqlx::query_as("SELECT upvotes, downvotes FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_one(&mut *conn)
            .await?;

    let t = transition(current, action);
    if t.next == current {
        return Ok(VoteOutcome {
            upvotes,
            downvotes,
            user_vote: current,
            changed: false,
        });
    }

    let new_up = clamped(upvotes, t.up_delta, post_id, "upvotes");
    let new_down = clamped(downvotes, t.down_delta, post_id, "downvotes");

    match t.next {
        Some(kind) if current.is_none() => {
            sqlx::query(
                "INSERT INTO votes (user_id, post_id, vote_type, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(post_id)
            .bind(kind.as_str())
            .bind(db::now_millis())
            .execute(&mut *conn)
            .await?;
        }
        Some(kind) => {
            sqlx::query("UPDATE votes SET vote_type = ? WHERE user_id = ? AND post_id = ?")
                .bind(kind.as_str())
                .bind(user_id)
                .bind(post_id)
                .execute(&mut *conn)
                .await?;
        }
        None => {
            sqlx::query("DELETE FROM votes WHERE user_id = ? AND post_id = ?")
                .bind(user_id)
                .bind(post_id)
                .execute(&mut *conn)
                .await?;
        }
    }

    sqlx::query("UPDATE posts SET upvotes = ?, downvotes = ? WHERE id = ?")
        .bind(new_up)
        .bind(new_down)
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    Ok(VoteOutcome {
        upvotes: new_up,
        downvotes: new_down,
        user_vote: t.next,
        changed: true,
    })
}

fn clamped(count: i64, delta: i64, post_id: &str, which: &str) -> i64 {
    let next = count + delta;
    if next < 0 {
        warn!("post {post_id}: {which} would go negative, ledger and counters diverged");
        return 0;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    #[test]
    fn transition_table_matches_the_state_machine() {
        use VoteKind::*;
        let cases = [
            (None, VoteAction::Upvote, Some(Upvote), 1, 0),
            (None, VoteAction::Downvote, Some(Downvote), 0, 1),
            (None, VoteAction::Remove, None, 0, 0),
            (Some(Upvote), VoteAction::Downvote, Some(Downvote), -1, 1),
            (Some(Downvote), VoteAction::Upvote, Some(Upvote), 1, -1),
            (Some(Upvote), VoteAction::Upvote, Some(Upvote), 0, 0),
            (Some(Downvote), VoteAction::Downvote, Some(Downvote), 0, 0),
            (Some(Upvote), VoteAction::Remove, None, -1, 0),
            (Some(Downvote), VoteAction::Remove, None, 0, -1),
        ];
        for (current, action, next, up, down) in cases {
            let t = transition(current, action);
            assert_eq!(t.next, next, "{current:?} + {action:?}");
            assert_eq!((t.up_delta, t.down_delta), (up, down), "{current:?} + {action:?}");
        }
    }

    async fn fixture() -> (SqlitePool, String, String) {
        let pool = testing::pool().await;
        let user = testing::insert_user(&pool, "voter", "ShadowWalker").await;
        let post = testing::insert_post(&pool, &user, "hello", db::now_millis()).await;
        (pool, user, post)
    }

    #[tokio::test]
    async fn first_vote_increments_and_records() {
        let (pool, user, post) = fixture().await;

        let out = apply_vote(&pool, &user, &post, VoteAction::Upvote).await.unwrap();
        assert_eq!((out.upvotes, out.downvotes), (1, 0));
        assert_eq!(out.user_vote, Some(VoteKind::Upvote));
        assert!(out.changed);
    }

    #[tokio::test]
    async fn repeating_the_same_direction_is_a_noop() {
        let (pool, user, post) = fixture().await;

        apply_vote(&pool, &user, &post, VoteAction::Upvote).await.unwrap();
        let out = apply_vote(&pool, &user, &post, VoteAction::Upvote).await.unwrap();
        assert_eq!((out.upvotes, out.downvotes), (1, 0));
        assert!(!out.changed);
    }

    #[tokio::test]
    async fn switching_direction_adjusts_both_counters() {
        let (pool, user, post) = fixture().await;

        apply_vote(&pool, &user, &post, VoteAction::Upvote).await.unwrap();
        let out = apply_vote(&pool, &user, &post, VoteAction::Downvote).await.unwrap();
        assert_eq!((out.upvotes, out.downvotes), (0, 1));
        assert_eq!(out.user_vote, Some(VoteKind::Downvote));
        assert!(out.changed);
    }

    #[tokio::test]
    async fn remove_clears_the_vote_and_counter() {
        let (pool, user, post) = fixture().await;

        apply_vote(&pool, &user, &post, VoteAction::Downvote).await.unwrap();
        let out = apply_vote(&pool, &user, &post, VoteAction::Remove).await.unwrap();
        assert_eq!((out.upvotes, out.downvotes), (0, 0));
        assert_eq!(out.user_vote, None);
        assert!(out.changed);

        let row: Option<(String,)> =
            sqlx::query_as("SELECT vote_type FROM votes WHERE user_id = ? AND post_id = ?")
                .bind(&user)
                .bind(&post)
                .fetch_optional(&pool)
                .await
                .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn removing_a_missing_vote_is_a_noop() {
        let (pool, user, post) = fixture().await;

        let out = apply_vote(&pool, &user, &post, VoteAction::Remove).await.unwrap();
        assert_eq!((out.upvotes, out.downvotes), (0, 0));
        assert!(!out.changed);
    }

    #[tokio::test]
    async fn counters_never_go_negative() {
        let (pool, user, post) = fixture().await;

        // A stray ledger row with no matching counter increment.
        sqlx::query("INSERT INTO votes (user_id, post_id, vote_type, created_at) VALUES (?, ?, 'upvote', 0)")
            .bind(&user)
            .bind(&post)
            .execute(&pool)
            .await
            .unwrap();

        let out = apply_vote(&pool, &user, &post, VoteAction::Remove).await.unwrap();
        assert_eq!((out.upvotes, out.downvotes), (0, 0));
        assert!(out.changed);
    }

    // Needs a file-backed database: every connection to `sqlite::memory:`
    // is its own database, and contention needs real parallel connections.
    #[tokio::test(flavor = "multi_thread")]
    async fn parallel_voters_all_land() {
        use sqlx::sqlite::SqlitePoolOptions;
        use uuid::Uuid;

        let path = std::env::temp_dir().join(format!("shadowboard-vote-{}.db", Uuid::now_v7()));
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .unwrap();
        crate::db::init_schema(&pool).await.unwrap();

        let author = testing::insert_user(&pool, "author", "DuskPoet").await;
        let post = testing::insert_post(&pool, &author, "contended", db::now_millis()).await;

        let mut voters = Vec::new();
        for i in 0..8 {
            voters.push(testing::insert_user(&pool, &format!("voter{i}"), &format!("Name{i}")).await);
        }

        let mut tasks = Vec::new();
        for user in voters {
            let pool = pool.clone();
            let post = post.clone();
            tasks.push(tokio::spawn(async move {
                apply_vote(&pool, &user, &post, VoteAction::Upvote).await
            }));
        }
        for task in tasks {
            let out = task.await.unwrap().unwrap();
            assert!(out.changed);
        }

        let (up,): (i64,) = sqlx::query_as("SELECT upvotes FROM posts WHERE id = ?")
            .bind(&post)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(up, 8);

        pool.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn two_voters_accumulate_independently() {
        let (pool, user, post) = fixture().await;
        let other = testing::insert_user(&pool, "voter2", "DarkMuse").await;

        apply_vote(&pool, &user, &post, VoteAction::Upvote).await.unwrap();
        let out = apply_vote(&pool, &other, &post, VoteAction::Upvote).await.unwrap();
        assert_eq!(out.upvotes, 2);
        assert_eq!(out.user_vote, Some(VoteKind::Upvote));
    }
}
