use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    feed::{Feed, FeedEvent, VoteDelta},
    session,
    votes::{self, VoteAction},
    AppError, AppResult, AppState,
};

#[derive(Deserialize)]
pub(crate) struct VoteBody {
    #[serde(rename = "type")]
    action: VoteAction,
}

#[debug_handler(state = AppState)]
pub(crate) async fn vote(
    State(db_pool): State<SqlitePool>,
    State(feed): State<Feed>,
    session: Session,
    Path(post_id): Path<String>,
    Json(VoteBody { action }): Json<VoteBody>,
) -> AppResult<Json<Value>> {
    let user_id = session::require_user(&session).await?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM posts WHERE id = ?")
        .bind(&post_id)
        .fetch_optional(&db_pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Post"));
    }

    // SQLITE_BUSY past the busy handler's patience is contention, not a fault
    let outcome = votes::apply_vote(&db_pool, &user_id, &post_id, action)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(d) if d.code().as_deref() == Some("5") => {
                AppError::conflict("Vote contention, please retry")
            }
            _ => AppError::from(e),
        })?;

    // no-op transitions (same direction twice, removing nothing) stay silent
    if outcome.changed {
        feed.publish(FeedEvent::VoteChanged(VoteDelta {
            post_id: post_id.clone(),
            upvotes: outcome.upvotes,
            downvotes: outcome.downvotes,
            user_vote: outcome.user_vote,
        }));
    }

    Ok(Json(json!({
        "message": "Vote updated successfully",
        "upvotes": outcome.upvotes,
        "downvotes": outcome.downvotes,
        "userVote": outcome.user_vote,
    })))
}
