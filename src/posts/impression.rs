use axum::{debug_handler, extract::{Path, State}, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    feed::{Feed, FeedEvent, ImpressionDelta},
    AppError, AppResult, AppState,
};

/// Unconditional increment: the at-most-once-per-viewer dwell gate lives
/// in the client, not here. One call, one count, one event.
#[debug_handler(state = AppState)]
pub(crate) async fn impression(
    State(db_pool): State<SqlitePool>,
    State(feed): State<Feed>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Value>> {
    let updated: Option<(i64,)> = sqlx::query_as(
        "UPDATE posts SET impressions = impressions + 1 WHERE id = ? RETURNING impressions",
    )
    .bind(&post_id)
    .fetch_optional(&db_pool)
    .await?;

    let Some((impressions,)) = updated else {
        return Err(AppError::NotFound("Post"));
    };

    feed.publish(FeedEvent::ImpressionChanged(ImpressionDelta {
        post_id,
        impressions,
    }));

    Ok(Json(json!({
        "message": "Impression tracked",
        "impressions": impressions,
    })))
}
