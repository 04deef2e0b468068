use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    db::{self, PostView},
    feed::{Feed, FeedEvent},
    filter, privacy, session, AppError, AppResult, AppState,
};

use super::MAX_CONTENT_LEN;

#[derive(Deserialize)]
pub(crate) struct CreatePostBody {
    content: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_post(
    State(db_pool): State<SqlitePool>,
    State(feed): State<Feed>,
    session: Session,
    Json(CreatePostBody { content }): Json<CreatePostBody>,
) -> AppResult<Response> {
    let user_id = session::require_user(&session).await?;

    let content = content.trim().to_owned();
    if content.is_empty() {
        return Err(AppError::validation("Content must not be empty"));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(AppError::validation(format!(
            "Content must be at most {MAX_CONTENT_LEN} characters"
        )));
    }

    let terms = filter::violating_terms(&content);
    if !terms.is_empty() {
        return Err(AppError::ContentRejected { terms });
    }

    let id = Uuid::now_v7().to_string();
    sqlx::query(
        "INSERT INTO posts (id, user_id, content, fake_region, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&user_id)
    .bind(&content)
    .bind(privacy::fake_region())
    .bind(db::now_millis())
    .execute(&db_pool)
    .await?;

    // re-read through the projection so the author is the display name
    let record = db::fetch_post(&db_pool, &id)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    let post = PostView::from(record);

    feed.publish(FeedEvent::PostCreated(post.clone()));

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post created successfully",
            "post": post,
        })),
    )
        .into_response())
}
