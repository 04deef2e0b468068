use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    db::{self, PostView},
    session,
    votes::VoteKind,
    AppError, AppResult,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostWithVote {
    #[serde(flatten)]
    post: PostView,
    user_vote: Option<VoteKind>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn get_post(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(post_id): Path<String>,
) -> AppResult<Json<Value>> {
    let user_id = session::require_user(&session).await?;

    let record = db::fetch_post(&db_pool, &post_id)
        .await?
        .ok_or(AppError::NotFound("Post"))?;

    let vote: Option<(String,)> =
        sqlx::query_as("SELECT vote_type FROM votes WHERE user_id = ? AND post_id = ?")
            .bind(&user_id)
            .bind(&post_id)
            .fetch_optional(&db_pool)
            .await?;
    let user_vote = vote.and_then(|(v,)| VoteKind::parse(&v));

    Ok(Json(json!({
        "post": PostWithVote {
            post: PostView::from(record),
            user_vote,
        },
    })))
}
