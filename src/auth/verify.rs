use std::time::Duration;

use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{session, AppError, AppResult};

/// A session check stuck behind slow storage must not hold the request
/// open indefinitely; past this bound it aborts with no state touched.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[debug_handler(state = crate::AppState)]
pub(crate) async fn verify(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Value>> {
    let user_id = session::require_user(&session).await?;

    let lookup = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT username, anonymous_name FROM users WHERE id = ? AND is_active = 1",
    )
    .bind(&user_id)
    .fetch_optional(&db_pool);

    let row = bounded(lookup).await?;

    let Some((username, anonymous_name)) = row else {
        return Err(AppError::Unauthorized("User not found"));
    };

    Ok(Json(json!({
        "valid": true,
        "user": {
            "id": user_id,
            "username": username,
            "anonymousName": anonymous_name,
        },
    })))
}

async fn bounded<T, F>(lookup: F) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    tokio::time::timeout(LOOKUP_TIMEOUT, lookup)
        .await
        .map_err(|_| AppError::Timeout)?
        .map_err(Into::into)
}
