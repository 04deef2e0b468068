use axum::{debug_handler, extract::{Path, State}, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;

use crate::{names, session, AppError, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_account(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(user_id): Path<String>,
) -> AppResult<Json<Value>> {
    let caller = session::require_user(&session).await?;
    if caller != user_id {
        return Err(AppError::Forbidden);
    }

    // release and delete commit together: a failure between them must not
    // leave an active account stripped of its display name
    let mut tx = db_pool.begin().await?;

    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT anonymous_name FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((anonymous_name,)) = row else {
        return Err(AppError::NotFound("User"));
    };

    if let Some(name) = &anonymous_name {
        names::release(&mut *tx, name).await?;
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if let Some(name) = anonymous_name {
        info!("released display name {name}");
    }

    session.clear().await;

    Ok(Json(json!({ "message": "User account deleted successfully" })))
}
