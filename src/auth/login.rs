use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{session, AppError, AppResult};

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    username: String,
    password: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(LoginBody { username, password }): Json<LoginBody>,
) -> AppResult<Json<Value>> {
    let row: Option<(String, String, Option<String>)> = sqlx::query_as(
        "SELECT id, password_hash, anonymous_name FROM users WHERE username = ? AND is_active = 1",
    )
    .bind(&username)
    .fetch_optional(&db_pool)
    .await?;

    // same response whether the user is missing or the password is wrong
    let Some((user_id, password_hash, anonymous_name)) = row else {
        return Err(AppError::Unauthorized("Invalid credentials"));
    };

    let parsed = PasswordHash::new(&password_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {e}"))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    session.insert(session::USER_ID, user_id.clone()).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": {
            "id": user_id,
            "username": username,
            "anonymousName": anonymous_name,
        },
    })))
}
