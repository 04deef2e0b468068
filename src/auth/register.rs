use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
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
use tracing::info;
use uuid::Uuid;

use crate::{db, names, session, AppError, AppResult};

#[derive(Deserialize)]
pub(crate) struct RegisterBody {
    username: String,
    password: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(RegisterBody { username, password }): Json<RegisterBody>,
) -> AppResult<Response> {
    if !super::valid_username(&username) {
        return Err(AppError::validation(
            "Username must be 3-20 alphanumeric characters",
        ));
    }
    if !super::valid_password(&password) {
        return Err(AppError::validation(
            "Password must be 6-100 characters",
        ));
    }

    let taken: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE username = ?")
        .bind(&username)
        .fetch_optional(&db_pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::conflict("Username already exists"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    let anonymous_name = names::allocate(&db_pool).await;
    let user_id = Uuid::now_v7().to_string();

    let inserted = sqlx::query(
        "INSERT INTO users (id, username, password_hash, anonymous_name, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(&username)
    .bind(&password_hash)
    .bind(&anonymous_name)
    .bind(db::now_millis())
    .execute(&db_pool)
    .await;

    if let Err(e) = inserted {
        // two registrations picking the same name in the scan-then-pick
        // window land here; the unique index kept the pool collision-free
        if e.as_database_error()
            .is_some_and(|d| d.is_unique_violation())
        {
            return Err(AppError::conflict("Registration collided, please retry"));
        }
        return Err(e.into());
    }

    session.insert(session::USER_ID, user_id.clone()).await?;
    info!("registered {anonymous_name}");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": {
                "id": user_id,
                "username": username,
                "anonymousName": anonymous_name,
            },
        })),
    )
        .into_response())
}
