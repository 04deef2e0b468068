use axum::{debug_handler, Json};
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::AppResult;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn logout(session: Session) -> AppResult<Json<Value>> {
    session.clear().await;
    Ok(Json(json!({ "message": "Logged out" })))
}
