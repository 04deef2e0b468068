use std::net::SocketAddr;

use axum::{debug_handler, extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use shadowboard::{auth, config::Config, db, feed, feed::Feed, posts, AppState};
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();

    let db_pool = db::connect(&config.database_url).await?;
    let feed = Feed::new(config.feed_capacity);

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let port = config.port;
    let app_state = AppState {
        db_pool,
        feed,
        config,
    };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/feed/ws", get(feed::ws::feed_ws))
        .nest("/api/auth", auth::router())
        .nest("/api/posts", posts::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("shadowboard listening on port {port}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[debug_handler(state = AppState)]
async fn health(State(feed): State<Feed>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": db::rfc3339(db::now_millis()),
        "connectedUsers": feed.subscriber_count(),
    }))
}
