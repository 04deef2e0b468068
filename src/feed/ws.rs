use std::net::SocketAddr;

use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::{config::Config, privacy, AppState};

use super::Feed;

#[debug_handler(state = AppState)]
pub async fn feed_ws(
    State(feed): State<Feed>,
    State(config): State<Config>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // log a salted hash of the peer, never the address itself
    let viewer = privacy::hash_addr(&addr.ip().to_string(), &config.ip_salt);
    ws.on_upgrade(move |stream| handle(stream, feed, viewer))
}

async fn handle(stream: WebSocket, feed: Feed, viewer: String) {
    info!("viewer {viewer} joined the feed");

    let mut rx = feed.subscribe();
    let (mut sender, mut receiver) = stream.split();

    let push_viewer = viewer.clone();
    let push_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    // missed deltas are recovered by the next full fetch
                    debug!("viewer {push_viewer} lagged, skipped {missed} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // viewers never send anything meaningful; drain until they hang up
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    push_task.abort();
    info!("viewer {viewer} left the feed");
}
