//! `WebSocket` transport for generation control and candidate streaming.
//!
//! Clients connect to `GET /ws`. The socket task forwards the peer's
//! outbound queue to the socket and feeds inbound text frames to the
//! [`Coordinator`](crate::coordinator::Coordinator). When either side goes
//! away the task ends and the connection's state is torn down.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use election_types::ClientMessage;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Run one connection until the client leaves, a send fails, or the
/// server closes the peer's queue.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let coordinator = &state.coordinator;
    let (id, mut rx) = coordinator.connect();

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(frame) = outbound else {
                    debug!(connection = %id, "outbound queue closed, closing socket");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let json = match serde_json::to_string(&frame) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!(connection = %id, event = frame.event_name(), "failed to serialize frame: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(connection = %id, "send failed, dropping connection");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match ClientMessage::parse(text.as_str()) {
                        Ok(message) => coordinator.handle(id, message).await,
                        Err(e) => debug!(connection = %id, "ignoring frame: {e}"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(connection = %id, "pong failed, dropping connection");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(connection = %id, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(Message::Binary(_) | Message::Pong(_))) => {}
                }
            }
        }
    }

    coordinator.disconnect(id).await;
}
