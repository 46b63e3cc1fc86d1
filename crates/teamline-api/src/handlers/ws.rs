//! WebSocket upgrade handler.
//!
//! Identity is resolved before the upgrade; registration and
//! personal-room join happen on connect, so a freshly upgraded socket is
//! immediately addressable by its user id.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use teamline_core::traits::identity::ResolvedIdentity;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Gateway-vetted identity token.
    pub token: String,
}

/// GET /ws?token={token} — WebSocket upgrade.
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let identity = state.identity.resolve(&query.token).await?;
    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, identity, socket)))
}

/// Pumps an established WebSocket connection.
async fn handle_ws_connection(state: AppState, identity: ResolvedIdentity, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let user_id = identity.user_id;
    let (handle, mut outbound_rx) = state.realtime.connect(identity);
    let conn_id = handle.id;

    info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection established");

    // Outbound forwarder: engine events → socket frames.
    let outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop: socket frames → engine.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.realtime.handle_inbound(&conn_id, &text).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.realtime.disconnect(&conn_id);

    info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection closed");
}
