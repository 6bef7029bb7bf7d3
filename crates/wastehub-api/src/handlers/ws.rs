//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use wastehub_auth::VerifiedSession;
use wastehub_realtime::connection::handle::SessionHandle;

use crate::error::ApiError;
use crate::extractors::ClientIp;
use crate::state::AppState;

/// Handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Session token.
    #[serde(default)]
    pub token: String,
    /// The user the token is claimed to belong to.
    #[serde(default, alias = "userId")]
    pub user_id: String,
}

/// GET /ws?token={jwt}&user_id={uuid}
///
/// The handshake is verified before the upgrade; a bad token never gets a
/// socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let session = state
        .realtime
        .gateway
        .authenticate(&query.token, &query.user_id)
        .await?;

    let max_frame = state.config.realtime.max_frame_bytes;
    Ok(ws
        .max_message_size(max_frame)
        .on_upgrade(move |socket| handle_ws_connection(state, session, client_ip, socket)))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(
    state: AppState,
    session: VerifiedSession,
    client_ip: String,
    socket: WebSocket,
) {
    let gateway = state.realtime.gateway.clone();
    let (handle, mut outbound_rx) = match gateway.register(&session, client_ip) {
        Ok(registered) => registered,
        Err(e) => {
            warn!(user_id = %session.user_id, error = %e, "WebSocket registration failed");
            return;
        }
    };
    let conn_id = handle.id;
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Spawn outbound frame forwarder; pending frames drain before the close.
    let closed = handle.closed_token();
    let outbound_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                frame = outbound_rx.recv() => match frame {
                    Some(frame) => {
                        if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = closed.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    read_inbound(&state, &handle, &mut ws_rx).await;

    // Cleanup
    gateway.unregister(&conn_id);
    if let Err(e) = outbound_task.await {
        debug!(conn_id = %conn_id, error = %e, "Outbound forwarder ended abnormally");
    }

    info!(
        conn_id = %conn_id,
        user_id = %session.user_id,
        "WebSocket connection closed"
    );
}

async fn read_inbound(
    state: &AppState,
    handle: &Arc<SessionHandle>,
    ws_rx: &mut futures::stream::SplitStream<WebSocket>,
) {
    let closed = handle.closed_token();
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            next = ws_rx.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = state.realtime.gateway.handle_inbound(handle, text.as_str()).await {
                        debug!(conn_id = %handle.id, error = %e, "Session lost while replying");
                        break;
                    }
                }
                Some(Ok(Message::Pong(_))) => handle.record_pong(),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %handle.id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }
}
