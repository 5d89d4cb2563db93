//! Live notification stream.
//!
//! `GET /ws?token=<jwt>` upgrades to a WebSocket that receives every
//! notification addressed to the token's user as a JSON text frame. Inbound
//! frames other than close are ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::auth::AuthError;
use crate::notifications::LiveNotification;
use super::{ApiError, ApiQuery, AppState};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    token: Option<String>,
}

pub async fn connect(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let token = params.token.ok_or(AuthError::NotAuthorized)?;
    let user = state.auth.authenticate(&token).await?;
    // Subscribe before the upgrade so nothing sent during the handshake is lost.
    let live = state.notifier.subscribe();
    Ok(ws.on_upgrade(move |socket| session(socket, live, user.id)))
}

async fn session(socket: WebSocket, mut live: broadcast::Receiver<LiveNotification>, user_id: String) {
    debug!(user_id = %user_id, "WebSocket client connected");
    let (mut sender, mut receiver) = socket.split();

    let forward_user = user_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match live.recv().await {
                Ok(event) if event.recipient == forward_user => {
                    let json = match serde_json::to_string(&event.notification) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to serialize notification: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => debug!("WebSocket client lagged by {} notifications", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!(user_id = %user_id, "WebSocket client disconnected");
}
