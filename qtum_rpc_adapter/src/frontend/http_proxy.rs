//! The two entry points callers actually hit: a POST handler serving plain
//! JSON-RPC (single or batch), and a WebSocket upgrade handler serving the
//! same dispatch plus push subscriptions.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::WebSocketUpgrade;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};
use uuid::Uuid;

use super::errors::{malformed_ws_message, rejection_into_response};
use crate::app::AdapterState;
use crate::jsonrpc::JsonRpcRequestEnum;

/// plain HTTP JSON-RPC: one POST body, one response body, no push events.
pub async fn rpc_post(
    Extension(state): Extension<Arc<AdapterState>>,
    payload: Result<Json<JsonRpcRequestEnum>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejection_into_response(rejection),
    };

    let response = state.serve(payload, CancellationToken::new(), None).await;
    Json(response).into_response()
}

/// the same dispatch, upgraded to a WebSocket so `eth_subscribe` has
/// somewhere to push notifications.
pub async fn ws_upgrade(Extension(state): Extension<Arc<AdapterState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

async fn handle_session(socket: WebSocket, state: Arc<AdapterState>) {
    let (session_id, mailbox) = state.subscriptions.register_session();
    let (mut sink, mut stream) = socket.split();
    let mut mailbox = mailbox.into_stream();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_message(&state, &text, session_id).await;
                        if sink.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(%err, "websocket receive error");
                        break;
                    }
                }
            }
            published = mailbox.next() => {
                match published {
                    Some(value) => {
                        if sink.send(Message::Text(value.to_string())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.subscriptions.close_session(session_id);
    trace!(%session_id, "websocket session closed");
}

async fn handle_message(state: &Arc<AdapterState>, text: &str, session_id: Uuid) -> String {
    let payload: JsonRpcRequestEnum = match serde_json::from_str(text) {
        Ok(payload) => payload,
        Err(err) => return malformed_ws_message(&err),
    };

    let response = state.serve(payload, CancellationToken::new(), Some(session_id)).await;
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}
