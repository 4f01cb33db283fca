//! The axum-facing edge: the JSON-RPC POST endpoint and the WebSocket
//! upgrade endpoint, plus the error types that turn a dispatch failure (or
//! a failure to even parse the request body) into an axum `Response`.

pub mod errors;
pub mod http_proxy;

use axum::routing::post;
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::AdapterState;

/// builds the adapter's router: a single path serving both JSON-RPC POSTs
/// and WebSocket upgrades, the way Ethereum JSON-RPC endpoints conventionally
/// overload one URL for both.
pub fn router(state: Arc<AdapterState>) -> Router {
    Router::new()
        .route("/", post(http_proxy::rpc_post).get(http_proxy::ws_upgrade))
        .fallback(errors::handler_404)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
