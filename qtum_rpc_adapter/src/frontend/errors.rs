//! Maps request-level and dispatch-level failures into axum responses.
//!
//! Per spec §7 ("every failure produces a standards-compliant JSON-RPC
//! error... never a bare HTTP 5xx except when the adapter itself is
//! unreachable"), a dispatch failure always rides back as HTTP 200 with a
//! JSON-RPC error body -- `AdapterError::into_response` (see `errors.rs`)
//! already does that conversion. This module only handles the one case
//! upstream of dispatch: a request body that never became a valid
//! `JsonRpcRequestEnum` in the first place.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::value::RawValue;

use crate::errors::AdapterError;
use crate::jsonrpc::{JsonRpcForwardedResponse, JsonRpcId};

fn null_id() -> JsonRpcId {
    RawValue::from_string("null".to_string()).expect("null is valid json")
}

/// a request body that failed to decode as a JSON-RPC envelope at all; there
/// is no request id to echo back since one was never successfully parsed.
pub fn rejection_into_response(rejection: JsonRejection) -> Response {
    let err = AdapterError::Parse(rejection.to_string());
    (StatusCode::OK, Json(err.into_response(null_id()))).into_response()
}

pub fn malformed_ws_message(message: &serde_json::Error) -> String {
    let err = AdapterError::Parse(message.to_string());
    serde_json::to_string(&err.into_response(null_id())).unwrap_or_else(|_| "{}".to_string())
}

pub async fn handler_404() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(JsonRpcForwardedResponse::from_error(
            AdapterError::InvalidRequest("no such endpoint".into()).to_error_data(),
            null_id(),
        )),
    )
        .into_response()
}
