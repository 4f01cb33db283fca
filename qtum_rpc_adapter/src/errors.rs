//! Error taxonomy for the adapter.
//!
//! Mirrors the teacher's `Web3ProxyError` shape (a `derive_more` sum type with
//! an `as_response_parts`-style method mapping each variant to a JSON-RPC
//! error), but the variant set follows this adapter's own taxonomy (spec §7)
//! instead of the teacher's multi-tenant SaaS concerns (rate limiting,
//! billing, auth headers) which this adapter has no use for.

use crate::jsonrpc::{JsonRpcErrorData, JsonRpcId};
use derive_more::{Display, Error, From};
use serde_json::Value;
use std::borrow::Cow;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// JSON-RPC 2.0 reserved error codes, plus this adapter's application codes.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const SERVER_ERROR: i64 = -32000;
    pub const CANCELLED: i64 = -32001;
}

#[derive(Debug, Display, Error, From)]
pub enum AdapterError {
    /// malformed request body; never reaches a handler.
    #[display(fmt = "parse error: {_0}")]
    #[error(ignore)]
    #[from(ignore)]
    Parse(String),

    /// well-formed JSON, but not a valid JSON-RPC request envelope.
    #[display(fmt = "invalid request: {_0}")]
    #[error(ignore)]
    #[from(ignore)]
    InvalidRequest(String),

    /// `req.method` has no registered handler.
    #[display(fmt = "method not found: {_0}")]
    #[error(ignore)]
    #[from(ignore)]
    MethodNotFound(String),

    /// wrong arity, bad hex, out-of-range values, etc.
    #[display(fmt = "invalid params: {_0}")]
    #[error(ignore)]
    #[from(ignore)]
    InvalidParams(String),

    /// unexpected/unclassified upstream or internal failure.
    #[display(fmt = "internal error: {_0}")]
    #[error(ignore)]
    #[from(ignore)]
    Internal(String),

    /// an upstream error we recognise (spec §4.b known-error table), or one
    /// that survived retry exhaustion. Carries the original Qtum message.
    #[display(fmt = "{kind}: {message}")]
    #[error(ignore)]
    #[from(ignore)]
    KnownUpstream { kind: String, message: String },

    /// the governing deadline/cancellation signal fired.
    #[display(fmt = "request cancelled")]
    Cancelled,

    Http(reqwest::Error),
    Json(serde_json::Error),
    Database(sea_orm::DbErr),
    UrlParse(url::ParseError),

    #[display(fmt = "method {_0} is not supported by this adapter")]
    #[error(ignore)]
    #[from(ignore)]
    NotSupported(Cow<'static, str>),
}

impl AdapterError {
    pub fn code(&self) -> i64 {
        match self {
            AdapterError::Parse(_) => codes::PARSE_ERROR,
            AdapterError::InvalidRequest(_) => codes::INVALID_REQUEST,
            AdapterError::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            AdapterError::InvalidParams(_) => codes::INVALID_PARAMS,
            AdapterError::Cancelled => codes::CANCELLED,
            AdapterError::KnownUpstream { .. } => codes::SERVER_ERROR,
            AdapterError::NotSupported(_) => codes::SERVER_ERROR,
            AdapterError::Internal(_)
            | AdapterError::Http(_)
            | AdapterError::Json(_)
            | AdapterError::Database(_)
            | AdapterError::UrlParse(_) => codes::INTERNAL_ERROR,
        }
    }

    /// extra debugging context attached as `error.data` for internal errors;
    /// known/expected error kinds keep `data` empty to avoid leaking
    /// implementation detail to callers who can't act on it.
    pub fn data(&self) -> Option<Value> {
        match self {
            AdapterError::Internal(msg) => Some(Value::String(msg.clone())),
            AdapterError::Http(err) => Some(Value::String(err.to_string())),
            AdapterError::Json(err) => Some(Value::String(err.to_string())),
            AdapterError::Database(err) => Some(Value::String(err.to_string())),
            _ => None,
        }
    }

    pub fn to_error_data(&self) -> JsonRpcErrorData {
        JsonRpcErrorData {
            code: self.code(),
            message: self.to_string(),
            data: self.data(),
        }
    }

    pub fn into_response(self, id: JsonRpcId) -> crate::jsonrpc::JsonRpcForwardedResponse {
        crate::jsonrpc::JsonRpcForwardedResponse::from_error(self.to_error_data(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_upstream_carries_original_message() {
        let err = AdapterError::KnownUpstream {
            kind: "nonce reuse".into(),
            message: "nonce 5 already used".into(),
        };
        assert_eq!(err.code(), codes::SERVER_ERROR);
        assert!(err.to_string().contains("nonce 5 already used"));
    }

    #[test]
    fn method_not_found_matches_literal_scenario() {
        let err = AdapterError::MethodNotFound("eth_foo".into());
        assert_eq!(err.code(), codes::METHOD_NOT_FOUND);
        assert_eq!(err.to_string(), "method not found: eth_foo");
    }
}
