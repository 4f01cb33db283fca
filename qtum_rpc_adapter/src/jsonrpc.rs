//! JSON-RPC 2.0 envelope types shared by the frontend, registry, and every
//! handler. Grounded on the teacher's `jsonrpc` module usage throughout
//! `app.rs`/`errors.rs` (`JsonRpcRequestEnum`, `JsonRpcForwardedResponse`,
//! `JsonRpcForwardedResponseEnum`), generalized from an Ethereum-upstream
//! proxy's envelope to this adapter's Qtum-upstream one.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

/// A request id, preserved verbatim (including its JSON type) per spec
/// invariant 6: "every response carries the exact request ID".
pub type JsonRpcId = Box<RawValue>;

fn null_id() -> JsonRpcId {
    RawValue::from_string("null".to_string()).expect("null is valid json")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default = "null_id")]
    pub id: JsonRpcId,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// the request's params as an array, or an empty one when omitted.
    pub fn params_array(&self) -> &[Value] {
        match &self.params {
            Some(Value::Array(arr)) => arr.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum JsonRpcRequestEnum {
    Batch(Vec<JsonRpcRequest>),
    Single(JsonRpcRequest),
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcForwardedResponse {
    pub jsonrpc: &'static str,
    pub id: JsonRpcId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
}

impl JsonRpcForwardedResponse {
    pub fn from_value(result: Value, id: JsonRpcId) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn from_error(error: JsonRpcErrorData, id: JsonRpcId) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonRpcForwardedResponseEnum {
    Single(JsonRpcForwardedResponse),
    Batch(Vec<JsonRpcForwardedResponse>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrips_string_and_number() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"x","method":"eth_blockNumber","params":[]}"#)
                .unwrap();
        let resp = JsonRpcForwardedResponse::from_value(Value::String("0x32d".into()), req.id.clone());
        let encoded = serde_json::to_value(&resp).unwrap();
        assert_eq!(encoded["id"], Value::String("x".into()));

        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"eth_chainId","params":[]}"#).unwrap();
        let resp = JsonRpcForwardedResponse::from_value(Value::String("0x22B9".into()), req.id.clone());
        let encoded = serde_json::to_value(&resp).unwrap();
        assert_eq!(encoded["id"], Value::Number(1.into()));
    }

    #[test]
    fn batch_decodes_as_batch_not_single() {
        let parsed: JsonRpcRequestEnum = serde_json::from_str(
            r#"[{"jsonrpc":"2.0","id":1,"method":"eth_chainId","params":[]},{"jsonrpc":"2.0","id":2,"method":"eth_blockNumber","params":[]}]"#,
        )
        .unwrap();

        match parsed {
            JsonRpcRequestEnum::Batch(reqs) => assert_eq!(reqs.len(), 2),
            JsonRpcRequestEnum::Single(_) => panic!("expected batch"),
        }
    }
}
