//! WebSocket subscriptions (spec §4.f): `eth_subscribe`/`eth_unsubscribe`.
//! Both require an open session (`ctx.session_id`); calling them over plain
//! HTTP POST is a request error, not an upstream one.

use super::HandlerContext;
use crate::codec::{decode_hex_quantity, encode_hex_quantity};
use crate::errors::{AdapterError, AdapterResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use crate::subscriptions::SubscriptionKind;
use async_trait::async_trait;
use ethers::types::{H160, H256};
use serde_json::Value;

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder.register(Box::new(EthSubscribe))?.register(Box::new(EthUnsubscribe))
}

fn require_session(ctx: &HandlerContext) -> AdapterResult<uuid::Uuid> {
    ctx.session_id
        .ok_or_else(|| AdapterError::InvalidRequest("subscriptions require an open WebSocket session".into()))
}

fn parse_subscription_kind(req: &JsonRpcRequest) -> AdapterResult<SubscriptionKind> {
    let name = super::param_str(req, 0)?;

    match name {
        "newHeads" => Ok(SubscriptionKind::NewHeads),
        "newPendingTransactions" => Ok(SubscriptionKind::NewPendingTransactions),
        "syncing" => Ok(SubscriptionKind::Syncing),
        "logs" => {
            let filter = req.params_array().get(1);

            let addresses: Vec<H160> = match filter.and_then(|f| f.get("address")) {
                None | Some(Value::Null) => vec![],
                Some(Value::String(s)) => vec![s
                    .parse()
                    .map_err(|err| AdapterError::InvalidParams(format!("bad address {s}: {err}")))?],
                Some(Value::Array(arr)) => arr
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.parse::<H160>())
                    .collect::<Result<_, _>>()
                    .map_err(|err| AdapterError::InvalidParams(format!("bad address in array: {err}")))?,
                _ => return Err(AdapterError::InvalidParams("address must be a string or array".into())),
            };

            let topics: Vec<Option<Vec<H256>>> = match filter.and_then(|f| f.get("topics")) {
                None | Some(Value::Null) => vec![],
                Some(Value::Array(entries)) => entries
                    .iter()
                    .map(|entry| match entry {
                        Value::Null => Ok(None),
                        Value::String(s) => Ok(Some(vec![s
                            .parse::<H256>()
                            .map_err(|err| AdapterError::InvalidParams(format!("bad topic {s}: {err}")))?])),
                        Value::Array(opts) => Ok(Some(
                            opts.iter()
                                .filter_map(Value::as_str)
                                .map(|s| s.parse::<H256>())
                                .collect::<Result<_, _>>()
                                .map_err(|err| AdapterError::InvalidParams(format!("bad topic in array: {err}")))?,
                        )),
                        _ => Ok(None),
                    })
                    .collect::<AdapterResult<_>>()?,
                _ => return Err(AdapterError::InvalidParams("topics must be an array".into())),
            };

            Ok(SubscriptionKind::Logs { addresses, topics })
        }
        other => Err(AdapterError::InvalidParams(format!("unknown subscription kind {other}"))),
    }
}

struct EthSubscribe;

#[async_trait]
impl MethodHandler for EthSubscribe {
    fn method(&self) -> &'static str {
        "eth_subscribe"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let session_id = require_session(ctx)?;
        let kind = parse_subscription_kind(req)?;

        let id = ctx
            .subscriptions
            .subscribe(session_id, kind)
            .ok_or_else(|| AdapterError::Internal("subscription session vanished mid-request".into()))?;

        Ok(Value::String(encode_hex_quantity(id)))
    }
}

struct EthUnsubscribe;

#[async_trait]
impl MethodHandler for EthUnsubscribe {
    fn method(&self) -> &'static str {
        "eth_unsubscribe"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let session_id = require_session(ctx)?;
        let id = decode_hex_quantity(super::param_str(req, 0)?)?;
        Ok(Value::Bool(ctx.subscriptions.unsubscribe(session_id, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_without_session_is_invalid_request() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_subscribe".into(),
            params: Some(Value::Array(vec![Value::String("newHeads".into())])),
        };

        let err = EthSubscribe.invoke(&ctx, &req).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unsubscribe_without_session_is_invalid_request() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_unsubscribe".into(),
            params: Some(Value::Array(vec![Value::String("0x1".into())])),
        };

        let err = EthUnsubscribe.invoke(&ctx, &req).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidRequest(_)));
    }
}
