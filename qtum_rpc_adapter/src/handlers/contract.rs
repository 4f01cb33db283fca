//! Contract-call methods (spec §4.d): `eth_call` and `eth_estimateGas`,
//! both backed by Qtum's `callcontract`.

use super::HandlerContext;
use crate::codec::encode_hex_quantity;
use crate::errors::{AdapterError, AdapterResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use ethers::types::U256;
use serde_json::{json, Value};

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder.register(Box::new(EthCall))?.register(Box::new(EthEstimateGas))
}

/// a fixed floor for calls that don't touch the VM (plain transfers), since
/// `callcontract` only reports gas for a real contract invocation.
const PLAIN_TRANSFER_GAS: u64 = 21_000;

async fn call_contract(ctx: &HandlerContext, call: &super::transaction::CallRequest) -> AdapterResult<Value> {
    let to = call
        .to
        .ok_or_else(|| AdapterError::InvalidParams("eth_call/eth_estimateGas requires a to address".into()))?;
    let to_qtum = crate::codec::encode_address_to_qtum(to, ctx.config.network);

    let data = call.data.clone().unwrap_or_default();

    let mut params = vec![Value::String(to_qtum), Value::String(data)];
    if let Some(from) = call.from {
        params.push(Value::String(crate::codec::encode_address_to_qtum(from, ctx.config.network)));
    }

    ctx.upstream.request(&ctx.cancel, "callcontract", Value::Array(params)).await
}

struct EthCall;

#[async_trait]
impl MethodHandler for EthCall {
    fn method(&self) -> &'static str {
        "eth_call"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let call = super::transaction::parse_call_request(super::param(req, 0)?)?;

        if call.data.as_deref().unwrap_or("").is_empty() {
            // no call data: nothing for the VM to execute, mirror the usual
            // empty-return convention for a plain value transfer.
            return Ok(Value::String("0x".to_string()));
        }

        let result = call_contract(ctx, &call).await?;
        let output = result
            .get("executionResult")
            .and_then(|er| er.get("output"))
            .and_then(Value::as_str)
            .unwrap_or("");

        Ok(Value::String(format!("0x{output}")))
    }
}

struct EthEstimateGas;

#[async_trait]
impl MethodHandler for EthEstimateGas {
    fn method(&self) -> &'static str {
        "eth_estimateGas"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let call = super::transaction::parse_call_request(super::param(req, 0)?)?;

        if call.data.as_deref().unwrap_or("").is_empty() {
            return Ok(Value::String(encode_hex_quantity(U256::from(PLAIN_TRANSFER_GAS))));
        }

        let result = call_contract(ctx, &call).await?;
        let gas_used = result
            .get("executionResult")
            .and_then(|er| er.get("gasUsed"))
            .and_then(Value::as_u64)
            .unwrap_or(PLAIN_TRANSFER_GAS);

        Ok(Value::String(encode_hex_quantity(U256::from(gas_used))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_without_data_returns_empty_bytes() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_call".into(),
            params: Some(Value::Array(vec![json!({ "to": format!("{:#x}", ethers::types::H160::zero()) })])),
        };

        let result = EthCall.invoke(&ctx, &req).await.unwrap();
        assert_eq!(result, Value::String("0x".to_string()));
    }

    #[tokio::test]
    async fn estimate_gas_without_data_uses_plain_transfer_floor() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_estimateGas".into(),
            params: Some(Value::Array(vec![json!({ "to": format!("{:#x}", ethers::types::H160::zero()) })])),
        };

        let result = EthEstimateGas.invoke(&ctx, &req).await.unwrap();
        assert_eq!(result, Value::String(encode_hex_quantity(U256::from(PLAIN_TRANSFER_GAS))));
    }

    #[tokio::test]
    async fn call_requires_a_to_address() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_call".into(),
            params: Some(Value::Array(vec![json!({ "data": "0x60fe47b1" })])),
        };

        let err = EthCall.invoke(&ctx, &req).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams(_)));
    }
}
