//! Account-shaped methods (spec §4.d): "direct transcription of the
//! corresponding Qtum calls with unit/address conversions" --
//! `eth_getBalance`, `eth_getCode`, `eth_getStorageAt`,
//! `eth_getTransactionCount`.
//!
//! Qtum's contract VM keeps its own EVM-shaped account record reachable via
//! `getaccountinfo` (code, storage, nonce) alongside the UTXO wallet
//! balance reachable via the address index (`getaddressbalance`); this
//! module is a thin transcription layer over both.

use super::{param_address, param_hash, HandlerContext};
use crate::codec::{encode_hex_bytes, encode_hex_quantity, satoshi_to_wei};
use crate::errors::{AdapterError, AdapterResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use ethers::types::U256;
use serde_json::{json, Value};

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder
        .register(Box::new(EthGetBalance))?
        .register(Box::new(EthGetCode))?
        .register(Box::new(EthGetStorageAt))?
        .register(Box::new(EthGetTransactionCount))
}

/// `getaccountinfo` result for an address that has never called/created a
/// contract is an upstream error; callers see this as "no EVM account yet"
/// rather than a transport failure, so the zero value is the correct answer.
async fn account_info(ctx: &HandlerContext, qtum_address: &str) -> AdapterResult<Option<Value>> {
    match ctx
        .upstream
        .request(&ctx.cancel, "getaccountinfo", Value::Array(vec![Value::String(qtum_address.to_string())]))
        .await
    {
        Ok(info) => Ok(Some(info)),
        Err(AdapterError::KnownUpstream { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

struct EthGetBalance;

#[async_trait]
impl MethodHandler for EthGetBalance {
    fn method(&self) -> &'static str {
        "eth_getBalance"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let addr = param_address(req, 0)?;
        let qtum_address = crate::codec::encode_address_to_qtum(addr, ctx.config.network);

        let result = ctx
            .upstream
            .request(
                &ctx.cancel,
                "getaddressbalance",
                json!([{ "addresses": [qtum_address] }]),
            )
            .await?;

        let satoshi = result
            .get("balance")
            .and_then(Value::as_u64)
            .ok_or_else(|| AdapterError::Internal("getaddressbalance missing balance".into()))?;

        Ok(Value::String(encode_hex_quantity(satoshi_to_wei(U256::from(satoshi)))))
    }
}

struct EthGetCode;

#[async_trait]
impl MethodHandler for EthGetCode {
    fn method(&self) -> &'static str {
        "eth_getCode"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let addr = param_address(req, 0)?;
        let qtum_address = crate::codec::encode_address_to_qtum(addr, ctx.config.network);

        match account_info(ctx, &qtum_address).await? {
            Some(info) => {
                let code = info.get("code").and_then(Value::as_str).unwrap_or("");
                Ok(Value::String(format!("0x{code}")))
            }
            None => Ok(Value::String("0x".to_string())),
        }
    }
}

struct EthGetStorageAt;

#[async_trait]
impl MethodHandler for EthGetStorageAt {
    fn method(&self) -> &'static str {
        "eth_getStorageAt"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let addr = param_address(req, 0)?;
        let position = param_hash(req, 1)?;
        let qtum_address = crate::codec::encode_address_to_qtum(addr, ctx.config.network);

        let zero = || Value::String(encode_hex_bytes(&[0u8; 32]));

        match account_info(ctx, &qtum_address).await? {
            Some(info) => {
                let key = format!("{position:#x}").trim_start_matches("0x").to_string();
                let value = info
                    .get("storage")
                    .and_then(|storage| storage.get(&qtum_address))
                    .and_then(|by_key| by_key.get(&key))
                    .and_then(|entry| entry.get("value"))
                    .and_then(Value::as_str);

                match value {
                    Some(v) => Ok(Value::String(format!("0x{v}"))),
                    None => Ok(zero()),
                }
            }
            None => Ok(zero()),
        }
    }
}

struct EthGetTransactionCount;

#[async_trait]
impl MethodHandler for EthGetTransactionCount {
    fn method(&self) -> &'static str {
        "eth_getTransactionCount"
    }

    /// Qtum's UTXO model has no Ethereum-style per-sender nonce; the
    /// closest analogue is the contract-VM's own call-nonce tracked in
    /// `getaccountinfo`, which is what this returns. Addresses that have
    /// never made a contract call report `0x0`.
    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let addr = param_address(req, 0)?;
        let qtum_address = crate::codec::encode_address_to_qtum(addr, ctx.config.network);

        match account_info(ctx, &qtum_address).await? {
            Some(info) => {
                let nonce = info.get("nonce").and_then(Value::as_u64).unwrap_or(0);
                Ok(Value::String(encode_hex_quantity(U256::from(nonce))))
            }
            None => Ok(Value::String("0x0".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::JsonRpcId;
    use serde_json::value::RawValue;

    fn req(method: &str, params: Vec<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: RawValue::from_string("1".into()).unwrap() as JsonRpcId,
            method: method.to_string(),
            params: Some(Value::Array(params)),
        }
    }

    #[tokio::test]
    async fn get_balance_requires_an_address_argument() {
        let ctx = HandlerContext::for_test();
        let err = EthGetBalance.invoke(&ctx, &req("eth_getBalance", vec![])).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn get_storage_at_requires_two_arguments() {
        let ctx = HandlerContext::for_test();
        let err = EthGetStorageAt
            .invoke(&ctx, &req("eth_getStorageAt", vec![Value::String(format!("{:#x}", ethers::types::H160::zero()))]))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams(_)));
    }
}
