//! Everything else (spec §4.d, §4.g): mining/uncle/compiler stubs that real
//! wallets still poll for, miner-control methods this adapter has no wallet
//! use for, and the admin/debug/shh/les/personal method families the
//! REDESIGN FLAGS call out as "blocked, not proxied" since this adapter has
//! no multi-tenant key custody or peer-admin surface to expose.

use super::HandlerContext;
use crate::errors::{AdapterError, AdapterResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use serde_json::{json, Value};

pub fn register_all(mut builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder = builder
        .register(Box::new(EthGetUncleByBlockHashAndIndex))?
        .register(Box::new(EthGetUncleByBlockNumberAndIndex))?
        .register(Box::new(EthGetCompilers))?
        .register(Box::new(EthProtocolVersion))?
        .register(Box::new(EthHashrate))?
        .register(Box::new(EthMining))?
        .register(Box::new(EthSyncing))?
        .register(Box::new(EthGetWork))?
        .register(Box::new(EthSubmitWork))?
        .register(Box::new(EthSubmitHashrate))?
        .register(Box::new(EthCoinbase))?;

    for method in BLOCKED_METHOD_FAMILIES {
        builder = builder.register(Box::new(BlockedMethod(method)))?;
    }

    Ok(builder)
}

struct EthGetUncleByBlockHashAndIndex;

#[async_trait]
impl MethodHandler for EthGetUncleByBlockHashAndIndex {
    fn method(&self) -> &'static str {
        "eth_getUncleByBlockHashAndIndex"
    }

    /// Qtum has no uncle blocks; every index is out of range.
    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::Null)
    }
}

struct EthGetUncleByBlockNumberAndIndex;

#[async_trait]
impl MethodHandler for EthGetUncleByBlockNumberAndIndex {
    fn method(&self) -> &'static str {
        "eth_getUncleByBlockNumberAndIndex"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::Null)
    }
}

struct EthGetCompilers;

#[async_trait]
impl MethodHandler for EthGetCompilers {
    fn method(&self) -> &'static str {
        "eth_getCompilers"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::Array(vec![]))
    }
}

struct EthProtocolVersion;

#[async_trait]
impl MethodHandler for EthProtocolVersion {
    fn method(&self) -> &'static str {
        "eth_protocolVersion"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String("0x41".to_string()))
    }
}

struct EthHashrate;

#[async_trait]
impl MethodHandler for EthHashrate {
    fn method(&self) -> &'static str {
        "eth_hashrate"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String("0x0".to_string()))
    }
}

struct EthMining;

#[async_trait]
impl MethodHandler for EthMining {
    fn method(&self) -> &'static str {
        "eth_mining"
    }

    /// Qtum is proof-of-stake; this adapter reports no active mining the
    /// way a PoW client's caller would expect to distinguish.
    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::Bool(false))
    }
}

struct EthSyncing;

#[async_trait]
impl MethodHandler for EthSyncing {
    fn method(&self) -> &'static str {
        "eth_syncing"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        let info = ctx.upstream.request(&ctx.cancel, "getblockchaininfo", Value::Array(vec![])).await?;

        let headers = info.get("headers").and_then(Value::as_u64).unwrap_or(0);
        let blocks = info.get("blocks").and_then(Value::as_u64).unwrap_or(0);

        if headers <= blocks {
            Ok(Value::Bool(false))
        } else {
            Ok(json!({
                "startingBlock": "0x0",
                "currentBlock": crate::codec::encode_hex_quantity(ethers::types::U256::from(blocks)),
                "highestBlock": crate::codec::encode_hex_quantity(ethers::types::U256::from(headers)),
            }))
        }
    }
}

struct EthGetWork;

#[async_trait]
impl MethodHandler for EthGetWork {
    fn method(&self) -> &'static str {
        "eth_getWork"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Err(AdapterError::NotSupported("eth_getWork".into()))
    }
}

struct EthSubmitWork;

#[async_trait]
impl MethodHandler for EthSubmitWork {
    fn method(&self) -> &'static str {
        "eth_submitWork"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Err(AdapterError::NotSupported("eth_submitWork".into()))
    }
}

struct EthSubmitHashrate;

#[async_trait]
impl MethodHandler for EthSubmitHashrate {
    fn method(&self) -> &'static str {
        "eth_submitHashrate"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Err(AdapterError::NotSupported("eth_submitHashrate".into()))
    }
}

struct EthCoinbase;

#[async_trait]
impl MethodHandler for EthCoinbase {
    fn method(&self) -> &'static str {
        "eth_coinbase"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        match ctx.config.accounts.first() {
            Some(addr) => Ok(Value::String(format!("{addr:#x}"))),
            None => Err(AdapterError::NotSupported("eth_coinbase".into())),
        }
    }
}

/// admin/debug/shh/les/miner/personal method families: this adapter has no
/// peer-admin, whisper, light-client, or local key-custody surface, so these
/// are blocked rather than silently proxied through to the Qtum node.
const BLOCKED_METHOD_FAMILIES: &[&str] = &[
    "admin_addPeer",
    "admin_peers",
    "admin_nodeInfo",
    "admin_datadir",
    "debug_traceTransaction",
    "debug_traceBlockByHash",
    "debug_traceBlockByNumber",
    "shh_version",
    "shh_post",
    "shh_newIdentity",
    "les_serverInfo",
    "miner_start",
    "miner_stop",
    "miner_setEtherbase",
    "personal_listAccounts",
    "personal_newAccount",
    "personal_unlockAccount",
    "personal_sendTransaction",
];

struct BlockedMethod(&'static str);

#[async_trait]
impl MethodHandler for BlockedMethod {
    fn method(&self) -> &'static str {
        self.0
    }

    async fn invoke(&self, _ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        Err(AdapterError::MethodNotFound(req.method.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mining_always_reports_false() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_mining".into(),
            params: None,
        };
        assert_eq!(EthMining.invoke(&ctx, &req).await.unwrap(), Value::Bool(false));
    }

    #[tokio::test]
    async fn blocked_admin_method_is_method_not_found() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "admin_peers".into(),
            params: None,
        };
        let err = BlockedMethod("admin_peers").invoke(&ctx, &req).await.unwrap_err();
        assert!(matches!(err, AdapterError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn coinbase_without_accounts_is_not_supported() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_coinbase".into(),
            params: None,
        };
        let err = EthCoinbase.invoke(&ctx, &req).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotSupported(_)));
    }
}
