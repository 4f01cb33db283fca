//! Static/trivial chain-identity methods and the gas-price family (spec
//! §4.d: `eth_chainId`, `eth_blockNumber`, `net_*`, `web3_*`, `eth_gasPrice`,
//! `eth_maxPriorityFeePerGas`, `eth_feeHistory`, `eth_accounts`).

use super::HandlerContext;
use crate::codec::encode_hex_quantity;
use crate::errors::AdapterResult;
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use ethers::types::U256;
use ethers::utils::keccak256;
use serde_json::{json, Value};

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder
        .register(Box::new(EthChainId))?
        .register(Box::new(EthBlockNumber))?
        .register(Box::new(NetVersion))?
        .register(Box::new(NetListening))?
        .register(Box::new(NetPeerCount))?
        .register(Box::new(Web3ClientVersion))?
        .register(Box::new(Web3Sha3))?
        .register(Box::new(EthGasPrice))?
        .register(Box::new(EthMaxPriorityFeePerGas))?
        .register(Box::new(EthFeeHistory))?
        .register(Box::new(EthAccounts))
}

struct EthChainId;

#[async_trait]
impl MethodHandler for EthChainId {
    fn method(&self) -> &'static str {
        "eth_chainId"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String(encode_hex_quantity(ctx.config.chain_id)))
    }
}

struct EthBlockNumber;

#[async_trait]
impl MethodHandler for EthBlockNumber {
    fn method(&self) -> &'static str {
        "eth_blockNumber"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        let count = ctx
            .upstream
            .request(&ctx.cancel, "getblockcount", Value::Array(vec![]))
            .await?;
        let height = count
            .as_u64()
            .ok_or_else(|| crate::errors::AdapterError::Internal("getblockcount did not return an integer".into()))?;
        Ok(Value::String(encode_hex_quantity(U256::from(height))))
    }
}

struct NetVersion;

#[async_trait]
impl MethodHandler for NetVersion {
    fn method(&self) -> &'static str {
        "net_version"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String(ctx.config.chain_id.to_string()))
    }
}

struct NetListening;

#[async_trait]
impl MethodHandler for NetListening {
    fn method(&self) -> &'static str {
        "net_listening"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::Bool(true))
    }
}

struct NetPeerCount;

#[async_trait]
impl MethodHandler for NetPeerCount {
    fn method(&self) -> &'static str {
        "net_peerCount"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        let count = ctx
            .upstream
            .request(&ctx.cancel, "getconnectioncount", Value::Array(vec![]))
            .await?;
        let n = count
            .as_u64()
            .ok_or_else(|| crate::errors::AdapterError::Internal("getconnectioncount did not return an integer".into()))?;
        Ok(Value::String(encode_hex_quantity(U256::from(n))))
    }
}

struct Web3ClientVersion;

#[async_trait]
impl MethodHandler for Web3ClientVersion {
    fn method(&self) -> &'static str {
        "web3_clientVersion"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String(format!("qtum-rpc-adapter/{}", env!("CARGO_PKG_VERSION"))))
    }
}

struct Web3Sha3;

#[async_trait]
impl MethodHandler for Web3Sha3 {
    fn method(&self) -> &'static str {
        "web3_sha3"
    }

    async fn invoke(&self, _ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let input = crate::codec::decode_hex_bytes(super::param_str(req, 0)?)?;
        Ok(Value::String(crate::codec::encode_hex_bytes(&keccak256(input))))
    }
}

struct EthGasPrice;

#[async_trait]
impl MethodHandler for EthGasPrice {
    fn method(&self) -> &'static str {
        "eth_gasPrice"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String(encode_hex_quantity(ctx.config.gas_price_wei)))
    }
}

struct EthMaxPriorityFeePerGas;

#[async_trait]
impl MethodHandler for EthMaxPriorityFeePerGas {
    fn method(&self) -> &'static str {
        "eth_maxPriorityFeePerGas"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String("0x0".to_string()))
    }
}

struct EthFeeHistory;

#[async_trait]
impl MethodHandler for EthFeeHistory {
    fn method(&self) -> &'static str {
        "eth_feeHistory"
    }

    /// Qtum has no EIP-1559 fee market; synthesize a flat history at the
    /// configured gas price so EIP-1559-aware tooling doesn't choke.
    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let block_count = super::u256_param(req, 0)?.as_u64().min(1024).max(1);
        let newest = super::param_block_tag(req, 1, super::BlockTag::Latest)?;
        let newest_height = super::resolve_block_height(ctx, &newest).await?;

        let oldest = newest_height.saturating_sub(block_count - 1);
        let base_fee = encode_hex_quantity(ctx.config.gas_price_wei);

        Ok(json!({
            "oldestBlock": encode_hex_quantity(U256::from(oldest)),
            "baseFeePerGas": vec![base_fee; (block_count + 1) as usize],
            "gasUsedRatio": vec![0.5f64; block_count as usize],
        }))
    }
}

struct EthAccounts;

#[async_trait]
impl MethodHandler for EthAccounts {
    fn method(&self) -> &'static str {
        "eth_accounts"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        let accounts: Vec<Value> = ctx
            .config
            .accounts
            .iter()
            .map(|addr| Value::String(format!("{addr:#x}")))
            .collect();
        Ok(Value::Array(accounts))
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
    async fn chain_id_matches_literal_scenario() {
        let ctx = HandlerContext::for_test();
        let result = EthChainId.invoke(&ctx, &req("eth_chainId", vec![])).await.unwrap();
        assert_eq!(result, Value::String("0x22b9".to_string()));
    }

    #[tokio::test]
    async fn web3_client_version_contains_package_name() {
        let ctx = HandlerContext::for_test();
        let result = Web3ClientVersion.invoke(&ctx, &req("web3_clientVersion", vec![])).await.unwrap();
        assert!(result.as_str().unwrap().starts_with("qtum-rpc-adapter/"));
    }

    #[tokio::test]
    async fn net_listening_is_always_true() {
        let ctx = HandlerContext::for_test();
        let result = NetListening.invoke(&ctx, &req("net_listening", vec![])).await.unwrap();
        assert_eq!(result, Value::Bool(true));
    }
}
