//! Block-shaped methods (spec §4.d): `eth_getBlockByNumber`,
//! `eth_getBlockByHash`, the block transaction/uncle count family.

use super::{param_bool, param_block_tag, param_hash, resolve_block_hash, BlockTag, HandlerContext};
use crate::codec::encode_hex_quantity;
use crate::errors::{AdapterError, AdapterResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use ethers::types::U256;
use serde_json::{json, Value};

/// resolves a client-supplied Ethereum-shaped block hash back to the real
/// Qtum hash `getblock` understands, via the Block-Hash Index (spec §4.g).
/// `None` means the adapter has never seen this hash before -- with no
/// persisted database this is always the case, matching the component's
/// "optional" framing.
async fn lookup_qtum_block_hash(ctx: &HandlerContext, hash: ethers::types::H256) -> AdapterResult<Option<String>> {
    ctx.blockhash_index.lookup_qtum_hash(hash).await
}

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder
        .register(Box::new(EthGetBlockByNumber))?
        .register(Box::new(EthGetBlockByHash))?
        .register(Box::new(EthGetBlockTransactionCountByHash))?
        .register(Box::new(EthGetBlockTransactionCountByNumber))?
        .register(Box::new(EthGetUncleCountByBlockHash))?
        .register(Box::new(EthGetUncleCountByBlockNumber))
}

const ZERO_HASH32: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
const ZERO_NONCE: &str = "0x0000000000000000";

/// `getblock <hash> 2` for full tx objects, `1` for just a `tx: [txid...]`
/// array -- the usual Qtum Core RPC verbosity levels.
async fn fetch_block(ctx: &HandlerContext, hash: &str, include_tx: bool) -> AdapterResult<Value> {
    let verbosity = if include_tx { 2 } else { 1 };
    ctx.upstream
        .cached_request(
            &ctx.cancel,
            "getblock",
            Value::Array(vec![Value::String(hash.to_string()), Value::from(verbosity)]),
        )
        .await
}

async fn shape_block(ctx: &HandlerContext, raw: &Value, include_tx: bool) -> AdapterResult<Value> {
    let hash = raw
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Internal("getblock result missing hash".into()))?;
    let height = raw.get("height").and_then(Value::as_u64).unwrap_or(0);
    let time = raw.get("time").and_then(Value::as_u64).unwrap_or(0);
    let weight = raw.get("weight").and_then(Value::as_u64).unwrap_or(0);
    let size = raw.get("size").and_then(Value::as_u64).unwrap_or(0);

    let eth_hash = ctx.blockhash_index.encode(hash, height).await?;
    let parent_hash = match raw.get("previousblockhash").and_then(Value::as_str) {
        Some(prev) => format!("{:#x}", ctx.blockhash_index.encode(prev, height.saturating_sub(1)).await?),
        None => ZERO_HASH32.to_string(),
    };

    let transactions = raw
        .get("tx")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|tx| {
            if include_tx {
                crate::handlers::transaction::shape_block_transaction(&tx, hash, height)
            } else {
                let txid = tx.as_str().map(str::to_string).or_else(|| {
                    tx.get("txid").and_then(Value::as_str).map(str::to_string)
                });
                Ok(Value::String(format!("0x{}", txid.unwrap_or_default())))
            }
        })
        .collect::<AdapterResult<Vec<Value>>>()?;

    Ok(json!({
        "hash": format!("{eth_hash:#x}"),
        "parentHash": parent_hash,
        "number": encode_hex_quantity(U256::from(height)),
        "timestamp": encode_hex_quantity(U256::from(time)),
        // synthesized: Qtum has no EVM gas ledger at the block level.
        "gasLimit": encode_hex_quantity(U256::from(weight) * U256::from(1000u64)),
        "gasUsed": encode_hex_quantity(U256::from(size) * U256::from(1000u64)),
        "transactions": transactions,
        "uncles": Value::Array(vec![]),
        "sealFields": Value::Array(vec![]),
        "mixHash": ZERO_HASH32,
        "nonce": ZERO_NONCE,
        "size": encode_hex_quantity(U256::from(size)),
        "difficulty": raw.get("difficulty").cloned().unwrap_or(Value::from(0)),
        "extraData": "0x",
        "logsBloom": format!("0x{}", "0".repeat(512)),
    }))
}

struct EthGetBlockByNumber;

#[async_trait]
impl MethodHandler for EthGetBlockByNumber {
    fn method(&self) -> &'static str {
        "eth_getBlockByNumber"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let tag = param_block_tag(req, 0, BlockTag::Latest)?;
        let include_tx = param_bool(req, 1, false)?;
        let hash = resolve_block_hash(ctx, &tag).await?;
        let raw = fetch_block(ctx, &hash, include_tx).await?;
        shape_block(ctx, &raw, include_tx).await
    }
}

struct EthGetBlockByHash;

#[async_trait]
impl MethodHandler for EthGetBlockByHash {
    fn method(&self) -> &'static str {
        "eth_getBlockByHash"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let hash = param_hash(req, 0)?;
        let include_tx = param_bool(req, 1, false)?;

        let Some(qtum_hash) = lookup_qtum_block_hash(ctx, hash).await? else {
            return Ok(Value::Null);
        };

        let raw = fetch_block(ctx, &qtum_hash, include_tx).await?;
        shape_block(ctx, &raw, include_tx).await
    }
}

struct EthGetBlockTransactionCountByHash;

#[async_trait]
impl MethodHandler for EthGetBlockTransactionCountByHash {
    fn method(&self) -> &'static str {
        "eth_getBlockTransactionCountByHash"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let hash = param_hash(req, 0)?;

        let Some(qtum_hash) = lookup_qtum_block_hash(ctx, hash).await? else {
            return Ok(Value::Null);
        };

        let raw = fetch_block(ctx, &qtum_hash, false).await?;
        Ok(tx_count(&raw))
    }
}

struct EthGetBlockTransactionCountByNumber;

#[async_trait]
impl MethodHandler for EthGetBlockTransactionCountByNumber {
    fn method(&self) -> &'static str {
        "eth_getBlockTransactionCountByNumber"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let tag = param_block_tag(req, 0, BlockTag::Latest)?;
        let hash = resolve_block_hash(ctx, &tag).await?;
        let raw = fetch_block(ctx, &hash, false).await?;
        Ok(tx_count(&raw))
    }
}

fn tx_count(raw: &Value) -> Value {
    let count = raw.get("tx").and_then(Value::as_array).map(|v| v.len()).unwrap_or(0);
    Value::String(encode_hex_quantity(U256::from(count as u64)))
}

struct EthGetUncleCountByBlockHash;

#[async_trait]
impl MethodHandler for EthGetUncleCountByBlockHash {
    fn method(&self) -> &'static str {
        "eth_getUncleCountByBlockHash"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String("0x0".to_string()))
    }
}

struct EthGetUncleCountByBlockNumber;

#[async_trait]
impl MethodHandler for EthGetUncleCountByBlockNumber {
    fn method(&self) -> &'static str {
        "eth_getUncleCountByBlockNumber"
    }

    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Ok(Value::String("0x0".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shape_block_without_tx_uses_txids() {
        let ctx = HandlerContext::for_test();
        let raw = json!({
            "hash": "aa".repeat(32),
            "height": 813,
            "time": 1_600_000_000u64,
            "weight": 4000,
            "size": 1000,
            "previousblockhash": "bb".repeat(32),
            "tx": ["cc".repeat(32)],
        });

        let shaped = shape_block(&ctx, &raw, false).await.unwrap();
        assert_eq!(shaped["number"], Value::String("0x32d".to_string()));
        assert_eq!(shaped["transactions"][0], Value::String(format!("0x{}", "cc".repeat(32))));
        assert_eq!(shaped["uncles"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn genesis_block_gets_zero_parent_hash() {
        let ctx = HandlerContext::for_test();
        let raw = json!({
            "hash": "aa".repeat(32),
            "height": 0,
            "time": 0,
            "weight": 0,
            "size": 0,
            "tx": [],
        });

        let shaped = shape_block(&ctx, &raw, false).await.unwrap();
        assert_eq!(shaped["parentHash"], Value::String(ZERO_HASH32.to_string()));
    }

    #[tokio::test]
    async fn shape_block_hash_round_trips_through_the_index() {
        let ctx = HandlerContext::for_test();
        let qtum_hash = "aa".repeat(32);
        let raw = json!({
            "hash": qtum_hash,
            "height": 5,
            "time": 0,
            "weight": 0,
            "size": 0,
            "tx": [],
        });

        let shaped = shape_block(&ctx, &raw, false).await.unwrap();
        let expected = crate::blockhash_index::BlockHashIndex::compute_eth_hash(&qtum_hash).unwrap();
        assert_eq!(shaped["hash"], Value::String(format!("{expected:#x}")));
    }

    #[tokio::test]
    async fn get_block_by_hash_returns_null_for_a_hash_never_seen_before() {
        // `on_the_fly` mode never persists a pair, so a client-supplied hash
        // can never be reversed back to a real Qtum hash.
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_getBlockByHash".into(),
            params: Some(Value::Array(vec![Value::String(format!("0x{}", "ff".repeat(32)))])),
        };

        let result = EthGetBlockByHash.invoke(&ctx, &req).await.unwrap();
        assert_eq!(result, Value::Null);
    }
}
