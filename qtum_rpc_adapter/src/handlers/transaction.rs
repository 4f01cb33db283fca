//! Transaction-shaped methods: `eth_getTransactionByHash` and
//! its block-relative siblings, `eth_getTransactionReceipt`,
//! `eth_sendTransaction`, `eth_sendRawTransaction`, `eth_signTransaction`,
//! `eth_sign`.

use super::{param_address, param_hash, param_str, resolve_block_hash, BlockTag, HandlerContext};
use crate::codec::{decode_hex_quantity, encode_hex_bytes, encode_hex_quantity, satoshi_to_wei, wei_to_satoshi};
use crate::errors::{AdapterError, AdapterResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use ethers::types::{H160, U256};
use serde_json::{json, Value};

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder
        .register(Box::new(EthGetTransactionByHash))?
        .register(Box::new(EthGetTransactionByBlockHashAndIndex))?
        .register(Box::new(EthGetTransactionByBlockNumberAndIndex))?
        .register(Box::new(EthGetTransactionReceipt))?
        .register(Box::new(EthSendTransaction))?
        .register(Box::new(EthSendRawTransaction))?
        .register(Box::new(EthSignTransaction))?
        .register(Box::new(EthSign))
}

/// `r`/`s` are encoded as big-integer hex quantities (like `v`), not
/// fixed-width byte strings -- zero is `0x0`, matching `encode_hex_quantity`.
const ZERO_SIG: &str = "0x0";

/// shapes one `getblock ... 2` entry (a fully-expanded transaction, as found
/// embedded in a block's `tx` array) into the Ethereum transaction object.
/// Shared with `handlers::block` so a block fetched with `includeTx=true`
/// renders the same transaction shape this module returns standalone.
pub(crate) fn shape_block_transaction(tx: &Value, block_hash: &str, block_height: u64) -> AdapterResult<Value> {
    let txid = tx
        .get("txid")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Internal("block transaction missing txid".into()))?;

    let tx_index = tx.get("n").and_then(Value::as_u64).unwrap_or(0);

    let (to, value_satoshi, input) = extract_contract_call(tx);
    let from = extract_sender(tx);
    let eth_block_hash = crate::blockhash_index::BlockHashIndex::compute_eth_hash(block_hash)?;

    Ok(json!({
        "hash": format!("0x{txid}"),
        "nonce": "0x0",
        "blockHash": format!("{eth_block_hash:#x}"),
        "blockNumber": encode_hex_quantity(U256::from(block_height)),
        "transactionIndex": encode_hex_quantity(U256::from(tx_index)),
        "from": format!("{from:#x}"),
        "to": to.map(|addr| format!("{addr:#x}")),
        "value": encode_hex_quantity(satoshi_to_wei(U256::from(value_satoshi))),
        "gas": "0x0",
        "gasPrice": "0x0",
        "input": input,
        "v": "0x0",
        "r": ZERO_SIG,
        "s": ZERO_SIG,
    }))
}

/// a Qtum transaction's `vout` entries carry either a plain value transfer
/// or a contract call/creation (`scriptPubKey.type` is `call`/`create`,
/// `scriptPubKey.hex` embeds the ABI-encoded call data after the OP_CALL
/// pushes). We take the first contract-shaped vout, if any.
fn extract_contract_call(tx: &Value) -> (Option<H160>, u64, String) {
    let vouts = tx.get("vout").and_then(Value::as_array).cloned().unwrap_or_default();

    for vout in &vouts {
        let script = vout.get("scriptPubKey").unwrap_or(&Value::Null);
        let kind = script.get("type").and_then(Value::as_str).unwrap_or("");

        if kind == "call" || kind == "create" {
            let to = script
                .get("addresses")
                .and_then(Value::as_array)
                .and_then(|a| a.first())
                .and_then(Value::as_str)
                .and_then(|a| a.parse::<H160>().ok());

            let value_satoshi = (vout.get("value").and_then(Value::as_f64).unwrap_or(0.0) * 1e8).round() as u64;

            let data = script
                .get("hex")
                .and_then(Value::as_str)
                .map(|h| format!("0x{h}"))
                .unwrap_or_else(|| "0x".to_string());

            return (to, value_satoshi, data);
        }
    }

    // plain value transfer: "to" is the first non-change output address.
    let to = vouts
        .iter()
        .find_map(|v| v.get("scriptPubKey")?.get("addresses")?.as_array()?.first()?.as_str())
        .and_then(|a| a.parse::<H160>().ok());

    let value_satoshi = vouts
        .iter()
        .filter_map(|v| v.get("value").and_then(Value::as_f64))
        .map(|v| (v * 1e8).round() as u64)
        .sum();

    (to, value_satoshi, "0x".to_string())
}

/// Qtum's `getrawtransaction ... true` output does not name the sender the
/// way Ethereum does (UTXO inputs reference prior outputs, not addresses);
/// lacking a full input-resolution pass this returns the zero address, the
/// same fallback used for `eth_coinbase` and other addresses Qtum has no
/// direct analogue for.
fn extract_sender(_tx: &Value) -> H160 {
    H160::zero()
}

async fn fetch_raw_transaction(ctx: &HandlerContext, txid: &str) -> AdapterResult<Value> {
    ctx.upstream
        .cached_request(
            &ctx.cancel,
            "getrawtransaction",
            Value::Array(vec![Value::String(txid.to_string()), Value::Bool(true)]),
        )
        .await
}

fn shape_standalone_transaction(raw: &Value) -> AdapterResult<Value> {
    let txid = raw
        .get("txid")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Internal("getrawtransaction missing txid".into()))?;

    let block_hash = raw.get("blockhash").and_then(Value::as_str);
    let eth_block_hash = block_hash
        .map(crate::blockhash_index::BlockHashIndex::compute_eth_hash)
        .transpose()?;
    let (to, value_satoshi, input) = extract_contract_call(raw);
    let from = extract_sender(raw);

    Ok(json!({
        "hash": format!("0x{txid}"),
        "nonce": "0x0",
        "blockHash": eth_block_hash.map(|h| format!("{h:#x}")),
        "blockNumber": Value::Null,
        "transactionIndex": Value::Null,
        "from": format!("{from:#x}"),
        "to": to.map(|addr| format!("{addr:#x}")),
        "value": encode_hex_quantity(satoshi_to_wei(U256::from(value_satoshi))),
        "gas": "0x0",
        "gasPrice": "0x0",
        "input": input,
        "v": "0x0",
        "r": ZERO_SIG,
        "s": ZERO_SIG,
    }))
}

struct EthGetTransactionByHash;

#[async_trait]
impl MethodHandler for EthGetTransactionByHash {
    fn method(&self) -> &'static str {
        "eth_getTransactionByHash"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let hash = param_hash(req, 0)?;
        let txid = format!("{hash:#x}").trim_start_matches("0x").to_string();
        let raw = fetch_raw_transaction(ctx, &txid).await?;
        shape_standalone_transaction(&raw)
    }
}

async fn fetch_transaction_by_index(ctx: &HandlerContext, block_hash: &str, index: u64) -> AdapterResult<Value> {
    let block = ctx
        .upstream
        .cached_request(
            &ctx.cancel,
            "getblock",
            Value::Array(vec![Value::String(block_hash.to_string()), Value::from(2)]),
        )
        .await?;

    let height = block.get("height").and_then(Value::as_u64).unwrap_or(0);
    let tx = block
        .get("tx")
        .and_then(Value::as_array)
        .and_then(|txs| txs.get(index as usize))
        .ok_or_else(|| AdapterError::InvalidParams(format!("no transaction at index {index}")))?;

    super::transaction::shape_block_transaction(tx, block_hash, height)
}

struct EthGetTransactionByBlockHashAndIndex;

#[async_trait]
impl MethodHandler for EthGetTransactionByBlockHashAndIndex {
    fn method(&self) -> &'static str {
        "eth_getTransactionByBlockHashAndIndex"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let hash = param_hash(req, 0)?;
        let index = decode_hex_quantity(param_str(req, 1)?)?.as_u64();

        let Some(block_hash) = ctx.blockhash_index.lookup_qtum_hash(hash).await? else {
            return Ok(Value::Null);
        };

        fetch_transaction_by_index(ctx, &block_hash, index).await
    }
}

struct EthGetTransactionByBlockNumberAndIndex;

#[async_trait]
impl MethodHandler for EthGetTransactionByBlockNumberAndIndex {
    fn method(&self) -> &'static str {
        "eth_getTransactionByBlockNumberAndIndex"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let tag = super::param_block_tag(req, 0, BlockTag::Latest)?;
        let index = decode_hex_quantity(param_str(req, 1)?)?.as_u64();
        let block_hash = resolve_block_hash(ctx, &tag).await?;
        fetch_transaction_by_index(ctx, &block_hash, index).await
    }
}

struct EthGetTransactionReceipt;

#[async_trait]
impl MethodHandler for EthGetTransactionReceipt {
    fn method(&self) -> &'static str {
        "eth_getTransactionReceipt"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let hash = param_hash(req, 0)?;
        let txid = format!("{hash:#x}").trim_start_matches("0x").to_string();

        match ctx
            .upstream
            .cached_request(&ctx.cancel, "gettransactionreceipt", Value::Array(vec![Value::String(txid.clone())]))
            .await
        {
            Ok(receipt) => shape_contract_receipt(&receipt),
            Err(AdapterError::KnownUpstream { .. }) => {
                // not a contract call; synthesize a receipt from the plain transaction.
                let raw = fetch_raw_transaction(ctx, &txid).await?;
                shape_plain_receipt(&raw)
            }
            Err(err) => Err(err),
        }
    }
}

fn shape_contract_receipt(receipt: &Value) -> AdapterResult<Value> {
    let txid = receipt
        .get("transactionHash")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Internal("gettransactionreceipt missing transactionHash".into()))?;
    let block_hash = receipt.get("blockHash").and_then(Value::as_str).unwrap_or_default();
    let block_number = receipt.get("blockNumber").and_then(Value::as_u64).unwrap_or(0);
    let tx_index = receipt.get("transactionIndex").and_then(Value::as_u64).unwrap_or(0);
    let gas_used = receipt.get("gasUsed").and_then(Value::as_u64).unwrap_or(0);
    let cumulative_gas_used = receipt.get("cumulativeGasUsed").and_then(Value::as_u64).unwrap_or(gas_used);
    let contract_address = receipt.get("contractAddress").and_then(Value::as_str);
    let from = receipt.get("from").and_then(Value::as_str).unwrap_or_default();
    let to = receipt.get("to").and_then(Value::as_str);
    let excepted = receipt.get("excepted").and_then(Value::as_str).unwrap_or("None");
    let eth_block_hash = crate::blockhash_index::BlockHashIndex::compute_eth_hash(block_hash)?;
    let eth_block_hash_hex = format!("{eth_block_hash:#x}");

    let raw_logs = receipt.get("log").and_then(Value::as_array).cloned().unwrap_or_default();
    let logs: Vec<Value> = raw_logs
        .into_iter()
        .enumerate()
        .map(|(i, log)| {
            let address = log.get("address").and_then(Value::as_str).unwrap_or_default();
            let topics: Vec<Value> = log
                .get("topics")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|t| Value::String(format!("0x{}", t.as_str().unwrap_or_default())))
                .collect();
            let data = log.get("data").and_then(Value::as_str).unwrap_or_default();

            json!({
                "address": format!("0x{address}"),
                "topics": topics,
                "data": format!("0x{data}"),
                "blockHash": eth_block_hash_hex.clone(),
                "blockNumber": encode_hex_quantity(U256::from(block_number)),
                "transactionHash": format!("0x{txid}"),
                "transactionIndex": encode_hex_quantity(U256::from(tx_index)),
                "logIndex": encode_hex_quantity(U256::from(i as u64)),
                "removed": false,
            })
        })
        .collect();

    Ok(json!({
        "transactionHash": format!("0x{txid}"),
        "blockHash": eth_block_hash_hex,
        "blockNumber": encode_hex_quantity(U256::from(block_number)),
        "transactionIndex": encode_hex_quantity(U256::from(tx_index)),
        "from": format!("0x{from}"),
        "to": to.map(|t| format!("0x{t}")),
        "cumulativeGasUsed": encode_hex_quantity(U256::from(cumulative_gas_used)),
        "gasUsed": encode_hex_quantity(U256::from(gas_used)),
        "contractAddress": contract_address.map(|a| format!("0x{a}")),
        "logs": logs.clone(),
        "logsBloom": super::logs::compute_logs_bloom(&logs),
        "status": if excepted == "None" { "0x1" } else { "0x0" },
        "type": "0x0",
    }))
}

fn shape_plain_receipt(raw: &Value) -> AdapterResult<Value> {
    let txid = raw
        .get("txid")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Internal("getrawtransaction missing txid".into()))?;
    let block_hash = raw.get("blockhash").and_then(Value::as_str);
    let eth_block_hash = block_hash
        .map(crate::blockhash_index::BlockHashIndex::compute_eth_hash)
        .transpose()?;
    let confirmations = raw.get("confirmations").and_then(Value::as_u64).unwrap_or(0);

    Ok(json!({
        "transactionHash": format!("0x{txid}"),
        "blockHash": eth_block_hash.map(|h| format!("{h:#x}")),
        "blockNumber": Value::Null,
        "transactionIndex": Value::Null,
        "from": format!("{:#x}", H160::zero()),
        "to": Value::Null,
        "cumulativeGasUsed": "0x0",
        "gasUsed": "0x0",
        "contractAddress": Value::Null,
        "logs": Value::Array(vec![]),
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "status": if confirmations > 0 { "0x1" } else { "0x0" },
        "type": "0x0",
    }))
}

struct EthSendRawTransaction;

#[async_trait]
impl MethodHandler for EthSendRawTransaction {
    fn method(&self) -> &'static str {
        "eth_sendRawTransaction"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let raw_hex = param_str(req, 0)?;
        let stripped = raw_hex.trim_start_matches("0x").to_string();

        let txid = ctx
            .upstream
            .request(&ctx.cancel, "sendrawtransaction", Value::Array(vec![Value::String(stripped)]))
            .await?;

        let txid = txid
            .as_str()
            .ok_or_else(|| AdapterError::Internal("sendrawtransaction did not return a txid".into()))?;

        Ok(Value::String(format!("0x{txid}")))
    }
}

/// `{from, to, gas, gasPrice, value, data}` as sent by `eth_sendTransaction`
/// and `eth_call`/`eth_estimateGas`.
pub(crate) struct CallRequest {
    pub from: Option<H160>,
    pub to: Option<H160>,
    pub value_satoshi: u64,
    pub data: Option<String>,
}

pub(crate) fn parse_call_request(value: &Value) -> AdapterResult<CallRequest> {
    let from = value
        .get("from")
        .and_then(Value::as_str)
        .map(|s| s.parse::<H160>())
        .transpose()
        .map_err(|err| AdapterError::InvalidParams(format!("bad from address: {err}")))?;

    let to = value
        .get("to")
        .and_then(Value::as_str)
        .map(|s| s.parse::<H160>())
        .transpose()
        .map_err(|err| AdapterError::InvalidParams(format!("bad to address: {err}")))?;

    let value_satoshi = match value.get("value").and_then(Value::as_str) {
        Some(hex) => {
            let (satoshi, _lossy) = wei_to_satoshi(decode_hex_quantity(hex)?);
            satoshi.as_u64()
        }
        None => 0,
    };

    let data = value.get("data").and_then(Value::as_str).map(|s| s.trim_start_matches("0x").to_string());

    Ok(CallRequest { from, to, value_satoshi, data })
}

struct EthSendTransaction;

#[async_trait]
impl MethodHandler for EthSendTransaction {
    fn method(&self) -> &'static str {
        "eth_sendTransaction"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let call = parse_call_request(super::param(req, 0)?)?;

        let sender = match call.from {
            Some(addr) if ctx.config.accounts.contains(&addr) => addr,
            Some(_) => {
                return Err(AdapterError::InvalidParams(
                    "from address is not a funded local account".into(),
                ))
            }
            None => *ctx
                .config
                .accounts
                .first()
                .ok_or_else(|| AdapterError::InvalidParams("no funded local account configured".into()))?,
        };

        let sender_qtum = crate::codec::encode_address_to_qtum(sender, ctx.config.network);

        let txid = match (call.to, call.data) {
            (Some(to), Some(data)) if !data.is_empty() => {
                let to_qtum = crate::codec::encode_address_to_qtum(to, ctx.config.network);
                let result = ctx
                    .upstream
                    .request(
                        &ctx.cancel,
                        "sendtocontract",
                        json!([to_qtum, data, call.value_satoshi as f64 / 1e8, 250000, 40, sender_qtum]),
                    )
                    .await?;
                result.get("txid").and_then(Value::as_str).map(str::to_string)
            }
            (Some(to), None) => {
                let to_qtum = crate::codec::encode_address_to_qtum(to, ctx.config.network);
                let result = ctx
                    .upstream
                    .request(
                        &ctx.cancel,
                        "sendtoaddress",
                        json!([to_qtum, call.value_satoshi as f64 / 1e8]),
                    )
                    .await?;
                result.as_str().map(str::to_string)
            }
            (None, Some(data)) if !data.is_empty() => {
                let result = ctx
                    .upstream
                    .request(&ctx.cancel, "createcontract", json!([data, 2500000, 40, sender_qtum]))
                    .await?;
                result.get("txid").and_then(Value::as_str).map(str::to_string)
            }
            _ => return Err(AdapterError::InvalidParams("transaction needs a to address or contract data".into())),
        };

        let txid = txid.ok_or_else(|| AdapterError::Internal("upstream did not return a txid".into()))?;
        Ok(Value::String(format!("0x{txid}")))
    }
}

struct EthSignTransaction;

#[async_trait]
impl MethodHandler for EthSignTransaction {
    fn method(&self) -> &'static str {
        "eth_signTransaction"
    }

    /// Qtum has no RPC that produces an Ethereum-encoded signed transaction
    /// from a wallet-held key; the node wallet signs its own raw
    /// transactions, not arbitrary Ethereum tx envelopes. This always
    /// returns "not supported" regardless of configured accounts.
    async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        Err(AdapterError::NotSupported("eth_signTransaction".into()))
    }
}

struct EthSign;

#[async_trait]
impl MethodHandler for EthSign {
    fn method(&self) -> &'static str {
        "eth_sign"
    }

    /// delegates to the wallet's `signmessage`, the closest Qtum primitive
    /// to signing arbitrary data with an account-held key.
    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        if ctx.config.accounts.is_empty() {
            return Err(AdapterError::NotSupported("eth_sign".into()));
        }

        let addr = param_address(req, 0)?;
        if !ctx.config.accounts.contains(&addr) {
            return Err(AdapterError::InvalidParams("address is not a configured local account".into()));
        }

        let message_hex = param_str(req, 1)?;
        let message_bytes = crate::codec::decode_hex_bytes(message_hex)?;
        let qtum_address = crate::codec::encode_address_to_qtum(addr, ctx.config.network);

        let signature = ctx
            .upstream
            .request(
                &ctx.cancel,
                "signmessage",
                Value::Array(vec![Value::String(qtum_address), Value::String(String::from_utf8_lossy(&message_bytes).to_string())]),
            )
            .await?;

        let signature = signature
            .as_str()
            .ok_or_else(|| AdapterError::Internal("signmessage did not return a signature".into()))?;

        Ok(Value::String(encode_hex_bytes(signature.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_block_transaction_reports_zero_sig_as_hex_quantity() {
        let tx = json!({
            "txid": "aa".repeat(32),
            "n": 0,
            "vout": [],
        });

        let qtum_hash = "bb".repeat(32);
        let shaped = shape_block_transaction(&tx, &qtum_hash, 10).unwrap();
        assert_eq!(shaped["v"], Value::String("0x0".to_string()));
        assert_eq!(shaped["r"], Value::String("0x0".to_string()));
        assert_eq!(shaped["s"], Value::String("0x0".to_string()));

        // blockHash is the Block-Hash Index's keccak256 digest, not a
        // `0x`-prefixed passthrough of the raw Qtum hash.
        let expected = crate::blockhash_index::BlockHashIndex::compute_eth_hash(&qtum_hash).unwrap();
        assert_eq!(shaped["blockHash"], Value::String(format!("{expected:#x}")));
    }

    #[test]
    fn shape_standalone_transaction_converts_block_hash_through_the_index() {
        let qtum_hash = "cc".repeat(32);
        let raw = json!({
            "txid": "dd".repeat(32),
            "blockhash": qtum_hash,
            "vout": [],
        });

        let shaped = shape_standalone_transaction(&raw).unwrap();
        let expected = crate::blockhash_index::BlockHashIndex::compute_eth_hash(&qtum_hash).unwrap();
        assert_eq!(shaped["blockHash"], Value::String(format!("{expected:#x}")));
    }

    #[test]
    fn shape_standalone_transaction_leaves_block_hash_null_before_confirmation() {
        let raw = json!({
            "txid": "dd".repeat(32),
            "vout": [],
        });

        let shaped = shape_standalone_transaction(&raw).unwrap();
        assert_eq!(shaped["blockHash"], Value::Null);
    }

    #[test]
    fn extract_contract_call_finds_call_vout() {
        let tx = json!({
            "txid": "aa".repeat(32),
            "vout": [
                { "value": 0.0, "scriptPubKey": { "type": "call", "hex": "60fe47b1", "addresses": [format!("{:#x}", H160::repeat_byte(1))] } }
            ],
        });

        let (to, value, data) = extract_contract_call(&tx);
        assert_eq!(to, Some(H160::repeat_byte(1)));
        assert_eq!(value, 0);
        assert_eq!(data, "0x60fe47b1");
    }

    #[test]
    fn extract_contract_call_sums_plain_transfer_outputs() {
        let tx = json!({
            "txid": "bb".repeat(32),
            "vout": [
                { "value": 1.0, "scriptPubKey": { "type": "pubkeyhash", "addresses": [format!("{:#x}", H160::repeat_byte(2))] } },
                { "value": 0.5, "scriptPubKey": { "type": "pubkeyhash" } },
            ],
        });

        let (to, value, data) = extract_contract_call(&tx);
        assert_eq!(to, Some(H160::repeat_byte(2)));
        assert_eq!(value, 150_000_000);
        assert_eq!(data, "0x");
    }

    #[tokio::test]
    async fn get_transaction_by_block_hash_and_index_returns_null_for_unknown_hash() {
        // on_the_fly mode never persists a pair, so every client-supplied
        // block hash reverses to `None` and the handler must report a miss
        // rather than mistake the eth-shaped hash for a raw Qtum one.
        let ctx = HandlerContext::for_test();
        let req = crate::jsonrpc::JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_getTransactionByBlockHashAndIndex".into(),
            params: Some(Value::Array(vec![
                Value::String(format!("0x{}", "ee".repeat(32))),
                Value::String("0x0".into()),
            ])),
        };

        let result = EthGetTransactionByBlockHashAndIndex.invoke(&ctx, &req).await.unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn send_transaction_requires_to_or_data() {
        let ctx = HandlerContext::for_test();
        let req = crate::jsonrpc::JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_sendTransaction".into(),
            params: Some(Value::Array(vec![json!({})])),
        };

        let err = EthSendTransaction.invoke(&ctx, &req).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams(_)));
    }
}
