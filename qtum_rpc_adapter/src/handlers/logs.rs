//! `eth_getLogs` (spec §4.d) and the `logsBloom` helper shared with the
//! transaction-receipt handler.

use super::HandlerContext;
use crate::codec::encode_hex_quantity;
use crate::errors::{AdapterError, AdapterResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use ethbloom::{Bloom, Input};
use ethers::types::U256;
use serde_json::{json, Value};

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder.register(Box::new(EthGetLogs))
}

/// one search-logs filter entry per spec §3's `searchlogs` supplemental
/// note: `toBlock = -1` means "to tip", and a `null` topic entry is a
/// wildcard for that position.
fn block_tag_to_height_or_tip(value: Option<&Value>) -> AdapterResult<Option<&str>> {
    Ok(value.and_then(Value::as_str))
}

struct EthGetLogs;

#[async_trait]
impl MethodHandler for EthGetLogs {
    fn method(&self) -> &'static str {
        "eth_getLogs"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let filter = super::param(req, 0)?;

        let from_block = resolve_filter_block(ctx, filter.get("fromBlock"), 0).await?;
        let to_block = resolve_filter_block(ctx, filter.get("toBlock"), -1).await?;

        let addresses: Vec<String> = match filter.get("address") {
            None | Some(Value::Null) => vec![],
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(arr)) => arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            _ => return Err(AdapterError::InvalidParams("address must be a string or array".into())),
        };

        let topics: Vec<Option<Vec<String>>> = match filter.get("topics") {
            None | Some(Value::Null) => vec![],
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| match entry {
                    Value::Null => None,
                    Value::String(s) => Some(vec![s.clone()]),
                    Value::Array(opts) => Some(opts.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()),
                    _ => None,
                })
                .collect(),
            _ => return Err(AdapterError::InvalidParams("topics must be an array".into())),
        };

        let params = json!([
            from_block,
            to_block,
            { "addresses": addresses },
            { "topics": topics },
        ]);

        let raw = ctx.upstream.request(&ctx.cancel, "searchlogs", params).await?;
        let entries = raw.as_array().cloned().unwrap_or_default();

        let mut logs = Vec::new();
        for entry in entries {
            logs.extend(shape_search_logs_entry(&entry, &topics)?);
        }

        Ok(Value::Array(logs))
    }
}

async fn resolve_filter_block(ctx: &HandlerContext, value: Option<&Value>, default: i64) -> AdapterResult<i64> {
    match block_tag_to_height_or_tip(value)? {
        None => Ok(default),
        Some("latest") | Some("pending") => Ok(-1),
        Some("earliest") => Ok(0),
        Some(hex) => {
            let n = crate::codec::decode_hex_quantity(hex)?;
            Ok(n.as_u64() as i64)
        }
    }
}

/// one `searchlogs` result covers one transaction and may carry several log
/// entries; each becomes its own Ethereum-shaped log, client-side filtered
/// by topic since not every Qtum daemon build applies the topic filter
/// itself (spec §4.d: "filters client-side by topic when the upstream does
/// not").
pub(crate) fn shape_search_logs_entry(entry: &Value, topic_filter: &[Option<Vec<String>>]) -> AdapterResult<Vec<Value>> {
    let block_hash = entry.get("blockHash").and_then(Value::as_str).unwrap_or_default();
    let eth_block_hash = crate::blockhash_index::BlockHashIndex::compute_eth_hash(block_hash)?;
    let eth_block_hash_hex = format!("{eth_block_hash:#x}");
    let block_number = entry.get("blockNumber").and_then(Value::as_u64).unwrap_or(0);
    let tx_hash = entry.get("transactionHash").and_then(Value::as_str).unwrap_or_default();
    let tx_index = entry.get("transactionIndex").and_then(Value::as_u64).unwrap_or(0);

    let raw_logs = entry.get("log").and_then(Value::as_array).cloned().unwrap_or_default();

    let mut out = Vec::with_capacity(raw_logs.len());
    for (log_index, log) in raw_logs.into_iter().enumerate() {
        let address = log.get("address").and_then(Value::as_str).unwrap_or_default().to_string();
        let topics: Vec<String> = log
            .get("topics")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect();

        if !topics_match(&topics, topic_filter) {
            continue;
        }

        let data = log.get("data").and_then(Value::as_str).unwrap_or("").to_string();

        out.push(json!({
            "address": format!("0x{address}"),
            "topics": topics.iter().map(|t| format!("0x{t}")).collect::<Vec<_>>(),
            "data": format!("0x{data}"),
            "blockHash": eth_block_hash_hex.clone(),
            "blockNumber": encode_hex_quantity(U256::from(block_number)),
            "transactionHash": format!("0x{tx_hash}"),
            "transactionIndex": encode_hex_quantity(U256::from(tx_index)),
            "logIndex": encode_hex_quantity(U256::from(log_index as u64)),
            "removed": false,
        }));
    }

    Ok(out)
}

fn topics_match(log_topics: &[String], filter: &[Option<Vec<String>>]) -> bool {
    filter.iter().enumerate().all(|(i, wanted)| match wanted {
        None => true,
        Some(options) => log_topics.get(i).map(|t| options.iter().any(|o| o.trim_start_matches("0x") == t)).unwrap_or(false),
    })
}

/// Ethereum's per-receipt bloom filter: each log's address and each of its
/// topics are added as independent members.
pub fn compute_logs_bloom(logs: &[Value]) -> String {
    let mut bloom = Bloom::default();

    for log in logs {
        if let Some(address) = log.get("address").and_then(Value::as_str) {
            if let Ok(bytes) = crate::codec::decode_hex_bytes(address) {
                bloom.accrue(Input::Raw(&bytes));
            }
        }

        if let Some(topics) = log.get("topics").and_then(Value::as_array) {
            for topic in topics {
                if let Some(topic) = topic.as_str() {
                    if let Ok(bytes) = crate::codec::decode_hex_bytes(topic) {
                        bloom.accrue(Input::Raw(&bytes));
                    }
                }
            }
        }
    }

    format!("0x{}", hex::encode(bloom.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_logs_give_empty_bloom() {
        let bloom = compute_logs_bloom(&[]);
        assert_eq!(bloom, format!("0x{}", "0".repeat(512)));
    }

    #[test]
    fn bloom_is_nonzero_once_populated() {
        let logs = vec![json!({
            "address": format!("0x{}", "aa".repeat(20)),
            "topics": [format!("0x{}", "bb".repeat(32))],
        })];
        let bloom = compute_logs_bloom(&logs);
        assert_ne!(bloom, format!("0x{}", "0".repeat(512)));
    }

    #[test]
    fn shape_search_logs_entry_converts_block_hash_through_the_index() {
        let qtum_hash = "aa".repeat(32);
        let entry = json!({
            "blockHash": qtum_hash,
            "blockNumber": 10,
            "transactionHash": "bb".repeat(32),
            "transactionIndex": 0,
            "log": [{ "address": "cc".repeat(20), "topics": [], "data": "" }],
        });

        let logs = shape_search_logs_entry(&entry, &[]).unwrap();
        let expected = crate::blockhash_index::BlockHashIndex::compute_eth_hash(&qtum_hash).unwrap();
        assert_eq!(logs[0]["blockHash"], Value::String(format!("{expected:#x}")));
    }

    #[test]
    fn topics_match_treats_null_as_wildcard() {
        let log_topics = vec!["aa".repeat(32)];
        assert!(topics_match(&log_topics, &[None]));
        assert!(topics_match(&log_topics, &[]));
        assert!(!topics_match(&log_topics, &[Some(vec!["bb".repeat(32)])]));
    }
}
