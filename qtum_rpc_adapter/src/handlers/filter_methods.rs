//! Polling filters (spec §4.e): `eth_newFilter`, `eth_newBlockFilter`,
//! `eth_newPendingTransactionFilter`, `eth_getFilterChanges`,
//! `eth_getFilterLogs`, `eth_uninstallFilter`.

use super::{resolve_block_height, HandlerContext};
use crate::codec::encode_hex_quantity;
use crate::errors::{AdapterError, AdapterResult};
use crate::filters::FilterKind;
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::{MethodHandler, MethodRegistryBuilder};
use async_trait::async_trait;
use ethers::types::U256;
use serde_json::{json, Value};

pub fn register_all(builder: MethodRegistryBuilder) -> AdapterResult<MethodRegistryBuilder> {
    builder
        .register(Box::new(EthNewFilter))?
        .register(Box::new(EthNewBlockFilter))?
        .register(Box::new(EthNewPendingTransactionFilter))?
        .register(Box::new(EthGetFilterChanges))?
        .register(Box::new(EthGetFilterLogs))?
        .register(Box::new(EthUninstallFilter))
}

fn parse_filter_id(req: &JsonRpcRequest) -> AdapterResult<U256> {
    let raw = super::param(req, 0)?
        .as_str()
        .ok_or_else(|| AdapterError::InvalidParams(format!("{} argument 0 must be a string", req.method)))?;
    crate::codec::decode_hex_quantity(raw)
}

fn parse_address_filter(value: Option<&Value>) -> AdapterResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(arr)) => Ok(arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()),
        _ => Err(AdapterError::InvalidParams("address must be a string or array".into())),
    }
}

fn parse_topics_filter(value: Option<&Value>) -> AdapterResult<Vec<Option<Vec<String>>>> {
    match value {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::Array(entries)) => Ok(entries
            .iter()
            .map(|entry| match entry {
                Value::Null => None,
                Value::String(s) => Some(vec![s.clone()]),
                Value::Array(opts) => Some(opts.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()),
                _ => None,
            })
            .collect()),
        _ => Err(AdapterError::InvalidParams("topics must be an array".into())),
    }
}

async fn resolve_optional_block(ctx: &HandlerContext, value: Option<&Value>) -> AdapterResult<Option<u64>> {
    match value.and_then(Value::as_str) {
        None | Some("latest") | Some("pending") => Ok(None),
        Some("earliest") => Ok(Some(0)),
        Some(hex) => {
            let tag = super::parse_block_tag(hex)?;
            Ok(Some(resolve_block_height(ctx, &tag).await?))
        }
    }
}

struct EthNewFilter;

#[async_trait]
impl MethodHandler for EthNewFilter {
    fn method(&self) -> &'static str {
        "eth_newFilter"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let filter = super::param(req, 0)?;

        let from_block = resolve_optional_block(ctx, filter.get("fromBlock")).await?;
        let to_block = resolve_optional_block(ctx, filter.get("toBlock")).await?;
        let addresses = parse_address_filter(filter.get("address"))?;
        let topics = parse_topics_filter(filter.get("topics"))?;

        let height = resolve_block_height(ctx, &super::BlockTag::Latest).await?;
        let id = ctx.filters.new_filter(
            FilterKind::Logs { from_block, to_block, addresses, topics },
            height,
        );

        Ok(Value::String(encode_hex_quantity(id)))
    }
}

struct EthNewBlockFilter;

#[async_trait]
impl MethodHandler for EthNewBlockFilter {
    fn method(&self) -> &'static str {
        "eth_newBlockFilter"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        let height = resolve_block_height(ctx, &super::BlockTag::Latest).await?;
        let id = ctx.filters.new_block_filter(height);
        Ok(Value::String(encode_hex_quantity(id)))
    }
}

struct EthNewPendingTransactionFilter;

#[async_trait]
impl MethodHandler for EthNewPendingTransactionFilter {
    fn method(&self) -> &'static str {
        "eth_newPendingTransactionFilter"
    }

    async fn invoke(&self, ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
        let height = resolve_block_height(ctx, &super::BlockTag::Latest).await?;
        let id = ctx.filters.new_pending_tx_filter(height);
        Ok(Value::String(encode_hex_quantity(id)))
    }
}

/// runs a logs filter's `searchlogs` window between its stored cursor and
/// the current tip, advancing the cursor afterwards.
async fn poll_logs_filter(
    ctx: &HandlerContext,
    id: U256,
    from_block: Option<u64>,
    to_block: Option<u64>,
    addresses: &[String],
    topics: &[Option<Vec<String>>],
    advance_cursor: bool,
) -> AdapterResult<Vec<Value>> {
    let cursor = ctx
        .filters
        .touch_and_read_cursor(id)
        .ok_or_else(|| AdapterError::InvalidParams(format!("filter {id:#x} not found")))?;

    let tip = resolve_block_height(ctx, &super::BlockTag::Latest).await?;

    let window_from = from_block.unwrap_or(cursor).max(cursor);
    let window_to = to_block.unwrap_or(tip);

    let params = json!([
        window_from,
        window_to,
        { "addresses": addresses },
        { "topics": topics },
    ]);

    let raw = ctx.upstream.request(&ctx.cancel, "searchlogs", params).await?;
    let entries = raw.as_array().cloned().unwrap_or_default();

    let mut logs = Vec::new();
    for entry in entries {
        logs.extend(super::logs::shape_search_logs_entry(&entry, topics)?);
    }

    if advance_cursor {
        ctx.filters.advance(id, tip + 1);
    }
    Ok(logs)
}

async fn poll_block_filter(ctx: &HandlerContext, id: U256) -> AdapterResult<Vec<Value>> {
    let cursor = ctx
        .filters
        .touch_and_read_cursor(id)
        .ok_or_else(|| AdapterError::InvalidParams(format!("filter {id:#x} not found")))?;
    let tip = resolve_block_height(ctx, &super::BlockTag::Latest).await?;

    // cursor is the last height already reported (the tip at filter creation,
    // or the tip as of the previous poll) -- report strictly newer blocks.
    // Using `cursor + 1` as the lower bound instead of skipping a
    // re-encountered `cursor` value handles a filter created at genesis
    // (cursor == 0) the same as any other height, with no special case.
    let mut hashes = Vec::new();
    for height in (cursor + 1)..=tip {
        let hash = ctx
            .upstream
            .cached_request(&ctx.cancel, "getblockhash", Value::Array(vec![Value::from(height)]))
            .await?;
        if let Some(hash) = hash.as_str() {
            let eth_hash = ctx.blockhash_index.encode(hash, height).await?;
            hashes.push(Value::String(format!("{eth_hash:#x}")));
        }
    }

    ctx.filters.advance(id, tip);
    Ok(hashes)
}

struct EthGetFilterChanges;

#[async_trait]
impl MethodHandler for EthGetFilterChanges {
    fn method(&self) -> &'static str {
        "eth_getFilterChanges"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let id = parse_filter_id(req)?;
        let kind = ctx.filters.kind(id).ok_or_else(|| AdapterError::InvalidParams(format!("filter {id:#x} not found")))?;

        match kind {
            FilterKind::Logs { from_block, to_block, addresses, topics } => {
                let logs = poll_logs_filter(ctx, id, from_block, to_block, &addresses, &topics, true).await?;
                Ok(Value::Array(logs))
            }
            FilterKind::Block => Ok(Value::Array(poll_block_filter(ctx, id).await?)),
            FilterKind::PendingTx => Ok(Value::Array(vec![])),
        }
    }
}

struct EthGetFilterLogs;

#[async_trait]
impl MethodHandler for EthGetFilterLogs {
    fn method(&self) -> &'static str {
        "eth_getFilterLogs"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let id = parse_filter_id(req)?;
        let kind = ctx.filters.kind(id).ok_or_else(|| AdapterError::InvalidParams(format!("filter {id:#x} not found")))?;

        match kind {
            FilterKind::Logs { from_block, to_block, addresses, topics } => {
                let from_block = from_block.or(Some(0));
                let logs = poll_logs_filter(ctx, id, from_block, to_block, &addresses, &topics, false).await?;
                Ok(Value::Array(logs))
            }
            FilterKind::Block | FilterKind::PendingTx => {
                Err(AdapterError::InvalidParams("eth_getFilterLogs only applies to log filters".into()))
            }
        }
    }
}

struct EthUninstallFilter;

#[async_trait]
impl MethodHandler for EthUninstallFilter {
    fn method(&self) -> &'static str {
        "eth_uninstallFilter"
    }

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        let id = parse_filter_id(req)?;
        Ok(Value::Bool(ctx.filters.uninstall(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uninstall_unknown_filter_returns_false() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_uninstallFilter".into(),
            params: Some(Value::Array(vec![Value::String("0xdeadbeef".into())])),
        };

        let result = EthUninstallFilter.invoke(&ctx, &req).await.unwrap();
        assert_eq!(result, Value::Bool(false));
    }

    #[tokio::test]
    async fn get_filter_changes_rejects_unknown_filter() {
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::value::RawValue::from_string("1".into()).unwrap(),
            method: "eth_getFilterChanges".into(),
            params: Some(Value::Array(vec![Value::String("0xdeadbeef".into())])),
        };

        let err = EthGetFilterChanges.invoke(&ctx, &req).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams(_)));
    }
}
