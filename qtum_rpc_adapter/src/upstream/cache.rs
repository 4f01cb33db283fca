//! Per-method response cache.
//!
//! The teacher's own `deferred-rate-limiter` crate already depends on `moka`
//! for exactly this shape of problem (an async, TTL'd cache); we use it here
//! directly instead of the teacher's hand-rolled `FifoSizedMap`, since moka
//! gives native per-insert TTL which the whitelist-cache design below needs.
//!
//! Per spec §9 REDESIGN FLAGS ("cyclic reference between client and cache"),
//! the cache knows nothing about `UpstreamClient`; a logger/tracing span is
//! the only thing injected into it, never the reverse.

use moka::future::Cache;
use serde_json::Value;
use std::time::Duration;

/// Qtum RPC methods whose responses are safe to cache by `(method, params)`.
/// Callers are responsible for only routing tip-sensitive calls (e.g.
/// `getblockhash` for `latest`, or `getblockcount`) around the cache
/// entirely; everything in this list is treated as immutable once it has
/// been observed (a specific block hash, a specific txid).
pub const CACHEABLE_METHODS: &[&str] = &[
    "getblock",
    "getblockheader",
    "getrawtransaction",
    "gettransactionreceipt",
    "getblockhash",
];

pub fn is_cacheable(method: &str) -> bool {
    CACHEABLE_METHODS.contains(&method)
}

const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, Value>,
}

impl ResponseCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(DEFAULT_TTL)
                .build(),
        }
    }

    /// canonical cache key: method plus the JSON-serialized params, so that
    /// two syntactically different-but-equal param encodings don't collide
    /// or miss against each other inconsistently -- serde_json's `Value`
    /// equality/serialization is stable for a given logical value.
    pub fn key(method: &str, params: &Value) -> String {
        format!("{method}:{params}")
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, value: Value) {
        self.inner.insert(key, value).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn whitelisted_method_is_cacheable() {
        assert!(is_cacheable("getblock"));
        assert!(!is_cacheable("getblockcount"));
    }

    #[tokio::test]
    async fn insert_then_get_hits() {
        let cache = ResponseCache::new(100);
        let key = ResponseCache::key("getblock", &Value::String("abc".into()));
        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), Value::String("result".into())).await;
        assert_eq!(cache.get(&key).await, Some(Value::String("result".into())));
    }
}
