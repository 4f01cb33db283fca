//! The upstream Qtum JSON-RPC client: connection pooling, request numbering,
//! retry under congestion, response caching, and the runtime flag store.
//! Component (b) of spec §2.

mod cache;
mod client;
mod flags;

pub use cache::{ResponseCache, CACHEABLE_METHODS};
pub use client::{ErrorHandler, UpstreamClient};
pub use flags::FlagStore;
