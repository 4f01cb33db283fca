//! Process-wide flag map, retained (per spec §9 REDESIGN FLAGS) as a typed
//! configuration snapshot mutated only through this narrow API, rather than
//! handlers reaching into global state directly.

use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FlagStore {
    inner: RwLock<HashMap<String, String>>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let flags = FlagStore::new();
        assert_eq!(flags.get("HIDE_QTUMD_LOGS"), None);
        flags.set("HIDE_QTUMD_LOGS", "1");
        assert_eq!(flags.get("HIDE_QTUMD_LOGS").as_deref(), Some("1"));
    }
}
