//! In-process store for tests and callers without a database file.

use super::{entry_size, KeyValueStore, StoreError, StoreResult};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct MemoryKeyValueStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota_bytes: u64,
}

impl MemoryKeyValueStore {
    pub fn new(quota_bytes: u64) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            quota_bytes,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(u64::MAX)
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.borrow_mut();
        let current: u64 = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
        let replaced = entries.get(key).map_or(0, |old| entry_size(key, old));
        let needed = current - replaced + entry_size(key, value);
        if needed > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                needed,
                quota: self.quota_bytes,
            });
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }

    fn size_bytes(&self) -> StoreResult<u64> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .map(|(key, value)| entry_size(key, value))
            .sum())
    }
}
