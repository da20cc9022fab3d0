//! BTreeMap-backed engine for tests and ephemeral databases.

use std::collections::BTreeMap;

use super::{KvError, KvResult, KvStore};

/// Ordered in-memory [`KvStore`].
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryKv {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&mut self, key: &[u8]) -> KvResult<Vec<u8>> {
        self.entries.get(key).cloned().ok_or(KvError::NotFound)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn iter_all(&mut self) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
