//! Ordered key-value engine abstraction and implementations.

/// In-memory ordered engine.
pub mod memory;
/// SQLite-backed engine.
pub mod sqlite;

/// Engine-layer error type.
#[derive(Debug)]
pub enum KvError {
    /// The key holds no entry. Never an error at the store API boundary;
    /// it maps to absent-document semantics.
    NotFound,
    /// Wrapped SQLite error.
    Sqlite(rusqlite::Error),
    /// Generic message error.
    Message(String),
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Result alias for engine operations.
pub type KvResult<T> = Result<T, KvError>;

/// Byte-keyed, byte-valued, ordered store.
///
/// Removal of documents is represented above this layer by tombstone
/// envelopes, so no delete operation is required.
pub trait KvStore: Send {
    /// Reads the entry at `key`, or [`KvError::NotFound`].
    fn get(&mut self, key: &[u8]) -> KvResult<Vec<u8>>;
    /// Writes `value` at `key`, replacing any prior entry.
    fn put(&mut self, key: &[u8], value: &[u8]) -> KvResult<()>;
    /// Returns every `(key, value)` entry in ascending key order.
    fn iter_all(&mut self) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>>;
}
