//! Versioned document store: serialized commits, lock-free reads.
//!
//! Invariants:
//! - every mutation funnels through `put_envelope` under the process-wide
//!   write lock; the patch event is published after the engine write and
//!   before the call returns
//! - a commit whose computed diff is empty is discarded without side effects
//! - reads never take the write lock; envelopes are written whole, so a
//!   reader observes either the pre- or post-commit state

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Duration;
use tracing::{debug, trace};

use crate::{
    codec,
    doc::{Document, Envelope, NUM_PATCHES_TO_KEEP, Patch, PatchOptions, VersionedValue},
    kv::{KvError, KvStore, memory::MemoryKv, sqlite::SqliteKv},
    query::{
        filter::MatcherCache,
        find::{Query, order_and_paginate},
    },
    runtime::{
        bus::SubscriptionBus,
        poll::{KeyedPatches, PatchWaiter, PollOptions, WaitOutcome},
    },
    types::Version,
};

/// Store-level error type.
#[derive(Debug)]
pub enum StoreError {
    /// Invalid caller input: disallowed top-level value, unknown filter
    /// operator, or a bad match pattern. Raised before any state change.
    Input(String),
    /// Engine failure other than not-found, tagged with a debug identifier.
    Storage {
        /// Operation and key the failure occurred under.
        context: String,
        /// Underlying engine error.
        source: KvError,
    },
    /// A stored envelope failed to decode.
    Corruption {
        /// Key whose envelope is unreadable.
        key: String,
        /// Decoder failure text.
        detail: String,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Embedded versioned document store over an ordered key-value engine.
pub struct DocStore {
    kv: Mutex<Box<dyn KvStore>>,
    write_lock: Mutex<()>,
    bus: SubscriptionBus,
}

impl DocStore {
    /// Creates a store over an arbitrary engine.
    pub fn new(kv: Box<dyn KvStore>) -> Self {
        Self {
            kv: Mutex::new(kv),
            write_lock: Mutex::new(()),
            bus: SubscriptionBus::new(),
        }
    }

    /// Creates an ephemeral in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKv::new()))
    }

    /// Opens a store over the SQLite engine at `path`.
    pub fn open(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        let kv = SqliteKv::open(path).map_err(|err| StoreError::Storage {
            context: "open".to_string(),
            source: err,
        })?;
        Ok(Self::new(Box::new(kv)))
    }

    /// The patch event bus owned by this store.
    pub fn bus(&self) -> &SubscriptionBus {
        &self.bus
    }

    /// Returns the live value at `key`, if any.
    pub fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.read_envelope(key)?.and_then(|e| e.value))
    }

    /// Returns the full stored envelope at `key`, tombstones included.
    pub fn get_with_meta(&self, key: &str) -> StoreResult<Option<Envelope>> {
        self.read_envelope(key)
    }

    /// Returns the value and the version it was read at.
    ///
    /// A never-written key reads as `(Version::ABSENT, None)`; a tombstone
    /// keeps its real version so it can be used as a CAS token.
    pub fn get_with_version(&self, key: &str) -> StoreResult<VersionedValue> {
        let envelope = self.read_envelope(key)?;
        Ok(VersionedValue {
            version: Envelope::current_version(envelope.as_ref()),
            value: envelope.and_then(|e| e.value),
        })
    }

    /// Snapshot read used to seed a poll loop; alias of
    /// [`Self::get_with_version`].
    pub fn start_polling(&self, key: &str) -> StoreResult<VersionedValue> {
        self.get_with_version(key)
    }

    /// Creates a document at `key`. Returns false when a live document is
    /// already present. Succeeds over a tombstone, starting a new lineage.
    pub fn create(&self, key: &str, value: Value) -> StoreResult<bool> {
        ensure_top_level(&value)?;
        let _guard = self.write_lock.lock();

        let prev = self.read_envelope(key)?;
        if prev.as_ref().is_some_and(|e| !e.is_tombstone()) {
            return Ok(false);
        }
        self.put_envelope(key, prev, Some(value), None)?;
        Ok(true)
    }

    /// Removes the document at `key`, writing a tombstone. Returns false
    /// when no live document exists.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();

        let prev = self.read_envelope(key)?;
        if !prev.as_ref().is_some_and(|e| !e.is_tombstone()) {
            return Ok(false);
        }
        self.put_envelope(key, prev, None, None)?;
        Ok(true)
    }

    /// Compare-and-set: writes `value` iff the stored version equals
    /// `expected`. `None` removes with the same version guard. A mismatch
    /// is the `false` return, never an error.
    pub fn set_if_version(
        &self,
        key: &str,
        expected: Version,
        value: Option<Value>,
        options: Option<PatchOptions>,
    ) -> StoreResult<bool> {
        if let Some(value) = &value {
            ensure_top_level(value)?;
        }
        let _guard = self.write_lock.lock();

        let prev = self.read_envelope(key)?;
        if !Envelope::matches(prev.as_ref(), expected) {
            return Ok(false);
        }
        self.put_envelope(key, prev, value, options)?;
        Ok(true)
    }

    /// Evaluates `query` against a full scan of the engine.
    ///
    /// Tombstones are skipped; matches are sorted by the query's ordering
    /// clauses and sliced by its skip/limit.
    pub fn find(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let entries = self
            .kv
            .lock()
            .iter_all()
            .map_err(|err| StoreError::Storage {
                context: "scan".to_string(),
                source: err,
            })?;

        let mut matchers = MatcherCache::new();
        let mut matches = Vec::new();
        for (key_bytes, value_bytes) in entries {
            let key = match String::from_utf8(key_bytes) {
                Ok(key) => key,
                Err(err) => {
                    return Err(StoreError::Corruption {
                        key: String::from_utf8_lossy(err.as_bytes()).into_owned(),
                        detail: "non-utf8 key".to_string(),
                    });
                }
            };
            let envelope = codec::decode(&value_bytes).map_err(|err| StoreError::Corruption {
                key: key.clone(),
                detail: err.to_string(),
            })?;
            let Some(value) = envelope.value else {
                continue;
            };
            if query.filter.eval_with(&value, &mut matchers)? {
                matches.push(Document { key, value });
            }
        }

        Ok(order_and_paginate(matches, query))
    }

    /// Long-poll for patches newer than each key's `since` version.
    ///
    /// The live subscription is registered before the stored-history scan,
    /// so a commit landing in between cannot be missed. Returns immediately
    /// with everything newer in stored history; otherwise waits up to the
    /// configured block time for the first qualifying live patch, and
    /// returns empty on timeout. History is bounded, so a caller whose
    /// `since` predates the retained window only receives what remains.
    pub async fn poll(
        &self,
        requests: Vec<(String, Version)>,
        options: PollOptions,
    ) -> StoreResult<KeyedPatches> {
        let waiter = PatchWaiter::register(&self.bus, &requests);

        let mut collected: KeyedPatches = Vec::new();
        for (key, since) in &requests {
            if let Some(envelope) = self.read_envelope(key)? {
                let newer: Vec<Patch> = envelope
                    .patches
                    .iter()
                    .filter(|p| p.version > *since)
                    .cloned()
                    .collect();
                if !newer.is_empty() {
                    collected.push((key.clone(), newer));
                }
            }
        }
        if !collected.is_empty() {
            return Ok(collected);
        }

        trace!(keys = requests.len(), "poll waiting for live patch");
        match waiter
            .wait(Duration::from_millis(options.read_block_time_ms))
            .await
        {
            WaitOutcome::Resolved(entries) => Ok(entries),
            WaitOutcome::TimedOut => Ok(Vec::new()),
        }
    }

    fn read_envelope(&self, key: &str) -> StoreResult<Option<Envelope>> {
        match self.kv.lock().get(key.as_bytes()) {
            Ok(bytes) => {
                let envelope = codec::decode(&bytes).map_err(|err| StoreError::Corruption {
                    key: key.to_string(),
                    detail: err.to_string(),
                })?;
                Ok(Some(envelope))
            }
            Err(KvError::NotFound) => Ok(None),
            Err(err) => Err(StoreError::Storage {
                context: format!("get {key}"),
                source: err,
            }),
        }
    }

    /// The one commit primitive. Callers hold the write lock and have
    /// validated their precondition against `prev`.
    fn put_envelope(
        &self,
        key: &str,
        prev: Option<Envelope>,
        next: Option<Value>,
        options: Option<PatchOptions>,
    ) -> StoreResult<Option<Patch>> {
        let ops = codec::diff(prev.as_ref().and_then(|e| e.value.as_ref()), next.as_ref());
        if ops.is_empty() {
            trace!(key, "no-op commit discarded");
            return Ok(None);
        }

        let prev_version = Envelope::current_version(prev.as_ref());
        let version = if prev.as_ref().is_none_or(|e| e.is_tombstone()) {
            Version {
                major: now_hrnanos().max(prev_version.major.saturating_add(1)),
                minor: 1,
            }
        } else {
            prev_version.successor()
        };

        let patch = Patch {
            version,
            ops,
            metadata: options.and_then(|o| o.metadata),
        };

        let mut patches = prev.map(|e| e.patches).unwrap_or_default();
        if patches.len() > NUM_PATCHES_TO_KEEP - 1 {
            patches.drain(..patches.len() - (NUM_PATCHES_TO_KEEP - 1));
        }
        patches.push(patch.clone());

        let envelope = Envelope {
            version,
            value: next,
            patches,
            updated_at: now_hrnanos(),
        };
        let bytes = codec::encode(&envelope).map_err(|err| StoreError::Storage {
            context: format!("encode {key}"),
            source: KvError::Message(err.to_string()),
        })?;
        self.kv
            .lock()
            .put(key.as_bytes(), &bytes)
            .map_err(|err| StoreError::Storage {
                context: format!("put {key}"),
                source: err,
            })?;

        debug!(key, major = version.major, minor = version.minor, "committed");
        self.bus.publish(key, &patch);
        Ok(Some(patch))
    }
}

fn ensure_top_level(value: &Value) -> StoreResult<()> {
    match value {
        Value::Object(_) | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
        Value::Null => Err(StoreError::Input(
            "top-level value must not be null; omit the value to remove".to_string(),
        )),
        Value::Array(_) => Err(StoreError::Input(
            "top-level value must be an object, boolean, number, or string".to_string(),
        )),
    }
}

fn now_hrnanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
