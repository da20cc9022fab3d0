//! Embedded JSON document store with versioned optimistic concurrency,
//! long-poll change subscriptions, and declarative queries.
//!
//! # Examples
//!
//! Compare-and-set over an in-memory engine:
//! ```
//! use patchbase::core::store::DocStore;
//! use serde_json::json;
//!
//! let store = DocStore::in_memory();
//! assert!(store.create("user:1", json!({"name": "ada"})).expect("create"));
//!
//! let read = store.get_with_version("user:1").expect("read");
//! assert_eq!(read.version.minor, 1);
//!
//! assert!(store
//!     .set_if_version(
//!         "user:1",
//!         read.version,
//!         Some(json!({"name": "ada", "admin": true})),
//!         None,
//!     )
//!     .expect("cas"));
//! assert_eq!(
//!     store.get("user:1").expect("get"),
//!     Some(json!({"name": "ada", "admin": true})),
//! );
//! ```
//!
//! Disk-backed usage with the SQLite engine:
//! ```no_run
//! use patchbase::core::store::DocStore;
//! use serde_json::json;
//!
//! let store = DocStore::open("docs.db").expect("open sqlite");
//! store.create("user:1", json!({"name": "ada"})).expect("create");
//!
//! let read = store.get_with_version("user:1").expect("read");
//! store
//!     .set_if_version(
//!         "user:1",
//!         read.version,
//!         Some(json!({"name": "ada", "admin": true})),
//!         None,
//!     )
//!     .expect("cas");
//! ```
//!
//! Long-polling for patches newer than a known version:
//! ```
//! use patchbase::{core::store::DocStore, runtime::poll::PollOptions};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = DocStore::in_memory();
//! store.create("job:1", json!({"state": "queued"})).expect("create");
//! let version = store.start_polling("job:1").expect("read").version;
//!
//! store
//!     .set_if_version("job:1", version, Some(json!({"state": "running"})), None)
//!     .expect("cas");
//!
//! let changes = store
//!     .poll(vec![("job:1".to_string(), version)], PollOptions::default())
//!     .await
//!     .expect("poll");
//! assert_eq!(changes.len(), 1);
//! assert!(changes[0].1[0].version > version);
//! # }
//! ```
#![deny(missing_docs)]

/// Envelope byte codec and value-to-value patch computation.
pub mod codec;
/// Commit core and read paths.
pub mod core;
/// Document envelope, patch, and read-result types.
pub mod doc;
/// Ordered key-value engine abstraction and implementations.
pub mod kv;
/// Filter algebra, ordering, and pagination over full scans.
pub mod query;
/// Subscription bus and long-poll machinery.
pub mod runtime;
/// Shared primitive types.
pub mod types;
