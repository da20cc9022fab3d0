//! Document envelope, patch, and read-result types.
//!
//! Invariants:
//! - a non-empty `patches` list is strictly increasing in version and ends
//!   at the envelope's own version
//! - `patches` never exceeds [`NUM_PATCHES_TO_KEEP`] entries
//! - a tombstone is an envelope whose `value` is `None`; the serializer
//!   omits the key entirely

use json_patch::PatchOperation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Version;

/// Bound on the per-document patch history suffix. Older patches are
/// dropped and are not reconstructable.
pub const NUM_PATCHES_TO_KEEP: usize = 20;

/// Versioned JSON-patch describing one transition of a document.
///
/// `ops` is rooted under the synthetic wrapper used by
/// [`crate::codec::diff`], so transitions to and from absence are
/// expressible as add/remove of the root field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Version the document reached through this transition.
    pub version: Version,
    /// JSON-patch operation sequence.
    pub ops: Vec<PatchOperation>,
    /// Caller-supplied metadata carried through to subscribers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Optional per-commit extras attached to the emitted patch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchOptions {
    /// Opaque metadata stored on the patch.
    pub metadata: Option<Value>,
}

/// Full persisted record for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Current version of the lineage.
    pub version: Version,
    /// Live document value; `None` marks a tombstone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Bounded suffix of this key's patch history.
    #[serde(default)]
    pub patches: Vec<Patch>,
    /// High-resolution commit timestamp in nanoseconds since the epoch.
    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

impl Envelope {
    /// True when the envelope marks a removed document.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Version of a possibly-absent envelope; absence reads as
    /// [`Version::ABSENT`].
    pub fn current_version(envelope: Option<&Envelope>) -> Version {
        envelope.map_or(Version::ABSENT, |e| e.version)
    }

    /// The compare-and-set predicate: `expected` equals the stored version,
    /// or the envelope is absent and `expected` is the absent sentinel.
    pub fn matches(envelope: Option<&Envelope>, expected: Version) -> bool {
        Self::current_version(envelope) == expected
    }
}

/// Value paired with the version it was read at.
///
/// An absent or tombstoned key reads as `value: None`; a never-written key
/// additionally reads as [`Version::ABSENT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// Version observed at read time.
    pub version: Version,
    /// Live value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A live document as returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque document key.
    pub key: String,
    /// Document value.
    pub value: Value,
}
