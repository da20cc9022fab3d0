//! Envelope byte codec and value-to-value patch computation.

use json_patch::PatchOperation;
use serde_json::{Map, Value};

use crate::doc::Envelope;

/// Synthetic wrapper field that patch operations are rooted under.
///
/// Diffing `{}` against `{"root": v}` makes creation and removal
/// expressible as ordinary add/remove operations.
pub const ROOT_FIELD: &str = "root";

/// Encodes an envelope as canonical JSON bytes.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(envelope)
}

/// Parses envelope bytes.
///
/// Structural invariants are not validated here; callers treat a parse
/// failure as storage corruption.
pub fn decode(bytes: &[u8]) -> Result<Envelope, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Computes the JSON-patch operations transitioning `prev` to `next`,
/// rooted under [`ROOT_FIELD`].
///
/// Returns an empty sequence iff the two values are structurally equal
/// (including both absent).
pub fn diff(prev: Option<&Value>, next: Option<&Value>) -> Vec<PatchOperation> {
    json_patch::diff(&wrap(prev), &wrap(next)).0
}

fn wrap(value: Option<&Value>) -> Value {
    let mut object = Map::new();
    if let Some(value) = value {
        object.insert(ROOT_FIELD.to_string(), value.clone());
    }
    Value::Object(object)
}
