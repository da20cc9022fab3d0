//! Shared primitive types: document versions and subscription ids.

use serde::{Deserialize, Serialize};

/// Identifier handed out by the subscription bus.
pub type SubscriptionId = u64;

/// Ordered `(major, minor)` document version.
///
/// `major` is fixed at creation time (a high-resolution timestamp), `minor`
/// increments by one on every in-place mutation of the same live lineage.
/// The derived `Ord` is lexicographic: `a > b` iff `a.major > b.major`, or
/// the majors are equal and `a.minor > b.minor`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Version {
    /// Creation-time component, monotonically increasing across lineages.
    pub major: u64,
    /// Mutation counter within one lineage.
    pub minor: u64,
}

impl Version {
    /// Sentinel for a key that has never held a document.
    pub const ABSENT: Version = Version { major: 0, minor: 0 };

    /// Next version within the same lineage.
    pub fn successor(self) -> Version {
        Version {
            major: self.major,
            minor: self.minor + 1,
        }
    }

    /// True for the `(0, 0)` sentinel.
    pub fn is_absent(self) -> bool {
        self == Self::ABSENT
    }
}
