//! Protocol versioning for controller/module pairings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version for a pipeline type
///
/// Incompatible controller/module pairings are rejected before any call is
/// attempted.
///
/// Compatibility rules:
/// - Major versions must match exactly (breaking changes)
/// - The module's minor version must be at least the controller's
///   (backward-compatible additions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    /// Major version (breaking changes)
    pub major: u32,
    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ProtocolVersion {
    /// Creates a new protocol version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Checks whether a module declaring this version satisfies a
    /// controller expecting `expected`
    ///
    /// The module must share the controller's major version and provide at
    /// least the controller's minor version.
    pub fn satisfies(&self, expected: &ProtocolVersion) -> bool {
        self.major == expected.major && self.minor >= expected.minor
    }

    /// Checks if this version is older than another
    pub fn is_older_than(&self, other: &ProtocolVersion) -> bool {
        self.major < other.major || (self.major == other.major && self.minor < other.minor)
    }

    /// Checks if this version is newer than another
    pub fn is_newer_than(&self, other: &ProtocolVersion) -> bool {
        self.major > other.major || (self.major == other.major && self.minor > other.minor)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}
