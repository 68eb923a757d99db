//! Types for the test-node snapshot lifecycle.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Error raised when a snapshot id is not of the expected shape.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid snapshot id {0:?}: expected `0x` followed by hex digits")]
pub struct SnapshotIdError(String);

/// An opaque snapshot handle produced by a test node's `snapshot` method.
///
/// Only the original bytes are meaningful: the id must be passed back to
/// `revert` verbatim. A successful revert invalidates this id and every
/// snapshot taken after it.
///
/// The id is validated on construction: `0x` followed by zero or more hex
/// digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Validate and wrap a snapshot id.
    pub fn new(id: impl Into<String>) -> Result<Self, SnapshotIdError> {
        let id = id.into();
        let Some(digits) = id.strip_prefix("0x") else {
            return Err(SnapshotIdError(id));
        };
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SnapshotIdError(id));
        }
        Ok(Self(id))
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SnapshotId {
    type Err = SnapshotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for SnapshotId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SnapshotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Fork configuration for a test node's `reset` method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forking {
    /// The upstream endpoint to fork from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_rpc_url: Option<String>,
    /// The block height to fork at. Latest when absent.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub block_number: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_ids() {
        for id in ["0x", "0x0", "0x1", "0xDeadBeef", "0x0123456789abcdefABCDEF"] {
            assert!(SnapshotId::new(id).is_ok(), "{id} should be accepted");
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        for id in ["", "1", "0xzz", "0x12 34", "Ox1"] {
            assert!(SnapshotId::new(id).is_err(), "{id} should be rejected");
        }
    }

    #[test]
    fn round_trips_verbatim() {
        let id: SnapshotId = serde_json::from_str("\"0xDeadBeef\"").unwrap();
        // The original casing is preserved: only the original bytes are
        // meaningful to the node.
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0xDeadBeef\"");
    }
}
