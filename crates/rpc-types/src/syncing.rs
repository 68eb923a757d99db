use serde::{Deserialize, Serialize};

/// Sync progress details, reported while the node is catching up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    /// The block the sync started at.
    #[serde(with = "ferrite_serde::quantity")]
    pub starting_block: u64,
    /// The block the node is currently at.
    #[serde(with = "ferrite_serde::quantity")]
    pub current_block: u64,
    /// The highest block seen on the network.
    #[serde(with = "ferrite_serde::quantity")]
    pub highest_block: u64,
}

/// The result of `eth_syncing` and the payload of `syncing` subscription
/// notifications: either progress details, or `false` when in sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncStatus {
    /// The node is syncing.
    Info(SyncInfo),
    /// The node is not syncing (always `false`).
    None(bool),
}

impl SyncStatus {
    /// Returns `true` if the node reports that it is syncing.
    pub const fn is_syncing(&self) -> bool {
        matches!(self, Self::Info(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_forms() {
        let synced: SyncStatus = serde_json::from_str("false").unwrap();
        assert!(!synced.is_syncing());

        let syncing: SyncStatus = serde_json::from_str(
            r#"{"startingBlock":"0x0","currentBlock":"0x10","highestBlock":"0x20"}"#,
        )
        .unwrap();
        assert!(syncing.is_syncing());
    }
}
