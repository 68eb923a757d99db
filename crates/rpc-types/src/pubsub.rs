//! Types for the `eth_subscribe` parameter surface.

use crate::Filter;
use serde::{Deserialize, Serialize, Serializer};

/// Subscription kind accepted by `eth_subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionKind {
    /// New block headers.
    NewHeads,
    /// Logs matching a filter.
    Logs,
    /// Hashes of transactions entering the pending pool.
    NewPendingTransactions,
    /// Node sync-status transitions.
    Syncing,
}

/// Any additional parameters for an `eth_subscribe` call, beyond the kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Params {
    /// No additional parameters.
    #[default]
    None,
    /// Log filter parameters, for `logs` subscriptions.
    Logs(Box<Filter>),
}

impl Params {
    /// Returns `true` if there are no additional parameters.
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<Filter> for Params {
    fn from(filter: Filter) -> Self {
        Self::Logs(Box::new(filter))
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Logs(filter) => filter.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_camel_case() {
        assert_eq!(serde_json::to_string(&SubscriptionKind::NewHeads).unwrap(), "\"newHeads\"");
        assert_eq!(
            serde_json::to_string(&SubscriptionKind::NewPendingTransactions).unwrap(),
            "\"newPendingTransactions\""
        );
        assert_eq!(serde_json::to_string(&SubscriptionKind::Syncing).unwrap(), "\"syncing\"");
    }
}
