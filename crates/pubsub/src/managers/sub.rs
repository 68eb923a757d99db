use alloy_primitives::{map::HashMap, B256, U256};
use bimap::BiHashMap;
use ferrite_json_rpc::{EthNotification, SerializedRequest};
use serde_json::value::RawValue;
use tokio::sync::broadcast;

/// Capacity of each subscription's notification channel. A receiver that
/// falls further behind than this loses the oldest notifications and
/// observes a lag error on its next receive.
const NOTIFICATION_BUFFER: usize = 16;

/// One tracked subscription: the request that created it, and the broadcast
/// channel its notifications fan out on.
///
/// The map key (the hash of the creating request) identifies the
/// subscription across connections; the key is owned by the manager, so no
/// copy of it lives here. The creating request is retained so that a tracked
/// subscription remains inspectable after a reconnect invalidates its server
/// id.
#[derive(Clone)]
pub(crate) struct TrackedSub {
    /// The request that started the subscription.
    request: SerializedRequest,
    /// Fan-out channel for notification payloads.
    tx: broadcast::Sender<Box<RawValue>>,
}

impl std::fmt::Debug for TrackedSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedSub")
            .field("method", &self.request.method())
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl TrackedSub {
    fn new(request: SerializedRequest) -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self { request, tx }
    }

    /// Open a new receiving handle on the fan-out channel.
    fn receiver(&self) -> broadcast::Receiver<Box<RawValue>> {
        self.tx.subscribe()
    }

    /// Publish a notification payload. With nobody listening the payload is
    /// dropped on the floor; the channel buffers only for live receivers.
    fn publish(&self, payload: Box<RawValue>) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(payload);
        }
    }
}

/// Tracks active subscriptions and the mapping between the server-assigned
/// subscription id (valid only for the current connection) and the local
/// params-hash id (stable across reconnects).
#[derive(Debug, Default)]
pub(crate) struct SubscriptionManager {
    /// Active subscriptions, keyed by local id.
    subs: HashMap<B256, TrackedSub>,
    /// Server id <-> local id.
    ids: BiHashMap<U256, B256>,
}

impl SubscriptionManager {
    /// Get the number of active subscriptions.
    pub(crate) fn len(&self) -> usize {
        self.subs.len()
    }

    /// Insert or refresh a subscription, recording the server id for this
    /// connection. Returns the local id.
    pub(crate) fn upsert(&mut self, request: SerializedRequest, server_id: U256) -> B256 {
        let local_id = request.params_hash();
        self.subs.entry(local_id).or_insert_with(|| TrackedSub::new(request));
        self.ids.insert(server_id, local_id);
        local_id
    }

    /// Get a receiver for the notification channel of the subscription with
    /// the given local id.
    pub(crate) fn get_rx(&self, local_id: B256) -> Option<broadcast::Receiver<Box<RawValue>>> {
        Some(self.subs.get(&local_id)?.receiver())
    }

    /// Translate a local id to the server id for the current connection.
    pub(crate) fn server_id_for(&self, local_id: &B256) -> Option<U256> {
        self.ids.get_by_right(local_id).copied()
    }

    /// Dispatch a notification to the matching subscription's channel.
    ///
    /// Returns `false` if the notification's server id is unknown.
    pub(crate) fn notify(&mut self, notification: EthNotification) -> bool {
        let Some(local_id) = self.ids.get_by_left(&notification.subscription) else {
            return false;
        };
        if let Some(sub) = self.subs.get(local_id) {
            sub.publish(notification.result);
        }
        true
    }

    /// Remove the subscription with the given local id.
    pub(crate) fn remove_sub(&mut self, local_id: B256) {
        self.subs.remove(&local_id);
        self.ids.remove_by_right(&local_id);
    }

    /// Drop all server ids.
    ///
    /// Called on reconnect: the new connection has no server-side
    /// subscriptions, so notifications for the old ids must no longer route.
    /// The local sinks are retained for observability; callers re-subscribe
    /// explicitly if they want continuity.
    pub(crate) fn drop_server_ids(&mut self) -> usize {
        let lost = self.ids.len();
        self.ids.clear();
        lost
    }

    /// Clear all subscriptions and ids.
    pub(crate) fn clear(&mut self) {
        self.subs.clear();
        self.ids.clear();
    }
}
