use crate::managers::InFlight;
use alloy_primitives::B256;
use ferrite_json_rpc::Id;
use serde_json::value::RawValue;
use std::fmt;
use tokio::sync::{broadcast, oneshot};

/// Instructions for the pubsub service.
pub(crate) enum PubSubInstruction {
    /// Send a request.
    Request(InFlight),
    /// Cancel an in-flight request, dropping its sink. A response that has
    /// already resolved the sink wins; cancelling afterwards is a no-op.
    Cancel(Id),
    /// Get the notification receiver for a local subscription ID.
    GetSub(B256, oneshot::Sender<broadcast::Receiver<Box<RawValue>>>),
    /// Unsubscribe from a subscription.
    Unsubscribe(B256),
    /// Close the service permanently.
    Close,
}

impl fmt::Debug for PubSubInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(arg0) => f.debug_tuple("Request").field(arg0).finish(),
            Self::Cancel(arg0) => f.debug_tuple("Cancel").field(arg0).finish(),
            Self::GetSub(arg0, _) => f.debug_tuple("GetSub").field(arg0).finish(),
            Self::Unsubscribe(arg0) => f.debug_tuple("Unsubscribe").field(arg0).finish(),
            Self::Close => f.write_str("Close"),
        }
    }
}
