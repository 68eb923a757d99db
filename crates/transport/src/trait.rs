use crate::{BoxTransport, TransportError, TransportFut};
use ferrite_json_rpc::{RequestPacket, ResponsePacket};
use tower::Service;

/// A `Transport` manages the JSON-RPC request/response lifecycle.
///
/// `Transport`s should be instantiated via the
/// [`TransportConnect`](crate::TransportConnect) trait.
///
/// Transports are reponsible for the following:
///
/// - Communicating with the RPC server.
/// - Managing any ongoing connection or communication resource.
/// - Associating responses with requests.
/// - Associating notifications with subscriptions.
///
/// This trait is blanket implemented for all appropriate types.
pub trait Transport:
    private::Sealed
    + Service<
        RequestPacket,
        Response = ResponsePacket,
        Error = TransportError,
        Future = TransportFut<'static>,
    > + Send
    + Sync
    + 'static
{
    /// Convert this transport into a boxed trait object.
    fn boxed(self) -> BoxTransport
    where
        Self: Sized + Clone + Send + Sync + 'static,
    {
        BoxTransport::new(self)
    }
}

impl<T> Transport for T where
    T: private::Sealed
        + Service<
            RequestPacket,
            Response = ResponsePacket,
            Error = TransportError,
            Future = TransportFut<'static>,
        > + Send
        + Sync
        + 'static
{
}

mod private {
    use super::*;

    pub trait Sealed {}
    impl<T> Sealed for T where
        T: Service<
                RequestPacket,
                Response = ResponsePacket,
                Error = TransportError,
                Future = TransportFut<'static>,
            > + Send
            + Sync
            + 'static
    {
    }
}
