mod in_flight;
pub(crate) use in_flight::{Fulfillment, InFlight};

mod req;
pub(crate) use req::RequestManager;

mod sub;
pub(crate) use sub::SubscriptionManager;
