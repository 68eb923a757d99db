#![doc = include_str!("../README.md")]
#![warn(missing_docs, unreachable_pub, rustdoc::all)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[doc(inline)]
pub use ferrite_eips as eips;

#[doc(inline)]
pub use ferrite_json_rpc as json_rpc;

/// Interface with an Ethereum node: readers, wallets, testers.
pub mod providers {
    #[doc(inline)]
    pub use ferrite_provider::*;
}

#[cfg(feature = "pubsub")]
#[doc(inline)]
pub use ferrite_pubsub as pubsub;

#[doc(inline)]
pub use ferrite_rpc_client as rpc_client;

/// Types for the Ethereum JSON-RPC wire protocol.
pub mod rpc_types {
    #[doc(inline)]
    pub use ferrite_rpc_types::*;
}

#[doc(inline)]
pub use ferrite_serde as serde_helpers;

#[doc(inline)]
pub use ferrite_signer as signer;

#[doc(inline)]
pub use ferrite_transport as transport;

#[cfg(feature = "reqwest")]
#[doc(inline)]
pub use ferrite_transport_http as transport_http;

#[cfg(feature = "ws")]
#[doc(inline)]
pub use ferrite_transport_ws as transport_ws;
