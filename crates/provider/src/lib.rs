#![doc = include_str!("../README.md")]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod builder;
pub use builder::ProviderBuilder;

mod chain_profile;
pub use chain_profile::ChainProfile;

mod error;
pub use error::{ClientClosed, SessionClosed, SimulateError, TesterError, TxError};

mod fill;

mod pending;
pub use pending::PendingTransactionBuilder;

mod provider;
pub use provider::Provider;

mod root;
pub use root::RootProvider;

mod tester;
pub use tester::{ImpersonationSession, TestNodeMode, Tester};

pub mod utils;

mod wallet;
pub use wallet::WalletProvider;

#[cfg(feature = "pubsub")]
pub use ferrite_pubsub::{RawSubscription, Subscription, SubscriptionItem};
