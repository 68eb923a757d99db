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

mod access_list;
pub use access_list::{AccessList, AccessListItem, AccessListResult};

mod block;
pub use block::{Block, BlockId, BlockNumberOrTag, Header};

mod filter;
pub use filter::{Filter, ValueOrArray};

mod log;
pub use log::Log;

mod pubsub;
pub use pubsub::{Params, SubscriptionKind};

mod simulate;
pub use simulate::{
    AssetChange, AssetDelta, BlockStateCall, CallResult, SimCallResult, SimulateCall,
    SimulateError, SimulatePayload, SimulateResult, SimulatedBlock, TokenInfo,
};

mod snapshot;
pub use snapshot::{Forking, SnapshotId, SnapshotIdError};

mod state;
pub use state::{AccountOverride, OverrideError, StateOverride, StateOverridesBuilder};

mod syncing;
pub use syncing::{SyncInfo, SyncStatus};

mod transaction;
pub use transaction::{
    BlobTransactionRequest, Transaction, TransactionReceipt, TransactionRequest,
    TxValidationError,
};

pub use ferrite_eips::eip4844::BlobTransactionSidecar;
