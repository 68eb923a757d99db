//! Module for housing transport layers.

mod retry;
pub use retry::{
    retry_with, FaultClassifier, RetryBackoffLayer, RetryBackoffService, RetryConfig, RetryPolicy,
};
