use alloy_primitives::Address;

/// Errors raised by a [`TxSigner`](crate::TxSigner).
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The request is missing a field the signer cannot resolve itself.
    #[error("cannot sign request: missing `{0}`")]
    MissingField(&'static str),

    /// The request's sender does not match the signer's address.
    #[error("request `from` {from} does not match signer address {signer}")]
    AddressMismatch {
        /// The request's sender.
        from: Address,
        /// The signer's address.
        signer: Address,
    },

    /// The signer does not support this kind of transaction.
    #[error("unsupported transaction type: {0}")]
    UnsupportedOperation(&'static str),

    /// Error from the underlying signing backend (HSM, keystore, remote
    /// service, local curve implementation).
    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl SignerError {
    /// Wrap a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}
