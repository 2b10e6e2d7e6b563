use thiserror::Error;

use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    #[error("invalid bech32 encoding: {0}")]
    Bech32(String),
    #[error("mixed-case invoice")]
    MixedCase,
    #[error("not a lightning invoice hrp: {0}")]
    Hrp(String),
    #[error("unknown currency prefix: {0}")]
    Currency(String),
    #[error("invalid amount: {0}")]
    Amount(String),
    #[error("invoice too short")]
    TooShort,
    #[error("truncated tagged field")]
    TruncatedField,
    #[error("missing payment hash")]
    MissingPaymentHash,
    #[error("invalid utf-8 description")]
    Description,
    #[error("invalid signature: {0}")]
    Signature(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("invalid amount: {0}")]
    Amount(String),
    #[error("unsupported required parameter: {0}")]
    RequiredParameter(String),
    #[error("address for {found} on {expected}")]
    NetworkMismatch { expected: Network, found: Network },
}
