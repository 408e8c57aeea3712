//! # Error Types
//!
//! Errors raised by the shared encoding and transaction validation code.

use thiserror::Error;

/// Errors from the canonical object encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Object is larger than the caller allows.
    #[error("Object too large: {size} bytes, max {max_size}")]
    ObjectTooLarge { size: u64, max_size: u64 },

    /// Bytes could not be decoded into the expected type.
    #[error("Malformed object: {0}")]
    Malformed(String),

    /// Object could not be encoded.
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),
}

/// Reasons a transaction fails standalone validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// Transaction carries no file contract revision.
    #[error("Transaction contains no file contract revision")]
    NoRevisions,

    /// Whole-transaction signature also lists individual fields.
    #[error("Signature {index} covers the whole transaction and individual fields")]
    WholeTransactionWithFields { index: usize },

    /// Covered field index is out of range or not strictly increasing.
    #[error("Signature {index} has invalid covered fields")]
    BadCoveredFields { index: usize },

    /// Signature does not belong to any revision in the transaction.
    #[error("Signature {index} has unknown parent")]
    UnknownParent { index: usize },

    /// Public key index not present in the unlock conditions.
    #[error("Signature {index} uses public key {key_index} which does not exist")]
    BadPublicKeyIndex { index: usize, key_index: u64 },

    /// Same key signed the same parent twice.
    #[error("Signature {index} duplicates an earlier signature")]
    DuplicateSignature { index: usize },

    /// Signature or unlock conditions are timelocked past the current height.
    #[error("Timelock {timelock} not reached at height {height}")]
    Timelocked { timelock: u64, height: u64 },

    /// Signature bytes are malformed or do not verify.
    #[error("Signature {index} is invalid")]
    InvalidSignature { index: usize },

    /// A revision collected fewer signatures than its unlock conditions require.
    #[error("Revision has {got} signatures, {required} required")]
    MissingSignatures { got: u64, required: u64 },

    /// Part of the transaction could not be encoded for hashing.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
