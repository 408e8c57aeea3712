//! # Domain Errors
//!
//! Error types for the revision protocol.
//!
//! Each protocol stage has its own enum; [`SessionError`] wraps all of them
//! and decides whether the renter is sent a rejection before the session
//! aborts.

use shared_types::{short_hex, ContractId, Currency, EncodingError, Hash, TransactionError};
use thiserror::Error;

/// Errors raised while applying a batch of sector modifications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModificationError {
    /// Index is out of range for the current sector list.
    #[error("Modification points to sector {index}, contract has {len}")]
    BadModificationIndex {
        /// Requested index
        index: u64,
        /// Sector count at the time of the modification
        len: usize,
    },

    /// Payload is larger than a sector.
    #[error("Modification payload of {size} bytes exceeds sector size {max}")]
    LargeSector {
        /// Payload size
        size: usize,
        /// Sector size
        max: u64,
    },

    /// Inserted or stored sector is not exactly one sector long.
    #[error("Sector has {size} bytes, expected {expected}")]
    BadSectorSize {
        /// Actual size
        size: usize,
        /// Sector size
        expected: u64,
    },

    /// Partial write falls outside the sector.
    #[error("Illegal offset {offset} and length {length} for sector size {sector_size}")]
    IllegalOffsetAndLength {
        /// Write offset
        offset: u64,
        /// Write length
        length: usize,
        /// Sector size
        sector_size: u64,
    },

    /// Wire action tag is not Insert, Delete or Modify.
    #[error("Unknown modification type: {0}")]
    UnknownModification(String),

    /// Contract's proof window has already opened.
    #[error("Proof deadline {deadline} has passed at height {height}")]
    ProofDeadlinePassed {
        /// Proof deadline of the contract
        deadline: u64,
        /// Current block height
        height: u64,
    },

    /// Sector targeted by a partial write could not be read.
    #[error("Sector {root} unavailable: {reason}")]
    SectorUnavailable {
        /// Short hex of the sector root
        root: String,
        /// Store error
        reason: String,
    },

    /// Price arithmetic overflowed.
    #[error("Currency overflow while pricing modifications")]
    CurrencyOverflow,
}

/// Errors raised when a renter's proposed revision does not match the host's
/// own accounting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionError {
    /// A non-volatile field changed.
    #[error("Revision changes fixed field: {field}")]
    ChangedTerms {
        /// Name of the changed field
        field: &'static str,
    },

    /// Revision number did not increase.
    #[error("Revision number {proposed} does not exceed {prior}")]
    RevisionNumberNotIncreased {
        /// Current revision number
        prior: u64,
        /// Proposed revision number
        proposed: u64,
    },

    /// File size does not match the processed sector list.
    #[error("Bad file size: expected {expected}, got {proposed}")]
    BadFileSize {
        /// Size implied by the sector list
        expected: u64,
        /// Proposed size
        proposed: u64,
    },

    /// Merkle root does not match the processed sector list.
    #[error("Bad file merkle root")]
    BadMerkleRoot,

    /// Host payout is not the prior payout plus revenue.
    #[error("Bad host payout: expected {expected}, got {proposed}")]
    BadHostPayout {
        /// Expected payout
        expected: Currency,
        /// Proposed payout
        proposed: Currency,
    },

    /// Renter cannot afford the round.
    #[error("Insufficient renter funds: has {available}, needs {required}")]
    InsufficientRenterFunds {
        /// Renter payout before the round
        available: Currency,
        /// Revenue owed for the round
        required: Currency,
    },

    /// Renter payout is not the prior payout minus revenue.
    #[error("Bad renter payout: expected {expected}, got {proposed}")]
    BadRenterPayout {
        /// Expected payout
        expected: Currency,
        /// Proposed payout
        proposed: Currency,
    },

    /// Host collateral is not the prior collateral plus collateral at risk.
    #[error("Bad host collateral: expected {expected}, got {proposed}")]
    BadCollateral {
        /// Expected collateral
        expected: Currency,
        /// Proposed collateral
        proposed: Currency,
    },

    /// Payout arithmetic overflowed.
    #[error("Currency overflow while checking payouts")]
    CurrencyOverflow,
}

/// Errors raised while countersigning a revision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// Renter signature covers the whole transaction.
    #[error("Renter signature covers the whole transaction")]
    RenterOverreach,

    /// Renter signed with a key slot other than its own.
    #[error("Renter signature uses key index {0}")]
    WrongKeyIndex(u64),

    /// Completed transaction is not valid.
    #[error("Invalid revision transaction: {0}")]
    InvalidTransaction(#[from] TransactionError),

    /// Signing input could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Errors from the obligation lock table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Lock was not acquired before the timeout.
    #[error("Timed out after {waited_ms}ms waiting for obligation {}", short_hex(.id))]
    Timeout {
        /// Obligation that was contended
        id: ContractId,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// Lock is held and the caller asked not to wait.
    #[error("Obligation {} is locked", short_hex(.0))]
    AlreadyLocked(ContractId),
}

/// Errors from obligation and sector storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Obligation does not exist.
    #[error("Obligation {} not found", short_hex(.0))]
    ObligationNotFound(ContractId),

    /// Sector data does not exist.
    #[error("Sector {} not found", short_hex(.0))]
    SectorNotFound(Hash),

    /// Backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors from the framed negotiation connection.
#[derive(Debug, Error)]
pub enum ConnError {
    /// Current deadline expired.
    #[error("Connection deadline exceeded")]
    DeadlineExceeded,

    /// Peer closed the connection.
    #[error("Connection closed by peer")]
    Closed,

    /// Length prefix exceeds what the reader accepts.
    #[error("Object of {size} bytes exceeds limit {max}")]
    ObjectTooLarge {
        /// Announced frame size
        size: u64,
        /// Reader's limit
        max: u64,
    },

    /// Transport error.
    #[error("Connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end a negotiation session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport failure or deadline.
    #[error(transparent)]
    Conn(#[from] ConnError),

    /// Renter sent an undecodable or oversized object.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Modification batch was rejected.
    #[error(transparent)]
    Modification(#[from] ModificationError),

    /// Proposed revision was rejected.
    #[error(transparent)]
    Revision(#[from] RevisionError),

    /// Renter signature was rejected.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Obligation lock could not be taken.
    #[error(transparent)]
    ObligationLocked(#[from] LockError),

    /// Renter asked for a contract the host has no obligation for.
    #[error("No storage obligation for contract {}", short_hex(.0))]
    ObligationNotFound(ContractId),

    /// Storage failure, including a failed commit.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored obligation does not agree with its own revision.
    #[error("Obligation {} is inconsistent with its revision", short_hex(.0))]
    InconsistentObligation(ContractId),

    /// Renter rejected something the host sent.
    #[error("Renter rejected: {0}")]
    PeerRejected(String),
}

impl SessionError {
    /// Whether the renter broke protocol rules (as opposed to a transport or
    /// storage failure on either side).
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            SessionError::Modification(_) | SessionError::Revision(_) | SessionError::Signing(_)
        )
    }
}
