//! # Value Objects
//!
//! Immutable values exchanged during a revision round: modifications, the
//! wire messages that carry them, and the per-round accounting.

use serde::{Deserialize, Serialize};
use shared_types::{Currency, FileContractRevision, Hash, Specifier, TransactionSignature};

use super::errors::ModificationError;

/// Wire tag of an insert action.
pub const ACTION_INSERT: Specifier = Specifier::new("Insert");

/// Wire tag of a delete action.
pub const ACTION_DELETE: Specifier = Specifier::new("Delete");

/// Wire tag of a partial-write action.
pub const ACTION_MODIFY: Specifier = Specifier::new("Modify");

/// One requested change to a contract's sector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    /// Insert a full sector at `index` (may equal the list length).
    Insert {
        /// Position of the new sector
        index: u64,
        /// Exactly one sector of data
        data: Vec<u8>,
    },
    /// Remove the sector at `index`.
    Delete {
        /// Position of the removed sector
        index: u64,
    },
    /// Overwrite part of the sector at `index`.
    Modify {
        /// Position of the rewritten sector
        index: u64,
        /// Byte offset inside the sector
        offset: u64,
        /// Bytes to write
        data: Vec<u8>,
    },
}

impl Modification {
    /// Sector index the modification targets.
    pub fn index(&self) -> u64 {
        match self {
            Modification::Insert { index, .. }
            | Modification::Delete { index }
            | Modification::Modify { index, .. } => *index,
        }
    }

    /// Length of the carried data.
    pub fn payload_len(&self) -> usize {
        match self {
            Modification::Insert { data, .. } | Modification::Modify { data, .. } => data.len(),
            Modification::Delete { .. } => 0,
        }
    }
}

/// Wire form of a [`Modification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionAction {
    /// `Insert`, `Delete` or `Modify`.
    pub action_type: Specifier,
    /// Target sector index.
    pub sector_index: u64,
    /// Write offset; only meaningful for `Modify`.
    pub offset: u64,
    /// Payload; empty for `Delete`.
    pub data: Vec<u8>,
}

impl From<Modification> for RevisionAction {
    fn from(modification: Modification) -> Self {
        match modification {
            Modification::Insert { index, data } => Self {
                action_type: ACTION_INSERT,
                sector_index: index,
                offset: 0,
                data,
            },
            Modification::Delete { index } => Self {
                action_type: ACTION_DELETE,
                sector_index: index,
                offset: 0,
                data: Vec::new(),
            },
            Modification::Modify {
                index,
                offset,
                data,
            } => Self {
                action_type: ACTION_MODIFY,
                sector_index: index,
                offset,
                data,
            },
        }
    }
}

impl TryFrom<RevisionAction> for Modification {
    type Error = ModificationError;

    fn try_from(action: RevisionAction) -> Result<Self, Self::Error> {
        let index = action.sector_index;
        match action.action_type {
            t if t == ACTION_INSERT => Ok(Modification::Insert {
                index,
                data: action.data,
            }),
            t if t == ACTION_DELETE => Ok(Modification::Delete { index }),
            t if t == ACTION_MODIFY => Ok(Modification::Modify {
                index,
                offset: action.offset,
                data: action.data,
            }),
            other => Err(ModificationError::UnknownModification(other.to_string())),
        }
    }
}

/// Accept / stop / reject signal exchanged between rounds and after each
/// checked message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationResponse {
    /// Proceed.
    Accept,
    /// End the session cleanly.
    Stop,
    /// Abort with a reason.
    Reject(String),
}

/// Revenue and collateral produced by a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FinancialDelta {
    /// Upload bandwidth charged.
    pub bandwidth_revenue: Currency,
    /// Storage charged until the proof deadline.
    pub storage_revenue: Currency,
    /// Collateral the host puts at risk.
    pub collateral_risked: Currency,
}

impl FinancialDelta {
    /// Field-wise sum, `None` on overflow.
    pub fn checked_add(&self, other: &FinancialDelta) -> Option<FinancialDelta> {
        Some(FinancialDelta {
            bandwidth_revenue: self.bandwidth_revenue.checked_add(other.bandwidth_revenue)?,
            storage_revenue: self.storage_revenue.checked_add(other.storage_revenue)?,
            collateral_risked: self.collateral_risked.checked_add(other.collateral_risked)?,
        })
    }

    /// Storage plus bandwidth: what the renter pays for the round.
    pub fn total_revenue(&self) -> Option<Currency> {
        self.storage_revenue.checked_add(self.bandwidth_revenue)
    }
}

/// Result of processing a modification batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Sector list after every modification.
    pub new_roots: Vec<Hash>,
    /// Roots no longer referenced by the contract, in order of removal.
    pub sectors_removed: Vec<Hash>,
    /// Roots newly referenced by the contract.
    pub sectors_gained: Vec<Hash>,
    /// Data for each entry of `sectors_gained`.
    pub gained_sector_data: Vec<Vec<u8>>,
    /// Accumulated accounting.
    pub delta: FinancialDelta,
}

/// Latest revision of a contract and the signatures that authorize it, sent
/// once when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentRevision {
    /// Latest signed revision.
    pub revision: FileContractRevision,
    /// Renter and host signatures over it.
    pub signatures: Vec<TransactionSignature>,
}
