//! # File Contract Revision
//!
//! The versioned, two-party signed terms of a storage contract. Fields split
//! into two groups:
//!
//! | Group | Fields |
//! |-------|--------|
//! | Non-volatile | `parent_id`, `unlock_conditions`, `window_start`, `window_end`, `renter_address`, `host_address` |
//! | Volatile | `revision_number`, `file_size`, `file_merkle_root`, `renter_payout`, `host_payout`, `host_collateral` |
//!
//! Non-volatile fields are fixed at formation and must never change across
//! revisions.

use serde::{Deserialize, Serialize};

use crate::entities::{BlockHeight, ContractId, Currency, Hash, PublicKey, UnlockHash};

/// Index of the renter's key in [`UnlockConditions::public_keys`].
pub const RENTER_KEY_INDEX: u64 = 0;

/// Index of the host's key in [`UnlockConditions::public_keys`].
pub const HOST_KEY_INDEX: u64 = 1;

/// Who may sign for a contract, and from which height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnlockConditions {
    /// Height before which no signature is valid.
    pub timelock: BlockHeight,
    /// Keys allowed to sign; slot 0 is the renter, slot 1 the host.
    pub public_keys: Vec<PublicKey>,
    /// Number of distinct keys that must sign a revision.
    pub signatures_required: u64,
}

impl UnlockConditions {
    /// Standard renter + host 2-of-2 conditions.
    pub fn two_party(renter: PublicKey, host: PublicKey) -> Self {
        Self {
            timelock: 0,
            public_keys: vec![renter, host],
            signatures_required: 2,
        }
    }
}

/// A revision of a file contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContractRevision {
    /// Contract being revised.
    pub parent_id: ContractId,
    /// Signing rules of the contract.
    pub unlock_conditions: UnlockConditions,
    /// Strictly increasing revision counter.
    pub revision_number: u64,
    /// Total bytes stored under the contract.
    pub file_size: u64,
    /// Merkle root over the contract's ordered sector roots.
    pub file_merkle_root: Hash,
    /// Height at which the storage proof window opens (the proof deadline).
    pub window_start: BlockHeight,
    /// Height at which the storage proof window closes.
    pub window_end: BlockHeight,
    /// Remaining payout to the renter on a valid proof.
    pub renter_payout: Currency,
    /// Payout to the host on a valid proof.
    pub host_payout: Currency,
    /// Collateral the host has locked into the contract.
    pub host_collateral: Currency,
    /// Renter's payout address.
    pub renter_address: UnlockHash,
    /// Host's payout address.
    pub host_address: UnlockHash,
}

impl FileContractRevision {
    /// Whether two revisions agree on every non-volatile field.
    pub fn same_terms(&self, other: &FileContractRevision) -> bool {
        self.parent_id == other.parent_id
            && self.unlock_conditions == other.unlock_conditions
            && self.window_start == other.window_start
            && self.window_end == other.window_end
            && self.renter_address == other.renter_address
            && self.host_address == other.host_address
    }
}
