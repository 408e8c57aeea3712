//! # Domain Entities
//!
//! The host's record of a contract (`StorageObligation`) and the settings it
//! advertises to renters.

use serde::{Deserialize, Serialize};
use shared_types::{
    BlockHeight, ContractId, Currency, FileContractRevision, Hash, Signature, Transaction,
    TransactionSignature, UnlockHash,
};

use super::invariants::{invariant_root_matches, invariant_size_matches};

/// Production sector size (4 MiB).
pub const SECTOR_SIZE: u64 = 1 << 22;

/// Sector size used by tests.
pub const TESTING_SECTOR_SIZE: u64 = 1 << 12;

/// Default cap on the encoded size of a modification batch.
pub const DEFAULT_MAX_REVISE_BATCH_SIZE: u64 = 17 * (1 << 20);

/// The host's record of one file contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObligation {
    /// Ordered Merkle roots of the contract's sectors.
    pub sector_roots: Vec<Hash>,
    /// Latest revision both parties signed.
    pub revision: FileContractRevision,
    /// Signatures over `revision`.
    pub revision_signatures: Vec<TransactionSignature>,
    /// Storage revenue expected once the proof is accepted.
    pub anticipated_revenue: Currency,
    /// Bandwidth revenue already earned.
    pub confirmed_revenue: Currency,
    /// Collateral the host would lose on a missed proof.
    pub risked_collateral: Currency,
}

impl StorageObligation {
    /// New obligation with zeroed counters.
    pub fn new(
        revision: FileContractRevision,
        revision_signatures: Vec<TransactionSignature>,
        sector_roots: Vec<Hash>,
    ) -> Self {
        Self {
            sector_roots,
            revision,
            revision_signatures,
            anticipated_revenue: Currency::zero(),
            confirmed_revenue: Currency::zero(),
            risked_collateral: Currency::zero(),
        }
    }

    /// Contract this obligation tracks.
    pub fn id(&self) -> ContractId {
        self.revision.parent_id
    }

    /// Height by which the storage proof is due.
    pub fn proof_deadline(&self) -> BlockHeight {
        self.revision.window_start
    }

    /// The signed revision as a transaction.
    pub fn revision_transaction(&self) -> Transaction {
        Transaction {
            file_contract_revisions: vec![self.revision.clone()],
            transaction_signatures: self.revision_signatures.clone(),
        }
    }

    /// Sector list agrees with the revision's size and root.
    pub fn is_consistent(&self, sector_size: u64) -> bool {
        invariant_size_matches(&self.sector_roots, &self.revision, sector_size)
            && invariant_root_matches(&self.sector_roots, &self.revision)
    }
}

/// Terms the host advertises each round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSettings {
    /// Whether the host takes new contracts. Revisions continue regardless.
    pub accepting_contracts: bool,
    /// Largest encoded modification batch accepted per round.
    pub max_revise_batch_size: u64,
    /// Price per uploaded byte.
    pub upload_bandwidth_price: Currency,
    /// Price per stored byte per block.
    pub storage_price: Currency,
    /// Collateral per stored byte per block.
    pub collateral: Currency,
    /// Size of every sector.
    pub sector_size: u64,
    /// Length of the storage proof window in blocks.
    pub window_size: u64,
    /// Address the host is paid to.
    pub unlock_hash: UnlockHash,
    /// Version of these settings; bumped on every change.
    pub revision_number: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            accepting_contracts: true,
            max_revise_batch_size: DEFAULT_MAX_REVISE_BATCH_SIZE,
            upload_bandwidth_price: Currency::zero(),
            storage_price: Currency::zero(),
            collateral: Currency::zero(),
            sector_size: SECTOR_SIZE,
            window_size: 144,
            unlock_hash: [0u8; 32],
            revision_number: 0,
        }
    }
}

impl HostSettings {
    /// Settings for testing (small sectors, non-zero prices).
    pub fn for_testing() -> Self {
        Self {
            accepting_contracts: true,
            max_revise_batch_size: 1 << 20,
            upload_bandwidth_price: Currency::from(2u64),
            storage_price: Currency::from(1u64),
            collateral: Currency::from(1u64),
            sector_size: TESTING_SECTOR_SIZE,
            window_size: 10,
            unlock_hash: [0u8; 32],
            revision_number: 0,
        }
    }
}

/// Settings plus the host's signature over their encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSettings {
    /// Advertised settings.
    pub settings: HostSettings,
    /// Host signature over `hash_object(settings)`.
    pub signature: Signature,
}
