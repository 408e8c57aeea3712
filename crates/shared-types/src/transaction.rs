//! # Revision Transactions
//!
//! The signed container that carries a file contract revision. A signature
//! commits to a subset of the transaction described by its
//! [`CoveredFields`]; the renter and host each sign only the revision so that
//! neither party can be bound to fields it never saw.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::contract::{FileContractRevision, UnlockConditions};
use crate::crypto::verify_hash;
use crate::encoding::encode;
use crate::entities::{BlockHeight, ContractId, Hash, Signature};
use crate::errors::TransactionError;

/// Parts of a transaction a signature commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CoveredFields {
    /// Commit to every revision in the transaction.
    pub whole_transaction: bool,
    /// Indices of covered revisions (strictly increasing).
    pub file_contract_revisions: Vec<u64>,
    /// Indices of covered signatures (strictly increasing).
    pub transaction_signatures: Vec<u64>,
}

impl CoveredFields {
    /// Cover only the revision at `index`.
    pub fn revision_only(index: u64) -> Self {
        Self {
            whole_transaction: false,
            file_contract_revisions: vec![index],
            transaction_signatures: Vec::new(),
        }
    }
}

/// One party's signature over a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    /// Contract the signature authorizes a revision of.
    pub parent_id: Hash,
    /// Index of the signing key in the contract's unlock conditions.
    pub public_key_index: u64,
    /// Height before which the signature is not valid.
    pub timelock: BlockHeight,
    /// What the signature commits to.
    pub covered_fields: CoveredFields,
    /// Raw ed25519 signature bytes; empty until signed.
    pub signature: Vec<u8>,
}

/// A transaction holding file contract revisions and their signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transaction {
    /// Revisions being authorized.
    pub file_contract_revisions: Vec<FileContractRevision>,
    /// Signatures over the revisions.
    pub transaction_signatures: Vec<TransactionSignature>,
}

impl Transaction {
    /// Hash that the signature at `index` must sign.
    ///
    /// Covers the signature's own metadata followed by every revision (whole
    /// transaction) or the listed revisions and signatures in index order.
    pub fn sig_hash(&self, index: usize) -> Result<Hash, TransactionError> {
        let sig = self
            .transaction_signatures
            .get(index)
            .ok_or(TransactionError::BadCoveredFields { index })?;
        let fields = &sig.covered_fields;

        let mut hasher = Sha256::new();
        hasher.update(encode(&sig.parent_id)?);
        hasher.update(encode(&sig.public_key_index)?);
        hasher.update(encode(&sig.timelock)?);

        if fields.whole_transaction {
            for revision in &self.file_contract_revisions {
                hasher.update(encode(revision)?);
            }
        } else {
            for &i in &fields.file_contract_revisions {
                let revision = self
                    .file_contract_revisions
                    .get(i as usize)
                    .ok_or(TransactionError::BadCoveredFields { index })?;
                hasher.update(encode(revision)?);
            }
        }

        for &i in &fields.transaction_signatures {
            let other = self
                .transaction_signatures
                .get(i as usize)
                .ok_or(TransactionError::BadCoveredFields { index })?;
            hasher.update(encode(other)?);
        }

        Ok(hasher.finalize().into())
    }

    /// Validate the transaction without any consensus context other than the
    /// current height.
    pub fn standalone_valid(&self, height: BlockHeight) -> Result<(), TransactionError> {
        if self.file_contract_revisions.is_empty() {
            return Err(TransactionError::NoRevisions);
        }
        for revision in &self.file_contract_revisions {
            if revision.unlock_conditions.timelock > height {
                return Err(TransactionError::Timelocked {
                    timelock: revision.unlock_conditions.timelock,
                    height,
                });
            }
        }
        self.valid_covered_fields()?;
        self.valid_signatures(height)
    }

    fn valid_covered_fields(&self) -> Result<(), TransactionError> {
        let revision_count = self.file_contract_revisions.len();
        let signature_count = self.transaction_signatures.len();

        for (index, sig) in self.transaction_signatures.iter().enumerate() {
            let fields = &sig.covered_fields;
            if fields.whole_transaction && !fields.file_contract_revisions.is_empty() {
                return Err(TransactionError::WholeTransactionWithFields { index });
            }
            if !sorted_in_range(&fields.file_contract_revisions, revision_count)
                || !sorted_in_range(&fields.transaction_signatures, signature_count)
            {
                return Err(TransactionError::BadCoveredFields { index });
            }
        }
        Ok(())
    }

    fn valid_signatures(&self, height: BlockHeight) -> Result<(), TransactionError> {
        let parents: HashMap<ContractId, &UnlockConditions> = self
            .file_contract_revisions
            .iter()
            .map(|r| (r.parent_id, &r.unlock_conditions))
            .collect();
        let mut counts: HashMap<ContractId, u64> = HashMap::new();
        let mut seen: HashSet<(Hash, u64)> = HashSet::new();

        for (index, sig) in self.transaction_signatures.iter().enumerate() {
            let conditions = parents
                .get(&sig.parent_id)
                .ok_or(TransactionError::UnknownParent { index })?;
            let key = conditions
                .public_keys
                .get(sig.public_key_index as usize)
                .ok_or(TransactionError::BadPublicKeyIndex {
                    index,
                    key_index: sig.public_key_index,
                })?;
            if !seen.insert((sig.parent_id, sig.public_key_index)) {
                return Err(TransactionError::DuplicateSignature { index });
            }
            if sig.timelock > height {
                return Err(TransactionError::Timelocked {
                    timelock: sig.timelock,
                    height,
                });
            }

            let bytes: [u8; 64] = sig
                .signature
                .as_slice()
                .try_into()
                .map_err(|_| TransactionError::InvalidSignature { index })?;
            let hash = self.sig_hash(index)?;
            if !verify_hash(&hash, key, &Signature(bytes)) {
                return Err(TransactionError::InvalidSignature { index });
            }
            *counts.entry(sig.parent_id).or_default() += 1;
        }

        for revision in &self.file_contract_revisions {
            let got = counts.get(&revision.parent_id).copied().unwrap_or(0);
            let required = revision.unlock_conditions.signatures_required;
            if got < required {
                return Err(TransactionError::MissingSignatures { got, required });
            }
        }
        Ok(())
    }
}

/// Indices are strictly increasing and all below `len`.
fn sorted_in_range(indices: &[u64], len: usize) -> bool {
    indices.windows(2).all(|w| w[0] < w[1]) && indices.iter().all(|&i| (i as usize) < len)
}
