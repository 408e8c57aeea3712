//! # Signature Engine
//!
//! Countersigns a verified revision and signs the settings advertised to
//! renters.
//!
//! ## Security
//!
//! A renter signature that covers the whole transaction would let the renter
//! bind the host to fields the host never inspected. Such signatures are
//! refused before the host signs anything.

use ed25519_dalek::SigningKey;
use shared_types::{
    hash_object, sign_hash, verify_hash, BlockHeight, CoveredFields, FileContractRevision,
    PublicKey, Transaction, TransactionSignature, HOST_KEY_INDEX, RENTER_KEY_INDEX,
};

use crate::domain::{HostSettings, SignedSettings, SigningError};

/// Host's unsigned signature entry for `revision`.
fn host_signature_entry(revision: &FileContractRevision) -> TransactionSignature {
    TransactionSignature {
        parent_id: revision.parent_id,
        public_key_index: HOST_KEY_INDEX,
        timelock: 0,
        covered_fields: CoveredFields::revision_only(0),
        signature: Vec::new(),
    }
}

/// Build the two-party transaction for `revision`, add the host signature
/// and check the result is valid at `height`.
pub fn sign_revision(
    revision: FileContractRevision,
    renter_signature: TransactionSignature,
    secret_key: &SigningKey,
    height: BlockHeight,
) -> Result<Transaction, SigningError> {
    if renter_signature.covered_fields.whole_transaction {
        return Err(SigningError::RenterOverreach);
    }
    if renter_signature.public_key_index != RENTER_KEY_INDEX {
        return Err(SigningError::WrongKeyIndex(
            renter_signature.public_key_index,
        ));
    }

    let host_entry = host_signature_entry(&revision);
    let mut txn = Transaction {
        file_contract_revisions: vec![revision],
        transaction_signatures: vec![renter_signature, host_entry],
    };

    let sig_hash = txn.sig_hash(1)?;
    txn.transaction_signatures[1].signature = sign_hash(&sig_hash, secret_key).0.to_vec();

    txn.standalone_valid(height)?;
    Ok(txn)
}

/// The host's entry in a signed revision transaction, found by key index.
pub fn host_signature(transaction: &Transaction) -> Option<&TransactionSignature> {
    transaction
        .transaction_signatures
        .iter()
        .find(|entry| entry.public_key_index == HOST_KEY_INDEX)
}

/// Sign the settings the host is about to advertise.
pub fn sign_settings(
    settings: HostSettings,
    secret_key: &SigningKey,
) -> Result<SignedSettings, SigningError> {
    let hash = hash_object(&settings)?;
    Ok(SignedSettings {
        signature: sign_hash(&hash, secret_key),
        settings,
    })
}

/// Check settings were signed by `host_key`.
pub fn verify_settings(signed: &SignedSettings, host_key: &PublicKey) -> bool {
    match hash_object(&signed.settings) {
        Ok(hash) => verify_hash(&hash, host_key, &signed.signature),
        Err(_) => false,
    }
}
