//! # Hashing and Signing
//!
//! SHA-256 based hashing, the Merkle tree used for sector and contract
//! roots, and ed25519 signing of 32-byte hashes.
//!
//! ## Merkle Tree
//!
//! ```text
//! leaf  = SHA256(0x00 || data)
//! node  = SHA256(0x01 || left || right)
//! odd   = last node is carried up unpaired
//! empty = [0; 32]
//! ```
//!
//! A sector's root is the tree over its 64-byte segments; a contract's root
//! is the tree over its ordered sector roots.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::encoding::encode;
use crate::entities::{Hash, PublicKey, Signature, SECTOR_SEGMENT_SIZE};
use crate::errors::EncodingError;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// SHA-256 of arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA-256 of an object's canonical encoding.
pub fn hash_object<T: Serialize + ?Sized>(object: &T) -> Result<Hash, EncodingError> {
    Ok(hash_bytes(&encode(object)?))
}

fn hash_leaf(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

fn hash_node(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Fold a level of already-hashed leaves up to a single root.
fn fold_levels(mut level: Vec<Hash>) -> Hash {
    if level.is_empty() {
        return [0u8; 32];
    }

    while level.len() > 1 {
        let mut next_level = Vec::with_capacity((level.len() + 1) / 2);
        let mut pairs = level.chunks_exact(2);
        for pair in &mut pairs {
            next_level.push(hash_node(&pair[0], &pair[1]));
        }
        next_level.extend_from_slice(pairs.remainder());
        level = next_level;
    }

    level[0]
}

/// Merkle root over a list of leaf values.
pub fn merkle_root<L: AsRef<[u8]>>(leaves: &[L]) -> Hash {
    fold_levels(leaves.iter().map(|leaf| hash_leaf(leaf.as_ref())).collect())
}

/// Content hash of a sector: Merkle root over its 64-byte segments.
pub fn sector_root(data: &[u8]) -> Hash {
    let segments: Vec<&[u8]> = data.chunks(SECTOR_SEGMENT_SIZE).collect();
    merkle_root(&segments)
}

/// Committed root of a contract: Merkle root over its ordered sector roots.
pub fn contract_root(sector_roots: &[Hash]) -> Hash {
    merkle_root(sector_roots)
}

/// Public key belonging to a signing key.
pub fn public_key(key: &SigningKey) -> PublicKey {
    PublicKey(key.verifying_key().to_bytes())
}

/// Sign a 32-byte hash.
pub fn sign_hash(hash: &Hash, key: &SigningKey) -> Signature {
    Signature(key.sign(hash).to_bytes())
}

/// Verify a signature over a 32-byte hash. Returns false for malformed keys.
pub fn verify_hash(hash: &Hash, key: &PublicKey, signature: &Signature) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(key.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    verifying_key.verify(hash, &sig).is_ok()
}
