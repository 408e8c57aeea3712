//! # Core Entities
//!
//! Primitive types shared by every crate that speaks the revision protocol:
//! hashes, currency, block heights and the ed25519 key material used to
//! sign contract revisions.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

// Re-export U256 from primitive-types; every payout and price is a U256.
pub use primitive_types::U256;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Identifier of a file contract (and of the host's storage obligation for it).
pub type ContractId = Hash;

/// Address that a payout is sent to.
pub type UnlockHash = Hash;

/// Height of the consensus chain.
pub type BlockHeight = u64;

/// Amount of money. Arithmetic on untrusted values must be checked.
pub type Currency = U256;

/// Size of one leaf in a sector's Merkle tree.
pub const SECTOR_SEGMENT_SIZE: usize = 64;

/// First four bytes of a hash as hex, for log lines and error messages.
pub fn short_hex(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{b:02x}")).collect()
}

/// A 32-byte ed25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A 64-byte ed25519 signature.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] pub [u8; 64]);

impl Signature {
    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// An 8-byte, zero padded tag used to name variants on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Specifier(pub [u8; 8]);

impl Specifier {
    /// Build a specifier from a short ASCII name. Names longer than eight
    /// bytes are truncated.
    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut out = [0u8; 8];
        let mut i = 0;
        while i < bytes.len() && i < 8 {
            out[i] = bytes[i];
            i += 1;
        }
        Self(out)
    }
}

impl std::fmt::Display for Specifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(8);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..end]))
    }
}
