//! # Shared Types Crate
//!
//! Types and encodings shared by everything that speaks the contract
//! revision protocol. The wire encodings defined here are part of the
//! protocol: a renter implementation must encode these types the same way.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the contract schema and transaction rules
//!   live here, not in the host crate.
//! - **Canonical Encoding**: one bincode configuration for both the wire and
//!   for hashing, so a signed hash always matches what was transmitted.
//! - **Checked Money**: all currency is `U256`; callers use checked math.

pub mod contract;
pub mod crypto;
pub mod encoding;
pub mod entities;
pub mod errors;
pub mod transaction;

pub use contract::*;
pub use crypto::*;
pub use encoding::*;
pub use entities::*;
pub use errors::*;
pub use transaction::*;
