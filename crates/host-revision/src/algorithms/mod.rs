//! # Algorithms Module
//!
//! Pure round logic: pricing, sector list mutation, revision checks and
//! signing. Nothing here touches the network or holds locks.

pub mod finance;
pub mod processor;
pub mod signing;
pub mod verifier;

pub use finance::{blocks_remaining, insert_delta, modify_delta};
pub use processor::{decode_actions, process_modifications, ProcessingContext};
pub use signing::{host_signature, sign_revision, sign_settings, verify_settings};
pub use verifier::verify_revision;
