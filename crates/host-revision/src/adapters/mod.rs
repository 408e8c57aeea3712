//! # Adapters Module
//!
//! Concrete implementations of the outbound ports and the obligation lock
//! table.

pub mod lock;
pub mod memory_store;
pub mod stream;

pub use lock::{ObligationGuard, ObligationLocker};
pub use memory_store::InMemoryObligationStore;
pub use stream::StreamConn;
