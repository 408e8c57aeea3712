//! # Host Revision
//!
//! Host side of the file contract revision protocol.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A renter with an existing storage contract connects, names the contract,
//! and then runs any number of rounds. Each round it:
//! - receives the host's signed settings and accepts them (or stops)
//! - sends a batch of sector inserts, deletes and partial writes
//! - proposes the next contract revision
//! - signs it, receives the host's countersignature
//!
//! The host applies the batch to its own copy of the sector list, checks
//! every field of the proposal against its own accounting, and only then
//! signs and persists.
//!
//! ## Security Features
//!
//! | Defense | Description |
//! |---------|-------------|
//! | Size caps | Every frame is length-checked before allocation |
//! | Deadlines | Every read and write is bounded by the round deadline |
//! | Own accounting | Payouts, size and root are recomputed, never trusted |
//! | Narrow signatures | Renter signatures over the whole transaction are refused |
//! | Obligation lock | One session per contract at a time |
//! | Checked money | All currency arithmetic is overflow-checked |
//!
//! ## Module Structure
//!
//! ```text
//! host-revision/
//! ├── domain/          # StorageObligation, HostSettings, Modification, errors
//! ├── algorithms/      # Finance, modification processing, verification, signing
//! ├── ports/           # RevisionApi, SectorStore, ObligationStore, NegotiationConn
//! ├── adapters/        # Lock table, framed stream, in-memory store
//! └── application/     # Host state, session state machine, service
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

// Re-exports
pub use adapters::{InMemoryObligationStore, ObligationGuard, ObligationLocker, StreamConn};
pub use algorithms::{
    blocks_remaining, decode_actions, host_signature, insert_delta, modify_delta,
    process_modifications, sign_revision, sign_settings, verify_revision, verify_settings,
    ProcessingContext,
};
pub use application::{
    HostRevisionService, HostState, RevisionSession, RoundSnapshot, SessionContext, SessionState,
    SharedHostState,
};
pub use config::{ConfigError, HostConfig, RevisionConfig};
pub use domain::{
    BatchOutcome, ConnError, FinancialDelta, HostSettings, LockError, Modification,
    ModificationError, NegotiationResponse, RecentRevision, RevisionAction, RevisionError,
    SessionError, SignedSettings, SigningError, StorageObligation, StoreError, ACTION_DELETE,
    ACTION_INSERT, ACTION_MODIFY, SECTOR_SIZE, TESTING_SECTOR_SIZE,
};
pub use ports::{
    MockSectorStore, NegotiationConn, ObligationStore, RevisionApi, SectorStore, SessionOutcome,
};
pub use telemetry::{init_logging, LoggingConfig, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
