//! # Outbound Ports
//!
//! Traits for what the revision protocol needs from the rest of the host:
//! sector data, obligation persistence and a framed connection to the
//! renter.

use std::collections::HashMap;

use async_trait::async_trait;
use shared_types::{sector_root, ContractId, Hash};
use tokio::time::Instant;

use crate::domain::{ConnError, StorageObligation, StoreError};

/// Read access to stored sectors - outbound port.
#[async_trait]
pub trait SectorStore: Send + Sync {
    /// Full data of the sector with this root.
    async fn read_sector(&self, root: &Hash) -> Result<Vec<u8>, StoreError>;
}

/// Storage obligation persistence - outbound port.
#[async_trait]
pub trait ObligationStore: Send + Sync {
    /// Current obligation for a contract.
    async fn get(&self, id: &ContractId) -> Result<Option<StorageObligation>, StoreError>;

    /// Replace the stored obligation, adding `sectors_gained` (with their
    /// data) and releasing `sectors_removed`. Either all of it happens or
    /// none of it does.
    async fn modify(
        &self,
        obligation: &StorageObligation,
        sectors_removed: &[Hash],
        sectors_gained: &[Hash],
        gained_sector_data: &[Vec<u8>],
    ) -> Result<(), StoreError>;
}

/// Framed, deadline-bounded connection to a renter - outbound port.
#[async_trait]
pub trait NegotiationConn: Send {
    /// Deadline for every subsequent read and write.
    fn set_deadline(&mut self, deadline: Instant);

    /// Read one frame, refusing frames longer than `max_len`.
    async fn read_frame(&mut self, max_len: u64) -> Result<Vec<u8>, ConnError>;

    /// Write one frame.
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), ConnError>;
}

/// Mock sector store for testing.
#[derive(Debug, Default)]
pub struct MockSectorStore {
    sectors: HashMap<Hash, Vec<u8>>,
    /// Fail every read.
    pub should_fail: bool,
}

impl MockSectorStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sector and return its root.
    pub fn add_sector(&mut self, data: Vec<u8>) -> Hash {
        let root = sector_root(&data);
        self.sectors.insert(root, data);
        root
    }
}

#[async_trait]
impl SectorStore for MockSectorStore {
    async fn read_sector(&self, root: &Hash) -> Result<Vec<u8>, StoreError> {
        if self.should_fail {
            return Err(StoreError::Backend("mock failure".into()));
        }
        self.sectors
            .get(root)
            .cloned()
            .ok_or(StoreError::SectorNotFound(*root))
    }
}
