//! # In-Memory Obligation Store
//!
//! Obligations and reference-counted sector data held in memory. Backs the
//! integration tests and small deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{sector_root, short_hex, ContractId, Hash};
use tracing::warn;

use crate::domain::{StorageObligation, StoreError};
use crate::ports::{ObligationStore, SectorStore};

#[derive(Debug)]
struct StoredSector {
    data: Vec<u8>,
    references: u64,
}

/// Obligations plus the sectors they reference.
#[derive(Debug, Default)]
pub struct InMemoryObligationStore {
    obligations: RwLock<HashMap<ContractId, StorageObligation>>,
    sectors: RwLock<HashMap<Hash, StoredSector>>,
}

impl InMemoryObligationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an obligation. Its sectors must already be stored.
    pub fn insert_obligation(&self, obligation: StorageObligation) {
        self.obligations.write().insert(obligation.id(), obligation);
    }

    /// Store one reference to a sector and return its root.
    pub fn add_sector(&self, data: Vec<u8>) -> Hash {
        let root = sector_root(&data);
        self.sectors
            .write()
            .entry(root)
            .or_insert(StoredSector {
                data,
                references: 0,
            })
            .references += 1;
        root
    }

    /// Current copy of an obligation.
    pub fn obligation(&self, id: &ContractId) -> Option<StorageObligation> {
        self.obligations.read().get(id).cloned()
    }

    /// Distinct sectors stored.
    pub fn sector_count(&self) -> usize {
        self.sectors.read().len()
    }

    /// References held on a sector.
    pub fn references(&self, root: &Hash) -> u64 {
        self.sectors.read().get(root).map_or(0, |s| s.references)
    }
}

#[async_trait]
impl SectorStore for InMemoryObligationStore {
    async fn read_sector(&self, root: &Hash) -> Result<Vec<u8>, StoreError> {
        self.sectors
            .read()
            .get(root)
            .map(|s| s.data.clone())
            .ok_or(StoreError::SectorNotFound(*root))
    }
}

#[async_trait]
impl ObligationStore for InMemoryObligationStore {
    async fn get(&self, id: &ContractId) -> Result<Option<StorageObligation>, StoreError> {
        Ok(self.obligation(id))
    }

    async fn modify(
        &self,
        obligation: &StorageObligation,
        sectors_removed: &[Hash],
        sectors_gained: &[Hash],
        gained_sector_data: &[Vec<u8>],
    ) -> Result<(), StoreError> {
        if sectors_gained.len() != gained_sector_data.len() {
            return Err(StoreError::Backend(format!(
                "{} gained sectors with {} data entries",
                sectors_gained.len(),
                gained_sector_data.len()
            )));
        }

        let mut obligations = self.obligations.write();
        let id = obligation.id();
        if !obligations.contains_key(&id) {
            return Err(StoreError::ObligationNotFound(id));
        }

        let mut sectors = self.sectors.write();
        // Gained first: a sector gained and removed in the same batch nets out.
        for (root, data) in sectors_gained.iter().zip(gained_sector_data) {
            sectors
                .entry(*root)
                .or_insert_with(|| StoredSector {
                    data: data.clone(),
                    references: 0,
                })
                .references += 1;
        }
        for root in sectors_removed {
            match sectors.get_mut(root) {
                Some(sector) if sector.references > 1 => sector.references -= 1,
                Some(_) => {
                    sectors.remove(root);
                }
                None => warn!(
                    "[revise] removing unknown sector {} from obligation {}",
                    short_hex(root),
                    short_hex(&id)
                ),
            }
        }

        obligations.insert(id, obligation.clone());
        Ok(())
    }
}
