//! # Domain Invariants
//!
//! Rules that hold between a contract's sector list and its signed revision,
//! and between consecutive revisions.

use shared_types::{contract_root, FileContractRevision, Hash};

use super::errors::RevisionError;

/// Invariant: the revision commits to exactly this sector list.
pub fn invariant_root_matches(sector_roots: &[Hash], revision: &FileContractRevision) -> bool {
    contract_root(sector_roots) == revision.file_merkle_root
}

/// Invariant: file size is one sector per root.
pub fn invariant_size_matches(
    sector_roots: &[Hash],
    revision: &FileContractRevision,
    sector_size: u64,
) -> bool {
    (sector_roots.len() as u64).checked_mul(sector_size) == Some(revision.file_size)
}

/// Invariant: revision numbers strictly increase.
pub fn invariant_revision_increases(
    prior: &FileContractRevision,
    proposed: &FileContractRevision,
) -> Result<(), RevisionError> {
    if proposed.revision_number <= prior.revision_number {
        return Err(RevisionError::RevisionNumberNotIncreased {
            prior: prior.revision_number,
            proposed: proposed.revision_number,
        });
    }
    Ok(())
}

/// Invariant: non-volatile fields never change. Names the first field that
/// did.
pub fn invariant_terms_unchanged(
    prior: &FileContractRevision,
    proposed: &FileContractRevision,
) -> Result<(), RevisionError> {
    let field = if prior.parent_id != proposed.parent_id {
        "parent_id"
    } else if prior.unlock_conditions != proposed.unlock_conditions {
        "unlock_conditions"
    } else if prior.window_start != proposed.window_start {
        "window_start"
    } else if prior.window_end != proposed.window_end {
        "window_end"
    } else if prior.renter_address != proposed.renter_address {
        "renter_address"
    } else if prior.host_address != proposed.host_address {
        "host_address"
    } else {
        debug_assert!(prior.same_terms(proposed));
        return Ok(());
    };
    Err(RevisionError::ChangedTerms { field })
}
