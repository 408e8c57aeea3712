//! # Contract Verifier
//!
//! Checks a renter's proposed revision against the host's own result of
//! processing the round's modifications. Checks run in a fixed order and the
//! first failure is reported.

use shared_types::{contract_root, FileContractRevision};

use crate::domain::{
    invariant_revision_increases, invariant_terms_unchanged, BatchOutcome, RevisionError,
};

/// Verify `proposed` as the successor of `prior` after `outcome`.
pub fn verify_revision(
    prior: &FileContractRevision,
    outcome: &BatchOutcome,
    proposed: &FileContractRevision,
    sector_size: u64,
) -> Result<(), RevisionError> {
    invariant_terms_unchanged(prior, proposed)?;
    invariant_revision_increases(prior, proposed)?;

    let expected_size = (outcome.new_roots.len() as u64)
        .checked_mul(sector_size)
        .ok_or(RevisionError::CurrencyOverflow)?;
    if proposed.file_size != expected_size {
        return Err(RevisionError::BadFileSize {
            expected: expected_size,
            proposed: proposed.file_size,
        });
    }
    if proposed.file_merkle_root != contract_root(&outcome.new_roots) {
        return Err(RevisionError::BadMerkleRoot);
    }

    let revenue = outcome
        .delta
        .total_revenue()
        .ok_or(RevisionError::CurrencyOverflow)?;

    let expected_host = prior
        .host_payout
        .checked_add(revenue)
        .ok_or(RevisionError::CurrencyOverflow)?;
    if proposed.host_payout != expected_host {
        return Err(RevisionError::BadHostPayout {
            expected: expected_host,
            proposed: proposed.host_payout,
        });
    }

    let expected_renter =
        prior
            .renter_payout
            .checked_sub(revenue)
            .ok_or(RevisionError::InsufficientRenterFunds {
                available: prior.renter_payout,
                required: revenue,
            })?;
    if proposed.renter_payout != expected_renter {
        return Err(RevisionError::BadRenterPayout {
            expected: expected_renter,
            proposed: proposed.renter_payout,
        });
    }

    let expected_collateral = prior
        .host_collateral
        .checked_add(outcome.delta.collateral_risked)
        .ok_or(RevisionError::CurrencyOverflow)?;
    if proposed.host_collateral != expected_collateral {
        return Err(RevisionError::BadCollateral {
            expected: expected_collateral,
            proposed: proposed.host_collateral,
        });
    }

    Ok(())
}
