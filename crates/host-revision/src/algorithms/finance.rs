//! # Finance Accountant
//!
//! Prices individual modifications. All arithmetic is checked because the
//! inputs (sector counts, deadlines) come from the renter.
//!
//! | Action | Bandwidth | Storage | Collateral |
//! |--------|-----------|---------|------------|
//! | Insert | `upload_price * sector` | `storage_price * sector * blocks` | `collateral * sector * blocks` |
//! | Modify | `upload_price * sector` | - | - |
//! | Delete | - | - | - |

use shared_types::{BlockHeight, Currency};

use crate::domain::{FinancialDelta, HostSettings, ModificationError};

/// Blocks between now and the proof deadline.
pub fn blocks_remaining(
    proof_deadline: BlockHeight,
    height: BlockHeight,
) -> Result<u64, ModificationError> {
    if proof_deadline <= height {
        return Err(ModificationError::ProofDeadlinePassed {
            deadline: proof_deadline,
            height,
        });
    }
    Ok(proof_deadline - height)
}

/// Upload cost of one full sector.
fn sector_bandwidth(settings: &HostSettings) -> Result<Currency, ModificationError> {
    settings
        .upload_bandwidth_price
        .checked_mul(Currency::from(settings.sector_size))
        .ok_or(ModificationError::CurrencyOverflow)
}

/// Revenue and collateral for inserting one sector that must be stored for
/// `blocks` more blocks.
pub fn insert_delta(
    settings: &HostSettings,
    blocks: u64,
) -> Result<FinancialDelta, ModificationError> {
    let block_bytes = Currency::from(blocks)
        .checked_mul(Currency::from(settings.sector_size))
        .ok_or(ModificationError::CurrencyOverflow)?;
    let storage_revenue = settings
        .storage_price
        .checked_mul(block_bytes)
        .ok_or(ModificationError::CurrencyOverflow)?;
    let collateral_risked = settings
        .collateral
        .checked_mul(block_bytes)
        .ok_or(ModificationError::CurrencyOverflow)?;

    Ok(FinancialDelta {
        bandwidth_revenue: sector_bandwidth(settings)?,
        storage_revenue,
        collateral_risked,
    })
}

/// Revenue for rewriting part of an existing sector. The whole sector is
/// billed as uploaded; the stored size does not change.
pub fn modify_delta(settings: &HostSettings) -> Result<FinancialDelta, ModificationError> {
    Ok(FinancialDelta {
        bandwidth_revenue: sector_bandwidth(settings)?,
        ..Default::default()
    })
}
