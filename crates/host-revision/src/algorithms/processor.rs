//! # Modification Processor
//!
//! Applies an ordered batch of modifications to a copy of a contract's
//! sector list. Each modification sees the list as left by the ones before
//! it. The first invalid modification fails the whole batch and the caller's
//! list is untouched.

use std::collections::HashMap;

use shared_types::{sector_root, short_hex, BlockHeight, Hash};

use super::finance::{blocks_remaining, insert_delta, modify_delta};
use crate::domain::{BatchOutcome, HostSettings, Modification, ModificationError, RevisionAction};
use crate::ports::SectorStore;

/// Round inputs the processor prices against.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingContext<'a> {
    /// Settings snapshot for the round.
    pub settings: &'a HostSettings,
    /// Current block height.
    pub block_height: BlockHeight,
    /// Contract's proof deadline.
    pub proof_deadline: BlockHeight,
}

/// Convert a wire batch into modifications.
pub fn decode_actions(actions: Vec<RevisionAction>) -> Result<Vec<Modification>, ModificationError> {
    actions.into_iter().map(Modification::try_from).collect()
}

/// Apply `modifications` to `sector_roots`.
pub async fn process_modifications(
    sector_roots: &[Hash],
    modifications: &[Modification],
    ctx: &ProcessingContext<'_>,
    store: &dyn SectorStore,
) -> Result<BatchOutcome, ModificationError> {
    let sector_size = ctx.settings.sector_size;
    let mut roots = sector_roots.to_vec();
    let mut outcome = BatchOutcome::default();
    // Sectors produced earlier in this batch, by position in gained_sector_data.
    let mut pending: HashMap<Hash, usize> = HashMap::new();

    for modification in modifications {
        check_index(modification, roots.len())?;
        if modification.payload_len() as u64 > sector_size {
            return Err(ModificationError::LargeSector {
                size: modification.payload_len(),
                max: sector_size,
            });
        }

        match modification {
            Modification::Delete { index } => {
                let removed = roots.remove(*index as usize);
                outcome.sectors_removed.push(removed);
            }
            Modification::Insert { index, data } => {
                if data.len() as u64 != sector_size {
                    return Err(ModificationError::BadSectorSize {
                        size: data.len(),
                        expected: sector_size,
                    });
                }
                let blocks = blocks_remaining(ctx.proof_deadline, ctx.block_height)?;
                let delta = insert_delta(ctx.settings, blocks)?;
                outcome.delta = outcome
                    .delta
                    .checked_add(&delta)
                    .ok_or(ModificationError::CurrencyOverflow)?;

                let root = sector_root(data);
                roots.insert(*index as usize, root);
                pending.insert(root, outcome.gained_sector_data.len());
                outcome.sectors_gained.push(root);
                outcome.gained_sector_data.push(data.clone());
            }
            Modification::Modify {
                index,
                offset,
                data,
            } => {
                let end = offset.checked_add(data.len() as u64);
                if *offset > sector_size || end.map_or(true, |end| end > sector_size) {
                    return Err(ModificationError::IllegalOffsetAndLength {
                        offset: *offset,
                        length: data.len(),
                        sector_size,
                    });
                }

                let old_root = roots[*index as usize];
                let mut sector = match pending.get(&old_root) {
                    Some(&i) => outcome.gained_sector_data[i].clone(),
                    None => store.read_sector(&old_root).await.map_err(|e| {
                        ModificationError::SectorUnavailable {
                            root: short_hex(&old_root),
                            reason: e.to_string(),
                        }
                    })?,
                };
                if sector.len() as u64 != sector_size {
                    return Err(ModificationError::BadSectorSize {
                        size: sector.len(),
                        expected: sector_size,
                    });
                }

                let start = *offset as usize;
                sector[start..start + data.len()].copy_from_slice(data);

                let delta = modify_delta(ctx.settings)?;
                outcome.delta = outcome
                    .delta
                    .checked_add(&delta)
                    .ok_or(ModificationError::CurrencyOverflow)?;

                let new_root = sector_root(&sector);
                roots[*index as usize] = new_root;
                outcome.sectors_removed.push(old_root);
                pending.insert(new_root, outcome.gained_sector_data.len());
                outcome.sectors_gained.push(new_root);
                outcome.gained_sector_data.push(sector);
            }
        }
    }

    outcome.new_roots = roots;
    Ok(outcome)
}

fn check_index(modification: &Modification, len: usize) -> Result<(), ModificationError> {
    let index = modification.index();
    let valid = match modification {
        Modification::Insert { .. } => index <= len as u64,
        Modification::Delete { .. } | Modification::Modify { .. } => index < len as u64,
    };
    if !valid {
        return Err(ModificationError::BadModificationIndex { index, len });
    }
    Ok(())
}
