//! # Revision Session
//!
//! Host side of one revision session, driven as an explicit state machine.
//!
//! ## Flow
//!
//! ```text
//! open: contract id -> lock obligation -> send latest revision
//!
//! Idle/RoundComplete --(time left)--> SettingsSent --> AwaitingAcceptance
//!        |                                                 |  accept   | stop
//!        +--(session expired)--> TimedOut                  v           v
//!                                           AwaitingModifications   Stopped
//!                                                          v
//!                       Processing -> AwaitingRevision -> Verifying
//!                                                          v
//!                       RoundComplete <- Committing <- AwaitingRenterSig
//! ```
//!
//! Transport errors abort without a reply. Validation errors send the
//! renter a rejection carrying the error text, then abort. Either way the
//! obligation lock is released when the session is dropped.

use std::sync::Arc;

use shared_types::{
    short_hex, ContractId, FileContractRevision, Transaction, TransactionError,
    TransactionSignature,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::host_state::{RoundSnapshot, SharedHostState};
use super::wire::{read_object, read_response, write_accept, write_object, write_rejection};
use crate::adapters::{ObligationGuard, ObligationLocker};
use crate::algorithms::{
    decode_actions, host_signature, process_modifications, sign_revision, verify_revision,
    ProcessingContext,
};
use crate::config::RevisionConfig;
use crate::domain::{
    BatchOutcome, ModificationError, NegotiationResponse, RecentRevision, RevisionAction,
    SessionError, SigningError, StorageObligation,
};
use crate::ports::{NegotiationConn, ObligationStore, SectorStore, SessionOutcome};

/// Everything a session borrows from the service.
pub struct SessionContext {
    /// Timeouts and size caps.
    pub config: RevisionConfig,
    /// Shared host state.
    pub host: SharedHostState,
    /// Per-obligation lock table.
    pub locker: ObligationLocker,
    /// Obligation persistence.
    pub obligations: Arc<dyn ObligationStore>,
    /// Sector data.
    pub sectors: Arc<dyn SectorStore>,
}

/// Where a session is in its current round.
pub enum SessionState {
    /// Opened, no round started yet.
    Idle,
    /// Settings written; round deadline not yet armed.
    SettingsSent,
    /// Waiting for the renter to accept the settings.
    AwaitingAcceptance,
    /// Waiting for the modification batch.
    AwaitingModifications {
        /// Host state for this round
        snapshot: RoundSnapshot,
    },
    /// Applying the batch.
    Processing {
        /// Host state for this round
        snapshot: RoundSnapshot,
        /// Batch as received
        actions: Vec<RevisionAction>,
    },
    /// Waiting for the renter's proposed revision.
    AwaitingRevision {
        /// Host state for this round
        snapshot: RoundSnapshot,
        /// Processed batch
        outcome: BatchOutcome,
    },
    /// Checking the proposal.
    Verifying {
        /// Host state for this round
        snapshot: RoundSnapshot,
        /// Processed batch
        outcome: BatchOutcome,
        /// Renter's proposal
        proposal: FileContractRevision,
    },
    /// Waiting for the renter's signature.
    AwaitingRenterSig {
        /// Host state for this round
        snapshot: RoundSnapshot,
        /// Processed batch
        outcome: BatchOutcome,
        /// Accepted proposal
        proposal: FileContractRevision,
    },
    /// Persisting the signed revision.
    Committing {
        /// Processed batch
        outcome: BatchOutcome,
        /// Fully signed transaction
        transaction: Transaction,
    },
    /// Round committed and host signature sent.
    RoundComplete,
    /// Renter ended the session.
    Stopped,
    /// Session duration ran out between rounds.
    TimedOut,
    /// Session aborted with an error.
    Failed,
}

impl SessionState {
    /// State name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::SettingsSent => "settings_sent",
            SessionState::AwaitingAcceptance => "awaiting_acceptance",
            SessionState::AwaitingModifications { .. } => "awaiting_modifications",
            SessionState::Processing { .. } => "processing",
            SessionState::AwaitingRevision { .. } => "awaiting_revision",
            SessionState::Verifying { .. } => "verifying",
            SessionState::AwaitingRenterSig { .. } => "awaiting_renter_sig",
            SessionState::Committing { .. } => "committing",
            SessionState::RoundComplete => "round_complete",
            SessionState::Stopped => "stopped",
            SessionState::TimedOut => "timed_out",
            SessionState::Failed => "failed",
        }
    }

    /// Whether the session ends in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Stopped | SessionState::TimedOut | SessionState::Failed
        )
    }
}

/// Send the renter a rejection for `err` and hand `err` back.
async fn reject<C>(conn: &mut C, err: SessionError, max_len: u64) -> SessionError
where
    C: NegotiationConn + ?Sized,
{
    warn!(error = %err, "[revise] rejecting renter");
    if let Err(write_err) = write_rejection(conn, &err.to_string(), max_len).await {
        debug!(error = %write_err, "[revise] rejection not delivered");
    }
    err
}

/// One renter's revision session on one obligation.
pub struct RevisionSession<'a, C: NegotiationConn + ?Sized> {
    conn: &'a mut C,
    ctx: &'a SessionContext,
    obligation: StorageObligation,
    // Held for the whole session; dropping it unlocks the obligation.
    _guard: ObligationGuard,
    started: Instant,
    rounds: u64,
    state: SessionState,
}

impl<'a, C: NegotiationConn + ?Sized> RevisionSession<'a, C> {
    /// Read the contract id, lock its obligation and send the renter the
    /// latest revision.
    pub async fn open(conn: &'a mut C, ctx: &'a SessionContext) -> Result<Self, SessionError> {
        let config = &ctx.config;
        let started = Instant::now();
        conn.set_deadline(started + config.round_deadline());

        let id: ContractId = read_object(&mut *conn, config.max_contract_id_size).await?;

        let guard = match ctx.locker.lock(&id, config.lock_timeout()).await {
            Ok(guard) => guard,
            Err(e) => return Err(reject(conn, e.into(), config.max_response_size).await),
        };

        let obligation = match ctx.obligations.get(&id).await? {
            Some(obligation) => obligation,
            None => {
                let err = SessionError::ObligationNotFound(id);
                return Err(reject(conn, err, config.max_response_size).await);
            }
        };

        if !obligation.is_consistent(ctx.host.sector_size()) {
            error!(
                "[revise] obligation {} does not match its revision",
                short_hex(&id)
            );
            let err = SessionError::InconsistentObligation(id);
            return Err(reject(conn, err, config.max_response_size).await);
        }

        let recent = RecentRevision {
            revision: obligation.revision.clone(),
            signatures: obligation.revision_signatures.clone(),
        };
        write_object(&mut *conn, &recent).await?;

        info!(
            contract = %short_hex(&id),
            revision = obligation.revision.revision_number,
            sectors = obligation.sector_roots.len(),
            "[revise] session opened"
        );

        Ok(Self {
            conn,
            ctx,
            obligation,
            _guard: guard,
            started,
            rounds: 0,
            state: SessionState::Idle,
        })
    }

    /// Obligation as of the last committed round.
    pub fn obligation(&self) -> &StorageObligation {
        &self.obligation
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run rounds until the renter stops, time runs out or an error aborts
    /// the session.
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        loop {
            let state = std::mem::replace(&mut self.state, SessionState::Failed);
            let next = self.step(state).await?;
            debug!(
                contract = %short_hex(&self.obligation.id()),
                state = next.name(),
                "[revise] session transition"
            );

            match next {
                SessionState::Stopped => {
                    return Ok(SessionOutcome::Stopped {
                        rounds: self.rounds,
                    })
                }
                SessionState::TimedOut => {
                    return Ok(SessionOutcome::TimedOut {
                        rounds: self.rounds,
                    })
                }
                other => self.state = other,
            }
        }
    }

    async fn reject(&mut self, err: SessionError) -> SessionError {
        reject(&mut *self.conn, err, self.ctx.config.max_response_size).await
    }

    async fn step(&mut self, state: SessionState) -> Result<SessionState, SessionError> {
        let ctx = self.ctx;
        let config = &ctx.config;
        match state {
            SessionState::Idle | SessionState::RoundComplete => {
                if self.started.elapsed() >= config.session_duration() {
                    return Ok(SessionState::TimedOut);
                }
                let settings = ctx.host.signed_settings()?;
                write_object(&mut *self.conn, &settings).await?;
                Ok(SessionState::SettingsSent)
            }

            SessionState::SettingsSent => {
                self.conn
                    .set_deadline(Instant::now() + config.round_deadline());
                Ok(SessionState::AwaitingAcceptance)
            }

            SessionState::AwaitingAcceptance => {
                match read_response(&mut *self.conn, config.max_response_size).await? {
                    NegotiationResponse::Accept => Ok(SessionState::AwaitingModifications {
                        snapshot: ctx.host.snapshot(),
                    }),
                    NegotiationResponse::Stop => Ok(SessionState::Stopped),
                    NegotiationResponse::Reject(reason) => Err(SessionError::PeerRejected(reason)),
                }
            }

            SessionState::AwaitingModifications { snapshot } => {
                let actions: Vec<RevisionAction> =
                    read_object(&mut *self.conn, snapshot.settings.max_revise_batch_size).await?;
                Ok(SessionState::Processing { snapshot, actions })
            }

            SessionState::Processing { snapshot, actions } => {
                let processing = ProcessingContext {
                    settings: &snapshot.settings,
                    block_height: snapshot.block_height,
                    proof_deadline: self.obligation.proof_deadline(),
                };
                let result = match decode_actions(actions) {
                    Ok(modifications) => {
                        process_modifications(
                            &self.obligation.sector_roots,
                            &modifications,
                            &processing,
                            ctx.sectors.as_ref(),
                        )
                        .await
                    }
                    Err(e) => Err(e),
                };
                match result {
                    Ok(outcome) => Ok(SessionState::AwaitingRevision { snapshot, outcome }),
                    Err(e) => Err(self.reject(e.into()).await),
                }
            }

            SessionState::AwaitingRevision { snapshot, outcome } => {
                let proposal: FileContractRevision =
                    read_object(&mut *self.conn, config.max_revision_size).await?;
                Ok(SessionState::Verifying {
                    snapshot,
                    outcome,
                    proposal,
                })
            }

            SessionState::Verifying {
                snapshot,
                outcome,
                proposal,
            } => {
                if let Err(e) = verify_revision(
                    &self.obligation.revision,
                    &outcome,
                    &proposal,
                    ctx.host.sector_size(),
                ) {
                    return Err(self.reject(e.into()).await);
                }
                write_accept(&mut *self.conn).await?;
                Ok(SessionState::AwaitingRenterSig {
                    snapshot,
                    outcome,
                    proposal,
                })
            }

            SessionState::AwaitingRenterSig {
                snapshot,
                outcome,
                proposal,
            } => {
                let renter_signature: TransactionSignature =
                    read_object(&mut *self.conn, config.max_signature_size).await?;
                match sign_revision(
                    proposal,
                    renter_signature,
                    &snapshot.secret_key,
                    snapshot.block_height,
                ) {
                    Ok(transaction) => Ok(SessionState::Committing {
                        outcome,
                        transaction,
                    }),
                    Err(e) => Err(self.reject(e.into()).await),
                }
            }

            SessionState::Committing {
                outcome,
                transaction,
            } => {
                let Some(host_entry) = host_signature(&transaction) else {
                    let err = SigningError::InvalidTransaction(TransactionError::MissingSignatures {
                        got: transaction.transaction_signatures.len() as u64,
                        required: 2,
                    });
                    return Err(self.reject(err.into()).await);
                };
                if let Err(e) = self.commit(&outcome, &transaction).await {
                    return Err(self.reject(e).await);
                }
                write_accept(&mut *self.conn).await?;
                write_object(&mut *self.conn, host_entry).await?;

                self.rounds += 1;
                info!(
                    contract = %short_hex(&self.obligation.id()),
                    revision = self.obligation.revision.revision_number,
                    sectors = self.obligation.sector_roots.len(),
                    gained = outcome.sectors_gained.len(),
                    removed = outcome.sectors_removed.len(),
                    "[revise] round committed"
                );
                Ok(SessionState::RoundComplete)
            }

            SessionState::Stopped | SessionState::TimedOut | SessionState::Failed => Ok(state),
        }
    }

    /// Apply the round to a copy of the obligation, persist it, then adopt
    /// the copy. A failed store call leaves the in-memory obligation as it
    /// was.
    async fn commit(
        &mut self,
        outcome: &BatchOutcome,
        transaction: &Transaction,
    ) -> Result<(), SessionError> {
        let overflow = || SessionError::from(ModificationError::CurrencyOverflow);
        let revision = transaction
            .file_contract_revisions
            .first()
            .cloned()
            .ok_or(SigningError::InvalidTransaction(TransactionError::NoRevisions))?;

        let mut updated = self.obligation.clone();
        updated.sector_roots = outcome.new_roots.clone();
        updated.anticipated_revenue = updated
            .anticipated_revenue
            .checked_add(outcome.delta.storage_revenue)
            .ok_or_else(overflow)?;
        updated.confirmed_revenue = updated
            .confirmed_revenue
            .checked_add(outcome.delta.bandwidth_revenue)
            .ok_or_else(overflow)?;
        updated.risked_collateral = updated
            .risked_collateral
            .checked_add(outcome.delta.collateral_risked)
            .ok_or_else(overflow)?;
        updated.revision = revision;
        updated.revision_signatures = transaction.transaction_signatures.clone();

        self.ctx
            .obligations
            .modify(
                &updated,
                &outcome.sectors_removed,
                &outcome.sectors_gained,
                &outcome.gained_sector_data,
            )
            .await?;

        self.obligation = updated;
        Ok(())
    }
}
