//! # Host Revision Service
//!
//! Application service that accepts renter connections and runs a revision
//! session on each.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::host_state::SharedHostState;
use super::session::{RevisionSession, SessionContext};
use crate::adapters::{ObligationLocker, StreamConn};
use crate::config::RevisionConfig;
use crate::domain::SessionError;
use crate::ports::{NegotiationConn, ObligationStore, RevisionApi, SectorStore, SessionOutcome};

/// Host Revision Service - serves revision sessions.
pub struct HostRevisionService {
    ctx: SessionContext,
}

impl HostRevisionService {
    /// Create a new service.
    pub fn new(
        config: RevisionConfig,
        host: SharedHostState,
        obligations: Arc<dyn ObligationStore>,
        sectors: Arc<dyn SectorStore>,
    ) -> Self {
        Self {
            ctx: SessionContext {
                config,
                host,
                locker: ObligationLocker::new(),
                obligations,
                sectors,
            },
        }
    }

    /// Shared host state.
    pub fn host_state(&self) -> &SharedHostState {
        &self.ctx.host
    }

    /// Obligation lock table.
    pub fn locker(&self) -> &ObligationLocker {
        &self.ctx.locker
    }

    /// Configuration.
    pub fn config(&self) -> &RevisionConfig {
        &self.ctx.config
    }

    /// Run one session and log how it ended.
    pub async fn serve<C>(&self, conn: &mut C) -> Result<SessionOutcome, SessionError>
    where
        C: NegotiationConn + ?Sized,
    {
        let session = RevisionSession::open(conn, &self.ctx).await?;
        let contract = shared_types::short_hex(&session.obligation().id());

        match session.run().await {
            Ok(outcome) => {
                info!(
                    contract = %contract,
                    rounds = outcome.rounds(),
                    outcome = ?outcome,
                    "[revise] session finished"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    contract = %contract,
                    error = %e,
                    protocol_violation = e.is_protocol_violation(),
                    "[revise] session aborted"
                );
                Err(e)
            }
        }
    }

    /// Accept TCP connections forever, one task per connection.
    pub async fn serve_tcp(self: Arc<Self>, listener: TcpListener) -> std::io::Result<()> {
        info!(addr = ?listener.local_addr()?, "[revise] listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            let service = Arc::clone(&self);
            tokio::spawn(async move {
                let mut conn = StreamConn::new(stream);
                if let Err(e) = service.serve(&mut conn).await {
                    warn!(peer = %peer, error = %e, "[revise] connection closed with error");
                }
            });
        }
    }
}

#[async_trait]
impl RevisionApi for HostRevisionService {
    async fn revise_contract(
        &self,
        conn: &mut dyn NegotiationConn,
    ) -> Result<SessionOutcome, SessionError> {
        self.serve(conn).await
    }
}
