//! # Inbound Ports
//!
//! API the host exposes to its connection acceptor.

use async_trait::async_trait;

use super::outbound::NegotiationConn;
use crate::domain::SessionError;

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Renter sent stop.
    Stopped {
        /// Rounds committed before stopping
        rounds: u64,
    },
    /// Session ran out its duration between rounds.
    TimedOut {
        /// Rounds committed before the timeout
        rounds: u64,
    },
}

impl SessionOutcome {
    /// Rounds committed during the session.
    pub fn rounds(&self) -> u64 {
        match self {
            SessionOutcome::Stopped { rounds } | SessionOutcome::TimedOut { rounds } => *rounds,
        }
    }
}

/// Revision protocol API - inbound port.
#[async_trait]
pub trait RevisionApi: Send + Sync {
    /// Run a full revision session over an accepted connection.
    async fn revise_contract(
        &self,
        conn: &mut dyn NegotiationConn,
    ) -> Result<SessionOutcome, SessionError>;
}
