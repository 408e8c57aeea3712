//! # Application Layer
//!
//! Host state, the session state machine and the service that runs it.

pub mod host_state;
pub mod service;
pub mod session;
pub mod wire;

pub use host_state::{HostState, RoundSnapshot, SharedHostState};
pub use service::HostRevisionService;
pub use session::{RevisionSession, SessionContext, SessionState};
pub use wire::{
    read_object, read_response, write_accept, write_object, write_rejection, write_stop,
};
