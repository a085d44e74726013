//! Error types for the session layer.

use skydrop_protocol::{ProtocolError, TypeMismatch};
use skydrop_transport::TransportError;

use crate::Phase;

/// Errors raised by a [`DecisionPolicy`](crate::DecisionPolicy).
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy read part of the state as the wrong shape.
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    /// The policy panicked. The payload message is kept if it was a string.
    #[error("policy panicked: {0}")]
    Panicked(String),

    /// The policy gave up for its own reasons.
    #[error("{0}")]
    Failed(String),
}

/// Errors that end a session run.
///
/// A rejected handshake, a `Close`, or a server `Error` are not errors
/// here; they are reported through [`SessionOutcome`](crate::SessionOutcome).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection failed or was dropped by the server.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be decoded or broke the message rules.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The decision policy failed while answering `GetMoves`.
    #[error("decision policy failed: {0}")]
    Policy(#[from] PolicyError),

    /// A well-formed message arrived in a phase that does not accept it.
    #[error("unexpected `{tag}` while {phase}")]
    UnexpectedMessage {
        /// The phase the session was in.
        phase: Phase,
        /// The tag of the offending message.
        tag: &'static str,
    },

    /// An operation was attempted in the wrong phase.
    #[error("operation not valid while {0}")]
    InvalidPhase(Phase),
}
