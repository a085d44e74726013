//! Unified error type for the Skydrop client.

use skydrop_session::SessionError;
use skydrop_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkydropError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A session-level error: protocol violations, policy failures, and
    /// transport failures after the connection was established.
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use skydrop_session::Phase;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let skydrop_err: SkydropError = err.into();
        assert!(matches!(skydrop_err, SkydropError::Transport(_)));
        assert!(skydrop_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::UnexpectedMessage {
            phase: Phase::AwaitScenario,
            tag: "GetMoves",
        };
        let skydrop_err: SkydropError = err.into();
        assert!(matches!(skydrop_err, SkydropError::Session(_)));
        assert_eq!(
            skydrop_err.to_string(),
            "unexpected `GetMoves` while awaiting scenario"
        );
    }
}
