//! # Skydrop
//!
//! Reference client for the turn-based drone scheduling competition.
//!
//! The server streams simulation state over a WebSocket; the client answers
//! each tick with launch decisions before the server advances. Scheduling
//! is delegated to a [`DecisionPolicy`](prelude::DecisionPolicy); the
//! framework handles the connection, the handshake, and the message
//! protocol.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skydrop::prelude::*;
//!
//! # async fn run() -> Result<(), SkydropError> {
//! let config = SessionConfig {
//!     entry_name: "greedy".into(),
//!     auth_token: "my-token".into(),
//!     competition_mode: false,
//! };
//! let outcome = connect_and_run("ws://localhost:8080", config, GreedyPolicy).await?;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::SkydropError;

use skydrop_protocol::JsonCodec;
use skydrop_session::{run_session, DecisionPolicy, Session, SessionConfig, SessionOutcome};
use skydrop_transport::WebSocketConnection;

/// Connects to `{server_url_base}/ws-testing` (or `/ws-competition`) and
/// plays one session with `policy`.
///
/// The connection is closed before this returns.
pub async fn connect_and_run<P: DecisionPolicy>(
    server_url_base: &str,
    config: SessionConfig,
    policy: P,
) -> Result<SessionOutcome, SkydropError> {
    let url = config.endpoint_url(server_url_base);
    tracing::info!(%url, "connecting");

    let conn = WebSocketConnection::connect(&url).await?;
    let outcome = run_session(&conn, &JsonCodec, Session::new(config, policy)).await?;
    Ok(outcome)
}

pub mod prelude {
    pub use crate::{connect_and_run, SkydropError};
    pub use skydrop_protocol::{
        Codec, Collection, JsonCodec, Kind, Launch, ProtocolError, Record,
        TypeMismatch, Value,
    };
    pub use skydrop_session::{
        DecisionPolicy, GreedyPolicy, Phase, PolicyError, SessionConfig,
        SessionError, SessionOutcome, SessionStats,
    };
    pub use skydrop_transport::{Connection, TransportError, WebSocketConnection};
}
