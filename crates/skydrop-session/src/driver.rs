//! The run loop: drives one [`Session`] over one [`Connection`].
//!
//! The flow is strictly sequential:
//!   1. Send `Handshake`
//!   2. Loop: receive a frame → decode → apply to the session → send the
//!      reply (if any) before reading again
//!   3. On any terminal transition or error, close the connection

use skydrop_protocol::{ClientMessage, Codec, ServerMessage};
use skydrop_transport::{Connection, TransportError};

use crate::{DecisionPolicy, Session, SessionError, SessionOutcome, Transition};

/// Runs `session` to completion over `conn`.
///
/// The connection is closed before this returns, whatever the result.
/// Rejections, `Close`, and server `Error`s come back as `Ok` outcomes;
/// transport failures, protocol violations, and policy failures as `Err`.
pub async fn run_session<C, K, P>(
    conn: &C,
    codec: &K,
    mut session: Session<P>,
) -> Result<SessionOutcome, SessionError>
where
    C: Connection<Error = TransportError>,
    K: Codec,
    P: DecisionPolicy,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, config = ?session.config(), "starting session");

    let result = drive(conn, codec, &mut session).await;

    match &result {
        Ok(outcome) => {
            tracing::info!(%conn_id, phase = %outcome.phase(), "session ended");
        }
        Err(e) => {
            session.fail();
            tracing::error!(%conn_id, error = %e, "session failed");
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close after session end failed");
    }

    result
}

async fn drive<C, K, P>(
    conn: &C,
    codec: &K,
    session: &mut Session<P>,
) -> Result<SessionOutcome, SessionError>
where
    C: Connection<Error = TransportError>,
    K: Codec,
    P: DecisionPolicy,
{
    let handshake = session.start()?;
    send(conn, codec, &handshake).await?;

    loop {
        let Some(frame) = conn.recv().await? else {
            return Err(SessionError::Transport(TransportError::ConnectionClosed(
                format!("server hung up while {}", session.phase()),
            )));
        };
        tracing::debug!(conn_id = %conn.id(), %frame, "recv");

        let message = ServerMessage::from_value(codec.decode(&frame)?)?;

        match session.handle(message)? {
            Transition::Reply(reply) => send(conn, codec, &reply).await?,
            Transition::Continue => {}
            Transition::Finished(outcome) => return Ok(outcome),
        }
    }
}

async fn send<C, K>(
    conn: &C,
    codec: &K,
    message: &ClientMessage,
) -> Result<(), SessionError>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    let frame = codec.encode(&message.to_value())?;
    match message {
        // Keeps the auth token out of the logs.
        ClientMessage::Handshake { entry_name, .. } => {
            tracing::debug!(conn_id = %conn.id(), %entry_name, "send handshake");
        }
        ClientMessage::Moves { .. } => {
            tracing::debug!(conn_id = %conn.id(), %frame, "send");
        }
    }
    conn.send(&frame).await?;
    Ok(())
}
