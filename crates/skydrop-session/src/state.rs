//! The session state machine.
//!
//! [`Session`] holds everything that lives across messages in one run: the
//! phase, the current scenario, the policy, and some counters. It does no
//! I/O. The run loop in [`crate::run_session`] feeds it inbound messages and
//! sends whatever it asks to send.
//!
//! ```text
//! Init ──start()──→ AwaitHandshakeResult ──IsOk=true──→ AwaitScenario
//!                          │                                 │
//!                      IsOk=false                    StartScenarioRun
//!                          ▼                                 ▼
//!                       Failed           ┌──────────────→ Running ◄─┐
//!                                        │                   │      │
//!                                  comp mode           GetMoves → Moves
//!                                        │                   │
//!                                        └─ EndScenarioRun ──┤
//!                                                            ▼
//!                                                   Done (testing mode)
//!
//! Close → Closed, Error → Failed, from any waiting phase.
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use skydrop_protocol::{ClientMessage, HandshakeResult, Record, ServerMessage, Value};

use crate::report::format_stats;
use crate::{DecisionPolicy, PolicyError, SessionConfig, SessionError};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The logical phase of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing sent yet.
    Init,
    /// `Handshake` sent, waiting for `HandshakeResult`.
    AwaitHandshakeResult,
    /// Handshake accepted (or a competition scenario ended), waiting for
    /// `StartScenarioRun`.
    AwaitScenario,
    /// A scenario is in progress; `GetMoves` is answered with `Moves`.
    Running,
    /// Terminal: the scenario ended in testing mode.
    Done,
    /// Terminal: the server sent `Close`.
    Closed,
    /// Terminal: handshake rejected, server error, or a fatal client error.
    Failed,
}

impl Phase {
    /// Returns `true` for `Done`, `Closed`, and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Closed | Phase::Failed)
    }

    fn is_waiting(self) -> bool {
        matches!(
            self,
            Phase::AwaitHandshakeResult | Phase::AwaitScenario | Phase::Running
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "initializing",
            Phase::AwaitHandshakeResult => "awaiting handshake result",
            Phase::AwaitScenario => "awaiting scenario",
            Phase::Running => "running",
            Phase::Done => "done",
            Phase::Closed => "closed",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Counters kept across one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// `StartScenarioRun` messages accepted.
    pub scenarios_started: u32,
    /// `EndScenarioRun` messages accepted.
    pub scenarios_completed: u32,
    /// `Moves` replies produced.
    pub moves_sent: u64,
}

/// How a run ended, when it ended on the server's terms.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The scenario finished in testing mode.
    Completed { stats: SessionStats },

    /// The server sent `Close`. `is_ok == false` means the server blamed
    /// the client.
    Closed {
        is_ok: bool,
        message: String,
        stats: SessionStats,
    },

    /// The server refused the handshake.
    Rejected { message: Option<String> },

    /// The server sent `Error`.
    ServerError { message: String, stats: SessionStats },
}

impl SessionOutcome {
    /// Returns `true` if the run ended the way a healthy run ends.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SessionOutcome::Completed { .. } | SessionOutcome::Closed { is_ok: true, .. }
        )
    }

    /// Returns the terminal phase this outcome corresponds to.
    pub fn phase(&self) -> Phase {
        match self {
            SessionOutcome::Completed { .. } => Phase::Done,
            SessionOutcome::Closed { .. } => Phase::Closed,
            SessionOutcome::Rejected { .. } | SessionOutcome::ServerError { .. } => {
                Phase::Failed
            }
        }
    }
}

/// What the run loop should do after a message was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Send this message, then read the next one.
    Reply(ClientMessage),
    /// Read the next message.
    Continue,
    /// The run is over.
    Finished(SessionOutcome),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// State of one run of the protocol.
pub struct Session<P> {
    config: SessionConfig,
    policy: P,
    phase: Phase,
    scenario: Option<Record>,
    stats: SessionStats,
}

impl<P: DecisionPolicy> Session<P> {
    /// Creates a session in [`Phase::Init`].
    pub fn new(config: SessionConfig, policy: P) -> Self {
        Self {
            config,
            policy,
            phase: Phase::Init,
            scenario: None,
            stats: SessionStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The scenario of the run in progress, if any.
    pub fn scenario(&self) -> Option<&Record> {
        self.scenario.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Builds the opening `Handshake` and moves to `AwaitHandshakeResult`.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidPhase`] unless the session is in
    /// [`Phase::Init`].
    pub fn start(&mut self) -> Result<ClientMessage, SessionError> {
        if self.phase != Phase::Init {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        self.phase = Phase::AwaitHandshakeResult;
        Ok(ClientMessage::Handshake {
            auth_token: self.config.auth_token.clone(),
            entry_name: self.config.entry_name.clone(),
        })
    }

    /// Marks the session failed after a fatal error outside the machine.
    pub fn fail(&mut self) {
        self.phase = Phase::Failed;
        self.scenario = None;
    }

    /// Applies one inbound message.
    ///
    /// # Errors
    /// - [`SessionError::UnexpectedMessage`] if the phase does not accept
    ///   the message.
    /// - [`SessionError::Policy`] if the policy fails on `GetMoves`.
    ///
    /// Either way the session is left in [`Phase::Failed`].
    pub fn handle(&mut self, message: ServerMessage) -> Result<Transition, SessionError> {
        let result = self.dispatch(message);
        if result.is_err() {
            self.fail();
        }
        result
    }

    fn dispatch(&mut self, message: ServerMessage) -> Result<Transition, SessionError> {
        match (self.phase, message) {
            (Phase::AwaitHandshakeResult, ServerMessage::HandshakeResult(result)) => {
                Ok(self.on_handshake_result(result))
            }
            (
                Phase::AwaitScenario | Phase::Running,
                ServerMessage::StartScenarioRun { scenario },
            ) => {
                self.on_start_scenario(scenario);
                Ok(Transition::Continue)
            }
            (Phase::Running, ServerMessage::GetMoves { state }) => self.on_get_moves(&state),
            (Phase::Running, ServerMessage::EndScenarioRun { stats }) => {
                Ok(self.on_end_scenario(&stats))
            }
            (phase, ServerMessage::Close { is_ok, message }) if phase.is_waiting() => {
                if is_ok {
                    tracing::info!(%message, "server closed the session");
                } else {
                    tracing::error!(
                        %message,
                        "server closed the session with an error, connection close is imminent"
                    );
                }
                self.phase = Phase::Closed;
                self.scenario = None;
                Ok(Transition::Finished(SessionOutcome::Closed {
                    is_ok,
                    message,
                    stats: self.stats,
                }))
            }
            (phase, ServerMessage::Error { message }) if phase.is_waiting() => {
                tracing::error!(%message, %phase, "server reported an error");
                self.phase = Phase::Failed;
                self.scenario = None;
                Ok(Transition::Finished(SessionOutcome::ServerError {
                    message,
                    stats: self.stats,
                }))
            }
            (phase, other) => Err(SessionError::UnexpectedMessage {
                phase,
                tag: other.tag(),
            }),
        }
    }

    fn on_handshake_result(&mut self, result: HandshakeResult) -> Transition {
        if !result.is_ok {
            tracing::warn!(
                message = result.message.as_deref().unwrap_or(""),
                "handshake rejected"
            );
            self.phase = Phase::Failed;
            return Transition::Finished(SessionOutcome::Rejected {
                message: result.message,
            });
        }

        tracing::info!(
            message = result.message.as_deref().unwrap_or(""),
            timeout_ms = result.timeout_ms,
            scenario_freq_secs = result.scenario_freq_secs,
            next_start = result.next_start_datetime.as_deref(),
            "handshake accepted"
        );
        self.phase = Phase::AwaitScenario;
        Transition::Continue
    }

    fn on_start_scenario(&mut self, scenario: Record) {
        if self.phase == Phase::Running {
            tracing::warn!("new scenario started before the previous one ended");
        }
        self.stats.scenarios_started += 1;
        tracing::info!(
            scenario = self.stats.scenarios_started,
            max_time = scenario.get("MaxTime").as_u64(),
            "scenario started"
        );
        self.scenario = Some(scenario);
        self.phase = Phase::Running;
    }

    fn on_get_moves(&mut self, state: &Record) -> Result<Transition, SessionError> {
        let scenario = self.scenario.as_ref().ok_or(SessionError::UnexpectedMessage {
            phase: self.phase,
            tag: skydrop_protocol::tag::GET_MOVES,
        })?;

        tracing::debug!(
            time_of_day = %state.get("TimeOfDay"),
            pending = entry_count(state.get("PendingOrders")),
            available = entry_count(state.get("AvailableDroneIds")),
            "tick"
        );

        let policy = &mut self.policy;
        let launches = panic::catch_unwind(AssertUnwindSafe(|| policy.decide(scenario, state)))
            .map_err(|payload| PolicyError::Panicked(panic_message(payload.as_ref())))??;

        self.stats.moves_sent += 1;
        tracing::debug!(launches = launches.len(), "moves decided");
        Ok(Transition::Reply(ClientMessage::Moves { launches }))
    }

    fn on_end_scenario(&mut self, stats: &Value) -> Transition {
        self.stats.scenarios_completed += 1;
        self.scenario = None;
        tracing::info!(
            scenario = self.stats.scenarios_completed,
            "scenario finished\n{}",
            format_stats(stats)
        );

        if self.config.competition_mode {
            self.phase = Phase::AwaitScenario;
            return Transition::Continue;
        }

        self.phase = Phase::Done;
        Transition::Finished(SessionOutcome::Completed { stats: self.stats })
    }
}

/// Counts items in a sequence or keyed collection, for log lines.
fn entry_count(value: &Value) -> usize {
    value
        .as_sequence()
        .map(<[Value]>::len)
        .or_else(|| value.as_entries().map(<[(String, Value)]>::len))
        .unwrap_or(0)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
