//! The wire messages exchanged with the scheduling server.
//!
//! Every frame is a JSON object with exactly one populated top-level field.
//! The field name is the message tag, its value the payload:
//!
//! ```text
//! {"GetMoves": {"State": {...}}}
//! ```
//!
//! Inbound frames are parsed into [`ServerMessage`] by checking each known
//! tag in a fixed order. Zero or several matches is a protocol error.
//! Outbound frames are built from [`ClientMessage`].

use crate::{ProtocolError, Record, Value};

/// Message tag names as they appear on the wire.
pub mod tag {
    pub const HANDSHAKE: &str = "Handshake";
    pub const MOVES: &str = "Moves";
    pub const HANDSHAKE_RESULT: &str = "HandshakeResult";
    pub const START_SCENARIO_RUN: &str = "StartScenarioRun";
    pub const GET_MOVES: &str = "GetMoves";
    pub const END_SCENARIO_RUN: &str = "EndScenarioRun";
    pub const CLOSE: &str = "Close";
    pub const ERROR: &str = "Error";
}

/// Tags the server may send, in dispatch order.
pub const SERVER_TAGS: [&str; 6] = [
    tag::HANDSHAKE_RESULT,
    tag::START_SCENARIO_RUN,
    tag::GET_MOVES,
    tag::END_SCENARIO_RUN,
    tag::CLOSE,
    tag::ERROR,
];

/// Tags only the client sends.
pub const CLIENT_TAGS: [&str; 2] = [tag::HANDSHAKE, tag::MOVES];

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// The server's answer to a `Handshake`.
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeResult {
    pub is_ok: bool,
    /// Human-readable explanation, mostly useful on rejection.
    pub message: Option<String>,
    /// Per-tick deadline the server enforces.
    pub timeout_ms: Option<u64>,
    /// How often competition scenarios start.
    pub scenario_freq_secs: Option<u64>,
    /// RFC 3339 start time of the next competition scenario.
    pub next_start_datetime: Option<String>,
}

impl HandshakeResult {
    fn from_record(record: &Record) -> Result<Self, ProtocolError> {
        Ok(Self {
            // A missing verdict is a rejection.
            is_ok: record.optional_bool("IsOk")?.unwrap_or(false),
            message: record.optional_str("Message")?.map(str::to_owned),
            timeout_ms: record.optional_u64("TimeoutMs")?,
            scenario_freq_secs: record.optional_u64("ScenarioFreqSecs")?,
            next_start_datetime: record
                .optional_str("NextStartDatetime")?
                .map(str::to_owned),
        })
    }
}

/// A message sent from the server to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Accepts or rejects the handshake.
    HandshakeResult(HandshakeResult),

    /// A scenario is about to start. The scenario record holds the static
    /// problem parameters for the run.
    StartScenarioRun { scenario: Record },

    /// One tick: the server wants launches for the current state.
    GetMoves { state: Record },

    /// The scenario finished. Stats may be a record or a keyed collection.
    EndScenarioRun { stats: Value },

    /// The server is about to close the connection. `is_ok == false` means
    /// the client misbehaved.
    Close { is_ok: bool, message: String },

    /// The server hit an error and the run cannot continue.
    Error { message: String },
}

impl ServerMessage {
    /// Returns the wire tag of this message.
    pub fn tag(&self) -> &'static str {
        match self {
            ServerMessage::HandshakeResult(_) => tag::HANDSHAKE_RESULT,
            ServerMessage::StartScenarioRun { .. } => tag::START_SCENARIO_RUN,
            ServerMessage::GetMoves { .. } => tag::GET_MOVES,
            ServerMessage::EndScenarioRun { .. } => tag::END_SCENARIO_RUN,
            ServerMessage::Close { .. } => tag::CLOSE,
            ServerMessage::Error { .. } => tag::ERROR,
        }
    }

    /// Parses a decoded frame by looking for exactly one known tag.
    ///
    /// # Errors
    /// - `InvalidMessage` if the frame is not a record, or carries a tag
    ///   only the client may send.
    /// - `UnrecognizedMessage` if no known tag is populated.
    /// - `AmbiguousMessage` if more than one is.
    /// - `TypeMismatch` if the payload has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let mut message = match value {
            Value::Record(record) => record,
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "expected a record at top level, found {}",
                    other.kind()
                )));
            }
        };

        let present: Vec<&'static str> = SERVER_TAGS
            .into_iter()
            .filter(|t| message.contains(t))
            .collect();

        let found = match present.as_slice() {
            [only] => *only,
            [] => {
                if let Some(client_tag) =
                    CLIENT_TAGS.into_iter().find(|t| message.contains(t))
                {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "client-only message `{client_tag}` received from server"
                    )));
                }
                return Err(ProtocolError::UnrecognizedMessage {
                    fields: message.field_names().map(str::to_owned).collect(),
                });
            }
            _ => return Err(ProtocolError::AmbiguousMessage { tags: present }),
        };

        let payload = message.remove(found).into_record(found)?;
        Self::from_payload(found, payload)
    }

    fn from_payload(name: &str, mut payload: Record) -> Result<Self, ProtocolError> {
        let message = match name {
            tag::HANDSHAKE_RESULT => {
                ServerMessage::HandshakeResult(HandshakeResult::from_record(&payload)?)
            }
            tag::START_SCENARIO_RUN => ServerMessage::StartScenarioRun {
                scenario: payload.remove("Scenario").into_record("Scenario")?,
            },
            tag::GET_MOVES => ServerMessage::GetMoves {
                state: payload.remove("State").into_record("State")?,
            },
            tag::END_SCENARIO_RUN => ServerMessage::EndScenarioRun {
                stats: payload.remove("Stats"),
            },
            tag::CLOSE => ServerMessage::Close {
                is_ok: payload.optional_bool("IsOk")?.unwrap_or(true),
                message: payload
                    .optional_str("Message")?
                    .unwrap_or_default()
                    .to_owned(),
            },
            tag::ERROR => ServerMessage::Error {
                message: payload
                    .optional_str("Message")?
                    .unwrap_or_default()
                    .to_owned(),
            },
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "no payload parser for `{other}`"
                )));
            }
        };
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// One scheduling decision: send `drone_id` out with `order_ids`.
///
/// Ids are kept as raw values; the server picks their type.
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    pub drone_id: Value,
    pub order_ids: Vec<Value>,
}

impl Launch {
    pub fn new(drone_id: impl Into<Value>, order_ids: Vec<Value>) -> Self {
        Self {
            drone_id: drone_id.into(),
            order_ids,
        }
    }
}

impl From<&Launch> for Value {
    fn from(launch: &Launch) -> Self {
        Value::Record(
            Record::new()
                .with("DroneId", launch.drone_id.clone())
                .with("OrderIds", Value::Sequence(launch.order_ids.clone())),
        )
    }
}

/// A message sent from the client to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// First frame of every run.
    Handshake {
        auth_token: String,
        entry_name: String,
    },

    /// Reply to `GetMoves`.
    Moves { launches: Vec<Launch> },
}

impl ClientMessage {
    /// Returns the wire tag of this message.
    pub fn tag(&self) -> &'static str {
        match self {
            ClientMessage::Handshake { .. } => tag::HANDSHAKE,
            ClientMessage::Moves { .. } => tag::MOVES,
        }
    }

    /// Builds the tagged record that goes on the wire.
    pub fn to_value(&self) -> Value {
        let payload = match self {
            ClientMessage::Handshake {
                auth_token,
                entry_name,
            } => Record::new()
                .with("AuthToken", auth_token.as_str())
                .with("EntryName", entry_name.as_str()),
            ClientMessage::Moves { launches } => Record::new().with(
                "Launches",
                Value::Sequence(launches.iter().map(Value::from).collect()),
            ),
        };
        Value::Record(Record::new().with(self.tag(), payload))
    }
}
