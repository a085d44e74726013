//! Wire protocol for Skydrop.
//!
//! This crate defines what the client and the scheduling server say to
//! each other, without knowing how it travels:
//!
//! - **Values** ([`Value`], [`Record`], [`Collection`]) — the dynamic,
//!   schema-less representation application code reads and writes.
//! - **Transcoder** ([`deserialize`], [`serialize`]) — raw JSON ⇄ [`Value`],
//!   deciding record vs. keyed collection by the first key.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — [`Value`] ⇄ text frames.
//! - **Messages** ([`ServerMessage`], [`ClientMessage`], [`Launch`]) — the
//!   tagged envelopes of the protocol.
//! - **Errors** ([`ProtocolError`], [`TypeMismatch`]).
//!
//! ```text
//! Transport (text frames) → Codec (Value) → Messages → Session
//! ```

mod codec;
mod error;
mod messages;
mod transcode;
mod value;

pub use codec::{Codec, JsonCodec};
pub use error::{ProtocolError, TypeMismatch};
pub use messages::{
    tag, ClientMessage, HandshakeResult, Launch, ServerMessage, CLIENT_TAGS,
    SERVER_TAGS,
};
pub use transcode::{
    deserialize, is_collection_key, serialize, COLLECTION_KEY_PREFIXES,
};
pub use value::{Collection, Kind, Record, Value};
