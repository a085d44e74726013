//! Codec trait and implementations for turning values into text frames.
//!
//! A "codec" (coder/decoder) sits between the transport, which only moves
//! strings, and the rest of the client, which only sees [`Value`]s. The
//! session layer is generic over [`Codec`], so a different encoding can be
//! swapped in without touching the state machine.

use crate::{transcode, ProtocolError, Value};

/// Encodes values into text frames and decodes frames back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode(&self, value: &Value) -> Result<String, ProtocolError>;

    /// Parses one text frame into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed.
    fn decode(&self, frame: &str) -> Result<Value, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that speaks JSON via `serde_json` and the transcoder.
///
/// ## Example
///
/// ```rust
/// use skydrop_protocol::{Codec, JsonCodec, Record, Value};
///
/// let codec = JsonCodec;
/// let value = Value::from(Record::new().with("Close", Record::new().with("Message", "bye")));
///
/// let frame = codec.encode(&value).unwrap();
/// assert_eq!(frame, r#"{"Close":{"Message":"bye"}}"#);
/// assert_eq!(codec.decode(&frame).unwrap(), value);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode(&self, frame: &str) -> Result<Value, ProtocolError> {
        serde_json::from_str::<serde_json::Value>(frame)
            .map(transcode::deserialize)
            .map_err(ProtocolError::Decode)
    }
}
