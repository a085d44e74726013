//! Error types for the protocol layer.
//!
//! The transcoder itself never fails. Errors show up at the edges: when a
//! frame is not JSON, when a message carries no recognizable tag, or when
//! a consumer reads a field as the wrong shape.

use crate::Kind;

/// A field was read as one shape but holds another.
///
/// Raised at the point of use, never while transcoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}`: expected {expected}, found {actual}")]
pub struct TypeMismatch {
    /// Name of the field that was read.
    pub field: String,
    /// The shape the reader asked for.
    pub expected: Kind,
    /// The shape actually present.
    pub actual: Kind,
}

impl TypeMismatch {
    /// Creates a mismatch for `field`.
    pub fn new(field: impl Into<String>, expected: Kind, actual: Kind) -> Self {
        Self {
            field: field.into(),
            expected,
            actual,
        }
    }
}

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a value into a text frame).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is well-formed JSON but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// None of the top-level fields names a known message.
    #[error("unrecognized message, fields: {fields:?}")]
    UnrecognizedMessage {
        /// The top-level field names that were present.
        fields: Vec<String>,
    },

    /// More than one known message tag is populated.
    #[error("ambiguous message, tags: {tags:?}")]
    AmbiguousMessage {
        /// The populated tags, in dispatch order.
        tags: Vec<&'static str>,
    },

    /// A message payload has the wrong shape.
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
}
