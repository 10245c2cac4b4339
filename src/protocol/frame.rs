//! Wire frame types.
//!
//! Every frame is a flat JSON object with a `type` discriminant.
//!
//! # Format
//!
//! | Direction | `type` | Fields |
//! |-----------|--------|--------|
//! | out | `join` | `user`, `room` |
//! | out | `msg` | `text` |
//! | in | `system` | `text`? |
//! | in | `msg` | `from`?, `text`? |
//! | in | `debug_join`, `debug_msg` | anything, echoed verbatim |
//! | in | `error` | `text`? |
//! | in | anything else | echoed verbatim as [`InboundFrame::Unknown`] |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Value, from_str, to_string};
use tracing::warn;

use crate::error::{Error, Result};

// ============================================================================
// OutboundFrame
// ============================================================================

/// A frame sent from the client to the server.
///
/// # Format
///
/// ```json
/// { "type": "join", "user": "alice", "room": "lobby" }
/// { "type": "msg", "text": "hello" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Join a room under a display name.
    Join {
        /// Display name.
        user: String,
        /// Room to join.
        room: String,
    },

    /// Chat message for the current room.
    #[serde(rename = "msg")]
    Message {
        /// Message body.
        text: String,
    },
}

impl OutboundFrame {
    /// Creates a join frame.
    #[inline]
    #[must_use]
    pub fn join(user: impl Into<String>, room: impl Into<String>) -> Self {
        Self::Join {
            user: user.into(),
            room: room.into(),
        }
    }

    /// Creates a message frame.
    #[inline]
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    /// Serializes the frame to its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

// ============================================================================
// InboundFrame
// ============================================================================

/// A frame received from the server.
///
/// Decoding never fails: payloads that are not JSON degrade to
/// [`InboundFrame::Malformed`] and unrecognized tags to
/// [`InboundFrame::Unknown`].
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Server notice.
    System {
        /// Notice text.
        text: Option<String>,
    },

    /// Chat message from a room member.
    Msg {
        /// Sender display name.
        from: Option<String>,
        /// Message body.
        text: Option<String>,
    },

    /// Server acknowledgement of a join, echoed for diagnostics.
    DebugJoin {
        /// Full payload as received.
        raw: Value,
    },

    /// Server acknowledgement of a message, echoed for diagnostics.
    DebugMsg {
        /// Full payload as received.
        raw: Value,
    },

    /// Explicit error reported by the server.
    Error {
        /// Error text.
        text: Option<String>,
    },

    /// Valid JSON with a missing or unrecognized `type`.
    Unknown {
        /// Full payload as received.
        raw: Value,
    },

    /// Payload that is not JSON at all.
    Malformed {
        /// Payload text as received.
        raw: String,
    },
}

impl InboundFrame {
    /// Decodes a wire payload, degrading to a diagnostic variant on failure.
    #[must_use]
    pub fn decode(payload: &str) -> Self {
        match Self::try_decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to decode inbound payload");
                Self::Malformed {
                    raw: payload.to_string(),
                }
            }
        }
    }

    /// Decodes a wire payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPayload`] if the payload is not JSON.
    pub fn try_decode(payload: &str) -> Result<Self> {
        let value: Value = from_str(payload).map_err(|e| Error::malformed(e.to_string()))?;
        Ok(Self::from_value(value))
    }

    /// Returns the wire discriminant of this frame, if it has one.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::System { .. } => Some("system"),
            Self::Msg { .. } => Some("msg"),
            Self::DebugJoin { .. } => Some("debug_join"),
            Self::DebugMsg { .. } => Some("debug_msg"),
            Self::Error { .. } => Some("error"),
            Self::Unknown { raw } => raw.get("type").and_then(Value::as_str),
            Self::Malformed { .. } => None,
        }
    }

    /// Maps a decoded JSON value onto a typed variant.
    fn from_value(value: Value) -> Self {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match tag.as_str() {
            "system" => Self::System {
                text: get_string(&value, "text"),
            },

            "msg" => Self::Msg {
                from: get_string(&value, "from"),
                text: get_string(&value, "text"),
            },

            "debug_join" => Self::DebugJoin { raw: value },

            "debug_msg" => Self::DebugMsg { raw: value },

            "error" => Self::Error {
                text: get_string(&value, "text"),
            },

            _ => Self::Unknown { raw: value },
        }
    }
}

/// Gets a string field, treating empty strings as absent.
#[inline]
fn get_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================
