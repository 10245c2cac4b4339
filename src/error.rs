//! Error types for the chat client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use simplechat_client::{Error, Result};
//!
//! async fn example(session: &ChatSession) -> Result<()> {
//!     session.join("alice", "lobby").await?;
//!     session.send_text("hello")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Validation | [`Error::InvalidName`], [`Error::Config`] |
//! | Connection | [`Error::ConnectionFailure`], [`Error::ConnectionTimeout`], [`Error::NotConnected`], [`Error::ChannelClosed`] |
//! | Protocol | [`Error::MalformedPayload`], [`Error::PeerError`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Nothing here is fatal: every variant is either surfaced to the user
//! (see [`Error::hint`]) or degraded into a diagnostic chat entry.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::Endpoint;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Display name is empty or whitespace-only.
    ///
    /// Returned by `join` before any connection attempt is made.
    #[error("Invalid name: display name must not be empty")]
    InvalidName,

    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Channel failed to become ready.
    #[error("Connection to {endpoint} failed: {message}")]
    ConnectionFailure {
        /// Endpoint that was dialed.
        endpoint: Endpoint,
        /// Description of the failure.
        message: String,
    },

    /// Channel did not become ready in time.
    #[error("Connection to {endpoint} timed out after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Endpoint that was dialed.
        endpoint: Endpoint,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Send attempted while the connection is not open.
    #[error("not connected")]
    NotConnected,

    /// Channel closed underneath a live connection.
    #[error("Channel closed")]
    ChannelClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound payload failed structured decode.
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Decoder error message.
        message: String,
    },

    /// Server sent an explicit error frame.
    #[error("Peer error: {text}")]
    PeerError {
        /// Error text reported by the server.
        text: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection failure error.
    #[inline]
    pub fn connection_failure(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            endpoint,
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(endpoint: Endpoint, timeout_ms: u64) -> Self {
        Self::ConnectionTimeout {
            endpoint,
            timeout_ms,
        }
    }

    /// Creates a malformed payload error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Creates a peer error.
    #[inline]
    pub fn peer(text: impl Into<String>) -> Self {
        Self::PeerError { text: text.into() }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailure { .. }
                | Self::ConnectionTimeout { .. }
                | Self::NotConnected
                | Self::ChannelClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the user can recover by acting again.
    ///
    /// A fresh `join` recovers from connection errors; a corrected name
    /// recovers from [`Error::InvalidName`].
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidName
                | Self::ConnectionFailure { .. }
                | Self::ConnectionTimeout { .. }
                | Self::NotConnected
                | Self::ChannelClosed
        )
    }

    /// Returns the message shown to the user for this error.
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::InvalidName => "Please enter a name.".to_string(),
            Self::ConnectionFailure { endpoint, .. } | Self::ConnectionTimeout { endpoint, .. } => {
                format!(
                    "Could not connect. Check server and port {}.",
                    endpoint.port()
                )
            }
            Self::NotConnected | Self::ChannelClosed => "not connected".to_string(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection_failure(Endpoint::new("localhost", 9002), "refused");
        assert_eq!(
            err.to_string(),
            "Connection to localhost:9002 failed: refused"
        );
    }

    #[test]
    fn test_not_connected_display() {
        assert_eq!(Error::NotConnected.to_string(), "not connected");
    }

    #[test]
    fn test_hints() {
        assert_eq!(Error::InvalidName.hint(), "Please enter a name.");
        assert_eq!(
            Error::connection_timeout(Endpoint::new("chat.local", 9100), 500).hint(),
            "Could not connect. Check server and port 9100."
        );
        assert_eq!(Error::ChannelClosed.hint(), "not connected");
        assert_eq!(Error::config("bad").hint(), "Configuration error: bad");
    }

    #[test]
    fn test_is_connection_error() {
        let failure = Error::connection_failure(Endpoint::default(), "test");
        let other = Error::InvalidName;

        assert!(failure.is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ChannelClosed.is_connection_error());
        assert!(!other.is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::InvalidName.is_recoverable());
        assert!(Error::NotConnected.is_recoverable());
        assert!(!Error::config("test").is_recoverable());
        assert!(!Error::peer("boom").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::ConnectionRefused, "refused");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_websocket_error() {
        let err: Error = WsError::ConnectionClosed.into();
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
