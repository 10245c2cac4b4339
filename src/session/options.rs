//! Session options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use simplechat_client::SessionOptions;
//!
//! let options = SessionOptions::new()
//!     .with_room("general")
//!     .with_connect_timeout(Duration::from_secs(3));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::connection::DEFAULT_CONNECT_TIMEOUT;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Room joined when the caller does not name one.
pub const DEFAULT_ROOM: &str = "lobby";

// ============================================================================
// SessionOptions
// ============================================================================

/// Tunables for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Room used by `join_default`.
    pub room: String,

    /// Time allowed for the channel to become ready.
    pub connect_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            room: DEFAULT_ROOM.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl SessionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default room.
    #[inline]
    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    /// Sets the readiness deadline.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Checks the options for values the session cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a blank room or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.room.trim().is_empty() {
            return Err(Error::config("room must not be empty"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
