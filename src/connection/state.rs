//! Connection state machine.
//!
//! ```text
//!  Idle ──open──► Connecting ──ready──► Connected
//!                     │                     │
//!                   error                 closed
//!                     ▼                     ▼
//!                 Disconnected ◄────────────┘
//! ```
//!
//! `open` is the only way forward out of `Idle` or `Disconnected`. An
//! attempt that is still connecting or connected is retired to
//! `Disconnected` before the next one starts.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::protocol::{Health, StatusUpdate};

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the chat connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No attempt made yet.
    #[default]
    Idle,
    /// Waiting for the channel to become ready.
    Connecting,
    /// Channel ready; frames flow both ways.
    Connected,
    /// Channel failed or closed. Terminal for the attempt.
    Disconnected,
}

impl ConnectionState {
    /// Returns `true` if frames can be sent.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connecting | Self::Connected, Self::Disconnected)
        )
    }

    /// Returns the status line shown for this state.
    #[must_use]
    pub fn status(self) -> StatusUpdate {
        match self {
            Self::Idle | Self::Disconnected => StatusUpdate::new(Health::Bad, "disconnected"),
            Self::Connecting => StatusUpdate::new(Health::Idle, "connecting…"),
            Self::Connected => StatusUpdate::new(Health::Ok, "connected"),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use ConnectionState::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connecting.can_transition_to(Disconnected));
        assert!(Connected.can_transition_to(Disconnected));
        assert!(Disconnected.can_transition_to(Connecting));
    }

    #[test]
    fn test_no_shortcuts() {
        assert!(!Idle.can_transition_to(Connected));
        assert!(!Idle.can_transition_to(Disconnected));
        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Disconnected.can_transition_to(Disconnected));
        assert!(!Connected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Connecting));
        assert!(!Connecting.can_transition_to(Connecting));
    }

    #[test]
    fn test_status_projection() {
        assert_eq!(
            Connecting.status(),
            StatusUpdate::new(Health::Idle, "connecting…")
        );
        assert_eq!(Connected.status(), StatusUpdate::new(Health::Ok, "connected"));
        assert_eq!(
            Disconnected.status(),
            StatusUpdate::new(Health::Bad, "disconnected")
        );
        assert_eq!(Idle.status().health, Health::Bad);
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(ConnectionState::default(), Idle);
        assert!(!Idle.is_connected());
        assert!(Connected.is_connected());
    }
}
