//! Connection lifecycle.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionState`] | `Idle → Connecting → {Connected | Disconnected}` |
//! | [`ConnectionManager`] | Owns the channel, drives the state machine, delivers frames |

// ============================================================================
// Submodules
// ============================================================================

/// Connection manager and event loop.
pub mod manager;

/// Connection state machine.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use manager::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT, FrameHandler, StateHandler};
pub use state::ConnectionState;
