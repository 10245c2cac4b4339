//! Chat protocol message types.
//!
//! This module defines the wire format exchanged with the chat server and
//! the display records derived from it.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `OutboundFrame` | Client → Server | Join a room, post a message |
//! | `InboundFrame` | Server → Client | Notices, messages, debug echoes, errors |
//! | `ChatEntry` | Core → View | One line of visible history |
//! | `StatusUpdate` | Core → View | Connection indicator |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `entry` | Display records and their projection from frames |
//! | `frame` | Wire frames and decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Display records.
pub mod entry;

/// Wire frames.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use entry::{ChatEntry, EntryKind, Health, StatusUpdate};
pub use frame::{InboundFrame, OutboundFrame};
