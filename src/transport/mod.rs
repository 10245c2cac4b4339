//! Transport layer.
//!
//! This module defines the duplex channel the connection manager talks
//! through, and the implementations shipped with the crate.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐                         ┌─────────────────┐
//! │ ConnectionManager │   ChannelCommand  ───►  │                 │
//! │                   │                         │  Chat server    │
//! │   (one Channel    │   ◄───  ChannelEvent    │                 │
//! │    per attempt)   │      ws://host:port     │                 │
//! └───────────────────┘                         └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | `Transport` trait, `Channel`, `Endpoint` |
//! | `memory` | In-process channel |
//! | `websocket` | tokio-tungstenite channel |

// ============================================================================
// Submodules
// ============================================================================

/// Channel abstraction and endpoint addressing.
pub mod channel;

/// In-process transport.
pub mod memory;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{Channel, ChannelCommand, ChannelEvent, DEFAULT_PORT, Endpoint, Transport};
pub use memory::{MemoryPeer, MemoryServer, MemoryTransport};
pub use websocket::WsTransport;
