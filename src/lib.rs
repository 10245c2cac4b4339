//! SimpleChat client - single-room realtime chat over WebSocket.
//!
//! This library connects to a SimpleChat server, joins a room under a
//! display name, exchanges text messages and reports connection health
//! and message history to a rendering sink.
//!
//! # Architecture
//!
//! ```text
//!  ChatSession ──► ConnectionManager ──► Transport ──► server
//!       │                 │
//!       ▼                 ▼
//!   RenderSink     ConnectionState
//! ```
//!
//! - [`ConnectionManager`] owns the channel and the connection state machine
//! - [`ChatSession`] owns the identity and the history, and projects inbound
//!   frames into [`ChatEntry`] records
//! - The view only receives render commands; it is never read back
//!
//! # Quick Start
//!
//! ```no_run
//! use simplechat_client::{ChatSession, RenderCommand, Result};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let (sink, mut renders) = mpsc::unbounded_channel::<RenderCommand>();
//!
//!     let session = ChatSession::builder()
//!         .address("localhost:9002")
//!         .sink(sink)
//!         .build()?;
//!
//!     session.join("alice", "lobby").await?;
//!     session.send_text("hello")?;
//!
//!     while let Some(command) = renders.recv().await {
//!         println!("{command:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | Connection state machine and manager |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Wire frames and display records |
//! | [`session`] | Chat session, options, builder, sinks |
//! | [`transport`] | Duplex channel trait and implementations |

// ============================================================================
// Modules
// ============================================================================

/// Connection lifecycle.
///
/// [`ConnectionManager`] is the only writer of [`ConnectionState`].
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Wire frames and display records.
pub mod protocol;

/// Chat session layer.
///
/// Use [`ChatSession::builder()`] to create a configured session.
pub mod session;

/// Duplex channel abstraction.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{ConnectionManager, ConnectionState};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{ChatEntry, EntryKind, Health, InboundFrame, OutboundFrame, StatusUpdate};

// Session types
pub use session::{ChatSession, MemorySink, RenderCommand, RenderSink, SessionBuilder, SessionOptions};

// Transport types
pub use transport::{Endpoint, MemoryTransport, Transport, WsTransport};
