//! Chat session layer.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent session configuration |
//! | `core` | [`ChatSession`]: join, send, projection |
//! | `options` | [`SessionOptions`] |
//! | `sink` | [`RenderSink`] contract and shipped sinks |

// ============================================================================
// Submodules
// ============================================================================

/// Session builder.
pub mod builder;

/// Session workflows.
pub mod core;

/// Session options.
pub mod options;

/// Rendering sink contract.
pub mod sink;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionBuilder;
pub use core::ChatSession;
pub use options::{DEFAULT_ROOM, SessionOptions};
pub use sink::{MemorySink, RenderCommand, RenderSink};
