//! Rendering sink contract.
//!
//! The session pushes history appends and status updates into a
//! [`RenderSink`] and never reads anything back.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::protocol::{ChatEntry, StatusUpdate};

// ============================================================================
// RenderSink
// ============================================================================

/// Receiver of render commands.
///
/// Calls arrive one at a time, in display order. Implementations must not
/// call back into the session.
pub trait RenderSink: Send + Sync {
    /// Appends one entry to the visible history.
    fn append(&self, entry: &ChatEntry);

    /// Replaces the connection status line.
    fn status(&self, update: &StatusUpdate);
}

// ============================================================================
// RenderCommand
// ============================================================================

/// One render instruction, for sinks that queue instead of drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    /// Append an entry.
    Append(ChatEntry),
    /// Update the status line.
    Status(StatusUpdate),
}

impl RenderSink for mpsc::UnboundedSender<RenderCommand> {
    fn append(&self, entry: &ChatEntry) {
        let _ = self.send(RenderCommand::Append(entry.clone()));
    }

    fn status(&self, update: &StatusUpdate) {
        let _ = self.send(RenderCommand::Status(update.clone()));
    }
}

// ============================================================================
// MemorySink
// ============================================================================

/// Sink that records every command.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    commands: Arc<Mutex<Vec<RenderCommand>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every command received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<RenderCommand> {
        self.commands.lock().clone()
    }

    /// Returns the appended entries, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<ChatEntry> {
        self.commands
            .lock()
            .iter()
            .filter_map(|command| match command {
                RenderCommand::Append(entry) => Some(entry.clone()),
                RenderCommand::Status(_) => None,
            })
            .collect()
    }

    /// Returns the most recent status update.
    #[must_use]
    pub fn last_status(&self) -> Option<StatusUpdate> {
        self.commands
            .lock()
            .iter()
            .rev()
            .find_map(|command| match command {
                RenderCommand::Status(update) => Some(update.clone()),
                RenderCommand::Append(_) => None,
            })
    }
}

impl RenderSink for MemorySink {
    fn append(&self, entry: &ChatEntry) {
        self.commands
            .lock()
            .push(RenderCommand::Append(entry.clone()));
    }

    fn status(&self, update: &StatusUpdate) {
        self.commands
            .lock()
            .push(RenderCommand::Status(update.clone()));
    }
}

// ============================================================================
// Tests
// ============================================================================
