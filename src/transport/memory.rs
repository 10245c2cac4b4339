//! In-process channel.
//!
//! [`MemoryTransport`] hands every accepted connection to a
//! [`MemoryServer`] as a [`MemoryPeer`], which plays the server side:
//! it reads what the client wrote and injects messages, closes and errors.
//!
//! # Example
//!
//! ```ignore
//! let (transport, mut server) = MemoryTransport::pair();
//! let channel = transport.connect(&Endpoint::default()).await?;
//! let mut peer = server.accept().await.unwrap();
//!
//! peer.push(r#"{"type":"system","text":"welcome"}"#);
//! peer.close();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};

use super::channel::{Channel, ChannelCommand, ChannelEvent, Endpoint, Transport};

// ============================================================================
// Mode
// ============================================================================

/// How the next connection attempts are answered.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    /// Channel becomes ready immediately.
    Accept,
    /// Channel errors before becoming ready.
    Refuse(String),
    /// Channel never becomes ready.
    Stall,
}

// ============================================================================
// MemoryTransport
// ============================================================================

/// In-process [`Transport`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    mode: Arc<Mutex<Mode>>,
    attempts: Arc<AtomicUsize>,
    peer_tx: mpsc::UnboundedSender<MemoryPeer>,
}

impl MemoryTransport {
    /// Creates a transport and the server that receives its connections.
    #[must_use]
    pub fn pair() -> (Self, MemoryServer) {
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let transport = Self {
            mode: Arc::new(Mutex::new(Mode::Accept)),
            attempts: Arc::new(AtomicUsize::new(0)),
            peer_tx,
        };
        (transport, MemoryServer { peer_rx })
    }

    /// Accepts subsequent connection attempts (the default).
    pub fn accept_connections(&self) {
        *self.mode.lock() = Mode::Accept;
    }

    /// Fails subsequent connection attempts with `message`.
    pub fn refuse_connections(&self, message: impl Into<String>) {
        *self.mode.lock() = Mode::Refuse(message.into());
    }

    /// Leaves subsequent connection attempts pending forever.
    pub fn stall_connections(&self) {
        *self.mode.lock() = Mode::Stall;
    }

    /// Returns how many times `connect` has been called.
    #[inline]
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Channel> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let mode = self.mode.lock().clone();

        match mode {
            Mode::Accept => {}
            Mode::Refuse(message) => {
                debug!(%endpoint, attempt, "Refusing memory connection");
                return Err(Error::connection_failure(endpoint.clone(), message));
            }
            Mode::Stall => {
                debug!(%endpoint, attempt, "Stalling memory connection");
                pending::<()>().await;
            }
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            attempt,
            events: event_tx,
            commands: command_rx,
        };
        self.peer_tx
            .send(peer)
            .map_err(|_| Error::connection_failure(endpoint.clone(), "memory server dropped"))?;

        debug!(%endpoint, attempt, "Memory connection established");
        Ok(Channel::new(command_tx, event_rx))
    }
}

// ============================================================================
// MemoryServer
// ============================================================================

/// Receives the server side of every accepted connection.
#[derive(Debug)]
pub struct MemoryServer {
    peer_rx: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryServer {
    /// Waits for the next accepted connection.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peer_rx.recv().await
    }

    /// Returns an already accepted connection, if any.
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.peer_rx.try_recv().ok()
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Server side of one in-process channel.
#[derive(Debug)]
pub struct MemoryPeer {
    attempt: usize,
    events: mpsc::UnboundedSender<ChannelEvent>,
    commands: mpsc::UnboundedReceiver<ChannelCommand>,
}

impl MemoryPeer {
    /// Returns the 1-based connection attempt this peer answered.
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Delivers one inbound message to the client.
    ///
    /// Returns `false` if the client side is gone.
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.events.send(ChannelEvent::Message(text.into())).is_ok()
    }

    /// Closes the channel from the server side.
    pub fn close(&self) {
        let _ = self.events.send(ChannelEvent::Closed);
    }

    /// Fails the channel.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.events.send(ChannelEvent::Error(message.into()));
    }

    /// Waits for the next message the client wrote.
    ///
    /// Returns `None` once the client closes the channel.
    pub async fn next_written(&mut self) -> Option<String> {
        match self.commands.recv().await? {
            ChannelCommand::Send(text) => Some(text),
            ChannelCommand::Close => None,
        }
    }

    /// Returns a message the client already wrote, if any.
    pub fn try_written(&mut self) -> Option<String> {
        match self.commands.try_recv().ok()? {
            ChannelCommand::Send(text) => Some(text),
            ChannelCommand::Close => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
