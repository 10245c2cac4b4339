//! Chat session: join workflow, send gating and inbound projection.
//!
//! A [`ChatSession`] owns the session identity and the visible history.
//! It observes the [`ConnectionManager`] through registered handlers and
//! never touches connection state directly.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::{Error, Result};
use crate::protocol::{ChatEntry, InboundFrame, OutboundFrame};
use crate::transport::{Endpoint, Transport};

use super::builder::SessionBuilder;
use super::options::SessionOptions;
use super::sink::RenderSink;

// ============================================================================
// SessionState
// ============================================================================

/// Mutable session data shared with the connection handlers.
#[derive(Debug, Default)]
struct SessionState {
    /// Display name bound by the last successful join.
    identity: Option<String>,
    /// Room bound by the last successful join.
    room: Option<String>,
    /// `true` between a successful join and the next disconnect.
    active: bool,
    /// `true` while a join is completing.
    joining: bool,
    /// Entries that arrived while `joining` was set.
    held: Vec<ChatEntry>,
    /// Visible history, in display order.
    entries: Vec<ChatEntry>,
}

impl SessionState {
    /// Records `entry` and forwards it to the sink.
    fn append(&mut self, sink: &dyn RenderSink, entry: ChatEntry) {
        sink.append(&entry);
        self.entries.push(entry);
    }

    /// Appends every held entry, in arrival order.
    fn release_held(&mut self, sink: &dyn RenderSink) {
        self.joining = false;
        for entry in std::mem::take(&mut self.held) {
            self.append(sink, entry);
        }
    }
}

/// Releases held entries if a `join` future is dropped mid-flight.
struct JoinGuard<'a> {
    state: &'a Mutex<SessionState>,
    sink: &'a dyn RenderSink,
    armed: bool,
}

impl Drop for JoinGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().release_held(self.sink);
        }
    }
}

// ============================================================================
// ChatSession
// ============================================================================

/// A single-room chat session.
///
/// # Example
///
/// ```no_run
/// use simplechat_client::{ChatSession, MemorySink};
///
/// # async fn example() -> simplechat_client::Result<()> {
/// let session = ChatSession::builder()
///     .address("localhost:9002")
///     .sink(MemorySink::new())
///     .build()?;
///
/// session.join("alice", "lobby").await?;
/// session.send_text("hello")?;
/// # Ok(())
/// # }
/// ```
pub struct ChatSession {
    /// Unique session identifier.
    id: Uuid,
    /// Server address.
    endpoint: Endpoint,
    /// Tunables.
    options: SessionOptions,
    /// Connection lifecycle owner.
    connection: ConnectionManager,
    /// Identity and history.
    state: Arc<Mutex<SessionState>>,
    /// Render target.
    sink: Arc<dyn RenderSink>,
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("state", &self.connection.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ChatSession - Construction
// ============================================================================

impl ChatSession {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Wires a session to its connection and emits the initial status.
    pub(crate) fn new(
        endpoint: Endpoint,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn RenderSink>,
        options: SessionOptions,
    ) -> Self {
        let id = Uuid::new_v4();
        let connection = ConnectionManager::with_timeout(transport, options.connect_timeout);
        let state = Arc::new(Mutex::new(SessionState::default()));

        {
            let state = Arc::clone(&state);
            let sink = Arc::clone(&sink);
            connection.on_frame(move |frame| Self::project_frame(id, &state, &*sink, &frame));
        }

        {
            let state = Arc::clone(&state);
            let sink = Arc::clone(&sink);
            connection.on_state_change(move |next| {
                sink.status(&next.status());
                if next == ConnectionState::Disconnected {
                    let mut state = state.lock();
                    if state.active {
                        debug!(session = %id, "Session deactivated");
                    }
                    state.active = false;
                }
            });
        }

        sink.status(&ConnectionState::Idle.status());
        debug!(session = %id, %endpoint, "Session created");

        Self {
            id,
            endpoint,
            options,
            connection,
            state,
            sink,
        }
    }
}

// ============================================================================
// ChatSession - Workflows
// ============================================================================

impl ChatSession {
    /// Connects and joins `room` as `name`.
    ///
    /// A blank `room` falls back to the configured default. Calling `join`
    /// again starts a fresh attempt and replaces the previous identity.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] if `name` is blank; nothing is opened
    /// - [`Error::ConnectionFailure`] or [`Error::ConnectionTimeout`] if the
    ///   channel never became ready
    /// - [`Error::NotConnected`] or [`Error::ChannelClosed`] if the channel
    ///   went away before the join frame was written
    pub async fn join(&self, name: &str, room: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            debug!(session = %self.id, "Join rejected: empty name");
            return Err(Error::InvalidName);
        }

        let room = match room.trim() {
            "" => self.options.room.trim(),
            room => room,
        };

        {
            let mut state = self.state.lock();
            state.identity = None;
            state.room = None;
            state.active = false;
            state.joining = true;
        }

        let mut guard = JoinGuard {
            state: &self.state,
            sink: &*self.sink,
            armed: true,
        };

        let result = match self.connection.open(&self.endpoint).await {
            Ok(()) => self.connection.send(&OutboundFrame::join(name, room)),
            Err(e) => Err(e),
        };

        guard.armed = false;
        let mut state = self.state.lock();

        if let Err(e) = result {
            warn!(session = %self.id, error = %e, "Join failed");
            state.release_held(&*self.sink);
            return Err(e);
        }

        state.identity = Some(name.to_string());
        state.room = Some(room.to_string());
        state.active = self.connection.state().is_connected();
        state.append(&*self.sink, ChatEntry::joined(name, room));
        state.release_held(&*self.sink);

        info!(session = %self.id, user = name, room, "Joined");
        Ok(())
    }

    /// Joins the configured default room.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join).
    pub async fn join_default(&self, name: &str) -> Result<()> {
        self.join(name, "").await
    }

    /// Sends one chat message.
    ///
    /// Blank text is ignored. Nothing is appended locally on success; the
    /// server echo is the source of truth.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no join is active or the connection is
    ///   down; a "not connected" entry is appended
    /// - [`Error::ChannelClosed`] if the channel went away underneath
    pub fn send_text(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let active = self.state.lock().active;
        if !active || !self.connection.state().is_connected() {
            debug!(session = %self.id, "Send refused: not connected");
            self.state
                .lock()
                .append(&*self.sink, ChatEntry::not_connected());
            return Err(Error::NotConnected);
        }

        match self.connection.send(&OutboundFrame::message(text)) {
            Ok(()) => Ok(()),
            Err(e @ (Error::NotConnected | Error::ChannelClosed)) => {
                debug!(session = %self.id, error = %e, "Send failed");
                self.state
                    .lock()
                    .append(&*self.sink, ChatEntry::not_connected());
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Closes the connection. The session stays inactive until the next
    /// successful join.
    pub fn leave(&self) {
        self.state.lock().active = false;
        self.connection.close();
        info!(session = %self.id, "Left session");
    }

    /// Projects one inbound frame into the history.
    fn project_frame(
        id: Uuid,
        state: &Mutex<SessionState>,
        sink: &dyn RenderSink,
        frame: &InboundFrame,
    ) {
        if let InboundFrame::Error { text } = frame {
            let error = Error::peer(text.as_deref().unwrap_or_default());
            warn!(session = %id, error = %error, "Server reported an error");
        }

        let entry = ChatEntry::from_frame(frame);
        let mut state = state.lock();
        if state.joining {
            state.held.push(entry);
        } else {
            state.append(sink, entry);
        }
    }
}

// ============================================================================
// ChatSession - Accessors
// ============================================================================

impl ChatSession {
    /// Returns the session identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the server address.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the session options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Returns the display name bound by the last successful join.
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        self.state.lock().identity.clone()
    }

    /// Returns the room bound by the last successful join.
    #[must_use]
    pub fn room(&self) -> Option<String> {
        self.state.lock().room.clone()
    }

    /// Returns `true` if a join succeeded and the connection has not
    /// dropped since.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Returns a snapshot of the visible history.
    #[must_use]
    pub fn entries(&self) -> Vec<ChatEntry> {
        self.state.lock().entries.clone()
    }

    /// Returns the connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.connection.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
