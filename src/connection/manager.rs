//! Connection lifecycle and frame delivery.
//!
//! [`ConnectionManager`] owns the channel for one attempt at a time and is
//! the only writer of [`ConnectionState`].
//!
//! # Event Loop
//!
//! Each successful `open` spawns a tokio task that handles:
//!
//! - Inbound payloads → decoded [`InboundFrame`]s → frame handler, in order
//! - Channel close or error → `Disconnected` → state handler
//!
//! Handlers run one at a time. They must not call [`ConnectionManager::open`]
//! or [`ConnectionManager::close`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{InboundFrame, OutboundFrame};
use crate::transport::{ChannelCommand, ChannelEvent, Endpoint, Transport};

use super::ConnectionState;

// ============================================================================
// Constants
// ============================================================================

/// Default time allowed for the channel to become ready.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Types
// ============================================================================

/// Frame handler callback type.
///
/// Called for every inbound frame, in arrival order.
pub type FrameHandler = Box<dyn Fn(InboundFrame) + Send + Sync>;

/// State handler callback type.
///
/// Called exactly once per transition, in transition order.
pub type StateHandler = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// State owned by the manager and its event loop.
#[derive(Debug, Default)]
struct Shared {
    /// Current lifecycle state.
    state: ConnectionState,
    /// Number of the current attempt (0 before the first `open`).
    attempt: u64,
    /// Write side of the current channel.
    outbound: Option<mpsc::UnboundedSender<ChannelCommand>>,
}

/// Registered callbacks.
#[derive(Default)]
struct Handlers {
    frame: Mutex<Option<FrameHandler>>,
    state: Mutex<Option<StateHandler>>,
}

/// Retires an attempt whose `open` future is dropped before it resolves.
struct AttemptGuard<'a> {
    shared: &'a Mutex<Shared>,
    handlers: &'a Handlers,
    attempt: u64,
    resolved: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        // No-op when a failure path already moved the attempt on.
        if ConnectionManager::transition(
            self.shared,
            self.handlers,
            self.attempt,
            ConnectionState::Disconnected,
        ) {
            debug!(attempt = self.attempt, "Abandoned attempt retired");
        }
    }
}

/// Converts a deadline to whole milliseconds, saturating.
#[inline]
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Drives the connection state machine and carries frames across the
/// transport boundary.
///
/// # Example
///
/// ```ignore
/// let manager = ConnectionManager::new(Arc::new(WsTransport::new()));
/// manager.on_frame(|frame| println!("{frame:?}"));
/// manager.on_state_change(|state| println!("{state}"));
///
/// manager.open(&Endpoint::default()).await?;
/// manager.send(&OutboundFrame::message("hello"))?;
/// ```
pub struct ConnectionManager {
    /// Dialer for new channels.
    transport: Arc<dyn Transport>,
    /// Readiness deadline per attempt.
    connect_timeout: Duration,
    /// State shared with the event loop.
    shared: Arc<Mutex<Shared>>,
    /// Callbacks shared with the event loop.
    handlers: Arc<Handlers>,
}

impl ConnectionManager {
    /// Creates an idle manager.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_timeout(transport, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Creates an idle manager with a custom readiness deadline.
    #[must_use]
    pub fn with_timeout(transport: Arc<dyn Transport>, connect_timeout: Duration) -> Self {
        Self {
            transport,
            connect_timeout,
            shared: Arc::new(Mutex::new(Shared::default())),
            handlers: Arc::new(Handlers::default()),
        }
    }

    /// Registers the frame handler, replacing any previous one.
    pub fn on_frame(&self, handler: impl Fn(InboundFrame) + Send + Sync + 'static) {
        *self.handlers.frame.lock() = Some(Box::new(handler));
    }

    /// Registers the state handler, replacing any previous one.
    pub fn on_state_change(&self, handler: impl Fn(ConnectionState) + Send + Sync + 'static) {
        *self.handlers.state.lock() = Some(Box::new(handler));
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    /// Returns the number of the current attempt.
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.shared.lock().attempt
    }

    /// Starts a new connection attempt and waits until it resolves.
    ///
    /// A previous attempt that is still connecting or connected is closed
    /// and moved to `Disconnected` first; its late events never reach the
    /// handlers. Dropping the returned future before it resolves retires
    /// the attempt the same way.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionFailure`] if the channel fails before becoming ready
    /// - [`Error::ConnectionTimeout`] if it is not ready within the deadline
    pub async fn open(&self, endpoint: &Endpoint) -> Result<()> {
        let previous = {
            let mut shared = self.shared.lock();
            if let Some(outbound) = shared.outbound.take() {
                debug!(attempt = shared.attempt, "Closing channel of previous attempt");
                let _ = outbound.send(ChannelCommand::Close);
            }
            shared.attempt
        };

        if Self::transition(&self.shared, &self.handlers, previous, ConnectionState::Disconnected) {
            info!(attempt = previous, "Previous attempt retired");
        }

        let attempt = {
            let mut shared = self.shared.lock();
            shared.attempt += 1;
            shared.attempt
        };

        if !Self::transition(&self.shared, &self.handlers, attempt, ConnectionState::Connecting) {
            return Err(Error::connection_failure(
                endpoint.clone(),
                "attempt abandoned",
            ));
        }
        debug!(%endpoint, attempt, "Connecting");

        let mut guard = AttemptGuard {
            shared: &self.shared,
            handlers: &self.handlers,
            attempt,
            resolved: false,
        };

        let channel = match timeout(self.connect_timeout, self.transport.connect(endpoint)).await {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => {
                let e = match e {
                    Error::ConnectionFailure { .. } | Error::ConnectionTimeout { .. } => e,
                    other => Error::connection_failure(endpoint.clone(), other.to_string()),
                };
                return Err(self.fail_attempt(attempt, e));
            }
            Err(_) => {
                let e = Error::connection_timeout(endpoint.clone(), millis(self.connect_timeout));
                return Err(self.fail_attempt(attempt, e));
            }
        };

        let (commands, events) = channel.into_parts();

        {
            let mut shared = self.shared.lock();
            if shared.attempt != attempt || shared.state != ConnectionState::Connecting {
                debug!(attempt, "Attempt abandoned before it became ready");
                let _ = commands.send(ChannelCommand::Close);
                return Err(Error::connection_failure(
                    endpoint.clone(),
                    "attempt abandoned",
                ));
            }
            shared.outbound = Some(commands);
        }

        if !Self::transition(&self.shared, &self.handlers, attempt, ConnectionState::Connected) {
            return Err(Error::connection_failure(
                endpoint.clone(),
                "attempt abandoned",
            ));
        }
        guard.resolved = true;
        info!(%endpoint, attempt, "Connected");

        tokio::spawn(Self::run_event_loop(
            attempt,
            events,
            Arc::clone(&self.shared),
            Arc::clone(&self.handlers),
        ));

        Ok(())
    }

    /// Serializes `frame` and writes it to the channel.
    ///
    /// Fire-and-forget: no acknowledgement is awaited. Writes reach the
    /// channel in call order.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the state is not `Connected`
    /// - [`Error::ChannelClosed`] if the channel went away underneath
    /// - [`Error::Json`] if the frame cannot be serialized
    pub fn send(&self, frame: &OutboundFrame) -> Result<()> {
        let shared = self.shared.lock();

        if !shared.state.is_connected() {
            return Err(Error::NotConnected);
        }
        let outbound = shared.outbound.as_ref().ok_or(Error::NotConnected)?;

        let json = frame.encode()?;
        outbound
            .send(ChannelCommand::Send(json))
            .map_err(|_| Error::ChannelClosed)?;

        trace!(attempt = shared.attempt, "Frame sent");
        Ok(())
    }

    /// Closes the current channel, if any.
    ///
    /// Moves a `Connecting` or `Connected` attempt to `Disconnected`.
    pub fn close(&self) {
        let attempt = {
            let mut shared = self.shared.lock();
            if let Some(outbound) = shared.outbound.take() {
                let _ = outbound.send(ChannelCommand::Close);
            }
            shared.attempt
        };

        if Self::transition(&self.shared, &self.handlers, attempt, ConnectionState::Disconnected) {
            info!(attempt, "Connection closed by client");
        }
    }

    /// Marks `attempt` as failed and returns the error.
    fn fail_attempt(&self, attempt: u64, error: Error) -> Error {
        warn!(attempt, error = %error, "Connection attempt failed");
        Self::transition(&self.shared, &self.handlers, attempt, ConnectionState::Disconnected);
        error
    }

    /// Applies a transition for `attempt` and notifies the state handler.
    ///
    /// Returns `false` if the attempt is stale or the transition is illegal.
    fn transition(
        shared: &Mutex<Shared>,
        handlers: &Handlers,
        attempt: u64,
        next: ConnectionState,
    ) -> bool {
        // Holding the handler lock serializes notifications across tasks.
        let handler = handlers.state.lock();

        {
            let mut shared = shared.lock();
            if shared.attempt != attempt || !shared.state.can_transition_to(next) {
                return false;
            }
            debug!(attempt, from = %shared.state, to = %next, "State transition");
            shared.state = next;
        }

        if let Some(ref handler) = *handler {
            handler(next);
        }
        true
    }

    /// Returns `true` if `attempt` is still the live connection.
    fn is_live(shared: &Mutex<Shared>, attempt: u64) -> bool {
        let shared = shared.lock();
        shared.attempt == attempt && shared.state.is_connected()
    }

    /// Event loop delivering one attempt's inbound traffic.
    async fn run_event_loop(
        attempt: u64,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
        shared: Arc<Mutex<Shared>>,
        handlers: Arc<Handlers>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                ChannelEvent::Message(text) => {
                    if !Self::is_live(&shared, attempt) {
                        debug!(attempt, "Dropping delivery for retired attempt");
                        return;
                    }

                    let frame = InboundFrame::decode(&text);
                    trace!(attempt, tag = ?frame.tag(), "Frame received");

                    let handler = handlers.frame.lock();
                    if let Some(ref handler) = *handler {
                        handler(frame);
                    }
                }

                ChannelEvent::Closed => {
                    debug!(attempt, "Channel closed");
                    break;
                }

                ChannelEvent::Error(message) => {
                    warn!(attempt, error = %message, "Channel error");
                    break;
                }
            }
        }

        {
            let mut shared = shared.lock();
            if shared.attempt == attempt {
                shared.outbound = None;
            }
        }

        if Self::transition(&shared, &handlers, attempt, ConnectionState::Disconnected) {
            info!(attempt, "Disconnected");
        }

        debug!(attempt, "Event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::transport::{MemoryServer, MemoryTransport, WsTransport};

    const WAIT: Duration = Duration::from_secs(2);

    /// Manager wired to a memory transport, with handler output captured.
    fn setup() -> (
        ConnectionManager,
        MemoryTransport,
        MemoryServer,
        UnboundedReceiver<InboundFrame>,
        UnboundedReceiver<ConnectionState>,
    ) {
        let (transport, server) = MemoryTransport::pair();
        let manager = ConnectionManager::with_timeout(Arc::new(transport.clone()), WAIT);

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        manager.on_frame(move |frame| {
            let _ = frame_tx.send(frame);
        });
        manager.on_state_change(move |state| {
            let _ = state_tx.send(state);
        });

        (manager, transport, server, frame_rx, state_rx)
    }

    async fn next<T>(rx: &mut UnboundedReceiver<T>) -> T {
        timeout(WAIT, rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_open_reaches_connected() {
        let (manager, _transport, _server, _frames, mut states) = setup();
        assert_eq!(manager.state(), ConnectionState::Idle);

        manager.open(&Endpoint::default()).await.expect("open");

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.attempt(), 1);
        assert_eq!(next(&mut states).await, ConnectionState::Connecting);
        assert_eq!(next(&mut states).await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_open_failure_disconnects() {
        let (manager, transport, _server, _frames, mut states) = setup();
        transport.refuse_connections("refused");

        let err = manager.open(&Endpoint::default()).await.unwrap_err();

        assert!(matches!(err, Error::ConnectionFailure { .. }));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(next(&mut states).await, ConnectionState::Connecting);
        assert_eq!(next(&mut states).await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_open_timeout() {
        let (transport, _server) = MemoryTransport::pair();
        transport.stall_connections();
        let manager =
            ConnectionManager::with_timeout(Arc::new(transport), Duration::from_millis(20));

        let err = manager.open(&Endpoint::default()).await.unwrap_err();

        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: 20, .. }));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let (manager, transport, _server, _frames, _states) = setup();

        let err = manager.send(&OutboundFrame::message("hi")).unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        transport.refuse_connections("refused");
        let _ = manager.open(&Endpoint::default()).await;
        let err = manager.send(&OutboundFrame::message("hi")).unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_sends_are_written_in_order() {
        let (manager, _transport, mut server, _frames, _states) = setup();
        manager.open(&Endpoint::default()).await.expect("open");
        let mut peer = server.accept().await.expect("peer");

        for text in ["one", "two", "three"] {
            manager.send(&OutboundFrame::message(text)).expect("send");
        }

        assert_eq!(
            peer.next_written().await.as_deref(),
            Some(r#"{"type":"msg","text":"one"}"#)
        );
        assert_eq!(
            peer.next_written().await.as_deref(),
            Some(r#"{"type":"msg","text":"two"}"#)
        );
        assert_eq!(
            peer.next_written().await.as_deref(),
            Some(r#"{"type":"msg","text":"three"}"#)
        );
    }

    #[tokio::test]
    async fn test_frames_delivered_in_order() {
        let (manager, _transport, mut server, mut frames, _states) = setup();
        manager.open(&Endpoint::default()).await.expect("open");
        let peer = server.accept().await.expect("peer");

        peer.push(r#"{"type":"system","text":"welcome"}"#);
        peer.push("not json");
        peer.push(r#"{"type":"msg","from":"bob","text":"hi"}"#);

        assert_eq!(
            next(&mut frames).await,
            InboundFrame::System {
                text: Some("welcome".into())
            }
        );
        assert_eq!(
            next(&mut frames).await,
            InboundFrame::Malformed {
                raw: "not json".into()
            }
        );
        assert!(matches!(next(&mut frames).await, InboundFrame::Msg { .. }));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_peer_close_is_terminal() {
        let (manager, transport, mut server, _frames, mut states) = setup();
        manager.open(&Endpoint::default()).await.expect("open");
        let peer = server.accept().await.expect("peer");
        next(&mut states).await;
        next(&mut states).await;

        peer.close();

        assert_eq!(next(&mut states).await, ConnectionState::Disconnected);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(matches!(
            manager.send(&OutboundFrame::message("hi")),
            Err(Error::NotConnected)
        ));
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_error_disconnects() {
        let (manager, _transport, mut server, _frames, mut states) = setup();
        manager.open(&Endpoint::default()).await.expect("open");
        let peer = server.accept().await.expect("peer");
        next(&mut states).await;
        next(&mut states).await;

        peer.fail("connection reset");

        assert_eq!(next(&mut states).await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_reopen_retires_previous_attempt() {
        let (manager, _transport, mut server, mut frames, mut states) = setup();
        manager.open(&Endpoint::default()).await.expect("open");
        let mut first = server.accept().await.expect("peer");

        manager.open(&Endpoint::default()).await.expect("reopen");
        let second = server.accept().await.expect("peer");

        // Previous channel was told to close; its late traffic is dropped.
        assert_eq!(first.next_written().await, None);
        first.push(r#"{"type":"system","text":"stale"}"#);
        assert_eq!(manager.attempt(), 2);

        second.push(r#"{"type":"system","text":"fresh"}"#);
        assert_eq!(
            next(&mut frames).await,
            InboundFrame::System {
                text: Some("fresh".into())
            }
        );

        let mut sequence = Vec::new();
        for _ in 0..5 {
            sequence.push(next(&mut states).await);
        }
        assert_eq!(
            sequence,
            vec![
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Connected,
            ]
        );
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_dropped_open_retires_attempt() {
        let (manager, transport, _server, _frames, mut states) = setup();
        transport.stall_connections();

        let result = timeout(Duration::from_millis(20), manager.open(&Endpoint::default())).await;
        assert!(result.is_err());

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(next(&mut states).await, ConnectionState::Connecting);
        assert_eq!(next(&mut states).await, ConnectionState::Disconnected);

        transport.accept_connections();
        manager.open(&Endpoint::default()).await.expect("open");
        assert_eq!(next(&mut states).await, ConnectionState::Connecting);
        assert_eq!(next(&mut states).await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_reopen_while_connecting_disconnects_first() {
        let (manager, transport, _server, _frames, mut states) = setup();
        transport.stall_connections();

        let endpoint = Endpoint::default();
        let mut stalled = Box::pin(manager.open(&endpoint));
        assert!(
            timeout(Duration::from_millis(20), &mut stalled)
                .await
                .is_err()
        );
        assert_eq!(manager.state(), ConnectionState::Connecting);

        transport.accept_connections();
        manager.open(&Endpoint::default()).await.expect("open");

        let mut sequence = Vec::new();
        for _ in 0..4 {
            sequence.push(next(&mut states).await);
        }
        assert_eq!(
            sequence,
            vec![
                ConnectionState::Connecting,
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Connected,
            ]
        );

        // The superseded future is dropped without touching the live attempt.
        drop(stalled);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(
            timeout(Duration::from_millis(50), states.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_handshake_error_is_connection_failure() -> anyhow::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let manager = ConnectionManager::with_timeout(Arc::new(WsTransport::new()), WAIT);
        let err = manager
            .open(&Endpoint::new("127.0.0.1", port))
            .await
            .expect_err("open should fail");

        assert!(matches!(err, Error::ConnectionFailure { .. }));
        assert_eq!(
            err.hint(),
            format!("Could not connect. Check server and port {port}.")
        );
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        Ok(())
    }

    #[test]
    fn test_timeout_millis_saturate() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_client_close() {
        let (manager, _transport, mut server, _frames, mut states) = setup();
        manager.open(&Endpoint::default()).await.expect("open");
        let mut peer = server.accept().await.expect("peer");
        next(&mut states).await;
        next(&mut states).await;

        manager.close();

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(next(&mut states).await, ConnectionState::Disconnected);
        assert_eq!(peer.next_written().await, None);

        // Closing again is a no-op.
        manager.close();
        assert!(
            timeout(Duration::from_millis(50), states.recv())
                .await
                .is_err()
        );
    }
}
