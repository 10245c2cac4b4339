//! WebSocket channel.
//!
//! [`WsTransport`] dials `ws://host:port` with tokio-tungstenite and spawns
//! one pump task per channel.
//!
//! # Pump
//!
//! The pump task handles:
//!
//! - Incoming text messages → [`ChannelEvent::Message`], in order
//! - Outgoing [`ChannelCommand::Send`] → WebSocket text frames, in order
//! - Close from either side → [`ChannelEvent::Closed`]
//! - Socket errors → [`ChannelEvent::Error`]

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};

use super::channel::{Channel, ChannelCommand, ChannelEvent, Endpoint, Transport};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WsTransport
// ============================================================================

/// WebSocket implementation of [`Transport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Creates a WebSocket transport.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Pump loop that bridges the socket and the channel queues.
    async fn run_pump(
        ws_stream: ClientStream,
        mut command_rx: mpsc::UnboundedReceiver<ChannelCommand>,
        event_tx: mpsc::UnboundedSender<ChannelEvent>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming messages from server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Message received");
                            if event_tx.send(ChannelEvent::Message(text.to_string())).is_err() {
                                debug!("Event receiver dropped");
                                let _ = ws_write.close().await;
                                break;
                            }
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            let _ = event_tx.send(ChannelEvent::Closed);
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            let _ = event_tx.send(ChannelEvent::Error(e.to_string()));
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            let _ = event_tx.send(ChannelEvent::Closed);
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the connection manager
                command = command_rx.recv() => {
                    match command {
                        Some(ChannelCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                warn!(error = %e, "Failed to write message");
                                let _ = event_tx.send(ChannelEvent::Error(e.to_string()));
                                break;
                            }
                            trace!("Message written");
                        }

                        Some(ChannelCommand::Close) | None => {
                            debug!("Close requested");
                            let _ = ws_write.close().await;
                            let _ = event_tx.send(ChannelEvent::Closed);
                            break;
                        }
                    }
                }
            }
        }

        debug!("Pump terminated");
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Channel> {
        let url = endpoint.ws_url()?;

        let (ws_stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            warn!(%endpoint, error = %e, "WebSocket handshake failed");
            Error::from(e)
        })?;

        info!(%endpoint, "WebSocket connection established");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_pump(ws_stream, command_rx, event_tx));

        Ok(Channel::new(command_tx, event_rx))
    }
}

// ============================================================================
// Tests
// ============================================================================
