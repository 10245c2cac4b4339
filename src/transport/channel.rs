//! Duplex channel abstraction.
//!
//! A [`Transport`] dials an [`Endpoint`] and hands back a [`Channel`]: an
//! ordered queue of outbound commands and an ordered stream of inbound
//! events. One logical message per event; the channel owns framing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default chat server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default chat server port.
pub const DEFAULT_PORT: u16 = 9002;

// ============================================================================
// Endpoint
// ============================================================================

/// Host/port address of the chat server.
///
/// # Example
///
/// ```
/// use simplechat_client::Endpoint;
///
/// let endpoint: Endpoint = "chat.local:9100".parse().unwrap();
/// assert_eq!(endpoint.port(), 9100);
/// assert_eq!(endpoint.ws_url().unwrap().as_str(), "ws://chat.local:9100/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL for this endpoint.
    ///
    /// Format: `ws://{host}:{port}/`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host does not form a valid URL.
    pub fn ws_url(&self) -> Result<Url> {
        Url::parse(&format!("ws://{}:{}", self.host, self.port))
            .map_err(|e| Error::config(format!("invalid endpoint {self}: {e}")))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| Error::config(format!("endpoint must be host:port, got {s:?}")))?;

        if host.is_empty() {
            return Err(Error::config(format!("endpoint host is empty in {s:?}")));
        }

        let port = port
            .parse::<u16>()
            .map_err(|e| Error::config(format!("invalid port in {s:?}: {e}")))?;

        Ok(Self::new(host, port))
    }
}

// ============================================================================
// Channel Messages
// ============================================================================

/// Instruction to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Write one text message.
    Send(String),
    /// Close the channel.
    Close,
}

/// Signal from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// One inbound text message.
    Message(String),
    /// Channel closed (by either side).
    Closed,
    /// Channel failed.
    Error(String),
}

// ============================================================================
// Channel
// ============================================================================

/// A ready duplex channel.
///
/// Dropping the command sender closes the channel; the event stream ends
/// after the final [`ChannelEvent::Closed`] or [`ChannelEvent::Error`].
#[derive(Debug)]
pub struct Channel {
    commands: mpsc::UnboundedSender<ChannelCommand>,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl Channel {
    /// Creates a channel from its two queues.
    #[inline]
    #[must_use]
    pub fn new(
        commands: mpsc::UnboundedSender<ChannelCommand>,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> Self {
        Self { commands, events }
    }

    /// Splits into the command sender and event receiver.
    #[inline]
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<ChannelCommand>,
        mpsc::UnboundedReceiver<ChannelEvent>,
    ) {
        (self.commands, self.events)
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Dials chat servers.
///
/// `connect` resolves once the channel is ready for traffic and fails if
/// the channel errors before that.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a channel to `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Channel>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let endpoint = Endpoint::default();
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), 9002);
        assert_eq!(endpoint.to_string(), "localhost:9002");
    }

    #[test]
    fn test_ws_url_format() {
        let url = Endpoint::new("127.0.0.1", 9002).ws_url().expect("url");
        assert_eq!(url.scheme(), "ws");
        assert_eq!(url.as_str(), "ws://127.0.0.1:9002/");
    }

    #[test]
    fn test_parse_endpoint() {
        let endpoint: Endpoint = "example.org:8080".parse().expect("parse");
        assert_eq!(endpoint, Endpoint::new("example.org", 8080));

        let ipv6: Endpoint = "[::1]:9002".parse().expect("parse");
        assert_eq!(ipv6.host(), "[::1]");
        assert!(ipv6.ws_url().is_ok());
    }

    #[test]
    fn test_parse_endpoint_rejects_garbage() {
        assert!(matches!(
            "localhost".parse::<Endpoint>(),
            Err(Error::Config { .. })
        ));
        assert!(":9002".parse::<Endpoint>().is_err());
        assert!("localhost:99999".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_ws_url_rejects_bad_host() {
        let endpoint = Endpoint::new("bad host", 9002);
        assert!(matches!(endpoint.ws_url(), Err(Error::Config { .. })));
    }
}
