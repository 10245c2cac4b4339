//! Builder pattern for session configuration.
//!
//! Provides a fluent API for configuring and creating [`ChatSession`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use simplechat_client::{ChatSession, MemorySink};
//!
//! # fn example() -> simplechat_client::Result<()> {
//! let session = ChatSession::builder()
//!     .address("127.0.0.1:9002")
//!     .sink(MemorySink::new())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{Endpoint, Transport, WsTransport};

use super::core::ChatSession;
use super::options::SessionOptions;
use super::sink::RenderSink;

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`ChatSession`].
///
/// Use [`ChatSession::builder()`] to create a new builder.
#[derive(Default)]
pub struct SessionBuilder {
    /// Explicit endpoint.
    endpoint: Option<Endpoint>,
    /// Endpoint in `host:port` form, parsed at build time.
    address: Option<String>,
    /// Channel dialer.
    transport: Option<Arc<dyn Transport>>,
    /// Render target.
    sink: Option<Arc<dyn RenderSink>>,
    /// Tunables.
    options: SessionOptions,
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self.address = None;
        self
    }

    /// Sets the server endpoint from `host:port`.
    #[inline]
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self.endpoint = None;
        self
    }

    /// Sets the transport. Defaults to [`WsTransport`].
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the render sink.
    #[inline]
    #[must_use]
    pub fn sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Sets the room used by `join_default`.
    #[inline]
    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.options = self.options.with_room(room);
        self
    }

    /// Sets the readiness deadline for each connection attempt.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.options = self.options.with_connect_timeout(connect_timeout);
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the session with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no sink is set
    /// - [`Error::Config`] if the endpoint or options are invalid
    pub fn build(self) -> Result<ChatSession> {
        let endpoint = self.validate_endpoint()?;
        self.options.validate()?;

        let sink = self.sink.ok_or_else(|| {
            Error::config(
                "A render sink is required. Use .sink() to set it.\n\
                 Example: ChatSession::builder().sink(MemorySink::new())",
            )
        })?;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WsTransport::new()));

        Ok(ChatSession::new(endpoint, transport, sink, self.options))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    /// Resolves and validates the endpoint configuration.
    fn validate_endpoint(&self) -> Result<Endpoint> {
        let endpoint = match (&self.endpoint, &self.address) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(address)) => address.parse()?,
            (None, None) => Endpoint::default(),
        };

        if endpoint.host().trim().is_empty() {
            return Err(Error::config("endpoint host must not be empty"));
        }
        if endpoint.port() == 0 {
            return Err(Error::config("endpoint port must not be zero"));
        }
        endpoint.ws_url()?;

        Ok(endpoint)
    }
}

// ============================================================================
// Tests
// ============================================================================
