//! Seam between the chat session and the real-time transport.
//!
//! The production implementation is `channel::ChatChannel`; tests substitute
//! in-memory fakes to observe exactly what a session emits.

use async_trait::async_trait;

use super::message::WireMessage;
use crate::error::Result;

/// A live, already-authenticated connection to the chat server.
#[async_trait]
pub trait MessageTransport: Send {
    fn is_connected(&self) -> bool;

    /// Emits one outbound message event. Implementations treat a send while
    /// disconnected as a logged no-op, not an error (best-effort delivery).
    async fn send(&self, message: &WireMessage) -> Result<()>;

    /// Next inbound message event; `None` once the transport is closed.
    async fn recv(&mut self) -> Option<WireMessage>;

    /// Tears the connection down deterministically.
    async fn close(&mut self);
}

/// Opens transports. One exists per chat session so conversation switches
/// can close the old channel before opening the next.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, token: &str) -> Result<Box<dyn MessageTransport>>;
}
