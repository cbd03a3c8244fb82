//! The capability interface consumed from the underlying websocket library.

use std::sync::Arc;

/// Callbacks fired by a driver for one socket.
///
/// A sink is bound when the socket is created and stays bound for the
/// socket's lifetime. The driver may invoke it from any of its own threads,
/// but for a given socket the calls arrive in delivery order.
pub trait EventSink: Send + Sync {
    /// The connection handshake completed.
    fn on_open(&self);
    /// The connection failed.
    fn on_error(&self, error: DriverError);
    /// The peer closed the connection.
    fn on_close(&self);
    /// A message arrived.
    fn on_message(&self, payload: &[u8]);
}

/// Failures reported by a [`SocketDriver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The socket could not be created.
    #[error("socket creation failed: {0}")]
    Create(String),
    /// A payload could not be queued for transmission.
    #[error("send failed: {0}")]
    Send(String),
    /// The connection dropped or was refused.
    #[error("connection error: {0}")]
    Connection(String),
}

/// An event-driven socket library.
///
/// The driver owns all sockets and all event dispatch; this crate only
/// holds the opaque [`Socket`](SocketDriver::Socket) values it is handed
/// and the sinks it binds. Connecting and receiving are asynchronous on the
/// driver's side — completion and data arrive through the bound sink.
pub trait SocketDriver: Send + Sync {
    /// Driver-owned per-socket handle.
    type Socket: Send;

    /// Whether sockets can be opened on this host at all.
    fn is_supported(&self) -> bool;

    /// Start connecting to `url`, with `sink` bound for the socket's whole
    /// lifetime. Connecting continues after this returns; the outcome is
    /// reported through the sink.
    fn create(
        &self,
        url: &str,
        protocol_hint: Option<&str>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self::Socket, DriverError>;

    /// Queue `payload` on the socket's internal send queue.
    fn send_binary(&self, socket: &Self::Socket, payload: &[u8]) -> Result<(), DriverError>;

    /// Tear the socket down and release it.
    fn delete(&self, socket: Self::Socket);
}
