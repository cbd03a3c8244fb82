//! Adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for [`WsTransport`](crate::WsTransport).
///
/// Every field has a default, so a host can deserialize a partial table
/// from its own configuration file and only override what it cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of concurrently open sessions.
    pub max_sessions: usize,
    /// Websocket subprotocol offered when connecting; the driver picks its
    /// default when unset.
    pub protocol: Option<String>,
    /// Milliseconds an open may spend waiting for the handshake. `None`
    /// waits for as long as the driver keeps connecting.
    pub connect_timeout_ms: Option<u64>,
    /// Longest single slice a bounded read sleeps before re-checking its
    /// deadline, in milliseconds.
    pub read_quantum_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_sessions: 10,
            protocol: None,
            connect_timeout_ms: Some(30_000),
            read_quantum_ms: 100,
        }
    }
}

impl Config {
    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn read_quantum(&self) -> Duration {
        Duration::from_millis(self.read_quantum_ms.max(1))
    }
}
