//! Error types shared by every transport backend.

use std::time::Duration;

use crate::Handle;

/// Errors surfaced by backend operations.
///
/// Read timeouts and end-of-stream are not errors; see
/// [`ReadOutcome`](crate::ReadOutcome). Everything here is returned
/// synchronously from the failing call and treated as terminal for the
/// handle unless documented otherwise.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The backend's transport kind is unavailable on this host.
    #[error("transport is not supported on this host")]
    Unsupported,

    /// Every session slot is in use.
    #[error("session table exhausted ({capacity} sessions in use)")]
    Exhausted { capacity: usize },

    /// The handle does not name a live session.
    #[error("invalid handle {0}")]
    InvalidHandle(Handle),

    /// The connection attempt did not complete in time.
    #[error("connect timed out after {waited:?}")]
    ConnectTimeout { waited: Duration },

    /// The session's connection has gone away.
    #[error("connection closed")]
    ConnectionClosed,

    /// The underlying transport library reported a failure.
    #[error("transport driver error")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}
