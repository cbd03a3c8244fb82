//! Host-facing serial transport contract.
//!
//! A debugger-style host talks to every remote byte channel the same way:
//! open a named device, read single bytes with a timeout, write, flush,
//! close. This crate defines that contract so backends of very different
//! shapes (physical lines, TCP sockets, message pipes) present one blocking
//! surface to the host.
//!
//! Backends implement [`Backend`]. The line-discipline entries (baud rate,
//! parity, break, tty state) come with no-op defaults so that backends whose
//! channel has no physical-line concept still satisfy the full surface.
//!
//! Read timeouts and end-of-stream are modelled as [`ReadOutcome`] values
//! rather than errors: a caller is expected to retry after a timeout and to
//! stop reading after EOF, and neither should be confused with a failure of
//! the transport itself.

mod backend;
mod error;
mod types;

pub use backend::Backend;
pub use error::SerialError;
pub use types::{Handle, Parity, ReadOutcome, StopBits, Timeout, TtyState};
