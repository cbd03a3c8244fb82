//! Blocking serial-style transport over a callback-driven websocket
//! library.
//!
//! The underlying socket library is event driven: connecting starts in the
//! background and data arrives through callbacks on the library's own
//! schedule. The consumer is the opposite — a host that cannot run an event
//! loop and expects a classic blocking device it can open, read one byte at
//! a time with a timeout, write, flush and close. [`WsTransport`] bridges
//! the two.
//!
//! # Architecture
//!
//! - [`SocketDriver`] is the capability this crate consumes: create a
//!   socket, send bytes, delete it, with connection progress and incoming
//!   messages delivered through a bound [`EventSink`].
//! - Each open connection is a session: liveness state and a receive
//!   buffer behind a mutex, with a condvar for wakeups. The driver's
//!   callbacks append bytes or flip state and notify; blocked opens and
//!   reads wait and re-check.
//! - A fixed-capacity arena maps generation-tagged [`serial::Handle`]s to
//!   sessions, so stale handles are rejected rather than resolved to a
//!   slot's next occupant.
//!
//! # Usage
//!
//! ```
//! use serial::{Backend, ReadOutcome, Timeout};
//! use serial_ws::WsTransport;
//! use serial_ws::testing::LoopbackDriver;
//!
//! # fn main() -> Result<(), serial::SerialError> {
//! let transport = WsTransport::new(LoopbackDriver::new());
//! let handle = transport.open("ws://debug-target:4711")?;
//!
//! // the test peer plays the remote end of the connection
//! let peer = transport.driver().endpoint("ws://debug-target:4711").unwrap();
//! peer.deliver(b"+");
//!
//! assert_eq!(
//!     transport.read_byte(handle, Timeout::from_secs(5))?,
//!     ReadOutcome::Byte(b'+'),
//! );
//! transport.write(handle, b"$?#3f")?;
//! transport.close(handle)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Scope
//!
//! This crate handles only the bridge: session bookkeeping, buffering, and
//! the blocking wait semantics. Actual network I/O lives in the driver;
//! device naming and registration live in the host.

mod buffer;
mod config;
mod driver;
mod session;
mod table;
mod transport;

pub mod testing;

pub use config::Config;
pub use driver::{DriverError, EventSink, SocketDriver};
pub use transport::WsTransport;
