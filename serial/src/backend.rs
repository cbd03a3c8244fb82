//! The contract every transport backend satisfies.

use crate::{Handle, Parity, ReadOutcome, SerialError, StopBits, Timeout, TtyState};

/// A serial-style device backend.
///
/// One backend instance serves many concurrent connections; each open
/// returns a [`Handle`] that later operations address. All operations block
/// the calling thread: the host has no event loop of its own and expects
/// `read_byte` in particular to return only with a byte, a timeout, an EOF,
/// or an error.
///
/// The line-discipline entries exist so the host can drive every backend
/// through the same surface; backends whose channel is not a physical line
/// keep the no-op defaults.
pub trait Backend {
    /// Open a connection to the device named `name` and return its handle.
    /// Blocks until the connection is established.
    fn open(&self, name: &str) -> Result<Handle, SerialError>;

    /// Tear the connection down and free its slot. Closing an
    /// already-closed handle is a no-op.
    fn close(&self, handle: Handle) -> Result<(), SerialError>;

    /// Read one byte, waiting according to `timeout`.
    fn read_byte(&self, handle: Handle, timeout: Timeout) -> Result<ReadOutcome, SerialError>;

    /// Queue `payload` for transmission in one call.
    fn write(&self, handle: Handle, payload: &[u8]) -> Result<(), SerialError>;

    /// Discard bytes received but not yet read.
    fn flush_input(&self, handle: Handle) -> Result<(), SerialError>;

    /// Wait until queued output has been handed to the wire.
    fn flush_output(&self, handle: Handle) -> Result<(), SerialError>;

    /// Assert a break condition on the line.
    fn send_break(&self, _handle: Handle) -> Result<(), SerialError> {
        Ok(())
    }

    /// Put the line into raw (uninterpreted) mode.
    fn set_raw_mode(&self, _handle: Handle) -> Result<(), SerialError> {
        Ok(())
    }

    /// Current line state.
    fn tty_state(&self, _handle: Handle) -> Result<TtyState, SerialError> {
        Ok(TtyState)
    }

    /// Restore a previously captured line state.
    fn set_tty_state(&self, _handle: Handle, _state: &TtyState) -> Result<(), SerialError> {
        Ok(())
    }

    /// Carry the line state of one connection over to another.
    fn copy_tty_state(&self, _from: Handle, _to: Handle) -> Result<(), SerialError> {
        Ok(())
    }

    /// Human-readable rendering of the line state, for diagnostics.
    fn describe_tty_state(&self, _handle: Handle) -> Result<String, SerialError> {
        Ok(String::new())
    }

    fn set_baud_rate(&self, _handle: Handle, _rate: u32) -> Result<(), SerialError> {
        Ok(())
    }

    fn set_stop_bits(&self, _handle: Handle, _bits: StopBits) -> Result<(), SerialError> {
        Ok(())
    }

    fn set_parity(&self, _handle: Handle, _parity: Parity) -> Result<(), SerialError> {
        Ok(())
    }

    /// Block until pending output has drained.
    fn drain_output(&self, _handle: Handle) -> Result<(), SerialError> {
        Ok(())
    }
}
