//! The blocking adapter: a serial-style device over an event-driven socket.

use std::sync::{Arc, Mutex};

use serial::{Backend, Handle, ReadOutcome, SerialError, Timeout, TtyState};

use crate::config::Config;
use crate::driver::{EventSink, SocketDriver};
use crate::session::Session;
use crate::table::{Entry, SessionTable};

/// Serial-style blocking interface over a [`SocketDriver`].
///
/// One instance serves many concurrent connections: each `open` claims a
/// slot in the session table and later operations address it by handle.
/// The blocking calls park the calling thread on the session's condvar;
/// driver callbacks run on the driver's own threads and wake it.
///
/// Lock order is table, then session. Callbacks only ever lock their own
/// session, so a reader blocked on one handle never stalls opens, closes or
/// writes on another.
pub struct WsTransport<D: SocketDriver> {
    driver: D,
    config: Config,
    table: Mutex<SessionTable<D::Socket>>,
}

impl<D: SocketDriver> WsTransport<D> {
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, Config::default())
    }

    pub fn with_config(driver: D, config: Config) -> Self {
        let table = Mutex::new(SessionTable::new(config.max_sessions));
        Self {
            driver,
            config,
            table,
        }
    }

    /// The driver this adapter opens sockets through.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn session(&self, handle: Handle) -> Result<Arc<Session>, SerialError> {
        let table = self.table.lock().unwrap();
        Ok(Arc::clone(&table.lookup(handle)?.session))
    }

    /// Free the slot and hand the socket back to the driver, waking any
    /// reader still blocked on the session.
    fn teardown(&self, handle: Handle) {
        let entry = self.table.lock().unwrap().release(handle);
        if let Some(Entry { session, socket }) = entry {
            session.begin_teardown();
            if let Some(socket) = socket {
                self.driver.delete(socket);
            }
            session.finish_teardown();
        }
    }
}

impl<D: SocketDriver> Backend for WsTransport<D> {
    #[tracing::instrument(skip(self))]
    fn open(&self, name: &str) -> Result<Handle, SerialError> {
        if !self.driver.is_supported() {
            return Err(SerialError::Unsupported);
        }

        let (handle, session) = {
            let mut table = self.table.lock().unwrap();
            let capacity = table.capacity();
            table
                .allocate()
                .ok_or(SerialError::Exhausted { capacity })?
        };
        tracing::debug!(%handle, "session allocated");

        let sink: Arc<dyn EventSink> = session.clone();
        match self
            .driver
            .create(name, self.config.protocol.as_deref(), sink)
        {
            Ok(socket) => {
                // the handle has not escaped yet, so the slot is still ours
                self.table.lock().unwrap().lookup_mut(handle)?.socket = Some(socket);
            }
            Err(error) => {
                self.table.lock().unwrap().release(handle);
                return Err(SerialError::Driver(Box::new(error)));
            }
        }

        match session.wait_until_open(self.config.connect_timeout()) {
            Ok(()) => {
                tracing::debug!(%handle, "connection established");
                Ok(handle)
            }
            Err(error) => {
                tracing::warn!(%handle, %error, "open failed");
                self.teardown(handle);
                Err(error)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn close(&self, handle: Handle) -> Result<(), SerialError> {
        // closing an already-closed or stale handle is a no-op; only close
        // tolerates a dead handle
        self.teardown(handle);
        Ok(())
    }

    fn read_byte(&self, handle: Handle, timeout: Timeout) -> Result<ReadOutcome, SerialError> {
        let session = self.session(handle)?;
        let outcome = session.read_byte(timeout, self.config.read_quantum());
        tracing::trace!(%handle, ?timeout, ?outcome, "read");
        outcome
    }

    #[tracing::instrument(skip(self, payload), fields(len = payload.len()))]
    fn write(&self, handle: Handle, payload: &[u8]) -> Result<(), SerialError> {
        let table = self.table.lock().unwrap();
        let entry = table.lookup(handle)?;
        entry.session.check_writable()?;
        let socket = entry.socket.as_ref().ok_or(SerialError::ConnectionClosed)?;
        self.driver
            .send_binary(socket, payload)
            .map_err(|error| SerialError::Driver(Box::new(error)))
    }

    fn flush_input(&self, handle: Handle) -> Result<(), SerialError> {
        self.session(handle)?.flush_input();
        Ok(())
    }

    fn flush_output(&self, handle: Handle) -> Result<(), SerialError> {
        // sends go straight to the driver's queue; nothing of ours to drain
        self.session(handle).map(|_| ())
    }

    // The channel is a message pipe, not a physical line: the
    // line-discipline surface validates the handle and otherwise does
    // nothing.

    fn send_break(&self, handle: Handle) -> Result<(), SerialError> {
        self.session(handle).map(|_| ())
    }

    fn set_raw_mode(&self, handle: Handle) -> Result<(), SerialError> {
        // always raw
        self.session(handle).map(|_| ())
    }

    fn tty_state(&self, handle: Handle) -> Result<TtyState, SerialError> {
        self.session(handle).map(|_| TtyState)
    }

    fn set_tty_state(&self, handle: Handle, _state: &TtyState) -> Result<(), SerialError> {
        self.session(handle).map(|_| ())
    }

    fn copy_tty_state(&self, from: Handle, to: Handle) -> Result<(), SerialError> {
        self.session(from)?;
        self.session(to).map(|_| ())
    }

    fn describe_tty_state(&self, handle: Handle) -> Result<String, SerialError> {
        self.session(handle).map(|_| String::new())
    }

    fn set_baud_rate(&self, handle: Handle, _rate: u32) -> Result<(), SerialError> {
        self.session(handle).map(|_| ())
    }

    fn set_stop_bits(&self, handle: Handle, _bits: serial::StopBits) -> Result<(), SerialError> {
        self.session(handle).map(|_| ())
    }

    fn set_parity(&self, handle: Handle, _parity: serial::Parity) -> Result<(), SerialError> {
        self.session(handle).map(|_| ())
    }

    fn drain_output(&self, handle: Handle) -> Result<(), SerialError> {
        self.session(handle).map(|_| ())
    }
}
