//! Per-connection state and the callbacks that mutate it.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serial::{ReadOutcome, SerialError, Timeout};

use crate::buffer::ByteBuffer;
use crate::driver::{DriverError, EventSink};

/// Where a session's connection is in its life.
///
/// Transitions only advance; `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Liveness {
    /// Handshake still in flight.
    Connecting,
    /// Established; bytes flow.
    Open,
    /// Local teardown started.
    Closing,
    /// Connection gone, locally or remotely.
    Closed,
    /// The driver reported a failure.
    Failed,
}

impl Liveness {
    fn is_terminal(self) -> bool {
        matches!(self, Liveness::Closed | Liveness::Failed)
    }
}

#[derive(Debug)]
struct SessionState {
    liveness: Liveness,
    buffer: ByteBuffer,
    error: Option<DriverError>,
}

/// One logical connection: liveness, receive buffer, and the wakeup that
/// blocking calls sleep on.
///
/// Driver callbacks lock the state, mutate it and notify; blocked opens and
/// reads wait on the condvar and re-check on every wake. The session never
/// touches the table it lives in, so callbacks and table operations cannot
/// deadlock against each other.
#[derive(Debug)]
pub(crate) struct Session {
    state: Mutex<SessionState>,
    wakeup: Condvar,
}

impl Session {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SessionState {
                liveness: Liveness::Connecting,
                buffer: ByteBuffer::new(),
                error: None,
            }),
            wakeup: Condvar::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap()
    }

    /// Advance the liveness state. Terminal states stick, and a session
    /// being torn down locally can only finish tearing down.
    fn advance(state: &mut SessionState, to: Liveness) -> bool {
        if state.liveness.is_terminal() || state.liveness == to {
            return false;
        }
        if state.liveness == Liveness::Closing && to != Liveness::Closed {
            return false;
        }
        state.liveness = to;
        true
    }

    /// Mark local teardown as started, waking any blocked reader.
    pub(crate) fn begin_teardown(&self) {
        let mut state = self.lock();
        Self::advance(&mut state, Liveness::Closing);
        self.wakeup.notify_all();
    }

    /// Mark the connection fully gone.
    pub(crate) fn finish_teardown(&self) {
        let mut state = self.lock();
        Self::advance(&mut state, Liveness::Closed);
        self.wakeup.notify_all();
    }

    /// Discard buffered-but-unread bytes.
    pub(crate) fn flush_input(&self) {
        let mut state = self.lock();
        let discarded = state.buffer.unread();
        state.buffer.clear();
        if discarded > 0 {
            tracing::debug!(discarded, "input flushed");
        }
    }

    /// Whether the connection can still carry writes; surfaces the recorded
    /// failure otherwise.
    pub(crate) fn check_writable(&self) -> Result<(), SerialError> {
        let state = self.lock();
        match state.liveness {
            Liveness::Failed => Err(failure_error(&state)),
            Liveness::Closing | Liveness::Closed => Err(SerialError::ConnectionClosed),
            Liveness::Connecting | Liveness::Open => Ok(()),
        }
    }

    /// Block until the handshake resolves. `limit` bounds the wait; `None`
    /// waits for as long as the driver keeps connecting.
    pub(crate) fn wait_until_open(&self, limit: Option<Duration>) -> Result<(), SerialError> {
        let started = Instant::now();
        let mut state = self.lock();
        loop {
            match state.liveness {
                Liveness::Open => return Ok(()),
                Liveness::Failed => return Err(failure_error(&state)),
                Liveness::Closing | Liveness::Closed => return Err(SerialError::ConnectionClosed),
                Liveness::Connecting => {}
            }
            match limit {
                None => state = self.wakeup.wait(state).unwrap(),
                Some(limit) => {
                    let waited = started.elapsed();
                    if waited >= limit {
                        return Err(SerialError::ConnectTimeout { waited });
                    }
                    let (guard, _) = self.wakeup.wait_timeout(state, limit - waited).unwrap();
                    state = guard;
                }
            }
        }
    }

    /// Pop one byte, waiting according to `timeout`.
    ///
    /// Buffered bytes are served before liveness is consulted, so bytes
    /// delivered before a close remain readable. Bounded waits sleep in
    /// slices of at most one `quantum`; expiry is therefore detected within
    /// a quantum of the requested deadline, while an arrival wakes the
    /// reader immediately.
    pub(crate) fn read_byte(
        &self,
        timeout: Timeout,
        quantum: Duration,
    ) -> Result<ReadOutcome, SerialError> {
        let deadline = match timeout {
            Timeout::After(limit) => Some(Instant::now() + limit),
            _ => None,
        };
        let mut state = self.lock();
        loop {
            if let Some(byte) = state.buffer.pop() {
                return Ok(ReadOutcome::Byte(byte));
            }
            match state.liveness {
                Liveness::Failed => return Err(failure_error(&state)),
                Liveness::Closing | Liveness::Closed => return Ok(ReadOutcome::Eof),
                Liveness::Connecting | Liveness::Open => {}
            }
            match timeout {
                Timeout::Poll => return Ok(ReadOutcome::TimedOut),
                Timeout::Forever => state = self.wakeup.wait(state).unwrap(),
                Timeout::After(_) => {
                    let deadline = deadline.unwrap();
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(ReadOutcome::TimedOut);
                    }
                    let slice = quantum.min(deadline - now);
                    let (guard, _) = self.wakeup.wait_timeout(state, slice).unwrap();
                    state = guard;
                }
            }
        }
    }
}

fn failure_error(state: &SessionState) -> SerialError {
    match &state.error {
        Some(error) => SerialError::Driver(Box::new(error.clone())),
        None => SerialError::ConnectionClosed,
    }
}

impl EventSink for Session {
    fn on_open(&self) {
        let mut state = self.lock();
        if Self::advance(&mut state, Liveness::Open) {
            tracing::debug!("connection established");
        }
        self.wakeup.notify_all();
    }

    fn on_error(&self, error: DriverError) {
        let mut state = self.lock();
        tracing::warn!(%error, "driver reported an error");
        if state.error.is_none() {
            state.error = Some(error);
        }
        Self::advance(&mut state, Liveness::Failed);
        self.wakeup.notify_all();
    }

    fn on_close(&self) {
        let mut state = self.lock();
        Self::advance(&mut state, Liveness::Closed);
        self.wakeup.notify_all();
    }

    fn on_message(&self, payload: &[u8]) {
        let mut state = self.lock();
        state.buffer.append(payload);
        self.wakeup.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUANTUM: Duration = Duration::from_millis(10);

    #[test]
    fn opened_callback_unblocks_the_handshake() {
        let session = Session::new();
        session.on_open();
        assert!(session.wait_until_open(Some(Duration::from_millis(50))).is_ok());
    }

    #[test]
    fn handshake_times_out_while_still_connecting() {
        let session = Session::new();
        let err = session.wait_until_open(Some(Duration::from_millis(20))).unwrap_err();
        assert!(matches!(err, SerialError::ConnectTimeout { .. }));
    }

    #[test]
    fn liveness_never_regresses_out_of_a_terminal_state() {
        let session = Session::new();
        session.on_close();
        session.on_open();
        assert_eq!(session.read_byte(Timeout::Poll, QUANTUM).unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn messages_read_back_in_delivery_order() {
        let session = Session::new();
        session.on_open();
        session.on_message(b"ab");
        session.on_message(b"c");
        for expected in *b"abc" {
            assert_eq!(
                session.read_byte(Timeout::Poll, QUANTUM).unwrap(),
                ReadOutcome::Byte(expected)
            );
        }
        assert_eq!(session.read_byte(Timeout::Poll, QUANTUM).unwrap(), ReadOutcome::TimedOut);
    }

    #[test]
    fn buffered_bytes_survive_a_remote_close() {
        let session = Session::new();
        session.on_open();
        session.on_message(b"x");
        session.on_close();
        assert_eq!(session.read_byte(Timeout::Poll, QUANTUM).unwrap(), ReadOutcome::Byte(b'x'));
        assert_eq!(session.read_byte(Timeout::Forever, QUANTUM).unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn a_recorded_error_fails_reads_and_writes() {
        let session = Session::new();
        session.on_open();
        session.on_error(DriverError::Connection("reset".into()));
        assert!(matches!(
            session.read_byte(Timeout::Poll, QUANTUM),
            Err(SerialError::Driver(_))
        ));
        assert!(matches!(session.check_writable(), Err(SerialError::Driver(_))));
    }

    #[test]
    fn bounded_read_expires_near_its_deadline() {
        let session = Session::new();
        session.on_open();
        let started = Instant::now();
        let outcome = session
            .read_byte(Timeout::After(Duration::from_millis(30)), QUANTUM)
            .unwrap();
        assert_eq!(outcome, ReadOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn local_teardown_wakes_a_blocked_reader_with_eof() {
        let session = Session::new();
        session.on_open();
        let reader = Arc::clone(&session);
        let join = std::thread::spawn(move || reader.read_byte(Timeout::Forever, QUANTUM));
        std::thread::sleep(Duration::from_millis(20));
        session.begin_teardown();
        assert_eq!(join.join().unwrap().unwrap(), ReadOutcome::Eof);
    }
}
