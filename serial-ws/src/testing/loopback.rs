//! A scriptable in-memory [`SocketDriver`].
//!
//! The loopback driver stands in for the real websocket library in tests:
//! it records what the adapter sends, and lets the test play the remote
//! peer through a [`LoopbackEndpoint`] — accepting the handshake,
//! delivering messages, hanging up, or failing the connection. All
//! callbacks are funnelled through one dispatcher thread, so they arrive in
//! exactly the order they were scripted, on a thread that is not the
//! caller's.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{Sender, unbounded};

use crate::driver::{DriverError, EventSink, SocketDriver};

/// How a loopback socket behaves when the adapter asks to connect.
#[derive(Debug, Clone, Default)]
pub enum ConnectMode {
    /// Report the connection established as soon as it is created.
    #[default]
    Immediate,
    /// Do nothing until the test calls [`LoopbackEndpoint::accept`].
    Manual,
    /// Refuse synchronously from `create`.
    Refuse(String),
}

enum Callback {
    Open,
    Error(DriverError),
    Close,
    Message(Vec<u8>),
}

struct EndpointInner {
    url: String,
    sink: Arc<dyn EventSink>,
    events: Sender<(Arc<dyn EventSink>, Callback)>,
    sent: Mutex<Vec<Vec<u8>>>,
    send_error: Mutex<Option<DriverError>>,
    deleted: AtomicBool,
}

/// The test's view of one created socket: the remote peer.
#[derive(Clone)]
pub struct LoopbackEndpoint {
    inner: Arc<EndpointInner>,
}

impl LoopbackEndpoint {
    /// Complete the handshake.
    pub fn accept(&self) {
        self.dispatch(Callback::Open);
    }

    /// Deliver one message from the peer.
    pub fn deliver(&self, payload: &[u8]) {
        self.dispatch(Callback::Message(payload.to_vec()));
    }

    /// Close the connection from the peer's side.
    pub fn hang_up(&self) {
        self.dispatch(Callback::Close);
    }

    /// Report a connection failure.
    pub fn fail(&self, message: &str) {
        self.dispatch(Callback::Error(DriverError::Connection(message.into())));
    }

    /// Every payload the adapter has sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Make the next send on this socket fail with `message`.
    pub fn refuse_next_send(&self, message: &str) {
        *self.inner.send_error.lock().unwrap() = Some(DriverError::Send(message.into()));
    }

    /// Whether the adapter has released the socket.
    pub fn deleted(&self) -> bool {
        self.inner.deleted.load(Ordering::SeqCst)
    }

    pub fn url(&self) -> String {
        self.inner.url.clone()
    }

    fn dispatch(&self, callback: Callback) {
        let _ = self
            .inner
            .events
            .send((Arc::clone(&self.inner.sink), callback));
    }
}

/// Opaque per-socket handle handed back to the adapter.
pub struct LoopbackSocket {
    inner: Arc<EndpointInner>,
}

/// In-memory [`SocketDriver`] for tests.
pub struct LoopbackDriver {
    supported: bool,
    mode: ConnectMode,
    events: Sender<(Arc<dyn EventSink>, Callback)>,
    endpoints: Mutex<Vec<LoopbackEndpoint>>,
}

impl LoopbackDriver {
    /// A driver whose sockets connect as soon as they are created.
    pub fn new() -> Self {
        Self::with_mode(ConnectMode::Immediate)
    }

    pub fn with_mode(mode: ConnectMode) -> Self {
        let (events, rx) = unbounded::<(Arc<dyn EventSink>, Callback)>();
        thread::spawn(move || {
            while let Ok((sink, callback)) = rx.recv() {
                match callback {
                    Callback::Open => sink.on_open(),
                    Callback::Error(error) => sink.on_error(error),
                    Callback::Close => sink.on_close(),
                    Callback::Message(payload) => sink.on_message(&payload),
                }
            }
        });
        Self {
            supported: true,
            mode,
            events,
            endpoints: Mutex::new(Vec::new()),
        }
    }

    /// A driver whose transport kind is unavailable on this host.
    pub fn unsupported() -> Self {
        let mut driver = Self::new();
        driver.supported = false;
        driver
    }

    /// The most recently created endpoint for `url`.
    pub fn endpoint(&self, url: &str) -> Option<LoopbackEndpoint> {
        self.endpoints
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|endpoint| endpoint.inner.url == url)
            .cloned()
    }

    /// Endpoints in creation order.
    pub fn endpoints(&self) -> Vec<LoopbackEndpoint> {
        self.endpoints.lock().unwrap().clone()
    }
}

impl Default for LoopbackDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketDriver for LoopbackDriver {
    type Socket = LoopbackSocket;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(
        &self,
        url: &str,
        _protocol_hint: Option<&str>,
        sink: Arc<dyn EventSink>,
    ) -> Result<LoopbackSocket, DriverError> {
        if let ConnectMode::Refuse(message) = &self.mode {
            return Err(DriverError::Create(message.clone()));
        }
        let inner = Arc::new(EndpointInner {
            url: url.to_string(),
            sink,
            events: self.events.clone(),
            sent: Mutex::new(Vec::new()),
            send_error: Mutex::new(None),
            deleted: AtomicBool::new(false),
        });
        let endpoint = LoopbackEndpoint {
            inner: Arc::clone(&inner),
        };
        if matches!(self.mode, ConnectMode::Immediate) {
            endpoint.accept();
        }
        self.endpoints.lock().unwrap().push(endpoint);
        Ok(LoopbackSocket { inner })
    }

    fn send_binary(&self, socket: &LoopbackSocket, payload: &[u8]) -> Result<(), DriverError> {
        if let Some(error) = socket.inner.send_error.lock().unwrap().take() {
            return Err(error);
        }
        socket.inner.sent.lock().unwrap().push(payload.to_vec());
        Ok(())
    }

    fn delete(&self, socket: LoopbackSocket) {
        socket.inner.deleted.store(true, Ordering::SeqCst);
    }
}
