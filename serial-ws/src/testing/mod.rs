//! In-process driver for exercising the adapter without a network.

mod loopback;

pub use loopback::{ConnectMode, LoopbackDriver, LoopbackEndpoint, LoopbackSocket};
