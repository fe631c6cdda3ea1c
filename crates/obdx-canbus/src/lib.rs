pub mod config;
pub mod endpoint;
pub mod error;
pub mod exchange;
pub mod mock;
pub mod mux;

// SocketCAN endpoint only available on Linux
#[cfg(target_os = "linux")]
pub mod socket;

pub use config::{LoopbackInterfaces, Role, RunConfig};
pub use endpoint::{BusEndpoint, Received, SourceHandle};
pub use error::{CanError, CanResult};
pub use exchange::{CycleOutcome, Exchange, ExchangeState};
pub use mock::MockBusEndpoint;
pub use mux::{Multiplexer, REPLY_TIMEOUT, TimeoutPolicy, WaitOutcome};

#[cfg(target_os = "linux")]
pub use socket::SocketCanEndpoint;
