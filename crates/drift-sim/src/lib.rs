//! Simulator side of the drift control loop.
//!
//! - [`adapter`]: the [`Simulator`](adapter::Simulator) session boundary and
//!   its [`SimulatorFactory`](adapter::SimulatorFactory)
//! - [`protocol`] / [`framing`]: the length-prefixed JSON wire format
//! - [`remote`]: a TCP session with per-call deadlines
//! - [`retry`]: bounded exponential backoff
//! - [`world`]: the [`WorldManager`](world::WorldManager) that keeps exactly
//!   one live vehicle session

pub mod adapter;
pub mod framing;
pub mod protocol;
pub mod remote;
pub mod retry;
pub mod world;

pub mod prelude {
    pub use crate::{
        adapter::{Simulator, SimulatorFactory},
        protocol::{ProtocolError, SimRequest, SimResponse},
        remote::{RemoteSimulator, RemoteSimulatorFactory},
        retry::RetryPolicy,
        world::WorldManager,
    };
}
