//! TCP session with a simulator bridge process.
//!
//! Every call writes one [`SimRequest`] and blocks for one [`SimResponse`].
//! Read and write deadlines come from [`SimulatorConfig`]; an expired deadline
//! fails the call with [`SimError::Timeout`] instead of hanging the loop.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use drift_core::config::SimulatorConfig;
use drift_core::error::SimError;
use drift_core::types::{Control, RawState};

use crate::adapter::{Simulator, SimulatorFactory};
use crate::framing::{read_message, write_message};
use crate::protocol::{ProtocolError, SimRequest, SimResponse};

// ---------------------------------------------------------------------------
// RemoteSimulator
// ---------------------------------------------------------------------------

pub struct RemoteSimulator {
    stream: TcpStream,
    peer: SocketAddr,
    round_trip_timeout: Duration,
}

impl RemoteSimulator {
    /// Connect to `address` and apply the configured deadlines.
    pub fn connect(
        address: &str,
        connect_timeout: Duration,
        round_trip_timeout: Duration,
    ) -> Result<Self, SimError> {
        let peer = address
            .to_socket_addrs()
            .map_err(|e| SimError::Unavailable(format!("cannot resolve {address}: {e}")))?
            .next()
            .ok_or_else(|| SimError::Unavailable(format!("no address for {address}")))?;

        let stream = TcpStream::connect_timeout(&peer, connect_timeout)
            .map_err(|e| SimError::Unavailable(format!("connect to {peer}: {e}")))?;
        stream
            .set_read_timeout(Some(round_trip_timeout))
            .and_then(|()| stream.set_write_timeout(Some(round_trip_timeout)))
            .and_then(|()| stream.set_nodelay(true))
            .map_err(|e| SimError::Unavailable(format!("configure socket: {e}")))?;

        tracing::debug!(%peer, ?round_trip_timeout, "simulator session connected");
        Ok(Self {
            stream,
            peer,
            round_trip_timeout,
        })
    }

    pub fn from_config(config: &SimulatorConfig) -> Result<Self, SimError> {
        Self::connect(
            &config.address,
            config.connect_timeout(),
            config.round_trip_timeout(),
        )
    }

    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn round_trip(&mut self, request: &SimRequest) -> Result<SimResponse, SimError> {
        let op = request.op();
        let after = self.round_trip_timeout;

        write_message(&mut self.stream, request).map_err(|e| e.into_sim_error(op, after))?;
        let response: SimResponse = read_message(&mut self.stream)
            .and_then(|msg| msg.ok_or(ProtocolError::Disconnected))
            .map_err(|e| e.into_sim_error(op, after))?;

        match response {
            SimResponse::Error { message } => Err(SimError::Remote(message)),
            other => Ok(other),
        }
    }

    fn expect_state(&mut self, request: &SimRequest) -> Result<RawState, SimError> {
        match self.round_trip(request)? {
            SimResponse::State { values } => RawState::from_values(&values),
            other => Err(SimError::Protocol(format!(
                "expected state for {}, got {other:?}",
                request.op()
            ))),
        }
    }

    fn expect_ack(&mut self, request: &SimRequest) -> Result<(), SimError> {
        match self.round_trip(request)? {
            SimResponse::Ack => Ok(()),
            other => Err(SimError::Protocol(format!(
                "expected ack for {}, got {other:?}",
                request.op()
            ))),
        }
    }
}

impl Simulator for RemoteSimulator {
    fn load(&mut self, scenario: &str) -> Result<(), SimError> {
        self.expect_ack(&SimRequest::Load {
            scenario: scenario.to_owned(),
        })
    }

    fn reset(&mut self) -> Result<RawState, SimError> {
        self.expect_state(&SimRequest::Reset)
    }

    fn advance(&mut self, control: Control) -> Result<RawState, SimError> {
        self.expect_state(&SimRequest::Advance {
            control: control.to_values(),
        })
    }

    fn stop(&mut self) -> Result<(), SimError> {
        self.expect_ack(&SimRequest::Stop)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "RemoteSimulator"
    }
}

impl std::fmt::Debug for RemoteSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSimulator")
            .field("peer", &self.peer)
            .field("round_trip_timeout", &self.round_trip_timeout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// RemoteSimulatorFactory
// ---------------------------------------------------------------------------

/// Opens a fresh [`RemoteSimulator`] per acquisition attempt.
#[derive(Debug, Clone)]
pub struct RemoteSimulatorFactory {
    config: SimulatorConfig,
}

impl RemoteSimulatorFactory {
    #[must_use]
    pub const fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }
}

impl SimulatorFactory for RemoteSimulatorFactory {
    fn connect(&self) -> Result<Box<dyn Simulator>, SimError> {
        Ok(Box::new(RemoteSimulator::from_config(&self.config)?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
