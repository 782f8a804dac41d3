//! World manager: owns the single live simulator session.
//!
//! After [`WorldManager::restart`] or [`WorldManager::reset_player`] returns
//! `Ok`, exactly one session with a spawned vehicle is bound. A session fault
//! drops the binding; the next reset re-acquires through the factory under the
//! bounded [`RetryPolicy`].

use drift_core::error::SimError;
use drift_core::types::{Control, RawState};

use crate::adapter::{Simulator, SimulatorFactory};
use crate::retry::RetryPolicy;

pub struct WorldManager {
    factory: Box<dyn SimulatorFactory>,
    retry: RetryPolicy,
    scenario: Option<String>,
    session: Option<Box<dyn Simulator>>,
    sessions_opened: u32,
}

impl WorldManager {
    #[must_use]
    pub fn new(factory: Box<dyn SimulatorFactory>, retry: RetryPolicy) -> Self {
        Self {
            factory,
            retry,
            scenario: None,
            session: None,
            sessions_opened: 0,
        }
    }

    /// Builder: load this scenario into every newly acquired session.
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    /// Whether a live session with a vehicle is bound.
    pub const fn has_vehicle(&self) -> bool {
        self.session.is_some()
    }

    /// Sessions successfully opened over this manager's lifetime.
    pub const fn sessions_opened(&self) -> u32 {
        self.sessions_opened
    }

    /// Drop any current session and acquire a new one.
    ///
    /// Fails with [`SimError::VehicleAcquisitionTimeout`] once every attempt
    /// allowed by the retry policy has failed.
    pub fn restart(&mut self) -> Result<(), SimError> {
        self.shutdown();

        let max_attempts = self.retry.max_attempts();
        for attempt in 1..=max_attempts {
            match self.acquire_once() {
                Ok(session) => {
                    tracing::info!(
                        session = session.name(),
                        attempt,
                        "vehicle session acquired"
                    );
                    self.session = Some(session);
                    self.sessions_opened += 1;
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(attempt, max_attempts, error = %err, "vehicle acquisition failed");
                    if attempt < max_attempts {
                        let delay = self.retry.backoff_for(attempt);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }

        tracing::error!(attempts = max_attempts, "giving up on vehicle acquisition");
        Err(SimError::VehicleAcquisitionTimeout {
            attempts: max_attempts,
        })
    }

    fn acquire_once(&self) -> Result<Box<dyn Simulator>, SimError> {
        let mut session = self.factory.connect()?;
        if let Some(scenario) = &self.scenario {
            session.load(scenario)?;
        }
        Ok(session)
    }

    /// Stop the current run and re-spawn the vehicle.
    ///
    /// The bridge zeroes its control input on `reset`, so no control is held
    /// here between steps. Acquires a session first if none is bound. If the
    /// bound session fails during the reset it is replaced once before the
    /// error is returned.
    pub fn reset_player(&mut self) -> Result<RawState, SimError> {
        if self.session.is_some() {
            match self.respawn() {
                Ok(raw) => return Ok(raw),
                Err(err) => {
                    tracing::warn!(error = %err, "reset failed on live session; reacquiring");
                }
            }
        }

        self.restart()?;
        self.respawn()
    }

    fn respawn(&mut self) -> Result<RawState, SimError> {
        let session = self.session.as_mut().ok_or(SimError::NoSession)?;
        let result = session.stop().and_then(|()| session.reset());
        if result.is_err() {
            self.session = None;
        }
        result
    }

    /// Forward one control to the simulator and return the next raw state.
    ///
    /// Any session fault unbinds the session.
    pub fn advance(&mut self, control: Control) -> Result<RawState, SimError> {
        let session = self.session.as_mut().ok_or(SimError::NoSession)?;
        let result = session.advance(control);
        if let Err(err) = &result {
            tracing::error!(error = %err, "simulator advance failed; session dropped");
            self.session = None;
        }
        result
    }

    /// Stop and release the current session, if any.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.stop() {
                tracing::debug!(error = %err, "stop on released session failed");
            }
        }
    }
}

impl std::fmt::Debug for WorldManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldManager")
            .field("retry", &self.retry)
            .field("scenario", &self.scenario)
            .field("has_vehicle", &self.has_vehicle())
            .field("sessions_opened", &self.sessions_opened)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
