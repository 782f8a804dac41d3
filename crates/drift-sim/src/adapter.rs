use drift_core::error::SimError;
use drift_core::types::{Control, RawState};

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// One session with an external vehicle-dynamics simulation.
///
/// Every call is a blocking round-trip; at most one is in flight per session.
pub trait Simulator: Send {
    /// Load a scenario into the session.
    fn load(&mut self, scenario: &str) -> Result<(), SimError>;

    /// Re-spawn the vehicle and return its initial state.
    fn reset(&mut self) -> Result<RawState, SimError>;

    /// Advance exactly one physics tick under `control`.
    fn advance(&mut self, control: Control) -> Result<RawState, SimError>;

    /// Stop the current run.
    fn stop(&mut self) -> Result<(), SimError>;

    /// Human-readable name for this session.
    fn name(&self) -> &str;
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn load(&mut self, scenario: &str) -> Result<(), SimError> {
        (**self).load(scenario)
    }

    fn reset(&mut self) -> Result<RawState, SimError> {
        (**self).reset()
    }

    fn advance(&mut self, control: Control) -> Result<RawState, SimError> {
        (**self).advance(control)
    }

    fn stop(&mut self) -> Result<(), SimError> {
        (**self).stop()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ---------------------------------------------------------------------------
// SimulatorFactory
// ---------------------------------------------------------------------------

/// Opens new simulator sessions. Held by the world manager and called on
/// every (re)acquisition attempt.
pub trait SimulatorFactory: Send {
    fn connect(&self) -> Result<Box<dyn Simulator>, SimError>;
}

impl<F> SimulatorFactory for F
where
    F: Fn() -> Result<Box<dyn Simulator>, SimError> + Send,
{
    fn connect(&self) -> Result<Box<dyn Simulator>, SimError> {
        self()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Still;

    impl Simulator for Still {
        fn load(&mut self, _scenario: &str) -> Result<(), SimError> {
            Ok(())
        }

        fn reset(&mut self) -> Result<RawState, SimError> {
            RawState::from_values(&[0.0; 8])
        }

        fn advance(&mut self, _control: Control) -> Result<RawState, SimError> {
            RawState::from_values(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.0])
        }

        fn stop(&mut self) -> Result<(), SimError> {
            Ok(())
        }

        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "Still"
        }
    }

    #[test]
    fn boxed_simulator_delegates() {
        let mut sim: Box<dyn Simulator> = Box::new(Still);
        assert_eq!(sim.name(), "Still");
        assert!((sim.reset().unwrap().s).abs() < f64::EPSILON);
        assert!((sim.advance(Control::ZERO).unwrap().s - 1.0).abs() < f64::EPSILON);
        sim.stop().unwrap();
    }

    #[test]
    fn closures_are_factories() {
        let factory = || -> Result<Box<dyn Simulator>, SimError> { Ok(Box::new(Still)) };
        let sim = factory.connect().unwrap();
        assert_eq!(sim.name(), "Still");
    }

    #[test]
    fn trait_objects_are_send() {
        fn assert_send<T: Send + ?Sized>() {}
        assert_send::<Box<dyn Simulator>>();
        assert_send::<Box<dyn SimulatorFactory>>();
    }
}
