//! In-process scripted simulator and factory.
//!
//! [`ScriptedSimulator`] integrates a trivial kinematic model so tests can
//! assert on positions, and records every call into a shared [`CallLog`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use drift_core::error::SimError;
use drift_core::types::{Control, RawState};
use drift_sim::adapter::{Simulator, SimulatorFactory};

/// Simulator tick length used by the scripted model, in seconds.
pub const SCRIPTED_DT: f64 = 0.05;

/// Deadline reported by [`ScriptedFault::Timeout`].
pub const SCRIPTED_TIMEOUT: Duration = Duration::from_millis(5000);

/// Build a raw state from position and longitudinal speed.
pub const fn raw_state(s: f64, l: f64, vx: f64) -> RawState {
    RawState {
        s,
        l,
        vx,
        vy: 0.0,
        yaw: 0.0,
        yaw_rate: 0.0,
        t: 0.0,
        terminal: false,
    }
}

// ---------------------------------------------------------------------------
// CallLog
// ---------------------------------------------------------------------------

/// One recorded simulator call.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    Load(String),
    Reset,
    Advance(Control),
    Stop,
}

/// Calls shared by a simulator, its clones and the factory that made them.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<SimCall>>>);

impl CallLog {
    fn push(&self, call: SimCall) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<SimCall> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&SimCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn advances(&self) -> usize {
        self.count(|c| matches!(c, SimCall::Advance(_)))
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.0.lock() {
            calls.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedSimulator
// ---------------------------------------------------------------------------

/// Error raised by a scripted fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFault {
    /// The bridge went away.
    Unavailable,
    /// The bridge stopped answering within the round-trip deadline.
    Timeout,
}

impl ScriptedFault {
    fn error(self, tick: u64) -> SimError {
        match self {
            Self::Unavailable => {
                SimError::Unavailable(format!("scripted fault at tick {tick}"))
            }
            Self::Timeout => SimError::Timeout {
                op: "advance",
                after: SCRIPTED_TIMEOUT,
            },
        }
    }
}

/// Deterministic fake simulator.
///
/// Per tick: `s += vx * dt`, `l += lateral_gain * steer * dt`,
/// `yaw_rate = steer`, `yaw += yaw_rate * dt`, `t += dt`. Throttle and brake
/// are recorded but do not change speed.
#[derive(Debug, Clone)]
pub struct ScriptedSimulator {
    log: CallLog,
    initial: RawState,
    state: RawState,
    ticks: u64,
    lateral_gain: f64,
    terminal_after: Option<u64>,
    fault_at: Option<(u64, ScriptedFault)>,
}

impl Default for ScriptedSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSimulator {
    /// Vehicle at the origin moving at 20 m/s.
    pub fn new() -> Self {
        let initial = raw_state(0.0, 0.0, 20.0);
        Self {
            log: CallLog::default(),
            initial,
            state: initial,
            ticks: 0,
            lateral_gain: 1.0,
            terminal_after: None,
            fault_at: None,
        }
    }

    /// Builder: state reported by `reset`.
    #[must_use]
    pub const fn with_initial(mut self, initial: RawState) -> Self {
        self.initial = initial;
        self.state = initial;
        self
    }

    /// Builder: raise the terminal flag from the `n`-th advance after reset.
    #[must_use]
    pub const fn with_terminal_after(mut self, n: u64) -> Self {
        self.terminal_after = Some(n);
        self
    }

    /// Builder: fail the `n`-th advance after each reset.
    #[must_use]
    pub const fn with_fault_at(self, n: u64) -> Self {
        self.with_fault(n, ScriptedFault::Unavailable)
    }

    /// Builder: fail the `n`-th advance after each reset with `fault`.
    #[must_use]
    pub const fn with_fault(mut self, n: u64, fault: ScriptedFault) -> Self {
        self.fault_at = Some((n, fault));
        self
    }

    #[must_use]
    pub const fn with_lateral_gain(mut self, gain: f64) -> Self {
        self.lateral_gain = gain;
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Simulator for ScriptedSimulator {
    fn load(&mut self, scenario: &str) -> Result<(), SimError> {
        self.log.push(SimCall::Load(scenario.to_owned()));
        Ok(())
    }

    fn reset(&mut self) -> Result<RawState, SimError> {
        self.log.push(SimCall::Reset);
        self.ticks = 0;
        self.state = self.initial;
        Ok(self.state)
    }

    fn advance(&mut self, control: Control) -> Result<RawState, SimError> {
        self.log.push(SimCall::Advance(control));
        self.ticks += 1;
        if let Some((tick, fault)) = self.fault_at.filter(|(tick, _)| *tick == self.ticks) {
            return Err(fault.error(tick));
        }

        let st = &mut self.state;
        st.s += st.vx * SCRIPTED_DT;
        st.l += self.lateral_gain * control.steer * SCRIPTED_DT;
        st.yaw_rate = control.steer;
        st.yaw += st.yaw_rate * SCRIPTED_DT;
        st.t += SCRIPTED_DT;
        st.terminal = self.terminal_after.is_some_and(|n| self.ticks >= n);
        Ok(*st)
    }

    fn stop(&mut self) -> Result<(), SimError> {
        self.log.push(SimCall::Stop);
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ScriptedSimulator"
    }
}

// ---------------------------------------------------------------------------
// ScriptedFactory
// ---------------------------------------------------------------------------

/// Hands out clones of a template [`ScriptedSimulator`], optionally failing
/// the first few connects.
#[derive(Debug, Clone)]
pub struct ScriptedFactory {
    template: ScriptedSimulator,
    failed_connects: u32,
    connects: Arc<AtomicU32>,
}

impl ScriptedFactory {
    pub fn new(template: ScriptedSimulator) -> Self {
        Self {
            template,
            failed_connects: 0,
            connects: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Builder: refuse the first `n` connects with `SimError::Unavailable`.
    #[must_use]
    pub const fn with_failed_connects(mut self, n: u32) -> Self {
        self.failed_connects = n;
        self
    }

    /// Connect attempts so far, including refused ones. Shared across clones.
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn call_log(&self) -> CallLog {
        self.template.call_log()
    }
}

impl SimulatorFactory for ScriptedFactory {
    fn connect(&self) -> Result<Box<dyn Simulator>, SimError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failed_connects {
            return Err(SimError::Unavailable(format!(
                "scripted refusal {} of {}",
                attempt + 1,
                self.failed_connects
            )));
        }
        Ok(Box::new(self.template.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_integrates_position_and_time() {
        let mut sim = ScriptedSimulator::new();
        sim.reset().unwrap();
        let raw = sim
            .advance(Control {
                steer: 1.0,
                throttle: 0.0,
                brake: 0.0,
            })
            .unwrap();
        assert!((raw.s - 20.0 * SCRIPTED_DT).abs() < 1e-12);
        assert!((raw.l - SCRIPTED_DT).abs() < 1e-12);
        assert!((raw.t - SCRIPTED_DT).abs() < 1e-12);
        assert!(!raw.terminal);
    }

    #[test]
    fn terminal_after_n_ticks() {
        let mut sim = ScriptedSimulator::new().with_terminal_after(3);
        sim.reset().unwrap();
        assert!(!sim.advance(Control::ZERO).unwrap().terminal);
        assert!(!sim.advance(Control::ZERO).unwrap().terminal);
        assert!(sim.advance(Control::ZERO).unwrap().terminal);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut sim = ScriptedSimulator::new().with_initial(raw_state(100.0, 1.0, 30.0));
        sim.reset().unwrap();
        sim.advance(Control::ZERO).unwrap();
        let raw = sim.reset().unwrap();
        assert!((raw.s - 100.0).abs() < f64::EPSILON);
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn fault_fires_at_configured_tick() {
        let mut sim = ScriptedSimulator::new().with_fault_at(2);
        sim.reset().unwrap();
        assert!(sim.advance(Control::ZERO).is_ok());
        assert!(matches!(
            sim.advance(Control::ZERO),
            Err(SimError::Unavailable(_))
        ));
    }

    #[test]
    fn timeout_fault_reports_deadline() {
        let mut sim = ScriptedSimulator::new().with_fault(1, ScriptedFault::Timeout);
        sim.reset().unwrap();
        let err = sim.advance(Control::ZERO).unwrap_err();
        assert!(matches!(
            err,
            SimError::Timeout { op: "advance", after } if after == SCRIPTED_TIMEOUT
        ));
    }

    #[test]
    fn call_log_is_shared_with_clones() {
        let sim = ScriptedSimulator::new();
        let log = sim.call_log();
        let mut clone = sim.clone();
        clone.load("track.mat").unwrap();
        clone.stop().unwrap();
        assert_eq!(
            log.calls(),
            vec![SimCall::Load("track.mat".into()), SimCall::Stop]
        );
        log.clear();
        assert!(log.calls().is_empty());
    }

    #[test]
    fn factory_refuses_then_connects() {
        let factory = ScriptedFactory::new(ScriptedSimulator::new()).with_failed_connects(2);
        assert!(factory.connect().is_err());
        assert!(factory.connect().is_err());
        let sim = factory.connect().unwrap();
        assert_eq!(sim.name(), "ScriptedSimulator");
        assert_eq!(factory.connects(), 3);
    }
}
