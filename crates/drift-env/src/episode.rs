//! Episode state machine and counters.
//!
//! ```text
//! Uninitialized --reset--> Ready --step--> Stepping --step--> Terminated | Truncated
//!       ^                    ^                                        |
//!       |                    +------------------reset-----------------+
//!       +------------- session fault (abort) from any state
//! ```

use drift_core::error::EpisodeError;

// ---------------------------------------------------------------------------
// EpisodeState
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// Before the first reset, or after an aborted episode.
    #[default]
    Uninitialized,
    /// Reset done, no step taken yet.
    Ready,
    /// At least one step taken, episode still live.
    Stepping,
    /// Ended by a termination condition.
    Terminated,
    /// Ended by the step budget.
    Truncated,
}

impl EpisodeState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::Truncated)
    }

    /// Whether `step()` is allowed.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Ready | Self::Stepping)
    }
}

// ---------------------------------------------------------------------------
// EpisodeCounters
// ---------------------------------------------------------------------------

/// `iters` restarts at every reset; `global_tick` never decreases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpisodeCounters {
    pub iters: u32,
    pub global_tick: u64,
}

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// How a recorded step left the episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub terminated: bool,
    pub truncated: bool,
}

impl StepOutcome {
    pub const fn done(self) -> bool {
        self.terminated || self.truncated
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Episode {
    state: EpisodeState,
    max_iters: u32,
    iters: u32,
    global_tick: u64,
    total_reward: f32,
    episode_number: u32,
}

impl Episode {
    /// `max_iters` is clamped to at least 1.
    #[must_use]
    pub fn new(max_iters: u32) -> Self {
        Self {
            state: EpisodeState::Uninitialized,
            max_iters: max_iters.max(1),
            iters: 0,
            global_tick: 0,
            total_reward: 0.0,
            episode_number: 0,
        }
    }

    pub const fn state(&self) -> EpisodeState {
        self.state
    }

    pub const fn max_iters(&self) -> u32 {
        self.max_iters
    }

    pub const fn counters(&self) -> EpisodeCounters {
        EpisodeCounters {
            iters: self.iters,
            global_tick: self.global_tick,
        }
    }

    pub const fn total_reward(&self) -> f32 {
        self.total_reward
    }

    /// Episodes started since construction.
    pub const fn episode_number(&self) -> u32 {
        self.episode_number
    }

    /// Start a new episode. Valid from any state.
    pub const fn reset(&mut self) {
        self.state = EpisodeState::Ready;
        self.iters = 0;
        self.total_reward = 0.0;
        self.episode_number += 1;
    }

    /// Check that a step may be taken now.
    pub const fn check_step(&self) -> Result<(), EpisodeError> {
        match self.state {
            EpisodeState::Uninitialized => Err(EpisodeError::NotReset),
            EpisodeState::Terminated | EpisodeState::Truncated => {
                Err(EpisodeError::EpisodeFinished)
            }
            EpisodeState::Ready | EpisodeState::Stepping => Ok(()),
        }
    }

    /// Count one completed tick and move to the resulting state.
    ///
    /// Truncation fires when `iters` reaches the budget and the step was not
    /// already terminated.
    pub fn record_step(&mut self, reward: f32, terminated: bool) -> Result<StepOutcome, EpisodeError> {
        self.check_step()?;

        self.iters += 1;
        self.global_tick += 1;
        self.total_reward += reward;

        let truncated = !terminated && self.iters >= self.max_iters;
        self.state = if terminated {
            EpisodeState::Terminated
        } else if truncated {
            EpisodeState::Truncated
        } else {
            EpisodeState::Stepping
        };
        Ok(StepOutcome {
            terminated,
            truncated,
        })
    }

    /// Abandon the current episode after a session fault. Counters are kept;
    /// the next `step()` requires a reset.
    pub const fn abort(&mut self) {
        self.state = EpisodeState::Uninitialized;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- EpisodeState --

    #[test]
    fn state_default_is_uninitialized() {
        assert_eq!(EpisodeState::default(), EpisodeState::Uninitialized);
    }

    #[test]
    fn state_predicates() {
        assert!(!EpisodeState::Uninitialized.is_live());
        assert!(EpisodeState::Ready.is_live());
        assert!(EpisodeState::Stepping.is_live());
        assert!(EpisodeState::Terminated.is_terminal());
        assert!(EpisodeState::Truncated.is_terminal());
        assert!(!EpisodeState::Stepping.is_terminal());
    }

    // -- Episode --

    #[test]
    fn step_before_reset_is_rejected() {
        let mut ep = Episode::new(10);
        assert_eq!(ep.check_step(), Err(EpisodeError::NotReset));
        assert_eq!(ep.record_step(1.0, false), Err(EpisodeError::NotReset));
        assert_eq!(ep.counters(), EpisodeCounters::default());
    }

    #[test]
    fn reset_zeroes_iters_and_bumps_episode_number() {
        let mut ep = Episode::new(10);
        ep.reset();
        ep.record_step(1.0, false).unwrap();
        ep.record_step(1.0, false).unwrap();
        ep.reset();
        assert_eq!(ep.state(), EpisodeState::Ready);
        assert_eq!(ep.counters().iters, 0);
        assert_eq!(ep.counters().global_tick, 2);
        assert_eq!(ep.episode_number(), 2);
        assert!(ep.total_reward().abs() < f32::EPSILON);
    }

    #[test]
    fn record_step_accumulates() {
        let mut ep = Episode::new(10);
        ep.reset();
        let out = ep.record_step(1.5, false).unwrap();
        assert!(!out.done());
        ep.record_step(2.5, false).unwrap();
        assert_eq!(ep.state(), EpisodeState::Stepping);
        assert_eq!(ep.counters().iters, 2);
        assert!((ep.total_reward() - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn budget_truncates_on_last_step() {
        let mut ep = Episode::new(3);
        ep.reset();
        assert!(!ep.record_step(0.0, false).unwrap().done());
        assert!(!ep.record_step(0.0, false).unwrap().done());
        let out = ep.record_step(0.0, false).unwrap();
        assert!(out.truncated);
        assert!(!out.terminated);
        assert_eq!(ep.state(), EpisodeState::Truncated);
    }

    #[test]
    fn termination_wins_over_budget() {
        let mut ep = Episode::new(1);
        ep.reset();
        let out = ep.record_step(0.0, true).unwrap();
        assert!(out.terminated);
        assert!(!out.truncated);
        assert_eq!(ep.state(), EpisodeState::Terminated);
    }

    #[test]
    fn finished_episode_rejects_step() {
        let mut ep = Episode::new(1);
        ep.reset();
        ep.record_step(0.0, false).unwrap();
        assert_eq!(ep.record_step(0.0, false), Err(EpisodeError::EpisodeFinished));
        assert_eq!(ep.counters().global_tick, 1);
    }

    #[test]
    fn global_tick_survives_resets() {
        let mut ep = Episode::new(100);
        let mut last = 0;
        for _ in 0..3 {
            ep.reset();
            for _ in 0..5 {
                ep.record_step(0.0, false).unwrap();
                let tick = ep.counters().global_tick;
                assert_eq!(tick, last + 1);
                last = tick;
            }
        }
        assert_eq!(last, 15);
    }

    #[test]
    fn abort_requires_reset() {
        let mut ep = Episode::new(10);
        ep.reset();
        ep.record_step(0.0, false).unwrap();
        ep.abort();
        assert_eq!(ep.state(), EpisodeState::Uninitialized);
        assert_eq!(ep.check_step(), Err(EpisodeError::NotReset));
        assert_eq!(ep.counters().global_tick, 1);
    }

    #[test]
    fn zero_budget_is_clamped() {
        assert_eq!(Episode::new(0).max_iters(), 1);
    }
}
