//! Standard termination conditions.
//!
//! The step budget is enforced by the environment itself and is reported as
//! truncation; these conditions report task-level termination.

use crate::traits::TerminationCondition;
use crate::types::VehicleState;

/// Default simulated-time limit in seconds.
pub const DEFAULT_MAX_SIM_TIME: f64 = 130.0;

// ---------------------------------------------------------------------------
// SimulatorTermination
// ---------------------------------------------------------------------------

/// Terminates when the simulator reports the end of its run.
pub struct SimulatorTermination;

impl TerminationCondition for SimulatorTermination {
    fn is_terminated(&self, state: &VehicleState) -> bool {
        state.terminal
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "SimulatorTermination"
    }
}

// ---------------------------------------------------------------------------
// OffRoadTermination
// ---------------------------------------------------------------------------

/// Terminates when the lateral offset leaves `[-limit, limit]`.
pub struct OffRoadTermination {
    limit: f64,
}

impl OffRoadTermination {
    #[must_use]
    pub const fn new(limit: f64) -> Self {
        Self { limit }
    }
}

impl TerminationCondition for OffRoadTermination {
    fn is_terminated(&self, state: &VehicleState) -> bool {
        state.l.abs() > self.limit
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "OffRoadTermination"
    }
}

// ---------------------------------------------------------------------------
// GoalReachedTermination
// ---------------------------------------------------------------------------

/// Terminates once the vehicle reaches `goal_s` along the road.
///
/// Pairs with [`CompletionReward`](crate::rewards::CompletionReward) so the
/// completion bonus is paid on the final step only.
pub struct GoalReachedTermination {
    goal_s: f64,
}

impl GoalReachedTermination {
    #[must_use]
    pub const fn new(goal_s: f64) -> Self {
        Self { goal_s }
    }
}

impl TerminationCondition for GoalReachedTermination {
    fn is_terminated(&self, state: &VehicleState) -> bool {
        state.s >= self.goal_s
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "GoalReachedTermination"
    }
}

// ---------------------------------------------------------------------------
// SimTimeTermination
// ---------------------------------------------------------------------------

/// Terminates once simulated time reaches `max_time` seconds.
pub struct SimTimeTermination {
    max_time: f64,
}

impl SimTimeTermination {
    #[must_use]
    pub const fn new(max_time: f64) -> Self {
        Self { max_time }
    }
}

impl TerminationCondition for SimTimeTermination {
    fn is_terminated(&self, state: &VehicleState) -> bool {
        state.t >= self.max_time
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "SimTimeTermination"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
