//! Standard reward shaping terms for lane-keeping and drifting tasks.
//!
//! Each term reads the cached [`VehicleState`]. Combine them with
//! [`CompositeReward`](crate::traits::CompositeReward), or build one from
//! [`RewardConfig`](crate::config::RewardConfig).

use crate::traits::RewardFunction;
use crate::types::VehicleState;

/// Bonus for reaching the end of the course.
pub const COMPLETION_REWARD: f32 = 5000.0;
/// Penalty for leaving the lane.
pub const OUT_OF_LANE_PENALTY: f32 = -500.0;
/// Reward for every other step.
pub const NEUTRAL_REWARD: f32 = 0.0;

// ---------------------------------------------------------------------------
// OutOfLanePenalty
// ---------------------------------------------------------------------------

/// Fixed penalty whenever the lateral offset exceeds the lane half-width.
pub struct OutOfLanePenalty {
    lane_half_width: f64,
    penalty: f32,
}

impl OutOfLanePenalty {
    #[must_use]
    pub const fn new(lane_half_width: f64, penalty: f32) -> Self {
        Self {
            lane_half_width,
            penalty,
        }
    }
}

impl RewardFunction for OutOfLanePenalty {
    fn compute(&self, state: &VehicleState) -> f32 {
        if state.l.abs() > self.lane_half_width {
            self.penalty
        } else {
            NEUTRAL_REWARD
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "OutOfLanePenalty"
    }
}

// ---------------------------------------------------------------------------
// ForwardProgressReward
// ---------------------------------------------------------------------------

/// Dense reward proportional to longitudinal speed along the road.
///
/// Returns `scale * vx`; reversing is penalized.
pub struct ForwardProgressReward {
    scale: f32,
}

impl ForwardProgressReward {
    #[must_use]
    pub const fn new(scale: f32) -> Self {
        Self { scale }
    }
}

impl RewardFunction for ForwardProgressReward {
    #[allow(clippy::cast_possible_truncation)]
    fn compute(&self, state: &VehicleState) -> f32 {
        self.scale * state.vx as f32
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ForwardProgressReward"
    }
}

// ---------------------------------------------------------------------------
// CompletionReward
// ---------------------------------------------------------------------------

/// Bonus while the vehicle is at or past `goal_s` and still inside the lane.
///
/// Pays on every such step; pair with
/// [`GoalReachedTermination`](crate::terminations::GoalReachedTermination) so
/// the episode ends on the first one.
pub struct CompletionReward {
    goal_s: f64,
    lane_half_width: f64,
    bonus: f32,
}

impl CompletionReward {
    #[must_use]
    pub const fn new(goal_s: f64, lane_half_width: f64, bonus: f32) -> Self {
        Self {
            goal_s,
            lane_half_width,
            bonus,
        }
    }
}

impl RewardFunction for CompletionReward {
    fn compute(&self, state: &VehicleState) -> f32 {
        if state.s >= self.goal_s && state.l.abs() <= self.lane_half_width {
            self.bonus
        } else {
            NEUTRAL_REWARD
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CompletionReward"
    }
}

// ---------------------------------------------------------------------------
// ActionPenaltyReward
// ---------------------------------------------------------------------------

/// Penalty proportional to the squared L2 norm of the last action.
///
/// Returns `-scale * ||action||^2`, encouraging minimal control effort.
pub struct ActionPenaltyReward {
    scale: f32,
}

impl ActionPenaltyReward {
    /// Create with a penalty scale factor.
    #[must_use]
    pub const fn new(scale: f32) -> Self {
        Self { scale }
    }
}

impl RewardFunction for ActionPenaltyReward {
    fn compute(&self, state: &VehicleState) -> f32 {
        let norm_sq: f32 = state.last_action.as_slice().iter().map(|v| v * v).sum();
        -self.scale * norm_sq
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ActionPenaltyReward"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn at(s: f64, l: f64, vx: f64) -> VehicleState {
        VehicleState {
            s,
            l,
            vx,
            ..VehicleState::default()
        }
    }

    // -- OutOfLanePenalty --

    #[test]
    fn out_of_lane_penalizes_beyond_half_width() {
        let reward = OutOfLanePenalty::new(3.0, OUT_OF_LANE_PENALTY);
        assert!((reward.compute(&at(0.0, 3.5, 0.0)) + 500.0).abs() < f32::EPSILON);
        assert!((reward.compute(&at(0.0, -3.5, 0.0)) + 500.0).abs() < f32::EPSILON);
    }

    #[test]
    fn in_lane_is_neutral() {
        let reward = OutOfLanePenalty::new(3.0, OUT_OF_LANE_PENALTY);
        assert!(reward.compute(&at(0.0, 3.0, 0.0)).abs() < f32::EPSILON);
        assert_eq!(reward.name(), "OutOfLanePenalty");
    }

    // -- ForwardProgressReward --

    #[test]
    fn progress_scales_with_vx() {
        let reward = ForwardProgressReward::new(0.1);
        assert!((reward.compute(&at(0.0, 0.0, 60.0)) - 6.0).abs() < 1e-5);
        assert!(reward.compute(&at(0.0, 0.0, -5.0)) < 0.0);
    }

    // -- CompletionReward --

    #[test]
    fn completion_fires_past_goal_in_lane() {
        let reward = CompletionReward::new(800.0, 3.0, COMPLETION_REWARD);
        assert!((reward.compute(&at(800.0, 0.0, 0.0)) - 5000.0).abs() < f32::EPSILON);
        assert!(reward.compute(&at(799.0, 0.0, 0.0)).abs() < f32::EPSILON);
        assert!(reward.compute(&at(900.0, 4.0, 0.0)).abs() < f32::EPSILON);
    }

    // -- ActionPenaltyReward --

    #[test]
    fn action_penalty_computes_negative_norm() {
        let state = VehicleState {
            last_action: Action::new(0.6, 0.8), // norm^2 = 1
            ..VehicleState::default()
        };
        let reward = ActionPenaltyReward::new(0.5);
        assert!((reward.compute(&state) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn action_penalty_zero_action() {
        let reward = ActionPenaltyReward::new(1.0);
        assert!(reward.compute(&VehicleState::default()).abs() < f32::EPSILON);
        assert_eq!(reward.name(), "ActionPenaltyReward");
    }
}
