//! Mock reward functions and termination conditions.

use drift_core::traits::{RewardFunction, TerminationCondition};
use drift_core::types::VehicleState;

// ---------------------------------------------------------------------------
// ConstantReward
// ---------------------------------------------------------------------------

/// A reward function that always returns a fixed value.
pub struct ConstantReward {
    value: f32,
    label: &'static str,
}

impl ConstantReward {
    pub const fn new(value: f32) -> Self {
        Self {
            value,
            label: "ConstantReward",
        }
    }

    pub const fn with_label(value: f32, label: &'static str) -> Self {
        Self { value, label }
    }
}

impl RewardFunction for ConstantReward {
    fn compute(&self, _state: &VehicleState) -> f32 {
        self.value
    }

    fn name(&self) -> &str {
        self.label
    }
}

// ---------------------------------------------------------------------------
// AlwaysTerminate / NeverTerminate
// ---------------------------------------------------------------------------

pub struct AlwaysTerminate;

impl TerminationCondition for AlwaysTerminate {
    fn is_terminated(&self, _state: &VehicleState) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "AlwaysTerminate"
    }
}

pub struct NeverTerminate;

impl TerminationCondition for NeverTerminate {
    fn is_terminated(&self, _state: &VehicleState) -> bool {
        false
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "NeverTerminate"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
