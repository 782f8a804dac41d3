use crate::types::VehicleState;

// ---------------------------------------------------------------------------
// RewardFunction
// ---------------------------------------------------------------------------

/// Computes a scalar reward from the cached, unscaled vehicle state.
pub trait RewardFunction: Send + Sync + 'static {
    /// Compute the reward value.
    fn compute(&self, state: &VehicleState) -> f32;

    /// Human-readable name for this reward function.
    fn name(&self) -> &str;
}

impl<F> RewardFunction for F
where
    F: Fn(&VehicleState) -> f32 + Send + Sync + 'static,
{
    fn compute(&self, state: &VehicleState) -> f32 {
        self(state)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ClosureReward"
    }
}

// ---------------------------------------------------------------------------
// TerminationCondition
// ---------------------------------------------------------------------------

/// Determines whether an episode should terminate.
pub trait TerminationCondition: Send + Sync + 'static {
    /// Returns `true` if the episode should end.
    fn is_terminated(&self, state: &VehicleState) -> bool;

    /// Human-readable name for this termination condition.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// CompositeReward
// ---------------------------------------------------------------------------

/// A weighted combination of multiple reward functions.
///
/// The total reward is the sum of each component reward multiplied by its
/// weight. Use [`breakdown`](Self::breakdown) to inspect individual
/// contributions.
pub struct CompositeReward {
    rewards: Vec<(Box<dyn RewardFunction>, f32)>,
}

impl CompositeReward {
    /// Create an empty composite reward.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rewards: Vec::new(),
        }
    }

    /// Add a reward function with the given weight. Returns `self` for chaining.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, reward: Box<dyn RewardFunction>, weight: f32) -> Self {
        self.rewards.push((reward, weight));
        self
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Compute each component reward and return `(name, weighted_value)` pairs.
    pub fn breakdown(&self, state: &VehicleState) -> Vec<(&str, f32)> {
        self.rewards
            .iter()
            .map(|(reward, weight)| (reward.name(), reward.compute(state) * weight))
            .collect()
    }
}

impl Default for CompositeReward {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardFunction for CompositeReward {
    fn compute(&self, state: &VehicleState) -> f32 {
        self.rewards
            .iter()
            .map(|(reward, weight)| reward.compute(state) * weight)
            .sum()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CompositeReward"
    }
}

// ---------------------------------------------------------------------------
// CompositeTermination
// ---------------------------------------------------------------------------

/// OR-composition of multiple termination conditions.
///
/// Returns `true` if **any** contained condition is satisfied.
pub struct CompositeTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl CompositeTermination {
    /// Create an empty composite termination.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Add a termination condition. Returns `self` for chaining.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, condition: Box<dyn TerminationCondition>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Name of the first condition that fires, if any.
    pub fn first_triggered(&self, state: &VehicleState) -> Option<&str> {
        self.conditions
            .iter()
            .find(|condition| condition.is_terminated(state))
            .map(|condition| condition.name())
    }
}

impl Default for CompositeTermination {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationCondition for CompositeTermination {
    fn is_terminated(&self, state: &VehicleState) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.is_terminated(state))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CompositeTermination"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
