use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::normalize::ObservationBounds;
use crate::rewards::{
    ActionPenaltyReward, COMPLETION_REWARD, CompletionReward, ForwardProgressReward,
    OUT_OF_LANE_PENALTY, OutOfLanePenalty,
};
use crate::terminations::{
    DEFAULT_MAX_SIM_TIME, GoalReachedTermination, OffRoadTermination, SimTimeTermination,
    SimulatorTermination,
};
use crate::traits::{CompositeReward, CompositeTermination};
use crate::types::{AngleUnit, RenderMode};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_max_episode_iters() -> u32 {
    1000
}
const fn default_initial_speed() -> f64 {
    60.0
}
const fn default_lane_half_width() -> f64 {
    6.0
}
fn default_address() -> String {
    "127.0.0.1:5150".into()
}
const fn default_connect_timeout_ms() -> u64 {
    2000
}
const fn default_round_trip_timeout_ms() -> u64 {
    5000
}
fn default_scenario() -> Option<PathBuf> {
    Some(PathBuf::from("Shanghai_center.mat"))
}
const fn default_max_attempts() -> u32 {
    5
}
const fn default_initial_backoff_ms() -> u64 {
    100
}
const fn default_backoff_multiplier() -> f64 {
    2.0
}
const fn default_max_backoff_ms() -> u64 {
    2000
}
const fn default_out_of_lane_penalty() -> f32 {
    OUT_OF_LANE_PENALTY
}
const fn default_completion_bonus() -> f32 {
    COMPLETION_REWARD
}
const fn default_goal_s() -> f64 {
    800.0
}
const fn default_true() -> bool {
    true
}
const fn default_max_sim_time() -> Option<f64> {
    Some(DEFAULT_MAX_SIM_TIME)
}
const fn default_window() -> usize {
    10
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_csv_file() -> String {
    "data.csv".into()
}

// ---------------------------------------------------------------------------
// ActionPolicy
// ---------------------------------------------------------------------------

/// What to do with finite action components outside `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPolicy {
    /// Clamp into range and flag it in the step info.
    #[default]
    Clip,
    /// Fail the step with a validation error.
    Reject,
}

// ---------------------------------------------------------------------------
// EnvConfig
// ---------------------------------------------------------------------------

/// Episode environment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Step budget per episode (default: 1000).
    #[serde(default = "default_max_episode_iters")]
    pub max_episode_iters: u32,

    /// Unit of simulator yaw and yaw rate.
    #[serde(default)]
    pub angle_unit: AngleUnit,

    #[serde(default)]
    pub action_policy: ActionPolicy,

    /// Nominal spawn speed of the scenario in m/s. Not sent to the simulator
    /// and has no effect on stepping; the loaded scenario owns the spawn state.
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,

    /// Lateral road tolerance in meters, used by lane-based rewards and
    /// off-road termination.
    #[serde(default = "default_lane_half_width")]
    pub lane_half_width: f64,

    #[serde(default)]
    pub render_mode: RenderMode,

    #[serde(default)]
    pub bounds: ObservationBounds,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            max_episode_iters: default_max_episode_iters(),
            angle_unit: AngleUnit::default(),
            action_policy: ActionPolicy::default(),
            initial_speed: default_initial_speed(),
            lane_half_width: default_lane_half_width(),
            render_mode: RenderMode::default(),
            bounds: ObservationBounds::default(),
        }
    }
}

impl EnvConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_episode_iters == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_episode_iters".into(),
                message: "must be > 0".into(),
            });
        }
        if self.lane_half_width.is_nan() || self.lane_half_width <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "lane_half_width".into(),
                message: format!("must be > 0, got {}", self.lane_half_width),
            });
        }
        self.bounds.validate()
    }

    /// Builder: set the step budget.
    #[must_use]
    pub const fn with_max_iters(mut self, iters: u32) -> Self {
        self.max_episode_iters = iters;
        self
    }

    /// Builder: set the out-of-range action policy.
    #[must_use]
    pub const fn with_action_policy(mut self, policy: ActionPolicy) -> Self {
        self.action_policy = policy;
        self
    }
}

// ---------------------------------------------------------------------------
// SimulatorConfig
// ---------------------------------------------------------------------------

/// Where and how to reach the external simulation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// `host:port` of the simulator bridge.
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Deadline for one request/response round-trip.
    #[serde(default = "default_round_trip_timeout_ms")]
    pub round_trip_timeout_ms: u64,

    /// Scenario file loaded into every new session.
    #[serde(default = "default_scenario")]
    pub scenario: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_timeout_ms: default_connect_timeout_ms(),
            round_trip_timeout_ms: default_round_trip_timeout_ms(),
            scenario: default_scenario(),
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::MissingField("simulator.address".into()));
        }
        if self.connect_timeout_ms == 0 || self.round_trip_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulator timeouts".into(),
                message: "must be > 0 ms".into(),
            });
        }
        Ok(())
    }

    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub const fn round_trip_timeout(&self) -> Duration {
        Duration::from_millis(self.round_trip_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

/// Bounded retry with exponential backoff for vehicle acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts".into(),
                message: "must be > 0".into(),
            });
        }
        if self.backoff_multiplier.is_nan() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.backoff_multiplier".into(),
                message: format!("must be >= 1, got {}", self.backoff_multiplier),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RewardConfig
// ---------------------------------------------------------------------------

/// Weights for the standard reward terms. A zero weight drops the term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_out_of_lane_penalty")]
    pub out_of_lane_penalty: f32,
    #[serde(default)]
    pub progress_scale: f32,
    #[serde(default = "default_completion_bonus")]
    pub completion_bonus: f32,
    /// Longitudinal position that counts as course completion.
    #[serde(default = "default_goal_s")]
    pub goal_s: f64,
    #[serde(default)]
    pub action_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            out_of_lane_penalty: default_out_of_lane_penalty(),
            progress_scale: 0.0,
            completion_bonus: default_completion_bonus(),
            goal_s: default_goal_s(),
            action_penalty: 0.0,
        }
    }
}

impl RewardConfig {
    /// Assemble the configured terms into one composite reward.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn build(&self, lane_half_width: f64) -> CompositeReward {
        let mut reward = CompositeReward::new();
        if self.out_of_lane_penalty != 0.0 {
            reward = reward.add(
                Box::new(OutOfLanePenalty::new(
                    lane_half_width,
                    self.out_of_lane_penalty,
                )),
                1.0,
            );
        }
        if self.progress_scale != 0.0 {
            reward = reward.add(Box::new(ForwardProgressReward::new(self.progress_scale)), 1.0);
        }
        if self.completion_bonus != 0.0 {
            reward = reward.add(
                Box::new(CompletionReward::new(
                    self.goal_s,
                    lane_half_width,
                    self.completion_bonus,
                )),
                1.0,
            );
        }
        if self.action_penalty != 0.0 {
            reward = reward.add(Box::new(ActionPenaltyReward::new(self.action_penalty)), 1.0);
        }
        reward
    }
}

// ---------------------------------------------------------------------------
// TerminationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationConfig {
    /// End the episode when the vehicle leaves the lane.
    #[serde(default = "default_true")]
    pub off_road: bool,
    /// End the episode once the vehicle passes `reward.goal_s`.
    #[serde(default = "default_true")]
    pub goal_reached: bool,
    /// End the episode at this simulated time, in seconds.
    #[serde(default = "default_max_sim_time")]
    pub max_sim_time: Option<f64>,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            off_road: true,
            goal_reached: true,
            max_sim_time: default_max_sim_time(),
        }
    }
}

impl TerminationConfig {
    /// The simulator's own terminal flag is always part of the composite.
    #[must_use]
    pub fn build(&self, lane_half_width: f64, goal_s: f64) -> CompositeTermination {
        let mut term = CompositeTermination::new().add(Box::new(SimulatorTermination));
        if self.off_road {
            term = term.add(Box::new(OffRoadTermination::new(lane_half_width)));
        }
        if self.goal_reached {
            term = term.add(Box::new(GoalReachedTermination::new(goal_s)));
        }
        if let Some(max_time) = self.max_sim_time {
            term = term.add(Box::new(SimTimeTermination::new(max_time)));
        }
        term
    }
}

// ---------------------------------------------------------------------------
// TelemetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Record samples while stepping.
    #[serde(default)]
    pub enabled: bool,
    /// Samples averaged into one telemetry point.
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_csv_file")]
    pub csv_file: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window: default_window(),
            output_dir: default_output_dir(),
            csv_file: default_csv_file(),
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telemetry.window".into(),
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file)
    }
}

// ---------------------------------------------------------------------------
// DriftConfig
// ---------------------------------------------------------------------------

/// Complete configuration, usually loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub termination: TerminationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl DriftConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.env.validate()?;
        self.simulator.validate()?;
        self.retry.validate()?;
        self.telemetry.validate()
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
