// drift-core: Types, spaces, errors, config, normalization, rewards and terminations
// for the drift vehicle-control loop.

pub mod config;
pub mod error;
pub mod normalize;
pub mod rewards;
pub mod terminations;
pub mod traits;
pub mod types;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        config::{
            ActionPolicy, DriftConfig, EnvConfig, RetryConfig, RewardConfig, SimulatorConfig,
            TelemetryConfig, TerminationConfig,
        },
        error::{ConfigError, DriftError, EpisodeError, SimError, ValidationError},
        normalize::{Bounds, ObservationBounds},
        traits::{CompositeReward, CompositeTermination, RewardFunction, TerminationCondition},
        types::{
            ACTION_DIM, Action, AngleUnit, BoxSpace, Control, OBS_DIM, Observation, RawState,
            RenderMode, StepInfo, StepResult, VehicleState,
        },
    };
}
