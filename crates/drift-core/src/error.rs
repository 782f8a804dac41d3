use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the drift control loop.
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Episode error: {0}")]
    Episode(#[from] EpisodeError),
}

impl DriftError {
    /// Whether the failure came from the simulator session rather than from
    /// caller input. Session faults abort the running episode.
    #[must_use]
    pub const fn is_session_fault(&self) -> bool {
        matches!(self, Self::Simulation(_))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid bounds for {dim}: max ({max}) must be greater than min ({min})")]
    InvalidBounds { dim: &'static str, min: f64, max: f64 },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Simulator session and world-management errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Simulator unavailable: {0}")]
    Unavailable(String),

    #[error("Simulator did not answer {op} within {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("No vehicle acquired after {attempts} attempts")]
    VehicleAcquisitionTimeout { attempts: u32 },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Simulator reported an error: {0}")]
    Remote(String),

    #[error("No live simulator session")]
    NoSession,

    #[error("Malformed simulator state: {0}")]
    MalformedState(String),
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in the step path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    ActionDimMismatch { expected: usize, got: usize },

    #[error("Action contains NaN")]
    ActionContainsNan,

    #[error("Action contains Inf")]
    ActionContainsInf,

    #[error("Action out of bounds at dimension {dim}")]
    ActionOutOfBounds { dim: usize },
}

/// Misuse of the episode lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EpisodeError {
    #[error("step() called before reset()")]
    NotReset,

    #[error("step() called on a finished episode; call reset()")]
    EpisodeFinished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_error_from_config_error() {
        let err = ConfigError::MissingField("reward".into());
        let drift_err: DriftError = err.into();
        assert!(matches!(drift_err, DriftError::Config(_)));
        assert!(drift_err.to_string().contains("reward"));
        assert!(!drift_err.is_session_fault());
    }

    #[test]
    fn drift_error_from_sim_error() {
        let err = SimError::Unavailable("connection refused".into());
        let drift_err: DriftError = err.into();
        assert!(matches!(drift_err, DriftError::Simulation(_)));
        assert!(drift_err.is_session_fault());
    }

    #[test]
    fn drift_error_from_validation_error() {
        let err = ValidationError::ActionContainsNan;
        let drift_err: DriftError = err.into();
        assert!(matches!(drift_err, DriftError::Validation(_)));
    }

    #[test]
    fn drift_error_from_episode_error() {
        let drift_err: DriftError = EpisodeError::NotReset.into();
        assert!(matches!(drift_err, DriftError::Episode(EpisodeError::NotReset)));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn validation_error_display_messages() {
        assert_eq!(
            ValidationError::ActionDimMismatch {
                expected: 2,
                got: 3
            }
            .to_string(),
            "Action dimension mismatch: expected 2, got 3"
        );
        assert_eq!(
            ValidationError::ActionOutOfBounds { dim: 0 }.to_string(),
            "Action out of bounds at dimension 0"
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::InvalidBounds {
                dim: "s",
                min: 800.0,
                max: 0.0
            }
            .to_string(),
            "Invalid bounds for s: max (0) must be greater than min (800)"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                field: "max_episode_iters".into(),
                message: "must be > 0".into()
            }
            .to_string(),
            "Invalid value for max_episode_iters: must be > 0"
        );
    }

    #[test]
    fn sim_error_display_messages() {
        assert_eq!(
            SimError::VehicleAcquisitionTimeout { attempts: 5 }.to_string(),
            "No vehicle acquired after 5 attempts"
        );
        assert_eq!(
            SimError::Timeout {
                op: "advance",
                after: Duration::from_millis(250)
            }
            .to_string(),
            "Simulator did not answer advance within 250ms"
        );
        assert_eq!(SimError::NoSession.to_string(), "No live simulator session");
    }

    #[test]
    fn copy_errors_are_copy() {
        let err = EpisodeError::EpisodeFinished;
        let err2 = err;
        assert_eq!(err, err2);
    }
}
