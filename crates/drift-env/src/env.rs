//! Gymnasium-style control loop around a simulator session.
//!
//! [`DriftEnv`] owns the [`WorldManager`], the reward and termination
//! strategies and the [`Episode`] state machine. Each [`step`](DriftEnv::step)
//! validates the action, advances the simulator one tick, caches the unscaled
//! [`VehicleState`], normalizes it into an [`Observation`], scores it and
//! decides termination.

use std::collections::HashMap;

use drift_core::config::{ActionPolicy, DriftConfig, EnvConfig, TelemetryConfig};
use drift_core::error::{ConfigError, DriftError, SimError, ValidationError};
use drift_core::normalize::ObservationBounds;
use drift_core::traits::{CompositeTermination, RewardFunction, TerminationCondition};
use drift_core::types::{
    ACTION_DIM, Action, AngleUnit, BoxSpace, OBS_DIM, Observation, RenderMode, StepInfo,
    StepResult, VehicleState,
};
use drift_sim::adapter::SimulatorFactory;
use drift_sim::retry::RetryPolicy;
use drift_sim::world::WorldManager;

use crate::episode::{Episode, EpisodeCounters, EpisodeState};
use crate::telemetry::TelemetrySink;

/// `info.custom` key set to `1.0` when the action was clipped into range.
pub const ACTION_CLIPPED_KEY: &str = "action_clipped";

// ---------------------------------------------------------------------------
// DriftEnv
// ---------------------------------------------------------------------------

pub struct DriftEnv {
    world: WorldManager,
    reward: Box<dyn RewardFunction>,
    termination: Box<dyn TerminationCondition>,
    bounds: ObservationBounds,
    angle_unit: AngleUnit,
    action_policy: ActionPolicy,
    render_mode: RenderMode,
    episode: Episode,
    state: VehicleState,
    telemetry: TelemetrySink,
    training: bool,
    obs_space: BoxSpace,
    act_space: BoxSpace,
}

impl DriftEnv {
    pub fn builder() -> DriftEnvBuilder {
        DriftEnvBuilder::default()
    }

    /// Wire every section of `config` around sessions from `factory`.
    pub fn from_config(
        config: &DriftConfig,
        factory: Box<dyn SimulatorFactory>,
    ) -> Result<Self, DriftError> {
        config.validate()?;

        let mut world = WorldManager::new(factory, RetryPolicy::from(&config.retry));
        if let Some(scenario) = &config.simulator.scenario {
            world = world.with_scenario(scenario.to_string_lossy());
        }

        let lane = config.env.lane_half_width;
        let env = Self::builder()
            .config(config.env.clone())
            .telemetry(&config.telemetry)
            .world(world)
            .reward(config.reward.build(lane))
            .termination(config.termination.build(lane, config.reward.goal_s))
            .build()?;
        Ok(env)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub const fn observation_space(&self) -> &BoxSpace {
        &self.obs_space
    }

    pub const fn action_space(&self) -> &BoxSpace {
        &self.act_space
    }

    /// Unscaled state cached by the last reset or step.
    pub const fn state(&self) -> &VehicleState {
        &self.state
    }

    pub const fn counters(&self) -> EpisodeCounters {
        self.episode.counters()
    }

    pub const fn episode_state(&self) -> EpisodeState {
        self.episode.state()
    }

    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    pub const fn bounds(&self) -> &ObservationBounds {
        &self.bounds
    }

    pub const fn world(&self) -> &WorldManager {
        &self.world
    }

    pub const fn telemetry(&self) -> &TelemetrySink {
        &self.telemetry
    }

    pub const fn is_training(&self) -> bool {
        self.training
    }

    /// Toggle telemetry recording.
    pub const fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    pub fn reward_name(&self) -> &str {
        self.reward.name()
    }

    // -----------------------------------------------------------------------
    // Reset / step
    // -----------------------------------------------------------------------

    /// Stop and re-spawn the vehicle and start a new episode.
    ///
    /// Valid from any state. Never returns before the world manager reports
    /// a live vehicle.
    pub fn reset(&mut self) -> Result<Observation, DriftError> {
        let raw = match self.world.reset_player() {
            Ok(raw) => raw,
            Err(err) => {
                self.episode.abort();
                tracing::error!(error = %err, "reset failed");
                return Err(err.into());
            }
        };
        if !self.world.has_vehicle() {
            self.episode.abort();
            return Err(SimError::NoSession.into());
        }

        self.state = VehicleState::from_raw(&raw, self.angle_unit, Action::zeros());
        self.episode.reset();
        tracing::info!(
            episode = self.episode.episode_number(),
            global_tick = self.episode.counters().global_tick,
            "episode reset"
        );
        Ok(self.bounds.rescale(&self.state))
    }

    /// Advance one tick under `action`.
    ///
    /// Lifecycle and action errors leave the simulator and counters untouched.
    /// A simulator fault aborts the episode; call [`reset`](Self::reset).
    pub fn step(&mut self, action: &Action) -> Result<StepResult, DriftError> {
        self.episode.check_step()?;

        let mut action = *action;
        action.validate()?;
        let mut clipped = false;
        if let Some(dim) = action.out_of_bounds_dim() {
            match self.action_policy {
                ActionPolicy::Reject => {
                    return Err(ValidationError::ActionOutOfBounds { dim }.into());
                }
                ActionPolicy::Clip => {
                    tracing::warn!(
                        steer = action.steer(),
                        throttle = action.throttle(),
                        "action outside [-1, 1]; clipping"
                    );
                    clipped = action.clip_normalized();
                }
            }
        }

        let raw = match self.world.advance(action.to_control()) {
            Ok(raw) => raw,
            Err(err) => {
                self.episode.abort();
                tracing::error!(
                    error = %err,
                    episode = self.episode.episode_number(),
                    "simulator fault; episode aborted"
                );
                return Err(err.into());
            }
        };

        self.state = VehicleState::from_raw(&raw, self.angle_unit, action);
        let observation = self.bounds.rescale(&self.state);
        let reward = self.reward.compute(&self.state);
        let terminated = self.state.terminal || self.termination.is_terminated(&self.state);
        let outcome = self.episode.record_step(reward, terminated)?;
        let counters = self.episode.counters();

        if self.training {
            self.telemetry
                .record(counters.global_tick, reward, self.state.speed);
        }

        let mut custom = HashMap::new();
        if clipped {
            custom.insert(ACTION_CLIPPED_KEY.to_owned(), 1.0);
        }
        let info = StepInfo {
            episode_length: counters.iters,
            episode_reward: self.episode.total_reward(),
            episode_number: self.episode.episode_number(),
            global_tick: counters.global_tick,
            sim_time: self.state.t,
            custom,
        };

        tracing::debug!(
            iters = counters.iters,
            global_tick = counters.global_tick,
            reward,
            s = self.state.s,
            l = self.state.l,
            "step"
        );
        if outcome.done() {
            tracing::info!(
                episode = info.episode_number,
                steps = counters.iters,
                episode_reward = info.episode_reward,
                terminated = outcome.terminated,
                truncated = outcome.truncated,
                "episode finished"
            );
        }

        Ok(StepResult {
            observation,
            reward,
            terminated: outcome.terminated,
            truncated: outcome.truncated,
            info,
        })
    }

    // -----------------------------------------------------------------------
    // Render / close
    // -----------------------------------------------------------------------

    /// Render with the configured mode.
    pub fn render_default(&self) -> Option<String> {
        self.render(self.render_mode)
    }

    /// `Human` logs and returns a one-line summary of the cached state;
    /// `None` does nothing.
    pub fn render(&self, mode: RenderMode) -> Option<String> {
        match mode {
            RenderMode::None => None,
            RenderMode::Human => {
                let st = &self.state;
                let line = format!(
                    "ep {} iter {} t={:.2}s s={:.1}m l={:+.2}m v={:.1}m/s yaw={:+.3}rad r={:+.3}rad/s",
                    self.episode.episode_number(),
                    self.episode.counters().iters,
                    st.t,
                    st.s,
                    st.l,
                    st.speed,
                    st.yaw,
                    st.yaw_rate,
                );
                tracing::info!("{line}");
                Some(line)
            }
        }
    }

    /// Stop and release the simulator session.
    pub fn close(&mut self) {
        self.world.shutdown();
        self.episode.abort();
    }
}

impl std::fmt::Debug for DriftEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftEnv")
            .field("world", &self.world)
            .field("reward", &self.reward.name())
            .field("termination", &self.termination.name())
            .field("episode", &self.episode)
            .field("training", &self.training)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DriftEnvBuilder
// ---------------------------------------------------------------------------

/// Builder for [`DriftEnv`]. The world and the reward strategy are required.
#[derive(Default)]
pub struct DriftEnvBuilder {
    config: EnvConfig,
    telemetry: TelemetryConfig,
    world: Option<WorldManager>,
    reward: Option<Box<dyn RewardFunction>>,
    termination: Option<Box<dyn TerminationCondition>>,
}

impl DriftEnvBuilder {
    #[must_use]
    pub fn config(mut self, config: EnvConfig) -> Self {
        self.config = config;
        self
    }

    /// Telemetry window and initial training flag.
    #[must_use]
    pub fn telemetry(mut self, telemetry: &TelemetryConfig) -> Self {
        self.telemetry = telemetry.clone();
        self
    }

    #[must_use]
    pub fn world(mut self, world: WorldManager) -> Self {
        self.world = Some(world);
        self
    }

    #[must_use]
    pub fn reward(mut self, reward: impl RewardFunction) -> Self {
        self.reward = Some(Box::new(reward));
        self
    }

    #[must_use]
    pub fn reward_boxed(mut self, reward: Box<dyn RewardFunction>) -> Self {
        self.reward = Some(reward);
        self
    }

    /// Extra termination conditions, OR-ed with the simulator's terminal flag
    /// and the step budget.
    #[must_use]
    pub fn termination(mut self, termination: impl TerminationCondition) -> Self {
        self.termination = Some(Box::new(termination));
        self
    }

    pub fn build(self) -> Result<DriftEnv, ConfigError> {
        self.config.validate()?;
        self.telemetry.validate()?;
        let world = self
            .world
            .ok_or_else(|| ConfigError::MissingField("world".into()))?;
        let reward = self
            .reward
            .ok_or_else(|| ConfigError::MissingField("reward".into()))?;
        let termination = self
            .termination
            .unwrap_or_else(|| Box::new(CompositeTermination::new()));

        Ok(DriftEnv {
            world,
            reward,
            termination,
            bounds: self.config.bounds,
            angle_unit: self.config.angle_unit,
            action_policy: self.config.action_policy,
            render_mode: self.config.render_mode,
            episode: Episode::new(self.config.max_episode_iters),
            state: VehicleState::default(),
            telemetry: TelemetrySink::new(self.telemetry.window),
            training: self.telemetry.enabled,
            obs_space: BoxSpace::unit(OBS_DIM),
            act_space: BoxSpace::unit(ACTION_DIM),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use drift_core::error::EpisodeError;
    use drift_core::types::{Control, RawState};
    use drift_sim::adapter::Simulator;

    use super::*;

    /// Stationary vehicle at `s = 400`, terminal never set.
    struct Parked;

    impl Simulator for Parked {
        fn load(&mut self, _scenario: &str) -> Result<(), SimError> {
            Ok(())
        }

        fn reset(&mut self) -> Result<RawState, SimError> {
            RawState::from_values(&[400.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        }

        fn advance(&mut self, _control: Control) -> Result<RawState, SimError> {
            self.reset()
        }

        fn stop(&mut self) -> Result<(), SimError> {
            Ok(())
        }

        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "Parked"
        }
    }

    fn parked_world() -> WorldManager {
        let factory = || -> Result<Box<dyn Simulator>, SimError> { Ok(Box::new(Parked)) };
        WorldManager::new(Box::new(factory), RetryPolicy::immediate(1))
    }

    fn env(config: EnvConfig) -> DriftEnv {
        DriftEnv::builder()
            .config(config)
            .world(parked_world())
            .reward(|_: &VehicleState| 1.0_f32)
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_reward() {
        let err = DriftEnv::builder().world(parked_world()).build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "reward"));
    }

    #[test]
    fn build_requires_world() {
        let err = DriftEnv::builder()
            .reward(|_: &VehicleState| 0.0_f32)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "world"));
    }

    #[test]
    fn build_validates_bounds() {
        let mut config = EnvConfig::default();
        config.bounds.s.max = -1.0;
        let err = DriftEnv::builder()
            .config(config)
            .world(parked_world())
            .reward(|_: &VehicleState| 0.0_f32)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { dim: "s", .. }));
    }

    #[test]
    fn spaces_are_unit_boxes() {
        let env = env(EnvConfig::default());
        assert_eq!(env.observation_space().shape(), vec![6]);
        assert_eq!(env.action_space().shape(), vec![2]);
        assert!(env.action_space().contains(&[1.0, -1.0]));
        assert!(!env.action_space().contains(&[1.5, 0.0]));
    }

    #[test]
    fn reset_observation_midpoint_of_s() {
        let mut env = env(EnvConfig::default());
        let obs = env.reset().unwrap();
        assert!(obs[0].abs() < 1e-6);
        assert_eq!(env.counters().iters, 0);
        assert_eq!(env.episode_state(), EpisodeState::Ready);
    }

    #[test]
    fn step_before_reset_is_not_reset() {
        let mut env = env(EnvConfig::default());
        let err = env.step(&Action::zeros()).unwrap_err();
        assert!(matches!(err, DriftError::Episode(EpisodeError::NotReset)));
    }

    #[test]
    fn nan_action_rejected_without_tick() {
        let mut env = env(EnvConfig::default());
        env.reset().unwrap();
        let err = env.step(&Action::new(f32::NAN, 0.0)).unwrap_err();
        assert!(matches!(
            err,
            DriftError::Validation(ValidationError::ActionContainsNan)
        ));
        assert_eq!(env.counters().global_tick, 0);
    }

    #[test]
    fn render_modes() {
        let mut env = env(EnvConfig::default());
        env.reset().unwrap();
        assert!(env.render(RenderMode::None).is_none());
        assert!(env.render_default().is_none());
        let line = env.render(RenderMode::Human).unwrap();
        assert!(line.contains("s=400.0m"));
    }

    #[test]
    fn close_releases_session() {
        let mut env = env(EnvConfig::default());
        env.reset().unwrap();
        assert!(env.world().has_vehicle());
        env.close();
        assert!(!env.world().has_vehicle());
        assert_eq!(env.episode_state(), EpisodeState::Uninitialized);
    }

    #[test]
    fn env_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DriftEnv>();
    }
}
