use std::collections::HashMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, ValidationError};

/// Number of normalized observation components.
pub const OBS_DIM: usize = 6;
/// Number of agent action components (steer, throttle).
pub const ACTION_DIM: usize = 2;
/// Number of values in one simulator state tuple.
pub const RAW_STATE_LEN: usize = 8;
/// Number of values in one simulator control tuple (steer, throttle, brake).
pub const CONTROL_LEN: usize = 3;

// ---------------------------------------------------------------------------
// RawState
// ---------------------------------------------------------------------------

/// Unnormalized vehicle state exactly as the simulator reports it.
///
/// Positions in meters, velocities in m/s, time in seconds. Angles are in
/// whatever unit the simulator is configured for (see [`AngleUnit`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    /// Longitudinal position along the road.
    pub s: f64,
    /// Lateral offset from the road center line.
    pub l: f64,
    pub vx: f64,
    pub vy: f64,
    pub yaw: f64,
    pub yaw_rate: f64,
    /// Simulation time.
    pub t: f64,
    /// Simulator-side end of run.
    pub terminal: bool,
}

impl RawState {
    /// Decode the simulator's 8-tuple `(s, l, vx, vy, yaw, yaw_rate, t, terminal)`.
    ///
    /// The terminal flag travels as `0`/`1`; any non-zero value counts as set.
    /// Non-finite values are rejected so a diverged solver never reaches the
    /// observation path.
    pub fn from_values(values: &[f64]) -> Result<Self, SimError> {
        let [s, l, vx, vy, yaw, yaw_rate, t, terminal]: [f64; RAW_STATE_LEN] =
            values.try_into().map_err(|_| {
                SimError::MalformedState(format!(
                    "expected {RAW_STATE_LEN} values, got {}",
                    values.len()
                ))
            })?;

        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(SimError::MalformedState(format!(
                "non-finite value at index {i}"
            )));
        }

        Ok(Self {
            s,
            l,
            vx,
            vy,
            yaw,
            yaw_rate,
            t,
            terminal: terminal != 0.0,
        })
    }

    /// Encode back into the 8-tuple wire layout.
    #[must_use]
    pub fn to_values(&self) -> [f64; RAW_STATE_LEN] {
        [
            self.s,
            self.l,
            self.vx,
            self.vy,
            self.yaw,
            self.yaw_rate,
            self.t,
            if self.terminal { 1.0 } else { 0.0 },
        ]
    }
}

// ---------------------------------------------------------------------------
// AngleUnit
// ---------------------------------------------------------------------------

/// Unit the simulator uses for yaw and yaw rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Convert a value in this unit to radians.
    #[must_use]
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            Self::Radians => value,
            Self::Degrees => value * PI / 180.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// Raw control vector sent to the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub steer: f64,
    pub throttle: f64,
    pub brake: f64,
}

impl Control {
    /// All-zero control used to stop and re-zero the vehicle.
    pub const ZERO: Self = Self {
        steer: 0.0,
        throttle: 0.0,
        brake: 0.0,
    };

    #[must_use]
    pub const fn to_values(&self) -> [f64; CONTROL_LEN] {
        [self.steer, self.throttle, self.brake]
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Agent command `(steer, throttle)`, each nominally in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: [f32; ACTION_DIM],
}

impl Action {
    pub const fn new(steer: f32, throttle: f32) -> Self {
        Self {
            data: [steer, throttle],
        }
    }

    pub const fn zeros() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Build from a flat slice, checking the dimension.
    pub fn from_slice(values: &[f32]) -> Result<Self, ValidationError> {
        let data: [f32; ACTION_DIM] =
            values
                .try_into()
                .map_err(|_| ValidationError::ActionDimMismatch {
                    expected: ACTION_DIM,
                    got: values.len(),
                })?;
        Ok(Self { data })
    }

    pub const fn steer(&self) -> f32 {
        self.data[0]
    }

    pub const fn throttle(&self) -> f32 {
        self.data[1]
    }

    pub const fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Reject NaN and Inf components.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for val in &self.data {
            if val.is_nan() {
                return Err(ValidationError::ActionContainsNan);
            }
            if val.is_infinite() {
                return Err(ValidationError::ActionContainsInf);
            }
        }
        Ok(())
    }

    /// First dimension outside `[-1, 1]`, if any.
    pub fn out_of_bounds_dim(&self) -> Option<usize> {
        self.data.iter().position(|v| !(-1.0..=1.0).contains(v))
    }

    /// Clip to `[-1, 1]`. Returns `true` if any component changed.
    #[allow(clippy::float_cmp)]
    pub fn clip_normalized(&mut self) -> bool {
        let mut clipped = false;
        for val in &mut self.data {
            let c = val.clamp(-1.0, 1.0);
            if c != *val {
                clipped = true;
                *val = c;
            }
        }
        clipped
    }

    /// Forward to the simulator unchanged; brake is always released.
    #[must_use]
    pub fn to_control(&self) -> Control {
        Control {
            steer: f64::from(self.steer()),
            throttle: f64::from(self.throttle()),
            brake: 0.0,
        }
    }
}

impl From<[f32; ACTION_DIM]> for Action {
    fn from(data: [f32; ACTION_DIM]) -> Self {
        Self { data }
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Normalized observation `[s, l, vx, vy, yaw, yaw_rate]`, each in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: [f32; OBS_DIM],
}

impl Observation {
    pub const fn new(data: [f32; OBS_DIM]) -> Self {
        Self { data }
    }

    pub const fn zeros() -> Self {
        Self {
            data: [0.0; OBS_DIM],
        }
    }

    pub const fn len(&self) -> usize {
        OBS_DIM
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub const fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

// ---------------------------------------------------------------------------
// VehicleState
// ---------------------------------------------------------------------------

/// Unscaled state cached by the environment after each tick.
///
/// Angles are always radians here. Reward and termination strategies read
/// this, never the normalized observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub s: f64,
    pub l: f64,
    pub vx: f64,
    pub vy: f64,
    pub yaw: f64,
    pub yaw_rate: f64,
    pub t: f64,
    pub terminal: bool,
    /// Planar velocity magnitude `sqrt(vx^2 + vy^2)`.
    pub speed: f64,
    /// Action that produced this state (zero after reset).
    pub last_action: Action,
}

impl VehicleState {
    #[must_use]
    pub fn from_raw(raw: &RawState, unit: AngleUnit, last_action: Action) -> Self {
        Self {
            s: raw.s,
            l: raw.l,
            vx: raw.vx,
            vy: raw.vy,
            yaw: unit.to_radians(raw.yaw),
            yaw_rate: unit.to_radians(raw.yaw_rate),
            t: raw.t,
            terminal: raw.terminal,
            speed: raw.vx.hypot(raw.vy),
            last_action,
        }
    }

    /// The six observed quantities in observation order.
    #[must_use]
    pub const fn observed(&self) -> [f64; OBS_DIM] {
        [self.s, self.l, self.vx, self.vy, self.yaw, self.yaw_rate]
    }
}

// ---------------------------------------------------------------------------
// BoxSpace
// ---------------------------------------------------------------------------

/// Continuous box space, following Gymnasium's `Box`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// Symmetric `[-1, 1]^dim` space.
    #[must_use]
    pub fn unit(dim: usize) -> Self {
        Self {
            low: vec![-1.0; dim],
            high: vec![1.0; dim],
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.low.len()
            && values
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }

    /// Sample uniformly. Takes `&mut impl Rng` for determinism.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Vec<f32> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| rng.gen_range(*l..=*h))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// StepResult
// ---------------------------------------------------------------------------

/// Result of `env.step(action)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    /// Simulator flag or a termination condition fired.
    pub terminated: bool,
    /// Step budget exhausted.
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepResult {
    /// Episode over for either reason.
    pub const fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Steps taken in the current episode.
    pub episode_length: u32,
    /// Reward accumulated over the current episode.
    pub episode_reward: f32,
    /// 1-based index of the current episode.
    pub episode_number: u32,
    pub global_tick: u64,
    pub sim_time: f64,
    pub custom: HashMap<String, f32>,
}

// ---------------------------------------------------------------------------
// RenderMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// No-op.
    #[default]
    None,
    /// One-line textual state summary through the log.
    Human,
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "human" | "gui" => Ok(Self::Human),
            other => Err(format!("unknown render mode '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
