//! Affine rescaling between physical units and the `[-1, 1]` observation range.
//!
//! Each observed dimension carries a `(min, max)` pair. [`ObservationBounds`]
//! is validated once and then maps a [`VehicleState`] to an [`Observation`]
//! with `-1 + 2 (x - min) / (max - min)`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{OBS_DIM, Observation, VehicleState};

/// Names of the observed dimensions, in observation order.
pub const OBS_NAMES: [&str; OBS_DIM] = ["s", "l", "vx", "vy", "yaw", "yaw_rate"];

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Closed physical range for one observed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Symmetric `[-limit, limit]`.
    pub const fn symmetric(limit: f64) -> Self {
        Self {
            min: -limit,
            max: limit,
        }
    }

    pub fn validate(&self, dim: &'static str) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.max <= self.min {
            return Err(ConfigError::InvalidBounds {
                dim,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Map `value` to `[-1, 1]`. Values beyond the range saturate.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        (-1.0 + 2.0 * (value - self.min) / (self.max - self.min)).clamp(-1.0, 1.0)
    }

    /// Inverse of [`normalize`](Self::normalize) for in-range values.
    #[must_use]
    pub fn denormalize(&self, normalized: f64) -> f64 {
        self.min + (normalized + 1.0) * 0.5 * (self.max - self.min)
    }
}

// ---------------------------------------------------------------------------
// ObservationBounds
// ---------------------------------------------------------------------------

/// Per-dimension bounds for `[s, l, vx, vy, yaw, yaw_rate]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationBounds {
    #[serde(default = "default_s")]
    pub s: Bounds,
    #[serde(default = "default_l")]
    pub l: Bounds,
    #[serde(default = "default_vx")]
    pub vx: Bounds,
    #[serde(default = "default_vy")]
    pub vy: Bounds,
    #[serde(default = "default_yaw")]
    pub yaw: Bounds,
    #[serde(default = "default_yaw_rate")]
    pub yaw_rate: Bounds,
}

const fn default_s() -> Bounds {
    Bounds::new(0.0, 800.0)
}
const fn default_l() -> Bounds {
    Bounds::symmetric(6.0)
}
const fn default_vx() -> Bounds {
    Bounds::new(0.0, 150.0)
}
const fn default_vy() -> Bounds {
    Bounds::symmetric(80.0)
}
const fn default_yaw() -> Bounds {
    Bounds::symmetric(2.0 * PI)
}
const fn default_yaw_rate() -> Bounds {
    Bounds::symmetric(2.0)
}

impl Default for ObservationBounds {
    fn default() -> Self {
        Self {
            s: default_s(),
            l: default_l(),
            vx: default_vx(),
            vy: default_vy(),
            yaw: default_yaw(),
            yaw_rate: default_yaw_rate(),
        }
    }
}

impl ObservationBounds {
    /// Bounds in observation order.
    #[must_use]
    pub const fn as_array(&self) -> [Bounds; OBS_DIM] {
        [self.s, self.l, self.vx, self.vy, self.yaw, self.yaw_rate]
    }

    /// Every dimension must have `max > min`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (bounds, name) in self.as_array().iter().zip(OBS_NAMES) {
            bounds.validate(name)?;
        }
        Ok(())
    }

    /// Rescale the observed quantities of `state`.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn rescale(&self, state: &VehicleState) -> Observation {
        let raw = state.observed();
        let bounds = self.as_array();
        let mut data = [0.0_f32; OBS_DIM];
        for i in 0..OBS_DIM {
            data[i] = bounds[i].normalize(raw[i]) as f32;
        }
        Observation::new(data)
    }

    /// Recover physical values from an observation (exact for in-range values).
    #[must_use]
    pub fn unscale(&self, obs: &Observation) -> [f64; OBS_DIM] {
        let bounds = self.as_array();
        let mut out = [0.0; OBS_DIM];
        for i in 0..OBS_DIM {
            out[i] = bounds[i].denormalize(f64::from(obs[i]));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_unit_range() {
        for bounds in ObservationBounds::default().as_array() {
            assert!((bounds.normalize(bounds.min) + 1.0).abs() < 1e-12);
            assert!((bounds.normalize(bounds.max) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn midpoint_of_road_is_zero() {
        let s = Bounds::new(0.0, 800.0);
        assert!(s.normalize(400.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_is_monotonic_in_every_dimension() {
        let bounds = ObservationBounds::default();
        for (b, name) in bounds.as_array().iter().zip(OBS_NAMES) {
            // Sweep past both ends so the saturated tails are covered too.
            let span = b.max - b.min;
            let mut prev = f64::NEG_INFINITY;
            for i in -50..=250 {
                let x = b.min + span * f64::from(i) / 200.0;
                let v = b.normalize(x);
                assert!(v >= prev, "{name} not monotonic at {x}");
                assert!((-1.0..=1.0).contains(&v), "{name} out of range at {x}");
                prev = v;
            }
        }
    }

    #[test]
    fn out_of_range_saturates() {
        let b = Bounds::new(0.0, 150.0);
        assert!((b.normalize(-10.0) + 1.0).abs() < f64::EPSILON);
        assert!((b.normalize(400.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn denormalize_inverts_in_range() {
        let b = Bounds::symmetric(80.0);
        for v in [-80.0, -12.5, 0.0, 33.3, 80.0] {
            assert!((b.denormalize(b.normalize(v)) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn validate_rejects_inverted_or_empty_bounds() {
        assert!(Bounds::new(0.0, 800.0).validate("s").is_ok());
        let err = Bounds::new(800.0, 0.0).validate("s").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { dim: "s", .. }));
        assert!(Bounds::new(1.0, 1.0).validate("l").is_err());
        assert!(Bounds::new(f64::NAN, 1.0).validate("vx").is_err());
    }

    #[test]
    fn observation_bounds_validate_names_dimension() {
        let mut bounds = ObservationBounds::default();
        bounds.yaw_rate = Bounds::new(2.0, -2.0);
        let err = bounds.validate().unwrap_err();
        assert!(err.to_string().contains("yaw_rate"));
    }

    #[test]
    fn rescale_orders_dimensions() {
        let bounds = ObservationBounds::default();
        let state = VehicleState {
            s: 400.0,
            l: 6.0,
            vx: 0.0,
            vy: 0.0,
            yaw: 0.0,
            yaw_rate: -2.0,
            ..VehicleState::default()
        };
        let obs = bounds.rescale(&state);
        assert!(obs[0].abs() < 1e-6);
        assert!((obs[1] - 1.0).abs() < 1e-6);
        assert!((obs[2] + 1.0).abs() < 1e-6);
        assert!(obs[3].abs() < 1e-6);
        assert!(obs[4].abs() < 1e-6);
        assert!((obs[5] + 1.0).abs() < 1e-6);

        let back = bounds.unscale(&obs);
        assert!((back[0] - 400.0).abs() < 1e-3);
    }

    #[test]
    fn bounds_deserialize_with_defaults() {
        let bounds: ObservationBounds = toml::from_str(
            r"
            [s]
            min = 0.0
            max = 1200.0
            ",
        )
        .unwrap();
        assert!((bounds.s.max - 1200.0).abs() < f64::EPSILON);
        assert_eq!(bounds.l, Bounds::symmetric(6.0));
    }
}
