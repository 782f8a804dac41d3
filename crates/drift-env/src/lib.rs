//! Episode environment for the drift control loop.
//!
//! [`DriftEnv`](env::DriftEnv) exposes `reset`/`step`/`render` over a
//! simulator session; [`Episode`](episode::Episode) holds the lifecycle state
//! machine and counters; [`TelemetrySink`](telemetry::TelemetrySink)
//! aggregates reward and speed samples.

pub mod env;
pub mod episode;
pub mod telemetry;

pub mod prelude {
    pub use crate::{
        env::{ACTION_CLIPPED_KEY, DriftEnv, DriftEnvBuilder},
        episode::{Episode, EpisodeCounters, EpisodeState, StepOutcome},
        telemetry::{TelemetrySample, TelemetrySink},
    };
}
