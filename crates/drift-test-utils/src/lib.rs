//! Shared test fixtures for the drift crates.
//!
//! Provides a scripted in-process simulator and factory, constant rewards and
//! fixed terminations, and deterministic RNG setup.

pub mod mocks;
pub mod rng;
pub mod sim;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{AlwaysTerminate, ConstantReward, NeverTerminate};
pub use rng::{random_action, seeded_rng};
pub use sim::{
    CallLog, SCRIPTED_TIMEOUT, ScriptedFactory, ScriptedFault, ScriptedSimulator, SimCall, raw_state,
};
