//! Deterministic simulation module
//!
//! All physics and run bookkeeping live here. This module must be pure and deterministic:
//! - Caller-supplied dt, clamped to a stable range
//! - Seeded RNG only
//! - Stable iteration order (by entity index)
//! - No rendering or platform dependencies

pub mod error;
pub mod integrate;
pub mod run;
pub mod state;

pub use error::{SimError, SimResult};
pub use integrate::{classify, step};
pub use run::{
    BatchSummary, EnsembleSummary, EntitySnapshot, FrameSnapshot, Frames, Orchestrator,
    RunConfig, RunEvent, RunHandle, RunMode, RunPhase, clamp_dt,
};
pub use state::{Entity, Outcome, WorldBounds};
