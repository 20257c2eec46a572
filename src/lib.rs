//! Coin Toss - a 2D coin launch, bounce and settle demo
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integrator, run orchestration, outcomes)
//! - `params`: Launch parameter set and advisory UI ranges
//! - `stats`: Lifetime heads/tails counters
//! - `web`: WebAssembly binding for a browser front end (wasm32 only)

pub mod params;
pub mod sim;
pub mod stats;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use params::{ParamRange, ParameterSet};
pub use stats::AggregateStats;

/// Physics configuration constants (SI units, y axis points down)
pub mod consts {
    /// Gravitational acceleration (m/s²)
    pub const GRAVITY: f32 = 9.81;

    /// Default simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest step the integrator will take (50 steps/second floor)
    pub const MAX_DT: f32 = 0.02;
    /// Smallest step; host hiccups with dt <= 0 are clamped up to this
    pub const MIN_DT: f32 = 1.0e-4;

    /// Coin geometry
    pub const COIN_RADIUS: f32 = 0.12;
    /// Coin mass (kg). Not used by the force model.
    pub const COIN_MASS: f32 = 0.01;

    /// Gap between the bottom of the world and the ground line
    pub const GROUND_MARGIN: f32 = 0.05;
    /// Horizontal launch position as a fraction of world width
    pub const LAUNCH_X_FRACTION: f32 = 0.25;

    /// Wind acts as a horizontal acceleration scaled by this factor
    pub const WIND_FACTOR: f32 = 0.5;
    /// Horizontal velocity kept per ground contact (rolling friction)
    pub const GROUND_FRICTION: f32 = 0.95;
    /// Angular velocity kept per ground contact (spin friction)
    pub const SPIN_FRICTION: f32 = 0.9;
    /// Wall bounce restitution
    pub const WALL_RESTITUTION: f32 = 0.8;

    /// Both velocity components must stay below this to count as resting
    pub const SETTLE_SPEED: f32 = 0.1;
    /// Seconds of contiguous rest before a coin is settled
    pub const SETTLE_TIME: f32 = 0.5;

    /// Maximum recorded trajectory samples per coin
    pub const TRAJECTORY_CAP: usize = 1000;

    /// Largest divergence ensemble
    pub const MAX_ENSEMBLE: u32 = 256;
    /// Simulated seconds `run_to_completion` waits for a run (or batch element)
    /// when no run limit is configured
    pub const COMPLETION_LIMIT: f32 = 3600.0;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Launch velocity vector for a speed and an elevation in degrees (up is -y)
#[inline]
pub fn launch_vector(speed: f32, angle_deg: f32) -> glam::Vec2 {
    let theta = angle_deg.to_radians();
    glam::Vec2::new(theta.cos() * speed, -theta.sin() * speed)
}
