//! Coin and world state types
//!
//! Plain data. All physics lives in `integrate`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::launch_vector;
use crate::params::ParameterSet;

/// Face-up side of a coin at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// Still moving
    #[default]
    Unresolved,
    Heads,
    Tails,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Unresolved => "Unresolved",
            Outcome::Heads => "Heads",
            Outcome::Tails => "Tails",
        }
    }

    pub fn is_resolved(&self) -> bool {
        *self != Outcome::Unresolved
    }
}

/// Collision box for a run. Origin is top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: 4.0,
            height: 3.5,
        }
    }
}

impl WorldBounds {
    /// y coordinate of the floor surface
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.height - GROUND_MARGIN
    }
}

/// A simulated coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Accumulated rotation (radians, unbounded)
    pub rotation: f32,
    pub angular_vel: f32,
    /// Speed this coin was launched with (m/s)
    pub launch_speed: f32,
    pub radius: f32,
    pub mass: f32,
    // Snapshotted from the parameter set at launch
    pub restitution: f32,
    pub drag_coefficient: f32,
    pub wind_speed: f32,
    /// Once true, stays true
    pub settled: bool,
    /// Contiguous seconds spent resting on the ground
    pub settle_timer: f32,
    pub outcome: Outcome,
    /// Recorded positions, oldest first, capped at `TRAJECTORY_CAP`
    pub trajectory: Vec<Vec2>,
    /// Ensemble index for coloring
    pub color_tag: u32,
}

impl Entity {
    /// Create a coin at the launch point with the parameter set's launch velocity and spin
    pub fn launch(id: u32, params: &ParameterSet, bounds: &WorldBounds, color_tag: u32) -> Self {
        let pos = Vec2::new(
            bounds.width * LAUNCH_X_FRACTION,
            bounds.ground_y() - params.height,
        );
        Self {
            id,
            pos,
            vel: launch_vector(params.launch_velocity, params.launch_angle),
            rotation: 0.0,
            angular_vel: params.spin_rate,
            launch_speed: params.launch_velocity,
            radius: COIN_RADIUS,
            mass: COIN_MASS,
            restitution: params.restitution,
            drag_coefficient: params.drag_coefficient,
            wind_speed: params.wind_speed,
            settled: false,
            settle_timer: 0.0,
            outcome: Outcome::Unresolved,
            trajectory: Vec::with_capacity(64),
            color_tag,
        }
    }

    /// Record current position to the trajectory unless full
    pub fn record_trajectory(&mut self) {
        if self.trajectory.len() < TRAJECTORY_CAP {
            self.trajectory.push(self.pos);
        }
    }

    /// Kinematic state has no NaN or infinity
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite()
            && self.vel.is_finite()
            && self.rotation.is_finite()
            && self.angular_vel.is_finite()
    }
}
