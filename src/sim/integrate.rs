//! Per-coin fixed-step integrator
//!
//! Semi-implicit Euler: each term sees the velocity updated by the one before
//! it. Mass does not enter the force model; gravity, drag and wind are raw
//! accelerations.

use std::f32::consts::{FRAC_PI_2, PI};

use super::state::{Entity, Outcome, WorldBounds};
use crate::consts::*;
use crate::normalize_angle;

/// Classify a resting coin from its accumulated rotation
///
/// Heads when the normalized angle is in [0, π/2) or (3π/2, 2π).
pub fn classify(rotation: f32) -> Outcome {
    let angle = normalize_angle(rotation);
    if angle < FRAC_PI_2 || angle > 1.5 * PI {
        Outcome::Heads
    } else {
        Outcome::Tails
    }
}

/// Advance one coin by `dt` seconds inside `bounds`
pub fn step(coin: &mut Entity, dt: f32, bounds: &WorldBounds) {
    if coin.settled {
        return;
    }

    coin.vel.y += GRAVITY * dt;

    // Quadratic drag opposite to the direction of travel
    let speed = coin.vel.length();
    if speed > 0.0 {
        let drag = 0.5 * coin.drag_coefficient * speed * speed;
        coin.vel -= coin.vel / speed * drag * dt;
    }

    coin.vel.x += coin.wind_speed * dt * WIND_FACTOR;

    coin.pos += coin.vel * dt;
    coin.rotation += coin.angular_vel * dt;
    coin.record_trajectory();

    ground_contact(coin, dt, bounds.ground_y());
    wall_contact(coin, bounds.width);
}

fn ground_contact(coin: &mut Entity, dt: f32, ground_y: f32) {
    if coin.pos.y + coin.radius <= ground_y {
        return;
    }

    coin.pos.y = ground_y - coin.radius;
    coin.vel.y = -coin.vel.y * coin.restitution;
    coin.vel.x *= GROUND_FRICTION;
    coin.angular_vel *= SPIN_FRICTION;

    if coin.vel.y.abs() < SETTLE_SPEED && coin.vel.x.abs() < SETTLE_SPEED {
        coin.settle_timer += dt;
        if coin.settle_timer > SETTLE_TIME {
            coin.settled = true;
            coin.vel = glam::Vec2::ZERO;
            coin.angular_vel = 0.0;
            coin.outcome = classify(coin.rotation);
            log::debug!(
                "Coin {} settled: {} (rotation {:.3})",
                coin.id,
                coin.outcome.as_str(),
                coin.rotation
            );
        }
    } else {
        coin.settle_timer = 0.0;
    }
}

fn wall_contact(coin: &mut Entity, width: f32) {
    if coin.pos.x - coin.radius < 0.0 {
        coin.pos.x = coin.radius;
        coin.vel.x = -coin.vel.x * WALL_RESTITUTION;
    }
    if coin.pos.x + coin.radius > width {
        coin.pos.x = width - coin.radius;
        coin.vel.x = -coin.vel.x * WALL_RESTITUTION;
    }
}
