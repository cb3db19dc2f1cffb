// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Motion integration
//!
//! Semi-implicit Euler: the force passes have already updated velocities, so
//! positions advance with the new velocities. Damping is exponential in time
//! (`v *= decay^dt`) and therefore independent of how a second is divided
//! into steps.
//!
//! # Timestep Guidelines
//!
//! - The spring constants are stiff; frame-paced steps of 1/30 s or smaller
//!   keep attachments stable
//! - Steps longer than a second are accepted but logged as suspicious

use super::body::Body;
use crate::arena::Arena;
use crate::error::{SimError, SimResult};
use glam::Vec2;

/// Reject timesteps that cannot be integrated
///
/// A non-positive, NaN or infinite `dt` is an error. Very large timesteps
/// are allowed but produce a warning since they tend to blow up the springs.
pub fn validate_timestep(dt: f32) -> SimResult<()> {
    if !(dt > 0.0) || !dt.is_finite() {
        return Err(SimError::InvalidTimestep(dt));
    }
    if dt > 1.0 {
        tracing::warn!(dt, "timestep is large and may destabilize attachments");
    }
    Ok(())
}

/// Move every non-fixed body by its velocity and clamp it into `[min, max]`
///
/// Returns the number of bodies moved.
pub fn apply_velocities(bodies: &mut Arena<Body>, dt: f32, min: Vec2, max: Vec2) -> usize {
    let mut moved = 0;
    for (_, body) in bodies.iter_mut() {
        if body.fixed {
            continue;
        }
        body.position += body.velocity * dt;
        body.angle += body.angle_velocity * dt;
        body.position = body.position.clamp(min, max);
        moved += 1;
    }
    moved
}

/// Exponentially decay linear and angular velocity of every body
pub fn apply_damping(bodies: &mut Arena<Body>, decay_per_second: f32, dt: f32) {
    let factor = decay_per_second.powf(dt);
    for (_, body) in bodies.iter_mut() {
        body.velocity *= factor;
        body.angle_velocity *= factor;
    }
}
