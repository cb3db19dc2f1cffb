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
//! Spring forces
//!
//! Both repulsion and attachments use the same linear spring law between two
//! discs:
//!
//! ```text
//! stretch = |c_b - c_a| - r_a - r_b - rest_distance
//! force   = base_force * stretch
//! v_a    += force * dir * dt / m_a
//! v_b    -= force * dir * dt / m_b
//! ```
//!
//! where `dir` is the unit vector from `a` to `b`. Repulsion uses a rest
//! distance of zero and clamps `stretch` to non-positive values, so it only
//! ever pushes overlapping bodies apart. Attachments use the full law and so
//! pull as well as push.
//!
//! Forces are applied directly as velocity changes; there is no separate
//! force accumulator since every force in this model is pairwise.

use super::body::{Attachment, Body};
use super::rooms::RoomGrid;
use crate::arena::{Arena, Handle};
use crate::error::{ArenaError, SimError, SimResult};
use glam::Vec2;

/// Which half of the spring law applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpringMode {
    /// Only push apart; stretch is clamped to `min(stretch, 0)`
    Repulsion,
    /// Push and pull towards the rest distance
    Attachment,
}

/// Parameters shared by every spring evaluation of one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    /// Force per unit of stretch
    pub base_force: f32,
    /// Timestep in seconds
    pub dt: f32,
    /// Center distance under which the direction falls back to +x
    pub separation_epsilon: f32,
}

/// Apply the spring law between two bodies
///
/// Returns the signed force magnitude that was applied.
pub fn apply_spring_force(
    a: &mut Body,
    b: &mut Body,
    rest_distance: f32,
    mode: SpringMode,
    params: SpringParams,
) -> f32 {
    let sub = b.position - a.position;
    let dist = sub.length();
    let mut stretch = dist - a.radius() - b.radius() - rest_distance;
    if mode == SpringMode::Repulsion {
        stretch = stretch.min(0.0);
    }
    let force = params.base_force * stretch;
    if force == 0.0 {
        return 0.0;
    }

    let dir = if dist > params.separation_epsilon {
        sub / dist
    } else {
        Vec2::X
    };
    let force_vec = dir * force;
    a.velocity += force_vec * (params.dt / a.mass);
    b.velocity -= force_vec * (params.dt / b.mass);
    force
}

/// Apply torque on both bodies towards `angle_b - angle_a == target_delta`
pub fn apply_angle_force(a: &mut Body, b: &mut Body, target_delta: f32, coefficient: f32, dt: f32) {
    let error = (b.angle - target_delta) - a.angle;
    let correction = error * coefficient;
    a.angle_velocity += correction * dt / a.mass;
    b.angle_velocity -= correction * dt / b.mass;
}

/// Repulsion between every body and the bodies it may overlap
///
/// Each body is tested against every other body of its room and against the
/// bodies of every neighbor room its surface reaches into. Pairs are visited
/// from both sides, and every visit updates both bodies. Returns the number
/// of pairs that actually pushed.
pub fn apply_repulsion_forces(
    rooms: &RoomGrid,
    bodies: &mut Arena<Body>,
    params: SpringParams,
) -> SimResult<usize> {
    let (rooms_x, rooms_y) = rooms.dimensions();
    let mut pushes = 0;

    for cy in 0..rooms_y {
        for cx in 0..rooms_x {
            let bucket = rooms.bucket(cx, cy);
            for &body in bucket {
                for &other in bucket {
                    if other == body {
                        continue;
                    }
                    pushes += repulse(bodies, body, other, params)?;
                }

                let reached = rooms.reached_neighbors((cx, cy), bodies.get(body)?);
                for (nx, ny) in reached.into_iter().flatten() {
                    for &other in rooms.bucket(nx, ny) {
                        pushes += repulse(bodies, body, other, params)?;
                    }
                }
            }
        }
    }
    Ok(pushes)
}

fn repulse(
    bodies: &mut Arena<Body>,
    body: Handle<Body>,
    other: Handle<Body>,
    params: SpringParams,
) -> SimResult<usize> {
    let (a, b) = bodies.get_pair_mut(body, other)?;
    let force = apply_spring_force(a, b, 0.0, SpringMode::Repulsion, params);
    Ok(usize::from(force != 0.0))
}

/// Spring and angle forces of every live attachment
///
/// An attachment whose bodies are dead or identical fails the whole pass:
/// it can only exist through a bookkeeping bug upstream.
pub fn apply_attachment_forces(
    attachments: &Arena<Attachment>,
    bodies: &mut Arena<Body>,
    params: SpringParams,
    angle_coefficient: f32,
) -> SimResult<()> {
    for (handle, attachment) in attachments.iter() {
        let [first, second] = attachment.bodies();
        let (a, b) = bodies.get_pair_mut(first, second).map_err(|err| {
            let reason = match err {
                ArenaError::Aliased(_) => "both ends are the same body",
                _ => "references a dead body",
            };
            tracing::error!(attachment = %handle, reason, "malformed attachment");
            SimError::MalformedAttachment {
                attachment: handle.raw(),
                reason,
            }
        })?;

        let config = attachment.config;
        let spring = SpringParams {
            base_force: params.base_force * config.strength,
            ..params
        };
        apply_spring_force(a, b, config.distance, SpringMode::Attachment, spring);
        if let Some(delta) = config.delta_angle {
            apply_angle_force(a, b, delta, angle_coefficient, params.dt);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: SpringParams = SpringParams {
        base_force: 2.0,
        dt: 0.1,
        separation_epsilon: 0.1,
    };

    #[test]
    fn test_repulsion_pushes_overlapping_bodies_apart() {
        let mut a = Body::new(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let mut b = Body::new(Vec2::new(1.5, 0.0), 1.0, 1.0);
        let force = apply_spring_force(&mut a, &mut b, 0.0, SpringMode::Repulsion, PARAMS);
        assert!(force < 0.0);
        assert!(a.velocity.x < 0.0);
        assert!(b.velocity.x > 0.0);
        assert_eq!(a.velocity.y, 0.0);
    }

    #[test]
    fn test_repulsion_never_pulls() {
        let mut a = Body::new(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let mut b = Body::new(Vec2::new(3.0, 0.0), 1.0, 1.0);
        let force = apply_spring_force(&mut a, &mut b, 0.0, SpringMode::Repulsion, PARAMS);
        assert_eq!(force, 0.0);
        assert_eq!(a.velocity, Vec2::ZERO);
        assert_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_attachment_pulls_stretched_bodies_together() {
        let mut a = Body::new(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let mut b = Body::new(Vec2::new(5.0, 0.0), 1.0, 1.0);
        apply_spring_force(&mut a, &mut b, 1.0, SpringMode::Attachment, PARAMS);
        assert!(a.velocity.x > 0.0);
        assert!(b.velocity.x < 0.0);
    }

    #[test]
    fn test_heavier_body_accelerates_less() {
        let mut light = Body::new(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let mut heavy = Body::new(Vec2::new(1.5, 0.0), 4.0, 4.0);
        apply_spring_force(&mut light, &mut heavy, 0.0, SpringMode::Repulsion, PARAMS);
        assert!(light.velocity.length() > heavy.velocity.length());
        // momentum is exchanged symmetrically
        let momentum = light.velocity * light.mass + heavy.velocity * heavy.mass;
        assert!(momentum.length() < 1e-5);
    }

    #[test]
    fn test_coincident_centers_use_fallback_axis() {
        let mut a = Body::new(Vec2::new(1.0, 1.0), 1.0, 1.0);
        let mut b = Body::new(Vec2::new(1.0, 1.0), 1.0, 1.0);
        apply_spring_force(&mut a, &mut b, 0.0, SpringMode::Repulsion, PARAMS);
        assert!(a.velocity.is_finite() && b.velocity.is_finite());
        assert!(a.velocity.x < 0.0);
        assert!(b.velocity.x > 0.0);
        assert_eq!(a.velocity.y, 0.0);
    }

    #[test]
    fn test_angle_force_reduces_error() {
        let mut a = Body::new(Vec2::ZERO, 1.0, 1.0);
        let mut b = Body::new(Vec2::X, 1.0, 1.0).with_angle(1.0);
        apply_angle_force(&mut a, &mut b, 0.0, 5.0, 0.1);
        assert!(a.angle_velocity > 0.0);
        assert!(b.angle_velocity < 0.0);

        let mut c = Body::new(Vec2::ZERO, 1.0, 1.0);
        let mut d = Body::new(Vec2::X, 1.0, 1.0).with_angle(0.5);
        apply_angle_force(&mut c, &mut d, 0.5, 5.0, 0.1);
        assert_eq!(c.angle_velocity, 0.0);
        assert_eq!(d.angle_velocity, 0.0);
    }

    #[test]
    fn test_malformed_attachment_fails_fast() {
        let mut bodies = Arena::new("bodies", 4);
        let mut attachments = Arena::new("attachments", 4);
        let a = bodies.add(Body::new(Vec2::ZERO, 1.0, 1.0)).unwrap();
        let b = bodies.add(Body::new(Vec2::X * 4.0, 1.0, 1.0)).unwrap();
        attachments
            .add(Attachment::new(Default::default(), [a, b]))
            .unwrap();
        bodies.kill(b).unwrap();

        let err = apply_attachment_forces(&attachments, &mut bodies, PARAMS, 1.0).unwrap_err();
        assert!(matches!(
            err,
            SimError::MalformedAttachment {
                reason: "references a dead body",
                ..
            }
        ));
    }

    #[test]
    fn test_self_attachment_fails_fast() {
        let mut bodies = Arena::new("bodies", 4);
        let mut attachments = Arena::new("attachments", 4);
        let a = bodies.add(Body::new(Vec2::ZERO, 1.0, 1.0)).unwrap();
        attachments
            .add(Attachment::new(Default::default(), [a, a]))
            .unwrap();
        let err = apply_attachment_forces(&attachments, &mut bodies, PARAMS, 1.0).unwrap_err();
        assert!(matches!(
            err,
            SimError::MalformedAttachment {
                reason: "both ends are the same body",
                ..
            }
        ));
    }

    #[test]
    fn test_repulsion_across_room_edge() {
        let mut rooms = RoomGrid::new(4, 4, 5.0, 5.0);
        let mut bodies = Arena::new("bodies", 4);
        // centers on both sides of x = 5, overlapping
        let a = bodies.add(Body::new(Vec2::new(4.5, 2.5), 1.0, 1.0)).unwrap();
        let b = bodies.add(Body::new(Vec2::new(5.5, 2.5), 1.0, 1.0)).unwrap();
        rooms.refresh_all(&mut bodies);
        assert_ne!(bodies.get(a).unwrap().room(), bodies.get(b).unwrap().room());

        let pushes = apply_repulsion_forces(&rooms, &mut bodies, PARAMS).unwrap();
        assert_eq!(pushes, 2);
        assert!(bodies.get(a).unwrap().velocity.x < 0.0);
        assert!(bodies.get(b).unwrap().velocity.x > 0.0);
    }
}
