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
//! Soft bodies and the springs between them
//!
//! A [`Body`] is a disc whose radius follows from its mass and density
//! (`radius = mass / mass_per_radius`). An [`Attachment`] is a spring between
//! two bodies that keeps their surfaces `distance` apart and may additionally
//! hold a relative orientation.

use crate::arena::Handle;
use glam::Vec2;

/// A soft circular body
///
/// # Examples
///
/// ```
/// use glam::Vec2;
/// use softcell_engine::physics::Body;
///
/// let body = Body::new(Vec2::new(10.0, 10.0), 2.0, 4.0);
/// assert_eq!(body.radius(), 0.5);
/// assert!(body.room().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Center of the body
    pub position: Vec2,
    /// Linear velocity in world units per second
    pub velocity: Vec2,
    /// Orientation in radians
    pub angle: f32,
    /// Angular velocity in radians per second
    pub angle_velocity: f32,
    /// Mass; heavier bodies accelerate less under the same force
    pub mass: f32,
    /// The "density" of the body
    pub mass_per_radius: f32,
    /// Fixed bodies still feel forces but are not moved by integration
    pub fixed: bool,
    room: Option<(usize, usize)>,
}

impl Body {
    /// Create a body at rest
    pub fn new(position: Vec2, mass: f32, mass_per_radius: f32) -> Self {
        Body {
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angle_velocity: 0.0,
            mass,
            mass_per_radius,
            fixed: false,
            room: None,
        }
    }

    /// Set the initial orientation
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Mark the body as fixed in place
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Effective radius
    pub fn radius(&self) -> f32 {
        self.mass / self.mass_per_radius
    }

    /// Room the body is currently filed under, `None` until first filed
    pub fn room(&self) -> Option<(usize, usize)> {
        self.room
    }

    pub(crate) fn set_room(&mut self, room: Option<(usize, usize)>) {
        self.room = room;
    }

    /// Check that every kinematic quantity is finite and the mass usable
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.angle_velocity.is_finite()
            && self.mass > 0.0
            && self.mass_per_radius > 0.0
    }
}

/// Spring parameters shared by an attachment and copied on propagation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentConfig {
    /// Distance to keep between the two surfaces
    pub distance: f32,
    /// Multiplier on the base attachment force
    pub strength: f32,
    /// Target of `angle_b - angle_a`; `None` leaves the angle unconstrained
    pub delta_angle: Option<f32>,
}

impl AttachmentConfig {
    /// Create an attachment config without angle constraint
    pub fn new(distance: f32, strength: f32) -> Self {
        AttachmentConfig {
            distance,
            strength,
            delta_angle: None,
        }
    }

    /// Constrain the relative angle between the two bodies
    pub fn with_delta_angle(mut self, delta_angle: f32) -> Self {
        self.delta_angle = Some(delta_angle);
        self
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        AttachmentConfig::new(0.0, 1.0)
    }
}

/// A spring between two distinct bodies
///
/// The body order only matters for the angle constraint, which is measured
/// from `bodies()[0]` to `bodies()[1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Spring parameters; `distance` is rewritten by muscle cells
    pub config: AttachmentConfig,
    bodies: [Handle<Body>; 2],
}

impl Attachment {
    pub(crate) fn new(config: AttachmentConfig, bodies: [Handle<Body>; 2]) -> Self {
        Attachment { config, bodies }
    }

    /// The two attached bodies
    pub fn bodies(&self) -> [Handle<Body>; 2] {
        self.bodies
    }

    /// Check if the attachment references `body`
    pub fn involves(&self, body: Handle<Body>) -> bool {
        self.bodies[0] == body || self.bodies[1] == body
    }

    /// Check if the attachment joins `a` and `b`, in either order
    pub fn connects(&self, a: Handle<Body>, b: Handle<Body>) -> bool {
        (self.bodies[0] == a && self.bodies[1] == b) || (self.bodies[0] == b && self.bodies[1] == a)
    }

    /// The body on the other end from `body`
    pub fn other(&self, body: Handle<Body>) -> Option<Handle<Body>> {
        if self.bodies[0] == body {
            Some(self.bodies[1])
        } else if self.bodies[1] == body {
            Some(self.bodies[0])
        } else {
            None
        }
    }
}
