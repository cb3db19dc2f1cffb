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
//! Soft-body physics
//!
//! The [`PhysicsWorld`] owns the body and attachment arenas plus the room
//! grid, and advances them with a fixed sequence of passes:
//!
//! 1. repulsion between overlapping bodies (room-grid broad phase)
//! 2. attachment springs and angle constraints
//! 3. position integration and clamping into the world bounds
//! 4. exponential damping
//! 5. re-filing every body in its room
//!
//! Everything outside this module mutates physics state only through the
//! handle-based API below, which keeps the attachment and room invariants.

mod body;
pub mod forces;
pub mod integrate;
mod rooms;

pub use body::{Attachment, AttachmentConfig, Body};
pub use rooms::{Direction, RoomGrid};

use crate::arena::{Arena, Handle};
use crate::config::PhysicsConfig;
use crate::error::{SimError, SimResult};
use forces::SpringParams;
use glam::Vec2;

/// Counters gathered during one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsStats {
    /// Body pairs that repelled each other
    pub repulsion_pushes: usize,
    /// Non-fixed bodies that were integrated
    pub bodies_moved: usize,
    /// Bodies that changed rooms during the refresh
    pub rooms_changed: usize,
}

/// Owner of all bodies, attachments and the room grid
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: Arena<Body>,
    attachments: Arena<Attachment>,
    rooms: RoomGrid,
}

impl PhysicsWorld {
    /// Create an empty world after validating the configuration
    pub fn new(config: PhysicsConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(PhysicsWorld {
            bodies: Arena::new("bodies", config.max_bodies),
            attachments: Arena::new("attachments", config.max_attachments),
            rooms: RoomGrid::from_config(&config),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Lower and upper corner of the simulated plane
    pub fn bounds(&self) -> (Vec2, Vec2) {
        (
            Vec2::ZERO,
            Vec2::new(self.config.world_width(), self.config.world_height()),
        )
    }

    /// Room grid, for inspection
    pub fn rooms(&self) -> &RoomGrid {
        &self.rooms
    }

    /// Add a body and file it in its room
    pub fn add_body(&mut self, body: Body) -> SimResult<Handle<Body>> {
        if !body.is_valid() {
            return Err(SimError::InvalidBody(
                "state must be finite and mass and density positive",
            ));
        }
        let handle = self.bodies.add(body)?;
        let body = self.bodies.get_mut(handle)?;
        self.rooms.update_room(handle, body);
        tracing::trace!(body = %handle, "body added");
        Ok(handle)
    }

    /// Kill a body, severing every attachment that still references it
    ///
    /// The body stays filed in its room until its attachments are gone.
    pub fn kill_body(&mut self, handle: Handle<Body>) -> SimResult<Body> {
        self.bodies.get(handle)?;

        let dangling: Vec<_> = self
            .attachments
            .iter()
            .filter(|(_, attachment)| attachment.involves(handle))
            .map(|(h, _)| h)
            .collect();
        for attachment in dangling {
            tracing::debug!(body = %handle, %attachment, "severing attachment of killed body");
            self.attachments.kill(attachment)?;
        }

        let body = self.bodies.get_mut(handle)?;
        self.rooms.remove(handle, body);
        Ok(self.bodies.kill(handle)?)
    }

    /// Get a body
    pub fn body(&self, handle: Handle<Body>) -> SimResult<&Body> {
        Ok(self.bodies.get(handle)?)
    }

    /// Get a body mutably
    ///
    /// A moved body is re-filed at the end of the next step.
    pub fn body_mut(&mut self, handle: Handle<Body>) -> SimResult<&mut Body> {
        Ok(self.bodies.get_mut(handle)?)
    }

    /// Iterate over live bodies in slot order
    pub fn bodies(&self) -> impl Iterator<Item = (Handle<Body>, &Body)> + '_ {
        self.bodies.iter()
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Attach two distinct live bodies
    ///
    /// Fails if the bodies are the same or already attached to each other.
    pub fn add_attachment(
        &mut self,
        a: Handle<Body>,
        b: Handle<Body>,
        config: AttachmentConfig,
    ) -> SimResult<Handle<Attachment>> {
        if a == b {
            tracing::error!(body = %a, "refusing to attach a body to itself");
            return Err(SimError::SelfAttachment(a.raw()));
        }
        self.bodies.get(a)?;
        self.bodies.get(b)?;
        if self.find_attachment(a, b)?.is_some() {
            tracing::error!(%a, %b, "bodies are already attached");
            return Err(SimError::DuplicateAttachment(a.raw(), b.raw()));
        }

        let handle = self.attachments.add(Attachment::new(config, [a, b]))?;
        tracing::trace!(attachment = %handle, %a, %b, "attachment added");
        Ok(handle)
    }

    /// Kill an attachment
    pub fn kill_attachment(&mut self, handle: Handle<Attachment>) -> SimResult<Attachment> {
        Ok(self.attachments.kill(handle)?)
    }

    /// Get an attachment
    pub fn attachment(&self, handle: Handle<Attachment>) -> SimResult<&Attachment> {
        Ok(self.attachments.get(handle)?)
    }

    /// Get an attachment mutably, e.g. to change its rest distance
    pub fn attachment_mut(&mut self, handle: Handle<Attachment>) -> SimResult<&mut Attachment> {
        Ok(self.attachments.get_mut(handle)?)
    }

    /// Iterate over live attachments in slot order
    pub fn attachments(&self) -> impl Iterator<Item = (Handle<Attachment>, &Attachment)> + '_ {
        self.attachments.iter()
    }

    /// Number of live attachments
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// Find the attachment between two bodies, in either order
    ///
    /// Finding more than one is an invariant violation.
    pub fn find_attachment(
        &self,
        a: Handle<Body>,
        b: Handle<Body>,
    ) -> SimResult<Option<Handle<Attachment>>> {
        let mut found = self
            .attachments
            .iter()
            .filter(|(_, attachment)| attachment.connects(a, b))
            .map(|(h, _)| h);
        let needle = found.next();
        if found.next().is_some() {
            tracing::error!(%a, %b, "more than one attachment between two bodies");
            return Err(SimError::DuplicateAttachment(a.raw(), b.raw()));
        }
        Ok(needle)
    }

    /// Advance the world by `dt` seconds
    pub fn step(&mut self, dt: f32) -> SimResult<PhysicsStats> {
        integrate::validate_timestep(dt)?;
        self.advance(dt)
    }

    /// Step with an already validated `dt`
    pub(crate) fn advance(&mut self, dt: f32) -> SimResult<PhysicsStats> {
        let repulsion = SpringParams {
            base_force: self.config.base_repulsion_force,
            dt,
            separation_epsilon: self.config.separation_epsilon,
        };
        let repulsion_pushes =
            forces::apply_repulsion_forces(&self.rooms, &mut self.bodies, repulsion)?;

        let attachment = SpringParams {
            base_force: self.config.base_attachment_force,
            ..repulsion
        };
        forces::apply_attachment_forces(
            &self.attachments,
            &mut self.bodies,
            attachment,
            self.config.angle_force_coefficient,
        )?;

        let (min, max) = self.bounds();
        let bodies_moved = integrate::apply_velocities(&mut self.bodies, dt, min, max);
        integrate::apply_damping(&mut self.bodies, self.config.decay_per_second, dt);
        let rooms_changed = self.rooms.refresh_all(&mut self.bodies);

        let stats = PhysicsStats {
            repulsion_pushes,
            bodies_moved,
            rooms_changed,
        };
        tracing::trace!(?stats, "physics step");
        Ok(stats)
    }

    /// Verify room filing and that every attachment joins two distinct live bodies
    pub fn check_consistency(&self) -> SimResult<()> {
        self.rooms.check_consistency(&self.bodies)?;
        for (handle, attachment) in self.attachments.iter() {
            let [a, b] = attachment.bodies();
            let reason = if a == b {
                Some("both ends are the same body")
            } else if !self.bodies.contains(a) || !self.bodies.contains(b) {
                Some("references a dead body")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(SimError::MalformedAttachment {
                    attachment: handle.raw(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(PhysicsConfig::default().with_rooms(10, 10, 5.0, 5.0)).unwrap()
    }

    #[test]
    fn test_world_creation() {
        let world = world();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.attachment_count(), 0);
        assert_eq!(world.bounds().1, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PhysicsConfig::default().with_rooms(0, 10, 5.0, 5.0);
        assert!(matches!(
            PhysicsWorld::new(config),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_add_body_files_it() {
        let mut world = world();
        let h = world.add_body(Body::new(Vec2::new(12.0, 3.0), 1.0, 1.0)).unwrap();
        assert_eq!(world.body(h).unwrap().room(), Some((2, 0)));
        assert_eq!(world.rooms().bucket(2, 0), &[h]);
        world.check_consistency().unwrap();
    }

    #[test]
    fn test_invalid_body_rejected() {
        let mut world = world();
        assert!(matches!(
            world.add_body(Body::new(Vec2::new(1.0, 1.0), 0.0, 1.0)),
            Err(SimError::InvalidBody(_))
        ));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_attachment_rules() {
        let mut world = world();
        let a = world.add_body(Body::new(Vec2::new(10.0, 10.0), 1.0, 1.0)).unwrap();
        let b = world.add_body(Body::new(Vec2::new(14.0, 10.0), 1.0, 1.0)).unwrap();

        assert!(matches!(
            world.add_attachment(a, a, AttachmentConfig::default()),
            Err(SimError::SelfAttachment(_))
        ));
        let att = world.add_attachment(a, b, AttachmentConfig::default()).unwrap();
        assert!(matches!(
            world.add_attachment(b, a, AttachmentConfig::default()),
            Err(SimError::DuplicateAttachment(_, _))
        ));
        assert_eq!(world.find_attachment(b, a).unwrap(), Some(att));
    }

    #[test]
    fn test_kill_body_severs_attachments() {
        let mut world = world();
        let a = world.add_body(Body::new(Vec2::new(10.0, 10.0), 1.0, 1.0)).unwrap();
        let b = world.add_body(Body::new(Vec2::new(14.0, 10.0), 1.0, 1.0)).unwrap();
        let c = world.add_body(Body::new(Vec2::new(10.0, 14.0), 1.0, 1.0)).unwrap();
        let ab = world.add_attachment(a, b, AttachmentConfig::default()).unwrap();
        let bc = world.add_attachment(b, c, AttachmentConfig::default()).unwrap();

        world.kill_body(a).unwrap();
        assert!(world.attachment(ab).is_err());
        assert!(world.attachment(bc).is_ok());
        assert_eq!(world.attachment_count(), 1);
        world.check_consistency().unwrap();
        world.step(1.0 / 30.0).unwrap();
    }

    #[test]
    fn test_kill_body_unfiles_only_live_bodies() {
        let mut world = world();
        let a = world.add_body(Body::new(Vec2::new(10.0, 10.0), 1.0, 1.0)).unwrap();
        let b = world.add_body(Body::new(Vec2::new(12.0, 10.0), 1.0, 1.0)).unwrap();
        world.add_attachment(a, b, AttachmentConfig::default()).unwrap();

        world.kill_body(a).unwrap();
        assert_eq!(world.rooms().filed_count(), 1);
        world.check_consistency().unwrap();

        // a stale handle leaves filing and attachments alone
        assert!(world.kill_body(a).is_err());
        assert_eq!(world.rooms().filed_count(), 1);
        assert_eq!(world.body_count(), 1);
        world.check_consistency().unwrap();
    }

    #[test]
    fn test_step_rejects_bad_timestep() {
        let mut world = world();
        assert!(matches!(
            world.step(0.0),
            Err(SimError::InvalidTimestep(_))
        ));
    }

    #[test]
    fn test_step_keeps_rooms_consistent() {
        let mut world = world();
        for i in 0..20 {
            let pos = Vec2::new(4.0 + (i % 5) as f32 * 0.8, 4.0 + (i / 5) as f32 * 0.8);
            world.add_body(Body::new(pos, 1.0, 1.0)).unwrap();
        }
        for _ in 0..60 {
            world.step(1.0 / 30.0).unwrap();
            world.check_consistency().unwrap();
        }
    }
}
