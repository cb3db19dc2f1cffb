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
//! Uniform room grid
//!
//! The plane `[0, room_width * rooms_x) x [0, room_height * rooms_y)` is cut
//! into equally sized rooms. Every live body is listed in exactly one room,
//! the one its center lies in, and records that room's coordinates itself.
//! Positions outside the grid are clamped onto the border rooms, so room
//! coordinates are never negative and never out of range.
//!
//! # Broad phase
//!
//! Repulsion only needs to look at the body's own room, plus the adjacent
//! room on every side where the body's surface reaches past the room edge.
//! See [`RoomGrid::reached_neighbors`].

use super::body::Body;
use crate::arena::{Arena, Handle};
use crate::config::PhysicsConfig;
use crate::error::{SimError, SimResult};
use glam::Vec2;

/// Axis direction from a room to one of its four neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards smaller x
    NegX,
    /// Towards bigger x
    PosX,
    /// Towards smaller y
    NegY,
    /// Towards bigger y
    PosY,
}

impl Direction {
    /// All four directions, in evaluation order
    pub const ALL: [Direction; 4] = [
        Direction::NegX,
        Direction::PosX,
        Direction::NegY,
        Direction::PosY,
    ];
}

/// Spatial partition holding non-owning body handles
pub struct RoomGrid {
    rooms_x: usize,
    rooms_y: usize,
    room_width: f32,
    room_height: f32,
    buckets: Vec<Vec<Handle<Body>>>,
}

impl RoomGrid {
    /// Create an empty grid
    ///
    /// # Panics
    ///
    /// Panics if a room count is zero or a room dimension is not positive
    pub fn new(rooms_x: usize, rooms_y: usize, room_width: f32, room_height: f32) -> Self {
        assert!(
            rooms_x > 0 && rooms_y > 0,
            "Room counts must be non-zero"
        );
        assert!(
            room_width > 0.0 && room_height > 0.0,
            "Room dimensions must be positive"
        );
        RoomGrid {
            rooms_x,
            rooms_y,
            room_width,
            room_height,
            buckets: vec![Vec::new(); rooms_x * rooms_y],
        }
    }

    /// Create a grid with the layout of a physics configuration
    pub fn from_config(config: &PhysicsConfig) -> Self {
        RoomGrid::new(
            config.rooms_x,
            config.rooms_y,
            config.room_width,
            config.room_height,
        )
    }

    /// Number of rooms along x and y
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rooms_x, self.rooms_y)
    }

    /// Size of one room
    pub fn room_size(&self) -> Vec2 {
        Vec2::new(self.room_width, self.room_height)
    }

    /// Room containing `position`, clamped onto the grid
    pub fn room_of(&self, position: Vec2) -> (usize, usize) {
        (
            clamp_cell(position.x / self.room_width, self.rooms_x),
            clamp_cell(position.y / self.room_height, self.rooms_y),
        )
    }

    /// Bodies listed in the room `(cx, cy)`
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid
    pub fn bucket(&self, cx: usize, cy: usize) -> &[Handle<Body>] {
        &self.buckets[self.bucket_index(cx, cy)]
    }

    /// Total number of filed handles
    pub fn filed_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Neighbor of a room in the given direction, `None` at the world edge
    pub fn neighbor(&self, room: (usize, usize), dir: Direction) -> Option<(usize, usize)> {
        let (cx, cy) = room;
        match dir {
            Direction::NegX => cx.checked_sub(1).map(|x| (x, cy)),
            Direction::PosX => (cx + 1 < self.rooms_x).then_some((cx + 1, cy)),
            Direction::NegY => cy.checked_sub(1).map(|y| (cx, y)),
            Direction::PosY => (cy + 1 < self.rooms_y).then_some((cx, cy + 1)),
        }
    }

    /// Neighbor rooms that `body`, filed in `room`, reaches into
    ///
    /// A direction qualifies when the body's surface (center plus or minus its
    /// radius) crosses the room edge on that side and a room exists there.
    pub fn reached_neighbors(&self, room: (usize, usize), body: &Body) -> [Option<(usize, usize)>; 4] {
        let radius = body.radius();
        let left = room.0 as f32 * self.room_width;
        let bottom = room.1 as f32 * self.room_height;
        let right = left + self.room_width;
        let top = bottom + self.room_height;

        Direction::ALL.map(|dir| {
            let crosses = match dir {
                Direction::NegX => body.position.x - radius < left,
                Direction::PosX => body.position.x + radius > right,
                Direction::NegY => body.position.y - radius < bottom,
                Direction::PosY => body.position.y + radius > top,
            };
            if crosses {
                self.neighbor(room, dir)
            } else {
                None
            }
        })
    }

    /// Re-file a body after it moved
    ///
    /// Does nothing if the body is already filed in the right room. Otherwise
    /// it is swap-removed from its old room (if any) and appended to the new
    /// one. Returns whether the body changed rooms.
    pub fn update_room(&mut self, handle: Handle<Body>, body: &mut Body) -> bool {
        let room = self.room_of(body.position);
        if body.room() == Some(room) {
            return false;
        }

        if let Some(old) = body.room() {
            self.unlist(handle, old);
        }
        let index = self.bucket_index(room.0, room.1);
        self.buckets[index].push(handle);
        body.set_room(Some(room));
        true
    }

    /// Remove a body from the grid before it is killed
    pub fn remove(&mut self, handle: Handle<Body>, body: &mut Body) {
        if let Some(old) = body.room() {
            self.unlist(handle, old);
        }
        body.set_room(None);
    }

    /// Re-file every live body; returns how many changed rooms
    pub fn refresh_all(&mut self, bodies: &mut Arena<Body>) -> usize {
        let mut moved = 0;
        for (handle, body) in bodies.iter_mut() {
            if self.update_room(handle, body) {
                moved += 1;
            }
        }
        moved
    }

    /// Verify that every live body is filed exactly once, in the right room
    pub fn check_consistency(&self, bodies: &Arena<Body>) -> SimResult<()> {
        for cy in 0..self.rooms_y {
            for cx in 0..self.rooms_x {
                for &handle in self.bucket(cx, cy) {
                    let body = bodies.get(handle)?;
                    if body.room() != Some((cx, cy)) {
                        return Err(SimError::RoomMismatch {
                            body: handle.raw(),
                            filed: body.room(),
                            expected: (cx, cy),
                        });
                    }
                }
            }
        }

        for (handle, body) in bodies.iter() {
            let expected = self.room_of(body.position);
            let listed = self
                .bucket(expected.0, expected.1)
                .iter()
                .filter(|&&h| h == handle)
                .count();
            if body.room() != Some(expected) || listed != 1 {
                return Err(SimError::RoomMismatch {
                    body: handle.raw(),
                    filed: body.room(),
                    expected,
                });
            }
        }
        Ok(())
    }

    fn unlist(&mut self, handle: Handle<Body>, room: (usize, usize)) {
        let index = self.bucket_index(room.0, room.1);
        let bucket = &mut self.buckets[index];
        if let Some(pos) = bucket.iter().position(|&h| h == handle) {
            bucket.swap_remove(pos);
        }
    }

    fn bucket_index(&self, cx: usize, cy: usize) -> usize {
        assert!(cx < self.rooms_x && cy < self.rooms_y, "Room out of grid");
        cy * self.rooms_x + cx
    }
}

fn clamp_cell(scaled: f32, count: usize) -> usize {
    // `as` saturates, and NaN becomes 0
    let cell = scaled.floor() as i64;
    cell.clamp(0, count as i64 - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> RoomGrid {
        RoomGrid::new(4, 3, 5.0, 5.0)
    }

    #[test]
    fn test_room_of_clamps() {
        let grid = grid();
        assert_eq!(grid.room_of(Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(grid.room_of(Vec2::new(7.5, 12.0)), (1, 2));
        assert_eq!(grid.room_of(Vec2::new(-3.0, -100.0)), (0, 0));
        assert_eq!(grid.room_of(Vec2::new(20.0, 15.0)), (3, 2));
        assert_eq!(grid.room_of(Vec2::new(1e9, 1e9)), (3, 2));
        assert_eq!(grid.room_of(Vec2::new(f32::NAN, 2.0)), (0, 0));
    }

    #[test]
    fn test_neighbors_at_edges() {
        let grid = grid();
        assert_eq!(grid.neighbor((0, 0), Direction::NegX), None);
        assert_eq!(grid.neighbor((0, 0), Direction::NegY), None);
        assert_eq!(grid.neighbor((0, 0), Direction::PosX), Some((1, 0)));
        assert_eq!(grid.neighbor((3, 2), Direction::PosX), None);
        assert_eq!(grid.neighbor((3, 2), Direction::PosY), None);
        assert_eq!(grid.neighbor((3, 2), Direction::NegY), Some((3, 1)));
    }

    #[test]
    fn test_update_room_moves_bucket() {
        let mut grid = grid();
        let mut bodies = Arena::new("bodies", 4);
        let h = bodies.add(Body::new(Vec2::new(1.0, 1.0), 1.0, 1.0)).unwrap();

        let body = bodies.get_mut(h).unwrap();
        assert!(grid.update_room(h, body));
        assert_eq!(body.room(), Some((0, 0)));
        assert!(!grid.update_room(h, body), "unchanged room is a no-op");

        body.position = Vec2::new(11.0, 6.0);
        assert!(grid.update_room(h, body));
        assert_eq!(body.room(), Some((2, 1)));
        assert!(grid.bucket(0, 0).is_empty());
        assert_eq!(grid.bucket(2, 1), &[h]);
        grid.check_consistency(&bodies).unwrap();
    }

    #[test]
    fn test_swap_remove_keeps_others() {
        let mut grid = grid();
        let mut bodies = Arena::new("bodies", 4);
        let handles: Vec<_> = (0..3)
            .map(|i| bodies.add(Body::new(Vec2::new(1.0 + i as f32, 1.0), 1.0, 1.0)).unwrap())
            .collect();
        grid.refresh_all(&mut bodies);
        assert_eq!(grid.bucket(0, 0).len(), 3);

        let body = bodies.get_mut(handles[0]).unwrap();
        grid.remove(handles[0], body);
        assert_eq!(grid.bucket(0, 0).len(), 2);
        assert!(grid.bucket(0, 0).contains(&handles[1]));
        assert!(grid.bucket(0, 0).contains(&handles[2]));
    }

    #[test]
    fn test_refresh_all_consistency() {
        let mut grid = grid();
        let mut bodies = Arena::new("bodies", 16);
        for i in 0..12 {
            let pos = Vec2::new(i as f32 * 1.7, i as f32 * 1.3);
            bodies.add(Body::new(pos, 1.0, 2.0)).unwrap();
        }
        assert_eq!(grid.refresh_all(&mut bodies), 12);
        grid.check_consistency(&bodies).unwrap();

        for (_, body) in bodies.iter_mut() {
            body.position = Vec2::new(19.0 - body.position.x, 14.0 - body.position.y);
        }
        grid.refresh_all(&mut bodies);
        grid.check_consistency(&bodies).unwrap();
        assert_eq!(grid.filed_count(), 12);
    }

    #[test]
    fn test_stale_filing_detected() {
        let mut grid = grid();
        let mut bodies = Arena::new("bodies", 4);
        let h = bodies.add(Body::new(Vec2::new(1.0, 1.0), 1.0, 1.0)).unwrap();
        grid.refresh_all(&mut bodies);
        bodies.get_mut(h).unwrap().position = Vec2::new(12.0, 1.0);
        assert!(matches!(
            grid.check_consistency(&bodies),
            Err(SimError::RoomMismatch { .. })
        ));
    }

    #[test]
    fn test_reached_neighbors() {
        let grid = grid();
        // radius 1 body near the right edge of room (1, 1)
        let body = Body::new(Vec2::new(9.5, 7.5), 1.0, 1.0);
        let reached = grid.reached_neighbors((1, 1), &body);
        assert_eq!(reached, [None, Some((2, 1)), None, None]);

        // body in the corner room reaching past the world edge
        let corner = Body::new(Vec2::new(0.5, 0.5), 1.0, 1.0);
        assert_eq!(grid.reached_neighbors((0, 0), &corner), [None; 4]);

        // large body reaching every side
        let big = Body::new(Vec2::new(7.5, 7.5), 4.0, 1.0);
        assert_eq!(
            grid.reached_neighbors((1, 1), &big),
            [Some((0, 1)), Some((2, 1)), Some((1, 0)), Some((1, 2))]
        );
    }
}
