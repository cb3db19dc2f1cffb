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
//! Simulation configuration
//!
//! All tuned constants of the simulation live here. The defaults reproduce
//! the reference tuning; none of the force constants has a physical
//! derivation, they are simply the values the simulation was balanced with.
//!
//! Both structs deserialize with `#[serde(default)]`, so a host may supply
//! only the options it wants to override.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the physics world and its room grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Number of rooms along x
    pub rooms_x: usize,
    /// Number of rooms along y
    pub rooms_y: usize,
    /// Width of one room in world units
    pub room_width: f32,
    /// Height of one room in world units
    pub room_height: f32,
    /// Repulsion force per unit of overlap
    pub base_repulsion_force: f32,
    /// Attachment force per unit of stretch at strength 1
    pub base_attachment_force: f32,
    /// Angular correction per radian of angle error
    pub angle_force_coefficient: f32,
    /// Fraction of velocity left after one second
    pub decay_per_second: f32,
    /// Center distance below which the spring direction falls back to +x
    pub separation_epsilon: f32,
    /// Capacity of the body arena
    pub max_bodies: usize,
    /// Capacity of the attachment arena
    pub max_attachments: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            rooms_x: 50,
            rooms_y: 50,
            room_width: 5.0,
            room_height: 5.0,
            base_repulsion_force: 2.0,
            base_attachment_force: 10.0,
            angle_force_coefficient: 5.0,
            decay_per_second: 0.3,
            separation_epsilon: 0.1,
            max_bodies: 1024,
            max_attachments: 4096,
        }
    }
}

impl PhysicsConfig {
    /// Width of the simulated plane
    pub fn world_width(&self) -> f32 {
        self.room_width * self.rooms_x as f32
    }

    /// Height of the simulated plane
    pub fn world_height(&self) -> f32 {
        self.room_height * self.rooms_y as f32
    }

    /// Set the grid layout
    pub fn with_rooms(mut self, rooms_x: usize, rooms_y: usize, width: f32, height: f32) -> Self {
        self.rooms_x = rooms_x;
        self.rooms_y = rooms_y;
        self.room_width = width;
        self.room_height = height;
        self
    }

    /// Set the arena capacities
    pub fn with_capacities(mut self, max_bodies: usize, max_attachments: usize) -> Self {
        self.max_bodies = max_bodies;
        self.max_attachments = max_attachments;
        self
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rooms_x == 0 || self.rooms_y == 0 {
            return Err(ConfigError::Invalid("room counts must be non-zero"));
        }
        if !(self.room_width > 0.0 && self.room_width.is_finite())
            || !(self.room_height > 0.0 && self.room_height.is_finite())
        {
            return Err(ConfigError::Invalid(
                "room dimensions must be positive and finite",
            ));
        }
        if self.base_repulsion_force < 0.0
            || self.base_attachment_force < 0.0
            || self.angle_force_coefficient < 0.0
        {
            return Err(ConfigError::Invalid("force constants must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.decay_per_second) {
            return Err(ConfigError::Invalid("decay_per_second must be in [0, 1]"));
        }
        if !(self.separation_epsilon > 0.0) {
            return Err(ConfigError::Invalid("separation_epsilon must be positive"));
        }
        if self.max_bodies == 0 || self.max_attachments == 0 {
            return Err(ConfigError::Invalid("arena capacities must be non-zero"));
        }
        Ok(())
    }
}

/// Configuration for the cell behavior layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicConfig {
    /// Seconds a stem cell must live before it may split
    pub split_cooldown: f32,
    /// World-wide floor on the parent mass needed to split
    ///
    /// A stem cell splits only above the larger of this value and its own
    /// `min_split_mass`.
    pub min_split_mass: f32,
    /// Spawn offset of a child, as a fraction of its radius
    pub spawn_offset_factor: f32,
    /// Seconds between two evaluations of a neuron
    pub neuron_update_interval: f32,
    /// Charge above which a muscle's fix input pins its body
    pub muscle_fix_threshold: f32,
    /// Capacity of the cell arena
    pub max_cells: usize,
    /// Capacity of the cell type arena
    pub max_cell_types: usize,
}

impl Default for LogicConfig {
    fn default() -> Self {
        LogicConfig {
            split_cooldown: 3.0,
            min_split_mass: 0.0,
            spawn_offset_factor: 0.1,
            neuron_update_interval: 1.0,
            muscle_fix_threshold: 0.5,
            max_cells: 500,
            max_cell_types: 64,
        }
    }
}

impl LogicConfig {
    /// Set the split timing
    pub fn with_split(mut self, cooldown: f32, min_mass: f32) -> Self {
        self.split_cooldown = cooldown;
        self.min_split_mass = min_mass;
        self
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.split_cooldown >= 0.0 && self.split_cooldown.is_finite()) {
            return Err(ConfigError::Invalid(
                "split_cooldown must be non-negative and finite",
            ));
        }
        if !(self.min_split_mass >= 0.0) {
            return Err(ConfigError::Invalid("min_split_mass must be non-negative"));
        }
        if !(self.spawn_offset_factor >= 0.0) {
            return Err(ConfigError::Invalid(
                "spawn_offset_factor must be non-negative",
            ));
        }
        if !(self.neuron_update_interval > 0.0) {
            return Err(ConfigError::Invalid(
                "neuron_update_interval must be positive",
            ));
        }
        if self.max_cells == 0 || self.max_cell_types == 0 {
            return Err(ConfigError::Invalid("arena capacities must be non-zero"));
        }
        Ok(())
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Physics world settings
    pub physics: PhysicsConfig,
    /// Cell behavior settings
    pub logic: LogicConfig,
}

impl SimConfig {
    /// Validate both halves of the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.logic.validate()
    }
}
