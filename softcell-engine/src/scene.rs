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
//! Demo scene
//!
//! A three-cell organism grown from a single root:
//!
//! ```text
//! root (Stem) ──split──> inner (Stem) ── neuron
//! inner       ──split──> muscle ── muscle, both linked to the neuron
//! ```
//!
//! The neuron's charge drives the rest distance between the two muscles.

use crate::arena::Handle;
use crate::error::SimResult;
use crate::logic::{Activation, Cell, CellType, MuscleCell, MuscleRule, NeuronCell, StemCell};
use crate::physics::{AttachmentConfig, Body};
use crate::simulation::Simulation;
use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

/// Mass of the root cell
pub const EMBRYO_MASS: f32 = 4.0;

/// Density of the root cell; children inherit it
pub const EMBRYO_MASS_PER_RADIUS: f32 = 4.0;

/// Register the embryo genome and place its root cell at `position`
pub fn seed_embryo(sim: &mut Simulation, position: Vec2) -> SimResult<Handle<Cell>> {
    // slot 0 links to the neuron, slot 1 to the sibling muscle
    let muscle = sim.add_cell_type(CellType::Muscle(MuscleCell {
        fix_input: None,
        rules: vec![MuscleRule {
            input: 0,
            output: 1,
            weight: 2.0,
        }],
    }))?;
    let neuron = sim.add_cell_type(CellType::Neuron(
        NeuronCell::new(Activation::Sigmoid, -0.5, 0.5)
            .with_input(1, 1.0)
            .with_input(2, 1.0),
    ))?;
    let inner = sim.add_cell_type(CellType::Stem(
        StemCell::new([muscle, muscle])
            .with_passed_attachments(vec![0], vec![0])
            .with_children_angles(FRAC_PI_2, -FRAC_PI_2)
            .with_child_attachment(AttachmentConfig::new(0.5, 1.0)),
    ))?;
    let root = sim.add_cell_type(CellType::Stem(
        StemCell::new([inner, neuron])
            .with_child0_amount(0.6)
            .with_child_attachment(AttachmentConfig::new(0.2, 1.0).with_delta_angle(0.0)),
    ))?;

    let cell = sim.add_cell(
        root,
        Body::new(position, EMBRYO_MASS, EMBRYO_MASS_PER_RADIUS),
    )?;
    tracing::debug!(%cell, x = position.x, y = position.y, "embryo seeded");
    Ok(cell)
}
