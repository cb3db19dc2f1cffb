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
//! Cell behavior layer
//!
//! Cells sit on top of physics bodies. Every cell owns exactly one body, and
//! every logical link between two cells is backed by one physical
//! attachment. Links are mirrored: if cell `A` holds `(B, X)` in its slots,
//! `B` holds exactly one `(A, X)`.
//!
//! # Update order
//!
//! [`LogicWorld::update`] visits the cells that were live when the pass
//! started, in slot order. Children created by a split during the pass are
//! not visited until the next tick, and cells killed during the pass are
//! skipped.

mod behavior;
mod cell;
mod cell_type;

pub use cell::{AttachmentSlots, Cell, LogicAttachment};
pub use cell_type::{
    Activation, CellKind, CellType, MuscleCell, MuscleRule, NeuronCell, NeuronInput, StemCell,
};

use crate::arena::{Arena, Handle};
use crate::config::LogicConfig;
use crate::error::{ArenaError, SimError, SimResult};
use crate::physics::{integrate, AttachmentConfig, Body, PhysicsWorld};

/// Counters gathered during one logic pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicStats {
    /// Cells visited
    pub cells_visited: usize,
    /// Stem cells that split
    pub splits: usize,
    /// Neurons whose charge was recomputed
    pub neuron_evaluations: usize,
}

/// Owner of all cells and cell types
pub struct LogicWorld {
    config: LogicConfig,
    cells: Arena<Cell>,
    cell_types: Arena<CellType>,
}

impl LogicWorld {
    /// Create an empty logic layer after validating the configuration
    pub fn new(config: LogicConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(LogicWorld {
            cells: Arena::new("cells", config.max_cells),
            cell_types: Arena::new("cell types", config.max_cell_types),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &LogicConfig {
        &self.config
    }

    /// Register a cell type
    ///
    /// Stem children must already be registered, so genomes are built leaves
    /// first. Types are never removed during a run.
    pub fn add_cell_type(&mut self, cell_type: CellType) -> SimResult<Handle<CellType>> {
        cell_type.validate()?;
        if let CellType::Stem(stem) = &cell_type {
            for child in stem.children_types {
                self.cell_types.get(child)?;
            }
        }
        let kind = cell_type.kind();
        let handle = self.cell_types.add(cell_type)?;
        tracing::debug!(cell_type = %handle, ?kind, "cell type registered");
        Ok(handle)
    }

    /// Get a cell type
    pub fn cell_type(&self, handle: Handle<CellType>) -> SimResult<&CellType> {
        Ok(self.cell_types.get(handle)?)
    }

    /// Number of registered cell types
    pub fn cell_type_count(&self) -> usize {
        self.cell_types.len()
    }

    /// Create a cell of `cell_type` living in `body`
    pub fn add_cell(
        &mut self,
        physics: &mut PhysicsWorld,
        cell_type: Handle<CellType>,
        body: Body,
    ) -> SimResult<Handle<Cell>> {
        self.cell_types.get(cell_type)?;
        if self.cells.len() >= self.cells.capacity() {
            return Err(ArenaError::Full {
                name: self.cells.name(),
                capacity: self.cells.capacity(),
            }
            .into());
        }
        let body = physics.add_body(body)?;
        let handle = self.cells.add(Cell::new(cell_type, body))?;
        behavior::on_create(&mut self.cells, &self.cell_types, handle)?;
        tracing::debug!(cell = %handle, %body, "cell added");
        Ok(handle)
    }

    /// Get a cell
    pub fn cell(&self, handle: Handle<Cell>) -> SimResult<&Cell> {
        Ok(self.cells.get(handle)?)
    }

    /// Get a cell mutably, e.g. to inject charge
    pub fn cell_mut(&mut self, handle: Handle<Cell>) -> SimResult<&mut Cell> {
        Ok(self.cells.get_mut(handle)?)
    }

    /// Iterate over live cells in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<Cell>, &Cell)> + '_ {
        self.cells.iter()
    }

    /// Number of live cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Link two cells with an attachment between their bodies
    ///
    /// Each cell records the link at its lowest free index; the indices on
    /// `a` and `b` are returned.
    pub fn attach(
        &mut self,
        physics: &mut PhysicsWorld,
        a: Handle<Cell>,
        b: Handle<Cell>,
        config: AttachmentConfig,
    ) -> SimResult<(usize, usize)> {
        behavior::link(&mut self.cells, physics, a, b, config)
    }

    /// Sever the link at `index` of `cell` along with its mirror
    ///
    /// Returns `false` if the slot is empty.
    pub fn detach(
        &mut self,
        physics: &mut PhysicsWorld,
        cell: Handle<Cell>,
        index: usize,
    ) -> SimResult<bool> {
        behavior::unlink(&mut self.cells, physics, cell, index)
    }

    /// Kill a cell, its links and its body
    pub fn kill_cell(&mut self, physics: &mut PhysicsWorld, handle: Handle<Cell>) -> SimResult<()> {
        behavior::kill(&mut self.cells, physics, handle)?;
        Ok(())
    }

    /// Run one behavior pass
    pub fn update(&mut self, physics: &mut PhysicsWorld, dt: f32) -> SimResult<LogicStats> {
        integrate::validate_timestep(dt)?;
        self.run(physics, dt)
    }

    /// Behavior pass with an already validated `dt`
    pub(crate) fn run(&mut self, physics: &mut PhysicsWorld, dt: f32) -> SimResult<LogicStats> {
        let mut stats = LogicStats::default();

        for handle in self.cells.handles() {
            if !self.cells.contains(handle) {
                continue;
            }
            stats.cells_visited += 1;
            let cell = self.cells.get_mut(handle)?;
            cell.life_time += dt;
            let type_handle = cell.cell_type();

            match self.cell_types.get(type_handle)? {
                CellType::Stem(stem) => {
                    let cell = self.cells.get(handle)?;
                    let body = physics.body(cell.body())?;
                    if behavior::ready_to_split(cell, body, stem, &self.config) {
                        behavior::split(
                            &mut self.cells,
                            &self.cell_types,
                            physics,
                            &self.config,
                            handle,
                            stem,
                        )?;
                        stats.splits += 1;
                    }
                }
                CellType::Muscle(muscle) => {
                    behavior::actuate(&self.cells, physics, &self.config, handle, muscle)?;
                }
                CellType::Neuron(neuron) => {
                    if behavior::think(&mut self.cells, physics, &self.config, handle, neuron, dt)? {
                        stats.neuron_evaluations += 1;
                    }
                }
            }
        }

        tracing::trace!(?stats, "logic pass");
        Ok(stats)
    }

    /// Verify that every link is mirrored exactly once and backed by a live
    /// attachment joining the two bodies
    pub fn check_mirror_invariant(&self, physics: &PhysicsWorld) -> SimResult<()> {
        for (handle, cell) in self.cells.iter() {
            for (_, link) in cell.attachments().iter() {
                let partner = self.cells.get(link.cell)?;
                let mirrors = partner
                    .attachments()
                    .positions(|m| m.cell == handle && m.attachment == link.attachment)
                    .len();
                let to_partner = cell
                    .attachments()
                    .positions(|l| l.cell == link.cell)
                    .len();
                if mirrors != 1 || to_partner != 1 {
                    tracing::error!(cell = %handle, partner = %link.cell, mirrors, "broken mirror");
                    return Err(SimError::MirrorViolation {
                        cell: handle.raw(),
                        partner: link.cell.raw(),
                        found: mirrors,
                    });
                }

                let attachment = physics.attachment(link.attachment)?;
                if !attachment.connects(cell.body(), partner.body()) {
                    return Err(SimError::MalformedAttachment {
                        attachment: link.attachment.raw(),
                        reason: "does not join the bodies of the linked cells",
                    });
                }
            }
        }
        Ok(())
    }
}
