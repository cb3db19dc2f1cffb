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
//! The simulation context
//!
//! [`Simulation`] owns the physics and logic layers and runs one tick as a
//! logic pass followed by a physics step. Renderers read the world back
//! through the view iterators between ticks.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use softcell_engine::config::SimConfig;
//! use softcell_engine::logic::{CellType, MuscleCell};
//! use softcell_engine::physics::Body;
//! use softcell_engine::Simulation;
//!
//! let mut sim = Simulation::init(SimConfig::default()).unwrap();
//! let muscle = sim.add_cell_type(CellType::Muscle(MuscleCell::default())).unwrap();
//! sim.add_cell(muscle, Body::new(Vec2::new(20.0, 20.0), 1.0, 1.0)).unwrap();
//!
//! let report = sim.step(1.0 / 30.0).unwrap();
//! assert_eq!(report.tick, 1);
//! assert_eq!(report.cells, 1);
//! assert_eq!(sim.cells().count(), 1);
//! ```

use crate::arena::Handle;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::logic::{Cell, CellKind, CellType, LogicWorld};
use crate::physics::{integrate, Attachment, AttachmentConfig, Body, PhysicsWorld};
use glam::Vec2;

/// Summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Number of ticks run so far, this one included
    pub tick: u64,
    /// Stem cells that split during the tick
    pub splits: usize,
    /// Live cells after the tick
    pub cells: usize,
    /// Live bodies after the tick
    pub bodies: usize,
    /// Live attachments after the tick
    pub attachments: usize,
}

/// What a renderer needs to draw a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    /// Body handle
    pub handle: Handle<Body>,
    /// Center
    pub position: Vec2,
    /// Orientation in radians
    pub angle: f32,
    /// Radius
    pub radius: f32,
    /// Whether the body is pinned
    pub fixed: bool,
}

/// What a renderer needs to draw an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentView {
    /// Attachment handle
    pub handle: Handle<Attachment>,
    /// Centers of the two bodies
    pub ends: [Vec2; 2],
    /// Spring parameters
    pub config: AttachmentConfig,
}

/// What a renderer needs to draw a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView {
    /// Cell handle
    pub handle: Handle<Cell>,
    /// Body of the cell
    pub body: Handle<Body>,
    /// Type tag, whose ordinal selects the texture row
    pub kind: CellKind,
    /// Current charge
    pub charge: f32,
}

/// Physics and logic layers advanced together
pub struct Simulation {
    physics: PhysicsWorld,
    logic: LogicWorld,
    tick: u64,
}

impl Simulation {
    /// Create an empty simulation
    pub fn init(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        tracing::debug!(
            rooms_x = config.physics.rooms_x,
            rooms_y = config.physics.rooms_y,
            max_cells = config.logic.max_cells,
            "simulation initialized"
        );
        Ok(Simulation {
            physics: PhysicsWorld::new(config.physics)?,
            logic: LogicWorld::new(config.logic)?,
            tick: 0,
        })
    }

    /// Run one tick: the logic pass, then the physics step
    pub fn step(&mut self, dt: f32) -> SimResult<StepReport> {
        integrate::validate_timestep(dt)?;
        let logic = self.logic.run(&mut self.physics, dt)?;
        self.physics.advance(dt)?;
        self.tick += 1;

        let report = StepReport {
            tick: self.tick,
            splits: logic.splits,
            cells: self.logic.cell_count(),
            bodies: self.physics.body_count(),
            attachments: self.physics.attachment_count(),
        };
        tracing::trace!(?report, "tick");
        Ok(report)
    }

    /// Ticks run so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Physics layer
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Logic layer
    pub fn logic(&self) -> &LogicWorld {
        &self.logic
    }

    /// Both layers mutably, for operations not wrapped here
    pub fn layers_mut(&mut self) -> (&mut LogicWorld, &mut PhysicsWorld) {
        (&mut self.logic, &mut self.physics)
    }

    /// Register a cell type
    pub fn add_cell_type(&mut self, cell_type: CellType) -> SimResult<Handle<CellType>> {
        self.logic.add_cell_type(cell_type)
    }

    /// Create a cell and its body
    pub fn add_cell(&mut self, cell_type: Handle<CellType>, body: Body) -> SimResult<Handle<Cell>> {
        self.logic.add_cell(&mut self.physics, cell_type, body)
    }

    /// Link two cells
    pub fn attach(
        &mut self,
        a: Handle<Cell>,
        b: Handle<Cell>,
        config: AttachmentConfig,
    ) -> SimResult<(usize, usize)> {
        self.logic.attach(&mut self.physics, a, b, config)
    }

    /// Sever the link at `index` of `cell`
    pub fn detach(&mut self, cell: Handle<Cell>, index: usize) -> SimResult<bool> {
        self.logic.detach(&mut self.physics, cell, index)
    }

    /// Kill a cell with its links and body
    pub fn kill_cell(&mut self, cell: Handle<Cell>) -> SimResult<()> {
        self.logic.kill_cell(&mut self.physics, cell)
    }

    /// Live bodies in slot order
    pub fn bodies(&self) -> impl Iterator<Item = BodyView> + '_ {
        self.physics.bodies().map(|(handle, body)| BodyView {
            handle,
            position: body.position,
            angle: body.angle,
            radius: body.radius(),
            fixed: body.fixed,
        })
    }

    /// Live attachments in slot order
    ///
    /// Attachments always join live bodies between ticks; one that does not
    /// is skipped here and reported by [`check_invariants`](Self::check_invariants).
    pub fn attachments(&self) -> impl Iterator<Item = AttachmentView> + '_ {
        self.physics.attachments().filter_map(|(handle, attachment)| {
            let [a, b] = attachment.bodies();
            let a = self.physics.body(a).ok()?;
            let b = self.physics.body(b).ok()?;
            Some(AttachmentView {
                handle,
                ends: [a.position, b.position],
                config: attachment.config,
            })
        })
    }

    /// Live cells in slot order
    pub fn cells(&self) -> impl Iterator<Item = CellView> + '_ {
        self.logic.iter().filter_map(|(handle, cell)| {
            let kind = self.logic.cell_type(cell.cell_type()).ok()?.kind();
            Some(CellView {
                handle,
                body: cell.body(),
                kind,
                charge: cell.charge,
            })
        })
    }

    /// Verify room filing, attachment endpoints, link mirroring and that
    /// every cell owns a distinct live body
    pub fn check_invariants(&self) -> SimResult<()> {
        self.physics.check_consistency()?;
        self.logic.check_mirror_invariant(&self.physics)?;
        let mut owned = Vec::with_capacity(self.logic.cell_count());
        for (_, cell) in self.logic.iter() {
            self.physics.body(cell.body())?;
            owned.push(cell.body());
        }
        owned.sort();
        if let Some(pair) = owned.windows(2).find(|pair| pair[0] == pair[1]) {
            tracing::error!(body = %pair[0], "body shared between cells");
            return Err(SimError::InvalidBody("body is owned by more than one cell"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{MuscleCell, StemCell};

    #[test]
    fn test_step_reports_and_counts_ticks() {
        let mut sim = Simulation::init(SimConfig::default()).unwrap();
        let report = sim.step(0.1).unwrap();
        assert_eq!(report, StepReport { tick: 1, ..Default::default() });
        sim.step(0.1).unwrap();
        assert_eq!(sim.tick(), 2);
    }

    #[test]
    fn test_invalid_timestep_leaves_state_untouched() {
        let mut sim = Simulation::init(SimConfig::default()).unwrap();
        assert_eq!(sim.step(-1.0), Err(SimError::InvalidTimestep(-1.0)));
        assert_eq!(sim.tick(), 0);
    }

    #[derive(Clone, Default)]
    struct SharedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_large_timestep_warns_once_per_tick() {
        let log = SharedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut sim = Simulation::init(SimConfig::default()).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            sim.step(2.0).unwrap();
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("timestep is large").count(), 1, "{output}");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SimConfig::default();
        config.physics.room_width = 0.0;
        assert!(matches!(Simulation::init(config), Err(SimError::Config(_))));
    }

    #[test]
    fn test_views_follow_the_world() {
        let mut sim = Simulation::init(SimConfig::default()).unwrap();
        let muscle = sim
            .add_cell_type(CellType::Muscle(MuscleCell::default()))
            .unwrap();
        let stem = sim
            .add_cell_type(CellType::Stem(StemCell::new([muscle, muscle])))
            .unwrap();
        let a = sim
            .add_cell(stem, Body::new(Vec2::new(10.0, 10.0), 2.0, 2.0))
            .unwrap();
        let b = sim
            .add_cell(muscle, Body::new(Vec2::new(14.0, 10.0), 1.0, 1.0))
            .unwrap();
        sim.attach(a, b, AttachmentConfig::new(1.0, 1.0)).unwrap();

        let cells: Vec<_> = sim.cells().collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].handle, a);
        assert_eq!(cells[0].kind.ordinal(), 0);
        assert_eq!(cells[1].kind, CellKind::Muscle);

        let bodies: Vec<_> = sim.bodies().collect();
        assert_eq!(bodies[0].radius, 1.0);
        let attachments: Vec<_> = sim.attachments().collect();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].ends, [bodies[0].position, bodies[1].position]);
        sim.check_invariants().unwrap();

        sim.kill_cell(b).unwrap();
        assert_eq!(sim.attachments().count(), 0);
        assert_eq!(sim.bodies().count(), 1);
        sim.check_invariants().unwrap();
    }
}
