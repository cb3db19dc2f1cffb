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
//! Grow the demo embryo headless and log what happens
//!
//! Run with `RUST_LOG=softcell_engine=debug` to see splits and links.

use glam::Vec2;
use softcell_engine::{scene, SimConfig, SimResult, Simulation};
use tracing_subscriber::EnvFilter;

const TICKS: usize = 600;
const DT: f32 = 1.0 / 30.0;

fn main() -> SimResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut sim = Simulation::init(SimConfig::default())?;
    scene::seed_embryo(&mut sim, Vec2::new(50.0, 50.0))?;

    for _ in 0..TICKS {
        let report = sim.step(DT)?;
        if report.splits > 0 || report.tick % 60 == 0 {
            tracing::info!(
                tick = report.tick,
                splits = report.splits,
                cells = report.cells,
                bodies = report.bodies,
                attachments = report.attachments,
                "step"
            );
        }
    }
    sim.check_invariants()?;

    for cell in sim.cells() {
        let body = sim.physics().body(cell.body)?;
        tracing::info!(
            cell = %cell.handle,
            kind = ?cell.kind,
            charge = cell.charge,
            x = body.position.x,
            y = body.position.y,
            "final cell"
        );
    }
    Ok(())
}
