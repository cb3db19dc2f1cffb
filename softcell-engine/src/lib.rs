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
//! # Soft Cell Engine
//!
//! A 2D soft-body simulation of growing multicellular organisms.
//!
//! ## Features
//!
//! - **Generational Arenas**: Fixed-capacity storage with stale-handle detection
//! - **Spatial Partitioning**: Uniform room grid for repulsion broad phase
//! - **Spring Physics**: Repulsion, attachments and angle constraints integrated
//!   with semi-implicit Euler and time-based damping
//! - **Cell Behavior**: Stem cells divide, muscles act on their body and springs,
//!   neurons compute charge from their neighbors
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec2;
//! use softcell_engine::{scene, SimConfig, Simulation};
//!
//! let mut sim = Simulation::init(SimConfig::default()).unwrap();
//! scene::seed_embryo(&mut sim, Vec2::new(50.0, 50.0)).unwrap();
//!
//! for _ in 0..10 {
//!     let report = sim.step(1.0 / 30.0).unwrap();
//!     assert_eq!(report.cells, 1);
//! }
//! sim.check_invariants().unwrap();
//! ```

#![warn(missing_docs)]

/// Generational handles and fixed-capacity arenas
pub mod arena;

/// Tunable simulation constants
pub mod config;

/// Error types
pub mod error;

/// Cells, cell types and their behavior
pub mod logic;

/// Bodies, attachments, spatial partitioning and integration
pub mod physics;

/// Ready-made organisms
pub mod scene;

/// The simulation context tying logic and physics together
pub mod simulation;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use simulation::{Simulation, StepReport};
