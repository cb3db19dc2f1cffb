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
//! Benchmarks for the simulation tick
//!
//! These benchmarks measure:
//! - Physics step cost as the number of overlapping bodies grows
//! - Arena insert/kill churn with slot reuse
//! - A full tick of a chain of linked muscle cells

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::Vec2;
use softcell_engine::arena::Arena;
use softcell_engine::config::PhysicsConfig;
use softcell_engine::logic::{CellType, MuscleCell};
use softcell_engine::physics::{AttachmentConfig, Body, PhysicsWorld};
use softcell_engine::{SimConfig, Simulation};

/// Bodies packed on a jittered lattice so that neighbors overlap
fn packed_world(count: usize) -> PhysicsWorld {
    let config = PhysicsConfig::default().with_capacities(count, count);
    let mut world = PhysicsWorld::new(config).unwrap();
    let side = (count as f32).sqrt().ceil() as usize;
    for i in 0..count {
        let x = 10.0 + (i % side) as f32 * 1.6 + (i % 3) as f32 * 0.1;
        let y = 10.0 + (i / side) as f32 * 1.6;
        world.add_body(Body::new(Vec2::new(x, y), 1.0, 1.0)).unwrap();
    }
    world
}

/// Benchmark: one physics step with N bodies
fn bench_physics_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("physics_step");

    for count in [100, 500, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut world = packed_world(count);
            b.iter(|| {
                black_box(world.step(1.0 / 30.0).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark: kill every other value and refill the holes
fn bench_arena_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_churn");

    for count in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut arena = Arena::new("bench", count);
            for i in 0..count {
                arena.add(i).unwrap();
            }
            b.iter(|| {
                let handles = arena.handles();
                for handle in handles.iter().step_by(2) {
                    arena.kill(*handle).unwrap();
                }
                for i in 0..(handles.len() + 1) / 2 {
                    black_box(arena.add(i).unwrap());
                }
            });
        });
    }

    group.finish();
}

/// Benchmark: full tick of a chain of linked cells
fn bench_simulation_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_tick");

    for count in [50, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut sim = Simulation::init(SimConfig::default()).unwrap();
            let muscle = sim
                .add_cell_type(CellType::Muscle(MuscleCell::default()))
                .unwrap();
            let mut previous = None;
            for i in 0..count {
                let position = Vec2::new(20.0 + (i % 20) as f32 * 2.0, 20.0 + (i / 20) as f32 * 2.0);
                let cell = sim.add_cell(muscle, Body::new(position, 1.0, 1.0)).unwrap();
                if let Some(previous) = previous {
                    sim.attach(previous, cell, AttachmentConfig::new(0.2, 1.0))
                        .unwrap();
                }
                previous = Some(cell);
            }
            b.iter(|| {
                black_box(sim.step(1.0 / 30.0).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_physics_step,
    bench_arena_churn,
    bench_simulation_tick
);
criterion_main!(benches);
