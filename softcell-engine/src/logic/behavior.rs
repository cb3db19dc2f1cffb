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
//! Per-type cell behavior and link bookkeeping
//!
//! These functions take the cell and type arenas separately rather than the
//! whole [`LogicWorld`](super::LogicWorld), so the update loop can keep a
//! borrowed cell type while it mutates cells.

use super::cell::{Cell, LogicAttachment};
use super::cell_type::{CellType, MuscleCell, NeuronCell, StemCell};
use crate::arena::{Arena, Handle};
use crate::config::LogicConfig;
use crate::error::{ArenaError, SimError, SimResult};
use crate::physics::{AttachmentConfig, Body, PhysicsWorld};
use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

/// Live entry at `index` of `cell` whose partner and spring are both alive
pub(crate) fn resolve(
    cells: &Arena<Cell>,
    physics: &PhysicsWorld,
    cell: &Cell,
    index: usize,
) -> Option<LogicAttachment> {
    cell.attachments()
        .get(index)
        .filter(|link| cells.contains(link.cell) && physics.attachment(link.attachment).is_ok())
}

/// Charge of the cell at the far end of attachment `index`
pub(crate) fn far_charge(
    cells: &Arena<Cell>,
    physics: &PhysicsWorld,
    cell: &Cell,
    index: usize,
) -> Option<f32> {
    let link = resolve(cells, physics, cell, index)?;
    cells.get(link.cell).ok().map(|far| far.charge)
}

/// Run the creation hook of a fresh cell
pub(crate) fn on_create(
    cells: &mut Arena<Cell>,
    types: &Arena<CellType>,
    handle: Handle<Cell>,
) -> SimResult<()> {
    let cell = cells.get_mut(handle)?;
    if let CellType::Neuron(neuron) = types.get(cell.cell_type())? {
        cell.countdown = neuron.update_offset;
    }
    Ok(())
}

/// Link two cells with a new spring, each taking its lowest free index
///
/// Returns the indices on `a` and `b`.
pub(crate) fn link(
    cells: &mut Arena<Cell>,
    physics: &mut PhysicsWorld,
    a: Handle<Cell>,
    b: Handle<Cell>,
    config: AttachmentConfig,
) -> SimResult<(usize, usize)> {
    ensure_unlinked(cells, a, b)?;
    let body_a = cells.get(a)?.body();
    let body_b = cells.get(b)?.body();
    let attachment = physics.add_attachment(body_a, body_b, config)?;

    let index_a = cells.get_mut(a)?.attachments.insert(LogicAttachment {
        cell: b,
        attachment,
    });
    let index_b = cells.get_mut(b)?.attachments.insert(LogicAttachment {
        cell: a,
        attachment,
    });
    tracing::debug!(%a, %b, %attachment, index_a, index_b, "cells linked");
    Ok((index_a, index_b))
}

fn ensure_unlinked(cells: &Arena<Cell>, a: Handle<Cell>, b: Handle<Cell>) -> SimResult<()> {
    if a == b {
        tracing::error!(cell = %a, "refusing to link a cell to itself");
        return Err(SimError::SelfAttachment(a.raw()));
    }
    if cells.get(a)?.attachments().links_to(b) || cells.get(b)?.attachments().links_to(a) {
        tracing::error!(%a, %b, "cells are already linked");
        return Err(SimError::AlreadyLinked(a.raw(), b.raw()));
    }
    Ok(())
}

/// Tombstone the single mirror of `link` on its partner and kill the spring
fn sever(
    cells: &mut Arena<Cell>,
    physics: &mut PhysicsWorld,
    owner: Handle<Cell>,
    link: LogicAttachment,
) -> SimResult<()> {
    let partner = cells.get_mut(link.cell)?;
    let mirrors = partner
        .attachments()
        .positions(|m| m.cell == owner && m.attachment == link.attachment);
    if mirrors.len() != 1 {
        tracing::error!(
            cell = %owner,
            partner = %link.cell,
            found = mirrors.len(),
            "attachment is not mirrored exactly once"
        );
        return Err(SimError::MirrorViolation {
            cell: owner.raw(),
            partner: link.cell.raw(),
            found: mirrors.len(),
        });
    }
    partner.attachments.take(mirrors[0]);
    physics.kill_attachment(link.attachment)?;
    Ok(())
}

/// Sever the link at `index` of `cell`; returns false on an empty slot
pub(crate) fn unlink(
    cells: &mut Arena<Cell>,
    physics: &mut PhysicsWorld,
    cell: Handle<Cell>,
    index: usize,
) -> SimResult<bool> {
    let Some(link) = cells.get(cell)?.attachments().get(index) else {
        return Ok(false);
    };
    sever(cells, physics, cell, link)?;
    cells.get_mut(cell)?.attachments.take(index);
    tracing::debug!(%cell, index, partner = %link.cell, "cells unlinked");
    Ok(true)
}

/// Sever every link of a cell, then kill its body and the cell itself
pub(crate) fn kill(
    cells: &mut Arena<Cell>,
    physics: &mut PhysicsWorld,
    handle: Handle<Cell>,
) -> SimResult<Cell> {
    let links: Vec<_> = cells.get(handle)?.attachments().iter().collect();
    for (_, link) in links {
        sever(cells, physics, handle, link)?;
    }
    let body = cells.get(handle)?.body();
    physics.kill_body(body)?;
    let cell = cells.kill(handle)?;
    tracing::debug!(cell = %handle, %body, "cell killed");
    Ok(cell)
}

/// Check the split condition of a stem cell
pub(crate) fn ready_to_split(
    cell: &Cell,
    body: &Body,
    stem: &StemCell,
    config: &LogicConfig,
) -> bool {
    cell.life_time() > config.split_cooldown
        && body.mass > stem.min_split_mass.max(config.min_split_mass)
}

/// Replace `parent` by two children
///
/// The stem parameters and the cell, body and attachment capacity are
/// checked up front, so a split either happens completely or fails without
/// touching the world.
pub(crate) fn split(
    cells: &mut Arena<Cell>,
    types: &Arena<CellType>,
    physics: &mut PhysicsWorld,
    config: &LogicConfig,
    parent: Handle<Cell>,
    stem: &StemCell,
) -> SimResult<[Handle<Cell>; 2]> {
    stem.validate()?;
    if cells.capacity() - cells.len() < 2 {
        return Err(ArenaError::Full {
            name: cells.name(),
            capacity: cells.capacity(),
        }
        .into());
    }
    if physics.config().max_bodies - physics.body_count() < 2 {
        return Err(ArenaError::Full {
            name: "bodies",
            capacity: physics.config().max_bodies,
        }
        .into());
    }
    for child_type in stem.children_types {
        types.get(child_type)?;
    }

    let parent_cell = cells.get(parent)?;
    let inherited = stem.passed_attachments.clone().map(|indices| {
        indices
            .into_iter()
            .filter_map(|index| Some((index, resolve(cells, physics, parent_cell, index)?)))
            .collect::<Vec<_>>()
    });
    let needed = inherited[0].len()
        + inherited[1].len()
        + usize::from(stem.child_attachment.is_some());
    let max_attachments = physics.config().max_attachments;
    if max_attachments - physics.attachment_count() < needed {
        return Err(ArenaError::Full {
            name: "attachments",
            capacity: max_attachments,
        }
        .into());
    }

    let parent_body_handle = cells.get(parent)?.body();
    let parent_body = physics.body(parent_body_handle)?.clone();

    let mut children = [parent; 2];
    for (i, child) in children.iter_mut().enumerate() {
        let mass = (i as f32 - stem.child0_amount).abs() * parent_body.mass;
        let radius = mass / parent_body.mass_per_radius;
        let side = if i == 0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        let offset = Vec2::from_angle(parent_body.angle + side) * radius * config.spawn_offset_factor;
        let body = Body::new(
            parent_body.position + offset,
            mass,
            parent_body.mass_per_radius,
        )
        .with_angle(parent_body.angle + stem.children_angles[i]);

        let body = physics.add_body(body)?;
        *child = cells.add(Cell::new(stem.children_types[i], body))?;

        for &(index, link) in &inherited[i] {
            inherit(cells, physics, parent_body_handle, *child, index, link)?;
        }
    }

    if let Some(config) = stem.child_attachment {
        link(cells, physics, children[0], children[1], config)?;
    }
    kill(cells, physics, parent)?;
    for child in children {
        on_create(cells, types, child)?;
    }

    tracing::debug!(
        %parent,
        child0 = %children[0],
        child1 = %children[1],
        mass = parent_body.mass,
        "stem cell split"
    );
    Ok(children)
}

/// Copy the parent's link at `index` onto `child`, which keeps the index
fn inherit(
    cells: &mut Arena<Cell>,
    physics: &mut PhysicsWorld,
    parent_body: Handle<Body>,
    child: Handle<Cell>,
    index: usize,
    link: LogicAttachment,
) -> SimResult<()> {
    let original = physics.attachment(link.attachment)?.clone();
    let child_body = cells.get(child)?.body();
    let partner_body = cells.get(link.cell)?.body();
    ensure_unlinked(cells, child, link.cell)?;

    let ends = if original.bodies()[0] == parent_body {
        [child_body, partner_body]
    } else {
        [partner_body, child_body]
    };
    let attachment = physics.add_attachment(ends[0], ends[1], original.config)?;

    cells.get_mut(child)?.attachments.place(
        index,
        LogicAttachment {
            cell: link.cell,
            attachment,
        },
    );
    cells.get_mut(link.cell)?.attachments.insert(LogicAttachment {
        cell: child,
        attachment,
    });
    Ok(())
}

/// Pin the body and drive rest distances from neighbor charge
pub(crate) fn actuate(
    cells: &Arena<Cell>,
    physics: &mut PhysicsWorld,
    config: &LogicConfig,
    handle: Handle<Cell>,
    muscle: &MuscleCell,
) -> SimResult<()> {
    let cell = cells.get(handle)?;
    if let Some(index) = muscle.fix_input {
        if let Some(charge) = far_charge(cells, physics, cell, index) {
            physics.body_mut(cell.body())?.fixed = charge > config.muscle_fix_threshold;
        }
    }
    for rule in &muscle.rules {
        let Some(charge) = far_charge(cells, physics, cell, rule.input) else {
            continue;
        };
        let Some(output) = resolve(cells, physics, cell, rule.output) else {
            continue;
        };
        physics.attachment_mut(output.attachment)?.config.distance = charge * rule.weight;
    }
    Ok(())
}

/// Count down and, when due, recompute the neuron's charge
///
/// Returns whether the neuron was evaluated.
pub(crate) fn think(
    cells: &mut Arena<Cell>,
    physics: &PhysicsWorld,
    config: &LogicConfig,
    handle: Handle<Cell>,
    neuron: &NeuronCell,
    dt: f32,
) -> SimResult<bool> {
    let cell = cells.get_mut(handle)?;
    cell.countdown -= dt;
    if cell.countdown >= 0.0 {
        return Ok(false);
    }
    cell.countdown = config.neuron_update_interval;

    let cell = cells.get(handle)?;
    let weighted: f32 = neuron
        .inputs
        .iter()
        .filter_map(|input| {
            far_charge(cells, physics, cell, input.attachment).map(|charge| charge * input.weight)
        })
        .sum();
    let charge = neuron.activation.apply(weighted, neuron.threshold);
    cells.get_mut(handle)?.charge = charge;
    tracing::trace!(cell = %handle, weighted, charge, "neuron evaluated");
    Ok(true)
}
