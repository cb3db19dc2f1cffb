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
//! Cells and their attachment slots

use super::cell_type::CellType;
use crate::arena::Handle;
use crate::physics::{Attachment, Body};
use smallvec::SmallVec;

/// One end of a logical link between two cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicAttachment {
    /// The cell at the other end
    pub cell: Handle<Cell>,
    /// The physical spring backing the link
    pub attachment: Handle<Attachment>,
}

/// Indexed attachment list of a cell
///
/// Cell types address attachments by index, so removing an entry leaves a
/// hole instead of shifting later entries. New links take the lowest hole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentSlots {
    slots: SmallVec<[Option<LogicAttachment>; 6]>,
}

impl AttachmentSlots {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry at `index`
    pub fn get(&self, index: usize) -> Option<LogicAttachment> {
        self.slots.get(index).copied().flatten()
    }

    /// Number of slots, holes included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if there is no slot at all
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of live entries
    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Iterate over live entries with their indices
    pub fn iter(&self) -> impl Iterator<Item = (usize, LogicAttachment)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|link| (index, link)))
    }

    /// Indices of live entries matching `pred`
    pub fn positions(&self, pred: impl Fn(&LogicAttachment) -> bool) -> SmallVec<[usize; 2]> {
        self.iter()
            .filter(|(_, link)| pred(link))
            .map(|(index, _)| index)
            .collect()
    }

    /// Check if any live entry points at `cell`
    pub fn links_to(&self, cell: Handle<Cell>) -> bool {
        self.iter().any(|(_, link)| link.cell == cell)
    }

    /// Put `link` into the lowest hole, or append; returns its index
    pub(crate) fn insert(&mut self, link: LogicAttachment) -> usize {
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(link);
                index
            }
            None => {
                self.slots.push(Some(link));
                self.slots.len() - 1
            }
        }
    }

    /// Put `link` at `index`, growing with holes; returns the previous entry
    pub(crate) fn place(&mut self, index: usize, link: LogicAttachment) -> Option<LogicAttachment> {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index].replace(link)
    }

    /// Turn the entry at `index` into a hole
    pub(crate) fn take(&mut self, index: usize) -> Option<LogicAttachment> {
        self.slots.get_mut(index).and_then(Option::take)
    }
}

/// A living cell: a body driven by the behavior of its type
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    cell_type: Handle<CellType>,
    body: Handle<Body>,
    pub(crate) attachments: AttachmentSlots,
    pub(crate) life_time: f32,
    pub(crate) countdown: f32,
    /// Output of the cell, read by the muscles and neurons linked to it
    pub charge: f32,
}

impl Cell {
    pub(crate) fn new(cell_type: Handle<CellType>, body: Handle<Body>) -> Self {
        Cell {
            cell_type,
            body,
            attachments: AttachmentSlots::new(),
            life_time: 0.0,
            countdown: 0.0,
            charge: 0.0,
        }
    }

    /// Type of the cell
    pub fn cell_type(&self) -> Handle<CellType> {
        self.cell_type
    }

    /// Body of the cell
    pub fn body(&self) -> Handle<Body> {
        self.body
    }

    /// Attachment slots
    pub fn attachments(&self) -> &AttachmentSlots {
        &self.attachments
    }

    /// Seconds since the cell was created
    pub fn life_time(&self) -> f32 {
        self.life_time
    }

    /// Seconds until the next neuron evaluation
    pub fn countdown(&self) -> f32 {
        self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::physics::AttachmentConfig;
    use glam::Vec2;

    fn links(n: usize) -> Vec<LogicAttachment> {
        let mut bodies = Arena::new("bodies", 8);
        let mut attachments = Arena::new("attachments", 8);
        let mut cells: Arena<Cell> = Arena::new("cells", 8);
        let mut types = Arena::new("types", 1);
        let ty = types
            .add(CellType::Muscle(Default::default()))
            .unwrap();
        let a = bodies.add(Body::new(Vec2::ZERO, 1.0, 1.0)).unwrap();
        (0..n)
            .map(|_| {
                let b = bodies.add(Body::new(Vec2::ONE, 1.0, 1.0)).unwrap();
                LogicAttachment {
                    cell: cells.add(Cell::new(ty, b)).unwrap(),
                    attachment: attachments
                        .add(Attachment::new(AttachmentConfig::default(), [a, b]))
                        .unwrap(),
                }
            })
            .collect()
    }

    #[test]
    fn test_insert_takes_lowest_hole() {
        let l = links(4);
        let mut slots = AttachmentSlots::new();
        assert_eq!(slots.insert(l[0]), 0);
        assert_eq!(slots.insert(l[1]), 1);
        assert_eq!(slots.insert(l[2]), 2);

        assert_eq!(slots.take(1), Some(l[1]));
        assert_eq!(slots.take(1), None);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.live_count(), 2);
        // later entries keep their index
        assert_eq!(slots.get(2), Some(l[2]));

        assert_eq!(slots.insert(l[3]), 1);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_place_grows_with_holes() {
        let l = links(2);
        let mut slots = AttachmentSlots::new();
        assert_eq!(slots.place(3, l[0]), None);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots.get(0), None);
        assert_eq!(slots.get(3), Some(l[0]));
        assert_eq!(slots.insert(l[1]), 0);
        assert_eq!(
            slots.iter().map(|(i, _)| i).collect::<Vec<_>>(),
            vec![0, 3]
        );
        assert!(slots.links_to(l[1].cell));
        assert_eq!(slots.positions(|link| link.cell == l[0].cell).as_slice(), &[3]);
    }
}
