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
//! Fixed-capacity slot storage
//!
//! The arena keeps values in a dense vector of slots. Each slot is either
//! live or tombstoned; tombstoned slots keep their position and are reused by
//! later insertions, lowest index first. Killing a value increments the slot
//! generation so handles issued for the old value stop resolving.
//!
//! # Capacity
//!
//! The capacity is fixed at construction. [`Arena::add`] beyond it returns
//! [`ArenaError::Full`]; the arena never grows past its capacity and never
//! overwrites a live slot.

use super::handle::{Handle, RawHandle};
use crate::error::ArenaError;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(0);

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Fixed-capacity store handing out generation-checked handles
///
/// # Examples
///
/// ```
/// use softcell_engine::arena::Arena;
///
/// let mut arena = Arena::new("numbers", 2);
/// let a = arena.add(1).unwrap();
/// let b = arena.add(2).unwrap();
/// assert!(arena.add(3).is_err());
///
/// arena.kill(a).unwrap();
/// assert!(arena.get(a).is_err());
///
/// let c = arena.add(3).unwrap();
/// assert_eq!(c.index(), a.index());
/// assert_eq!(arena.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec![3, 2]);
/// # let _ = b;
/// ```
pub struct Arena<T> {
    id: u32,
    name: &'static str,
    capacity: usize,
    slots: Vec<Slot<T>>,
    live: usize,
}

impl<T> Arena<T> {
    /// Create an empty arena holding at most `capacity` live values
    ///
    /// # Panics
    ///
    /// Panics if `capacity` does not fit in a `u32`
    pub fn new(name: &'static str, capacity: usize) -> Self {
        assert!(
            capacity <= u32::MAX as usize,
            "Arena capacity must fit in a u32"
        );
        Arena {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            name,
            capacity,
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Name given at construction
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Maximum number of live values
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if no value is live
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Insert a value into the first tombstoned slot, or append a new slot
    pub fn add(&mut self, value: T) -> Result<Handle<T>, ArenaError> {
        let reusable = if self.live < self.slots.len() {
            self.slots.iter().position(|slot| slot.value.is_none())
        } else {
            None
        };

        let index = match reusable {
            Some(index) => index,
            None => {
                if self.slots.len() >= self.capacity {
                    return Err(ArenaError::Full {
                        name: self.name,
                        capacity: self.capacity,
                    });
                }
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.value = Some(value);
        self.live += 1;
        Ok(Handle::from_raw(RawHandle::new(
            self.id,
            index as u32,
            slot.generation,
        )))
    }

    /// Get a reference to a live value
    pub fn get(&self, handle: Handle<T>) -> Result<&T, ArenaError> {
        let index = self.resolve(handle)?;
        self.slots[index]
            .value
            .as_ref()
            .ok_or_else(|| self.invalid(handle))
    }

    /// Get a mutable reference to a live value
    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, ArenaError> {
        let index = self.resolve(handle)?;
        let invalid = self.invalid(handle);
        self.slots[index].value.as_mut().ok_or(invalid)
    }

    /// Get mutable references to two distinct live values at once
    pub fn get_pair_mut(
        &mut self,
        a: Handle<T>,
        b: Handle<T>,
    ) -> Result<(&mut T, &mut T), ArenaError> {
        let ia = self.resolve(a)?;
        let ib = self.resolve(b)?;
        if ia == ib {
            return Err(ArenaError::Aliased(a.raw()));
        }

        let invalid = self.invalid(a);
        let (first, second) = if ia < ib {
            let (lo, hi) = self.slots.split_at_mut(ib);
            (&mut lo[ia], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(ia);
            (&mut hi[0], &mut lo[ib])
        };

        match (first.value.as_mut(), second.value.as_mut()) {
            (Some(va), Some(vb)) => Ok((va, vb)),
            _ => Err(invalid),
        }
    }

    /// Check if the handle still refers to a live value
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Tombstone the slot and return its value
    ///
    /// Killing a handle that is no longer live is a contract violation and
    /// fails with [`ArenaError::InvalidHandle`].
    pub fn kill(&mut self, handle: Handle<T>) -> Result<T, ArenaError> {
        let index = self.resolve(handle)?;
        let invalid = self.invalid(handle);
        let slot = &mut self.slots[index];
        let value = slot.value.take().ok_or(invalid)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.live -= 1;
        Ok(value)
    }

    /// Iterate over live values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        let id = self.id;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Handle::from_raw(RawHandle::new(id, index as u32, slot.generation)),
                    value,
                )
            })
        })
    }

    /// Iterate mutably over live values in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        let id = self.id;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                let generation = slot.generation;
                slot.value.as_mut().map(|value| {
                    (
                        Handle::from_raw(RawHandle::new(id, index as u32, generation)),
                        value,
                    )
                })
            })
    }

    /// Iterate over live values without their handles
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    /// Snapshot the handles of all live values
    ///
    /// Useful when the arena is mutated while walking the live set: handles
    /// taken here can be re-checked with [`Arena::contains`] before each use.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    fn resolve(&self, handle: Handle<T>) -> Result<usize, ArenaError> {
        let raw = handle.raw();
        let index = raw.index();
        let live = raw.arena() == self.id
            && self
                .slots
                .get(index)
                .map(|slot| slot.generation == raw.generation() && slot.value.is_some())
                .unwrap_or(false);
        if live {
            Ok(index)
        } else {
            Err(self.invalid(handle))
        }
    }

    fn invalid(&self, handle: Handle<T>) -> ArenaError {
        ArenaError::InvalidHandle {
            name: self.name,
            handle: handle.raw(),
        }
    }
}
