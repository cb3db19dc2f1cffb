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
//! Arena handles
//!
//! Handles are lightweight, copyable references into a specific [`Arena`](super::Arena)
//! slot. A handle carries the slot index, the generation of the value it was
//! issued for, and the identity of the issuing arena, so a reused slot or a
//! handle from a different arena is detected instead of silently aliased.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Untyped part of a handle
///
/// Used in error values and logs where the addressed type does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle {
    arena: u32,
    index: u32,
    generation: u32,
}

impl RawHandle {
    pub(crate) fn new(arena: u32, index: u32, generation: u32) -> Self {
        RawHandle {
            arena,
            index,
            generation,
        }
    }

    /// Identity of the arena that issued this handle
    pub fn arena(&self) -> u32 {
        self.arena
    }

    /// Slot index inside the issuing arena
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when the handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle(arena: {}, slot: {}, gen: {})",
            self.arena, self.index, self.generation
        )
    }
}

/// Typed handle to a value of type `T` stored in an arena
///
/// `Handle<T>` is `Copy` regardless of `T`; the type parameter only prevents
/// a body handle from being used where a cell handle is expected.
pub struct Handle<T> {
    raw: RawHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn from_raw(raw: RawHandle) -> Self {
        Handle {
            raw,
            _marker: PhantomData,
        }
    }

    /// Get the untyped handle
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// Slot index inside the issuing arena
    pub fn index(&self) -> usize {
        self.raw.index()
    }

    /// Generation of the slot when the handle was issued
    pub fn generation(&self) -> u32 {
        self.raw.generation()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn test_handle_accessors() {
        let handle = Handle::<Marker>::from_raw(RawHandle::new(3, 42, 1));
        assert_eq!(handle.index(), 42);
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.raw().arena(), 3);
    }

    #[test]
    fn test_handle_equality() {
        let h1 = Handle::<Marker>::from_raw(RawHandle::new(0, 1, 0));
        let h2 = Handle::<Marker>::from_raw(RawHandle::new(0, 1, 0));
        let h3 = Handle::<Marker>::from_raw(RawHandle::new(0, 1, 1));
        let h4 = Handle::<Marker>::from_raw(RawHandle::new(1, 1, 0));
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_ne!(h1, h4);
    }

    #[test]
    fn test_handle_display() {
        let handle = Handle::<Marker>::from_raw(RawHandle::new(2, 7, 5));
        assert_eq!(format!("{}", handle), "Handle(arena: 2, slot: 7, gen: 5)");
    }
}
