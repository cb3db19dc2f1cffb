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
//! Error types
//!
//! Every failure in the engine is a broken contract rather than a recoverable
//! condition: a full arena, a stale handle, or an internal invariant that no
//! longer holds. Errors are returned immediately so the caller can stop the
//! simulation at the first inconsistency.

use crate::arena::RawHandle;
use thiserror::Error;

/// Result type used throughout the simulation
pub type SimResult<T> = std::result::Result<T, SimError>;

/// Errors reported by [`Arena`](crate::arena::Arena) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Adding a value would exceed the fixed capacity
    #[error("arena `{name}` is full (capacity {capacity})")]
    Full {
        /// Name of the arena, for diagnostics
        name: &'static str,
        /// Fixed capacity of the arena
        capacity: usize,
    },

    /// The handle refers to a tombstoned slot, a reused slot, or another arena
    #[error("invalid handle {handle} for arena `{name}`")]
    InvalidHandle {
        /// Name of the arena, for diagnostics
        name: &'static str,
        /// The rejected handle
        handle: RawHandle,
    },

    /// A pair borrow was requested for the same slot twice
    #[error("handle {0} requested twice in a pair borrow")]
    Aliased(RawHandle),
}

/// Errors reported while validating a [`SimConfig`](crate::config::SimConfig)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configuration value is out of its accepted range
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Top-level simulation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Arena capacity or handle failure
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The timestep handed to `step` cannot be integrated
    #[error("invalid timestep {0}: must be positive and finite")]
    InvalidTimestep(f32),

    /// A body cannot be simulated (non-finite state or non-positive mass)
    #[error("invalid body: {0}")]
    InvalidBody(&'static str),

    /// A cell type is inconsistent (e.g. a stem giving a child no mass)
    #[error("invalid cell type: {0}")]
    InvalidCellType(&'static str),

    /// An attachment was requested between a body and itself
    #[error("body {0} cannot be attached to itself")]
    SelfAttachment(RawHandle),

    /// An attachment already exists between the two bodies
    #[error("bodies {0} and {1} are already attached")]
    DuplicateAttachment(RawHandle, RawHandle),

    /// A live attachment references a dead or identical body
    #[error("attachment {attachment} is malformed: {reason}")]
    MalformedAttachment {
        /// The offending attachment
        attachment: RawHandle,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Two cells are already logically linked
    #[error("cells {0} and {1} are already linked")]
    AlreadyLinked(RawHandle, RawHandle),

    /// A cell's attachment entry does not have exactly one mirror on its partner
    #[error("cell {cell} has {found} mirrored entries on partner {partner} (expected 1)")]
    MirrorViolation {
        /// Cell whose entry was being mirrored
        cell: RawHandle,
        /// Partner cell that should hold the mirror
        partner: RawHandle,
        /// Number of mirrored entries actually found
        found: usize,
    },

    /// A body is filed in a room that does not match its position
    #[error("body {body} is filed in room {filed:?} but belongs to {expected:?}")]
    RoomMismatch {
        /// The misfiled body
        body: RawHandle,
        /// Room coordinates recorded on the body
        filed: Option<(usize, usize)>,
        /// Room coordinates computed from its position
        expected: (usize, usize),
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_error_display() {
        let err = ArenaError::Full {
            name: "bodies",
            capacity: 4,
        };
        assert_eq!(err.to_string(), "arena `bodies` is full (capacity 4)");
    }

    #[test]
    fn test_sim_error_from_arena_error() {
        let err: SimError = ArenaError::Full {
            name: "cells",
            capacity: 1,
        }
        .into();
        assert!(matches!(err, SimError::Arena(ArenaError::Full { .. })));
        assert!(err.to_string().contains("cells"));
    }

    #[test]
    fn test_config_error_display() {
        let err: SimError = ConfigError::Invalid("room_width must be positive").into();
        assert_eq!(
            err.to_string(),
            "invalid configuration: room_width must be positive"
        );
    }
}
