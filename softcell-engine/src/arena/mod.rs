//! Entity arena
//!
//! This module provides the storage every other layer builds on:
//! - [`Arena`]: fixed-capacity slots with tombstoning and lowest-index reuse
//! - [`Handle`]: typed, generation-checked references into an arena
//!
//! Bodies, attachments, cells and cell types all live in arenas and refer to
//! each other only through handles, so a stale reference fails loudly instead
//! of aliasing whatever later occupies the slot.

mod handle;
mod store;

pub use handle::{Handle, RawHandle};
pub use store::Arena;
