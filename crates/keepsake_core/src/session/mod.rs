//! In-process adapter sessions.
//!
//! # Responsibility
//! - Own live adapters for one unit of work and index them by identity.
//! - Implement the `Hydrator` contract used by memento reconstruction.
//!
//! # Invariants
//! - One session, one thread; callers must not mutate the graph while a
//!   memento is being captured or applied.

mod in_memory;

pub use in_memory::{ChangeEvent, InMemorySession};
