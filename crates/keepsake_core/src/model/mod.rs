//! Adapter-world model shared by sessions and mementos.
//!
//! # Responsibility
//! - Object identity (`Oid`) and lifecycle (`ResolveState`).
//! - Specifications describing each type's associations.
//! - Live adapters and the `AdapterGraph` / `Hydrator` collaborator traits.
//!
//! # Invariants
//! - Association kinds are fixed when a specification is built; capture and
//!   restore match on them exhaustively.

pub mod adapter;
pub mod oid;
pub mod resolve_state;
pub mod spec;
