//! Repository layer over the memento store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL details out of services.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `NotPortable`) in
//!   addition to DB transport errors.

pub mod memento_repo;
