//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate memento capture/restore with repository persistence.
//! - Keep CLI callers decoupled from storage details.

pub mod snapshot_service;
