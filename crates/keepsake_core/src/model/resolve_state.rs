//! Adapter resolve-state machine.
//!
//! # Invariants
//! - Every state change goes through `can_transition_to`.
//! - In-progress states (`Resolving`, `Updating`, `SerializingTransient`)
//!   always have an `end_state`.
//! - `Destroyed` is terminal.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Lifecycle stage of an adapter with respect to loading its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveState {
    /// Adapter created, lifecycle not yet decided.
    New,
    /// Not persisted; fields are authoritative in memory.
    Transient,
    /// Identity known, fields not loaded.
    Ghost,
    Resolving,
    Resolved,
    Updating,
    SerializingTransient,
    Destroyed,
}

impl ResolveState {
    pub const ALL: [ResolveState; 8] = [
        Self::New,
        Self::Transient,
        Self::Ghost,
        Self::Resolving,
        Self::Resolved,
        Self::Updating,
        Self::SerializingTransient,
        Self::Destroyed,
    ];

    pub fn can_transition_to(self, target: ResolveState) -> bool {
        use ResolveState::*;
        matches!(
            (self, target),
            (New, Transient | Ghost)
                | (Transient, Resolved | SerializingTransient | Destroyed)
                | (Ghost, Resolving | Updating | Destroyed)
                | (Resolving, Resolved)
                | (Resolved, Ghost | Updating | Destroyed)
                | (Updating, Resolved)
                | (SerializingTransient, Transient)
        )
    }

    /// State reached once an in-progress state completes.
    pub fn end_state(self) -> Option<ResolveState> {
        match self {
            Self::Resolving | Self::Updating => Some(Self::Resolved),
            Self::SerializingTransient => Some(Self::Transient),
            _ => None,
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(self, Self::Transient | Self::SerializingTransient)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Transient => "transient",
            Self::Ghost => "ghost",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::Updating => "updating",
            Self::SerializingTransient => "serializing_transient",
            Self::Destroyed => "destroyed",
        }
    }
}

impl Display for ResolveState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolveState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| format!("unknown resolve state `{value}`"))
    }
}
