//! Object identity descriptors.
//!
//! # Invariants
//! - An oid is either transient (not yet persisted) or persistent.
//! - Parented oids inherit their owner's transient state.
//! - The string form `T:<type>:<id>` / `P:<type>:<id>` round-trips.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

static OID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<state>[TP]):(?P<type_name>[A-Za-z_][A-Za-z0-9_.$]*):(?P<identifier>\S+)$")
        .expect("oid pattern is a valid regex")
});

const PARENTED_SEPARATOR: char = '~';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OidState {
    Transient,
    Persistent,
}

/// Opaque, comparable identity of one domain object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Oid {
    type_name: String,
    identifier: String,
    state: OidState,
}

impl Oid {
    /// New transient identity with a generated identifier.
    pub fn transient(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            identifier: Uuid::new_v4().to_string(),
            state: OidState::Transient,
        }
    }

    pub fn persistent(type_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            identifier: identifier.into(),
            state: OidState::Persistent,
        }
    }

    /// Identity of an object owned by `parent`, addressed by `local_name`.
    pub fn parented(parent: &Oid, type_name: impl Into<String>, local_name: &str) -> Self {
        Self {
            type_name: type_name.into(),
            identifier: format!("{}{PARENTED_SEPARATOR}{local_name}", parent.identifier),
            state: parent.state,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> OidState {
        self.state
    }

    pub fn is_transient(&self) -> bool {
        self.state == OidState::Transient
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let marker = match self.state {
            OidState::Transient => 'T',
            OidState::Persistent => 'P',
        };
        write!(f, "{marker}:{}:{}", self.type_name, self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidParseError(pub String);

impl Display for OidParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid oid `{}`; expected `T|P:<type>:<identifier>`",
            self.0
        )
    }
}

impl Error for OidParseError {}

impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let captures = OID_PATTERN
            .captures(value.trim())
            .ok_or_else(|| OidParseError(value.to_string()))?;
        let state = match &captures["state"] {
            "T" => OidState::Transient,
            _ => OidState::Persistent,
        };
        Ok(Self {
            type_name: captures["type_name"].to_string(),
            identifier: captures["identifier"].to_string(),
            state,
        })
    }
}
