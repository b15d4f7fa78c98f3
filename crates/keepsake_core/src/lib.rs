//! Core library for keepsake.
//!
//! Two subsystems live here: temporal value semantics with `+1m 2d`-style
//! relative entry, and object-graph mementos that snapshot and restore live
//! adapter graphs.

pub mod config;
pub mod db;
pub mod logging;
pub mod memento;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod value;

pub use config::{ConfigError, CoreConfig, LoggingConfig, TemporalConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use memento::{Data, Memento, MementoError, MementoResult};
pub use model::adapter::{AdapterGraph, AdapterHandle, FieldValue, GraphError, Hydrator};
pub use model::oid::{Oid, OidParseError, OidState};
pub use model::resolve_state::ResolveState;
pub use model::spec::{Association, AssociationKind, ObjectSpec, SpecKind};
pub use repo::memento_repo::{
    MementoId, MementoRepository, RepoError, RepoResult, SqliteMementoRepository, StoredMemento,
};
pub use service::snapshot_service::{SnapshotError, SnapshotResult, SnapshotService};
pub use session::{ChangeEvent, InMemorySession};
pub use value::adjust::{AdjustError, TemporalAdjust};
pub use value::scalar::{ScalarValue, ValueCodec};
pub use value::semantics::{FormatSet, TemporalSemantics};
pub use value::temporal::{OffsetTime, TemporalKind, TemporalValue};
pub use value::{ValueError, ValueResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
