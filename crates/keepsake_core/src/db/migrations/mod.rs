//! Ordered schema migrations for the memento store.
//!
//! # Invariants
//! - Versions strictly increase; the applied version lives in
//!   `PRAGMA user_version`.
//! - All pending migrations run in one transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_mementos.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_memento_labels.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applied schema version of `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let applied = schema_version(conn)?;
    let latest = latest_version();
    if applied > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: applied,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > applied)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from={} to={} applied={}",
        applied,
        latest,
        pending.len()
    );
    Ok(())
}
