//! Memento repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store captured mementos as JSON keyed by a generated id.
//! - Answer history queries by root identity.
//!
//! # Invariants
//! - Only portable mementos are written; session-bound standalone values
//!   cannot be restored elsewhere.
//! - Stored payloads that fail to decode are reported, never skipped.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::memento::{Memento, MementoError};
use crate::model::oid::Oid;
use chrono::Utc;
use log::info;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type MementoId = Uuid;

const MEMENTO_SELECT_SQL: &str = "SELECT
    memento_uuid,
    root_oid,
    type_name,
    label,
    payload,
    created_at
FROM mementos";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Memento(MementoError),
    NotFound(MementoId),
    NotPortable(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Memento(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memento not found: {id}"),
            Self::NotPortable(root) => write!(
                f,
                "memento for {root} holds session-bound values and cannot be stored"
            ),
            Self::InvalidData(message) => write!(f, "invalid stored memento: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match required {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Memento(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<MementoError> for RepoError {
    fn from(value: MementoError) -> Self {
        Self::Memento(value)
    }
}

/// One persisted memento with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMemento {
    pub id: MementoId,
    pub root_oid: Oid,
    pub type_name: String,
    pub label: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub memento: Memento,
}

pub trait MementoRepository {
    fn save_memento(&self, memento: &Memento, label: Option<&str>) -> RepoResult<MementoId>;
    fn get_memento(&self, id: MementoId) -> RepoResult<Option<StoredMemento>>;
    /// Newest first.
    fn list_for_oid(&self, oid: &Oid) -> RepoResult<Vec<StoredMemento>>;
    fn delete_memento(&self, id: MementoId) -> RepoResult<()>;
}

pub struct SqliteMementoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMementoRepository<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl MementoRepository for SqliteMementoRepository<'_> {
    fn save_memento(&self, memento: &Memento, label: Option<&str>) -> RepoResult<MementoId> {
        let root_oid = memento
            .oid()
            .ok_or_else(|| RepoError::NotPortable(memento.type_name().to_string()))?;
        if !memento.is_portable() {
            return Err(RepoError::NotPortable(root_oid.to_string()));
        }

        let id = Uuid::new_v4();
        let payload = memento.to_json()?;
        self.conn.execute(
            "INSERT INTO mementos (
                memento_uuid,
                root_oid,
                type_name,
                label,
                payload,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                root_oid.to_string(),
                memento.type_name(),
                label,
                payload,
                Utc::now().timestamp_millis(),
            ],
        )?;

        info!(
            "event=memento_save module=repo status=ok id={} root={} bytes={}",
            id,
            root_oid,
            payload.len()
        );
        Ok(id)
    }

    fn get_memento(&self, id: MementoId) -> RepoResult<Option<StoredMemento>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMENTO_SELECT_SQL} WHERE memento_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_memento_row(row)?));
        }
        Ok(None)
    }

    fn list_for_oid(&self, oid: &Oid) -> RepoResult<Vec<StoredMemento>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMENTO_SELECT_SQL}
             WHERE root_oid = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([oid.to_string()])?;
        let mut stored = Vec::new();
        while let Some(row) = rows.next()? {
            stored.push(parse_memento_row(row)?);
        }
        Ok(stored)
    }

    fn delete_memento(&self, id: MementoId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM mementos WHERE memento_uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_memento_row(row: &Row<'_>) -> RepoResult<StoredMemento> {
    let id_text: String = row.get("memento_uuid")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid `{id_text}` in mementos.memento_uuid"))
    })?;

    let oid_text: String = row.get("root_oid")?;
    let root_oid = oid_text.parse::<Oid>().map_err(|err| {
        RepoError::InvalidData(format!("{err} in mementos.root_oid"))
    })?;

    let payload: String = row.get("payload")?;
    let memento = Memento::from_json(&payload)?;
    if memento.oid() != Some(&root_oid) {
        return Err(RepoError::InvalidData(format!(
            "payload root does not match mementos.root_oid `{root_oid}`"
        )));
    }

    Ok(StoredMemento {
        id,
        root_oid,
        type_name: row.get("type_name")?,
        label: row.get("label")?,
        created_at: row.get("created_at")?,
        memento,
    })
}
