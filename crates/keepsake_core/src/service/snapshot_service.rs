//! Snapshot use-case service.
//!
//! # Responsibility
//! - Capture a root object into the repository and bring it back later.
//!
//! # Invariants
//! - The service never touches SQL; persistence goes through
//!   `MementoRepository`.
//! - `revert` applies a snapshot only to the object it was taken from.

use crate::memento::{Memento, MementoError};
use crate::model::adapter::{AdapterGraph, AdapterHandle, Hydrator};
use crate::model::oid::Oid;
use crate::repo::memento_repo::{MementoId, MementoRepository, RepoError, StoredMemento};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug)]
pub enum SnapshotError {
    Repo(RepoError),
    Memento(MementoError),
    NotFound(MementoId),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Memento(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "snapshot not found: {id}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Memento(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MementoError> for SnapshotError {
    fn from(value: MementoError) -> Self {
        Self::Memento(value)
    }
}

pub struct SnapshotService<R: MementoRepository> {
    repo: R,
}

impl<R: MementoRepository> SnapshotService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Captures `root` and stores the result.
    pub fn snapshot<G>(
        &self,
        graph: &G,
        root: AdapterHandle,
        label: Option<&str>,
    ) -> SnapshotResult<MementoId>
    where
        G: AdapterGraph + ?Sized,
    {
        let memento = Memento::capture(graph, root)?;
        Ok(self.repo.save_memento(&memento, label)?)
    }

    /// Rebuilds the snapshot root inside `hydrator`, creating adapters as needed.
    pub fn restore<H>(&self, id: MementoId, hydrator: &mut H) -> SnapshotResult<AdapterHandle>
    where
        H: Hydrator + ?Sized,
    {
        let stored = self.load(id)?;
        Ok(stored.memento.recreate_object(hydrator)?)
    }

    /// Rolls an existing adapter back to a stored snapshot of itself.
    ///
    /// # Errors
    /// - `MementoError::IdentityMismatch` when `handle` is another object.
    pub fn revert<H>(
        &self,
        id: MementoId,
        hydrator: &mut H,
        handle: AdapterHandle,
    ) -> SnapshotResult<()>
    where
        H: Hydrator + ?Sized,
    {
        let stored = self.load(id)?;
        Ok(stored.memento.update_object(hydrator, handle)?)
    }

    /// Snapshots of `oid`, newest first.
    pub fn history(&self, oid: &Oid) -> SnapshotResult<Vec<StoredMemento>> {
        Ok(self.repo.list_for_oid(oid)?)
    }

    pub fn discard(&self, id: MementoId) -> SnapshotResult<()> {
        Ok(self.repo.delete_memento(id)?)
    }

    fn load(&self, id: MementoId) -> SnapshotResult<StoredMemento> {
        self.repo
            .get_memento(id)?
            .ok_or(SnapshotError::NotFound(id))
    }
}
