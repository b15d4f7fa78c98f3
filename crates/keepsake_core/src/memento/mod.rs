//! Object graph mementos.
//!
//! # Responsibility
//! - Capture a live adapter graph into a self-contained `Data` tree.
//! - Rebuild or update live adapters from that tree through a `Hydrator`.
//!
//! # Invariants
//! - Owned (parented or transient) objects are inlined exactly once per
//!   capture; persistent entities travel as references.
//! - `update_object` never mutates an adapter whose identity differs from
//!   the captured root.
//! - One-to-many fields are updated by diff, never cleared and rebuilt.

mod capture;
pub mod data;
mod restore;

use crate::model::adapter::{AdapterGraph, AdapterHandle, GraphError, Hydrator};
use crate::model::oid::Oid;
use crate::model::resolve_state::ResolveState;
use crate::value::ValueError;
use capture::Capture;
use log::info;
use restore::Restore;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use data::{
    CollectionData, Data, FieldData, FieldEntry, ObjectData, ReferenceData, StandaloneData,
    FIELD_COLLECTION_TYPE,
};

pub type MementoResult<T> = Result<T, MementoError>;

#[derive(Debug)]
pub enum MementoError {
    Graph(GraphError),
    Codec(ValueError),
    IdentityMismatch {
        expected: Oid,
        actual: Option<Oid>,
    },
    InconsistentResolveState {
        oid: Oid,
        state: ResolveState,
    },
    MissingIdentity {
        type_name: String,
    },
    UnexpectedData {
        expected: &'static str,
        found: &'static str,
    },
    Serialization(serde_json::Error),
}

impl Display for MementoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::IdentityMismatch { expected, actual } => match actual {
                Some(actual) => write!(
                    f,
                    "memento captured {expected} but was applied to {actual}"
                ),
                None => write!(
                    f,
                    "memento captured {expected} but was applied to an object without identity"
                ),
            },
            Self::InconsistentResolveState { oid, state } => write!(
                f,
                "memento carries field values for {oid} but the object is {state}"
            ),
            Self::MissingIdentity { type_name } => {
                write!(f, "`{type_name}` object has no identity")
            }
            Self::UnexpectedData { expected, found } => {
                write!(f, "expected {expected} data, found {found}")
            }
            Self::Serialization(err) => write!(f, "memento serialization failed: {err}"),
        }
    }
}

impl Error for MementoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for MementoError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<ValueError> for MementoError {
    fn from(value: ValueError) -> Self {
        Self::Codec(value)
    }
}

impl From<serde_json::Error> for MementoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Snapshot of one root object and everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memento {
    state: Data,
}

impl Memento {
    /// Walks the graph from `root` and records its snapshot state.
    pub fn capture<G>(graph: &G, root: AdapterHandle) -> MementoResult<Self>
    where
        G: AdapterGraph + ?Sized,
    {
        let mut capture = Capture::new(graph);
        let state = capture.create_data(root)?;
        info!(
            "event=memento_capture module=memento status=ok root={} inlined={} visited={}",
            state.oid().map(ToString::to_string).unwrap_or_default(),
            state.inline_count(),
            capture.visited_count()
        );
        Ok(Self { state })
    }

    pub fn from_data(state: Data) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Data {
        &self.state
    }

    pub fn into_state(self) -> Data {
        self.state
    }

    /// Identity of the captured root.
    pub fn oid(&self) -> Option<&Oid> {
        self.state.oid()
    }

    pub fn type_name(&self) -> &str {
        self.state.type_name()
    }

    /// False when the tree holds values only meaningful in the capturing
    /// session.
    pub fn is_portable(&self) -> bool {
        self.state.is_portable()
    }

    /// Locates or creates the root adapter and brings it to the captured state.
    pub fn recreate_object<H>(&self, hydrator: &mut H) -> MementoResult<AdapterHandle>
    where
        H: Hydrator + ?Sized,
    {
        let handle = Restore::new(hydrator).recreate_object(&self.state)?;
        info!(
            "event=memento_recreate module=memento status=ok root={} handle={}",
            self.state.oid().map(ToString::to_string).unwrap_or_default(),
            handle
        );
        Ok(handle)
    }

    /// Applies the captured state to an existing adapter with the same identity.
    pub fn update_object<H>(&self, hydrator: &mut H, handle: AdapterHandle) -> MementoResult<()>
    where
        H: Hydrator + ?Sized,
    {
        Restore::new(hydrator).update_object(handle, &self.state)?;
        info!(
            "event=memento_update module=memento status=ok handle={}",
            handle
        );
        Ok(())
    }

    pub fn to_json(&self) -> MementoResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> MementoResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::data::{Data, FieldData};
    use super::{Memento, MementoError};
    use crate::model::adapter::AdapterGraph;
    use crate::model::spec::{Association, ObjectSpec};
    use crate::session::InMemorySession;
    use crate::value::scalar::{ScalarValue, TextCodec};
    use std::sync::Arc;

    fn session() -> InMemorySession {
        InMemorySession::with_specs([
            ObjectSpec::entity("demo.Node")
                .with(Association::value("name", Arc::new(TextCodec)))
                .with(Association::one_to_one("peer", "demo.Node")),
            ObjectSpec::entity("demo.Tag").with(Association::value("label", Arc::new(TextCodec))),
        ])
    }

    #[test]
    fn capture_of_mutual_references_terminates() {
        let mut session = session();
        let a = session.create_transient("demo.Node").unwrap();
        let b = session.create_transient("demo.Node").unwrap();
        session.set_reference(a, "peer", Some(b)).unwrap();
        session.set_reference(b, "peer", Some(a)).unwrap();

        let memento = Memento::capture(&session, a).unwrap();
        assert_eq!(memento.state().inline_count(), 2);

        let Data::Object(root) = memento.state() else {
            panic!("root must be inlined");
        };
        let Some(FieldData::Reference(peer)) = root.entry("peer") else {
            panic!("peer must be captured");
        };
        let Data::Object(peer) = peer.as_ref() else {
            panic!("transient peer must be inlined");
        };
        let Some(FieldData::Reference(back)) = peer.entry("peer") else {
            panic!("back reference must be captured");
        };
        assert!(matches!(back.as_ref(), Data::Reference(_)));
    }

    #[test]
    fn standalone_values_make_memento_session_bound() {
        let mut session = session();
        let node = session.create_transient("demo.Node").unwrap();
        let detached = session.create_standalone("demo.Node").unwrap();
        session.set_reference(node, "peer", Some(detached)).unwrap();

        let memento = Memento::capture(&session, node).unwrap();
        assert!(!memento.is_portable());
    }

    #[test]
    fn standalone_root_has_no_identity() {
        let mut session = session();
        let tag = session.create_standalone("demo.Tag").unwrap();
        let err = Memento::capture(&session, tag).unwrap_err();
        assert!(matches!(err, MementoError::MissingIdentity { .. }));
    }

    #[test]
    fn json_keeps_encoded_fields() {
        let mut session = session();
        let node = session.create_transient("demo.Node").unwrap();
        session
            .set_scalar(node, "name", Some(ScalarValue::Text("root".to_string())))
            .unwrap();

        let memento = Memento::capture(&session, node).unwrap();
        let json = memento.to_json().unwrap();
        assert!(json.contains("\"kind\":\"encoded\""));
        assert_eq!(Memento::from_json(&json).unwrap(), memento);
    }
}
