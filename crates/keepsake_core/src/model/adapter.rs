//! Adapters over live domain objects and the collaborator contracts used by
//! mementos to read and rebuild them.
//!
//! # Responsibility
//! - Attach identity, specification and resolve state to field values.
//! - Define `AdapterGraph` (read/mutate live adapters) and `Hydrator`
//!   (locate or create adapters by identity).
//!
//! # Invariants
//! - Adapters are addressed by `AdapterHandle`; handle equality is object
//!   identity.
//! - A field's `FieldValue` variant matches its association kind.

use crate::model::oid::Oid;
use crate::model::resolve_state::ResolveState;
use crate::model::spec::{AssociationKind, ObjectSpec};
use crate::value::scalar::ScalarValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Session-scoped identity of a live adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdapterHandle(pub usize);

impl Display for AdapterHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Option<ScalarValue>),
    Reference(Option<AdapterHandle>),
    Collection(Vec<AdapterHandle>),
}

impl FieldValue {
    /// Empty value matching an association kind.
    pub fn empty_for(kind: &AssociationKind) -> Self {
        match kind {
            AssociationKind::OneToOne { .. } => Self::Reference(None),
            AssociationKind::OneToMany { .. } => Self::Collection(Vec::new()),
            AssociationKind::EncodableValue(_) => Self::Scalar(None),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Reference(_) => "reference",
            Self::Collection(_) => "collection",
        }
    }
}

/// A live object with framework-managed identity and state.
#[derive(Debug, Clone)]
pub struct ObjectAdapter {
    oid: Option<Oid>,
    spec: Arc<ObjectSpec>,
    resolve_state: ResolveState,
    fields: BTreeMap<String, FieldValue>,
    elements: Vec<AdapterHandle>,
}

impl ObjectAdapter {
    /// Creates an adapter with every field empty.
    pub fn new(spec: Arc<ObjectSpec>, oid: Option<Oid>, resolve_state: ResolveState) -> Self {
        let fields = spec
            .associations
            .iter()
            .map(|association| {
                (
                    association.id.clone(),
                    FieldValue::empty_for(&association.kind),
                )
            })
            .collect();
        Self {
            oid,
            spec,
            resolve_state,
            fields,
            elements: Vec::new(),
        }
    }

    pub fn oid(&self) -> Option<&Oid> {
        self.oid.as_ref()
    }

    pub fn spec(&self) -> &Arc<ObjectSpec> {
        &self.spec
    }

    pub fn resolve_state(&self) -> ResolveState {
        self.resolve_state
    }

    pub fn set_resolve_state(&mut self, state: ResolveState) {
        self.resolve_state = state;
    }

    pub fn is_parented(&self) -> bool {
        self.spec.is_parented()
    }

    pub fn is_collection(&self) -> bool {
        self.spec.element_type().is_some()
    }

    /// Transient by identity or by lifecycle.
    pub fn is_transient(&self) -> bool {
        self.oid.as_ref().is_some_and(Oid::is_transient) || self.resolve_state.is_transient()
    }

    pub fn field(&self, id: &str) -> Option<&FieldValue> {
        self.fields.get(id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(id)
    }

    /// Elements of a collection adapter.
    pub fn elements(&self) -> &[AdapterHandle] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut Vec<AdapterHandle> {
        &mut self.elements
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Failures reported by graph and hydrator collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    UnknownAdapter(AdapterHandle),
    UnknownSpecification(String),
    UnknownField {
        type_name: String,
        field: String,
    },
    FieldKindMismatch {
        type_name: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    NotACollection(String),
    IllegalTransition {
        from: ResolveState,
        to: ResolveState,
    },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAdapter(handle) => write!(f, "unknown adapter {handle}"),
            Self::UnknownSpecification(name) => write!(f, "unknown specification `{name}`"),
            Self::UnknownField { type_name, field } => {
                write!(f, "`{type_name}` has no field `{field}`")
            }
            Self::FieldKindMismatch {
                type_name,
                field,
                expected,
                found,
            } => write!(
                f,
                "field `{type_name}.{field}` holds a {found} value, expected {expected}"
            ),
            Self::NotACollection(type_name) => write!(f, "`{type_name}` is not a collection"),
            Self::IllegalTransition { from, to } => {
                write!(f, "resolve state cannot change from {from} to {to}")
            }
        }
    }
}

impl Error for GraphError {}

/// Read and mutate access to live adapters.
///
/// Mutations are routed through the graph so implementations can track
/// changes (ORM dirty tracking, audit logs).
pub trait AdapterGraph {
    fn adapter(&self, handle: AdapterHandle) -> GraphResult<&ObjectAdapter>;

    fn set_scalar(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        value: Option<ScalarValue>,
    ) -> GraphResult<()>;

    fn set_reference(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        target: Option<AdapterHandle>,
    ) -> GraphResult<()>;

    fn add_element(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        element: AdapterHandle,
    ) -> GraphResult<()>;

    fn remove_element(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        element: AdapterHandle,
    ) -> GraphResult<()>;

    /// Replaces every element of a collection adapter in one call.
    fn init_collection(
        &mut self,
        collection: AdapterHandle,
        elements: Vec<AdapterHandle>,
    ) -> GraphResult<()>;

    /// Moves an adapter to `target`, honouring `ResolveState::can_transition_to`.
    fn change_state(&mut self, handle: AdapterHandle, target: ResolveState) -> GraphResult<()>;
}

/// Locates or creates adapters by identity during reconstruction.
pub trait Hydrator: AdapterGraph {
    fn specification(&self, type_name: &str) -> GraphResult<Arc<ObjectSpec>>;

    /// Returns the adapter registered for `oid`, creating a `New` placeholder
    /// when none exists yet.
    fn hydrate(&mut self, spec: &Arc<ObjectSpec>, oid: &Oid) -> GraphResult<AdapterHandle>;
}
