//! Capture side: live adapter graph -> `Data` tree.
//!
//! # Invariants
//! - An object or collection is registered as visited before its fields or
//!   elements are walked, so cycles terminate.
//! - Each identity is inlined at most once per capture pass; later
//!   occurrences become lightweight references.
//! - Parented and transient objects are inlined on first sight; persistent
//!   entities are always referenced.

use crate::memento::data::{
    CollectionData, Data, FieldData, ObjectData, ReferenceData, StandaloneData,
    FIELD_COLLECTION_TYPE,
};
use crate::memento::{MementoError, MementoResult};
use crate::model::adapter::{AdapterGraph, AdapterHandle, FieldValue, GraphError, ObjectAdapter};
use crate::model::oid::Oid;
use crate::model::spec::{Association, AssociationKind};
use log::debug;
use std::collections::HashSet;

pub(crate) struct Capture<'g, G: AdapterGraph + ?Sized> {
    graph: &'g G,
    visited: HashSet<Oid>,
}

impl<'g, G: AdapterGraph + ?Sized> Capture<'g, G> {
    pub(crate) fn new(graph: &'g G) -> Self {
        Self {
            graph,
            visited: HashSet::new(),
        }
    }

    pub(crate) fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Root entry point: collections become `CollectionData`, everything
    /// else a full `ObjectData`.
    pub(crate) fn create_data(&mut self, handle: AdapterHandle) -> MementoResult<Data> {
        let graph = self.graph;
        let adapter = graph.adapter(handle)?;
        if adapter.is_collection() {
            return self.create_collection_data(adapter).map(Data::Collection);
        }
        self.create_object_data(adapter).map(Data::Object)
    }

    fn create_collection_data(
        &mut self,
        adapter: &ObjectAdapter,
    ) -> MementoResult<CollectionData> {
        let oid = require_oid(adapter)?;
        self.visited.insert(oid.clone());
        let element_type = adapter
            .spec()
            .element_type()
            .unwrap_or_default()
            .to_string();
        let elements = self.create_elements(adapter.elements())?;
        Ok(CollectionData {
            oid,
            resolve_state: adapter.resolve_state(),
            type_name: adapter.spec().name.clone(),
            element_type,
            elements,
        })
    }

    fn create_object_data(&mut self, adapter: &ObjectAdapter) -> MementoResult<ObjectData> {
        let oid = require_oid(adapter)?;
        self.visited.insert(oid.clone());

        let spec = adapter.spec();
        let mut data = ObjectData::new(oid, adapter.resolve_state(), spec.name.clone());
        for association in &spec.associations {
            if !association.is_snapshot_state() {
                debug!(
                    "event=memento_field_skipped module=memento type={} field={}",
                    spec.name, association.id
                );
                continue;
            }
            let value = self.create_field_data(adapter, association)?;
            data.push(association.id.clone(), value);
        }
        Ok(data)
    }

    fn create_field_data(
        &mut self,
        owner: &ObjectAdapter,
        association: &Association,
    ) -> MementoResult<FieldData> {
        let value = owner
            .field(&association.id)
            .ok_or_else(|| GraphError::UnknownField {
                type_name: owner.spec().name.clone(),
                field: association.id.clone(),
            })?;

        match (&association.kind, value) {
            (AssociationKind::OneToMany { element_type }, FieldValue::Collection(elements)) => {
                let owner_oid = require_oid(owner)?;
                let collection_oid =
                    Oid::parented(&owner_oid, FIELD_COLLECTION_TYPE, &association.id);
                Ok(FieldData::Collection(CollectionData {
                    oid: collection_oid,
                    resolve_state: owner.resolve_state(),
                    type_name: FIELD_COLLECTION_TYPE.to_string(),
                    element_type: element_type.clone(),
                    elements: self.create_elements(elements)?,
                }))
            }
            (AssociationKind::EncodableValue(codec), FieldValue::Scalar(scalar)) => match scalar {
                Some(scalar) => Ok(FieldData::Encoded(codec.to_encoded_string(scalar)?)),
                None => Ok(FieldData::Null),
            },
            (AssociationKind::OneToOne { .. }, FieldValue::Reference(target)) => {
                match self.create_reference_data(*target)? {
                    Some(data) => Ok(FieldData::Reference(Box::new(data))),
                    None => Ok(FieldData::Null),
                }
            }
            (kind, other) => Err(MementoError::Graph(GraphError::FieldKindMismatch {
                type_name: owner.spec().name.clone(),
                field: association.id.clone(),
                expected: expected_kind(kind),
                found: other.kind_name(),
            })),
        }
    }

    fn create_elements(&mut self, elements: &[AdapterHandle]) -> MementoResult<Vec<Data>> {
        let mut data = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(element_data) = self.create_reference_data(Some(*element))? {
                data.push(element_data);
            }
        }
        Ok(data)
    }

    /// Reference-versus-inline decision for one referenced adapter.
    pub(crate) fn create_reference_data(
        &mut self,
        target: Option<AdapterHandle>,
    ) -> MementoResult<Option<Data>> {
        let Some(handle) = target else {
            return Ok(None);
        };
        let graph = self.graph;
        let adapter = graph.adapter(handle)?;

        let Some(oid) = adapter.oid() else {
            return Ok(Some(Data::Standalone(StandaloneData {
                type_name: adapter.spec().name.clone(),
                adapter: handle,
            })));
        };

        let owned = adapter.is_parented() || oid.is_transient();
        if owned && !self.visited.contains(oid) {
            return self.create_data(handle).map(Some);
        }

        Ok(Some(Data::Reference(ReferenceData {
            oid: oid.clone(),
            resolve_state: adapter.resolve_state(),
            type_name: adapter.spec().name.clone(),
        })))
    }
}

fn require_oid(adapter: &ObjectAdapter) -> MementoResult<Oid> {
    adapter
        .oid()
        .cloned()
        .ok_or_else(|| MementoError::MissingIdentity {
            type_name: adapter.spec().name.clone(),
        })
}

fn expected_kind(kind: &AssociationKind) -> &'static str {
    match kind {
        AssociationKind::OneToOne { .. } => "reference",
        AssociationKind::OneToMany { .. } => "collection",
        AssociationKind::EncodableValue(_) => "scalar",
    }
}
