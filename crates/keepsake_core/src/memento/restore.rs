//! Restore side: `Data` tree -> live adapters.
//!
//! # Invariants
//! - Identity is checked before any mutation on `update_object`.
//! - Resolve-state changes go through the hydrator; objects outside the
//!   lifecycle (transient re-serialisation, parented) are updated directly.
//! - Fresh collections are initialised in one call; existing one-to-many
//!   fields are diffed.

use crate::memento::data::{CollectionData, Data, FieldData, ObjectData};
use crate::memento::{MementoError, MementoResult};
use crate::model::adapter::{AdapterHandle, FieldValue, GraphError, Hydrator};
use crate::model::oid::Oid;
use crate::model::resolve_state::ResolveState;
use crate::model::spec::{Association, AssociationKind};
use crate::value::scalar::{ScalarValue, ValueCodec};
use log::{debug, warn};
use std::sync::Arc;

pub(crate) struct Restore<'h, H: Hydrator + ?Sized> {
    hydrator: &'h mut H,
}

impl<'h, H: Hydrator + ?Sized> Restore<'h, H> {
    pub(crate) fn new(hydrator: &'h mut H) -> Self {
        Self { hydrator }
    }

    pub(crate) fn recreate_object(&mut self, data: &Data) -> MementoResult<AdapterHandle> {
        match data {
            Data::Object(object) => {
                let handle = self.hydrate(&object.type_name, &object.oid)?;
                self.update_fields_and_resolve_state(handle, object)?;
                Ok(handle)
            }
            Data::Collection(collection) => {
                let handle = self.hydrate(&collection.type_name, &collection.oid)?;
                self.populate_collection(handle, collection)?;
                Ok(handle)
            }
            other => Err(MementoError::UnexpectedData {
                expected: "object or collection",
                found: other.kind_name(),
            }),
        }
    }

    pub(crate) fn update_object(&mut self, handle: AdapterHandle, data: &Data) -> MementoResult<()> {
        let actual = self.hydrator.adapter(handle)?.oid().cloned();
        if let Some(expected) = data.oid() {
            if actual.as_ref() != Some(expected) {
                warn!(
                    "event=memento_update module=memento status=error reason=identity_mismatch handle={}",
                    handle
                );
                return Err(MementoError::IdentityMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        match data {
            Data::Object(object) => self.update_fields_and_resolve_state(handle, object),
            Data::Collection(collection) => self.populate_collection(handle, collection),
            other => Err(MementoError::UnexpectedData {
                expected: "object or collection",
                found: other.kind_name(),
            }),
        }
    }

    /// Locates or creates the adapter for `oid` and moves a fresh placeholder
    /// out of `New`.
    fn hydrate(&mut self, type_name: &str, oid: &Oid) -> MementoResult<AdapterHandle> {
        let spec = self.hydrator.specification(type_name)?;
        let handle = self.hydrator.hydrate(&spec, oid)?;
        if self.hydrator.adapter(handle)?.resolve_state() == ResolveState::New {
            let initial = if oid.is_transient() {
                ResolveState::Transient
            } else {
                ResolveState::Ghost
            };
            self.hydrator.change_state(handle, initial)?;
        }
        Ok(handle)
    }

    fn update_fields_and_resolve_state(
        &mut self,
        handle: AdapterHandle,
        data: &ObjectData,
    ) -> MementoResult<()> {
        let target = if data.oid.is_transient() {
            ResolveState::SerializingTransient
        } else {
            ResolveState::Updating
        };
        let adapter = self.hydrator.adapter(handle)?;
        let current = adapter.resolve_state();
        let outside_lifecycle = (adapter.is_transient()
            && target == ResolveState::SerializingTransient)
            || adapter.is_parented();

        if current.can_transition_to(target) {
            self.hydrator.change_state(handle, target)?;
            self.update_fields(handle, data)?;
            if let Some(end) = target.end_state() {
                self.hydrator.change_state(handle, end)?;
            }
            return Ok(());
        }

        if outside_lifecycle {
            debug!(
                "event=memento_fields_direct module=memento oid={} state={}",
                data.oid, current
            );
            return self.update_fields(handle, data);
        }

        if data.contains_field() {
            warn!(
                "event=memento_update module=memento status=error reason=inconsistent_state oid={} state={}",
                data.oid, current
            );
            return Err(MementoError::InconsistentResolveState {
                oid: data.oid.clone(),
                state: current,
            });
        }
        Ok(())
    }

    fn update_fields(&mut self, handle: AdapterHandle, data: &ObjectData) -> MementoResult<()> {
        let spec = Arc::clone(self.hydrator.adapter(handle)?.spec());
        for association in &spec.associations {
            if !association.is_snapshot_state() {
                continue;
            }
            self.update_field(handle, association, data.entry(&association.id))?;
        }
        Ok(())
    }

    fn update_field(
        &mut self,
        owner: AdapterHandle,
        association: &Association,
        entry: Option<&FieldData>,
    ) -> MementoResult<()> {
        match &association.kind {
            AssociationKind::OneToMany { .. } => match entry {
                None => Ok(()),
                Some(FieldData::Null) => self.update_one_to_many(owner, &association.id, &[]),
                Some(FieldData::Collection(collection)) => {
                    self.update_one_to_many(owner, &association.id, &collection.elements)
                }
                Some(other) => Err(unexpected_field("collection", other)),
            },
            AssociationKind::EncodableValue(codec) => {
                let value = decode_scalar(codec.as_ref(), entry)?;
                let current = match self.current_field(owner, &association.id)? {
                    FieldValue::Scalar(current) => current,
                    other => {
                        return Err(self.field_mismatch(owner, &association.id, "scalar", &other))
                    }
                };
                if current != value {
                    self.hydrator.set_scalar(owner, &association.id, value)?;
                }
                Ok(())
            }
            AssociationKind::OneToOne { .. } => {
                let target = match entry {
                    None | Some(FieldData::Null) => None,
                    Some(FieldData::Reference(data)) => Some(self.recreate_reference(data)?),
                    Some(other) => return Err(unexpected_field("reference", other)),
                };
                let current = match self.current_field(owner, &association.id)? {
                    FieldValue::Reference(current) => current,
                    other => {
                        return Err(self.field_mismatch(owner, &association.id, "reference", &other))
                    }
                };
                if current != target {
                    self.hydrator.set_reference(owner, &association.id, target)?;
                }
                Ok(())
            }
        }
    }

    /// Removes live elements missing from `elements`, then adds new ones.
    fn update_one_to_many(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        elements: &[Data],
    ) -> MementoResult<()> {
        let mut wanted = Vec::with_capacity(elements.len());
        for element in elements {
            wanted.push(self.recreate_reference(element)?);
        }
        let original = match self.current_field(owner, field)? {
            FieldValue::Collection(original) => original,
            other => return Err(self.field_mismatch(owner, field, "collection", &other)),
        };

        for element in original.iter().filter(|element| !wanted.contains(element)) {
            self.hydrator.remove_element(owner, field, *element)?;
        }
        for element in wanted.iter().filter(|element| !original.contains(element)) {
            self.hydrator.add_element(owner, field, *element)?;
        }
        Ok(())
    }

    fn populate_collection(
        &mut self,
        handle: AdapterHandle,
        data: &CollectionData,
    ) -> MementoResult<()> {
        let mut elements = Vec::with_capacity(data.elements.len());
        for element in &data.elements {
            elements.push(self.recreate_reference(element)?);
        }
        self.hydrator.init_collection(handle, elements)?;
        Ok(())
    }

    /// Inverse of the capture-side reference decision.
    fn recreate_reference(&mut self, data: &Data) -> MementoResult<AdapterHandle> {
        match data {
            Data::Standalone(standalone) => {
                let live_type = &self.hydrator.adapter(standalone.adapter)?.spec().name;
                if *live_type != standalone.type_name {
                    warn!(
                        "event=memento_restore module=memento status=error reason=standalone_type_mismatch handle={} expected={} found={}",
                        standalone.adapter, standalone.type_name, live_type
                    );
                    return Err(MementoError::UnexpectedData {
                        expected: "standalone adapter of the recorded type",
                        found: "adapter of another type",
                    });
                }
                Ok(standalone.adapter)
            }
            Data::Reference(reference) => self.hydrate(&reference.type_name, &reference.oid),
            Data::Object(object) => {
                let handle = self.hydrate(&object.type_name, &object.oid)?;
                self.update_fields_and_resolve_state(handle, object)?;
                Ok(handle)
            }
            Data::Collection(collection) => {
                let handle = self.hydrate(&collection.type_name, &collection.oid)?;
                self.populate_collection(handle, collection)?;
                Ok(handle)
            }
        }
    }

    fn current_field(&self, owner: AdapterHandle, field: &str) -> MementoResult<FieldValue> {
        let adapter = self.hydrator.adapter(owner)?;
        adapter.field(field).cloned().ok_or_else(|| {
            MementoError::Graph(GraphError::UnknownField {
                type_name: adapter.spec().name.clone(),
                field: field.to_string(),
            })
        })
    }

    fn field_mismatch(
        &self,
        owner: AdapterHandle,
        field: &str,
        expected: &'static str,
        found: &FieldValue,
    ) -> MementoError {
        let type_name = self
            .hydrator
            .adapter(owner)
            .map(|adapter| adapter.spec().name.clone())
            .unwrap_or_default();
        MementoError::Graph(GraphError::FieldKindMismatch {
            type_name,
            field: field.to_string(),
            expected,
            found: found.kind_name(),
        })
    }
}

fn decode_scalar(
    codec: &dyn ValueCodec,
    entry: Option<&FieldData>,
) -> MementoResult<Option<ScalarValue>> {
    match entry {
        None | Some(FieldData::Null) => Ok(None),
        Some(FieldData::Encoded(text)) => Ok(Some(codec.from_encoded_string(text)?)),
        Some(other) => Err(unexpected_field("encoded", other)),
    }
}

fn unexpected_field(expected: &'static str, found: &FieldData) -> MementoError {
    let found = match found {
        FieldData::Null => "null",
        FieldData::Encoded(_) => "encoded",
        FieldData::Reference(_) => "reference",
        FieldData::Collection(_) => "collection",
    };
    MementoError::UnexpectedData { expected, found }
}
