//! Arena-backed session with a mutation log.

use crate::model::adapter::{
    AdapterGraph, AdapterHandle, FieldValue, GraphError, GraphResult, Hydrator, ObjectAdapter,
};
use crate::model::oid::Oid;
use crate::model::resolve_state::ResolveState;
use crate::model::spec::ObjectSpec;
use crate::value::scalar::ScalarValue;
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One recorded mutation applied through the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    ScalarSet {
        owner: AdapterHandle,
        field: String,
    },
    ReferenceSet {
        owner: AdapterHandle,
        field: String,
        target: Option<AdapterHandle>,
    },
    ElementAdded {
        owner: AdapterHandle,
        field: String,
        element: AdapterHandle,
    },
    ElementRemoved {
        owner: AdapterHandle,
        field: String,
        element: AdapterHandle,
    },
    CollectionInitialised {
        collection: AdapterHandle,
        size: usize,
    },
    StateChanged {
        handle: AdapterHandle,
        from: ResolveState,
        to: ResolveState,
    },
}

#[derive(Debug, Default)]
pub struct InMemorySession {
    specs: BTreeMap<String, Arc<ObjectSpec>>,
    adapters: Vec<ObjectAdapter>,
    by_oid: HashMap<Oid, AdapterHandle>,
    changes: Vec<ChangeEvent>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session preloaded with the given specifications.
    pub fn with_specs(specs: impl IntoIterator<Item = ObjectSpec>) -> Self {
        let mut session = Self::new();
        for spec in specs {
            session.register_spec(spec);
        }
        session
    }

    pub fn register_spec(&mut self, spec: ObjectSpec) -> Arc<ObjectSpec> {
        let spec = Arc::new(spec);
        self.specs.insert(spec.name.clone(), Arc::clone(&spec));
        spec
    }

    /// New transient object with a generated identity.
    pub fn create_transient(&mut self, type_name: &str) -> GraphResult<AdapterHandle> {
        let spec = self.specification(type_name)?;
        let oid = Oid::transient(type_name);
        Ok(self.insert(ObjectAdapter::new(spec, Some(oid), ResolveState::Transient)))
    }

    /// Already-persisted object, fully resolved.
    pub fn create_persistent(
        &mut self,
        type_name: &str,
        identifier: &str,
    ) -> GraphResult<AdapterHandle> {
        let spec = self.specification(type_name)?;
        let oid = Oid::persistent(type_name, identifier);
        Ok(self.insert(ObjectAdapter::new(spec, Some(oid), ResolveState::Resolved)))
    }

    /// Object owned by `owner`; inherits the owner's lifecycle.
    pub fn create_parented(
        &mut self,
        owner: AdapterHandle,
        type_name: &str,
        local_name: &str,
    ) -> GraphResult<AdapterHandle> {
        let spec = self.specification(type_name)?;
        let owner = self.adapter(owner)?;
        let owner_oid = owner
            .oid()
            .cloned()
            .unwrap_or_else(|| Oid::transient(owner.spec().name.clone()));
        let state = if owner_oid.is_transient() {
            ResolveState::Transient
        } else {
            ResolveState::Resolved
        };
        let oid = Oid::parented(&owner_oid, type_name, local_name);
        Ok(self.insert(ObjectAdapter::new(spec, Some(oid), state)))
    }

    /// Value-like object without identity.
    pub fn create_standalone(&mut self, type_name: &str) -> GraphResult<AdapterHandle> {
        let spec = self.specification(type_name)?;
        Ok(self.insert(ObjectAdapter::new(spec, None, ResolveState::Transient)))
    }

    /// Free-standing collection adapter with a transient identity.
    pub fn create_collection(
        &mut self,
        type_name: &str,
        elements: Vec<AdapterHandle>,
    ) -> GraphResult<AdapterHandle> {
        let spec = self.specification(type_name)?;
        if spec.element_type().is_none() {
            return Err(GraphError::NotACollection(type_name.to_string()));
        }
        let oid = Oid::transient(type_name);
        let mut adapter = ObjectAdapter::new(spec, Some(oid), ResolveState::Transient);
        *adapter.elements_mut() = elements;
        Ok(self.insert(adapter))
    }

    pub fn lookup(&self, oid: &Oid) -> Option<AdapterHandle> {
        self.by_oid.get(oid).copied()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn changes(&self) -> &[ChangeEvent] {
        &self.changes
    }

    /// Drops the mutation log, e.g. after building a fixture.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn insert(&mut self, adapter: ObjectAdapter) -> AdapterHandle {
        let handle = AdapterHandle(self.adapters.len());
        if let Some(oid) = adapter.oid() {
            self.by_oid.insert(oid.clone(), handle);
        }
        trace!(
            "event=adapter_created module=session handle={} type={} state={}",
            handle,
            adapter.spec().name,
            adapter.resolve_state()
        );
        self.adapters.push(adapter);
        handle
    }

    fn adapter_mut(&mut self, handle: AdapterHandle) -> GraphResult<&mut ObjectAdapter> {
        self.adapters
            .get_mut(handle.0)
            .ok_or(GraphError::UnknownAdapter(handle))
    }

    fn field_mut(&mut self, owner: AdapterHandle, field: &str) -> GraphResult<&mut FieldValue> {
        let adapter = self.adapter_mut(owner)?;
        let type_name = adapter.spec().name.clone();
        adapter
            .field_mut(field)
            .ok_or_else(|| GraphError::UnknownField {
                type_name,
                field: field.to_string(),
            })
    }

    fn collection_field_mut(
        &mut self,
        owner: AdapterHandle,
        field: &str,
    ) -> GraphResult<&mut Vec<AdapterHandle>> {
        let type_name = self.adapter(owner)?.spec().name.clone();
        match self.field_mut(owner, field)? {
            FieldValue::Collection(elements) => Ok(elements),
            other => Err(GraphError::FieldKindMismatch {
                type_name,
                field: field.to_string(),
                expected: "collection",
                found: other.kind_name(),
            }),
        }
    }
}

impl AdapterGraph for InMemorySession {
    fn adapter(&self, handle: AdapterHandle) -> GraphResult<&ObjectAdapter> {
        self.adapters
            .get(handle.0)
            .ok_or(GraphError::UnknownAdapter(handle))
    }

    fn set_scalar(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        value: Option<ScalarValue>,
    ) -> GraphResult<()> {
        let type_name = self.adapter(owner)?.spec().name.clone();
        match self.field_mut(owner, field)? {
            FieldValue::Scalar(slot) => *slot = value,
            other => {
                return Err(GraphError::FieldKindMismatch {
                    type_name,
                    field: field.to_string(),
                    expected: "scalar",
                    found: other.kind_name(),
                })
            }
        }
        self.changes.push(ChangeEvent::ScalarSet {
            owner,
            field: field.to_string(),
        });
        Ok(())
    }

    fn set_reference(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        target: Option<AdapterHandle>,
    ) -> GraphResult<()> {
        if let Some(target) = target {
            self.adapter(target)?;
        }
        let type_name = self.adapter(owner)?.spec().name.clone();
        match self.field_mut(owner, field)? {
            FieldValue::Reference(slot) => *slot = target,
            other => {
                return Err(GraphError::FieldKindMismatch {
                    type_name,
                    field: field.to_string(),
                    expected: "reference",
                    found: other.kind_name(),
                })
            }
        }
        self.changes.push(ChangeEvent::ReferenceSet {
            owner,
            field: field.to_string(),
            target,
        });
        Ok(())
    }

    fn add_element(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        element: AdapterHandle,
    ) -> GraphResult<()> {
        self.adapter(element)?;
        self.collection_field_mut(owner, field)?.push(element);
        self.changes.push(ChangeEvent::ElementAdded {
            owner,
            field: field.to_string(),
            element,
        });
        Ok(())
    }

    fn remove_element(
        &mut self,
        owner: AdapterHandle,
        field: &str,
        element: AdapterHandle,
    ) -> GraphResult<()> {
        self.collection_field_mut(owner, field)?
            .retain(|existing| *existing != element);
        self.changes.push(ChangeEvent::ElementRemoved {
            owner,
            field: field.to_string(),
            element,
        });
        Ok(())
    }

    fn init_collection(
        &mut self,
        collection: AdapterHandle,
        elements: Vec<AdapterHandle>,
    ) -> GraphResult<()> {
        let adapter = self.adapter_mut(collection)?;
        if !adapter.is_collection() {
            return Err(GraphError::NotACollection(adapter.spec().name.clone()));
        }
        let size = elements.len();
        *adapter.elements_mut() = elements;
        self.changes
            .push(ChangeEvent::CollectionInitialised { collection, size });
        Ok(())
    }

    fn change_state(&mut self, handle: AdapterHandle, target: ResolveState) -> GraphResult<()> {
        let adapter = self.adapter_mut(handle)?;
        let from = adapter.resolve_state();
        if !from.can_transition_to(target) {
            return Err(GraphError::IllegalTransition { from, to: target });
        }
        adapter.set_resolve_state(target);
        debug!(
            "event=resolve_state module=session handle={} from={} to={}",
            handle, from, target
        );
        self.changes.push(ChangeEvent::StateChanged {
            handle,
            from,
            to: target,
        });
        Ok(())
    }
}

impl Hydrator for InMemorySession {
    fn specification(&self, type_name: &str) -> GraphResult<Arc<ObjectSpec>> {
        self.specs
            .get(type_name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownSpecification(type_name.to_string()))
    }

    fn hydrate(&mut self, spec: &Arc<ObjectSpec>, oid: &Oid) -> GraphResult<AdapterHandle> {
        if let Some(handle) = self.lookup(oid) {
            return Ok(handle);
        }
        Ok(self.insert(ObjectAdapter::new(
            Arc::clone(spec),
            Some(oid.clone()),
            ResolveState::New,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeEvent, InMemorySession};
    use crate::model::adapter::{AdapterGraph, GraphError, Hydrator};
    use crate::model::oid::Oid;
    use crate::model::resolve_state::ResolveState;
    use crate::model::spec::{Association, ObjectSpec};

    fn session() -> InMemorySession {
        InMemorySession::with_specs([
            ObjectSpec::entity("demo.Order")
                .with(Association::one_to_many("lines", "demo.Line"))
                .with(Association::one_to_one("customer", "demo.Customer")),
            ObjectSpec::entity("demo.Line"),
            ObjectSpec::entity("demo.Customer"),
        ])
    }

    #[test]
    fn hydrate_reuses_registered_adapters() {
        let mut session = session();
        let order = session.create_persistent("demo.Order", "1").unwrap();
        let spec = session.specification("demo.Order").unwrap();

        let again = session
            .hydrate(&spec, &Oid::persistent("demo.Order", "1"))
            .unwrap();
        assert_eq!(again, order);

        let placeholder = session
            .hydrate(&spec, &Oid::persistent("demo.Order", "2"))
            .unwrap();
        assert_ne!(placeholder, order);
        assert_eq!(
            session.adapter(placeholder).unwrap().resolve_state(),
            ResolveState::New
        );
    }

    #[test]
    fn change_state_enforces_transitions() {
        let mut session = session();
        let order = session.create_transient("demo.Order").unwrap();

        let err = session
            .change_state(order, ResolveState::Updating)
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::IllegalTransition {
                from: ResolveState::Transient,
                to: ResolveState::Updating,
            }
        );
        session
            .change_state(order, ResolveState::SerializingTransient)
            .unwrap();
        assert_eq!(session.changes().len(), 1);
    }

    #[test]
    fn mutations_are_logged_and_kind_checked() {
        let mut session = session();
        let order = session.create_transient("demo.Order").unwrap();
        let line = session.create_transient("demo.Line").unwrap();

        session.add_element(order, "lines", line).unwrap();
        let err = session.set_reference(order, "lines", Some(line)).unwrap_err();
        assert!(matches!(
            err,
            GraphError::FieldKindMismatch {
                expected: "reference",
                found: "collection",
                ..
            }
        ));
        assert_eq!(
            session.changes(),
            &[ChangeEvent::ElementAdded {
                owner: order,
                field: "lines".to_string(),
                element: line,
            }]
        );
    }
}
