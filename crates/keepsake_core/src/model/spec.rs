//! Object specifications and their associations.
//!
//! Each association is tagged once with its capability (`OneToOne`,
//! `OneToMany`, `EncodableValue`); capture and restore both match on it.

use crate::value::scalar::ValueCodec;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecKind {
    /// Independently addressable object.
    Entity,
    /// Owned exclusively by another object; never looked up on its own.
    Parented,
    /// Free-standing collection of elements.
    Collection { element_type: String },
}

#[derive(Debug, Clone)]
pub enum AssociationKind {
    OneToOne { target_type: String },
    OneToMany { element_type: String },
    EncodableValue(Arc<dyn ValueCodec>),
}

/// One field of a specification.
#[derive(Debug, Clone)]
pub struct Association {
    pub id: String,
    pub kind: AssociationKind,
    pub not_persisted: bool,
    pub has_accessor: bool,
    pub has_setter: bool,
}

impl Association {
    fn new(id: impl Into<String>, kind: AssociationKind) -> Self {
        Self {
            id: id.into(),
            kind,
            not_persisted: false,
            has_accessor: true,
            has_setter: true,
        }
    }

    pub fn one_to_one(id: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::new(
            id,
            AssociationKind::OneToOne {
                target_type: target_type.into(),
            },
        )
    }

    pub fn one_to_many(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self::new(
            id,
            AssociationKind::OneToMany {
                element_type: element_type.into(),
            },
        )
    }

    pub fn value(id: impl Into<String>, codec: Arc<dyn ValueCodec>) -> Self {
        Self::new(id, AssociationKind::EncodableValue(codec))
    }

    pub fn not_persisted(mut self) -> Self {
        self.not_persisted = true;
        self
    }

    /// Accessor without a setter.
    pub fn read_only(mut self) -> Self {
        self.has_setter = false;
        self
    }

    pub fn is_one_to_many(&self) -> bool {
        matches!(self.kind, AssociationKind::OneToMany { .. })
    }

    /// Whether this field is part of the snapshot state.
    ///
    /// Not-persisted collections and not-persisted derived properties
    /// (accessor, no setter) are computed by the domain, not captured.
    pub fn is_snapshot_state(&self) -> bool {
        if !self.not_persisted {
            return true;
        }
        !(self.is_one_to_many() || (self.has_accessor && !self.has_setter))
    }
}

#[derive(Debug, Clone)]
pub struct ObjectSpec {
    pub name: String,
    pub kind: SpecKind,
    pub associations: Vec<Association>,
}

impl ObjectSpec {
    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SpecKind::Entity,
            associations: Vec::new(),
        }
    }

    pub fn parented(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SpecKind::Parented,
            associations: Vec::new(),
        }
    }

    pub fn collection(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SpecKind::Collection {
                element_type: element_type.into(),
            },
            associations: Vec::new(),
        }
    }

    pub fn with(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn association(&self, id: &str) -> Option<&Association> {
        self.associations.iter().find(|association| association.id == id)
    }

    pub fn is_parented(&self) -> bool {
        self.kind == SpecKind::Parented
    }

    pub fn element_type(&self) -> Option<&str> {
        match &self.kind {
            SpecKind::Collection { element_type } => Some(element_type),
            _ => None,
        }
    }
}
