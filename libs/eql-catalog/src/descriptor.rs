//! Canonical type descriptors
//!
//! One [`TypeDescriptor`] exists per type name within a registry; everything
//! here is immutable after construction except the write-once shape cell on
//! object descriptors.

use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::shape;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use sigil_schema::{Cardinality, PointerKind, TypeId};
use std::sync::Arc;

/// A canonical, snapshot-scoped type descriptor.
#[derive(Debug)]
pub enum TypeDescriptor {
    Scalar(ScalarDescriptor),
    Object(ObjectDescriptor),
    Array(ArrayDescriptor),
    Tuple(TupleDescriptor),
    NamedTuple(NamedTupleDescriptor),
}

impl TypeDescriptor {
    pub fn id(&self) -> TypeId {
        match self {
            TypeDescriptor::Scalar(s) => s.id,
            TypeDescriptor::Object(o) => o.id,
            TypeDescriptor::Array(a) => a.id,
            TypeDescriptor::Tuple(t) => t.id,
            TypeDescriptor::NamedTuple(t) => t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Scalar(s) => &s.name,
            TypeDescriptor::Object(o) => &o.name,
            TypeDescriptor::Array(a) => &a.name,
            TypeDescriptor::Tuple(t) => &t.name,
            TypeDescriptor::NamedTuple(t) => &t.name,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectDescriptor> {
        match self {
            TypeDescriptor::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarDescriptor> {
        match self {
            TypeDescriptor::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeDescriptor::Object(_))
    }

    /// The unbound polymorphic placeholder. Signatures reference it; a call
    /// site must bind it to a concrete type before the result can exist.
    pub fn is_polymorphic(&self) -> bool {
        self.name() == "anytype"
    }
}

/// Scalar type; for enums, carries the member list.
#[derive(Debug)]
pub struct ScalarDescriptor {
    pub id: TypeId,
    pub name: String,
    pub is_abstract: bool,
    pub bases: Vec<TypeId>,
    pub enum_values: Vec<String>,
}

impl ScalarDescriptor {
    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }
}

/// Object type: own pointers plus lazily-flattened inherited shape.
#[derive(Debug)]
pub struct ObjectDescriptor {
    pub id: TypeId,
    pub name: String,
    pub is_abstract: bool,
    pub bases: Vec<TypeId>,
    /// Own pointers in walk order: declared links/properties, then
    /// backlinks, then backlink stubs. Inherited pointers are not here; they
    /// appear in the flattened shape.
    pub(crate) own_pointers: Vec<Arc<PointerDescriptor>>,
    pub(crate) shape: OnceCell<ObjectShape>,
}

impl ObjectDescriptor {
    /// Full pointer shape of this object: own pointers first, then each
    /// base's recursively, most-derived declaration winning on name
    /// collisions. Computed on first call and cached.
    pub fn pointers(&self, registry: &SchemaRegistry) -> Result<&ObjectShape> {
        self.shape
            .get_or_try_init(|| shape::build_shape(self, registry))
    }

    /// Shape accessor for descriptors whose shape was supplied up front
    /// (merged union types); never walks the registry.
    pub fn prebuilt_shape(&self) -> Option<&ObjectShape> {
        self.shape.get()
    }
}

/// Array type with one element type.
#[derive(Debug)]
pub struct ArrayDescriptor {
    pub id: TypeId,
    pub name: String,
    pub element_id: TypeId,
}

/// Unnamed tuple: ordered element types.
#[derive(Debug)]
pub struct TupleDescriptor {
    pub id: TypeId,
    pub name: String,
    pub elements: Vec<TypeId>,
}

/// Named tuple: keyed, ordered element types.
#[derive(Debug)]
pub struct NamedTupleDescriptor {
    pub id: TypeId,
    pub name: String,
    pub elements: IndexMap<String, TypeId>,
}

/// A named property or link on an object type.
///
/// Owned by its declaring descriptor; inherited occurrences in derived
/// shapes share the same `Arc`, they are never duplicated.
#[derive(Debug, PartialEq)]
pub struct PointerDescriptor {
    pub name: String,
    pub kind: PointerKind,
    pub cardinality: Cardinality,
    pub target_id: TypeId,
    pub is_exclusive: bool,
    pub is_writable: bool,
    /// Properties attached to the link itself rather than its target.
    pub link_properties: Vec<Arc<PointerDescriptor>>,
}

impl PointerDescriptor {
    pub fn is_link(&self) -> bool {
        self.kind == PointerKind::Link
    }
}

/// Ordered pointer shape of an object type, keyed by pointer name.
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    pointers: IndexMap<String, Arc<PointerDescriptor>>,
}

impl ObjectShape {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert unless the name is already present (first occurrence wins).
    pub(crate) fn insert_first_wins(&mut self, pointer: Arc<PointerDescriptor>) {
        if !self.pointers.contains_key(&pointer.name) {
            self.pointers.insert(pointer.name.clone(), pointer);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PointerDescriptor>> {
        self.pointers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pointers.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<PointerDescriptor>)> {
        self.pointers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}
