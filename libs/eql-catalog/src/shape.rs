//! Pointer-shape construction and merging
//!
//! Two concerns live here: flattening an object type's inherited shape
//! (derived declarations shadow ancestors) and merging the shapes of two
//! object-typed branches that combine into a single value (union, coalesce,
//! conditional).

use crate::descriptor::{ObjectDescriptor, ObjectShape, TypeDescriptor};
use crate::error::{Error, Result};
use crate::registry::SchemaRegistry;
use once_cell::sync::OnceCell;
use uuid::Uuid;

/// Flatten the full pointer shape of `obj`.
///
/// Walk order: own pointers (declared links/properties, backlinks, backlink
/// stubs — already ordered that way at construction), then each base type's
/// shape recursively. The first occurrence of a name wins, so the
/// most-derived declaration shadows every ancestor's.
pub(crate) fn build_shape(
    obj: &ObjectDescriptor,
    registry: &SchemaRegistry,
) -> Result<ObjectShape> {
    let mut shape = ObjectShape::new();

    for pointer in &obj.own_pointers {
        shape.insert_first_wins(pointer.clone());
    }

    for base_id in &obj.bases {
        let base = registry.resolve(*base_id)?;
        let base = base.as_object().ok_or_else(|| Error::InvalidBaseType {
            name: base.name().to_string(),
        })?;
        // Memoized per descriptor, so the recursion bottoms out cheaply on
        // shared ancestors.
        for (_, pointer) in base.pointers(registry)?.iter() {
            shape.insert_first_wins(pointer.clone());
        }
    }

    Ok(shape)
}

/// Merge the pointer shapes of two alternative object-typed branches.
///
/// A pointer survives only if both shapes declare it with identical
/// cardinality and identical target type; everything else is dropped.
/// Target comparison is by descriptor id — within one registry that is the
/// same as comparing target type names, since descriptors are canonical per
/// name.
pub fn merge_shapes(a: &ObjectShape, b: &ObjectShape) -> ObjectShape {
    let mut merged = ObjectShape::new();
    for (name, pointer) in a.iter() {
        let Some(other) = b.get(name) else {
            continue;
        };
        if other.cardinality == pointer.cardinality && other.target_id == pointer.target_id {
            merged.insert_first_wins(pointer.clone());
        }
    }
    merged
}

/// Synthesize the object type of a value formed by two object-typed
/// branches. The merged descriptor is snapshot-local and never registered:
/// it exists only as the element type of the combining expression.
pub fn merge_object_types(
    registry: &SchemaRegistry,
    a: &ObjectDescriptor,
    b: &ObjectDescriptor,
) -> Result<TypeDescriptor> {
    let shape = merge_shapes(a.pointers(registry)?, b.pointers(registry)?);

    let own_pointers = shape.iter().map(|(_, p)| p.clone()).collect();
    let cell = OnceCell::new();
    // Freshly constructed cell, cannot already be set.
    let _ = cell.set(shape);

    Ok(TypeDescriptor::Object(ObjectDescriptor {
        id: Uuid::new_v4(),
        name: format!("{} UNION {}", a.name, b.name),
        is_abstract: false,
        bases: Vec::new(),
        own_pointers,
        shape: cell,
    }))
}
