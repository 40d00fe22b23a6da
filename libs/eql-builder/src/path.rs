//! Path navigation
//!
//! Stepping from an object-typed expression through a named pointer yields a
//! fresh child node per access (children are never cached or shared between
//! call sites), with the child's cardinality being the product of the root's
//! and the pointer's.

use crate::error::{Error, Result};
use crate::expr::{ExprKind, ExpressionNode, PathParent};
use sigil_catalog::{PointerDescriptor, SchemaRegistry, TypeDescriptor};
use sigil_schema::Cardinality;
use std::sync::Arc;

/// A root path: the set of all objects of `type_name`.
pub fn root(registry: &SchemaRegistry, type_name: &str) -> Result<Arc<ExpressionNode>> {
    let element = registry.resolve_by_name(type_name)?;
    if !element.is_object() {
        return Err(Error::NotAnObject(type_name.to_string()));
    }
    Ok(ExpressionNode::new(
        element.clone(),
        Cardinality::Many,
        ExprKind::PathNode { parent: None },
    ))
}

/// Step from `source` through the pointer named `pointer_name`.
pub fn step(
    registry: &SchemaRegistry,
    source: &Arc<ExpressionNode>,
    pointer_name: &str,
) -> Result<Arc<ExpressionNode>> {
    let object = source
        .element()
        .as_object()
        .ok_or_else(|| Error::NotAnObject(source.element().name().to_string()))?;

    let pointer = object
        .pointers(registry)?
        .get(pointer_name)
        .ok_or_else(|| Error::UnknownPointer {
            pointer: pointer_name.to_string(),
            type_name: object.name.clone(),
        })?
        .clone();

    make_step(registry, source, &pointer, pointer_name)
}

/// Access a property of the link `source` was stepped through (`@name`).
pub fn link_property(
    registry: &SchemaRegistry,
    source: &Arc<ExpressionNode>,
    property_name: &str,
) -> Result<Arc<ExpressionNode>> {
    let parent = source
        .path_parent()
        .ok_or_else(|| Error::UnknownPointer {
            pointer: format!("@{property_name}"),
            type_name: source.element().name().to_string(),
        })?;

    let owner_object = parent
        .owner
        .element()
        .as_object()
        .ok_or_else(|| Error::NotAnObject(parent.owner.element().name().to_string()))?;

    let link = owner_object
        .pointers(registry)?
        .get(&parent.link_name)
        .cloned()
        .ok_or_else(|| Error::UnknownPointer {
            pointer: parent.link_name.clone(),
            type_name: owner_object.name.clone(),
        })?;

    let property = link
        .link_properties
        .iter()
        .find(|p| p.name == property_name)
        .ok_or_else(|| Error::UnknownPointer {
            pointer: format!("@{property_name}"),
            type_name: owner_object.name.clone(),
        })?
        .clone();

    make_step(registry, source, &property, &format!("@{property_name}"))
}

/// Narrow `source`'s element type to the subtype named `target_name`;
/// cardinality is unchanged.
pub fn intersect(
    registry: &SchemaRegistry,
    source: &Arc<ExpressionNode>,
    target_name: &str,
) -> Result<Arc<ExpressionNode>> {
    let source_object = source
        .element()
        .as_object()
        .ok_or_else(|| Error::NotAnObject(source.element().name().to_string()))?;

    let target = registry.resolve_by_name(target_name)?;
    let target_object = target
        .as_object()
        .ok_or_else(|| Error::NotAnObject(target_name.to_string()))?;

    if !is_object_subtype(registry, target_object.id, source_object.id)? {
        return Err(Error::InvalidIntersection {
            from: source_object.name.clone(),
            to: target_name.to_string(),
        });
    }

    Ok(ExpressionNode::new(
        target.clone(),
        source.cardinality(),
        ExprKind::TypeIntersection {
            expr: source.clone(),
        },
    ))
}

/// Whether object type `sub` is `ancestor` or derives from it, following the
/// base chain in the registry.
pub(crate) fn is_object_subtype(
    registry: &SchemaRegistry,
    sub: sigil_schema::TypeId,
    ancestor: sigil_schema::TypeId,
) -> Result<bool> {
    if sub == ancestor {
        return Ok(true);
    }
    let descriptor = match registry.resolve(sub) {
        Ok(d) => d,
        // synthetic (merged) types are registry-less and have no ancestors
        Err(_) => return Ok(false),
    };
    let Some(object) = descriptor.as_object() else {
        return Ok(false);
    };
    for base in &object.bases {
        if is_object_subtype(registry, *base, ancestor)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn make_step(
    registry: &SchemaRegistry,
    source: &Arc<ExpressionNode>,
    pointer: &Arc<PointerDescriptor>,
    link_name: &str,
) -> Result<Arc<ExpressionNode>> {
    let target = registry.resolve(pointer.target_id)?;
    let cardinality = source.cardinality().multiply(pointer.cardinality);
    let parent = PathParent {
        owner: source.clone(),
        link_name: link_name.to_string(),
    };

    let kind = match target.as_ref() {
        TypeDescriptor::Object(_) => ExprKind::PathNode {
            parent: Some(parent),
        },
        _ => ExprKind::PathLeaf { parent },
    };

    Ok(ExpressionNode::new(target.clone(), cardinality, kind))
}
