//! The query builder facade
//!
//! [`QueryBuilder`] holds a registry and an overload catalog behind `Arc`s
//! and exposes the full expression-construction surface. Every constructor
//! validates its inputs against the schema and returns a frozen, fully-typed
//! node; an `Err` means no node was created.

use crate::error::{Error, Result};
use crate::expr::{ExprKind, ExpressionNode, OrderBy, OrderDirection, SelectModifiers};
use crate::literal::ScalarValue;
use crate::overload::{resolve_call, CallArgs, FuncopCatalog};
use crate::path;
use indexmap::IndexMap;
use sigil_catalog::{
    merge_object_types, ArrayDescriptor, SchemaRegistry, TupleDescriptor, TypeDescriptor,
};
use sigil_schema::{Cardinality, FuncopKind};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Entry point for constructing typed expressions over one schema snapshot.
#[derive(Clone)]
pub struct QueryBuilder {
    registry: Arc<SchemaRegistry>,
    catalog: Arc<FuncopCatalog>,
}

impl QueryBuilder {
    pub fn new(registry: Arc<SchemaRegistry>, catalog: Arc<FuncopCatalog>) -> Self {
        QueryBuilder { registry, catalog }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn catalog(&self) -> &Arc<FuncopCatalog> {
        &self.catalog
    }

    // === Paths ===

    /// The set of all objects of `type_name`.
    pub fn root(&self, type_name: &str) -> Result<Arc<ExpressionNode>> {
        path::root(&self.registry, type_name)
    }

    /// Navigate from `source` through a named link or property.
    pub fn step(
        &self,
        source: &Arc<ExpressionNode>,
        pointer_name: &str,
    ) -> Result<Arc<ExpressionNode>> {
        path::step(&self.registry, source, pointer_name)
    }

    /// Access a property of the link `source` was stepped through.
    pub fn link_property(
        &self,
        source: &Arc<ExpressionNode>,
        property_name: &str,
    ) -> Result<Arc<ExpressionNode>> {
        path::link_property(&self.registry, source, property_name)
    }

    /// Narrow `source` to the subtype `target_name` (`expr[is Target]`).
    pub fn intersect(
        &self,
        source: &Arc<ExpressionNode>,
        target_name: &str,
    ) -> Result<Arc<ExpressionNode>> {
        path::intersect(&self.registry, source, target_name)
    }

    // === Literals ===

    /// A scalar literal of the named type; cardinality is always `One`.
    pub fn literal(&self, type_name: &str, value: ScalarValue) -> Result<Arc<ExpressionNode>> {
        let element = self.registry.resolve_by_name(type_name)?;
        Ok(ExpressionNode::new(
            element.clone(),
            Cardinality::One,
            ExprKind::Literal(value),
        ))
    }

    /// An enum member literal, validated against the enum's member list.
    pub fn enum_member(&self, type_name: &str, member: &str) -> Result<Arc<ExpressionNode>> {
        let element = self.registry.resolve_by_name(type_name)?;
        let is_member = element
            .as_scalar()
            .map_or(false, |s| s.enum_values.iter().any(|m| m == member));
        if !is_member {
            return Err(Error::UnknownEnumMember {
                type_name: type_name.to_string(),
                member: member.to_string(),
            });
        }
        Ok(ExpressionNode::new(
            element.clone(),
            Cardinality::One,
            ExprKind::Literal(ScalarValue::EnumMember(member.to_string())),
        ))
    }

    // === Calls ===

    /// A function call, resolved against the overload catalog.
    pub fn call(&self, name: &str, args: CallArgs) -> Result<Arc<ExpressionNode>> {
        let resolved = resolve_call(&self.registry, &self.catalog, name, &args)?;
        trace!(name, index = resolved.index, "function call constructed");
        Ok(ExpressionNode::new(
            resolved.return_type,
            resolved.cardinality,
            ExprKind::FunctionCall {
                name: name.to_string(),
                args: args.positional.into_iter().flatten().collect(),
                named_args: args.named,
            },
        ))
    }

    /// An operator application, resolved against the overload catalog. The
    /// rendering fixity comes from the accepted signature.
    pub fn op(&self, name: &str, args: CallArgs) -> Result<Arc<ExpressionNode>> {
        let resolved = resolve_call(&self.registry, &self.catalog, name, &args)?;
        let operands: SmallVec<[Arc<ExpressionNode>; 2]> =
            args.positional.into_iter().flatten().collect();
        Ok(ExpressionNode::new(
            resolved.return_type,
            resolved.cardinality,
            ExprKind::Operator {
                name: name.to_string(),
                operator_kind: resolved.kind,
                args: operands,
            },
        ))
    }

    // === Collections ===

    /// A set literal `{ a, b, ... }`. Element types are unified pairwise;
    /// the result cardinality is the merge of the members'.
    pub fn set(&self, exprs: Vec<Arc<ExpressionNode>>) -> Result<Arc<ExpressionNode>> {
        let Some(first) = exprs.first() else {
            return Err(Error::EmptyCollection);
        };
        let mut element = first.element().clone();
        let mut cardinality = first.cardinality();
        for expr in &exprs[1..] {
            element = self.unify(&element, expr.element())?;
            cardinality = cardinality.merge(expr.cardinality());
        }
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Set { exprs },
        ))
    }

    /// The empty set of the named type, `<Type>{}`. Cardinality is `Empty`.
    pub fn empty_set(&self, type_name: &str) -> Result<Arc<ExpressionNode>> {
        let element = self.registry.resolve_by_name(type_name)?;
        Ok(ExpressionNode::new(
            element.clone(),
            Cardinality::Empty,
            ExprKind::Set { exprs: Vec::new() },
        ))
    }

    /// An unnamed tuple value. Singleton per item; the tuple's cardinality
    /// multiplies the items'.
    pub fn tuple(&self, items: Vec<Arc<ExpressionNode>>) -> Result<Arc<ExpressionNode>> {
        if items.is_empty() {
            return Err(Error::EmptyCollection);
        }
        let cardinality = Cardinality::multiply_all(items.iter().map(|i| i.cardinality()));
        let name = format!(
            "tuple<{}>",
            items
                .iter()
                .map(|i| i.element().name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let element = Arc::new(TypeDescriptor::Tuple(TupleDescriptor {
            id: Uuid::new_v4(),
            name,
            elements: items.iter().map(|i| i.element().id()).collect(),
        }));
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Tuple { items },
        ))
    }

    /// A named tuple value.
    pub fn named_tuple(
        &self,
        items: IndexMap<String, Arc<ExpressionNode>>,
    ) -> Result<Arc<ExpressionNode>> {
        if items.is_empty() {
            return Err(Error::EmptyCollection);
        }
        let cardinality = Cardinality::multiply_all(items.values().map(|i| i.cardinality()));
        let name = format!(
            "tuple<{}>",
            items
                .iter()
                .map(|(k, v)| format!("{k}: {}", v.element().name()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let element = Arc::new(TypeDescriptor::NamedTuple(
            sigil_catalog::NamedTupleDescriptor {
                id: Uuid::new_v4(),
                name,
                elements: items
                    .iter()
                    .map(|(k, v)| (k.clone(), v.element().id()))
                    .collect(),
            },
        ));
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::NamedTuple { items },
        ))
    }

    /// An array literal `[a, b, ...]`. All items must unify to one element
    /// type; the array's cardinality multiplies the items'.
    pub fn array(&self, items: Vec<Arc<ExpressionNode>>) -> Result<Arc<ExpressionNode>> {
        let Some(first) = items.first() else {
            return Err(Error::EmptyCollection);
        };
        let mut element = first.element().clone();
        for item in &items[1..] {
            element = self.unify(&element, item.element())?;
        }
        let cardinality = Cardinality::multiply_all(items.iter().map(|i| i.cardinality()));
        let array = Arc::new(TypeDescriptor::Array(ArrayDescriptor {
            id: Uuid::new_v4(),
            name: format!("array<{}>", element.name()),
            element_id: element.id(),
        }));
        Ok(ExpressionNode::new(
            array,
            cardinality,
            ExprKind::Array { items },
        ))
    }

    // === Combinators ===

    /// `a UNION b`: cardinalities merge, element types unify.
    pub fn union(
        &self,
        left: Arc<ExpressionNode>,
        right: Arc<ExpressionNode>,
    ) -> Result<Arc<ExpressionNode>> {
        let element = self.unify(left.element(), right.element())?;
        let cardinality = left.cardinality().merge(right.cardinality());
        let mut args: SmallVec<[Arc<ExpressionNode>; 2]> = SmallVec::new();
        args.push(left);
        args.push(right);
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Operator {
                name: "std::UNION".to_string(),
                operator_kind: FuncopKind::Infix,
                args,
            },
        ))
    }

    /// `a ?? b`: the right branch supplies the value when the left is empty,
    /// so the result's lower bound comes from either side being non-empty.
    pub fn coalesce(
        &self,
        left: Arc<ExpressionNode>,
        right: Arc<ExpressionNode>,
    ) -> Result<Arc<ExpressionNode>> {
        let element = self.unify(left.element(), right.element())?;
        let cardinality = left.cardinality().merge(right.cardinality());
        let mut args: SmallVec<[Arc<ExpressionNode>; 2]> = SmallVec::new();
        args.push(left);
        args.push(right);
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Operator {
                name: "std::??".to_string(),
                operator_kind: FuncopKind::Infix,
                args,
            },
        ))
    }

    /// `a IF cond ELSE b`: one branch runs per condition element, so the
    /// merged branch cardinality multiplies with the condition's.
    pub fn if_else(
        &self,
        then: Arc<ExpressionNode>,
        condition: Arc<ExpressionNode>,
        otherwise: Arc<ExpressionNode>,
    ) -> Result<Arc<ExpressionNode>> {
        let element = self.unify(then.element(), otherwise.element())?;
        let cardinality = then
            .cardinality()
            .merge(otherwise.cardinality())
            .multiply(condition.cardinality());
        let mut args: SmallVec<[Arc<ExpressionNode>; 2]> = SmallVec::new();
        args.push(then);
        args.push(condition);
        args.push(otherwise);
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Operator {
                name: "std::IF".to_string(),
                operator_kind: FuncopKind::Ternary,
                args,
            },
        ))
    }

    // === Statements ===

    /// Begin a `SELECT` over `subject`.
    pub fn select(&self, subject: Arc<ExpressionNode>) -> SelectBuilder {
        SelectBuilder {
            subject,
            modifiers: SelectModifiers::default(),
        }
    }

    /// An `INSERT` of one object; every shape value must target a writable,
    /// assignable pointer of the type.
    pub fn insert(
        &self,
        type_name: &str,
        shape: IndexMap<String, Arc<ExpressionNode>>,
    ) -> Result<Arc<ExpressionNode>> {
        let element = self.registry.resolve_by_name(type_name)?;
        let object = element
            .as_object()
            .ok_or_else(|| Error::NotAnObject(type_name.to_string()))?;
        for (name, value) in &shape {
            self.check_assignment(object, name, value)?;
        }
        Ok(ExpressionNode::new(
            element.clone(),
            Cardinality::One,
            ExprKind::Insert { shape },
        ))
    }

    /// An `UPDATE ... SET`. The subject may match nothing, so the result's
    /// lower bound drops to zero.
    pub fn update(
        &self,
        subject: Arc<ExpressionNode>,
        shape: IndexMap<String, Arc<ExpressionNode>>,
    ) -> Result<Arc<ExpressionNode>> {
        let object = subject
            .element()
            .as_object()
            .ok_or_else(|| Error::NotAnObject(subject.element().name().to_string()))?;
        for (name, value) in &shape {
            self.check_assignment(object, name, value)?;
        }
        let element = subject.element().clone();
        let cardinality = subject.cardinality().override_lower_zero();
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Update { subject, shape },
        ))
    }

    /// A `DELETE` of the subject's matches.
    pub fn delete(&self, subject: Arc<ExpressionNode>) -> Result<Arc<ExpressionNode>> {
        if !subject.element().is_object() {
            return Err(Error::NotAnObject(subject.element().name().to_string()));
        }
        let element = subject.element().clone();
        let cardinality = subject.cardinality().override_lower_zero();
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Delete { subject },
        ))
    }

    // === Leaves ===

    /// Reference a schema global by name. Fails on snapshots whose version
    /// predates globals.
    pub fn global(&self, name: &str) -> Result<Arc<ExpressionNode>> {
        let global = self.registry.global(name)?;
        let element = self.registry.resolve(global.target_id)?.clone();
        let cardinality = global.cardinality;
        Ok(ExpressionNode::new(
            element,
            cardinality,
            ExprKind::Global {
                name: name.to_string(),
            },
        ))
    }

    /// A query parameter `<type>$name`. Optional parameters may be absent at
    /// execution time, so their cardinality is `AtMostOne`.
    pub fn parameter(
        &self,
        type_name: &str,
        name: &str,
        optional: bool,
    ) -> Result<Arc<ExpressionNode>> {
        let element = self.registry.resolve_by_name(type_name)?;
        let cardinality = if optional {
            Cardinality::AtMostOne
        } else {
            Cardinality::One
        };
        Ok(ExpressionNode::new(
            element.clone(),
            cardinality,
            ExprKind::Parameter {
                name: name.to_string(),
                optional,
            },
        ))
    }

    /// Detach `expr` from the enclosing statement's path scoping. Type and
    /// cardinality are unchanged.
    pub fn detached(&self, expr: Arc<ExpressionNode>) -> Arc<ExpressionNode> {
        ExpressionNode::new(
            expr.element().clone(),
            expr.cardinality(),
            ExprKind::Detached { expr },
        )
    }

    // === Internals ===

    /// Unify the element types of two combined branches: identical types
    /// pass through, objects merge to their common shape, scalars meet at
    /// their closest shared implicit-cast target.
    fn unify(
        &self,
        left: &Arc<TypeDescriptor>,
        right: &Arc<TypeDescriptor>,
    ) -> Result<Arc<TypeDescriptor>> {
        if left.id() == right.id() || left.name() == right.name() {
            return Ok(left.clone());
        }
        match (left.as_ref(), right.as_ref()) {
            (TypeDescriptor::Object(a), TypeDescriptor::Object(b)) => {
                // a union with its own subtype collapses to the ancestor
                if path::is_object_subtype(&self.registry, b.id, a.id)? {
                    return Ok(left.clone());
                }
                if path::is_object_subtype(&self.registry, a.id, b.id)? {
                    return Ok(right.clone());
                }
                Ok(Arc::new(merge_object_types(&self.registry, a, b)?))
            }
            (TypeDescriptor::Scalar(a), TypeDescriptor::Scalar(b)) => {
                let parent = self
                    .registry
                    .casts()
                    .shared_parent(a.id, b.id)
                    .ok_or_else(|| Error::IncompatibleElements {
                        left: a.name.clone(),
                        right: b.name.clone(),
                    })?;
                Ok(self.registry.resolve(parent)?.clone())
            }
            _ => Err(Error::IncompatibleElements {
                left: left.name().to_string(),
                right: right.name().to_string(),
            }),
        }
    }

    fn check_assignment(
        &self,
        object: &sigil_catalog::ObjectDescriptor,
        pointer_name: &str,
        value: &Arc<ExpressionNode>,
    ) -> Result<()> {
        let pointer = object
            .pointers(&self.registry)?
            .get(pointer_name)
            .ok_or_else(|| Error::UnknownPointer {
                pointer: pointer_name.to_string(),
                type_name: object.name.clone(),
            })?
            .clone();
        if !pointer.is_writable {
            return Err(Error::ReadOnlyPointer {
                pointer: pointer_name.to_string(),
                type_name: object.name.clone(),
            });
        }
        let target = self.registry.resolve(pointer.target_id)?;
        let compatible = match (target.as_ref(), value.element().as_ref()) {
            (TypeDescriptor::Object(t), TypeDescriptor::Object(v)) => {
                path::is_object_subtype(&self.registry, v.id, t.id)?
            }
            (TypeDescriptor::Scalar(t), TypeDescriptor::Scalar(v)) => {
                t.name == v.name || self.registry.casts().is_assignable(v.id, t.id)
            }
            _ => target.id() == value.element().id(),
        };
        if !compatible {
            return Err(Error::IncompatibleElements {
                left: value.element().name().to_string(),
                right: target.name().to_string(),
            });
        }
        Ok(())
    }
}

/// Accumulates `SELECT` modifier clauses, then freezes into a statement
/// node. Result cardinality starts from the subject's and is tightened by
/// modifiers that provably bound it.
pub struct SelectBuilder {
    subject: Arc<ExpressionNode>,
    modifiers: SelectModifiers,
}

impl SelectBuilder {
    pub fn filter(mut self, predicate: Arc<ExpressionNode>) -> Self {
        self.modifiers.filter.push(predicate);
        self
    }

    pub fn order_by(
        mut self,
        key: Arc<ExpressionNode>,
        direction: Option<OrderDirection>,
    ) -> Self {
        self.modifiers.order_by.push(OrderBy {
            expr: key,
            direction,
        });
        self
    }

    pub fn offset(mut self, offset: Arc<ExpressionNode>) -> Self {
        self.modifiers.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: Arc<ExpressionNode>) -> Self {
        self.modifiers.limit = Some(limit);
        self
    }

    pub fn build(self) -> Arc<ExpressionNode> {
        let mut cardinality = self.subject.cardinality();
        if limit_is_one(self.modifiers.limit.as_deref()) {
            cardinality = cardinality.override_upper_one();
        }
        if self
            .modifiers
            .filter
            .iter()
            .any(|f| filter_pins_single_object(&self.subject, f))
        {
            cardinality = cardinality.override_upper_one();
        }
        ExpressionNode::new(
            self.subject.element().clone(),
            cardinality,
            ExprKind::Select {
                subject: self.subject,
                modifiers: self.modifiers,
            },
        )
    }
}

fn limit_is_one(limit: Option<&ExpressionNode>) -> bool {
    match limit.map(ExpressionNode::kind) {
        Some(ExprKind::Literal(ScalarValue::Int64(1))) => true,
        _ => false,
    }
}

/// Whether a filter predicate is an equality on an exclusive pointer of the
/// select subject against a single value, which pins the result to at most
/// one object.
fn filter_pins_single_object(subject: &Arc<ExpressionNode>, predicate: &ExpressionNode) -> bool {
    let ExprKind::Operator {
        name,
        operator_kind: FuncopKind::Infix,
        args,
    } = predicate.kind()
    else {
        return false;
    };
    if name != "std::=" || args.len() != 2 {
        return false;
    }
    let pins = |key: &Arc<ExpressionNode>, value: &Arc<ExpressionNode>| {
        is_exclusive_step_off(subject, key) && !value.cardinality().is_multi()
    };
    pins(&args[0], &args[1]) || pins(&args[1], &args[0])
}

/// `expr` is a direct step off `subject` through an exclusive pointer.
fn is_exclusive_step_off(subject: &Arc<ExpressionNode>, expr: &Arc<ExpressionNode>) -> bool {
    let Some(parent) = expr.path_parent() else {
        return false;
    };
    if !Arc::ptr_eq(&parent.owner, subject) {
        return false;
    }
    // stepping through the pointer already forced the owner's shape, so the
    // cached cell is always populated here
    match parent.owner.element().as_object() {
        Some(object) => object
            .prebuilt_shape()
            .and_then(|shape| shape.get(&parent.link_name))
            .map_or(false, |pointer| pointer.is_exclusive),
        None => false,
    }
}
