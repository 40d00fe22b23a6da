//! The typed expression tree
//!
//! Every node carries its element type and result cardinality, assigned at
//! construction and never mutated: building "more tree" means creating new
//! parent nodes that reference existing ones behind `Arc`s. Path nodes carry
//! a non-owning back-reference to the expression they were stepped from —
//! used only to reconstruct dotted path text, never to derive ownership; many
//! children may share one parent.

use crate::literal::ScalarValue;
use indexmap::IndexMap;
use sigil_catalog::TypeDescriptor;
use sigil_schema::{Cardinality, FuncopKind};
use smallvec::SmallVec;
use std::sync::Arc;

/// A frozen, typed expression.
#[derive(Debug)]
pub struct ExpressionNode {
    element: Arc<TypeDescriptor>,
    cardinality: Cardinality,
    kind: ExprKind,
}

impl ExpressionNode {
    pub(crate) fn new(
        element: Arc<TypeDescriptor>,
        cardinality: Cardinality,
        kind: ExprKind,
    ) -> Arc<Self> {
        Arc::new(ExpressionNode {
            element,
            cardinality,
            kind,
        })
    }

    /// The element type this expression produces.
    pub fn element(&self) -> &Arc<TypeDescriptor> {
        &self.element
    }

    /// How many elements this expression can produce.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn is_path(&self) -> bool {
        matches!(self.kind, ExprKind::PathNode { .. } | ExprKind::PathLeaf { .. })
    }

    /// The path back-reference, for path nodes that were stepped from a
    /// parent expression.
    pub fn path_parent(&self) -> Option<&PathParent> {
        match &self.kind {
            ExprKind::PathNode { parent } => parent.as_ref(),
            ExprKind::PathLeaf { parent } => Some(parent),
            _ => None,
        }
    }
}

/// Non-owning back-reference from a path node to the expression it was
/// stepped from.
#[derive(Debug, Clone)]
pub struct PathParent {
    pub owner: Arc<ExpressionNode>,
    pub link_name: String,
}

/// Sort direction of an `ORDER BY` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// One `ORDER BY` key.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub expr: Arc<ExpressionNode>,
    pub direction: Option<OrderDirection>,
}

/// Modifier clauses attached to a select.
#[derive(Debug, Clone, Default)]
pub struct SelectModifiers {
    pub filter: Vec<Arc<ExpressionNode>>,
    pub order_by: Vec<OrderBy>,
    pub offset: Option<Arc<ExpressionNode>>,
    pub limit: Option<Arc<ExpressionNode>>,
}

/// The tagged node variants.
#[derive(Debug)]
pub enum ExprKind {
    /// A scalar literal; cardinality is always `One`.
    Literal(ScalarValue),
    /// Object-typed path step (navigable further). Root paths carry no
    /// parent.
    PathNode { parent: Option<PathParent> },
    /// Scalar- or collection-typed path step (terminal).
    PathLeaf { parent: PathParent },
    FunctionCall {
        name: String,
        args: Vec<Arc<ExpressionNode>>,
        named_args: IndexMap<String, Arc<ExpressionNode>>,
    },
    Operator {
        name: String,
        operator_kind: FuncopKind,
        args: SmallVec<[Arc<ExpressionNode>; 2]>,
    },
    /// `expr[is Subtype]`: element type narrowed, cardinality unchanged.
    TypeIntersection { expr: Arc<ExpressionNode> },
    Set { exprs: Vec<Arc<ExpressionNode>> },
    Tuple { items: Vec<Arc<ExpressionNode>> },
    NamedTuple {
        items: IndexMap<String, Arc<ExpressionNode>>,
    },
    Array { items: Vec<Arc<ExpressionNode>> },
    Select {
        subject: Arc<ExpressionNode>,
        modifiers: SelectModifiers,
    },
    Insert {
        shape: IndexMap<String, Arc<ExpressionNode>>,
    },
    Update {
        subject: Arc<ExpressionNode>,
        shape: IndexMap<String, Arc<ExpressionNode>>,
    },
    Delete { subject: Arc<ExpressionNode> },
    Global { name: String },
    Parameter { name: String, optional: bool },
    /// Breaks out of the enclosing statement's implicit path scoping.
    Detached { expr: Arc<ExpressionNode> },
}
