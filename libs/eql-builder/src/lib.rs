//! Typed query construction
//!
//! # Architecture
//!
//! Expressions are built against a frozen [`SchemaRegistry`](sigil_catalog::SchemaRegistry)
//! and a [`FuncopCatalog`] of overload signatures:
//!
//! ```text
//! QueryBuilder ── paths / literals / calls / statements ──► Arc<ExpressionNode>
//!                                                                  │
//!                                                         to_text() renders
//! ```
//!
//! Every node is immutable after construction and carries its element type
//! and result cardinality; type and cardinality errors surface at
//! construction time, never at render time. Rendering is a side-effect-free
//! walk that any node supports via [`ExpressionNode::to_text`].
//!
//! Overload resolution is first-match over declaration-ordered candidate
//! signatures, so the same call site always resolves to the same signature
//! for a given catalog.

mod builder;
mod error;
mod expr;
mod literal;
mod overload;
mod path;
mod render;

pub use builder::{QueryBuilder, SelectBuilder};
pub use error::{Error, Result};
pub use expr::{
    ExprKind, ExpressionNode, OrderBy, OrderDirection, PathParent, SelectModifiers,
};
pub use literal::ScalarValue;
pub use overload::{
    resolve_call, CallArgs, FuncopCatalog, OverloadSignature, ParamSpec, ResolvedCall,
};
pub use path::{intersect, link_property, root, step};
