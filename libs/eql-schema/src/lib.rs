//! Reflected schema data model
//!
//! This crate holds the two leaf pieces every other `sigil` crate consumes:
//!
//! - [`Cardinality`] and its composition algebra, shared by the type catalog
//!   (pointer cardinalities) and the expression builder (result cardinality
//!   propagation).
//! - The serde models for raw database introspection output: type records,
//!   pointer records, function/operator overload records, cast records and
//!   global-variable records. These are exactly what the (out-of-tree)
//!   introspection queries return; nothing in this crate talks to a database.
//!
//! All records are plain immutable data. Interpretation — canonicalization,
//! inheritance, overload resolution — lives in `sigil-catalog` and
//! `sigil-builder`.

mod cardinality;
mod introspection;

pub use cardinality::Cardinality;
pub use introspection::{
    BacklinkRecord, CastRecord, FuncopKind, FuncopRecord, GlobalRecord, ParamRecord, PointerKind,
    PointerRecord, ReturnTypemod, SchemaVersion, TupleElementRecord, TypeId, TypeRecord, TypeRef,
};
