//! Schema registry and type catalog
//!
//! # Architecture
//!
//! Raw introspection records (from `sigil-schema`) are canonicalized once,
//! at construction time, into a frozen [`SchemaRegistry`]:
//!
//! ```text
//! Vec<TypeRecord> + casts + globals → SchemaRegistry (build-then-freeze)
//! ```
//!
//! The registry guarantees exactly one [`TypeDescriptor`] instance per type
//! name for the lifetime of a schema snapshot, so descriptor identity
//! comparison is valid anywhere a registry reference is in scope. There is no
//! process-wide state: callers construct one registry per snapshot and pass
//! it by reference.
//!
//! Object pointer shapes are the one lazily-computed piece: building a shape
//! walks the inheritance graph (own pointers, then backlinks, then backlink
//! stubs, then each base recursively, first name wins) and is memoized in the
//! descriptor, so the walk runs at most once per type.

mod casts;
mod descriptor;
mod error;
mod globals;
mod registry;
mod shape;

pub use casts::CastMap;
pub use descriptor::{
    ArrayDescriptor, NamedTupleDescriptor, ObjectDescriptor, ObjectShape, PointerDescriptor,
    ScalarDescriptor, TupleDescriptor, TypeDescriptor,
};
pub use error::{Error, Result};
pub use globals::GlobalDescriptor;
pub use registry::SchemaRegistry;
pub use shape::{merge_object_types, merge_shapes};
