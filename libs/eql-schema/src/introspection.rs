//! Raw introspection records
//!
//! Serde models for the JSON produced by the schema introspection queries:
//! one record per type (object/scalar/array/tuple), flat lists of casts,
//! function/operator overloads and global variables, plus the server's
//! schema version. Field names follow the wire format of the introspection
//! output, which is why several of them carry `serde(rename)` attributes.

use crate::cardinality::Cardinality;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a type within one schema snapshot.
pub type TypeId = Uuid;

/// A `{id, name}` reference to another type, as introspection emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: TypeId,
    pub name: String,
}

/// Whether a pointer is a link (object-valued) or a property (scalar- or
/// collection-valued).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Link,
    Property,
}

/// One pointer (link or property) declared on an object type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerRecord {
    pub name: String,
    pub kind: PointerKind,
    /// Declared cardinality, already combined with `required` by the
    /// introspection query (`One`/`AtMostOne`/`Many`/`AtLeastOne`).
    pub real_cardinality: Cardinality,
    pub target_id: TypeId,
    #[serde(default)]
    pub is_exclusive: bool,
    #[serde(default = "default_true")]
    pub is_writable: bool,
    /// Link properties, for links only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointers: Option<Vec<PointerRecord>>,
}

/// A backlink or backlink stub: a pointer materialized from a link that
/// targets this type, named `<source_link` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklinkRecord {
    pub name: String,
    pub real_cardinality: Cardinality,
    pub target_id: TypeId,
    #[serde(default)]
    pub is_exclusive: bool,
    /// The stub name (link name without the source type filter), present for
    /// backlink stubs only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub: Option<String>,
}

/// One element of a tuple type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TupleElementRecord {
    /// `"0"`, `"1"`, ... for unnamed tuples, the element name otherwise.
    pub name: String,
    pub target_id: TypeId,
}

/// One introspected type, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeRecord {
    Scalar {
        id: TypeId,
        name: String,
        #[serde(default)]
        is_abstract: bool,
        #[serde(default)]
        bases: Vec<TypeRef>,
        #[serde(default)]
        enum_values: Vec<String>,
    },
    Object {
        id: TypeId,
        name: String,
        #[serde(default)]
        is_abstract: bool,
        #[serde(default)]
        bases: Vec<TypeRef>,
        #[serde(default)]
        pointers: Vec<PointerRecord>,
        #[serde(default)]
        backlinks: Vec<BacklinkRecord>,
        #[serde(default)]
        backlink_stubs: Vec<BacklinkRecord>,
    },
    Array {
        id: TypeId,
        name: String,
        array_element_id: TypeId,
    },
    Tuple {
        id: TypeId,
        name: String,
        tuple_elements: Vec<TupleElementRecord>,
    },
}

impl TypeRecord {
    pub fn id(&self) -> TypeId {
        match self {
            TypeRecord::Scalar { id, .. }
            | TypeRecord::Object { id, .. }
            | TypeRecord::Array { id, .. }
            | TypeRecord::Tuple { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeRecord::Scalar { name, .. }
            | TypeRecord::Object { name, .. }
            | TypeRecord::Array { name, .. }
            | TypeRecord::Tuple { name, .. } => name,
        }
    }
}

/// One scalar-to-scalar cast edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastRecord {
    pub id: Uuid,
    pub source: TypeRef,
    pub target: TypeRef,
    #[serde(default)]
    pub allow_assignment: bool,
    #[serde(default)]
    pub allow_implicit: bool,
}

/// What kind of callable an overload signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FuncopKind {
    Function,
    Infix,
    Prefix,
    Postfix,
    Ternary,
}

/// Return-set modifier of an overload signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnTypemod {
    SetOfType,
    OptionalType,
}

/// One positional or named parameter spec of an overload signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamRecord {
    #[serde(rename = "typeId")]
    pub type_id: TypeId,
    #[serde(default)]
    pub optional: bool,
    /// Whole-set parameter: the callee consumes the entire input set as one
    /// unit (aggregates), so it never contributes to cardinality.
    #[serde(default, rename = "setoftype")]
    pub whole_set: bool,
    #[serde(default)]
    pub variadic: bool,
}

/// One overload signature of a function or operator, as introspected.
///
/// The catalog keeps these in declaration order: concrete signatures come
/// before generic fallbacks, and the resolver picks the first match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncopRecord {
    pub name: String,
    #[serde(default = "default_funcop_kind")]
    pub kind: FuncopKind,
    pub args: Vec<ParamRecord>,
    #[serde(default, rename = "namedArgs", skip_serializing_if = "Option::is_none")]
    pub named_args: Option<IndexMap<String, ParamRecord>>,
    #[serde(rename = "returnTypeId")]
    pub return_type_id: TypeId,
    #[serde(default, rename = "returnTypemod", skip_serializing_if = "Option::is_none")]
    pub return_typemod: Option<ReturnTypemod>,
    #[serde(default, rename = "preservesOptionality")]
    pub preserves_optionality: bool,
}

/// One global variable declared in the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalRecord {
    pub id: Uuid,
    pub name: String,
    pub target_id: TypeId,
    pub real_cardinality: Cardinality,
}

/// Version of the schema the introspection ran against.
///
/// Some reflected features (global variables) only exist from major version 2
/// on; the catalog gates them on this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(pub Version);

impl SchemaVersion {
    pub fn new(major: u64, minor: u64) -> Self {
        SchemaVersion(Version::new(major, minor, 0))
    }

    pub fn supports_globals(&self) -> bool {
        self.0.major >= 2
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

fn default_true() -> bool {
    true
}

fn default_funcop_kind() -> FuncopKind {
    FuncopKind::Function
}
