use sigil_schema::{SchemaVersion, TypeId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or querying a schema registry.
///
/// All of these are synchronous construction/resolution failures; the
/// catalog never retries and never returns partial results.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unresolved type id `{0}`")]
    UnresolvedType(TypeId),

    #[error("unresolved type name `{0}`")]
    UnresolvedTypeName(String),

    #[error("duplicate type name `{0}` in schema snapshot")]
    DuplicateTypeName(String),

    #[error("type `{name}` cannot be used as a base: not an object type")]
    InvalidBaseType { name: String },

    #[error("polymorphic type `{0}` used without a concrete binding")]
    UnboundPolymorphicType(String),

    #[error("unknown global `{0}`")]
    UnknownGlobal(String),

    #[error("schema version {version} does not support {feature}")]
    UnsupportedSchemaVersion {
        feature: &'static str,
        version: SchemaVersion,
    },
}
