use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing expressions.
///
/// Construction aborts immediately; no partial expression node is ever
/// returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] sigil_catalog::Error),

    #[error("no matching overload for `{name}`")]
    NoMatchingOverload { name: String },

    #[error("`{pointer}` is not a pointer on type `{type_name}`")]
    UnknownPointer { pointer: String, type_name: String },

    #[error("cannot navigate into non-object type `{0}`")]
    NotAnObject(String),

    #[error("expression types `{left}` and `{right}` cannot be combined")]
    IncompatibleElements { left: String, right: String },

    #[error("`{pointer}` on `{type_name}` is not writable")]
    ReadOnlyPointer { pointer: String, type_name: String },

    #[error("cannot narrow `{from}` to `{to}`: not a subtype")]
    InvalidIntersection { from: String, to: String },

    #[error("`{member}` is not a member of enum `{type_name}`")]
    UnknownEnumMember { type_name: String, member: String },

    #[error("an empty collection requires an explicit element type")]
    EmptyCollection,
}
