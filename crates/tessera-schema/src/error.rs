//! Schema error types.
//!
//! Provides [`SchemaError`] for descriptor registration and schema
//! resolution, plus a convenience [`SchemaResult`] alias. Resolution
//! errors abort the build for the affected schema; no partial schema is
//! ever produced.

use thiserror::Error;

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while registering descriptors or resolving
/// schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field or flatten target references a type that is not in the
    /// registry.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Two types in the descriptor set share a fully-qualified name.
    #[error("duplicate type '{0}'")]
    DuplicateType(String),

    /// A type in the reserved namespace has no well-known mapping.
    #[error("unsupported well-known type '{0}'")]
    UnsupportedWellKnown(String),

    /// An enum descriptor violates a structural requirement (missing
    /// zero value, zero value not suffixed, conflicting allow/deny
    /// filters).
    #[error("enum '{name}': {message}")]
    InvalidEnum {
        /// Fully-qualified enum name.
        name: String,
        /// What was wrong.
        message: String,
    },

    /// A field descriptor cannot be resolved (flatten on a non-message
    /// field, unknown string format, and similar).
    #[error("field '{field}': {message}")]
    InvalidField {
        /// Declared field name.
        field: String,
        /// What was wrong.
        message: String,
    },

    /// An exposed field grouping is structurally unusable (for example
    /// it has no member fields).
    #[error("group '{group}': {message}")]
    InvalidGroup {
        /// Declared grouping name.
        group: String,
        /// What was wrong.
        message: String,
    },

    /// A `Ref` node was used before the linking pass populated it, or
    /// its target never entered the cache. This indicates a bug in the
    /// resolution sequence, not bad input.
    #[error("unresolved reference '{0}'")]
    UnresolvedRef(String),
}
