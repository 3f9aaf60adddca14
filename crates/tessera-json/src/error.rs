//! Codec error types.
//!
//! Provides [`CodecError`] for encode/decode failures, plus a
//! convenience [`CodecResult`] alias. Every variant that points into a
//! document carries the JSON path of the failure site; no value is ever
//! coerced or defaulted silently. Schema errors surfacing mid-codec
//! (an unresolved reference, for instance) convert via `From`.

use thiserror::Error;

use tessera_schema::SchemaError;

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document had a different JSON shape than the schema expects.
    #[error("{path}: expected {expected}, found {found}")]
    UnexpectedToken {
        /// JSON path of the failure.
        path: String,
        /// What the schema called for.
        expected: String,
        /// What the document contained.
        found: String,
    },

    /// An object key matched no schema property.
    #[error("{path}: unknown field '{name}'")]
    UnknownField {
        /// JSON path of the enclosing object.
        path: String,
        /// The offending key.
        name: String,
    },

    /// An enum token matched no option.
    #[error("{path}: unknown value '{name}' for enum {enum_name}")]
    UnknownEnumName {
        path: String,
        name: String,
        /// Fully-qualified enum name.
        enum_name: String,
    },

    /// An instance carried an enum number with no schema option.
    #[error("{path}: enum {enum_name} has no option with number {number}")]
    UnknownEnumNumber {
        path: String,
        enum_name: String,
        number: i32,
    },

    /// More than one member of a union was populated.
    #[error("{path}: more than one member of union '{union_name}' is set")]
    UnionConflict {
        path: String,
        /// Fully-qualified union name.
        union_name: String,
    },

    /// A required property was absent at encode time.
    #[error("{path}: required property is missing")]
    MissingRequired { path: String },

    /// A numeric token does not fit the declared integer width or
    /// float kind.
    #[error("{path}: number out of range for {kind}")]
    OutOfRange { path: String, kind: String },

    /// Malformed base64, timestamp, date, or a value/schema mismatch.
    #[error("{path}: invalid value: {message}")]
    InvalidValue { path: String, message: String },

    /// A schema error surfaced during codec traversal.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The payload is not valid JSON.
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Appends an object key to a JSON path.
pub(crate) fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Appends an array index to a JSON path.
pub(crate) fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("", "bar"), "bar");
        assert_eq!(join_key("bar", "field"), "bar.field");
    }

    #[test]
    fn test_join_index() {
        assert_eq!(join_index("tags", 2), "tags[2]");
    }

    #[test]
    fn test_error_display_carries_path() {
        let err = CodecError::UnknownField {
            path: "bar".into(),
            name: "bogus".into(),
        };
        assert_eq!(err.to_string(), "bar: unknown field 'bogus'");
    }

    #[test]
    fn test_schema_error_converts() {
        let err: CodecError = SchemaError::UnresolvedRef("p.T".into()).into();
        assert!(matches!(err, CodecError::Schema(_)));
        assert!(err.to_string().contains("p.T"));
    }
}
