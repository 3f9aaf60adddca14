//! Well-known type classification.
//!
//! A fixed set of message types in the reserved `wkt.` namespace is
//! given bespoke JSON encodings instead of the default message mapping.
//! This module owns the name table and the scalar-kind classification;
//! the codec crate owns the textual marshal/unmarshal functions.
//!
//! | FQN | Resolved shape | JSON encoding |
//! |-----|----------------|---------------|
//! | `wkt.Timestamp` | scalar | RFC 3339 string, nanosecond precision, UTC |
//! | `wkt.Date` | scalar | `YYYY-MM-DD` string |
//! | `wkt.Decimal` | scalar | decimal text as a string |
//! | `wkt.Empty` | scalar | `{}` |
//! | `wkt.BoolValue` … `wkt.BytesValue` | scalar | the bare wrapped value |
//! | `wkt.Value` | any | free-form JSON value |
//! | `wkt.Struct` | map of any | plain JSON object |
//! | `wkt.ListValue` | array of any | plain JSON array |
//!
//! A type name under `wkt.` that is not in the table is a resolution
//! error (the upstream toolchain emitted something this codec does not
//! understand).

use crate::model::ScalarKind;

/// Reserved namespace prefix for well-known types.
pub const RESERVED_NAMESPACE: &str = "wkt.";

/// The fixed set of well-known types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    Timestamp,
    Date,
    Decimal,
    Empty,
    BoolValue,
    Int32Value,
    Int64Value,
    UInt32Value,
    UInt64Value,
    FloatValue,
    DoubleValue,
    StringValue,
    BytesValue,
    /// Free-form JSON value.
    Value,
    /// String-keyed map of free-form values.
    Struct,
    /// List of free-form values.
    ListValue,
}

impl WellKnownType {
    /// Looks up a fully-qualified type name in the table.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "wkt.Timestamp" => Some(Self::Timestamp),
            "wkt.Date" => Some(Self::Date),
            "wkt.Decimal" => Some(Self::Decimal),
            "wkt.Empty" => Some(Self::Empty),
            "wkt.BoolValue" => Some(Self::BoolValue),
            "wkt.Int32Value" => Some(Self::Int32Value),
            "wkt.Int64Value" => Some(Self::Int64Value),
            "wkt.UInt32Value" => Some(Self::UInt32Value),
            "wkt.UInt64Value" => Some(Self::UInt64Value),
            "wkt.FloatValue" => Some(Self::FloatValue),
            "wkt.DoubleValue" => Some(Self::DoubleValue),
            "wkt.StringValue" => Some(Self::StringValue),
            "wkt.BytesValue" => Some(Self::BytesValue),
            "wkt.Value" => Some(Self::Value),
            "wkt.Struct" => Some(Self::Struct),
            "wkt.ListValue" => Some(Self::ListValue),
            _ => None,
        }
    }

    /// The fully-qualified name of this entry.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Timestamp => "wkt.Timestamp",
            Self::Date => "wkt.Date",
            Self::Decimal => "wkt.Decimal",
            Self::Empty => "wkt.Empty",
            Self::BoolValue => "wkt.BoolValue",
            Self::Int32Value => "wkt.Int32Value",
            Self::Int64Value => "wkt.Int64Value",
            Self::UInt32Value => "wkt.UInt32Value",
            Self::UInt64Value => "wkt.UInt64Value",
            Self::FloatValue => "wkt.FloatValue",
            Self::DoubleValue => "wkt.DoubleValue",
            Self::StringValue => "wkt.StringValue",
            Self::BytesValue => "wkt.BytesValue",
            Self::Value => "wkt.Value",
            Self::Struct => "wkt.Struct",
            Self::ListValue => "wkt.ListValue",
        }
    }

    /// Returns `true` if `name` lives in the reserved namespace.
    #[must_use]
    pub fn is_reserved(name: &str) -> bool {
        name.starts_with(RESERVED_NAMESPACE)
    }

    /// The underlying scalar kind for scalar-shaped entries; `None` for
    /// the free-form entries (`Value`, `Struct`, `ListValue`), whose
    /// shapes are not scalars.
    #[must_use]
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Timestamp | Self::Date | Self::Decimal | Self::Empty | Self::StringValue => {
                Some(ScalarKind::String)
            }
            Self::BoolValue => Some(ScalarKind::Bool),
            Self::Int32Value => Some(ScalarKind::Int32),
            Self::Int64Value => Some(ScalarKind::Int64),
            Self::UInt32Value => Some(ScalarKind::Uint32),
            Self::UInt64Value => Some(ScalarKind::Uint64),
            Self::FloatValue => Some(ScalarKind::Float),
            Self::DoubleValue => Some(ScalarKind::Double),
            Self::BytesValue => Some(ScalarKind::Bytes),
            Self::Value | Self::Struct | Self::ListValue => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_round_trip() {
        for wkt in [
            WellKnownType::Timestamp,
            WellKnownType::Date,
            WellKnownType::Decimal,
            WellKnownType::Empty,
            WellKnownType::BoolValue,
            WellKnownType::BytesValue,
            WellKnownType::Value,
            WellKnownType::Struct,
            WellKnownType::ListValue,
        ] {
            assert_eq!(WellKnownType::from_type_name(wkt.type_name()), Some(wkt));
        }
    }

    #[test]
    fn test_reserved_but_unknown() {
        assert!(WellKnownType::is_reserved("wkt.Duration"));
        assert!(WellKnownType::from_type_name("wkt.Duration").is_none());
    }

    #[test]
    fn test_not_reserved() {
        assert!(!WellKnownType::is_reserved("acme.v1.Order"));
    }

    #[test]
    fn test_scalar_kinds() {
        assert_eq!(
            WellKnownType::Int64Value.scalar_kind(),
            Some(ScalarKind::Int64)
        );
        assert_eq!(
            WellKnownType::Timestamp.scalar_kind(),
            Some(ScalarKind::String)
        );
        assert_eq!(WellKnownType::Struct.scalar_kind(), None);
    }
}
