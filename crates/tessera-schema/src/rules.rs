//! Validation metadata attached to resolved scalar schemas.
//!
//! The resolver translates the raw [`FieldRules`] payload from a field
//! descriptor into a typed [`ValidationRules`] struct: numeric bounds
//! with exclusivity flags, string length bounds, and either a raw
//! pattern or a named [`StringFormat`]. A small fixed table of known
//! patterns is recognized and replaced by the corresponding named
//! format, so downstream consumers see `date`/`number` instead of the
//! raw regex.
//!
//! Nothing here enforces the constraints; they are schema metadata for
//! downstream consumers.

use crate::descriptor::FieldRules;
use crate::error::{SchemaError, SchemaResult};

/// Named string formats recognized by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Uuid,
    Email,
    Hostname,
    Ipv4,
    Ipv6,
    Uri,
    Date,
    Number,
}

impl StringFormat {
    /// Parses a format name from a descriptor. `Date` and `Number` are
    /// never declared directly; they are produced by pattern
    /// recognition.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "uuid" => Some(Self::Uuid),
            "email" => Some(Self::Email),
            "hostname" => Some(Self::Hostname),
            "ipv4" => Some(Self::Ipv4),
            "ipv6" => Some(Self::Ipv6),
            "uri" => Some(Self::Uri),
            _ => None,
        }
    }

    /// The canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Email => "email",
            Self::Hostname => "hostname",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Uri => "uri",
            Self::Date => "date",
            Self::Number => "number",
        }
    }
}

/// Patterns that are folded into named formats instead of being stored
/// raw.
const PATTERN_FORMATS: &[(&str, StringFormat)] = &[
    (r"^\d{4}-\d{2}-\d{2}$", StringFormat::Date),
    (r"^-?\d+(\.\d+)?$", StringFormat::Number),
];

/// Typed validation constraints on a scalar schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    /// Raw pattern, kept only when it does not match the fixed table.
    pub pattern: Option<String>,
    pub format: Option<StringFormat>,
}

impl ValidationRules {
    /// Returns `true` if no constraint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &ValidationRules::default()
    }

    /// Translates a descriptor's rule payload.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidField`] for an unknown format name.
    pub fn from_field_rules(rules: &FieldRules, field: &str) -> SchemaResult<Self> {
        let mut out = ValidationRules {
            minimum: rules.min,
            maximum: rules.max,
            exclusive_minimum: rules.exclusive_min,
            exclusive_maximum: rules.exclusive_max,
            min_length: rules.min_len,
            max_length: rules.max_len,
            pattern: None,
            format: None,
        };

        if let Some(name) = &rules.format {
            out.format = Some(StringFormat::parse(name).ok_or_else(|| {
                SchemaError::InvalidField {
                    field: field.to_string(),
                    message: format!("unknown string format '{name}'"),
                }
            })?);
        }

        if let Some(pattern) = &rules.pattern {
            match PATTERN_FORMATS.iter().find(|(p, _)| p == pattern) {
                Some((_, format)) => {
                    if out.format.is_none() {
                        out.format = Some(*format);
                    }
                }
                None => out.pattern = Some(pattern.clone()),
            }
        }

        Ok(out)
    }
}
