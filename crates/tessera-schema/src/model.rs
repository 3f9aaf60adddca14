//! The resolved schema graph.
//!
//! [`Schema`] is a closed tagged union with exactly one populated
//! variant per node. Named nodes (objects, unions, enums) are shared
//! through `Arc` and cached by fully-qualified name; forward references
//! between named nodes go through [`TypeRef`], whose resolved pointer
//! is populated exactly once by the resolver's linking pass. The link
//! is weak so that mutually-recursive graphs are still torn down when
//! the owning cache is dropped.
//!
//! Every value here is immutable once constructed. The codec enforces
//! union exclusivity at runtime; the schema only declares the shape.

use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::error::{SchemaError, SchemaResult};
use crate::rules::ValidationRules;
use crate::wkt::WellKnownType;

/// Leaf scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
}

impl ScalarKind {
    /// Lowercase kind name, used in error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

/// A leaf scalar, optionally overridden by a well-known type.
#[derive(Debug, Clone)]
pub struct ScalarSchema {
    pub kind: ScalarKind,
    /// Set when the scalar stands in for a well-known message type and
    /// the codec must apply that entry's textual encoding.
    pub well_known: Option<WellKnownType>,
    pub rules: ValidationRules,
}

impl ScalarSchema {
    /// A plain scalar of `kind` with no rules.
    #[must_use]
    pub fn plain(kind: ScalarKind) -> Self {
        Self {
            kind,
            well_known: None,
            rules: ValidationRules::default(),
        }
    }
}

/// One enum option. `name` is stored prefix-stripped; the zero option's
/// stored name is the empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumOption {
    pub name: String,
    pub number: i32,
    pub description: Option<String>,
}

/// A resolved enum.
#[derive(Debug)]
pub struct EnumSchema {
    pub full_name: String,
    /// Common prefix derived from the zero option's declared name, with
    /// the unspecified suffix removed (`COLOR_UNSPECIFIED` → `COLOR_`).
    pub name_prefix: String,
    /// Options in declaration order; the zero option is always first.
    pub options: Vec<EnumOption>,
}

impl EnumSchema {
    /// Looks up an option by number.
    #[must_use]
    pub fn option_by_number(&self, number: i32) -> Option<&EnumOption> {
        self.options.iter().find(|o| o.number == number)
    }
}

/// One JSON property of an object or union.
#[derive(Debug, Clone)]
pub struct Property {
    pub json_name: String,
    pub schema: Schema,
    /// Field numbers to walk through the live instance. Longer than one
    /// segment only for properties produced by flattening; empty for
    /// synthetic grouping properties.
    pub field_path: Vec<PathSegment>,
    pub required: bool,
    pub explicitly_optional: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub description: Option<String>,
}

impl Property {
    /// Returns `true` for synthetic grouping properties, which have no
    /// direct field path and recurse into their union's property list.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.field_path.is_empty()
    }
}

/// One step of a property's field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub number: u32,
    /// For non-final segments: the fully-qualified message type to
    /// materialize when writing through an absent intermediate.
    pub message_type: Option<String>,
}

impl PathSegment {
    /// A final (leaf) segment.
    #[must_use]
    pub fn leaf(number: u32) -> Self {
        Self {
            number,
            message_type: None,
        }
    }

    /// An intermediate segment introduced by flattening.
    #[must_use]
    pub fn through(number: u32, message_type: impl Into<String>) -> Self {
        Self {
            number,
            message_type: Some(message_type.into()),
        }
    }
}

/// An ordinary aggregate. Property order is JSON emission order and
/// equals descriptor declaration order after flattening.
#[derive(Debug)]
pub struct ObjectSchema {
    pub full_name: String,
    pub properties: Vec<Property>,
}

impl ObjectSchema {
    /// Property lookup by JSON name. Linear scan: typical messages have
    /// well under 50 properties, where a scan beats a map.
    #[must_use]
    pub fn property(&self, json_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.json_name == json_name)
    }
}

/// A tagged union: at most one property may be populated at runtime.
/// For wrapper messages the full name is the message's own; for exposed
/// groupings it is `<message>.<group>`.
#[derive(Debug)]
pub struct UnionSchema {
    pub full_name: String,
    pub properties: Vec<Property>,
}

impl UnionSchema {
    /// Property lookup by JSON name.
    #[must_use]
    pub fn property(&self, json_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.json_name == json_name)
    }
}

/// A named forward reference, populated once by the linking pass.
#[derive(Debug)]
pub struct TypeRef {
    pub target: String,
    resolved: OnceCell<Weak<Schema>>,
}

impl TypeRef {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            resolved: OnceCell::new(),
        }
    }

    pub(crate) fn link(&self, schema: &Arc<Schema>) {
        // Idempotent: a second link to the same target is a no-op.
        let _ = self.resolved.set(Arc::downgrade(schema));
    }

    /// Returns `true` once the linking pass has run.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Dereferences the target schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnresolvedRef`] if the linking pass has
    /// not populated this reference or the owning cache is gone; either
    /// is a bug in the resolution sequence, not bad input.
    pub fn resolve(&self) -> SchemaResult<Arc<Schema>> {
        self.resolved
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| SchemaError::UnresolvedRef(self.target.clone()))
    }
}

/// A node of the resolved schema graph.
#[derive(Debug, Clone)]
pub enum Schema {
    Scalar(ScalarSchema),
    Enum(Arc<EnumSchema>),
    Object(Arc<ObjectSchema>),
    Union(Arc<UnionSchema>),
    /// Homogeneous list of the element schema.
    Array(Arc<Schema>),
    /// String-keyed map of the value schema.
    Map(Arc<Schema>),
    /// Named forward reference to a cached object or union.
    Ref(Arc<TypeRef>),
    /// Free-form JSON value.
    Any,
}

impl Schema {
    /// The fully-qualified name of named nodes (`Enum`, `Object`,
    /// `Union`) and the target name of `Ref` nodes.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        match self {
            Schema::Enum(e) => Some(&e.full_name),
            Schema::Object(o) => Some(&o.full_name),
            Schema::Union(u) => Some(&u.full_name),
            Schema::Ref(r) => Some(&r.target),
            _ => None,
        }
    }

    /// Short variant name, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Schema::Scalar(_) => "scalar",
            Schema::Enum(_) => "enum",
            Schema::Object(_) => "object",
            Schema::Union(_) => "union",
            Schema::Array(_) => "array",
            Schema::Map(_) => "map",
            Schema::Ref(_) => "ref",
            Schema::Any => "any",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_unlinked_errors() {
        let r = TypeRef::new("acme.Missing");
        assert!(!r.is_linked());
        let err = r.resolve().unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedRef(ref n) if n == "acme.Missing"));
    }

    #[test]
    fn test_ref_links_once() {
        let target = Arc::new(Schema::Object(Arc::new(ObjectSchema {
            full_name: "acme.Order".into(),
            properties: vec![],
        })));
        let r = TypeRef::new("acme.Order");
        r.link(&target);
        r.link(&target); // no-op
        assert!(r.is_linked());
        let resolved = r.resolve().unwrap();
        assert_eq!(resolved.full_name(), Some("acme.Order"));
    }

    #[test]
    fn test_ref_weak_drops_with_owner() {
        let r = TypeRef::new("acme.Order");
        {
            let target = Arc::new(Schema::Any);
            r.link(&target);
            assert!(r.resolve().is_ok());
        }
        assert!(r.resolve().is_err());
    }

    #[test]
    fn test_property_lookup() {
        let obj = ObjectSchema {
            full_name: "acme.Order".into(),
            properties: vec![Property {
                json_name: "id".into(),
                schema: Schema::Scalar(ScalarSchema::plain(ScalarKind::String)),
                field_path: vec![PathSegment::leaf(1)],
                required: false,
                explicitly_optional: false,
                read_only: false,
                write_only: false,
                description: None,
            }],
        };
        assert!(obj.property("id").is_some());
        assert!(obj.property("missing").is_none());
    }

    #[test]
    fn test_group_property_detection() {
        let p = Property {
            json_name: "nakedOneof".into(),
            schema: Schema::Any,
            field_path: vec![],
            required: false,
            explicitly_optional: false,
            read_only: false,
            write_only: false,
            description: None,
        };
        assert!(p.is_group());
    }

    #[test]
    fn test_enum_option_lookup() {
        let e = EnumSchema {
            full_name: "acme.Color".into(),
            name_prefix: "COLOR_".into(),
            options: vec![
                EnumOption {
                    name: String::new(),
                    number: 0,
                    description: None,
                },
                EnumOption {
                    name: "RED".into(),
                    number: 1,
                    description: None,
                },
            ],
        };
        assert_eq!(e.option_by_number(1).unwrap().name, "RED");
        assert!(e.option_by_number(9).is_none());
    }
}
