//! Descriptor-to-schema resolution.
//!
//! The [`Resolver`] walks message and enum descriptors once per
//! fully-qualified name and produces immutable [`Schema`] nodes, cached
//! in an explicit [`SchemaCache`] (never a process-wide singleton).
//! Message-typed fields become [`TypeRef`] nodes; after each top-level
//! resolve call a linking pass populates every pending reference, which
//! is how mutually-recursive type graphs avoid unbounded recursion.
//!
//! Resolution per message descriptor:
//!
//! 1. Decide union-wrapper status ([`is_union_wrapper`]): an explicit
//!    message annotation wins in either direction, otherwise the
//!    heuristic applies.
//! 2. Exposed field groupings become synthetic union properties,
//!    inserted at the position of their first member field so property
//!    order equals declaration order.
//! 3. Fields resolve in declaration order: repeated fields wrap in
//!    `Array`, maps in `Map`, flattened message fields splice their
//!    target's properties with prefixed field paths, everything else
//!    becomes an ordinary property.
//! 4. Enum fields apply `in`/`not_in` filters (mutually exclusive)
//!    before prefix-stripping.
//! 5. Message fields in the reserved namespace substitute the
//!    well-known shape or fail; all other message fields become `Ref`s.
//!
//! The cache is single-writer during resolution and read-only
//! afterwards; concurrent builds must use separate caches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::{
    derive_json_name, Cardinality, EnumDescriptor, FieldDescriptor, FieldType, GroupDescriptor,
    MessageDescriptor,
};
use crate::error::{SchemaError, SchemaResult};
use crate::model::{
    EnumOption, EnumSchema, ObjectSchema, PathSegment, Property, ScalarKind, ScalarSchema, Schema,
    TypeRef, UnionSchema,
};
use crate::registry::TypeRegistry;
use crate::rules::ValidationRules;
use crate::wkt::WellKnownType;

/// Resolution options.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Suffix the zero enum option's name must carry; the common prefix
    /// is the zero option's name with this suffix removed.
    pub unspecified_suffix: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            unspecified_suffix: "UNSPECIFIED".to_string(),
        }
    }
}

/// Name-to-schema cache for one build run.
///
/// Populated single-threaded during resolution, read-only afterwards.
/// The cache owns the strong references; `Ref` nodes hold weak links,
/// so dropping the cache tears the graph down even when types are
/// mutually recursive.
#[derive(Debug, Default)]
pub struct SchemaCache {
    by_name: HashMap<String, Arc<Schema>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached schema.
    #[must_use]
    pub fn get(&self, fqn: &str) -> Option<&Arc<Schema>> {
        self.by_name.get(fqn)
    }

    /// Returns `true` if `fqn` has been resolved.
    #[must_use]
    pub fn contains(&self, fqn: &str) -> bool {
        self.by_name.contains_key(fqn)
    }

    /// Number of cached schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn insert(&mut self, fqn: String, schema: Schema) -> Arc<Schema> {
        let arc = Arc::new(schema);
        self.by_name.insert(fqn, arc.clone());
        arc
    }
}

/// Pure union-wrapper predicate.
///
/// An explicit message-level annotation wins in either direction.
/// Without one, a message is a union wrapper when it has exactly one
/// field grouping, the grouping is named `type`, carries no explicit
/// expose/suppress annotation, and every one of its member fields is
/// message-typed (and it has at least one member).
#[must_use]
pub fn is_union_wrapper(desc: &MessageDescriptor) -> bool {
    if let Some(explicit) = desc.options.union {
        return explicit;
    }
    if desc.groups.len() != 1 {
        return false;
    }
    let group = &desc.groups[0];
    if group.name != "type" || group.options.expose.is_some() {
        return false;
    }
    let mut members = desc.group_members(0).peekable();
    members.peek().is_some() && members.all(|f| f.field_type.is_message())
}

/// Descriptor-to-schema resolver, memoized per fully-qualified name.
pub struct Resolver<'a> {
    registry: &'a TypeRegistry,
    options: ResolverOptions,
    cache: SchemaCache,
    in_progress: HashSet<String>,
    pending: Vec<Arc<TypeRef>>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver with default options and a fresh cache.
    #[must_use]
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self::with_options(registry, ResolverOptions::default())
    }

    /// Creates a resolver with explicit options.
    #[must_use]
    pub fn with_options(registry: &'a TypeRegistry, options: ResolverOptions) -> Self {
        Self {
            registry,
            options,
            cache: SchemaCache::new(),
            in_progress: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Borrows the cache.
    #[must_use]
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Consumes the resolver, returning the populated cache.
    #[must_use]
    pub fn into_cache(self) -> SchemaCache {
        self.cache
    }

    /// Resolves a message type and links all pending references.
    ///
    /// Idempotent per fully-qualified name; repeated calls return the
    /// cached node.
    ///
    /// # Errors
    ///
    /// Any [`SchemaError`] aborts resolution for this schema; no
    /// partial schema enters the cache.
    pub fn resolve_message(&mut self, fqn: &str) -> SchemaResult<Schema> {
        let schema = self.resolve_message_inner(fqn)?;
        self.link_pending()?;
        Ok(schema)
    }

    /// Resolves an enum type (no filters applied).
    ///
    /// # Errors
    ///
    /// See [`resolve_message`](Self::resolve_message).
    pub fn resolve_enum(&mut self, fqn: &str) -> SchemaResult<Schema> {
        self.resolve_enum_inner(fqn, None)
    }

    fn resolve_message_inner(&mut self, fqn: &str) -> SchemaResult<Schema> {
        if let Some(cached) = self.cache.get(fqn) {
            return Ok((**cached).clone());
        }
        let desc = self
            .registry
            .message(fqn)
            .ok_or_else(|| SchemaError::UnknownType(fqn.to_string()))?
            .clone();

        debug!(type_name = %fqn, "resolving message schema");
        self.in_progress.insert(fqn.to_string());
        let built = self.build_message_schema(fqn, &desc);
        self.in_progress.remove(fqn);

        let schema = built?;
        self.cache.insert(fqn.to_string(), schema.clone());
        Ok(schema)
    }

    fn build_message_schema(&mut self, fqn: &str, desc: &MessageDescriptor) -> SchemaResult<Schema> {
        if is_union_wrapper(desc) {
            let properties = self.build_union_members(fqn, desc)?;
            return Ok(Schema::Union(Arc::new(UnionSchema {
                full_name: fqn.to_string(),
                properties,
            })));
        }

        let properties = self.build_object_properties(fqn, desc)?;
        Ok(Schema::Object(Arc::new(ObjectSchema {
            full_name: fqn.to_string(),
            properties,
        })))
    }

    /// Member properties of a wrapper union: the single grouping's
    /// fields when one exists, otherwise (explicitly annotated
    /// wrappers) every field.
    fn build_union_members(
        &mut self,
        fqn: &str,
        desc: &MessageDescriptor,
    ) -> SchemaResult<Vec<Property>> {
        let members: Vec<&FieldDescriptor> = if desc.groups.len() == 1 {
            let grouped: Vec<_> = desc.group_members(0).collect();
            if grouped.is_empty() {
                desc.fields.iter().collect()
            } else {
                grouped
            }
        } else {
            desc.fields.iter().collect()
        };

        members
            .into_iter()
            .map(|field| {
                if field.options.flatten {
                    return Err(SchemaError::InvalidField {
                        field: field.name.clone(),
                        message: format!("flatten is not supported inside union '{fqn}'"),
                    });
                }
                self.build_field_property(field)
            })
            .collect()
    }

    fn build_object_properties(
        &mut self,
        fqn: &str,
        desc: &MessageDescriptor,
    ) -> SchemaResult<Vec<Property>> {
        enum Slot {
            Ready(Property),
            Group(usize),
        }

        struct GroupBuilder {
            name: String,
            description: Option<String>,
            properties: Vec<Property>,
            inserted: bool,
        }

        let mut builders: Vec<Option<GroupBuilder>> = desc
            .groups
            .iter()
            .map(|g: &GroupDescriptor| {
                if g.options.expose == Some(true) {
                    Some(GroupBuilder {
                        name: g.name.clone(),
                        description: g.description.clone(),
                        properties: Vec::new(),
                        inserted: false,
                    })
                } else {
                    None
                }
            })
            .collect();

        let mut slots: Vec<Slot> = Vec::with_capacity(desc.fields.len());

        for field in &desc.fields {
            if field.options.flatten {
                let spliced = self.flatten_field(field)?;
                slots.extend(spliced.into_iter().map(Slot::Ready));
                continue;
            }

            if let Some(index) = field.group_index {
                if index >= desc.groups.len() {
                    return Err(SchemaError::InvalidField {
                        field: field.name.clone(),
                        message: format!("grouping index {index} out of range"),
                    });
                }
                if builders[index].is_some() {
                    let prop = self.build_field_property(field)?;
                    if let Some(builder) = &mut builders[index] {
                        if !builder.inserted {
                            builder.inserted = true;
                            slots.push(Slot::Group(index));
                        }
                        builder.properties.push(prop);
                    }
                    continue;
                }
                // Unexposed grouping: members are plain properties.
            }

            slots.push(Slot::Ready(self.build_field_property(field)?));
        }

        // An exposed grouping whose synthetic property was never
        // inserted has no member fields, which leaves it unconsumed.
        for builder in builders.iter().flatten() {
            if !builder.inserted {
                return Err(SchemaError::InvalidGroup {
                    group: builder.name.clone(),
                    message: "exposed grouping has no member fields".to_string(),
                });
            }
        }

        let properties = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Ready(p) => p,
                Slot::Group(index) => {
                    let builder = builders[index].take().expect("group slot emitted once");
                    let union = UnionSchema {
                        full_name: format!("{fqn}.{}", builder.name),
                        properties: builder.properties,
                    };
                    Property {
                        json_name: derive_json_name(&builder.name),
                        schema: Schema::Union(Arc::new(union)),
                        field_path: Vec::new(),
                        required: false,
                        explicitly_optional: false,
                        read_only: false,
                        write_only: false,
                        description: builder.description,
                    }
                }
            })
            .collect();

        Ok(properties)
    }

    /// Resolves a flattened message field into its target's properties,
    /// each with the flattening field's number prefixed to its path.
    fn flatten_field(&mut self, field: &FieldDescriptor) -> SchemaResult<Vec<Property>> {
        let FieldType::Message(target) = &field.field_type else {
            return Err(SchemaError::InvalidField {
                field: field.name.clone(),
                message: "flatten requires a message-typed field".to_string(),
            });
        };
        if field.cardinality != Cardinality::Singular {
            return Err(SchemaError::InvalidField {
                field: field.name.clone(),
                message: "flatten requires a singular field".to_string(),
            });
        }
        if WellKnownType::is_reserved(target) {
            return Err(SchemaError::InvalidField {
                field: field.name.clone(),
                message: format!("cannot flatten well-known type '{target}'"),
            });
        }
        if self.in_progress.contains(target.as_str()) {
            return Err(SchemaError::InvalidField {
                field: field.name.clone(),
                message: format!("recursive flatten of '{target}'"),
            });
        }

        let resolved = self.resolve_message_inner(target)?;
        let Schema::Object(object) = resolved else {
            return Err(SchemaError::InvalidField {
                field: field.name.clone(),
                message: format!("cannot flatten union wrapper '{target}'"),
            });
        };

        let spliced = object
            .properties
            .iter()
            .map(|p| {
                let mut prop = p.clone();
                prop.field_path
                    .insert(0, PathSegment::through(field.number, target.clone()));
                prop
            })
            .collect();
        Ok(spliced)
    }

    fn build_field_property(&mut self, field: &FieldDescriptor) -> SchemaResult<Property> {
        let base = self.field_base_schema(field)?;
        let schema = match field.cardinality {
            Cardinality::Singular => base,
            Cardinality::Repeated => Schema::Array(Arc::new(base)),
            Cardinality::Map => Schema::Map(Arc::new(base)),
        };

        Ok(Property {
            json_name: field.effective_json_name(),
            schema,
            field_path: vec![PathSegment::leaf(field.number)],
            required: field.options.required,
            explicitly_optional: field.explicitly_optional,
            read_only: field.options.read_only,
            write_only: field.options.write_only,
            description: field.description.clone(),
        })
    }

    fn field_base_schema(&mut self, field: &FieldDescriptor) -> SchemaResult<Schema> {
        let rules = match &field.options.rules {
            Some(r) => ValidationRules::from_field_rules(r, &field.name)?,
            None => ValidationRules::default(),
        };

        let scalar = |kind: ScalarKind| {
            Schema::Scalar(ScalarSchema {
                kind,
                well_known: None,
                rules: rules.clone(),
            })
        };

        match &field.field_type {
            FieldType::Bool => Ok(scalar(ScalarKind::Bool)),
            FieldType::Int32 => Ok(scalar(ScalarKind::Int32)),
            FieldType::Int64 => Ok(scalar(ScalarKind::Int64)),
            FieldType::Uint32 => Ok(scalar(ScalarKind::Uint32)),
            FieldType::Uint64 => Ok(scalar(ScalarKind::Uint64)),
            FieldType::Float => Ok(scalar(ScalarKind::Float)),
            FieldType::Double => Ok(scalar(ScalarKind::Double)),
            FieldType::String => Ok(scalar(ScalarKind::String)),
            FieldType::Bytes => Ok(scalar(ScalarKind::Bytes)),
            FieldType::Enum(name) => self.enum_field_schema(name, field),
            FieldType::Message(name) => self.message_field_schema(name, rules),
        }
    }

    fn enum_field_schema(&mut self, fqn: &str, field: &FieldDescriptor) -> SchemaResult<Schema> {
        let filters = field.options.rules.as_ref().and_then(|r| {
            if r.r#in.is_empty() && r.not_in.is_empty() {
                None
            } else {
                Some((r.r#in.as_slice(), r.not_in.as_slice()))
            }
        });
        self.resolve_enum_inner(fqn, filters)
    }

    fn message_field_schema(&mut self, fqn: &str, rules: ValidationRules) -> SchemaResult<Schema> {
        if let Some(wkt) = WellKnownType::from_type_name(fqn) {
            return Ok(well_known_schema(wkt, rules));
        }
        if WellKnownType::is_reserved(fqn) {
            return Err(SchemaError::UnsupportedWellKnown(fqn.to_string()));
        }
        if self.registry.message(fqn).is_none() {
            return Err(SchemaError::UnknownType(fqn.to_string()));
        }

        let reference = Arc::new(TypeRef::new(fqn));
        self.pending.push(reference.clone());
        if !self.cache.contains(fqn) && !self.in_progress.contains(fqn) {
            self.resolve_message_inner(fqn)?;
        }
        Ok(Schema::Ref(reference))
    }

    /// Builds an enum schema, applying optional `in`/`not_in` filters.
    /// Unfiltered enums are cached; filtered variants are per-field.
    fn resolve_enum_inner(
        &mut self,
        fqn: &str,
        filters: Option<(&[i32], &[i32])>,
    ) -> SchemaResult<Schema> {
        if filters.is_none() {
            if let Some(cached) = self.cache.get(fqn) {
                return Ok((**cached).clone());
            }
        }

        let desc = self
            .registry
            .enum_type(fqn)
            .ok_or_else(|| SchemaError::UnknownType(fqn.to_string()))?
            .clone();

        let schema = Schema::Enum(Arc::new(self.build_enum_schema(fqn, &desc, filters)?));
        if filters.is_none() {
            debug!(type_name = %fqn, "resolving enum schema");
            self.cache.insert(fqn.to_string(), schema.clone());
        }
        Ok(schema)
    }

    fn build_enum_schema(
        &self,
        fqn: &str,
        desc: &EnumDescriptor,
        filters: Option<(&[i32], &[i32])>,
    ) -> SchemaResult<EnumSchema> {
        let invalid = |message: String| SchemaError::InvalidEnum {
            name: fqn.to_string(),
            message,
        };

        let zero = desc
            .values
            .first()
            .ok_or_else(|| invalid("enum has no values".to_string()))?;
        if zero.number != 0 {
            return Err(invalid("zero value must be declared first".to_string()));
        }
        let suffix = &self.options.unspecified_suffix;
        let prefix = zero.name.strip_suffix(suffix.as_str()).ok_or_else(|| {
            invalid(format!(
                "zero value '{}' must end in '{suffix}'",
                zero.name
            ))
        })?;

        let (allow, deny) = filters.unwrap_or((&[], &[]));
        if !allow.is_empty() && !deny.is_empty() {
            return Err(invalid(
                "'in' and 'not_in' constraints are mutually exclusive".to_string(),
            ));
        }

        let mut options = Vec::with_capacity(desc.values.len());
        for value in &desc.values {
            // Filters never remove the zero option; index 0 is invariant.
            if value.number != 0 {
                if !allow.is_empty() && !allow.contains(&value.number) {
                    continue;
                }
                if deny.contains(&value.number) {
                    continue;
                }
            }
            let name = if value.number == 0 {
                String::new()
            } else {
                value
                    .name
                    .strip_prefix(prefix)
                    .unwrap_or(&value.name)
                    .to_string()
            };
            options.push(EnumOption {
                name,
                number: value.number,
                description: value.description.clone(),
            });
        }

        Ok(EnumSchema {
            full_name: fqn.to_string(),
            name_prefix: prefix.to_string(),
            options,
        })
    }

    fn link_pending(&mut self) -> SchemaResult<()> {
        for reference in self.pending.drain(..) {
            let target = self
                .cache
                .by_name
                .get(&reference.target)
                .ok_or_else(|| SchemaError::UnresolvedRef(reference.target.clone()))?;
            reference.link(target);
        }
        Ok(())
    }
}

/// Shape substitution for well-known message types.
fn well_known_schema(wkt: WellKnownType, rules: ValidationRules) -> Schema {
    match wkt {
        WellKnownType::Value => Schema::Any,
        WellKnownType::Struct => Schema::Map(Arc::new(Schema::Any)),
        WellKnownType::ListValue => Schema::Array(Arc::new(Schema::Any)),
        other => Schema::Scalar(ScalarSchema {
            kind: other.scalar_kind().expect("scalar-shaped well-known type"),
            well_known: Some(other),
            rules,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorSet, FieldRules, FileDescriptor};

    fn registry(file: FileDescriptor) -> TypeRegistry {
        TypeRegistry::from_set(&DescriptorSet::new().file(file)).unwrap()
    }

    fn color_enum() -> EnumDescriptor {
        EnumDescriptor::new("Color")
            .value("COLOR_UNSPECIFIED", 0)
            .value("COLOR_RED", 1)
            .value("COLOR_GREEN", 2)
            .value("COLOR_BLUE", 3)
    }

    // ── union-wrapper heuristic ────────────────────────────────

    #[test]
    fn test_heuristic_detects_wrapper() {
        let m = MessageDescriptor::new("Event")
            .group(GroupDescriptor::new("type"))
            .field(FieldDescriptor::new("created", 1, FieldType::Message("p.Created".into())).in_group(0))
            .field(FieldDescriptor::new("deleted", 2, FieldType::Message("p.Deleted".into())).in_group(0));
        assert!(is_union_wrapper(&m));
    }

    #[test]
    fn test_heuristic_zero_groupings() {
        let m = MessageDescriptor::new("Plain")
            .field(FieldDescriptor::new("id", 1, FieldType::String));
        assert!(!is_union_wrapper(&m));
    }

    #[test]
    fn test_heuristic_multiple_groupings() {
        let m = MessageDescriptor::new("Two")
            .group(GroupDescriptor::new("type"))
            .group(GroupDescriptor::new("other"))
            .field(FieldDescriptor::new("a", 1, FieldType::Message("p.A".into())).in_group(0))
            .field(FieldDescriptor::new("b", 2, FieldType::Message("p.B".into())).in_group(1));
        assert!(!is_union_wrapper(&m));
    }

    #[test]
    fn test_heuristic_wrong_group_name() {
        let m = MessageDescriptor::new("Event")
            .group(GroupDescriptor::new("payload"))
            .field(FieldDescriptor::new("a", 1, FieldType::Message("p.A".into())).in_group(0));
        assert!(!is_union_wrapper(&m));
    }

    #[test]
    fn test_heuristic_non_message_member() {
        let m = MessageDescriptor::new("Event")
            .group(GroupDescriptor::new("type"))
            .field(FieldDescriptor::new("a", 1, FieldType::Message("p.A".into())).in_group(0))
            .field(FieldDescriptor::new("b", 2, FieldType::String).in_group(0));
        assert!(!is_union_wrapper(&m));
    }

    #[test]
    fn test_heuristic_empty_grouping() {
        let m = MessageDescriptor::new("Event").group(GroupDescriptor::new("type"));
        assert!(!is_union_wrapper(&m));
    }

    #[test]
    fn test_heuristic_explicit_annotation_wins() {
        let plain = MessageDescriptor::new("Forced")
            .field(FieldDescriptor::new("id", 1, FieldType::String))
            .union_wrapper(true);
        assert!(is_union_wrapper(&plain));

        let suppressed = MessageDescriptor::new("Event")
            .group(GroupDescriptor::new("type"))
            .field(FieldDescriptor::new("a", 1, FieldType::Message("p.A".into())).in_group(0))
            .union_wrapper(false);
        assert!(!is_union_wrapper(&suppressed));
    }

    #[test]
    fn test_heuristic_annotated_grouping_overrides() {
        let m = MessageDescriptor::new("Event")
            .group(GroupDescriptor::new("type").exposed())
            .field(FieldDescriptor::new("a", 1, FieldType::Message("p.A".into())).in_group(0));
        assert!(!is_union_wrapper(&m));
    }

    // ── basic resolution & memoization ─────────────────────────

    #[test]
    fn test_resolve_plain_object() {
        let reg = registry(
            FileDescriptor::new("p").message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("id", 1, FieldType::String))
                    .field(FieldDescriptor::new("count", 2, FieldType::Int32).repeated())
                    .field(FieldDescriptor::new("labels", 3, FieldType::String).map()),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        let schema = resolver.resolve_message("p.Order").unwrap();

        let Schema::Object(obj) = schema else {
            panic!("expected object");
        };
        assert_eq!(obj.full_name, "p.Order");
        assert_eq!(obj.properties.len(), 3);
        assert_eq!(obj.properties[0].json_name, "id");
        assert!(matches!(obj.properties[1].schema, Schema::Array(_)));
        assert!(matches!(obj.properties[2].schema, Schema::Map(_)));
    }

    #[test]
    fn test_resolution_is_memoized() {
        let reg = registry(
            FileDescriptor::new("p")
                .message(MessageDescriptor::new("Order")),
        );
        let mut resolver = Resolver::new(&reg);
        let a = resolver.resolve_message("p.Order").unwrap();
        let b = resolver.resolve_message("p.Order").unwrap();
        let (Schema::Object(a), Schema::Object(b)) = (a, b) else {
            panic!("expected objects");
        };
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let reg = registry(FileDescriptor::new("p"));
        let mut resolver = Resolver::new(&reg);
        let err = resolver.resolve_message("p.Missing").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType(_)));
    }

    // ── references & cycles ────────────────────────────────────

    #[test]
    fn test_nested_message_becomes_linked_ref() {
        let reg = registry(
            FileDescriptor::new("p")
                .message(
                    MessageDescriptor::new("Outer")
                        .field(FieldDescriptor::new("inner", 1, FieldType::Message("p.Inner".into()))),
                )
                .message(MessageDescriptor::new("Inner")),
        );
        let mut resolver = Resolver::new(&reg);
        let schema = resolver.resolve_message("p.Outer").unwrap();

        let Schema::Object(obj) = schema else {
            panic!("expected object");
        };
        let Schema::Ref(r) = &obj.properties[0].schema else {
            panic!("expected ref");
        };
        assert!(r.is_linked());
        let target = r.resolve().unwrap();
        assert_eq!(target.full_name(), Some("p.Inner"));
    }

    #[test]
    fn test_mutually_recursive_types_resolve() {
        let reg = registry(
            FileDescriptor::new("p")
                .message(
                    MessageDescriptor::new("Node")
                        .field(FieldDescriptor::new("next", 1, FieldType::Message("p.Node".into())))
                        .field(FieldDescriptor::new("tree", 2, FieldType::Message("p.Tree".into()))),
                )
                .message(
                    MessageDescriptor::new("Tree")
                        .field(FieldDescriptor::new("root", 1, FieldType::Message("p.Node".into()))),
                ),
        );
        let mut resolver = Resolver::new(&reg);
        let schema = resolver.resolve_message("p.Node").unwrap();

        let Schema::Object(obj) = schema else {
            panic!("expected object");
        };
        for prop in &obj.properties {
            let Schema::Ref(r) = &prop.schema else {
                panic!("expected ref");
            };
            assert!(r.is_linked(), "{} not linked", r.target);
        }
        assert_eq!(resolver.cache().len(), 2);
    }

    // ── flattening ─────────────────────────────────────────────

    #[test]
    fn test_flatten_splices_properties_in_order() {
        let reg = registry(
            FileDescriptor::new("p")
                .message(
                    MessageDescriptor::new("Wrapper")
                        .field(FieldDescriptor::new("before", 1, FieldType::String))
                        .field(
                            FieldDescriptor::new("details", 2, FieldType::Message("p.Details".into()))
                                .flattened(),
                        )
                        .field(FieldDescriptor::new("after", 3, FieldType::String)),
                )
                .message(
                    MessageDescriptor::new("Details")
                        .field(FieldDescriptor::new("field_from_flattened", 1, FieldType::String))
                        .field(FieldDescriptor::new("other", 2, FieldType::Int64)),
                ),
        );
        let mut resolver = Resolver::new(&reg);
        let Schema::Object(obj) = resolver.resolve_message("p.Wrapper").unwrap() else {
            panic!("expected object");
        };

        let names: Vec<_> = obj.properties.iter().map(|p| p.json_name.as_str()).collect();
        assert_eq!(names, ["before", "fieldFromFlattened", "other", "after"]);

        let spliced = &obj.properties[1];
        assert_eq!(
            spliced.field_path,
            vec![PathSegment::through(2, "p.Details"), PathSegment::leaf(1)]
        );
    }

    #[test]
    fn test_flatten_non_message_rejected() {
        let reg = registry(
            FileDescriptor::new("p").message(
                MessageDescriptor::new("Bad")
                    .field(FieldDescriptor::new("x", 1, FieldType::String).flattened()),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        let err = resolver.resolve_message("p.Bad").unwrap_err();
        assert!(err.to_string().contains("message-typed"));
    }

    #[test]
    fn test_flatten_cycle_rejected() {
        let reg = registry(
            FileDescriptor::new("p").message(
                MessageDescriptor::new("Loop")
                    .field(FieldDescriptor::new("inner", 1, FieldType::Message("p.Loop".into())).flattened()),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        let err = resolver.resolve_message("p.Loop").unwrap_err();
        assert!(err.to_string().contains("recursive flatten"));
    }

    // ── exposed groupings ──────────────────────────────────────

    #[test]
    fn test_exposed_grouping_inserted_at_first_member() {
        let reg = registry(
            FileDescriptor::new("p").message(
                MessageDescriptor::new("Holder")
                    .group(GroupDescriptor::new("naked_oneof").exposed())
                    .field(FieldDescriptor::new("lead", 1, FieldType::String))
                    .field(FieldDescriptor::new("oneof_string", 2, FieldType::String).in_group(0))
                    .field(FieldDescriptor::new("middle", 3, FieldType::Bool))
                    .field(FieldDescriptor::new("oneof_int", 4, FieldType::Int32).in_group(0)),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        let Schema::Object(obj) = resolver.resolve_message("p.Holder").unwrap() else {
            panic!("expected object");
        };

        let names: Vec<_> = obj.properties.iter().map(|p| p.json_name.as_str()).collect();
        assert_eq!(names, ["lead", "nakedOneof", "middle"]);

        let group = &obj.properties[1];
        assert!(group.is_group());
        let Schema::Union(u) = &group.schema else {
            panic!("expected union");
        };
        assert_eq!(u.full_name, "p.Holder.naked_oneof");
        let members: Vec<_> = u.properties.iter().map(|p| p.json_name.as_str()).collect();
        assert_eq!(members, ["oneofString", "oneofInt"]);
    }

    #[test]
    fn test_exposed_grouping_without_members_rejected() {
        let reg = registry(
            FileDescriptor::new("p").message(
                MessageDescriptor::new("Holder")
                    .group(GroupDescriptor::new("choice").exposed())
                    .field(FieldDescriptor::new("plain", 1, FieldType::String)),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        let err = resolver.resolve_message("p.Holder").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidGroup { ref group, .. } if group == "choice"));
    }

    #[test]
    fn test_wrapper_union_resolves_as_union() {
        let reg = registry(
            FileDescriptor::new("p")
                .message(
                    MessageDescriptor::new("Event")
                        .group(GroupDescriptor::new("type"))
                        .field(FieldDescriptor::new("created", 1, FieldType::Message("p.Created".into())).in_group(0))
                        .field(FieldDescriptor::new("deleted", 2, FieldType::Message("p.Deleted".into())).in_group(0)),
                )
                .message(MessageDescriptor::new("Created"))
                .message(MessageDescriptor::new("Deleted")),
        );
        let mut resolver = Resolver::new(&reg);
        let Schema::Union(u) = resolver.resolve_message("p.Event").unwrap() else {
            panic!("expected union");
        };
        assert_eq!(u.full_name, "p.Event");
        assert_eq!(u.properties.len(), 2);
        assert_eq!(u.properties[0].json_name, "created");
    }

    // ── enums ──────────────────────────────────────────────────

    #[test]
    fn test_enum_prefix_stripping() {
        let reg = registry(FileDescriptor::new("p").enum_type(color_enum()));
        let mut resolver = Resolver::new(&reg);
        let Schema::Enum(e) = resolver.resolve_enum("p.Color").unwrap() else {
            panic!("expected enum");
        };
        assert_eq!(e.name_prefix, "COLOR_");
        assert_eq!(e.options[0].name, "");
        assert_eq!(e.options[0].number, 0);
        assert_eq!(e.options[1].name, "RED");
        assert_eq!(e.options[3].name, "BLUE");
    }

    #[test]
    fn test_enum_missing_suffix_rejected() {
        let reg = registry(
            FileDescriptor::new("p")
                .enum_type(EnumDescriptor::new("Bad").value("BAD_NONE", 0).value("BAD_A", 1)),
        );
        let mut resolver = Resolver::new(&reg);
        let err = resolver.resolve_enum("p.Bad").unwrap_err();
        assert!(err.to_string().contains("UNSPECIFIED"));
    }

    #[test]
    fn test_enum_zero_not_first_rejected() {
        let reg = registry(
            FileDescriptor::new("p").enum_type(
                EnumDescriptor::new("Bad")
                    .value("BAD_A", 1)
                    .value("BAD_UNSPECIFIED", 0),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        assert!(resolver.resolve_enum("p.Bad").is_err());
    }

    #[test]
    fn test_enum_field_filters() {
        let reg = registry(
            FileDescriptor::new("p")
                .message(
                    MessageDescriptor::new("Paint").field(
                        FieldDescriptor::new("color", 1, FieldType::Enum("p.Color".into()))
                            .with_rules(FieldRules {
                                not_in: vec![2],
                                ..FieldRules::default()
                            }),
                    ),
                )
                .enum_type(color_enum()),
        );
        let mut resolver = Resolver::new(&reg);
        let Schema::Object(obj) = resolver.resolve_message("p.Paint").unwrap() else {
            panic!("expected object");
        };
        let Schema::Enum(e) = &obj.properties[0].schema else {
            panic!("expected enum");
        };
        let numbers: Vec<_> = e.options.iter().map(|o| o.number).collect();
        assert_eq!(numbers, [0, 1, 3]); // GREEN filtered, zero kept
    }

    #[test]
    fn test_enum_conflicting_filters_rejected() {
        let reg = registry(
            FileDescriptor::new("p")
                .message(
                    MessageDescriptor::new("Paint").field(
                        FieldDescriptor::new("color", 1, FieldType::Enum("p.Color".into()))
                            .with_rules(FieldRules {
                                r#in: vec![1],
                                not_in: vec![2],
                                ..FieldRules::default()
                            }),
                    ),
                )
                .enum_type(color_enum()),
        );
        let mut resolver = Resolver::new(&reg);
        let err = resolver.resolve_message("p.Paint").unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_custom_unspecified_suffix() {
        let reg = registry(
            FileDescriptor::new("p").enum_type(
                EnumDescriptor::new("Mode").value("MODE_UNKNOWN", 0).value("MODE_FAST", 1),
            ),
        );
        let mut resolver = Resolver::with_options(
            &reg,
            ResolverOptions {
                unspecified_suffix: "UNKNOWN".to_string(),
            },
        );
        let Schema::Enum(e) = resolver.resolve_enum("p.Mode").unwrap() else {
            panic!("expected enum");
        };
        assert_eq!(e.name_prefix, "MODE_");
        assert_eq!(e.options[1].name, "FAST");
    }

    // ── well-known types ───────────────────────────────────────

    #[test]
    fn test_well_known_substitution() {
        let reg = registry(
            FileDescriptor::new("p").message(
                MessageDescriptor::new("Stamped")
                    .field(FieldDescriptor::new("at", 1, FieldType::Message("wkt.Timestamp".into())))
                    .field(FieldDescriptor::new("day", 2, FieldType::Message("wkt.Date".into())))
                    .field(FieldDescriptor::new("note", 3, FieldType::Message("wkt.StringValue".into())))
                    .field(FieldDescriptor::new("attrs", 4, FieldType::Message("wkt.Struct".into())))
                    .field(FieldDescriptor::new("extra", 5, FieldType::Message("wkt.Value".into()))),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        let Schema::Object(obj) = resolver.resolve_message("p.Stamped").unwrap() else {
            panic!("expected object");
        };

        let Schema::Scalar(ts) = &obj.properties[0].schema else {
            panic!("expected scalar");
        };
        assert_eq!(ts.well_known, Some(WellKnownType::Timestamp));

        let Schema::Scalar(sv) = &obj.properties[2].schema else {
            panic!("expected scalar");
        };
        assert_eq!(sv.kind, ScalarKind::String);

        assert!(matches!(obj.properties[3].schema, Schema::Map(_)));
        assert!(matches!(obj.properties[4].schema, Schema::Any));
    }

    #[test]
    fn test_reserved_unknown_rejected() {
        let reg = registry(
            FileDescriptor::new("p").message(
                MessageDescriptor::new("Bad")
                    .field(FieldDescriptor::new("d", 1, FieldType::Message("wkt.Duration".into()))),
            ),
        );
        let mut resolver = Resolver::new(&reg);
        let err = resolver.resolve_message("p.Bad").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedWellKnown(_)));
    }
}
