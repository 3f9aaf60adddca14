//! Descriptor model, schema resolution, and dynamic values.
//!
//! This crate turns raw message/enum descriptors into the normalized,
//! immutable schema graph the tessera JSON codec operates on:
//!
//! - **Descriptors** ([`descriptor`]) — the language-agnostic input
//!   tree: files, messages, fields, field groupings, enums, and the
//!   annotations recognized by name (union wrapper, expose, flatten,
//!   validation rules)
//! - **Registry** ([`registry`]) — fully-qualified-name index over a
//!   descriptor set, including nested types
//! - **Model** ([`model`]) — the resolved [`Schema`] graph: scalars,
//!   enums, objects, unions, arrays, maps, lazily-linked references,
//!   and free-form values
//! - **Resolver** ([`resolver`]) — memoized descriptor-to-schema
//!   construction with an explicit per-run cache, the union-wrapper
//!   heuristic, grouping exposure, flattening, and the linking pass
//! - **Well-known types** ([`wkt`]) — the reserved-namespace table of
//!   types with bespoke JSON encodings
//! - **Values** ([`value`]) — the dynamic, reflection-style message
//!   representation the codec reads and writes
//!
//! Everything here is synchronous and allocation-bounded; resolution
//! happens once per type per cache, and the graph is immutable
//! afterwards.

pub mod descriptor;
pub mod error;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod rules;
pub mod value;
pub mod wkt;

// ── Re-exports for convenience ─────────────────────────────────────

pub use descriptor::{
    derive_json_name, Cardinality, DescriptorSet, EnumDescriptor, EnumValueDescriptor,
    FieldDescriptor, FieldOptions, FieldRules, FieldType, FileDescriptor, GroupDescriptor,
    GroupOptions, MessageDescriptor, MessageOptions,
};
pub use error::{SchemaError, SchemaResult};
pub use model::{
    EnumOption, EnumSchema, ObjectSchema, PathSegment, Property, ScalarKind, ScalarSchema, Schema,
    TypeRef, UnionSchema,
};
pub use registry::TypeRegistry;
pub use resolver::{is_union_wrapper, Resolver, ResolverOptions, SchemaCache};
pub use rules::{StringFormat, ValidationRules};
pub use value::{MessageValue, Value};
pub use wkt::{WellKnownType, RESERVED_NAMESPACE};
