//! Message and enum descriptors.
//!
//! Descriptors are the raw, language-agnostic input to the
//! [`Resolver`](crate::resolver::Resolver): a tree of files, messages,
//! fields, field groupings, and enums, plus the annotations the resolver
//! recognizes by name (union wrapper, expose, flatten, validation rules).
//!
//! Two construction paths are supported:
//!
//! - programmatic builders (`MessageDescriptor::new("Foo").field(...)`),
//!   used by embedders and throughout the tests
//! - `serde` deserialization from a descriptor-set JSON document, the
//!   conventional interchange format for descriptor sets assembled from
//!   interdependent files
//!
//! Type names in field references are always fully qualified
//! (`acme.v1.Order`), matching the registry's index keys.

use serde::Deserialize;

/// Scalar or named type of a single field.
///
/// `Message` and `Enum` carry the fully-qualified name of the referenced
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum FieldType {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    /// Reference to a message type by fully-qualified name.
    Message(String),
    /// Reference to an enum type by fully-qualified name.
    Enum(String),
}

impl FieldType {
    /// Returns `true` for message-typed fields.
    #[must_use]
    pub fn is_message(&self) -> bool {
        matches!(self, FieldType::Message(_))
    }
}

/// How many values a field holds.
///
/// `Map` fields are string-keyed; the field's [`FieldType`] describes the
/// map value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    #[default]
    Singular,
    Repeated,
    Map,
}

/// Validation constraints attached to a field.
///
/// Numeric bounds apply to numeric scalars, length bounds and
/// pattern/format to strings, and `in`/`not_in` (mutually exclusive) to
/// enum fields. The resolver translates these into
/// [`ValidationRules`](crate::rules::ValidationRules); it does not
/// enforce them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exclusive_min: bool,
    pub exclusive_max: bool,
    pub min_len: Option<u64>,
    pub max_len: Option<u64>,
    pub pattern: Option<String>,
    /// Named string format: `uuid`, `email`, `hostname`, `ipv4`, `ipv6`,
    /// `uri`.
    pub format: Option<String>,
    /// Enum numbers to keep. Empty means "keep all".
    #[serde(rename = "in")]
    pub r#in: Vec<i32>,
    /// Enum numbers to drop.
    pub not_in: Vec<i32>,
}

impl FieldRules {
    /// Returns `true` if no constraint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &FieldRules::default()
    }
}

/// Annotations on a single field.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldOptions {
    /// Splice the referenced message's properties into the parent.
    /// Only valid on singular message-typed fields.
    pub flatten: bool,
    /// The property must be present when encoding.
    pub required: bool,
    pub read_only: bool,
    pub write_only: bool,
    /// Validation constraints, if any.
    pub rules: Option<FieldRules>,
}

/// A single field declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Declared (snake_case) field name.
    pub name: String,
    /// Field number; unique within the message.
    pub number: u32,
    /// Scalar kind or referenced type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Explicit JSON property name. Derived from `name` when absent.
    #[serde(default)]
    pub json_name: Option<String>,
    /// Index into the parent message's `groups`, for fields that belong
    /// to a field grouping.
    #[serde(default)]
    pub group_index: Option<usize>,
    /// Declared with explicit presence tracking.
    #[serde(default)]
    pub explicitly_optional: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: FieldOptions,
}

impl FieldDescriptor {
    /// Creates a new field.
    #[must_use]
    pub fn new(name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            field_type,
            cardinality: Cardinality::Singular,
            json_name: None,
            group_index: None,
            explicitly_optional: false,
            description: None,
            options: FieldOptions::default(),
        }
    }

    /// Marks the field repeated.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    /// Marks the field as a string-keyed map of the declared type.
    #[must_use]
    pub fn map(mut self) -> Self {
        self.cardinality = Cardinality::Map;
        self
    }

    /// Sets an explicit JSON property name.
    #[must_use]
    pub fn with_json_name(mut self, name: impl Into<String>) -> Self {
        self.json_name = Some(name.into());
        self
    }

    /// Places the field in the parent's grouping at `index`.
    #[must_use]
    pub fn in_group(mut self, index: usize) -> Self {
        self.group_index = Some(index);
        self
    }

    /// Marks the field explicitly optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.explicitly_optional = true;
        self
    }

    /// Marks the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    /// Flattens the referenced message into the parent.
    #[must_use]
    pub fn flattened(mut self) -> Self {
        self.options.flatten = true;
        self
    }

    /// Attaches validation rules.
    #[must_use]
    pub fn with_rules(mut self, rules: FieldRules) -> Self {
        self.options.rules = Some(rules);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// The effective JSON property name (explicit or derived).
    #[must_use]
    pub fn effective_json_name(&self) -> String {
        self.json_name
            .clone()
            .unwrap_or_else(|| derive_json_name(&self.name))
    }
}

/// Annotations on a field grouping.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupOptions {
    /// `Some(true)` exposes the grouping as a tagged-union property;
    /// `Some(false)` suppresses it explicitly. `None` leaves the choice
    /// to the resolver's defaults (and keeps the union-wrapper heuristic
    /// applicable).
    pub expose: Option<bool>,
}

/// A named field grouping: a set of mutually-exclusive alternative
/// fields within a message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: GroupOptions,
}

impl GroupDescriptor {
    /// Creates a new grouping.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            options: GroupOptions::default(),
        }
    }

    /// Exposes the grouping as a tagged-union property.
    #[must_use]
    pub fn exposed(mut self) -> Self {
        self.options.expose = Some(true);
        self
    }

    /// Explicitly suppresses exposure (overrides the wrapper heuristic).
    #[must_use]
    pub fn suppressed(mut self) -> Self {
        self.options.expose = Some(false);
        self
    }
}

/// Annotations on a message.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageOptions {
    /// Explicit union-wrapper marker. `Some(_)` overrides the heuristic
    /// in either direction.
    pub union: Option<bool>,
}

/// A message declaration, possibly with nested types.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDescriptor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub groups: Vec<GroupDescriptor>,
    /// Nested message declarations.
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
    /// Nested enum declarations.
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: MessageOptions,
}

impl MessageDescriptor {
    /// Creates a new message.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            groups: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            description: None,
            options: MessageOptions::default(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a grouping.
    #[must_use]
    pub fn group(mut self, group: GroupDescriptor) -> Self {
        self.groups.push(group);
        self
    }

    /// Appends a nested message.
    #[must_use]
    pub fn nested_message(mut self, message: MessageDescriptor) -> Self {
        self.messages.push(message);
        self
    }

    /// Appends a nested enum.
    #[must_use]
    pub fn nested_enum(mut self, e: EnumDescriptor) -> Self {
        self.enums.push(e);
        self
    }

    /// Marks the message as a union wrapper (or explicitly not one).
    #[must_use]
    pub fn union_wrapper(mut self, value: bool) -> Self {
        self.options.union = Some(value);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Fields belonging to the grouping at `index`, in declaration order.
    pub fn group_members(&self, index: usize) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(move |f| f.group_index == Some(index))
    }
}

/// A single enum value declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
    #[serde(default)]
    pub description: Option<String>,
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDescriptor {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValueDescriptor>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EnumDescriptor {
    /// Creates a new enum.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            description: None,
        }
    }

    /// Appends a value.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValueDescriptor {
            name: name.into(),
            number,
            description: None,
        });
        self
    }
}

/// One file's worth of declarations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Package prefix for every top-level type in the file. May be empty.
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
}

impl FileDescriptor {
    /// Creates a file descriptor for `package`.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            messages: Vec::new(),
            enums: Vec::new(),
        }
    }

    /// Appends a top-level message.
    #[must_use]
    pub fn message(mut self, message: MessageDescriptor) -> Self {
        self.messages.push(message);
        self
    }

    /// Appends a top-level enum.
    #[must_use]
    pub fn enum_type(mut self, e: EnumDescriptor) -> Self {
        self.enums.push(e);
        self
    }
}

/// A complete descriptor set: every file needed to resolve all
/// cross-references.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSet {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

impl DescriptorSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a file.
    #[must_use]
    pub fn file(mut self, file: FileDescriptor) -> Self {
        self.files.push(file);
        self
    }

    /// Parses a descriptor-set JSON document.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if the document does
    /// not match the descriptor-set shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Derives the JSON property name from a snake_case declared name:
/// underscores are removed and the following letter is upper-cased.
#[must_use]
pub fn derive_json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
