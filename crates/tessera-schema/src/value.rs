//! Dynamic message values.
//!
//! The codec operates on a reflection-style value store rather than
//! generated structs: a [`MessageValue`] maps field numbers to
//! [`Value`]s and carries its type name. Equality is structural, which
//! is the equality the round-trip guarantee is stated in.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

/// A single dynamic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Enum value by number.
    Enum(i32),
    /// Well-known timestamp, always UTC.
    Timestamp(DateTime<Utc>),
    /// Well-known calendar date.
    Date(NaiveDate),
    Message(MessageValue),
    List(Vec<Value>),
    /// String-keyed map.
    Map(BTreeMap<String, Value>),
    /// Free-form JSON payload for `Any`-shaped schemas.
    Json(serde_json::Value),
}

impl Value {
    /// Short variant name, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Json(_) => "json",
        }
    }

    /// Borrows the nested message, if this is a message value.
    #[must_use]
    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<MessageValue> for Value {
    fn from(v: MessageValue) -> Self {
        Value::Message(v)
    }
}

/// A dynamic message instance: type name plus field-number-keyed
/// values. Absent numbers mean absent fields; there are no implicit
/// defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageValue {
    type_name: String,
    fields: BTreeMap<u32, Value>,
}

impl MessageValue {
    /// Creates an empty instance of `type_name`.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// The instance's fully-qualified type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Sets a field.
    pub fn set(&mut self, number: u32, value: impl Into<Value>) {
        self.fields.insert(number, value.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, number: u32, value: impl Into<Value>) -> Self {
        self.set(number, value);
        self
    }

    /// Reads a field.
    #[must_use]
    pub fn get(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number)
    }

    /// Returns `true` if the field is present.
    #[must_use]
    pub fn has(&self, number: u32) -> bool {
        self.fields.contains_key(&number)
    }

    /// Removes a field, returning its previous value.
    pub fn clear(&mut self, number: u32) -> Option<Value> {
        self.fields.remove(&number)
    }

    /// Returns the nested message at `number`, inserting an empty one
    /// of `type_name` when the field is absent. Returns `None` when the
    /// field is present but not message-typed.
    pub fn ensure_message(&mut self, number: u32, type_name: &str) -> Option<&mut MessageValue> {
        let entry = self
            .fields
            .entry(number)
            .or_insert_with(|| Value::Message(MessageValue::new(type_name)));
        match entry {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of set fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Set field numbers in ascending order.
    pub fn field_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }
}
