//! Schema-driven JSON encoding.
//!
//! Walks the collected property list of an instance and emits a JSON
//! document in declared property order. Union envelopes, enum name
//! spelling, and the union wrap/inline convention follow the
//! [`CodecConfig`]; well-known scalar overrides come from the
//! scalar/WKT table. Absent optional properties are omitted; absent
//! required properties, multiply-populated unions, and unknown enum
//! numbers are errors, never silently patched over.

use serde_json::Map;
use tracing::trace;

use tessera_schema::{
    EnumSchema, MessageValue, ObjectSchema, Property, Schema, UnionSchema, Value,
};

use crate::collect::{collect, CollectedEntry, CollectedProperty};
use crate::config::{CodecConfig, UnionStyle, UNION_TYPE_KEY};
use crate::error::{join_index, join_key, CodecError, CodecResult};
use crate::wkt;

/// Encodes message values into JSON bytes.
#[derive(Debug, Default)]
pub struct JsonEncoder {
    config: CodecConfig,
}

impl JsonEncoder {
    /// Creates an encoder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an encoder with an explicit configuration.
    #[must_use]
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Borrows the configuration.
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encodes `instance` against `schema` into JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on any instance/schema mismatch; nothing
    /// is dropped or coerced.
    pub fn encode(&self, schema: &Schema, instance: &MessageValue) -> CodecResult<Vec<u8>> {
        trace!(type_name = instance.type_name(), "encoding message");
        let doc = self.root_document(schema, instance)?;
        Ok(serde_json::to_vec(&doc)?)
    }

    /// Encodes `instance` against `schema` into a JSON string.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode).
    pub fn encode_to_string(
        &self,
        schema: &Schema,
        instance: &MessageValue,
    ) -> CodecResult<String> {
        let doc = self.root_document(schema, instance)?;
        Ok(serde_json::to_string(&doc)?)
    }

    fn root_document(
        &self,
        schema: &Schema,
        instance: &MessageValue,
    ) -> CodecResult<serde_json::Value> {
        match schema {
            Schema::Object(obj) => self.object_to_json(obj, instance, ""),
            Schema::Union(u) => Ok(self
                .union_to_json(u, instance, "")?
                .unwrap_or_else(|| serde_json::Value::Object(Map::new()))),
            Schema::Ref(r) => self.root_document(&*r.resolve()?, instance),
            other => Err(CodecError::InvalidValue {
                path: String::new(),
                message: format!("cannot encode a document from a {} schema", other.kind_name()),
            }),
        }
    }

    fn object_to_json(
        &self,
        object: &ObjectSchema,
        instance: &MessageValue,
        path: &str,
    ) -> CodecResult<serde_json::Value> {
        let collected = collect(&object.properties, instance, path)?;

        let mut map = Map::with_capacity(collected.len());
        for entry in &collected {
            match &entry.entry {
                CollectedEntry::Value(value) => {
                    let child = join_key(path, &entry.property.json_name);
                    if let Some(encoded) =
                        self.encode_value(&entry.property.schema, value, &child)?
                    {
                        map.insert(entry.property.json_name.clone(), encoded);
                    }
                }
                CollectedEntry::Group(children) => {
                    self.emit_group(&mut map, entry.property, children, path)?;
                }
            }
        }

        // Required properties may not be dropped silently.
        for property in &object.properties {
            if property.required && !map.contains_key(&property.json_name) {
                return Err(CodecError::MissingRequired {
                    path: join_key(path, &property.json_name),
                });
            }
        }

        Ok(serde_json::Value::Object(map))
    }

    /// Emits one populated synthetic grouping into the parent map,
    /// either as a wrapped envelope or spliced inline.
    fn emit_group(
        &self,
        map: &mut Map<String, serde_json::Value>,
        property: &Property,
        children: &[CollectedProperty<'_>],
        path: &str,
    ) -> CodecResult<()> {
        let union_name = match &property.schema {
            Schema::Union(u) => u.full_name.as_str(),
            _ => property.json_name.as_str(),
        };
        if children.len() > 1 {
            return Err(CodecError::UnionConflict {
                path: join_key(path, &property.json_name),
                union_name: union_name.to_string(),
            });
        }
        let child = &children[0];
        let CollectedEntry::Value(value) = &child.entry else {
            return Err(CodecError::InvalidValue {
                path: join_key(path, &property.json_name),
                message: "nested grouping inside a union".to_string(),
            });
        };

        let member_path = join_key(path, &child.property.json_name);
        let Some(encoded) = self.encode_value(&child.property.schema, value, &member_path)? else {
            return Ok(());
        };

        match self.config.union_style {
            UnionStyle::Wrapped => {
                let mut envelope = Map::with_capacity(2);
                envelope.insert(
                    UNION_TYPE_KEY.to_string(),
                    serde_json::Value::String(child.property.json_name.clone()),
                );
                envelope.insert(child.property.json_name.clone(), encoded);
                map.insert(
                    property.json_name.clone(),
                    serde_json::Value::Object(envelope),
                );
            }
            UnionStyle::Inline => {
                map.insert(child.property.json_name.clone(), encoded);
            }
        }
        Ok(())
    }

    /// Encodes a wrapper-union message value. Returns `None` when no
    /// member is populated, so the parent omits the property entirely.
    fn union_to_json(
        &self,
        union: &UnionSchema,
        instance: &MessageValue,
        path: &str,
    ) -> CodecResult<Option<serde_json::Value>> {
        let collected = collect(&union.properties, instance, path)?;
        if collected.is_empty() {
            return Ok(None);
        }
        if collected.len() > 1 {
            return Err(CodecError::UnionConflict {
                path: path.to_string(),
                union_name: union.full_name.clone(),
            });
        }

        let member = &collected[0];
        let CollectedEntry::Value(value) = &member.entry else {
            return Err(CodecError::InvalidValue {
                path: path.to_string(),
                message: "nested grouping inside a union".to_string(),
            });
        };
        let member_path = join_key(path, &member.property.json_name);
        let Some(encoded) = self.encode_value(&member.property.schema, value, &member_path)? else {
            return Ok(None);
        };

        let mut map = Map::with_capacity(2);
        if self.config.union_style == UnionStyle::Wrapped {
            map.insert(
                UNION_TYPE_KEY.to_string(),
                serde_json::Value::String(member.property.json_name.clone()),
            );
        }
        map.insert(member.property.json_name.clone(), encoded);
        Ok(Some(serde_json::Value::Object(map)))
    }

    /// Encodes a single value. `None` means "omit the property".
    fn encode_value(
        &self,
        schema: &Schema,
        value: &Value,
        path: &str,
    ) -> CodecResult<Option<serde_json::Value>> {
        match schema {
            Schema::Scalar(s) => wkt::marshal_scalar(s, value, path).map(Some),
            Schema::Enum(e) => self.enum_token(e, value, path).map(Some),
            Schema::Object(o) => {
                let message = expect_message(value, path)?;
                self.object_to_json(o, message, path).map(Some)
            }
            Schema::Union(u) => {
                let message = expect_message(value, path)?;
                self.union_to_json(u, message, path)
            }
            Schema::Array(element) => {
                let Value::List(items) = value else {
                    return Err(CodecError::InvalidValue {
                        path: path.to_string(),
                        message: format!("expected list value, instance holds {}", value.kind_name()),
                    });
                };
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let encoded = self
                        .encode_value(element, item, &join_index(path, i))?
                        .unwrap_or_else(|| serde_json::Value::Object(Map::new()));
                    out.push(encoded);
                }
                Ok(Some(serde_json::Value::Array(out)))
            }
            Schema::Map(value_schema) => {
                let Value::Map(entries) = value else {
                    return Err(CodecError::InvalidValue {
                        path: path.to_string(),
                        message: format!("expected map value, instance holds {}", value.kind_name()),
                    });
                };
                let mut out = Map::with_capacity(entries.len());
                for (key, entry) in entries {
                    let encoded = self
                        .encode_value(value_schema, entry, &join_key(path, key))?
                        .unwrap_or_else(|| serde_json::Value::Object(Map::new()));
                    out.insert(key.clone(), encoded);
                }
                Ok(Some(serde_json::Value::Object(out)))
            }
            Schema::Ref(r) => self.encode_value(&*r.resolve()?, value, path),
            Schema::Any => {
                let Value::Json(json) = value else {
                    return Err(CodecError::InvalidValue {
                        path: path.to_string(),
                        message: format!("expected json value, instance holds {}", value.kind_name()),
                    });
                };
                Ok(Some(json.clone()))
            }
        }
    }

    /// Spells an enum value per the configured convention. Unknown
    /// numbers are an error, never emitted numerically.
    fn enum_token(
        &self,
        schema: &EnumSchema,
        value: &Value,
        path: &str,
    ) -> CodecResult<serde_json::Value> {
        let Value::Enum(number) = value else {
            return Err(CodecError::InvalidValue {
                path: path.to_string(),
                message: format!("expected enum value, instance holds {}", value.kind_name()),
            });
        };
        let option =
            schema
                .option_by_number(*number)
                .ok_or_else(|| CodecError::UnknownEnumNumber {
                    path: path.to_string(),
                    enum_name: schema.full_name.clone(),
                    number: *number,
                })?;

        let short = if option.name.is_empty() {
            self.config.unspecified_suffix.as_str()
        } else {
            option.name.as_str()
        };
        let spelled = if self.config.short_enums {
            short.to_string()
        } else {
            format!("{}{}", schema.name_prefix, short)
        };
        Ok(serde_json::Value::String(spelled))
    }
}

fn expect_message<'a>(value: &'a Value, path: &str) -> CodecResult<&'a MessageValue> {
    value.as_message().ok_or_else(|| CodecError::InvalidValue {
        path: path.to_string(),
        message: format!("expected message value, instance holds {}", value.kind_name()),
    })
}
