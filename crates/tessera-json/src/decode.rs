//! Schema-driven JSON decoding.
//!
//! Parses the payload once and makes a single forward pass over the
//! document, mutating a [`MessageValue`] as properties are recognized.
//! The decoder mirrors the encoder's conventions in reverse and never
//! guesses:
//!
//! - unknown object keys are errors, with no unknown-field tolerance
//! - union envelopes must contain exactly the `!type` discriminator
//!   and the named payload; the bare inlined form is accepted only
//!   under [`UnionStyle::Inline`] or the explicit leniency flag, and a
//!   document populating one grouping both ways (or populating two
//!   members) is rejected rather than merged
//! - enum tokens resolve by short name always, by full prefixed name
//!   only in lenient mode, and never default to zero
//! - integers are read from the full-width numeric token with
//!   per-width range checks; fractional tokens are rejected
//! - `null` property values are treated as absent
//!
//! On error the target instance may be partially written; callers are
//! expected to discard it.

use std::collections::HashMap;

use tracing::trace;

use tessera_schema::{
    EnumSchema, MessageValue, ObjectSchema, PathSegment, Property, Schema, UnionSchema, Value,
};

use crate::config::{CodecConfig, EnumDecodeMode, UnionStyle, UNION_TYPE_KEY};
use crate::error::{join_index, join_key, CodecError, CodecResult};
use crate::wkt;

/// Decodes JSON bytes into message values.
#[derive(Debug, Default)]
pub struct JsonDecoder {
    config: CodecConfig,
}

impl JsonDecoder {
    /// Creates a decoder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder with an explicit configuration.
    #[must_use]
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Borrows the configuration.
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodes `payload` against `schema` into a fresh instance.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on malformed JSON or any schema
    /// violation; nothing is coerced or defaulted.
    pub fn decode(&self, schema: &Schema, payload: &[u8]) -> CodecResult<MessageValue> {
        let mut instance = MessageValue::new(schema.full_name().unwrap_or_default());
        self.decode_into(schema, payload, &mut instance)?;
        Ok(instance)
    }

    /// Decodes `payload` against `schema` into an existing instance.
    ///
    /// # Errors
    ///
    /// See [`decode`](Self::decode).
    pub fn decode_into(
        &self,
        schema: &Schema,
        payload: &[u8],
        instance: &mut MessageValue,
    ) -> CodecResult<()> {
        trace!(bytes = payload.len(), "decoding message");
        let doc: serde_json::Value = serde_json::from_slice(payload)?;
        self.decode_document(schema, &doc, instance, "")
    }

    fn decode_document(
        &self,
        schema: &Schema,
        doc: &serde_json::Value,
        instance: &mut MessageValue,
        path: &str,
    ) -> CodecResult<()> {
        match schema {
            Schema::Object(object) => {
                let map = doc.as_object().ok_or_else(|| CodecError::UnexpectedToken {
                    path: path.to_string(),
                    expected: "object".to_string(),
                    found: wkt::token_name(doc).to_string(),
                })?;
                self.decode_object(object, map, instance, path)
            }
            Schema::Union(union) => {
                *instance = self.decode_union_value(union, doc, path)?;
                Ok(())
            }
            Schema::Ref(r) => self.decode_document(&*r.resolve()?, doc, instance, path),
            other => Err(CodecError::InvalidValue {
                path: path.to_string(),
                message: format!("cannot decode a document into a {} schema", other.kind_name()),
            }),
        }
    }

    fn decode_object(
        &self,
        object: &ObjectSchema,
        map: &serde_json::Map<String, serde_json::Value>,
        instance: &mut MessageValue,
        path: &str,
    ) -> CodecResult<()> {
        // Per-grouping population count: the envelope and the inline
        // form must never both contribute to the same grouping.
        let mut group_hits: HashMap<String, (u32, String)> = HashMap::new();

        for (key, token) in map {
            if token.is_null() {
                continue;
            }

            if let Some(property) = object.property(key) {
                if property.is_group() {
                    let Schema::Union(union) = &property.schema else {
                        return Err(CodecError::InvalidValue {
                            path: join_key(path, key),
                            message: "grouping property is not a union".to_string(),
                        });
                    };
                    if self.config.union_style != UnionStyle::Wrapped {
                        return Err(CodecError::UnknownField {
                            path: path.to_string(),
                            name: key.clone(),
                        });
                    }
                    self.decode_union_envelope(union, token, instance, &join_key(path, key))?;
                    let hit = group_hits
                        .entry(property.json_name.clone())
                        .or_insert((0, union.full_name.clone()));
                    hit.0 += 1;
                } else {
                    let child = join_key(path, key);
                    let value = self.decode_value(&property.schema, token, &child)?;
                    set_path(instance, &property.field_path, value, &child)?;
                }
                continue;
            }

            // Bare union members at the parent level.
            let inline_allowed = self.config.union_style == UnionStyle::Inline
                || self.config.accept_inline_unions;
            if inline_allowed {
                if let Some((group, member)) = find_inline_member(object, key) {
                    let child = join_key(path, key);
                    let value = self.decode_value(&member.schema, token, &child)?;
                    set_path(instance, &member.field_path, value, &child)?;
                    let union_name = match &group.schema {
                        Schema::Union(u) => u.full_name.clone(),
                        _ => group.json_name.clone(),
                    };
                    let hit = group_hits
                        .entry(group.json_name.clone())
                        .or_insert((0, union_name));
                    hit.0 += 1;
                    continue;
                }
            }

            return Err(CodecError::UnknownField {
                path: path.to_string(),
                name: key.clone(),
            });
        }

        for (json_name, (hits, union_name)) in group_hits {
            if hits > 1 {
                return Err(CodecError::UnionConflict {
                    path: join_key(path, &json_name),
                    union_name,
                });
            }
        }
        Ok(())
    }

    /// Decodes the wrapped `{"!type": ..., "<name>": ...}` envelope,
    /// writing the member through its field path into `instance`.
    fn decode_union_envelope(
        &self,
        union: &UnionSchema,
        token: &serde_json::Value,
        instance: &mut MessageValue,
        path: &str,
    ) -> CodecResult<()> {
        let envelope = token.as_object().ok_or_else(|| CodecError::UnexpectedToken {
            path: path.to_string(),
            expected: "union envelope object".to_string(),
            found: wkt::token_name(token).to_string(),
        })?;

        let member_name = envelope
            .get(UNION_TYPE_KEY)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| CodecError::UnexpectedToken {
                path: path.to_string(),
                expected: format!("'{UNION_TYPE_KEY}' discriminator string"),
                found: "object without discriminator".to_string(),
            })?;

        let member = union
            .property(member_name)
            .ok_or_else(|| CodecError::UnknownField {
                path: path.to_string(),
                name: member_name.to_string(),
            })?;

        // Exactly the discriminator and the named payload; a second
        // member key lands here as an unknown field.
        for key in envelope.keys() {
            if key != UNION_TYPE_KEY && key != member_name {
                return Err(CodecError::UnknownField {
                    path: path.to_string(),
                    name: key.clone(),
                });
            }
        }

        let payload = envelope
            .get(member_name)
            .ok_or_else(|| CodecError::InvalidValue {
                path: path.to_string(),
                message: format!("union envelope is missing payload '{member_name}'"),
            })?;

        let child = join_key(path, member_name);
        let value = self.decode_value(&member.schema, payload, &child)?;
        set_path(instance, &member.field_path, value, &child)
    }

    /// Decodes a wrapper-union message value from either the envelope
    /// or (when permitted) the bare single-member form.
    fn decode_union_value(
        &self,
        union: &UnionSchema,
        token: &serde_json::Value,
        path: &str,
    ) -> CodecResult<MessageValue> {
        let map = token.as_object().ok_or_else(|| CodecError::UnexpectedToken {
            path: path.to_string(),
            expected: "union object".to_string(),
            found: wkt::token_name(token).to_string(),
        })?;

        let mut instance = MessageValue::new(&union.full_name);
        match self.config.union_style {
            UnionStyle::Wrapped => {
                if map.contains_key(UNION_TYPE_KEY) {
                    self.decode_union_envelope(union, token, &mut instance, path)?;
                } else if map.is_empty() {
                    // No member populated.
                } else if self.config.accept_inline_unions {
                    self.decode_union_bare(union, map, &mut instance, path)?;
                } else {
                    return Err(CodecError::UnexpectedToken {
                        path: path.to_string(),
                        expected: format!("union envelope with '{UNION_TYPE_KEY}'"),
                        found: "bare object".to_string(),
                    });
                }
            }
            UnionStyle::Inline => {
                if map.contains_key(UNION_TYPE_KEY) {
                    return Err(CodecError::UnknownField {
                        path: path.to_string(),
                        name: UNION_TYPE_KEY.to_string(),
                    });
                }
                self.decode_union_bare(union, map, &mut instance, path)?;
            }
        }
        Ok(instance)
    }

    /// Decodes the bare form: member keys written directly, at most one
    /// populated.
    fn decode_union_bare(
        &self,
        union: &UnionSchema,
        map: &serde_json::Map<String, serde_json::Value>,
        instance: &mut MessageValue,
        path: &str,
    ) -> CodecResult<()> {
        let mut populated = 0u32;
        for (key, token) in map {
            if token.is_null() {
                continue;
            }
            let member = union
                .property(key)
                .ok_or_else(|| CodecError::UnknownField {
                    path: path.to_string(),
                    name: key.clone(),
                })?;
            populated += 1;
            if populated > 1 {
                return Err(CodecError::UnionConflict {
                    path: path.to_string(),
                    union_name: union.full_name.clone(),
                });
            }
            let child = join_key(path, key);
            let value = self.decode_value(&member.schema, token, &child)?;
            set_path(instance, &member.field_path, value, &child)?;
        }
        Ok(())
    }

    fn decode_value(
        &self,
        schema: &Schema,
        token: &serde_json::Value,
        path: &str,
    ) -> CodecResult<Value> {
        match schema {
            Schema::Scalar(s) => wkt::unmarshal_scalar(s, token, path),
            Schema::Enum(e) => {
                let text = token.as_str().ok_or_else(|| CodecError::UnexpectedToken {
                    path: path.to_string(),
                    expected: "enum string".to_string(),
                    found: wkt::token_name(token).to_string(),
                })?;
                self.resolve_enum_token(e, text, path).map(Value::Enum)
            }
            Schema::Object(object) => {
                let map = token.as_object().ok_or_else(|| CodecError::UnexpectedToken {
                    path: path.to_string(),
                    expected: "object".to_string(),
                    found: wkt::token_name(token).to_string(),
                })?;
                let mut nested = MessageValue::new(&object.full_name);
                self.decode_object(object, map, &mut nested, path)?;
                Ok(Value::Message(nested))
            }
            Schema::Union(union) => self
                .decode_union_value(union, token, path)
                .map(Value::Message),
            Schema::Array(element) => {
                let items = token.as_array().ok_or_else(|| CodecError::UnexpectedToken {
                    path: path.to_string(),
                    expected: "array".to_string(),
                    found: wkt::token_name(token).to_string(),
                })?;
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.decode_value(element, item, &join_index(path, i))?);
                }
                Ok(Value::List(out))
            }
            Schema::Map(value_schema) => {
                let entries = token.as_object().ok_or_else(|| CodecError::UnexpectedToken {
                    path: path.to_string(),
                    expected: "map object".to_string(),
                    found: wkt::token_name(token).to_string(),
                })?;
                let mut out = std::collections::BTreeMap::new();
                for (key, entry) in entries {
                    let value = self.decode_value(value_schema, entry, &join_key(path, key))?;
                    out.insert(key.clone(), value);
                }
                Ok(Value::Map(out))
            }
            Schema::Ref(r) => self.decode_value(&*r.resolve()?, token, path),
            Schema::Any => Ok(Value::Json(token.clone())),
        }
    }

    /// Resolves an enum token to its number. The short (stored) name is
    /// accepted always; the full prefixed name only in lenient mode.
    fn resolve_enum_token(&self, schema: &EnumSchema, text: &str, path: &str) -> CodecResult<i32> {
        let suffix = self.config.unspecified_suffix.as_str();

        let short_match = |candidate: &str| {
            schema.options.iter().find(|o| {
                let short = if o.name.is_empty() { suffix } else { o.name.as_str() };
                short == candidate
            })
        };

        if let Some(option) = short_match(text) {
            return Ok(option.number);
        }
        if self.config.enum_decode == EnumDecodeMode::Lenient {
            if let Some(stripped) = text.strip_prefix(schema.name_prefix.as_str()) {
                if let Some(option) = short_match(stripped) {
                    return Ok(option.number);
                }
            }
        }
        Err(CodecError::UnknownEnumName {
            path: path.to_string(),
            name: text.to_string(),
            enum_name: schema.full_name.clone(),
        })
    }
}

/// Writes a value through a property's field path, materializing
/// flattened intermediates with their recorded message types.
fn set_path(
    instance: &mut MessageValue,
    segments: &[PathSegment],
    value: Value,
    path: &str,
) -> CodecResult<()> {
    let Some((last, through)) = segments.split_last() else {
        return Err(CodecError::InvalidValue {
            path: path.to_string(),
            message: "property has no field path".to_string(),
        });
    };

    let mut current = instance;
    for segment in through {
        let type_name = segment.message_type.as_deref().unwrap_or_default();
        current = current
            .ensure_message(segment.number, type_name)
            .ok_or_else(|| CodecError::InvalidValue {
                path: path.to_string(),
                message: format!("intermediate field {} is not a message", segment.number),
            })?;
    }
    current.set(last.number, value);
    Ok(())
}

/// Finds the grouping property owning `key` as a member, for the bare
/// inlined union form.
fn find_inline_member<'s>(
    object: &'s ObjectSchema,
    key: &str,
) -> Option<(&'s Property, &'s Property)> {
    for property in &object.properties {
        if property.is_group() {
            if let Schema::Union(union) = &property.schema {
                if let Some(member) = union.property(key) {
                    return Some((property, member));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_schema::{EnumOption, ScalarKind, ScalarSchema};

    fn scalar_property(json_name: &str, number: u32, kind: ScalarKind) -> Property {
        Property {
            json_name: json_name.into(),
            schema: Schema::Scalar(ScalarSchema::plain(kind)),
            field_path: vec![PathSegment::leaf(number)],
            required: false,
            explicitly_optional: false,
            read_only: false,
            write_only: false,
            description: None,
        }
    }

    fn holder_with_group() -> Schema {
        // { "lead": string(1), "choice": union{ "oneofString": string(5),
        //   "oneofInt": int32(6) } }
        let union = UnionSchema {
            full_name: "p.Holder.choice".into(),
            properties: vec![
                scalar_property("oneofString", 5, ScalarKind::String),
                scalar_property("oneofInt", 6, ScalarKind::Int32),
            ],
        };
        Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.Holder".into(),
            properties: vec![
                scalar_property("lead", 1, ScalarKind::String),
                Property {
                    json_name: "choice".into(),
                    schema: Schema::Union(Arc::new(union)),
                    field_path: vec![],
                    required: false,
                    explicitly_optional: false,
                    read_only: false,
                    write_only: false,
                    description: None,
                },
            ],
        }))
    }

    #[test]
    fn test_decode_basic_object() {
        let schema = Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.M".into(),
            properties: vec![
                scalar_property("name", 1, ScalarKind::String),
                scalar_property("count", 2, ScalarKind::Int64),
            ],
        }));
        let decoded = JsonDecoder::new()
            .decode(&schema, br#"{"name":"x","count":7}"#)
            .unwrap();
        assert_eq!(decoded.type_name(), "p.M");
        assert_eq!(decoded.get(1), Some(&Value::String("x".into())));
        assert_eq!(decoded.get(2), Some(&Value::I64(7)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let schema = Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.M".into(),
            properties: vec![scalar_property("name", 1, ScalarKind::String)],
        }));
        let err = JsonDecoder::new()
            .decode(&schema, br#"{"name":"x","bogus":1}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { ref name, .. } if name == "bogus"));
    }

    #[test]
    fn test_null_treated_as_absent() {
        let schema = Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.M".into(),
            properties: vec![scalar_property("name", 1, ScalarKind::String)],
        }));
        let decoded = JsonDecoder::new().decode(&schema, br#"{"name":null}"#).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_wrapped_envelope_decodes() {
        let schema = holder_with_group();
        let decoded = JsonDecoder::new()
            .decode(
                &schema,
                br#"{"choice":{"!type":"oneofString","oneofString":"x"}}"#,
            )
            .unwrap();
        assert_eq!(decoded.get(5), Some(&Value::String("x".into())));
    }

    #[test]
    fn test_envelope_extra_key_rejected() {
        let schema = holder_with_group();
        let err = JsonDecoder::new()
            .decode(
                &schema,
                br#"{"choice":{"!type":"oneofString","oneofString":"x","oneofInt":1}}"#,
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { ref name, .. } if name == "oneofInt"));
    }

    #[test]
    fn test_envelope_unknown_member_rejected() {
        let schema = holder_with_group();
        let err = JsonDecoder::new()
            .decode(&schema, br#"{"choice":{"!type":"mystery","mystery":1}}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { ref name, .. } if name == "mystery"));
    }

    #[test]
    fn test_bare_member_rejected_without_leniency() {
        let schema = holder_with_group();
        let err = JsonDecoder::new()
            .decode(&schema, br#"{"oneofString":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { ref name, .. } if name == "oneofString"));
    }

    #[test]
    fn test_bare_member_accepted_with_leniency() {
        let schema = holder_with_group();
        let decoder = JsonDecoder::with_config(CodecConfig::new().with_inline_leniency());
        let decoded = decoder.decode(&schema, br#"{"oneofString":"x"}"#).unwrap();
        assert_eq!(decoded.get(5), Some(&Value::String("x".into())));
    }

    #[test]
    fn test_envelope_and_inline_never_merge() {
        let schema = holder_with_group();
        let decoder = JsonDecoder::with_config(CodecConfig::new().with_inline_leniency());
        let err = decoder
            .decode(
                &schema,
                br#"{"choice":{"!type":"oneofString","oneofString":"x"},"oneofInt":1}"#,
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::UnionConflict { .. }));
    }

    #[test]
    fn test_two_inline_members_rejected() {
        let schema = holder_with_group();
        let decoder = JsonDecoder::with_config(
            CodecConfig::new().with_union_style(UnionStyle::Inline),
        );
        let err = decoder
            .decode(&schema, br#"{"oneofString":"x","oneofInt":1}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnionConflict { .. }));
    }

    #[test]
    fn test_inline_style_rejects_envelope() {
        let schema = holder_with_group();
        let decoder = JsonDecoder::with_config(
            CodecConfig::new().with_union_style(UnionStyle::Inline),
        );
        let err = decoder
            .decode(
                &schema,
                br#"{"choice":{"!type":"oneofString","oneofString":"x"}}"#,
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { ref name, .. } if name == "choice"));
    }

    // ── enums ──────────────────────────────────────────────────

    fn enum_schema() -> Schema {
        Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.M".into(),
            properties: vec![Property {
                json_name: "color".into(),
                schema: Schema::Enum(Arc::new(EnumSchema {
                    full_name: "p.Color".into(),
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
                })),
                field_path: vec![PathSegment::leaf(1)],
                required: false,
                explicitly_optional: false,
                read_only: false,
                write_only: false,
                description: None,
            }],
        }))
    }

    #[test]
    fn test_enum_short_name() {
        let decoded = JsonDecoder::new()
            .decode(&enum_schema(), br#"{"color":"RED"}"#)
            .unwrap();
        assert_eq!(decoded.get(1), Some(&Value::Enum(1)));
    }

    #[test]
    fn test_enum_full_name_lenient() {
        let decoded = JsonDecoder::new()
            .decode(&enum_schema(), br#"{"color":"COLOR_RED"}"#)
            .unwrap();
        assert_eq!(decoded.get(1), Some(&Value::Enum(1)));
    }

    #[test]
    fn test_enum_full_name_strict_rejected() {
        let decoder =
            JsonDecoder::with_config(CodecConfig::new().with_enum_decode(EnumDecodeMode::Strict));
        let err = decoder
            .decode(&enum_schema(), br#"{"color":"COLOR_RED"}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownEnumName { .. }));
    }

    #[test]
    fn test_enum_unspecified_token() {
        let decoded = JsonDecoder::new()
            .decode(&enum_schema(), br#"{"color":"UNSPECIFIED"}"#)
            .unwrap();
        assert_eq!(decoded.get(1), Some(&Value::Enum(0)));
    }

    #[test]
    fn test_enum_unknown_never_defaults() {
        let err = JsonDecoder::new()
            .decode(&enum_schema(), br#"{"color":"MAGENTA"}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownEnumName { ref name, .. } if name == "MAGENTA"));
    }

    // ── flattened paths ────────────────────────────────────────

    #[test]
    fn test_flattened_path_materializes_intermediate() {
        let schema = Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.Wrapper".into(),
            properties: vec![Property {
                json_name: "fieldFromFlattened".into(),
                schema: Schema::Scalar(ScalarSchema::plain(ScalarKind::String)),
                field_path: vec![PathSegment::through(2, "p.Details"), PathSegment::leaf(1)],
                required: false,
                explicitly_optional: false,
                read_only: false,
                write_only: false,
                description: None,
            }],
        }));

        let decoded = JsonDecoder::new()
            .decode(&schema, br#"{"fieldFromFlattened":"flattened"}"#)
            .unwrap();
        let nested = decoded.get(2).and_then(Value::as_message).unwrap();
        assert_eq!(nested.type_name(), "p.Details");
        assert_eq!(nested.get(1), Some(&Value::String("flattened".into())));
    }

    #[test]
    fn test_document_must_be_object() {
        let schema = Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.M".into(),
            properties: vec![],
        }));
        let err = JsonDecoder::new().decode(&schema, b"[1,2]").unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let schema = Schema::Object(Arc::new(ObjectSchema {
            full_name: "p.M".into(),
            properties: vec![],
        }));
        assert!(matches!(
            JsonDecoder::new().decode(&schema, b"{not json").unwrap_err(),
            CodecError::Json(_)
        ));
    }
}
