//! Scalar and well-known-type conversions.
//!
//! One marshal and one unmarshal function per well-known entry, plus
//! the plain-scalar conversions both directions. The encodings here are
//! wire contracts and must stay bit-for-bit stable:
//!
//! - timestamps: RFC 3339 with up-to-nanosecond precision, always UTC
//! - dates: `YYYY-MM-DD`
//! - decimal wrappers: decimal text as a JSON string
//! - empty markers: `{}`
//! - value wrappers: the bare scalar
//! - bytes: standard-alphabet base64 on encode; alphabet and padding
//!   auto-detected on decode so either variant round-trips

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::json;

use tessera_schema::{MessageValue, ScalarKind, ScalarSchema, Value, WellKnownType};

use crate::error::{CodecError, CodecResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Marshals a scalar value, applying the well-known override if one is
/// set.
pub(crate) fn marshal_scalar(
    schema: &ScalarSchema,
    value: &Value,
    path: &str,
) -> CodecResult<serde_json::Value> {
    match schema.well_known {
        Some(WellKnownType::Timestamp) => marshal_timestamp(value, path),
        Some(WellKnownType::Date) => marshal_date(value, path),
        Some(WellKnownType::Decimal) => marshal_decimal(value, path),
        Some(WellKnownType::Empty) => marshal_empty(value, path),
        // Value wrappers unwrap to the bare scalar, which is exactly
        // the plain path for their kind.
        _ => marshal_plain(schema.kind, value, path),
    }
}

/// Unmarshals a scalar token, applying the well-known override if one
/// is set.
pub(crate) fn unmarshal_scalar(
    schema: &ScalarSchema,
    token: &serde_json::Value,
    path: &str,
) -> CodecResult<Value> {
    match schema.well_known {
        Some(WellKnownType::Timestamp) => unmarshal_timestamp(token, path),
        Some(WellKnownType::Date) => unmarshal_date(token, path),
        Some(WellKnownType::Decimal) => unmarshal_decimal(token, path),
        Some(WellKnownType::Empty) => unmarshal_empty(token, path),
        _ => unmarshal_plain(schema.kind, token, path),
    }
}

// ── Well-known entries ─────────────────────────────────────────────

fn marshal_timestamp(value: &Value, path: &str) -> CodecResult<serde_json::Value> {
    let Value::Timestamp(ts) = value else {
        return Err(mismatch(path, "timestamp", value));
    };
    Ok(serde_json::Value::String(
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ))
}

fn unmarshal_timestamp(token: &serde_json::Value, path: &str) -> CodecResult<Value> {
    let text = expect_string(token, path, "timestamp string")?;
    let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| CodecError::InvalidValue {
        path: path.to_string(),
        message: format!("malformed timestamp '{text}': {e}"),
    })?;
    Ok(Value::Timestamp(parsed.with_timezone(&Utc)))
}

fn marshal_date(value: &Value, path: &str) -> CodecResult<serde_json::Value> {
    let Value::Date(date) = value else {
        return Err(mismatch(path, "date", value));
    };
    Ok(serde_json::Value::String(
        date.format(DATE_FORMAT).to_string(),
    ))
}

fn unmarshal_date(token: &serde_json::Value, path: &str) -> CodecResult<Value> {
    let text = expect_string(token, path, "date string")?;
    let parsed = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
        CodecError::InvalidValue {
            path: path.to_string(),
            message: format!("malformed date '{text}': {e}"),
        }
    })?;
    Ok(Value::Date(parsed))
}

fn marshal_decimal(value: &Value, path: &str) -> CodecResult<serde_json::Value> {
    let Value::String(text) = value else {
        return Err(mismatch(path, "decimal string", value));
    };
    Ok(serde_json::Value::String(text.clone()))
}

/// Decimal accepts a string or a number token; the number's decimal
/// text is stored.
fn unmarshal_decimal(token: &serde_json::Value, path: &str) -> CodecResult<Value> {
    match token {
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Number(n) => Ok(Value::String(n.to_string())),
        other => Err(CodecError::UnexpectedToken {
            path: path.to_string(),
            expected: "decimal string or number".to_string(),
            found: token_name(other).to_string(),
        }),
    }
}

fn marshal_empty(value: &Value, path: &str) -> CodecResult<serde_json::Value> {
    let Value::Message(_) = value else {
        return Err(mismatch(path, "empty message", value));
    };
    Ok(json!({}))
}

fn unmarshal_empty(token: &serde_json::Value, path: &str) -> CodecResult<Value> {
    match token.as_object() {
        Some(map) if map.is_empty() => Ok(Value::Message(MessageValue::new(
            WellKnownType::Empty.type_name(),
        ))),
        Some(_) => Err(CodecError::InvalidValue {
            path: path.to_string(),
            message: "empty marker must be {}".to_string(),
        }),
        None => Err(CodecError::UnexpectedToken {
            path: path.to_string(),
            expected: "empty object".to_string(),
            found: token_name(token).to_string(),
        }),
    }
}

// ── Plain scalars ──────────────────────────────────────────────────

pub(crate) fn marshal_plain(
    kind: ScalarKind,
    value: &Value,
    path: &str,
) -> CodecResult<serde_json::Value> {
    match (kind, value) {
        (ScalarKind::Bool, Value::Bool(b)) => Ok(serde_json::Value::Bool(*b)),
        (ScalarKind::Int32, Value::I32(n)) => Ok(json!(n)),
        (ScalarKind::Int64, Value::I64(n)) => Ok(json!(n)),
        (ScalarKind::Uint32, Value::U32(n)) => Ok(json!(n)),
        (ScalarKind::Uint64, Value::U64(n)) => Ok(json!(n)),
        (ScalarKind::Float, Value::F32(f)) => f32_number(*f, path),
        (ScalarKind::Double, Value::F64(f)) => f64_number(*f, path),
        (ScalarKind::String, Value::String(s)) => Ok(serde_json::Value::String(s.clone())),
        (ScalarKind::Bytes, Value::Bytes(b)) => {
            Ok(serde_json::Value::String(STANDARD.encode(b)))
        }
        (kind, value) => Err(mismatch(path, kind.as_str(), value)),
    }
}

pub(crate) fn unmarshal_plain(
    kind: ScalarKind,
    token: &serde_json::Value,
    path: &str,
) -> CodecResult<Value> {
    match kind {
        ScalarKind::Bool => match token {
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(unexpected(path, "bool", other)),
        },
        ScalarKind::Int32 => {
            let wide = integer_token(token, path, "int32")?;
            i32::try_from(wide)
                .map(Value::I32)
                .map_err(|_| out_of_range(path, "int32"))
        }
        ScalarKind::Int64 => integer_token(token, path, "int64").map(Value::I64),
        ScalarKind::Uint32 => {
            let wide = unsigned_token(token, path, "uint32")?;
            u32::try_from(wide)
                .map(Value::U32)
                .map_err(|_| out_of_range(path, "uint32"))
        }
        ScalarKind::Uint64 => unsigned_token(token, path, "uint64").map(Value::U64),
        ScalarKind::Float => {
            let wide = float_token(token, path, "float")?;
            let narrow = wide as f32;
            if wide.is_finite() && narrow.is_infinite() {
                return Err(out_of_range(path, "float"));
            }
            Ok(Value::F32(narrow))
        }
        ScalarKind::Double => float_token(token, path, "double").map(Value::F64),
        ScalarKind::String => expect_string(token, path, "string").map(|s| Value::String(s.to_string())),
        ScalarKind::Bytes => {
            let text = expect_string(token, path, "base64 string")?;
            decode_base64(text, path).map(Value::Bytes)
        }
    }
}

/// Decodes base64, auto-detecting the alphabet (URL-safe when `-`/`_`
/// appear) and padding (when `=` appears), mirroring the encoder's
/// choices so round-trips are stable.
pub(crate) fn decode_base64(text: &str, path: &str) -> CodecResult<Vec<u8>> {
    let url_safe = text.contains(['-', '_']);
    let padded = text.contains('=');
    let engine: &base64::engine::GeneralPurpose = match (url_safe, padded) {
        (true, true) => &URL_SAFE,
        (true, false) => &URL_SAFE_NO_PAD,
        (false, true) => &STANDARD,
        (false, false) => &STANDARD_NO_PAD,
    };
    engine.decode(text).map_err(|e| CodecError::InvalidValue {
        path: path.to_string(),
        message: format!("malformed base64: {e}"),
    })
}

// ── Numeric token helpers ──────────────────────────────────────────

/// Reads a signed integer from the full-width numeric token; fractional
/// tokens are rejected rather than truncated.
fn integer_token(token: &serde_json::Value, path: &str, kind: &str) -> CodecResult<i64> {
    let Some(number) = token.as_number() else {
        return Err(unexpected(path, kind, token));
    };
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    if number.as_u64().is_some() {
        return Err(out_of_range(path, kind));
    }
    Err(unexpected(path, "integer", token))
}

fn unsigned_token(token: &serde_json::Value, path: &str, kind: &str) -> CodecResult<u64> {
    let Some(number) = token.as_number() else {
        return Err(unexpected(path, kind, token));
    };
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    if number.as_i64().is_some() {
        // Negative: representable as i64 but not unsigned.
        return Err(out_of_range(path, kind));
    }
    Err(unexpected(path, "integer", token))
}

fn float_token(token: &serde_json::Value, path: &str, kind: &str) -> CodecResult<f64> {
    token
        .as_f64()
        .ok_or_else(|| unexpected(path, kind, token))
}

/// Formats an `f64` as a JSON number; non-finite values have no JSON
/// representation and fail.
fn f64_number(v: f64, path: &str) -> CodecResult<serde_json::Value> {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .ok_or_else(|| CodecError::InvalidValue {
            path: path.to_string(),
            message: "non-finite float has no JSON representation".to_string(),
        })
}

/// Formats an `f32` through its shortest round-trip decimal form, so
/// `3.14f32` emits `3.14` rather than the widened double.
fn f32_number(v: f32, path: &str) -> CodecResult<serde_json::Value> {
    if !v.is_finite() {
        return Err(CodecError::InvalidValue {
            path: path.to_string(),
            message: "non-finite float has no JSON representation".to_string(),
        });
    }
    let shortest = format!("{v}");
    let widened: f64 = shortest.parse().map_err(|_| CodecError::InvalidValue {
        path: path.to_string(),
        message: format!("unrepresentable float '{shortest}'"),
    })?;
    f64_number(widened, path)
}

// ── Error helpers ──────────────────────────────────────────────────

fn expect_string<'a>(
    token: &'a serde_json::Value,
    path: &str,
    expected: &str,
) -> CodecResult<&'a str> {
    token
        .as_str()
        .ok_or_else(|| unexpected(path, expected, token))
}

fn out_of_range(path: &str, kind: &str) -> CodecError {
    CodecError::OutOfRange {
        path: path.to_string(),
        kind: kind.to_string(),
    }
}

fn mismatch(path: &str, expected: &str, value: &Value) -> CodecError {
    CodecError::InvalidValue {
        path: path.to_string(),
        message: format!("expected {expected} value, instance holds {}", value.kind_name()),
    }
}

fn unexpected(path: &str, expected: &str, token: &serde_json::Value) -> CodecError {
    CodecError::UnexpectedToken {
        path: path.to_string(),
        expected: expected.to_string(),
        found: token_name(token).to_string(),
    }
}

pub(crate) fn token_name(token: &serde_json::Value) -> &'static str {
    match token {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
