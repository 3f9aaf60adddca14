//! Schema-driven JSON codec for tessera message values.
//!
//! Translates between dynamic [`MessageValue`]s and JSON documents
//! using the resolved schema graph from `tessera-schema`, applying the
//! project's wire conventions:
//!
//! - **Tagged unions** — `{"!type": "<member>", "<member>": <value>}`
//!   envelopes, with an inline convention and a decode-leniency flag
//!   for the legacy bare form
//! - **Enums** — prefix-stripped names by default, full names on
//!   request, strict or lenient decode
//! - **Flattening** — spliced sub-message properties encode as plain
//!   siblings and decode back through their multi-segment field paths
//! - **Well-known types** — RFC 3339 timestamps, `YYYY-MM-DD` dates,
//!   decimal strings, `{}` empty markers, unwrapped value wrappers
//!
//! Modules:
//!
//! - [`config`] — per-call [`CodecConfig`] and the union/enum mode enums
//! - [`collect`] — pairs schema properties with live instance values
//! - [`encode`] — [`JsonEncoder`]
//! - [`decode`] — [`JsonDecoder`]
//! - [`error`] — [`CodecError`] with JSON-path context
//!
//! Encode→decode→encode is idempotent for every supported
//! configuration; the decoder rejects malformed unions and enums
//! deterministically rather than guessing.
//!
//! [`MessageValue`]: tessera_schema::MessageValue

pub mod collect;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
mod wkt;

// ── Re-exports for convenience ─────────────────────────────────────

pub use collect::{collect, CollectedEntry, CollectedProperty};
pub use config::{CodecConfig, EnumDecodeMode, UnionStyle, UNION_TYPE_KEY};
pub use decode::JsonDecoder;
pub use encode::JsonEncoder;
pub use error::{CodecError, CodecResult};
