//! Codec configuration.
//!
//! Passed per encoder/decoder instance, never global. The defaults
//! match the primary wire convention: wrapped unions with the `!type`
//! discriminator, short (prefix-stripped) enum names, lenient enum
//! decode.

/// JSON convention for tagged unions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionStyle {
    /// `{"!type": "<member>", "<member>": <value>}` envelope (default).
    Wrapped,
    /// The populated member appears as a plain property, no envelope.
    Inline,
}

/// How strictly enum tokens are matched on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDecodeMode {
    /// Accept the short name and the full prefixed name (default).
    Lenient,
    /// Accept only the stored short form.
    Strict,
}

/// The discriminator key of the union envelope.
pub const UNION_TYPE_KEY: &str = "!type";

/// Per-call codec configuration.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Union emission and primary decode convention.
    pub union_style: UnionStyle,
    /// With [`UnionStyle::Wrapped`], also accept the bare inlined form
    /// on decode (backward compatibility). Never merges both
    /// interpretations for one document.
    pub accept_inline_unions: bool,
    /// Emit prefix-stripped enum names.
    pub short_enums: bool,
    /// Spelling of the zero option, and the suffix the resolver derived
    /// the prefix from.
    pub unspecified_suffix: String,
    /// Enum token matching on decode.
    pub enum_decode: EnumDecodeMode,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            union_style: UnionStyle::Wrapped,
            accept_inline_unions: false,
            short_enums: true,
            unspecified_suffix: "UNSPECIFIED".to_string(),
            enum_decode: EnumDecodeMode::Lenient,
        }
    }
}

impl CodecConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the union convention.
    #[must_use]
    pub fn with_union_style(mut self, style: UnionStyle) -> Self {
        self.union_style = style;
        self
    }

    /// Accepts bare inlined unions on decode alongside the envelope.
    #[must_use]
    pub fn with_inline_leniency(mut self) -> Self {
        self.accept_inline_unions = true;
        self
    }

    /// Enables or disables short enum names.
    #[must_use]
    pub fn with_short_enums(mut self, short: bool) -> Self {
        self.short_enums = short;
        self
    }

    /// Sets the enum decode mode.
    #[must_use]
    pub fn with_enum_decode(mut self, mode: EnumDecodeMode) -> Self {
        self.enum_decode = mode;
        self
    }

    /// Overrides the unspecified-suffix spelling.
    #[must_use]
    pub fn with_unspecified_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.unspecified_suffix = suffix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.union_style, UnionStyle::Wrapped);
        assert!(!config.accept_inline_unions);
        assert!(config.short_enums);
        assert_eq!(config.unspecified_suffix, "UNSPECIFIED");
        assert_eq!(config.enum_decode, EnumDecodeMode::Lenient);
    }

    #[test]
    fn test_builder() {
        let config = CodecConfig::new()
            .with_union_style(UnionStyle::Inline)
            .with_short_enums(false)
            .with_enum_decode(EnumDecodeMode::Strict)
            .with_inline_leniency();
        assert_eq!(config.union_style, UnionStyle::Inline);
        assert!(!config.short_enums);
        assert_eq!(config.enum_decode, EnumDecodeMode::Strict);
        assert!(config.accept_inline_unions);
    }
}
