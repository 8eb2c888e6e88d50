//! Decoder for the compiled binary form of `AndroidManifest.xml` and the
//! `resources.arsc` resource table packed inside an APK.
//!
//! The decoder turns the chunk-stream encoding into a textual XML document.
//! When a resource table is supplied, resource references found in the
//! manifest are resolved either to symbolic names (`@string/app_name`) or,
//! with [`DecodeConfig::resolve_to_value`], to concrete values selected by
//! locale.

mod apk;
mod arsc_parser;
mod attributes;
mod chunks;
mod reader;
mod resolver;
mod string_pool;
mod styles;
mod xml_parser;
mod xml_translator;

use thiserror::Error;

pub use crate::apk::ApkDecoder;
pub use crate::arsc_parser::{ResourceEntry, ResourceTable, ResourceTableParser};
pub use crate::chunks::ResValue;
pub use crate::resolver::{Locale, ResourceResolver};
pub use crate::string_pool::StringPool;
pub use crate::styles::FrameworkStyles;
pub use crate::xml_parser::BinaryXmlParser;
pub use crate::xml_translator::{XmlAttribute, XmlTranslator};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unexpected end of data at offset {0}")]
    Truncated(usize),

    #[error("seek position out of range: {0}")]
    Overflow(u64),

    #[error("unexpected chunk type: 0x{0:04x}")]
    UnexpectedChunkType(u16),

    #[error("no string pool after document header")]
    MissingStringPool,

    #[error("archive has no AndroidManifest.xml entry")]
    ManifestNotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("failed to read archive: {0}")]
    Zip(String),

    #[error("failed to open file: {0}")]
    File(String),
}

/// Knobs of a single decode invocation. Immutable while decoding; a value
/// can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Resolve references through the resource table down to a string value
    /// instead of stopping at the symbolic `@type/name` form.
    pub resolve_to_value: bool,
    /// Post-process well-known enum and bitmask attributes
    /// (`screenOrientation`, `configChanges`, ...) into their textual form.
    pub attribute_value_mapping: bool,
    /// Locale used to pick between per-configuration resource entries.
    pub locale: Locale,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            resolve_to_value: false,
            attribute_value_mapping: false,
            locale: Locale::host_default(),
        }
    }
}

/// Decodes a compiled manifest into its textual XML form.
///
/// `table` and `styles` are optional collaborators: without them, references
/// render as `@0x<hex>` and obfuscated attribute names fall back to their
/// resource-id form.
pub fn decode_manifest(
    manifest: &[u8],
    table: Option<&ResourceTable>,
    styles: Option<&FrameworkStyles>,
    config: &DecodeConfig,
) -> Result<String, ParseError> {
    if manifest.is_empty() {
        return Err(ParseError::InvalidArgument("empty manifest data"));
    }

    let resolver = ResourceResolver::new(table, styles, config.resolve_to_value, &config.locale);
    let mut translator = XmlTranslator::new();
    BinaryXmlParser::new(manifest, Some(&resolver), config).parse(&mut translator)?;
    Ok(translator.into_document())
}

/// Parses a raw `resources.arsc` blob into a queryable table.
pub fn parse_resource_table(arsc: &[u8]) -> Result<ResourceTable, ParseError> {
    if arsc.is_empty() {
        return Err(ParseError::InvalidArgument("empty resource table data"));
    }
    ResourceTableParser::new(arsc).parse()
}
