use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::arsc_parser::{ResourceTable, ResourceTableParser};
use crate::styles::FrameworkStyles;
use crate::{DecodeConfig, ParseError};

const MANIFEST_ENTRY: &str = "AndroidManifest.xml";
const RESOURCES_ENTRY: &str = "resources.arsc";

/// Front door over an APK archive: pulls the compiled manifest and the
/// optional resource table out of the zip and decodes them in one call.
#[derive(Debug)]
pub struct ApkDecoder {
    manifest_raw: Vec<u8>,
    arsc_raw: Vec<u8>,
    config: DecodeConfig,
    styles: Option<FrameworkStyles>,
}

impl ApkDecoder {
    pub fn from_file(file_path: &Path) -> Result<Self, ParseError> {
        let file = File::open(file_path).map_err(|e| ParseError::File(e.to_string()))?;
        let mut archive = ZipArchive::new(file).map_err(|e| ParseError::Zip(e.to_string()))?;
        let mut manifest_raw: Vec<u8> = Vec::new();
        let mut arsc_raw: Vec<u8> = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| ParseError::Zip(e.to_string()))?;

            if entry.name() == MANIFEST_ENTRY {
                entry
                    .read_to_end(&mut manifest_raw)
                    .map_err(|e| ParseError::Zip(e.to_string()))?;
            } else if entry.name() == RESOURCES_ENTRY {
                entry
                    .read_to_end(&mut arsc_raw)
                    .map_err(|e| ParseError::Zip(e.to_string()))?;
            }
        }

        if manifest_raw.is_empty() {
            return Err(ParseError::ManifestNotFound);
        }

        Ok(Self {
            manifest_raw,
            arsc_raw,
            config: DecodeConfig::default(),
            styles: None,
        })
    }

    /// Decodes a bare compiled manifest outside an archive.
    pub fn from_manifest(manifest_raw: Vec<u8>) -> Self {
        Self {
            manifest_raw,
            arsc_raw: Vec::new(),
            config: DecodeConfig::default(),
            styles: None,
        }
    }

    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_styles(mut self, styles: FrameworkStyles) -> Self {
        self.styles = Some(styles);
        self
    }

    /// The archive's resource table, when it carries one.
    pub fn resource_table(&self) -> Result<Option<ResourceTable>, ParseError> {
        if self.arsc_raw.is_empty() {
            return Ok(None);
        }
        ResourceTableParser::new(&self.arsc_raw).parse().map(Some)
    }

    /// Decodes the manifest to its textual XML form.
    pub fn decode(&self) -> Result<String, ParseError> {
        let table = self.resource_table()?;
        crate::decode_manifest(
            &self.manifest_raw,
            table.as_ref(),
            self.styles.as_ref(),
            &self.config,
        )
    }
}
