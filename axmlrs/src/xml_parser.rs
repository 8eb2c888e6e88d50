use log::warn;

use crate::attributes;
use crate::chunks::{ChunkHeader, ChunkType, ResValue};
use crate::reader::ByteReader;
use crate::resolver::ResourceResolver;
use crate::string_pool::StringPool;
use crate::xml_translator::{XmlAttribute, XmlTranslator};
use crate::{DecodeConfig, ParseError};

/// Drives chunk dispatch over a compiled XML document and feeds the
/// reconstructed events to an [`XmlTranslator`].
///
/// The document layout is a sentinel chunk, a string pool, an optional
/// resource map, then the event chunks. Every chunk is left exactly at
/// `chunk_start + chunk_size` before the next header is read, whatever the
/// handler consumed.
pub struct BinaryXmlParser<'a> {
    reader: ByteReader<'a>,
    pool: StringPool,
    resource_map: Vec<u32>,
    resolver: Option<&'a ResourceResolver<'a>>,
    config: &'a DecodeConfig,
}

impl<'a> BinaryXmlParser<'a> {
    pub fn new(
        data: &'a [u8],
        resolver: Option<&'a ResourceResolver<'a>>,
        config: &'a DecodeConfig,
    ) -> Self {
        Self {
            reader: ByteReader::new(data),
            pool: StringPool::empty(),
            resource_map: Vec::new(),
            resolver,
            config,
        }
    }

    pub fn parse(mut self, translator: &mut XmlTranslator) -> Result<(), ParseError> {
        let sentinel = ChunkHeader::read(&mut self.reader)?;
        if sentinel.chunk_type != ChunkType::XML && sentinel.chunk_type != ChunkType::NULL {
            // Android itself does not validate the sentinel type.
            warn!(
                "document starts with chunk type 0x{:04x} instead of XML",
                sentinel.chunk_type
            );
        }

        let pool_start = self.reader.pos() as u64;
        let pool_header = ChunkHeader::read(&mut self.reader)?;
        if pool_header.chunk_type != ChunkType::STRING_POOL {
            return Err(ParseError::MissingStringPool);
        }
        self.pool = StringPool::read(&mut self.reader, pool_start, &pool_header)?;

        while !self.reader.at_end() {
            let header = ChunkHeader::read(&mut self.reader)?;
            let body_start = self.reader.pos() as u64;

            match header.chunk_type {
                ChunkType::XML_RESOURCE_MAP => self.read_resource_map(&header)?,
                ChunkType::XML_START_NAMESPACE => self.handle_start_namespace(translator)?,
                ChunkType::XML_END_NAMESPACE => self.handle_end_namespace(translator)?,
                ChunkType::XML_START_ELEMENT => self.handle_start_element(translator)?,
                ChunkType::XML_END_ELEMENT => self.handle_end_element(translator)?,
                ChunkType::XML_CDATA => self.handle_cdata(translator)?,
                t if (ChunkType::XML_FIRST_CHUNK..=ChunkType::XML_LAST_CHUNK).contains(&t) => {
                    warn!("skipping unrecognized xml chunk type 0x{:04x}", t);
                }
                t => return Err(ParseError::UnexpectedChunkType(t)),
            }

            self.reader.seek(body_start + header.body_size())?;
        }

        Ok(())
    }

    /// One resource id per string-pool entry, mapping attribute names back
    /// to framework ids when the name string itself is empty.
    fn read_resource_map(&mut self, header: &ChunkHeader) -> Result<(), ParseError> {
        let count = header.body_size() / 4;
        let mut ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            ids.push(self.reader.read_u32()? as u32);
        }
        self.resource_map = ids;
        Ok(())
    }

    fn handle_start_namespace(&mut self, translator: &mut XmlTranslator) -> Result<(), ParseError> {
        let prefix_ref = self.reader.read_ref()?;
        let uri_ref = self.reader.read_ref()?;
        translator.start_namespace(self.pool.get_ref(prefix_ref), self.pool.get_ref(uri_ref));
        Ok(())
    }

    fn handle_end_namespace(&mut self, translator: &mut XmlTranslator) -> Result<(), ParseError> {
        let prefix_ref = self.reader.read_ref()?;
        let uri_ref = self.reader.read_ref()?;
        translator.end_namespace(self.pool.get_ref(prefix_ref), self.pool.get_ref(uri_ref));
        Ok(())
    }

    fn handle_start_element(&mut self, translator: &mut XmlTranslator) -> Result<(), ParseError> {
        let ext_start = self.reader.pos() as u64;
        let ns_ref = self.reader.read_ref()?;
        let name_ref = self.reader.read_ref()?;
        let attribute_start = self.reader.read_u16()?;
        let attribute_size = self.reader.read_u16()?;
        let attribute_count = self.reader.read_u16()?;
        let _id_index = self.reader.read_u16()?;
        let _class_index = self.reader.read_u16()?;
        let _style_index = self.reader.read_u16()?;

        let mut attributes = Vec::with_capacity(attribute_count as usize);
        for i in 0..attribute_count {
            // Records sit at a declared offset and stride; both can exceed
            // the fields actually defined.
            self.reader.seek(
                ext_start + u64::from(attribute_start) + u64::from(i) * u64::from(attribute_size),
            )?;
            attributes.push(self.read_attribute()?);
        }

        let namespace = self.pool.get_ref(ns_ref);
        let name = self.pool.get_ref(name_ref).unwrap_or("");
        translator.start_element(namespace, name, &attributes);
        Ok(())
    }

    fn handle_end_element(&mut self, translator: &mut XmlTranslator) -> Result<(), ParseError> {
        let ns_ref = self.reader.read_ref()?;
        let name_ref = self.reader.read_ref()?;
        translator.end_element(
            self.pool.get_ref(ns_ref),
            self.pool.get_ref(name_ref).unwrap_or(""),
        );
        Ok(())
    }

    fn handle_cdata(&mut self, translator: &mut XmlTranslator) -> Result<(), ParseError> {
        let data_ref = self.reader.read_ref()?;
        let value = ResValue::read(&mut self.reader)?;
        let text = match self.pool.get_ref(data_ref) {
            Some(raw) => raw.to_owned(),
            None => value.render(&self.pool, self.resolver),
        };
        translator.cdata(&text);
        Ok(())
    }

    fn read_attribute(&mut self) -> Result<XmlAttribute, ParseError> {
        let ns_ref = self.reader.read_ref()?;
        let name_ref = self.reader.read_ref()?;
        let raw_value_ref = self.reader.read_ref()?;
        let value = ResValue::read(&mut self.reader)?;

        let namespace = self.pool.get_ref(ns_ref).map(str::to_owned);
        let name = self.attribute_name(name_ref);

        let mut rendered = match self.pool.get_ref(raw_value_ref) {
            Some(raw) => raw.to_owned(),
            None => value.render(&self.pool, self.resolver),
        };
        if self.config.attribute_value_mapping {
            if let Some(mapped) = attributes::humanize(&name, &rendered) {
                rendered = mapped;
            }
        }

        Ok(XmlAttribute {
            namespace,
            name,
            value: rendered,
        })
    }

    /// Obfuscators blank out attribute name strings; the resource map still
    /// carries the framework id the name can be recovered from.
    fn attribute_name(&self, name_ref: i32) -> String {
        if let Some(name) = self.pool.get_ref(name_ref) {
            if !name.is_empty() {
                return name.to_owned();
            }
        }
        if name_ref >= 0 {
            if let Some(&res_id) = self.resource_map.get(name_ref as usize) {
                if let Some(name) = self
                    .resolver
                    .and_then(|r| r.resolve_attribute_name(res_id))
                {
                    return name;
                }
                if let Some(name) = attributes::framework_attribute_name(res_id) {
                    return name.to_owned();
                }
                return format!("AttrId:0x{:x}", res_id);
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn chunk(chunk_type: u16, header_extra: &[u8], body: &[u8]) -> Vec<u8> {
        let header_size = 8 + header_extra.len() as u16;
        let chunk_size = u32::from(header_size) + body.len() as u32;
        let mut out = Vec::new();
        out.extend_from_slice(&chunk_type.to_le_bytes());
        out.extend_from_slice(&header_size.to_le_bytes());
        out.extend_from_slice(&chunk_size.to_le_bytes());
        out.extend_from_slice(header_extra);
        out.extend_from_slice(body);
        out
    }

    fn empty_pool() -> Vec<u8> {
        // string_count, style_count, flags, strings_start, styles_start
        let mut extra = Vec::new();
        extra.extend_from_slice(&0u32.to_le_bytes());
        extra.extend_from_slice(&0u32.to_le_bytes());
        extra.extend_from_slice(&0u32.to_le_bytes());
        extra.extend_from_slice(&28u32.to_le_bytes());
        extra.extend_from_slice(&0u32.to_le_bytes());
        chunk(ChunkType::STRING_POOL, &extra, &[])
    }

    fn document(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = Vec::new();
        out.extend_from_slice(&ChunkType::XML.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&((8 + body.len()) as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn missing_string_pool_is_fatal() {
        let doc = document(&[chunk(ChunkType::XML_END_NAMESPACE, &[0; 8], &[0; 8])]);
        let config = DecodeConfig::default();
        let mut translator = XmlTranslator::new();
        let err = BinaryXmlParser::new(&doc, None, &config)
            .parse(&mut translator)
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingStringPool));
    }

    #[test]
    fn chunk_outside_xml_range_is_fatal() {
        let doc = document(&[empty_pool(), chunk(ChunkType::TABLE, &0u32.to_le_bytes(), &[])]);
        let config = DecodeConfig::default();
        let mut translator = XmlTranslator::new();
        let err = BinaryXmlParser::new(&doc, None, &config)
            .parse(&mut translator)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedChunkType(t) if t == ChunkType::TABLE
        ));
    }

    #[test]
    fn unknown_chunk_inside_reserved_range_is_skipped() -> Result<()> {
        let doc = document(&[empty_pool(), chunk(0x0110, &[], &[1, 2, 3, 4])]);
        let config = DecodeConfig::default();
        let mut translator = XmlTranslator::new();
        BinaryXmlParser::new(&doc, None, &config).parse(&mut translator)?;
        assert_eq!(
            translator.into_document(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"
        );
        Ok(())
    }
}
