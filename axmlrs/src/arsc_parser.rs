use std::collections::HashMap;

use log::warn;

use crate::chunks::{ChunkHeader, ChunkInfo, ChunkType, ResValue};
use crate::reader::ByteReader;
use crate::string_pool::StringPool;
use crate::ParseError;

const NO_ENTRY: u32 = 0xffff_ffff;
const FLAG_COMPLEX: u32 = 0x0001;

/// One table entry under a resource id. An id usually carries several
/// entries, one per configuration; `locale` is the axis the resolver
/// selects on. Complex (map) entries carry no value.
#[derive(Clone, Debug)]
pub struct ResourceEntry {
    pub res_id: u32,
    pub type_name: String,
    pub key: String,
    pub value: Option<ResValue>,
    pub locale: String,
}

/// The decoded `resources.arsc`: entries indexed by resource id, the key
/// names of `attr` resources, and the global value string pool. Read-only
/// once parsed; may be shared across many manifest decodings.
#[derive(Debug, Default)]
pub struct ResourceTable {
    pub(crate) global_pool: StringPool,
    pub(crate) entries: HashMap<u32, Vec<ResourceEntry>>,
    pub(crate) attribute_names: HashMap<u32, String>,
}

impl ResourceTable {
    pub fn global_pool(&self) -> &StringPool {
        &self.global_pool
    }

    pub fn entries(&self, res_id: u32) -> Option<&[ResourceEntry]> {
        self.entries.get(&res_id).map(Vec::as_slice)
    }

    pub fn attribute_name(&self, res_id: u32) -> Option<&str> {
        self.attribute_names.get(&res_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses a raw `resources.arsc` blob: a TABLE header, the global string
/// pool, then one run of type chunks per package.
pub struct ResourceTableParser<'a> {
    reader: ByteReader<'a>,
    table: ResourceTable,
}

impl<'a> ResourceTableParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(data),
            table: ResourceTable::default(),
        }
    }

    pub fn parse(mut self) -> Result<ResourceTable, ParseError> {
        let header = ChunkHeader::read(&mut self.reader)?;
        if header.chunk_type != ChunkType::TABLE {
            warn!(
                "resource table starts with chunk type 0x{:04x} instead of TABLE",
                header.chunk_type
            );
        }

        let mut global_pool_seen = false;
        while self.reader.remaining() >= 8 {
            let chunk_start = self.reader.pos() as u64;
            let header = ChunkHeader::read(&mut self.reader)?;

            match &header.info {
                ChunkInfo::StringPool { .. } => {
                    // The first pool is the global one; package-level pools
                    // are reached through their package offsets instead.
                    if !global_pool_seen {
                        self.table.global_pool =
                            StringPool::read(&mut self.reader, chunk_start, &header)?;
                        global_pool_seen = true;
                    }
                }
                ChunkInfo::TablePackage { .. } => self.parse_package(chunk_start, &header)?,
                _ => {
                    // Newer tables carry chunk types this parser does not
                    // know; they are self-sized and safe to skip.
                    warn!(
                        "skipping unrecognized table chunk type 0x{:04x}",
                        header.chunk_type
                    );
                }
            }

            self.reader.seek(chunk_start + u64::from(header.chunk_size))?;
        }

        Ok(self.table)
    }

    fn parse_package(&mut self, pkg_start: u64, header: &ChunkHeader) -> Result<(), ParseError> {
        let (pkg_id, type_strings, key_strings) = match &header.info {
            ChunkInfo::TablePackage {
                id,
                type_strings,
                key_strings,
                ..
            } => (*id, *type_strings, *key_strings),
            _ => return Err(ParseError::UnexpectedChunkType(header.chunk_type)),
        };

        let type_pool = self.read_nested_pool(pkg_start + u64::from(type_strings))?;
        let key_pool = self.read_nested_pool(pkg_start + u64::from(key_strings))?;

        // Type chunks follow the two pools, wherever those ended.
        let package_end = pkg_start + u64::from(header.chunk_size);
        while self.reader.pos() as u64 + 8 <= package_end {
            let chunk_start = self.reader.pos() as u64;
            let header = ChunkHeader::read(&mut self.reader)?;

            match &header.info {
                ChunkInfo::TableType { .. } => {
                    self.parse_type(chunk_start, &header, pkg_id, &type_pool, &key_pool)?;
                }
                ChunkInfo::TableTypeSpec { .. } => {}
                _ if header.chunk_type == ChunkType::TABLE_LIBRARY
                    || header.chunk_type == ChunkType::NULL => {}
                _ => {
                    warn!(
                        "skipping unrecognized package chunk type 0x{:04x}",
                        header.chunk_type
                    );
                }
            }

            self.reader.seek(chunk_start + u64::from(header.chunk_size))?;
        }

        Ok(())
    }

    fn read_nested_pool(&mut self, pool_start: u64) -> Result<StringPool, ParseError> {
        self.reader.seek(pool_start)?;
        let header = ChunkHeader::read(&mut self.reader)?;
        if header.chunk_type != ChunkType::STRING_POOL {
            return Err(ParseError::UnexpectedChunkType(header.chunk_type));
        }
        StringPool::read(&mut self.reader, pool_start, &header)
    }

    fn parse_type(
        &mut self,
        chunk_start: u64,
        header: &ChunkHeader,
        pkg_id: u32,
        type_pool: &StringPool,
        key_pool: &StringPool,
    ) -> Result<(), ParseError> {
        let (type_id, entry_count, entries_start, config) = match &header.info {
            ChunkInfo::TableType {
                id,
                entry_count,
                entries_start,
                config,
            } => (*id, *entry_count, *entries_start, config.clone()),
            _ => return Err(ParseError::UnexpectedChunkType(header.chunk_type)),
        };
        if type_id == 0 {
            warn!("type chunk with invalid type id 0");
            return Ok(());
        }

        let locale = config.locale();
        let type_name = type_pool
            .get(usize::from(type_id) - 1)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("type{}", type_id));

        let mut offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            offsets.push(self.reader.read_u32()? as u32);
        }

        for (entry_index, offset) in offsets.into_iter().enumerate() {
            if offset == NO_ENTRY {
                continue;
            }
            let entry_start = chunk_start + u64::from(entries_start) + u64::from(offset);
            self.reader.seek(entry_start)?;

            let size = self.reader.read_u16()?;
            let flags = self.reader.read_u16()?;
            let key_ref = self.reader.read_u32()? as u32;
            let key = key_pool
                .get(key_ref as usize)
                .unwrap_or_default()
                .to_owned();

            let value = if flags & FLAG_COMPLEX != 0 {
                let _parent = self.reader.read_u32()?;
                let map_count = self.reader.read_u32()?;
                self.reader.seek(entry_start + u64::from(size))?;
                for _ in 0..map_count {
                    let _name_ref = self.reader.read_u32()?;
                    let _value = ResValue::read(&mut self.reader)?;
                }
                None
            } else {
                self.reader.seek(entry_start + u64::from(size))?;
                Some(ResValue::read(&mut self.reader)?)
            };

            let res_id = (pkg_id << 24) | (u32::from(type_id) << 16) | entry_index as u32;
            if type_name == "attr" {
                // The most recent key wins for attribute naming.
                self.table.attribute_names.insert(res_id, key.clone());
            }
            self.table
                .entries
                .entry(res_id)
                .or_default()
                .push(ResourceEntry {
                    res_id,
                    type_name: type_name.clone(),
                    key,
                    value,
                    locale: locale.clone(),
                });
        }

        Ok(())
    }
}
