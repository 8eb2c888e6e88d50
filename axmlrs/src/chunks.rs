use crate::reader::ByteReader;
use crate::resolver::ResourceResolver;
use crate::string_pool::StringPool;
use crate::ParseError;

pub struct ChunkType;

impl ChunkType {
    pub const NULL: u16 = 0x0000;
    pub const STRING_POOL: u16 = 0x0001;
    pub const TABLE: u16 = 0x0002;
    pub const XML: u16 = 0x0003;

    pub const XML_START_NAMESPACE: u16 = 0x0100;
    pub const XML_END_NAMESPACE: u16 = 0x0101;
    pub const XML_START_ELEMENT: u16 = 0x0102;
    pub const XML_END_ELEMENT: u16 = 0x0103;
    pub const XML_CDATA: u16 = 0x0104;
    pub const XML_FIRST_CHUNK: u16 = 0x0100;
    pub const XML_LAST_CHUNK: u16 = 0x017f;
    pub const XML_RESOURCE_MAP: u16 = 0x0180;

    pub const TABLE_PACKAGE: u16 = 0x0200;
    pub const TABLE_TYPE: u16 = 0x0201;
    pub const TABLE_TYPE_SPEC: u16 = 0x0202;
    pub const TABLE_LIBRARY: u16 = 0x0203;
}

/// A parsed chunk header: the common `{type, header_size, chunk_size}`
/// triple plus the chunk-specific fields as a tagged union.
///
/// After [`ChunkHeader::read`] the cursor sits exactly at
/// `chunk_start + header_size`, regardless of how many fields the variant
/// consumed; the body then spans `body_size()` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: u16,
    pub header_size: u16,
    pub chunk_size: u32,
    pub info: ChunkInfo,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkInfo {
    Plain,
    Unknown,
    StringPool {
        string_count: u32,
        style_count: u32,
        flags: u32,
        strings_start: u32,
        styles_start: u32,
    },
    Table {
        package_count: u32,
    },
    XmlNode {
        line: u32,
        comment: i32,
    },
    TablePackage {
        id: u32,
        name: String,
        type_strings: u32,
        last_public_type: u32,
        key_strings: u32,
        last_public_key: u32,
    },
    TableType {
        id: u16,
        entry_count: u32,
        entries_start: u32,
        config: ResConfig,
    },
    TableTypeSpec {
        id: u16,
        entry_count: u32,
    },
}

impl ChunkHeader {
    pub fn read(r: &mut ByteReader) -> Result<ChunkHeader, ParseError> {
        let start = r.pos() as u64;
        let chunk_type = r.read_u16()? as u16;
        let header_size = r.read_u16()? as u16;
        let chunk_size = r.read_u32()? as u32;

        let info = match chunk_type {
            ChunkType::NULL
            | ChunkType::XML
            | ChunkType::XML_RESOURCE_MAP
            | ChunkType::TABLE_LIBRARY => ChunkInfo::Plain,
            ChunkType::STRING_POOL => ChunkInfo::StringPool {
                string_count: r.read_u32()? as u32,
                style_count: r.read_u32()? as u32,
                flags: r.read_u32()? as u32,
                strings_start: r.read_u32()? as u32,
                styles_start: r.read_u32()? as u32,
            },
            ChunkType::TABLE => ChunkInfo::Table {
                package_count: r.read_u32()? as u32,
            },
            ChunkType::XML_START_NAMESPACE
            | ChunkType::XML_END_NAMESPACE
            | ChunkType::XML_START_ELEMENT
            | ChunkType::XML_END_ELEMENT
            | ChunkType::XML_CDATA => ChunkInfo::XmlNode {
                line: r.read_u32()? as u32,
                comment: r.read_ref()?,
            },
            ChunkType::TABLE_PACKAGE => {
                let id = r.read_u32()? as u32;
                let name = read_package_name(r)?;
                ChunkInfo::TablePackage {
                    id,
                    name,
                    type_strings: r.read_u32()? as u32,
                    last_public_type: r.read_u32()? as u32,
                    key_strings: r.read_u32()? as u32,
                    last_public_key: r.read_u32()? as u32,
                }
            }
            ChunkType::TABLE_TYPE => {
                let id = r.read_u8()?;
                let _res0 = r.read_u8()?;
                let _res1 = r.read_u16()?;
                let entry_count = r.read_u32()? as u32;
                let entries_start = r.read_u32()? as u32;
                let config = ResConfig::read(r)?;
                ChunkInfo::TableType {
                    id,
                    entry_count,
                    entries_start,
                    config,
                }
            }
            ChunkType::TABLE_TYPE_SPEC => {
                let id = r.read_u8()?;
                let _res0 = r.read_u8()?;
                let _res1 = r.read_u16()?;
                ChunkInfo::TableTypeSpec {
                    id,
                    entry_count: r.read_u32()? as u32,
                }
            }
            _ => ChunkInfo::Unknown,
        };

        // The header owns exactly header_size bytes, whatever the variant
        // actually read.
        r.seek(start + u64::from(header_size))?;

        Ok(ChunkHeader {
            chunk_type,
            header_size,
            chunk_size,
            info,
        })
    }

    pub fn body_size(&self) -> u64 {
        u64::from(self.chunk_size).saturating_sub(u64::from(self.header_size))
    }
}

/// The package name field is 128 fixed UTF-16 code units, NUL-terminated.
fn read_package_name(r: &mut ByteReader) -> Result<String, ParseError> {
    let mut units = Vec::with_capacity(128);
    for _ in 0..128 {
        units.push(r.read_u16()? as u16);
    }
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    Ok(String::from_utf16_lossy(&units[..end]))
}

/// Configuration axes of a `TABLE_TYPE` chunk. Only the axes the decoder
/// selects on are kept; the block's declared size covers the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResConfig {
    pub mcc: i16,
    pub mnc: i16,
    pub language: String,
    pub country: String,
    pub orientation: u8,
    pub touchscreen: u8,
    pub density: u16,
}

impl ResConfig {
    pub fn read(r: &mut ByteReader) -> Result<ResConfig, ParseError> {
        let start = r.pos() as u64;
        let size = r.read_u32()?;
        let config = ResConfig {
            mcc: r.read_u16()? as u16 as i16,
            mnc: r.read_u16()? as u16 as i16,
            language: r.read_fixed_ascii(2)?,
            country: r.read_fixed_ascii(2)?,
            orientation: r.read_u8()? as u8,
            touchscreen: r.read_u8()? as u8,
            density: r.read_u16()? as u16,
        };
        let end = start + size;
        if end > r.pos() as u64 {
            r.seek(end)?;
        }
        Ok(config)
    }

    /// `""`, `lang`, or `lang-COUNTRY`, as stored in the config block.
    pub fn locale(&self) -> String {
        if self.language.is_empty() {
            String::new()
        } else if self.country.is_empty() {
            self.language.clone()
        } else {
            format!("{}-{}", self.language, self.country)
        }
    }
}

pub struct ResType;

impl ResType {
    pub const NULL: u8 = 0x00;
    pub const REFERENCE: u8 = 0x01;
    pub const ATTRIBUTE: u8 = 0x02;
    pub const STRING: u8 = 0x03;
    pub const FLOAT: u8 = 0x04;
    pub const DIMENSION: u8 = 0x05;
    pub const FRACTION: u8 = 0x06;
    pub const INT_DEC: u8 = 0x10;
    pub const INT_HEX: u8 = 0x11;
    pub const INT_BOOLEAN: u8 = 0x12;
    pub const INT_COLOR_ARGB8: u8 = 0x1c;
    pub const INT_COLOR_RGB8: u8 = 0x1d;
    pub const INT_COLOR_ARGB4: u8 = 0x1e;
    pub const INT_COLOR_RGB4: u8 = 0x1f;
}

/// A typed value as stored in attribute records and table entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResValue {
    pub data_type: u8,
    pub data: u32,
}

impl ResValue {
    pub fn read(r: &mut ByteReader) -> Result<ResValue, ParseError> {
        let _size = r.read_u16()?;
        let _res0 = r.read_u8()?;
        let data_type = r.read_u8()? as u8;
        let data = r.read_u32()? as u32;
        Ok(ResValue { data_type, data })
    }

    /// Renders the value as it appears in the textual document. References
    /// go through the resolver when one is present and fall back to their
    /// hex id form otherwise.
    pub fn render(&self, pool: &StringPool, resolver: Option<&ResourceResolver>) -> String {
        match self.data_type {
            ResType::NULL => String::new(),
            ResType::REFERENCE | ResType::ATTRIBUTE => resolver
                .and_then(|res| res.resolve_reference(self.data))
                .unwrap_or_else(|| format!("@0x{:x}", self.data)),
            ResType::STRING => {
                if (self.data as i32) >= 0 {
                    pool.get(self.data as usize).unwrap_or_default().to_owned()
                } else {
                    String::new()
                }
            }
            ResType::FLOAT => f32::from_bits(self.data).to_string(),
            ResType::DIMENSION => {
                let suffix = match self.data & 0xf {
                    0 => "px",
                    1 => "dp",
                    2 => "sp",
                    3 => "pt",
                    4 => "in",
                    5 => "mm",
                    _ => "unknown",
                };
                format!("{}{}", self.complex_value(), suffix)
            }
            ResType::FRACTION => {
                let suffix = match self.data & 0xf {
                    0 => "%",
                    1 => "%p",
                    _ => "unknown",
                };
                format!("{}{}", self.complex_value(), suffix)
            }
            ResType::INT_DEC => (self.data as i32).to_string(),
            ResType::INT_HEX => format!("0x{:x}", self.data),
            ResType::INT_BOOLEAN => {
                if self.data != 0 {
                    "true".to_owned()
                } else {
                    "false".to_owned()
                }
            }
            ResType::INT_COLOR_ARGB8 => format!("#{:08x}", self.data),
            ResType::INT_COLOR_RGB8 => format!("#{:06x}", self.data & 0x00ff_ffff),
            ResType::INT_COLOR_ARGB4 => format!("#{:04x}", self.data & 0xffff),
            ResType::INT_COLOR_RGB4 => format!("#{:03x}", self.data & 0x0fff),
            other => format!("{{{}:{}}}", other, self.data),
        }
    }

    fn complex_value(&self) -> f64 {
        f64::from((self.data & 0xffff_ff00) as i32) / 256.0
    }
}
