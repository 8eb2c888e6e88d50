use std::collections::HashMap;

use crate::chunks::{ChunkHeader, ChunkInfo};
use crate::reader::ByteReader;
use crate::ParseError;

const UTF8_FLAG: u32 = 1 << 8;

/// Random-access array of decoded strings materialised from a pool chunk.
///
/// Indices are shared by every chunk of the enclosing document; a decoded
/// pool may be retained across many decodings.
#[derive(Clone, Debug, Default)]
pub struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    pub fn empty() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn from_strings(strings: Vec<String>) -> Self {
        Self { strings }
    }

    /// Decodes a pool whose header was just read. `chunk_start` is the
    /// absolute offset of the chunk; on return the cursor sits at
    /// `chunk_start + chunk_size`.
    pub fn read(
        r: &mut ByteReader,
        chunk_start: u64,
        header: &ChunkHeader,
    ) -> Result<StringPool, ParseError> {
        let (string_count, flags, strings_start) = match header.info {
            ChunkInfo::StringPool {
                string_count,
                flags,
                strings_start,
                ..
            } => (string_count, flags, strings_start),
            _ => return Err(ParseError::UnexpectedChunkType(header.chunk_type)),
        };

        let utf8 = flags & UTF8_FLAG != 0;
        let strings_abs = chunk_start + u64::from(strings_start);

        let mut offsets = Vec::with_capacity(string_count as usize);
        for _ in 0..string_count {
            offsets.push(r.read_u32()? as u32);
        }

        // Obfuscated pools repeat offsets; decode each offset once and share
        // the value. An offset past the data is fatal for the whole decode.
        let mut decoded: HashMap<u32, usize> = HashMap::new();
        let mut strings: Vec<String> = Vec::with_capacity(offsets.len());
        for offset in offsets {
            if let Some(&i) = decoded.get(&offset) {
                let shared: String = strings[i].clone();
                strings.push(shared);
                continue;
            }
            r.seek(strings_abs + u64::from(offset))?;
            let s = r.read_string(utf8)?;
            decoded.insert(offset, strings.len());
            strings.push(s);
        }

        r.seek(chunk_start + u64::from(header.chunk_size))?;
        Ok(StringPool { strings })
    }

    pub fn get(&self, i: usize) -> Option<&str> {
        self.strings.get(i).map(String::as_str)
    }

    /// Looks up a signed string reference; negative references are absent.
    pub fn get_ref(&self, i: i32) -> Option<&str> {
        if i < 0 {
            None
        } else {
            self.get(i as usize)
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
