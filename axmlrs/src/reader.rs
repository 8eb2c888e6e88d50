use nom::number::complete::{le_u16, le_u32, le_u8};

use crate::ParseError;

/// Cursored little-endian view over an immutable byte blob.
///
/// Unsigned values widen into the next larger integer on read so that
/// offsets and counts up to 2^32 stay representable without overflow.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn advance(&mut self, rest: &[u8]) {
        self.pos = self.data.len() - rest.len();
    }

    pub fn read_u8(&mut self) -> Result<u16, ParseError> {
        let (rest, v) =
            le_u8::<_, nom::error::Error<&[u8]>>(self.rest()).map_err(|_| ParseError::Truncated(self.pos))?;
        self.advance(rest);
        Ok(u16::from(v))
    }

    pub fn read_u16(&mut self) -> Result<u32, ParseError> {
        let (rest, v) =
            le_u16::<_, nom::error::Error<&[u8]>>(self.rest()).map_err(|_| ParseError::Truncated(self.pos))?;
        self.advance(rest);
        Ok(u32::from(v))
    }

    pub fn read_u32(&mut self) -> Result<u64, ParseError> {
        let (rest, v) =
            le_u32::<_, nom::error::Error<&[u8]>>(self.rest()).map_err(|_| ParseError::Truncated(self.pos))?;
        self.advance(rest);
        Ok(u64::from(v))
    }

    /// Reads a `u32` reference field that uses `0xffffffff` as "absent".
    pub fn read_ref(&mut self) -> Result<i32, ParseError> {
        Ok(self.read_u32()? as u32 as i32)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < n {
            return Err(ParseError::Truncated(self.pos));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: u64) -> Result<(), ParseError> {
        self.seek(self.pos as u64 + n)
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), ParseError> {
        if pos > self.data.len() as u64 {
            return Err(ParseError::Overflow(pos));
        }
        self.pos = pos as usize;
        Ok(())
    }

    /// One- or two-byte length prefix used by UTF-8 pool strings. A set high
    /// bit on the first byte extends the count into a second byte.
    pub fn read_length8(&mut self) -> Result<u32, ParseError> {
        let first = self.read_u8()?;
        if first & 0x80 != 0 {
            let second = self.read_u8()?;
            Ok((u32::from(first & 0x7f) << 8) | u32::from(second))
        } else {
            Ok(u32::from(first))
        }
    }

    /// Two- or four-byte length prefix used by UTF-16 pool strings.
    pub fn read_length16(&mut self) -> Result<u32, ParseError> {
        let first = self.read_u16()?;
        if first & 0x8000 != 0 {
            let second = self.read_u16()?;
            Ok(((first & 0x7fff) << 16) | second)
        } else {
            Ok(first)
        }
    }

    /// Decodes one length-prefixed pool string at the cursor.
    pub fn read_string(&mut self, utf8: bool) -> Result<String, ParseError> {
        if utf8 {
            let _char_count = self.read_length8()?;
            let byte_count = self.read_length8()?;
            let bytes = self.read_bytes(byte_count as usize)?;
            let s = String::from_utf8_lossy(bytes).into_owned();
            self.skip(1)?; // trailing NUL
            Ok(s)
        } else {
            let char_count = self.read_length16()?;
            let mut units = Vec::with_capacity(char_count as usize);
            for i in 0..char_count {
                let unit = self.read_u16()? as u16;
                if unit == 0 {
                    // Stop at an embedded terminator but keep the cursor at
                    // the position the declared count implies.
                    self.skip(u64::from(char_count - i - 1) * 2)?;
                    break;
                }
                units.push(unit);
            }
            Ok(String::from_utf16_lossy(&units))
        }
    }

    /// Reads `n` bytes and decodes them as ASCII, truncated at the first NUL.
    pub fn read_fixed_ascii(&mut self, n: usize) -> Result<String, ParseError> {
        let bytes = self.read_bytes(n)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(bytes[..end].iter().map(|&b| b as char).collect())
    }
}
