use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("empty datagram")]
    Empty,
    #[error("unknown packet tag {0}")]
    UnknownTag(u8),
    #[error("truncated payload: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("malformed string length prefix")]
    BadStringLength,
    #[error("string field is not valid utf-8")]
    InvalidUtf8,
    #[error("invalid element count {0}")]
    InvalidCount(i32),
    #[error("unknown encounter kind {0}")]
    UnknownEncounterKind(i32),
}

/// Little-endian writer for the fixed-order message layout.
///
/// Strings carry a 7-bit variable-length byte count followed by UTF-8 bytes.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_count(&mut self, count: usize) {
        self.write_i32(i32::try_from(count).unwrap_or(i32::MAX));
    }

    pub fn write_str(&mut self, value: &str) {
        let mut len = value.len() as u32;
        while len >= 0x80 {
            self.buf.push((len as u8) | 0x80);
            len >>= 7;
        }
        self.buf.push(len as u8);
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], PacketError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(PacketError::Truncated { needed, remaining });
        }
        let slice = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], PacketError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, PacketError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32, PacketError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, PacketError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    /// Reads a repeat count and rejects values the rest of the datagram
    /// could not possibly hold, so a hostile count never drives an allocation.
    pub fn read_count(&mut self, min_element_size: usize) -> Result<usize, PacketError> {
        let raw = self.read_i32()?;
        let count = usize::try_from(raw).map_err(|_| PacketError::InvalidCount(raw))?;
        let needed = count.saturating_mul(min_element_size.max(1));
        if needed > self.remaining() {
            return Err(PacketError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    pub fn read_str(&mut self) -> Result<String, PacketError> {
        let mut len: u32 = 0;
        let mut shift = 0;
        loop {
            if shift > 28 {
                return Err(PacketError::BadStringLength);
            }
            let byte = self.read_u8()?;
            len |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| PacketError::InvalidUtf8)
    }
}
