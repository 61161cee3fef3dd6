#![forbid(unsafe_code)]

//! Primitive byte stream for the binary chunk format.
//!
//! Commands write their fields through [`PrimitiveWriter`] and read them back
//! through [`PrimitiveReader`] in the same order. The encoding is:
//!
//! | Value        | Encoding                                        |
//! |--------------|-------------------------------------------------|
//! | `u8`/`bool`  | one byte (`bool` must be 0 or 1)                |
//! | integers     | fixed width, little-endian                      |
//! | `f64`        | IEEE-754 bits, little-endian                    |
//! | strings      | 7-bit varint byte length, then UTF-8 bytes      |
//! | byte blobs   | 7-bit varint length, then raw bytes             |
//!
//! The reader never panics on malformed input: every short read or invalid
//! value surfaces as a [`WireError`].

use thiserror::Error;

/// Failure to read a value from a primitive stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The stream ended before the value was complete.
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes required by the value being read.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },
    /// A string payload is not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// A boolean byte is neither 0 nor 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
    /// An enum discriminant byte is out of range.
    #[error("invalid tag byte {0:#04x}")]
    InvalidTag(u8),
    /// A varint length prefix does not fit in `usize`.
    #[error("length prefix overflows")]
    LengthOverflow,
}

/// Append-only writer of primitive values.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveWriter {
    buf: Vec<u8>,
}

impl PrimitiveWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_bits().to_le_bytes());
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Write a length-prefixed byte blob.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value);
    }

    fn write_len(&mut self, mut len: usize) {
        while len >= 0x80 {
            self.buf.push((len as u8) | 0x80);
            len >>= 7;
        }
        self.buf.push(len as u8);
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked reader over a byte slice.
#[derive(Debug, Clone)]
pub struct PrimitiveReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PrimitiveReader<'a> {
    /// Start reading at the beginning of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Check if every byte has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], WireError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(WireError::UnexpectedEof { needed, remaining });
        }
        let slice = &self.bytes[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(u64::from_le_bytes(self.take_array()?)))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, WireError> {
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8)
    }

    /// Read a length-prefixed byte blob.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_len()?;
        Ok(self.take(len)?.to_vec())
    }

    fn read_len(&mut self) -> Result<usize, WireError> {
        let mut len: usize = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            let chunk = usize::from(byte & 0x7f);
            if shift >= usize::BITS || (chunk << shift) >> shift != chunk {
                return Err(WireError::LengthOverflow);
            }
            len |= chunk << shift;
            if byte & 0x80 == 0 {
                return Ok(len);
            }
            shift += 7;
        }
    }
}
