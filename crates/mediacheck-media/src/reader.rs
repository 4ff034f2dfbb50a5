//! Bounded cursor reader over an immutable byte buffer.
//!
//! Every read checks the remaining length first, so a failed read leaves the
//! cursor where it was. Media parsing always uses [`Endian::Big`]; little
//! endian is available for callers that decode other payloads.

use crate::{Error, Result};

/// Byte order for multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Cursor-based reader over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

macro_rules! read_fixed {
    ($name:ident, $ty:ty, $width:expr) => {
        #[doc = concat!("Read a `", stringify!($ty), "` and advance the cursor.")]
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes = self.take($width)?;
            let mut raw = [0u8; $width];
            raw.copy_from_slice(bytes);
            Ok(match self.endian {
                Endian::Big => <$ty>::from_be_bytes(raw),
                Endian::Little => <$ty>::from_le_bytes(raw),
            })
        }
    };
}

impl<'a> ByteReader<'a> {
    /// Create a reader with the given byte order.
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            position: 0,
            endian,
        }
    }

    /// Create a big-endian reader.
    pub fn big_endian(data: &'a [u8]) -> Self {
        Self::new(data, Endian::Big)
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// The whole underlying buffer, independent of the cursor.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Move the cursor to an absolute position.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::out_of_bounds(self.position, position - self.position, self.len()));
        }
        self.position = position;
        Ok(())
    }

    /// Advance the cursor without reading.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Return a view of the next `count` bytes and advance past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    read_fixed!(read_u16, u16, 2);
    read_fixed!(read_u32, u32, 4);
    read_fixed!(read_u64, u64, 8);
    read_fixed!(read_i16, i16, 2);
    read_fixed!(read_i32, i32, 4);
    read_fixed!(read_i64, i64, 8);

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    /// Read a four-character code.
    pub fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        let bytes = self.take(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read a 64-bit value into a `usize`, for sizes and offsets.
    pub fn read_u64_as_usize(&mut self) -> Result<usize> {
        let value = self.read_u64()?;
        usize::try_from(value).map_err(|_| Error::Overflow("64-bit size exceeds usize"))
    }

    /// Read a NUL-terminated UTF-8 string and advance past the terminator.
    ///
    /// A string that does not decode cleanly yields an empty string. A
    /// missing terminator consumes the rest of the buffer.
    pub fn read_terminated_string(&mut self) -> String {
        let rest = &self.data[self.position..];
        let (raw, consumed) = match rest.iter().position(|&b| b == 0) {
            Some(nul) => (&rest[..nul], nul + 1),
            None => (rest, rest.len()),
        };
        self.position += consumed;

        let decoded = String::from_utf8_lossy(raw);
        if decoded.contains(char::REPLACEMENT_CHARACTER) {
            return String::new();
        }
        decoded.into_owned()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| Error::out_of_bounds(self.position, count, self.data.len()))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}
