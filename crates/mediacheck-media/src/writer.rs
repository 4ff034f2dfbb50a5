//! In-place mutation of a byte buffer at absolute offsets.
//!
//! Only the timescale rewrite utilities write into segment buffers; the
//! decode path never mutates its input.

use crate::reader::Endian;
use crate::{Error, Result};

/// Writes fixed-width integers into a mutable buffer without a cursor.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    data: &'a mut [u8],
    endian: Endian,
}

macro_rules! fixed_access {
    ($get:ident, $set:ident, $ty:ty, $width:expr) => {
        #[doc = concat!("Read a `", stringify!($ty), "` at `offset`.")]
        pub fn $get(&self, offset: usize) -> Result<$ty> {
            let range = self.range(offset, $width)?;
            let mut raw = [0u8; $width];
            raw.copy_from_slice(&self.data[range]);
            Ok(match self.endian {
                Endian::Big => <$ty>::from_be_bytes(raw),
                Endian::Little => <$ty>::from_le_bytes(raw),
            })
        }

        #[doc = concat!("Write a `", stringify!($ty), "` at `offset`.")]
        pub fn $set(&mut self, offset: usize, value: $ty) -> Result<()> {
            let range = self.range(offset, $width)?;
            let raw = match self.endian {
                Endian::Big => value.to_be_bytes(),
                Endian::Little => value.to_le_bytes(),
            };
            self.data[range].copy_from_slice(&raw);
            Ok(())
        }
    };
}

impl<'a> ByteWriter<'a> {
    pub fn new(data: &'a mut [u8], endian: Endian) -> Self {
        Self { data, endian }
    }

    pub fn big_endian(data: &'a mut [u8]) -> Self {
        Self::new(data, Endian::Big)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_u8(&self, offset: usize) -> Result<u8> {
        let range = self.range(offset, 1)?;
        Ok(self.data[range.start])
    }

    pub fn set_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        let range = self.range(offset, 1)?;
        self.data[range.start] = value;
        Ok(())
    }

    fixed_access!(get_u16, set_u16, u16, 2);
    fixed_access!(get_u32, set_u32, u32, 4);
    fixed_access!(get_u64, set_u64, u64, 8);
    fixed_access!(get_i32, set_i32, i32, 4);

    fn range(&self, offset: usize, width: usize) -> Result<std::ops::Range<usize>> {
        offset
            .checked_add(width)
            .filter(|&end| end <= self.data.len())
            .map(|end| offset..end)
            .ok_or_else(|| Error::out_of_bounds(offset, width, self.data.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut data = [0u8; 12];
        let mut writer = ByteWriter::big_endian(&mut data);
        writer.set_u32(0, 0xDEAD_BEEF).unwrap();
        writer.set_u64(4, 90_000).unwrap();
        assert_eq!(writer.get_u32(0).unwrap(), 0xDEAD_BEEF);
        assert_eq!(writer.get_u64(4).unwrap(), 90_000);
        assert_eq!(&data[0..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_write_past_end_fails_without_change() {
        let mut data = [0u8; 6];
        let mut writer = ByteWriter::big_endian(&mut data);
        assert!(writer.set_u32(3, 1).is_err());
        assert!(writer.set_u8(6, 1).is_err());
        assert_eq!(data, [0u8; 6]);
    }
}
