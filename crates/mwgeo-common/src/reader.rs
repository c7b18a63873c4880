//! Little-endian reading of source meshes and geometry files.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// Round `value` up to the next multiple of `alignment`.
///
/// An `alignment` of zero or one leaves the value unchanged.
#[inline]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return value;
    }
    match value % alignment {
        0 => value,
        rem => value + (alignment - rem),
    }
}

/// Little-endian cursor over a byte slice.
///
/// Positions are absolute offsets into the slice. Chunk body alignment in
/// geometry files is relative to the start of the file, so the reader never
/// rebases.
///
/// # Example
///
/// ```
/// use mwgeo_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x80, 0x3F];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_f32().unwrap(), 1.0);
/// assert_eq!(reader.remaining(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

macro_rules! read_le {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty;)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                let bytes = self.take(std::mem::size_of::<$ty>())?;
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

impl<'a> BinaryReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the current position.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move to an absolute offset. Reads past the end fail, seeking does not.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Skip to the next multiple of `alignment`.
    #[inline]
    pub fn align(&mut self, alignment: usize) {
        self.position = align_up(self.position, alignment);
    }

    /// Consume `count` bytes.
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if available < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available,
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    read_le! {
        read_u16 -> u16;
        read_i16 -> i16;
        read_u32 -> u32;
        read_i32 -> i32;
        read_f32 -> f32;
    }

    /// Read a fixed-size text field, cut at the first NUL.
    pub fn read_string_in_buffer(&mut self, size: usize) -> Result<&'a str> {
        let bytes = self.take(size)?;
        let end = memchr::memchr(0, bytes).unwrap_or(size);
        Ok(std::str::from_utf8(&bytes[..end])?)
    }

    /// Read a NUL-terminated name stored in whole 4-byte blocks.
    ///
    /// Blocks are consumed up to and including the first one holding a NUL.
    pub fn read_padded_string(&mut self) -> Result<&'a str> {
        let start = self.position;
        let rest = &self.data[start.min(self.data.len())..];
        let end = memchr::memchr(0, rest).ok_or(Error::MissingNullTerminator)?;

        let padded = align_up(end + 1, 4);
        if padded > rest.len() {
            return Err(Error::MissingNullTerminator);
        }
        self.position = start + padded;
        Ok(std::str::from_utf8(&rest[..end])?)
    }

    /// Read one on-disk record.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.take(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read `count` consecutive records.
    pub fn read_array<T: FromBytes>(&mut self, count: usize) -> Result<Vec<T>> {
        let size = std::mem::size_of::<T>().max(1);
        let mut items = Vec::with_capacity(count.min(self.remaining() / size));
        for _ in 0..count {
            items.push(self.read_struct::<T>()?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0xFE, 0xFF, // i16: -2
            0x34, 0x12, // u16: 0x1234
            0xFF, 0xFF, 0xFF, 0xFF, // i32: -1
        ];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_padded_string() {
        let data = b"BASE_A\0\0ABCD\0\0\0\0tail";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_padded_string().unwrap(), "BASE_A");
        assert_eq!(reader.position(), 8);
        // A name filling a whole block is followed by a block of nulls.
        assert_eq!(reader.read_padded_string().unwrap(), "ABCD");
        assert_eq!(reader.position(), 16);
        assert!(matches!(
            reader.read_padded_string(),
            Err(Error::MissingNullTerminator)
        ));
    }

    #[test]
    fn test_read_string_in_buffer() {
        let mut data = [0u8; 16];
        data[..7].copy_from_slice(b"DEFAULT");
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_string_in_buffer(16).unwrap(), "DEFAULT");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_align() {
        let data = [0u8; 64];
        let mut reader = BinaryReader::new(&data);
        reader.seek(9);
        reader.align(0x10);
        assert_eq!(reader.position(), 0x10);
        reader.align(0x10);
        assert_eq!(reader.position(), 0x10);

        assert_eq!(align_up(0, 0x80), 0);
        assert_eq!(align_up(0x81, 0x80), 0x100);
        assert_eq!(align_up(5, 1), 5);
    }

    #[test]
    fn test_read_array() {
        let data = [1u8, 0, 0, 0, 2, 0, 0, 0];
        let mut reader = BinaryReader::new(&data);
        let values: Vec<u32> = reader.read_array(2).unwrap();
        assert_eq!(values, [1, 2]);

        let mut reader = BinaryReader::new(&data);
        assert!(reader.read_array::<u32>(3).is_err());
    }

    #[test]
    fn test_eof_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        match reader.read_u32() {
            Err(Error::UnexpectedEof { needed, available }) => {
                assert_eq!((needed, available), (4, 2));
            }
            other => panic!("expected eof, got {:?}", other),
        }
        // A failed read leaves the position untouched.
        assert_eq!(reader.position(), 0);
    }
}
