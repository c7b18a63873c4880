//! Chunk type tags and headers.

use std::fmt;

/// Size of a chunk header: `u32` type followed by `i32` body length.
pub const HEADER_SIZE: usize = 8;

/// Bit that marks a chunk whose body is a sequence of child chunks.
pub const PARENT_FLAG: u32 = 0x8000_0000;

/// Alignment of structured leaf bodies.
pub const DATA_ALIGNMENT: usize = 0x10;

/// Alignment of vertex buffer bodies and of part chunks.
pub const VERTEX_ALIGNMENT: usize = 0x80;

/// Alignment of the total file length.
pub const FILE_ALIGNMENT: usize = 0x1000;

/// A chunk type tag.
///
/// Tags the codec does not know are preserved as [`ChunkType::Unknown`]; the
/// parent flag still applies to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ChunkType {
    Null,
    Geometry,
    Parts,
    PartsDesc,
    PartsHash,
    PartsOffset,
    PartsEmpty,
    Part,
    PartDesc,
    PartTextures,
    PartShaders,
    PartMountPoints,
    PartData,
    PartDataDesc,
    PartDataVertices,
    PartDataGroups,
    PartDataIndices,
    PartDataMaterialName,
    Unknown(u32),
}

impl ChunkType {
    /// Decode a raw tag.
    pub const fn from_raw(value: u32) -> Self {
        match value {
            0x0000_0000 => Self::Null,
            0x8013_4000 => Self::Geometry,
            0x8013_4001 => Self::Parts,
            0x0013_4002 => Self::PartsDesc,
            0x0013_4003 => Self::PartsHash,
            0x0013_4004 => Self::PartsOffset,
            0x8013_4008 => Self::PartsEmpty,
            0x8013_4010 => Self::Part,
            0x0013_4011 => Self::PartDesc,
            0x0013_4012 => Self::PartTextures,
            0x0013_4013 => Self::PartShaders,
            0x0013_401A => Self::PartMountPoints,
            0x8013_4100 => Self::PartData,
            0x0013_4900 => Self::PartDataDesc,
            0x0013_4B01 => Self::PartDataVertices,
            0x0013_4B02 => Self::PartDataGroups,
            0x0013_4B03 => Self::PartDataIndices,
            0x0013_4C02 => Self::PartDataMaterialName,
            other => Self::Unknown(other),
        }
    }

    /// The raw tag written to disk.
    pub const fn raw(self) -> u32 {
        match self {
            Self::Null => 0x0000_0000,
            Self::Geometry => 0x8013_4000,
            Self::Parts => 0x8013_4001,
            Self::PartsDesc => 0x0013_4002,
            Self::PartsHash => 0x0013_4003,
            Self::PartsOffset => 0x0013_4004,
            Self::PartsEmpty => 0x8013_4008,
            Self::Part => 0x8013_4010,
            Self::PartDesc => 0x0013_4011,
            Self::PartTextures => 0x0013_4012,
            Self::PartShaders => 0x0013_4013,
            Self::PartMountPoints => 0x0013_401A,
            Self::PartData => 0x8013_4100,
            Self::PartDataDesc => 0x0013_4900,
            Self::PartDataVertices => 0x0013_4B01,
            Self::PartDataGroups => 0x0013_4B02,
            Self::PartDataIndices => 0x0013_4B03,
            Self::PartDataMaterialName => 0x0013_4C02,
            Self::Unknown(value) => value,
        }
    }

    /// Whether the body of this chunk is a sequence of child chunks.
    pub const fn is_parent(self) -> bool {
        self.raw() & PARENT_FLAG != 0
    }
}

impl From<u32> for ChunkType {
    fn from(value: u32) -> Self {
        Self::from_raw(value)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(value) => write!(f, "Unknown(0x{:08X})", value),
            other => write!(f, "{:?}(0x{:08X})", other, other.raw()),
        }
    }
}

/// A chunk header together with its absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    /// Absolute offset of the header.
    pub offset: usize,
    /// Body length, excluding the header.
    pub length: usize,
}

impl ChunkHeader {
    /// Absolute offset of the first body byte.
    pub const fn body_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    /// Absolute offset one past the last body byte.
    pub const fn end_offset(&self) -> usize {
        self.offset + HEADER_SIZE + self.length
    }

    /// Header plus body length.
    pub const fn raw_length(&self) -> usize {
        self.length + HEADER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_flag() {
        assert!(ChunkType::Geometry.is_parent());
        assert!(ChunkType::PartsEmpty.is_parent());
        assert!(ChunkType::PartData.is_parent());
        assert!(!ChunkType::PartDesc.is_parent());
        assert!(!ChunkType::Null.is_parent());
        assert!(ChunkType::Unknown(0x8003_4020).is_parent());
        assert!(!ChunkType::Unknown(0x0013_4017).is_parent());
    }

    #[test]
    fn test_raw_tags_round_trip() {
        for raw in [0x8013_4000, 0x0013_4004, 0x0013_401A, 0x0013_4B01, 0x1234_5678] {
            assert_eq!(ChunkType::from_raw(raw).raw(), raw);
        }
        assert_eq!(ChunkType::from(0x0013_4B03), ChunkType::PartDataIndices);
    }

    #[test]
    fn test_header_offsets() {
        let header = ChunkHeader {
            chunk_type: ChunkType::Part,
            offset: 0x80,
            length: 0x40,
        };
        assert_eq!(header.body_offset(), 0x88);
        assert_eq!(header.end_offset(), 0xC8);
        assert_eq!(header.raw_length(), 0x48);
    }
}
