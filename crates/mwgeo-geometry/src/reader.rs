//! Recursive chunk tree reader.

use mwgeo_common::{BinaryReader, NameHash, Vector2, Vector3};

use crate::chunk::{ChunkHeader, ChunkType, DATA_ALIGNMENT, HEADER_SIZE, VERTEX_ALIGNMENT};
use crate::model::{
    DirectoryEntry, GeometryInfo, MountPoint, Part, PartData, PartInfo, ShadingGroup, Vertex,
    MAX_UV_CHANNELS,
};
use crate::records::{
    DirectoryRecord, GeometryInfoRecord, HashRecord, MountPointRecord, PartDataDescRecord,
    PartInfoRecord, ShadingGroupRecord,
};
use crate::{Error, GeometryFile, Result};

/// Options for decoding a geometry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Texture coordinate pairs per vertex. The file does not record this.
    pub uv_channels: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { uv_channels: 1 }
    }
}

/// A part whose leaves are still being decoded.
struct PendingPart {
    info: PartInfo,
    data: PartData,
    texture_count: usize,
    shader_count: usize,
    group_count: usize,
    index_count: usize,
}

struct Decoder<'a> {
    reader: BinaryReader<'a>,
    uv_channels: usize,
    info: GeometryInfo,
    hashes: Vec<NameHash>,
    directory: Vec<DirectoryEntry>,
    parts: Vec<PendingPart>,
}

/// Decode a geometry file from its bytes.
pub(crate) fn read_file(data: &[u8], options: &ReadOptions) -> Result<GeometryFile> {
    let mut decoder = Decoder {
        reader: BinaryReader::new(data),
        uv_channels: options.uv_channels.clamp(1, MAX_UV_CHANNELS),
        info: GeometryInfo::default(),
        hashes: Vec::new(),
        directory: Vec::new(),
        parts: Vec::new(),
    };
    decoder.read_children(data.len())?;

    let parts = decoder
        .parts
        .into_iter()
        .map(|pending| Part::new(pending.info, pending.data))
        .collect();
    Ok(GeometryFile::from_parts_with_index(
        decoder.info,
        parts,
        decoder.hashes,
        decoder.directory,
    ))
}

impl<'a> Decoder<'a> {
    /// Decode consecutive chunks until `end`.
    fn read_children(&mut self, end: usize) -> Result<()> {
        while self.reader.position() < end {
            let header = self.read_header(end)?;
            if header.chunk_type.is_parent() {
                if header.chunk_type == ChunkType::Part {
                    self.parts.push(PendingPart {
                        info: PartInfo::new(NameHash::from_raw(0), String::new()),
                        data: PartData::new(0),
                        texture_count: 0,
                        shader_count: 0,
                        group_count: 0,
                        index_count: 0,
                    });
                }
                if let ChunkType::Unknown(_) = header.chunk_type {
                    log::trace!("descending into {} at {:#x}", header.chunk_type, header.offset);
                }
                self.read_children(header.end_offset())?;
            } else {
                self.read_leaf(&header)?;
            }
            self.reader.seek(header.end_offset());
        }
        Ok(())
    }

    fn read_header(&mut self, end: usize) -> Result<ChunkHeader> {
        let offset = self.reader.position();
        let chunk_type = ChunkType::from_raw(self.reader.read_u32()?);
        let length = self.reader.read_i32()?;

        let header = usize::try_from(length).ok().map(|length| ChunkHeader {
            chunk_type,
            offset,
            length,
        });
        match header {
            Some(header) if header.end_offset() <= end => Ok(header),
            _ => Err(Error::InvalidChunkLength {
                chunk_type,
                offset,
                length,
            }),
        }
    }

    fn current_part(&mut self, header: &ChunkHeader) -> Result<&mut PendingPart> {
        self.parts.last_mut().ok_or(Error::OrphanLeaf {
            chunk_type: header.chunk_type,
            offset: header.offset,
        })
    }

    fn read_leaf(&mut self, header: &ChunkHeader) -> Result<()> {
        match header.chunk_type {
            ChunkType::PartsDesc => {
                let record: GeometryInfoRecord = self.reader.read_struct()?;
                self.info = record.to_model();
            }
            ChunkType::PartsHash => {
                let count = header.length / std::mem::size_of::<HashRecord>();
                let records: Vec<HashRecord> = self.reader.read_array(count)?;
                self.hashes = records
                    .iter()
                    .map(|r| NameHash::from_raw(r.hash))
                    .collect();
            }
            ChunkType::PartsOffset => {
                let count = header.length / std::mem::size_of::<DirectoryRecord>();
                let records: Vec<DirectoryRecord> = self.reader.read_array(count)?;
                self.directory = records
                    .iter()
                    .map(|r| DirectoryEntry {
                        hash: NameHash::from_raw(r.hash),
                        offset: r.offset,
                        length: r.length,
                    })
                    .collect();
            }
            ChunkType::PartDesc => {
                self.reader.align(DATA_ALIGNMENT);
                let record: PartInfoRecord = self.reader.read_struct()?;
                let name = self.reader.read_padded_string()?.to_string();
                let part = self.current_part(header)?;
                part.texture_count = record.texture_count as usize;
                part.shader_count = record.shader_count as usize;
                part.info = record.to_model(name);
            }
            ChunkType::PartTextures => {
                let count = self.current_part(header)?.texture_count;
                self.ensure_fits(header, count, std::mem::size_of::<HashRecord>())?;
                let hashes = self.read_hashes(count)?;
                self.current_part(header)?.info.textures = hashes;
            }
            ChunkType::PartShaders => {
                let count = self.current_part(header)?.shader_count;
                self.ensure_fits(header, count, std::mem::size_of::<HashRecord>())?;
                let hashes = self.read_hashes(count)?;
                self.current_part(header)?.info.shaders = hashes;
            }
            ChunkType::PartMountPoints => {
                self.reader.align(DATA_ALIGNMENT);
                let remaining = header.end_offset().saturating_sub(self.reader.position());
                let count = remaining / std::mem::size_of::<MountPointRecord>();
                let records: Vec<MountPointRecord> = self.reader.read_array(count)?;
                self.current_part(header)?.info.mount_points =
                    records.iter().map(MountPoint::from).collect();
            }
            ChunkType::PartDataDesc => {
                self.reader.align(DATA_ALIGNMENT);
                let record: PartDataDescRecord = self.reader.read_struct()?;
                let part = self.current_part(header)?;
                part.data.flags = record.flags;
                part.group_count = record.group_count as usize;
                part.index_count = record.index_count as usize;
            }
            ChunkType::PartDataGroups => {
                self.reader.align(DATA_ALIGNMENT);
                let count = self.current_part(header)?.group_count;
                self.ensure_fits(header, count, std::mem::size_of::<ShadingGroupRecord>())?;
                let records: Vec<ShadingGroupRecord> = self.reader.read_array(count)?;
                self.current_part(header)?.data.groups =
                    records.iter().map(ShadingGroup::from).collect();
            }
            ChunkType::PartDataIndices => {
                self.reader.align(DATA_ALIGNMENT);
                let count = self.current_part(header)?.index_count;
                self.ensure_fits(header, count, std::mem::size_of::<u16>())?;
                let mut indices = Vec::with_capacity(count);
                for _ in 0..count {
                    indices.push(self.reader.read_u16()?);
                }
                self.current_part(header)?.data.indices = indices;
            }
            ChunkType::PartDataVertices => {
                self.reader.align(VERTEX_ALIGNMENT);
                let uv_channels = self.uv_channels;
                let count = self.current_part(header)?.data.declared_vertex_count();
                self.ensure_fits(header, count, vertex_size(uv_channels))?;
                let mut vertices = Vec::with_capacity(count);
                for _ in 0..count {
                    vertices.push(self.read_vertex(uv_channels)?);
                }
                let part = self.current_part(header)?;
                part.data.uv_channels = uv_channels;
                part.data.vertices = vertices;
            }
            ChunkType::PartDataMaterialName => {
                let name = self.reader.read_padded_string()?.to_string();
                self.current_part(header)?.data.material_names.push(name);
            }
            ChunkType::Null => {}
            other => {
                log::trace!(
                    "skipping {} at {:#x} ({} bytes)",
                    other,
                    header.offset,
                    header.length + HEADER_SIZE
                );
            }
        }
        Ok(())
    }

    /// Fail unless `count` records of `size` bytes end inside the leaf.
    fn ensure_fits(&self, header: &ChunkHeader, count: usize, size: usize) -> Result<()> {
        let fits = count
            .checked_mul(size)
            .and_then(|bytes| bytes.checked_add(self.reader.position()))
            .is_some_and(|end| end <= header.end_offset());
        if fits {
            return Ok(());
        }
        Err(Error::InvalidChunkLength {
            chunk_type: header.chunk_type,
            offset: header.offset,
            length: header.length as i32,
        })
    }

    fn read_hashes(&mut self, count: usize) -> Result<Vec<NameHash>> {
        let records: Vec<HashRecord> = self.reader.read_array(count)?;
        Ok(records.iter().map(|r| NameHash::from_raw(r.hash)).collect())
    }

    fn read_vertex(&mut self, uv_channels: usize) -> Result<Vertex> {
        let position: Vector3 = self.reader.read_struct()?;
        let normal: Vector3 = self.reader.read_struct()?;
        let diffuse = self.reader.read_u32()?;
        let mut uv = [Vector2::ZERO; MAX_UV_CHANNELS];
        for channel in uv.iter_mut().take(uv_channels) {
            *channel = self.reader.read_struct()?;
        }
        Ok(Vertex {
            position,
            normal,
            diffuse,
            uv,
        })
    }
}

/// On-disk size of one vertex.
fn vertex_size(uv_channels: usize) -> usize {
    2 * std::mem::size_of::<Vector3>()
        + std::mem::size_of::<u32>()
        + uv_channels * std::mem::size_of::<Vector2>()
}
