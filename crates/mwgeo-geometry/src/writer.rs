//! Chunk tree writer.
//!
//! Every open chunk collects its body in its own buffer. Closing a chunk
//! takes the length straight from that buffer and appends header and body to
//! the parent, so no header is ever revisited.
//!
//! The part directory precedes the parts it describes. Each part chunk is
//! therefore built on its own first; since parts start on a 0x80 boundary
//! and nothing inside a part needs coarser alignment, its bytes are the same
//! wherever it lands, and the directory can be computed before writing.

use byteorder::{LittleEndian, WriteBytesExt};
use mwgeo_common::{align_up, NameHash, Vector2};
use zerocopy::{Immutable, IntoBytes};

use crate::chunk::{
    ChunkHeader, ChunkType, DATA_ALIGNMENT, FILE_ALIGNMENT, HEADER_SIZE, VERTEX_ALIGNMENT,
};
use crate::model::{Part, PartData, Vertex};
use crate::records::{
    DirectoryRecord, GeometryInfoRecord, HashRecord, MountPointRecord, PartDataDescRecord,
    PartInfoRecord, ShadingGroupRecord, PART_DATA_VERSION,
};
use crate::{Error, GeometryFile, Result};

#[derive(Debug)]
struct OpenChunk {
    chunk_type: ChunkType,
    offset: usize,
    body: Vec<u8>,
}

/// An in-memory chunk tree builder.
#[derive(Debug, Default)]
pub struct ChunkWriter {
    output: Vec<u8>,
    stack: Vec<OpenChunk>,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute position the next byte will land at.
    pub fn position(&self) -> usize {
        match self.stack.last() {
            Some(open) => open.offset + HEADER_SIZE + open.body.len(),
            None => self.output.len(),
        }
    }

    /// Number of chunks currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn out(&mut self) -> &mut Vec<u8> {
        match self.stack.last_mut() {
            Some(open) => &mut open.body,
            None => &mut self.output,
        }
    }

    /// Open a chunk; everything written until the matching
    /// [`end_chunk`](Self::end_chunk) becomes its body.
    pub fn begin_chunk(&mut self, chunk_type: ChunkType) -> usize {
        let offset = self.position();
        self.stack.push(OpenChunk {
            chunk_type,
            offset,
            body: Vec::new(),
        });
        log::trace!("begin {} at {:#x}", chunk_type, offset);
        offset
    }

    /// Close the innermost open chunk and append it to its parent.
    pub fn end_chunk(&mut self) -> Result<ChunkHeader> {
        let open = self.stack.pop().ok_or(Error::ChunkStackUnderflow)?;
        let length = open.body.len();
        let raw_length = i32::try_from(length).map_err(|_| Error::Overflow {
            what: "chunk length",
            value: length,
        })?;

        let out = self.out();
        out.write_u32::<LittleEndian>(open.chunk_type.raw())?;
        out.write_i32::<LittleEndian>(raw_length)?;
        out.extend_from_slice(&open.body);

        log::trace!("end {} at {:#x} ({} bytes)", open.chunk_type, open.offset, length);
        Ok(ChunkHeader {
            chunk_type: open.chunk_type,
            offset: open.offset,
            length,
        })
    }

    /// Write one complete chunk whose body is produced by `body`.
    pub fn chunk<F>(&mut self, chunk_type: ChunkType, body: F) -> Result<ChunkHeader>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.begin_chunk(chunk_type);
        body(self)?;
        self.end_chunk()
    }

    /// Zero-fill up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        let padding = align_up(self.position(), alignment) - self.position();
        self.write_zeros(padding);
    }

    /// Insert a padding chunk if the position is not a multiple of `alignment`.
    ///
    /// The padding chunk's header counts toward the alignment, so when the
    /// header alone reaches the boundary its body is empty.
    pub fn pad_to(&mut self, alignment: usize) -> Result<()> {
        if self.position() % alignment != 0 {
            self.begin_chunk(ChunkType::Null);
            self.align(alignment);
            self.end_chunk()?;
        }
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.out().write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.out().write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.out().write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.out().extend_from_slice(bytes);
    }

    pub fn write_zeros(&mut self, count: usize) {
        let out = self.out();
        out.resize(out.len() + count, 0);
    }

    /// Write a record in its on-disk layout.
    pub fn write_record<T: IntoBytes + Immutable>(&mut self, record: &T) {
        self.out().extend_from_slice(record.as_bytes());
    }

    /// Write a NUL-terminated string padded to a multiple of 4 bytes.
    ///
    /// A string whose length is already a multiple of 4 gets a full block
    /// of NULs, so a terminator is always present.
    pub fn write_padded_string(&mut self, s: &str) {
        let padding = 4 - s.len() % 4;
        self.write_bytes(s.as_bytes());
        self.write_zeros(padding);
    }

    /// Return the finished bytes. Fails if any chunk is still open.
    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.stack.is_empty() {
            return Err(Error::UnclosedChunks(self.stack.len()));
        }
        Ok(self.output)
    }
}

/// Position after [`ChunkWriter::pad_to`] at `position`.
fn padded_position(position: usize, alignment: usize) -> usize {
    if position % alignment == 0 {
        position
    } else {
        align_up(position + HEADER_SIZE, alignment)
    }
}

fn to_u32(what: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Overflow { what, value })
}

fn table_count(part: &Part, what: &'static str, count: usize) -> Result<u8> {
    u8::try_from(count).map_err(|_| Error::TooManyEntries {
        part: part.name().to_string(),
        what,
        count,
    })
}

/// Write the part list chunk. Its size does not depend on the directory
/// contents, only on the number of entries.
fn write_part_list(
    w: &mut ChunkWriter,
    file: &GeometryFile,
    hashes: &[NameHash],
    directory: &[DirectoryRecord],
) -> Result<()> {
    let part_count = to_u32("part count", hashes.len())?;

    w.begin_chunk(ChunkType::Parts);
    w.chunk(ChunkType::PartsDesc, |w| {
        w.write_record(&GeometryInfoRecord::new(file.info(), part_count));
        Ok(())
    })?;
    w.chunk(ChunkType::PartsHash, |w| {
        for &hash in hashes {
            w.write_record(&HashRecord::new(hash));
        }
        Ok(())
    })?;
    w.chunk(ChunkType::PartsOffset, |w| {
        for record in directory {
            w.write_record(record);
        }
        Ok(())
    })?;
    w.chunk(ChunkType::PartsEmpty, |_| Ok(()))?;
    w.end_chunk()?;
    Ok(())
}

/// Serialize a geometry file into its exact on-disk bytes.
pub(crate) fn write_file(file: &GeometryFile) -> Result<Vec<u8>> {
    let parts = file.parts();

    let mut hashes: Vec<_> = parts.iter().map(Part::hash).collect();
    hashes.sort();

    let chunks = parts
        .iter()
        .map(|part| {
            let mut w = ChunkWriter::new();
            write_part(&mut w, part)?;
            w.finish()
        })
        .collect::<Result<Vec<_>>>()?;

    // Lay out the file with an empty directory to find where parts land.
    let mut layout = ChunkWriter::new();
    layout.begin_chunk(ChunkType::Geometry);
    layout.pad_to(DATA_ALIGNMENT)?;
    write_part_list(&mut layout, file, &hashes, &vec![DirectoryRecord::default(); parts.len()])?;

    let mut position = layout.position();
    let mut directory = Vec::with_capacity(parts.len());
    for (part, bytes) in parts.iter().zip(&chunks) {
        position = padded_position(position, VERTEX_ALIGNMENT);
        let length = to_u32("part length", bytes.len())?;
        directory.push(DirectoryRecord {
            hash: part.hash().value(),
            offset: to_u32("part offset", position)?,
            length,
            length_again: length,
            reserved: [0; 2],
        });
        log::debug!(
            "part {} ({}) at {:#x}, {} bytes",
            part.name(),
            part.hash(),
            position,
            bytes.len()
        );
        position += bytes.len();
    }
    // Stable sort keeps insertion order for duplicate hashes.
    directory.sort_by_key(|record| record.hash);

    let mut w = ChunkWriter::new();
    w.begin_chunk(ChunkType::Geometry);
    w.pad_to(DATA_ALIGNMENT)?;
    write_part_list(&mut w, file, &hashes, &directory)?;
    for bytes in &chunks {
        w.pad_to(VERTEX_ALIGNMENT)?;
        w.write_bytes(bytes);
    }
    w.end_chunk()?;

    w.pad_to(FILE_ALIGNMENT)?;
    w.finish()
}

fn write_part(w: &mut ChunkWriter, part: &Part) -> Result<ChunkHeader> {
    let info = &part.info;
    let data: &PartData = &part.data;

    data.check_consistency()
        .map_err(|message| Error::InconsistentPart {
            part: part.name().to_string(),
            message,
        })?;
    let texture_count = table_count(part, "textures", info.textures.len())?;
    let shader_count = table_count(part, "shaders", info.shaders.len())?;

    w.begin_chunk(ChunkType::Part);

    w.chunk(ChunkType::PartDesc, |w| {
        w.align(DATA_ALIGNMENT);
        w.write_record(&PartInfoRecord::new(info, texture_count, shader_count));
        w.write_padded_string(&info.name);
        Ok(())
    })?;
    w.chunk(ChunkType::PartTextures, |w| {
        for &hash in &info.textures {
            w.write_record(&HashRecord::new(hash));
        }
        Ok(())
    })?;
    w.chunk(ChunkType::PartShaders, |w| {
        for &hash in &info.shaders {
            w.write_record(&HashRecord::new(hash));
        }
        Ok(())
    })?;
    if !info.mount_points.is_empty() {
        w.chunk(ChunkType::PartMountPoints, |w| {
            w.align(DATA_ALIGNMENT);
            for mount in &info.mount_points {
                w.write_record(&MountPointRecord::from(mount));
            }
            Ok(())
        })?;
    }

    w.begin_chunk(ChunkType::PartData);
    w.chunk(ChunkType::PartDataDesc, |w| {
        w.align(DATA_ALIGNMENT);
        w.write_record(&PartDataDescRecord {
            reserved: [0; 2],
            version: PART_DATA_VERSION,
            flags: data.flags,
            group_count: to_u32("group count", data.groups.len())?,
            reserved1: 0,
            vertex_buffer_count: 1,
            reserved2: [0; 4],
            index_count: to_u32("index count", data.indices.len())?,
        });
        Ok(())
    })?;
    w.chunk(ChunkType::PartDataGroups, |w| {
        w.align(DATA_ALIGNMENT);
        for group in &data.groups {
            w.write_record(&ShadingGroupRecord::from(group));
        }
        Ok(())
    })?;
    w.chunk(ChunkType::PartDataIndices, |w| {
        w.align(DATA_ALIGNMENT);
        for &index in &data.indices {
            w.write_u16(index)?;
        }
        Ok(())
    })?;
    for name in &data.material_names {
        w.chunk(ChunkType::PartDataMaterialName, |w| {
            w.write_padded_string(name);
            Ok(())
        })?;
    }
    w.chunk(ChunkType::PartDataVertices, |w| {
        w.align(VERTEX_ALIGNMENT);
        for vertex in &data.vertices {
            write_vertex(w, vertex, data.uv_channels)?;
        }
        Ok(())
    })?;
    w.end_chunk()?;

    w.end_chunk()
}

fn write_vertex(w: &mut ChunkWriter, vertex: &Vertex, uv_channels: usize) -> Result<()> {
    w.write_record(&vertex.position);
    w.write_record(&vertex.normal);
    w.write_u32(vertex.diffuse)?;
    for uv in &vertex.uv[..uv_channels] {
        w.write_record::<Vector2>(uv);
    }
    Ok(())
}
