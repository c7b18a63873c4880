//! Geometry file handling.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use mwgeo_common::NameHash;

use crate::model::{DirectoryEntry, GeometryInfo, Part};
use crate::reader::{read_file, ReadOptions};
use crate::writer::write_file;
use crate::Result;

/// A compiled geometry file: a descriptor and an ordered list of parts.
///
/// Parts keep their insertion order in the chunk tree. The hash index and
/// offset directory are only populated for files that were read from bytes;
/// they are always regenerated, sorted by hash, when the file is written.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeometryFile {
    info: GeometryInfo,
    parts: Vec<Part>,
    hash_index: Vec<NameHash>,
    directory: Vec<DirectoryEntry>,
}

impl GeometryFile {
    /// Create an empty geometry file with the default descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts_with_index(
        info: GeometryInfo,
        parts: Vec<Part>,
        hash_index: Vec<NameHash>,
        directory: Vec<DirectoryEntry>,
    ) -> Self {
        Self {
            info,
            parts,
            hash_index,
            directory,
        }
    }

    /// Parse a geometry file with default options.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, &ReadOptions::default())
    }

    /// Parse a geometry file.
    pub fn parse_with(data: &[u8], options: &ReadOptions) -> Result<Self> {
        read_file(data, options)
    }

    /// Open and parse a geometry file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ReadOptions::default())
    }

    /// Open and parse a geometry file.
    pub fn open_with<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::parse_with(&mmap, options)
    }

    /// Serialize to the exact on-disk bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        write_file(self)
    }

    /// Write the file to disk.
    ///
    /// The bytes go to a scratch file next to `path` which is renamed over
    /// the target only once fully written; on failure the scratch file is
    /// removed and any existing target is left untouched.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let scratch = scratch_path(path);
        if let Err(e) = fs::write(&scratch, &bytes).and_then(|()| fs::rename(&scratch, path)) {
            let _ = fs::remove_file(&scratch);
            return Err(e.into());
        }
        log::info!("saved {} ({} parts, {} bytes)", path.display(), self.parts.len(), bytes.len());
        Ok(())
    }

    pub fn info(&self) -> &GeometryInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut GeometryInfo {
        &mut self.info
    }

    /// Copy the current part count into the descriptor.
    pub fn sync_part_count(&mut self) {
        self.info.part_count = self.parts.len() as u32;
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Append a part. Hash uniqueness is the caller's responsibility.
    pub fn add_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Find a part by hash.
    pub fn find_part(&self, hash: NameHash) -> Option<&Part> {
        self.parts.iter().find(|p| p.hash() == hash)
    }

    /// Whether a part with this hash exists.
    pub fn contains_part(&self, hash: NameHash) -> bool {
        self.find_part(hash).is_some()
    }

    /// Sorted part hashes as read from the hash index leaf.
    pub fn hash_index(&self) -> &[NameHash] {
        &self.hash_index
    }

    /// Offset directory as read from the file, sorted by hash.
    pub fn directory(&self) -> &[DirectoryEntry] {
        &self.directory
    }

    /// Locate a part chunk through the directory by binary search.
    pub fn lookup(&self, hash: NameHash) -> Option<&DirectoryEntry> {
        self.directory
            .binary_search_by_key(&hash, |entry| entry.hash)
            .ok()
            .map(|index| &self.directory[index])
    }
}

fn scratch_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("geometry"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkType, DATA_ALIGNMENT, FILE_ALIGNMENT, HEADER_SIZE, VERTEX_ALIGNMENT};
    use crate::model::{
        MountPoint, PartData, PartInfo, ShadingGroup, Vertex, DEFAULT_PART_FLAGS,
        DEFAULT_UV_MODE, OPAQUE_DIFFUSE,
    };
    use crate::Error;
    use mwgeo_common::{Bounds, Matrix4, Vector2, Vector3};

    const VERTEX_SIZE: usize = 36;

    fn make_part(name: &str, hash: u32, triangles: u16) -> Part {
        let mut info = PartInfo::new(NameHash::from_raw(hash), name);
        let mut data = PartData::default();

        for i in 0..triangles {
            let base = data.vertices.len() as u16;
            for k in 0..3 {
                let x = f32::from(i) + k as f32;
                data.vertices.push(Vertex::new(
                    Vector3::new(x, -x, 0.5 * x),
                    Vector3::new(0.0, 1.0, 0.0),
                    OPAQUE_DIFFUSE,
                    Vector2::new(x / 10.0, 1.0 - x / 10.0),
                ));
            }
            data.indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        let bounds = Bounds::from_points(data.vertices.iter().map(|v| v.position));
        data.groups.push(ShadingGroup {
            bounds,
            texture_slots: [0; 5],
            shader_slot: 0,
            uv_mode: DEFAULT_UV_MODE,
            flags: DEFAULT_PART_FLAGS,
            vertex_count: data.vertices.len() as u32,
            triangle_count: u32::from(triangles),
            offset: 0,
            length: data.indices.len() as u32,
        });

        info.bounds = bounds;
        info.triangle_count = u32::from(triangles);
        info.lod = crate::model::LodInfo::full(info.triangle_count);
        info.textures = vec![NameHash::from_raw(0x1111)];
        info.shaders = vec![NameHash::from_raw(0x2222)];
        Part::new(info, data)
    }

    fn sample_file() -> GeometryFile {
        let mut file = GeometryFile::new();
        file.add_part(make_part("CAR_BASE_A", 0x9000_0000, 2));
        file.add_part(make_part("CAR_DOOR_LEFT", 0x0000_0010, 1));

        let mut base = make_part("CAR_BODY_A", 0x5000_0000, 3);
        base.info.mount_points = vec![
            MountPoint {
                hash: NameHash::from_raw(0xABCD),
                transform: Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)),
            },
            MountPoint {
                hash: NameHash::from_raw(0xDCBA),
                transform: Matrix4::IDENTITY,
            },
        ];
        file.add_part(base);
        file.sync_part_count();
        file
    }

    /// Every chunk in the tree as `(header, depth)`.
    fn walk(data: &[u8]) -> Vec<(ChunkType, usize, usize)> {
        fn visit(data: &[u8], start: usize, end: usize, out: &mut Vec<(ChunkType, usize, usize)>) {
            let mut pos = start;
            while pos < end {
                let chunk_type = ChunkType::from_raw(u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap()));
                let length = i32::from_le_bytes(data[pos + 4..pos + 8].try_into().unwrap()) as usize;
                out.push((chunk_type, pos, length));
                if chunk_type.is_parent() {
                    visit(data, pos + HEADER_SIZE, pos + HEADER_SIZE + length, out);
                }
                pos += HEADER_SIZE + length;
            }
        }
        let mut out = Vec::new();
        visit(data, 0, data.len(), &mut out);
        out
    }

    #[test]
    fn test_round_trip() {
        let file = sample_file();
        let bytes = file.to_bytes().unwrap();
        let decoded = GeometryFile::parse(&bytes).unwrap();

        assert_eq!(decoded.info(), file.info());
        assert_eq!(decoded.parts(), file.parts());
        assert_eq!(decoded.parts()[2].info.mount_points.len(), 2);
    }

    #[test]
    fn test_file_padded_to_4096() {
        let bytes = sample_file().to_bytes().unwrap();
        assert_eq!(bytes.len() % FILE_ALIGNMENT, 0);

        let empty = GeometryFile::new().to_bytes().unwrap();
        assert_eq!(empty.len(), FILE_ALIGNMENT);
        assert_eq!(GeometryFile::parse(&empty).unwrap().part_count(), 0);
    }

    #[test]
    fn test_tree_layout() {
        let bytes = sample_file().to_bytes().unwrap();
        let chunks = walk(&bytes);
        let types: Vec<ChunkType> = chunks.iter().map(|c| c.0).collect();

        assert_eq!(types[0], ChunkType::Geometry);
        assert_eq!(types[1], ChunkType::Null);
        assert_eq!(
            &types[2..7],
            &[
                ChunkType::Parts,
                ChunkType::PartsDesc,
                ChunkType::PartsHash,
                ChunkType::PartsOffset,
                ChunkType::PartsEmpty,
            ]
        );
        assert_eq!(chunks[2].1, 0x10);
        assert_eq!(types.iter().filter(|t| **t == ChunkType::Part).count(), 3);
        assert_eq!(types.iter().filter(|t| **t == ChunkType::PartMountPoints).count(), 1);
    }

    #[test]
    fn test_alignment() {
        let bytes = sample_file().to_bytes().unwrap();
        let file = sample_file();
        let mut part_index = 0;

        for (chunk_type, offset, length) in walk(&bytes) {
            let end = offset + HEADER_SIZE + length;
            match chunk_type {
                ChunkType::Part => {
                    assert_eq!(offset % VERTEX_ALIGNMENT, 0);
                    part_index += 1;
                }
                ChunkType::PartDataVertices => {
                    let data = &file.parts()[part_index - 1].data;
                    assert_eq!((end - data.vertices.len() * VERTEX_SIZE) % VERTEX_ALIGNMENT, 0);
                }
                ChunkType::PartDataGroups => {
                    assert_eq!((end - 104) % DATA_ALIGNMENT, 0);
                }
                ChunkType::PartMountPoints => {
                    assert_eq!((end - 2 * 80) % DATA_ALIGNMENT, 0);
                }
                ChunkType::PartDataDesc => {
                    assert_eq!((end - 48) % DATA_ALIGNMENT, 0);
                }
                _ => {}
            }
        }
        assert_eq!(part_index, 3);
    }

    #[test]
    fn test_directory_sorted_and_searchable() {
        let file = sample_file();
        let bytes = file.to_bytes().unwrap();
        let decoded = GeometryFile::parse(&bytes).unwrap();

        let hashes: Vec<u32> = decoded.directory().iter().map(|e| e.hash.value()).collect();
        assert_eq!(hashes, vec![0x0000_0010, 0x5000_0000, 0x9000_0000]);
        assert_eq!(
            decoded.hash_index(),
            &[
                NameHash::from_raw(0x0000_0010),
                NameHash::from_raw(0x5000_0000),
                NameHash::from_raw(0x9000_0000)
            ]
        );

        for part in file.parts() {
            let entry = decoded.lookup(part.hash()).unwrap();
            let offset = entry.offset as usize;
            let tag = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
            let length = i32::from_le_bytes(bytes[offset + 4..offset + 8].try_into().unwrap());
            assert_eq!(ChunkType::from_raw(tag), ChunkType::Part);
            assert_eq!(entry.length as usize, length as usize + HEADER_SIZE);
        }
        assert!(decoded.lookup(NameHash::from_raw(0x1234)).is_none());
    }

    #[test]
    fn test_unknown_chunks_skipped() {
        let file = sample_file();
        let mut bytes = file.to_bytes().unwrap();

        // Unknown parent holding an unknown leaf, appended after the tree.
        bytes.extend_from_slice(&0x8003_4020u32.to_le_bytes());
        bytes.extend_from_slice(&16i32.to_le_bytes());
        bytes.extend_from_slice(&0x0013_4017u32.to_le_bytes());
        bytes.extend_from_slice(&8i32.to_le_bytes());
        bytes.extend_from_slice(&[0xAA; 8]);

        let decoded = GeometryFile::parse(&bytes).unwrap();
        assert_eq!(decoded.parts(), file.parts());
    }

    #[test]
    fn test_orphan_leaf_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ChunkType::PartTextures.raw().to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        assert!(matches!(
            GeometryFile::parse(&bytes),
            Err(Error::OrphanLeaf {
                chunk_type: ChunkType::PartTextures,
                offset: 0
            })
        ));
    }

    #[test]
    fn test_chunk_overrun_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ChunkType::Geometry.raw().to_le_bytes());
        bytes.extend_from_slice(&64i32.to_le_bytes());
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(
            GeometryFile::parse(&bytes),
            Err(Error::InvalidChunkLength { length: 64, .. })
        ));
    }

    #[test]
    fn test_leaf_shorter_than_descriptor_rejected() {
        let mut bytes = sample_file().to_bytes().unwrap();
        let (_, desc, _) = walk(&bytes)
            .into_iter()
            .find(|(t, _, _)| *t == ChunkType::PartDataDesc)
            .unwrap();

        // index_count sits after 44 bytes of the descriptor record.
        let field = mwgeo_common::align_up(desc + HEADER_SIZE, DATA_ALIGNMENT) + 44;
        bytes[field..field + 4].copy_from_slice(&1000u32.to_le_bytes());

        assert!(matches!(
            GeometryFile::parse(&bytes),
            Err(Error::InvalidChunkLength {
                chunk_type: ChunkType::PartDataIndices,
                ..
            })
        ));
    }

    #[test]
    fn test_too_many_textures_rejected() {
        let mut file = GeometryFile::new();
        let mut part = make_part("BIG", 1, 1);
        part.info.textures = (0..256).map(NameHash::from_raw).collect();
        file.add_part(part);
        assert!(matches!(
            file.to_bytes(),
            Err(Error::TooManyEntries { count: 256, .. })
        ));
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GEOMETRY.BIN");
        let file = sample_file();

        file.save(&path).unwrap();
        assert!(!dir.path().join("GEOMETRY.BIN.tmp").exists());

        let opened = GeometryFile::open(&path).unwrap();
        assert_eq!(opened.parts(), file.parts());
    }

    #[test]
    fn test_failed_save_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("GEOMETRY.BIN");
        assert!(matches!(sample_file().save(&path), Err(Error::Io(_))));
        assert!(!path.exists());
    }
}
