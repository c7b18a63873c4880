//! In-memory model of a geometry file.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use mwgeo_common::{Bounds, Matrix4, NameHash, Vector2, Vector3};

/// Highest number of texture coordinate pairs a vertex can carry.
pub const MAX_UV_CHANNELS: usize = 4;

/// Default part data flags of compiled parts.
pub const DEFAULT_PART_FLAGS: u32 = 0x4080;

/// Diffuse tint of opaque vertices.
pub const OPAQUE_DIFFUSE: u32 = 0xFFFF_FFFF;

/// Diffuse tint of vertices of transparent objects.
pub const TRANSPARENT_DIFFUSE: u32 = 0x7FFF_FFFF;

/// UV mode written into every compiled shading group.
pub const DEFAULT_UV_MODE: u32 = 4;

/// File-level descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeometryInfo {
    /// Part count as stored in the file. Rewritten from the part list on save.
    pub part_count: u32,
    pub relative_path: String,
    pub class_type: String,
    pub extension_offset: u32,
    pub extension_length: u32,
}

impl Default for GeometryInfo {
    fn default() -> Self {
        Self {
            part_count: 0,
            relative_path: "GEOMETRY.BIN".to_string(),
            class_type: "DEFAULT".to_string(),
            extension_offset: 0,
            extension_length: 0,
        }
    }
}

/// Level-of-detail tail of a part descriptor.
///
/// `scale * triangles` is the triangle count of the level.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LodInfo {
    pub reserved: i32,
    pub scale: f32,
    pub triangles: f32,
}

impl LodInfo {
    /// Full-detail tail for a part with `triangle_count` triangles.
    pub fn full(triangle_count: u32) -> Self {
        Self {
            reserved: 0,
            scale: 1.0,
            triangles: triangle_count as f32,
        }
    }
}

/// A named attachment transform.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MountPoint {
    pub hash: NameHash,
    pub transform: Matrix4,
}

/// Descriptor and name tables of one part.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PartInfo {
    pub hash: NameHash,
    pub name: String,
    pub triangle_count: u32,
    pub bounds: Bounds,
    pub transform: Matrix4,
    pub textures: Vec<NameHash>,
    pub shaders: Vec<NameHash>,
    pub mount_points: Vec<MountPoint>,
    pub lod: LodInfo,
}

impl PartInfo {
    /// An empty descriptor with an identity transform.
    pub fn new(hash: NameHash, name: impl Into<String>) -> Self {
        Self {
            hash,
            name: name.into(),
            triangle_count: 0,
            bounds: Bounds::default(),
            transform: Matrix4::IDENTITY,
            textures: Vec::new(),
            shaders: Vec::new(),
            mount_points: Vec::new(),
            lod: LodInfo::full(0),
        }
    }
}

/// A contiguous run of a part's index buffer sharing one texture and shader.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShadingGroup {
    pub bounds: Bounds,
    pub texture_slots: [u8; 5],
    pub shader_slot: u8,
    pub uv_mode: u32,
    pub flags: u32,
    pub vertex_count: u32,
    pub triangle_count: u32,
    /// First index of the group in the part's index buffer.
    pub offset: u32,
    /// Number of indices of the group.
    pub length: u32,
}

/// A vertex of a part's vertex buffer.
///
/// Equality and hashing compare the bit patterns of every component, so
/// `-0.0` and `0.0` are distinct and a vertex always equals itself.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vertex {
    pub position: Vector3,
    pub normal: Vector3,
    pub diffuse: u32,
    pub uv: [Vector2; MAX_UV_CHANNELS],
}

impl Vertex {
    /// A vertex with a single texture coordinate pair.
    pub fn new(position: Vector3, normal: Vector3, diffuse: u32, uv: Vector2) -> Self {
        let mut channels = [Vector2::ZERO; MAX_UV_CHANNELS];
        channels[0] = uv;
        Self {
            position,
            normal,
            diffuse,
            uv: channels,
        }
    }

    fn key(&self) -> ([u32; 3], [u32; 3], u32, [[u32; 2]; MAX_UV_CHANNELS]) {
        (
            self.position.to_bits(),
            self.normal.to_bits(),
            self.diffuse,
            self.uv.map(|uv| uv.to_bits()),
        )
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Shading groups and buffers of one part.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PartData {
    pub flags: u32,
    pub groups: Vec<ShadingGroup>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    /// Texture coordinate pairs stored per vertex (1 to 4).
    pub uv_channels: usize,
    pub material_names: Vec<String>,
}

impl Default for PartData {
    fn default() -> Self {
        Self::new(DEFAULT_PART_FLAGS)
    }
}

impl PartData {
    /// Empty part data with one texture coordinate channel.
    pub fn new(flags: u32) -> Self {
        Self {
            flags,
            groups: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            uv_channels: 1,
            material_names: Vec::new(),
        }
    }

    /// Vertex count as declared by the shading groups.
    pub fn declared_vertex_count(&self) -> usize {
        self.groups.iter().map(|g| g.vertex_count as usize).sum()
    }

    /// Triangle count of the index buffer.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check that the groups describe the buffers exactly.
    ///
    /// Returns a description of the first mismatch.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        let declared = self.declared_vertex_count();
        if declared != self.vertices.len() {
            return Err(format!(
                "groups declare {} vertices but the buffer holds {}",
                declared,
                self.vertices.len()
            ));
        }

        let mut offset = 0usize;
        for (i, group) in self.groups.iter().enumerate() {
            if group.offset as usize != offset {
                return Err(format!(
                    "group {} starts at index {} instead of {}",
                    i, group.offset, offset
                ));
            }
            if group.length != group.triangle_count * 3 {
                return Err(format!(
                    "group {} holds {} indices for {} triangles",
                    i, group.length, group.triangle_count
                ));
            }
            offset += group.length as usize;
        }
        if offset != self.indices.len() {
            return Err(format!(
                "groups declare {} indices but the buffer holds {}",
                offset,
                self.indices.len()
            ));
        }
        if !(1..=MAX_UV_CHANNELS).contains(&self.uv_channels) {
            return Err(format!("unsupported uv channel count {}", self.uv_channels));
        }
        Ok(())
    }
}

/// One compiled mesh object, addressed by its name hash.
///
/// The buffers are shared and immutable: cross-linked duplicates hold the
/// same [`PartData`] as the part they were created from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Part {
    pub info: PartInfo,
    pub data: Arc<PartData>,
}

impl Part {
    pub fn new(info: PartInfo, data: PartData) -> Self {
        Self {
            info,
            data: Arc::new(data),
        }
    }

    pub fn hash(&self) -> NameHash {
        self.info.hash
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// A duplicate under a new identity sharing this part's buffers.
    pub fn alias(&self, hash: NameHash, name: impl Into<String>) -> Self {
        let mut info = self.info.clone();
        info.hash = hash;
        info.name = name.into();
        Self {
            info,
            data: Arc::clone(&self.data),
        }
    }

    /// Whether both parts share the same buffers.
    pub fn shares_data_with(&self, other: &Part) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Directory entry locating a part chunk by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DirectoryEntry {
    pub hash: NameHash,
    /// Absolute offset of the part chunk header.
    pub offset: u32,
    /// Length of the part chunk including its header.
    pub length: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn vertex(x: f32) -> Vertex {
        Vertex::new(
            Vector3::new(x, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            OPAQUE_DIFFUSE,
            Vector2::new(0.5, 0.5),
        )
    }

    #[test]
    fn test_vertex_equality_is_bitwise() {
        assert_eq!(vertex(1.0), vertex(1.0));
        assert_ne!(vertex(0.0), vertex(-0.0));

        let nan = vertex(f32::NAN);
        assert_eq!(nan, nan);

        let set: HashSet<Vertex> = [vertex(1.0), vertex(1.0), vertex(2.0)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_alias_shares_data() {
        let part = Part::new(PartInfo::new(NameHash::from_raw(1), "A"), PartData::default());
        let alias = part.alias(NameHash::from_raw(2), "B");

        assert!(alias.shares_data_with(&part));
        assert_eq!(alias.hash(), NameHash::from_raw(2));
        assert_eq!(alias.name(), "B");
        assert_eq!(part.name(), "A");
    }

    #[test]
    fn test_consistency_check() {
        let mut data = PartData::default();
        data.vertices = vec![vertex(0.0), vertex(1.0), vertex(2.0)];
        data.indices = vec![0, 1, 2];
        data.groups.push(ShadingGroup {
            bounds: Bounds::default(),
            texture_slots: [0; 5],
            shader_slot: 0,
            uv_mode: DEFAULT_UV_MODE,
            flags: DEFAULT_PART_FLAGS,
            vertex_count: 3,
            triangle_count: 1,
            offset: 0,
            length: 3,
        });
        assert!(data.check_consistency().is_ok());

        data.groups[0].vertex_count = 2;
        assert!(data.check_consistency().is_err());
    }
}
