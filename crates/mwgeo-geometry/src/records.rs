//! On-disk records of the geometry format.
//!
//! All records are `repr(C, packed)` and read or written in one piece with
//! zerocopy. Conversions to and from the in-memory model live next to each
//! record.

use mwgeo_common::{Bounds, Matrix4, NameHash, Vector3, Vector4};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::model::{GeometryInfo, LodInfo, MountPoint, PartInfo, ShadingGroup};

/// Version tag of the geometry descriptor.
pub const GEOMETRY_VERSION: u32 = 0x1D;
/// Tag stored in every part descriptor.
pub const PART_INFO_TAG: u32 = 0x0040_0018;
/// Paired constant stored twice in every part descriptor.
pub const PART_INFO_CONSTANT: u32 = 0x000E_A550;
/// Version tag of the part data descriptor.
pub const PART_DATA_VERSION: u32 = 0x12;

const RELATIVE_PATH_LEN: usize = 0x38;
const CLASS_TYPE_LEN: usize = 0x20;

/// Body of the parts descriptor leaf.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct GeometryInfoRecord {
    pub reserved: [u32; 2],
    pub version: u32,
    pub part_count: u32,
    pub relative_path: [u8; RELATIVE_PATH_LEN],
    pub class_type: [u8; CLASS_TYPE_LEN],
    pub extension_offset: u32,
    pub extension_length: u32,
    pub unknown: u32,
    pub trailing: [u32; 7],
}

/// Fixed-size prefix of the part descriptor leaf. The part name follows it.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct PartInfoRecord {
    pub reserved: [u32; 3],
    pub tag: u32,
    pub hash: u32,
    pub triangle_count: u32,
    pub reserved_byte0: u8,
    pub texture_count: u8,
    pub shader_count: u8,
    pub reserved_byte1: u8,
    pub reserved1: u32,
    pub bound_min: Vector4,
    pub bound_max: Vector4,
    pub transform: Matrix4,
    pub reserved2: [u32; 2],
    pub constants: [u32; 2],
    pub reserved3: u32,
    pub lod_reserved: i32,
    pub lod_scale: f32,
    pub lod_triangles: f32,
}

/// One entry of the mount point leaf.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct MountPointRecord {
    pub hash: u32,
    pub reserved: [u32; 3],
    pub transform: Matrix4,
}

/// Body of the part data descriptor leaf.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct PartDataDescRecord {
    pub reserved: [u32; 2],
    pub version: u32,
    pub flags: u32,
    pub group_count: u32,
    pub reserved1: u32,
    pub vertex_buffer_count: u32,
    pub reserved2: [u32; 4],
    pub index_count: u32,
}

/// One entry of the shading group leaf.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct ShadingGroupRecord {
    pub bounds_min: Vector3,
    pub bounds_max: Vector3,
    pub texture_slots: [u8; 5],
    pub shader_slot: u8,
    pub padding: u16,
    pub reserved: [u32; 4],
    pub uv_mode: u32,
    pub reserved1: u32,
    pub flags: u32,
    pub vertex_count: u32,
    pub triangle_count: u32,
    pub offset: u32,
    pub reserved2: [u32; 5],
    pub length: u32,
    pub reserved3: [u32; 2],
}

/// A `(hash, 0)` pair, used by the hash index, texture and shader leaves.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct HashRecord {
    pub hash: u32,
    pub reserved: u32,
}

/// One entry of the offset directory leaf.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DirectoryRecord {
    pub hash: u32,
    pub offset: u32,
    pub length: u32,
    pub length_again: u32,
    pub reserved: [u32; 2],
}

const _: () = assert!(std::mem::size_of::<GeometryInfoRecord>() == 144);
const _: () = assert!(std::mem::size_of::<PartInfoRecord>() == 160);
const _: () = assert!(std::mem::size_of::<MountPointRecord>() == 80);
const _: () = assert!(std::mem::size_of::<PartDataDescRecord>() == 48);
const _: () = assert!(std::mem::size_of::<ShadingGroupRecord>() == 104);
const _: () = assert!(std::mem::size_of::<DirectoryRecord>() == 24);

fn fixed_string<const N: usize>(s: &str) -> [u8; N] {
    let mut buffer = [0u8; N];
    // Keep at least one terminating NUL.
    let len = s.len().min(N - 1);
    buffer[..len].copy_from_slice(&s.as_bytes()[..len]);
    buffer
}

fn from_fixed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl GeometryInfoRecord {
    pub fn new(info: &GeometryInfo, part_count: u32) -> Self {
        Self {
            reserved: [0; 2],
            version: GEOMETRY_VERSION,
            part_count,
            relative_path: fixed_string(&info.relative_path),
            class_type: fixed_string(&info.class_type),
            extension_offset: info.extension_offset,
            extension_length: info.extension_length,
            unknown: 0x80,
            trailing: [0; 7],
        }
    }

    pub fn to_model(&self) -> GeometryInfo {
        GeometryInfo {
            part_count: self.part_count,
            relative_path: from_fixed_string(&self.relative_path),
            class_type: from_fixed_string(&self.class_type),
            extension_offset: self.extension_offset,
            extension_length: self.extension_length,
        }
    }
}

impl PartInfoRecord {
    /// Build the descriptor; table counts are passed in already range-checked.
    pub fn new(info: &PartInfo, texture_count: u8, shader_count: u8) -> Self {
        Self {
            reserved: [0; 3],
            tag: PART_INFO_TAG,
            hash: info.hash.value(),
            triangle_count: info.triangle_count,
            reserved_byte0: 0,
            texture_count,
            shader_count,
            reserved_byte1: 0,
            reserved1: 0,
            bound_min: info.bounds.min.extend(),
            bound_max: info.bounds.max.extend(),
            transform: info.transform,
            reserved2: [0; 2],
            constants: [PART_INFO_CONSTANT; 2],
            reserved3: 0,
            lod_reserved: info.lod.reserved,
            lod_scale: info.lod.scale,
            lod_triangles: info.lod.triangles,
        }
    }

    /// Convert to the model; tables and the name are filled in separately.
    pub fn to_model(&self, name: String) -> PartInfo {
        let bound_min = self.bound_min;
        let bound_max = self.bound_max;
        PartInfo {
            hash: NameHash::from_raw(self.hash),
            name,
            triangle_count: self.triangle_count,
            bounds: Bounds::new(bound_min.truncate(), bound_max.truncate()),
            transform: self.transform,
            textures: Vec::new(),
            shaders: Vec::new(),
            mount_points: Vec::new(),
            lod: LodInfo {
                reserved: self.lod_reserved,
                scale: self.lod_scale,
                triangles: self.lod_triangles,
            },
        }
    }
}

impl From<&MountPoint> for MountPointRecord {
    fn from(mount: &MountPoint) -> Self {
        Self {
            hash: mount.hash.value(),
            reserved: [0; 3],
            transform: mount.transform,
        }
    }
}

impl From<&MountPointRecord> for MountPoint {
    fn from(record: &MountPointRecord) -> Self {
        Self {
            hash: NameHash::from_raw(record.hash),
            transform: record.transform,
        }
    }
}

impl From<&ShadingGroup> for ShadingGroupRecord {
    fn from(group: &ShadingGroup) -> Self {
        Self {
            bounds_min: group.bounds.min,
            bounds_max: group.bounds.max,
            texture_slots: group.texture_slots,
            shader_slot: group.shader_slot,
            padding: 0,
            reserved: [0; 4],
            uv_mode: group.uv_mode,
            reserved1: 0,
            flags: group.flags,
            vertex_count: group.vertex_count,
            triangle_count: group.triangle_count,
            offset: group.offset,
            reserved2: [0; 5],
            length: group.length,
            reserved3: [0; 2],
        }
    }
}

impl From<&ShadingGroupRecord> for ShadingGroup {
    fn from(record: &ShadingGroupRecord) -> Self {
        Self {
            bounds: Bounds::new(record.bounds_min, record.bounds_max),
            texture_slots: record.texture_slots,
            shader_slot: record.shader_slot,
            uv_mode: record.uv_mode,
            flags: record.flags,
            vertex_count: record.vertex_count,
            triangle_count: record.triangle_count,
            offset: record.offset,
            length: record.length,
        }
    }
}

impl HashRecord {
    pub const fn new(hash: NameHash) -> Self {
        Self {
            hash: hash.value(),
            reserved: 0,
        }
    }
}
