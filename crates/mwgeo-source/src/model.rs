//! The normalized source mesh model produced by every reader.

use mwgeo_common::{Matrix4, Vector2, Vector3};

/// Which reader produced a mesh.
///
/// The two exporters disagree on axis and winding conventions, so the
/// compiler converts each format with its own fixed mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SourceFormat {
    /// Flat binary export (`.mwr`).
    RawBinary,
    /// ASCII scene export (`.ase`).
    SceneExport,
}

impl SourceFormat {
    /// Map a lowercase file extension to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "mwr" => Some(Self::RawBinary),
            "ase" => Some(Self::SceneExport),
            _ => None,
        }
    }
}

/// Reference from a triangle to an entry of the material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MaterialRef {
    /// A top-level material.
    Index(u32),
    /// A sub-material of a multi-material: `(material, sub-material)`.
    Sub(u32, u32),
}

impl std::fmt::Display for MaterialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialRef::Index(index) => write!(f, "{}", index),
            MaterialRef::Sub(index, sub) => write!(f, "{}/{}", index, sub),
        }
    }
}

/// A named material, optionally split into sub-materials.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceMaterial {
    pub name: String,
    pub sub_materials: Vec<String>,
}

impl SourceMaterial {
    /// Create a material without sub-materials.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_materials: Vec::new(),
        }
    }

    /// Whether triangles using this material select a sub-material.
    pub fn has_sub_materials(&self) -> bool {
        !self.sub_materials.is_empty()
    }
}

/// A vertex of a source object.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceVertex {
    pub position: Vector3,
    pub normal: Vector3,
}

/// A triangle of a source object.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceTriangle {
    /// Indices into [`SourceObject::vertices`].
    pub vertices: [u32; 3],
    /// Indices into [`SourceObject::uvs`].
    pub uvs: [u32; 3],
    /// Per-corner normals overriding the vertex normals.
    pub normals: Option<[Vector3; 3]>,
    pub material: MaterialRef,
}

/// One named object of the source scene.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceObject {
    pub name: String,
    pub transform: Matrix4,
    pub vertices: Vec<SourceVertex>,
    pub uvs: Vec<Vector2>,
    pub triangles: Vec<SourceTriangle>,
}

impl SourceObject {
    /// Create an empty object with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::IDENTITY,
            vertices: Vec::new(),
            uvs: Vec::new(),
            triangles: Vec::new(),
        }
    }
}

/// A complete source scene.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceMesh {
    pub format: SourceFormat,
    pub materials: Vec<SourceMaterial>,
    pub objects: Vec<SourceObject>,
}

impl SourceMesh {
    /// Create an empty scene.
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            materials: Vec::new(),
            objects: Vec::new(),
        }
    }
}
