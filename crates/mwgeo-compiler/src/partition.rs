//! Splitting a source object into submeshes.
//!
//! Triangles are grouped by their `(shader, texture)` slot pair. Each group
//! gets its own deduplicated vertex list, so a vertex shared by triangles of
//! different materials is stored once per group.

use mwgeo_common::{Bounds, Vector2, Vector3};
use mwgeo_geometry::Vertex;
use mwgeo_source::{SourceFormat, SourceObject, SourceTriangle};
use rustc_hash::FxHashMap;

use crate::materials::MaterialLookup;
use crate::names::MatTexPair;
use crate::unique::UniqueList;
use crate::{Error, Result};

/// Axis mapping and corner order of a source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convention {
    format: SourceFormat,
}

impl Convention {
    pub fn for_format(format: SourceFormat) -> Self {
        Self { format }
    }

    /// Order in which a triangle's corners are emitted.
    ///
    /// The raw exporter winds counter-clockwise; the game expects clockwise.
    pub fn corners(&self) -> [usize; 3] {
        match self.format {
            SourceFormat::RawBinary => [2, 1, 0],
            SourceFormat::SceneExport => [0, 1, 2],
        }
    }

    /// Map a source position or direction into game axes.
    pub fn remap(&self, v: Vector3) -> Vector3 {
        match self.format {
            SourceFormat::RawBinary => Vector3::new(v.z, v.x, v.y),
            SourceFormat::SceneExport => Vector3::new(-v.y, v.x, v.z),
        }
    }
}

/// Triangles sharing one shader and texture slot.
#[derive(Debug, Clone)]
pub struct SubMesh {
    /// Slot in the part's shader list.
    pub material: usize,
    /// Slot in the part's texture list.
    pub texture: usize,
    vertices: UniqueList<Vertex>,
    indices: Vec<u32>,
}

impl SubMesh {
    pub fn new(material: usize, texture: usize) -> Self {
        Self {
            material,
            texture,
            vertices: UniqueList::new(),
            indices: Vec::new(),
        }
    }

    /// Append one triangle corner.
    pub fn push_corner(&mut self, vertex: Vertex) {
        let index = self.vertices.add(vertex);
        self.indices.push(index as u32);
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.vertices.as_slice()
    }

    /// Indices local to this submesh's vertex list.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounds of the deduplicated vertices, zero when empty.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.vertices.iter().map(|v| v.position))
    }
}

/// The submeshes of one object and the slot tables they index.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    materials: UniqueList<String>,
    textures: UniqueList<String>,
    submeshes: Vec<SubMesh>,
    keys: FxHashMap<(usize, usize), usize>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition every triangle of `object`.
    ///
    /// `diffuse` is the tint given to every vertex of the object.
    pub fn build(
        object: &SourceObject,
        convention: &Convention,
        lookup: &MaterialLookup,
        diffuse: u32,
    ) -> Result<Self> {
        let mut partition = Self::new();

        for triangle in &object.triangles {
            let pair = lookup
                .get(triangle.material)
                .ok_or_else(|| Error::MissingMaterial {
                    object: object.name.clone(),
                    reference: triangle.material,
                })?;
            let submesh = partition.submesh_for(pair);

            for corner in convention.corners() {
                let vertex = corner_vertex(object, triangle, corner, convention, diffuse)?;
                submesh.push_corner(vertex);
            }
        }

        log::debug!(
            "{}: {} triangles in {} submesh(es)",
            object.name,
            object.triangles.len(),
            partition.submeshes.len()
        );
        Ok(partition)
    }

    /// The submesh for a material pair, created on first use.
    pub fn submesh_for(&mut self, pair: &MatTexPair) -> &mut SubMesh {
        let material = self.materials.add(pair.material.clone());
        let texture = self.textures.add(pair.texture.clone());

        let submeshes = &mut self.submeshes;
        let index = *self.keys.entry((material, texture)).or_insert_with(|| {
            submeshes.push(SubMesh::new(material, texture));
            submeshes.len() - 1
        });
        &mut self.submeshes[index]
    }

    /// Distinct shader names, in slot order.
    pub fn materials(&self) -> &[String] {
        self.materials.as_slice()
    }

    /// Distinct texture names, in slot order.
    pub fn textures(&self) -> &[String] {
        self.textures.as_slice()
    }

    /// Submeshes in order of first use.
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }
}

fn corner_vertex(
    object: &SourceObject,
    triangle: &SourceTriangle,
    corner: usize,
    convention: &Convention,
    diffuse: u32,
) -> Result<Vertex> {
    let vertex_index = triangle.vertices[corner] as usize;
    let source = object.vertices.get(vertex_index).ok_or_else(|| {
        out_of_range(object, "vertex", vertex_index, object.vertices.len())
    })?;

    let uv_index = triangle.uvs[corner] as usize;
    let uv: Vector2 = *object
        .uvs
        .get(uv_index)
        .ok_or_else(|| out_of_range(object, "texture vertex", uv_index, object.uvs.len()))?;

    let normal = triangle
        .normals
        .map_or(source.normal, |normals| normals[corner]);

    Ok(Vertex::new(
        convention.remap(source.position),
        convention.remap(normal),
        diffuse,
        uv,
    ))
}

fn out_of_range(object: &SourceObject, what: &'static str, index: usize, count: usize) -> Error {
    Error::Source(mwgeo_source::Error::IndexOutOfRange {
        object: object.name.clone(),
        what,
        index: index as i64,
        count,
    })
}
