//! Reader for the ASCII scene export text format (`.ase`).
//!
//! The format is a tree of `*NODE data` lines, where a node whose line ends
//! in `{` opens a block closed by a lone `}`. Only the parts needed to build
//! a [`SourceMesh`] are interpreted:
//!
//! ```text
//! *3DSMAX_ASCIIEXPORT 200
//! *MATERIAL_LIST {
//!     *MATERIAL_COUNT n
//!     *MATERIAL i { *MATERIAL_NAME "..."  *NUMSUBMTLS k  *SUBMATERIAL j { ... } }
//! }
//! *GEOMOBJECT {
//!     *NODE_NAME "..."
//!     *NODE_TM { *TM_ROW0 a b c ... *TM_ROW3 x y z }
//!     *MESH {
//!         *TIMEVALUE 0
//!         *MESH_NUMVERTEX / *MESH_NUMFACES / *MESH_NUMTVERTEX
//!         *MESH_VERTEX_LIST { *MESH_VERTEX i x y z }
//!         *MESH_FACE_LIST { *MESH_FACE i: A: a B: b C: c ... *MESH_MTLID m }
//!         *MESH_TVERTLIST { *MESH_TVERT i u v w }
//!         *MESH_TFACELIST { *MESH_TFACE i a b c }
//!         *MESH_NORMALS { *MESH_FACENORMAL i x y z  *MESH_VERTEXNORMAL v x y z (x3) }
//!     }
//!     *MATERIAL_REF r
//! }
//! ```
//!
//! Every other node, and every unknown block with all of its children, is
//! skipped.

use std::str::FromStr;

use mwgeo_common::{Matrix4, Vector2, Vector3};

use crate::model::{
    MaterialRef, SourceFormat, SourceMaterial, SourceMesh, SourceObject, SourceTriangle,
    SourceVertex,
};
use crate::{Error, Result};

const SIGNATURE: &str = "3DSMAX_ASCIIEXPORT";
const SUPPORTED_VERSION: &str = "200";

/// Parse an ASCII scene export.
pub fn parse(text: &str) -> Result<SourceMesh> {
    let mut parser = Parser {
        lexer: Lexer {
            lines: text.lines().enumerate(),
            line_count: text.lines().count(),
        },
    };

    match parser.lexer.next_token() {
        Some(Token::Node(node)) if node.kind == NodeKind::Signature => {
            if node.data != SUPPORTED_VERSION {
                return Err(Error::UnsupportedVersion(node.data.to_string()));
            }
        }
        _ => return Err(Error::NotAse),
    }

    let mut mesh = SourceMesh::new(SourceFormat::SceneExport);
    parser.each_child(|p, node| match (node.kind, node.opens_block) {
        (NodeKind::MaterialList, true) => {
            p.parse_material_list(&mut mesh.materials)?;
            Ok(true)
        }
        (NodeKind::GeometryObject, true) => {
            let object = p.parse_geometry_object(&mesh.materials)?;
            log::debug!(
                " + object {} ({} vertices, {} faces)",
                object.name,
                object.vertices.len(),
                object.triangles.len()
            );
            mesh.objects.push(object);
            Ok(true)
        }
        _ => Ok(false),
    })?;

    log::debug!(
        "scene export: {} materials, {} objects",
        mesh.materials.len(),
        mesh.objects.len()
    );
    Ok(mesh)
}

/// The node names the reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Signature,
    MaterialList,
    MaterialCount,
    Material,
    MaterialName,
    SubMaterialCount,
    SubMaterial,
    GeometryObject,
    NodeName,
    MaterialRef,
    NodeTransform,
    TransformRow(usize),
    Mesh,
    TimeValue,
    VertexCount,
    FaceCount,
    TextureVertexCount,
    VertexList,
    Vertex,
    FaceList,
    Face,
    TextureVertexList,
    TextureVertex,
    TextureFaceList,
    TextureFace,
    Normals,
    FaceNormal,
    VertexNormal,
    Other,
}

impl NodeKind {
    fn from_name(name: &str) -> Self {
        match name {
            SIGNATURE => Self::Signature,
            "MATERIAL_LIST" => Self::MaterialList,
            "MATERIAL_COUNT" => Self::MaterialCount,
            "MATERIAL" => Self::Material,
            "MATERIAL_NAME" => Self::MaterialName,
            "NUMSUBMTLS" => Self::SubMaterialCount,
            "SUBMATERIAL" => Self::SubMaterial,
            "GEOMOBJECT" => Self::GeometryObject,
            "NODE_NAME" => Self::NodeName,
            "MATERIAL_REF" => Self::MaterialRef,
            "NODE_TM" => Self::NodeTransform,
            "TM_ROW0" => Self::TransformRow(0),
            "TM_ROW1" => Self::TransformRow(1),
            "TM_ROW2" => Self::TransformRow(2),
            "TM_ROW3" => Self::TransformRow(3),
            "MESH" => Self::Mesh,
            "TIMEVALUE" => Self::TimeValue,
            "MESH_NUMVERTEX" => Self::VertexCount,
            "MESH_NUMFACES" => Self::FaceCount,
            "MESH_NUMTVERTEX" => Self::TextureVertexCount,
            "MESH_VERTEX_LIST" => Self::VertexList,
            "MESH_VERTEX" => Self::Vertex,
            "MESH_FACE_LIST" => Self::FaceList,
            "MESH_FACE" => Self::Face,
            "MESH_TVERTLIST" => Self::TextureVertexList,
            "MESH_TVERT" => Self::TextureVertex,
            "MESH_TFACELIST" => Self::TextureFaceList,
            "MESH_TFACE" => Self::TextureFace,
            "MESH_NORMALS" => Self::Normals,
            "MESH_FACENORMAL" => Self::FaceNormal,
            "MESH_VERTEXNORMAL" => Self::VertexNormal,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node<'a> {
    line: usize,
    kind: NodeKind,
    name: &'a str,
    data: &'a str,
    opens_block: bool,
}

enum Token<'a> {
    Node(Node<'a>),
    Close,
}

struct Lexer<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    line_count: usize,
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Option<Token<'a>> {
        for (index, raw) in self.lines.by_ref() {
            let line = raw.trim();
            if line == "}" {
                return Some(Token::Close);
            }
            let Some(rest) = line.strip_prefix('*') else {
                continue;
            };

            let (name, data) = match rest.find([' ', '\t']) {
                Some(split) => (&rest[..split], rest[split..].trim()),
                None => (rest, ""),
            };
            let opens_block = data.ends_with('{');
            let data = match data.strip_suffix('{') {
                Some(d) => d.trim_end(),
                None => data,
            };
            let data = data
                .strip_prefix('"')
                .and_then(|d| d.strip_suffix('"'))
                .unwrap_or(data);

            return Some(Token::Node(Node {
                line: index + 1,
                kind: NodeKind::from_name(name),
                name,
                data,
                opens_block,
            }));
        }
        None
    }
}

/// Per-face data gathered across the face, texture face and normal lists.
#[derive(Debug, Clone, Copy, Default)]
struct Face {
    vertices: [i64; 3],
    uvs: [i64; 3],
    normals: Option<[Vector3; 3]>,
    material_id: u32,
}

#[derive(Debug, Default)]
struct Mesh {
    vertices: Vec<Vector3>,
    uvs: Vec<Vector2>,
    faces: Vec<Face>,
}

struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    /// Feed every child of the current block to `handle` until the block
    /// closes. Children the handler declines are skipped, blocks included.
    fn each_child<F>(&mut self, mut handle: F) -> Result<()>
    where
        F: FnMut(&mut Self, Node<'a>) -> Result<bool>,
    {
        while let Some(token) = self.lexer.next_token() {
            match token {
                Token::Close => return Ok(()),
                Token::Node(node) => {
                    if !handle(self, node)? && node.opens_block {
                        self.skip_block();
                    }
                }
            }
        }
        Ok(())
    }

    fn skip_block(&mut self) {
        let mut depth = 1usize;
        while let Some(token) = self.lexer.next_token() {
            match token {
                Token::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                Token::Node(node) if node.opens_block => depth += 1,
                Token::Node(_) => {}
            }
        }
    }

    /// Parse a declared element count. Each element needs at least one of
    /// the lines not yet read.
    fn parse_count(&self, node: &Node<'_>, what: &str) -> Result<usize> {
        let count: usize = parse_value(node, Some(node.data), what)?;
        let remaining = self.lexer.line_count.saturating_sub(node.line);
        if count > remaining {
            return Err(Error::Parse {
                line: node.line,
                message: format!(
                    "{} {} in *{} exceeds the {} remaining lines",
                    what, count, node.name, remaining
                ),
            });
        }
        Ok(count)
    }

    fn parse_material_list(&mut self, materials: &mut Vec<SourceMaterial>) -> Result<()> {
        self.each_child(|p, node| match (node.kind, node.opens_block) {
            (NodeKind::MaterialCount, false) => {
                let count = p.parse_count(&node, "material count")?;
                materials.resize(count, SourceMaterial::default());
                Ok(true)
            }
            (NodeKind::Material, true) => {
                let index: usize = parse_value(&node, Some(node.data), "material index")?;
                let material = p.parse_material(false)?;
                *slot(materials, index, &node, "material")? = material;
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn parse_material(&mut self, nested: bool) -> Result<SourceMaterial> {
        let mut material = SourceMaterial::default();
        self.each_child(|p, node| match (node.kind, node.opens_block) {
            (NodeKind::MaterialName, false) => {
                material.name = node.data.to_string();
                Ok(true)
            }
            (NodeKind::SubMaterialCount, false) => {
                if nested {
                    return Err(Error::NestedSubMaterial { line: node.line });
                }
                let count = p.parse_count(&node, "sub-material count")?;
                material.sub_materials = vec![String::new(); count];
                Ok(true)
            }
            (NodeKind::SubMaterial, true) => {
                let index: usize = parse_value(&node, Some(node.data), "sub-material index")?;
                let sub = p.parse_material(true)?;
                *slot(&mut material.sub_materials, index, &node, "sub-material")? = sub.name;
                Ok(true)
            }
            _ => Ok(false),
        })?;
        Ok(material)
    }

    fn parse_geometry_object(&mut self, materials: &[SourceMaterial]) -> Result<SourceObject> {
        let mut name = String::new();
        let mut material_ref = 0u32;
        let mut transform = Matrix4::IDENTITY;
        let mut mesh = Mesh::default();

        self.each_child(|p, node| match (node.kind, node.opens_block) {
            (NodeKind::NodeName, false) => {
                name = node.data.to_string();
                Ok(true)
            }
            (NodeKind::MaterialRef, false) => {
                material_ref = parse_value(&node, Some(node.data), "material reference")?;
                Ok(true)
            }
            (NodeKind::NodeTransform, true) => {
                p.parse_transform(&mut transform)?;
                Ok(true)
            }
            (NodeKind::Mesh, true) => {
                p.parse_mesh(&mut mesh)?;
                Ok(true)
            }
            _ => Ok(false),
        })?;

        build_object(name, transform, material_ref, mesh, materials)
    }

    fn parse_transform(&mut self, transform: &mut Matrix4) -> Result<()> {
        self.each_child(|_, node| {
            let NodeKind::TransformRow(row) = node.kind else {
                return Ok(false);
            };
            let mut tokens = node.data.split_whitespace();
            for column in 0..3 {
                let value: f32 = parse_value(&node, tokens.next(), "matrix element")?;
                transform.set(row, column, value);
            }
            transform.set(row, 3, if row == 3 { 1.0 } else { 0.0 });
            Ok(true)
        })
    }

    fn parse_mesh(&mut self, mesh: &mut Mesh) -> Result<()> {
        self.each_child(|p, node| match (node.kind, node.opens_block) {
            (NodeKind::TimeValue, false) => {
                let time: i64 = parse_value(&node, Some(node.data), "time value")?;
                if time != 0 {
                    return Err(Error::Animated {
                        line: node.line,
                        time,
                    });
                }
                Ok(true)
            }
            (NodeKind::VertexCount, false) => {
                let count = p.parse_count(&node, "vertex count")?;
                mesh.vertices.resize(count, Vector3::ZERO);
                Ok(true)
            }
            (NodeKind::FaceCount, false) => {
                let count = p.parse_count(&node, "face count")?;
                mesh.faces.resize(count, Face::default());
                Ok(true)
            }
            (NodeKind::TextureVertexCount, false) => {
                let count = p.parse_count(&node, "texture vertex count")?;
                mesh.uvs.resize(count, Vector2::ZERO);
                Ok(true)
            }
            (NodeKind::VertexList, true) => {
                p.parse_vertex_list(mesh)?;
                Ok(true)
            }
            (NodeKind::FaceList, true) => {
                p.parse_face_list(mesh)?;
                Ok(true)
            }
            (NodeKind::TextureVertexList, true) => {
                p.parse_texture_vertex_list(mesh)?;
                Ok(true)
            }
            (NodeKind::TextureFaceList, true) => {
                p.parse_texture_face_list(mesh)?;
                Ok(true)
            }
            (NodeKind::Normals, true) => {
                p.parse_normals(mesh)?;
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn parse_vertex_list(&mut self, mesh: &mut Mesh) -> Result<()> {
        self.each_child(|_, node| {
            if node.kind != NodeKind::Vertex {
                return Ok(false);
            }
            let mut tokens = node.data.split_whitespace();
            let index: usize = parse_value(&node, tokens.next(), "vertex index")?;
            let position = parse_vector3(&node, &mut tokens)?;
            *slot(&mut mesh.vertices, index, &node, "vertex")? = position;
            Ok(true)
        })
    }

    fn parse_face_list(&mut self, mesh: &mut Mesh) -> Result<()> {
        self.each_child(|_, node| {
            if node.kind != NodeKind::Face {
                return Ok(false);
            }
            let mut tokens = node.data.split_whitespace().peekable();
            let first = tokens.next();
            let index: usize = parse_value(
                &node,
                first.map(|t| t.strip_suffix(':').unwrap_or(t)),
                "face index",
            )?;
            let face = slot(&mut mesh.faces, index, &node, "face")?;

            while let Some(token) = tokens.next() {
                let corner = match token {
                    "A:" => 0,
                    "B:" => 1,
                    "C:" => 2,
                    "*MESH_MTLID" => {
                        if tokens.peek().is_some_and(|t| !t.starts_with('*')) {
                            face.material_id = parse_value(&node, tokens.next(), "material id")?;
                        }
                        continue;
                    }
                    _ => continue,
                };
                face.vertices[corner] = parse_value(&node, tokens.next(), "face vertex")?;
            }
            Ok(true)
        })
    }

    fn parse_texture_vertex_list(&mut self, mesh: &mut Mesh) -> Result<()> {
        self.each_child(|_, node| {
            if node.kind != NodeKind::TextureVertex {
                return Ok(false);
            }
            let mut tokens = node.data.split_whitespace();
            let index: usize = parse_value(&node, tokens.next(), "texture vertex index")?;
            let u = parse_value(&node, tokens.next(), "texture coordinate")?;
            let v = parse_value(&node, tokens.next(), "texture coordinate")?;
            *slot(&mut mesh.uvs, index, &node, "texture vertex")? = Vector2::new(u, v);
            Ok(true)
        })
    }

    fn parse_texture_face_list(&mut self, mesh: &mut Mesh) -> Result<()> {
        self.each_child(|_, node| {
            if node.kind != NodeKind::TextureFace {
                return Ok(false);
            }
            let mut tokens = node.data.split_whitespace();
            let index: usize = parse_value(&node, tokens.next(), "texture face index")?;
            let face = slot(&mut mesh.faces, index, &node, "face")?;
            for corner in 0..3 {
                face.uvs[corner] = parse_value(&node, tokens.next(), "texture face vertex")?;
            }
            Ok(true)
        })
    }

    /// A face normal line is followed by one vertex normal per corner. Each
    /// vertex normal is attached to the first unassigned corner that uses
    /// the same vertex.
    fn parse_normals(&mut self, mesh: &mut Mesh) -> Result<()> {
        let mut current: Option<(usize, [bool; 3])> = None;
        self.each_child(|_, node| match node.kind {
            NodeKind::FaceNormal => {
                let mut tokens = node.data.split_whitespace();
                let index: usize = parse_value(&node, tokens.next(), "face normal index")?;
                slot(&mut mesh.faces, index, &node, "face")?.normals = Some([Vector3::ZERO; 3]);
                current = Some((index, [false; 3]));
                Ok(true)
            }
            NodeKind::VertexNormal => {
                let Some((index, assigned)) = current.as_mut() else {
                    return Ok(true);
                };
                let mut tokens = node.data.split_whitespace();
                let vertex: i64 = parse_value(&node, tokens.next(), "vertex normal index")?;
                let normal = parse_vector3(&node, &mut tokens)?;

                let face = slot(&mut mesh.faces, *index, &node, "face")?;
                let corner = (0..3).find(|&c| !assigned[c] && face.vertices[c] == vertex);
                if let (Some(corner), Some(normals)) = (corner, face.normals.as_mut()) {
                    normals[corner] = normal;
                    assigned[corner] = true;
                }
                Ok(true)
            }
            _ => Ok(false),
        })
    }
}

fn build_object(
    name: String,
    transform: Matrix4,
    material_ref: u32,
    mut mesh: Mesh,
    materials: &[SourceMaterial],
) -> Result<SourceObject> {
    let has_sub_materials = materials
        .get(material_ref as usize)
        .is_some_and(SourceMaterial::has_sub_materials);

    // Faces without texture coordinates all point at texture vertex 0.
    if mesh.uvs.is_empty() {
        mesh.uvs.push(Vector2::ZERO);
    }

    let mut object = SourceObject::new(name);
    object.transform = transform;
    object.vertices = mesh
        .vertices
        .iter()
        .map(|&position| SourceVertex {
            position,
            normal: Vector3::ZERO,
        })
        .collect();

    for face in &mesh.faces {
        let mut vertices = [0u32; 3];
        let mut uvs = [0u32; 3];
        for corner in 0..3 {
            vertices[corner] = check_index(&object, "vertex", face.vertices[corner], mesh.vertices.len())?;
            uvs[corner] = check_index(&object, "texture vertex", face.uvs[corner], mesh.uvs.len())?;
        }

        let material = if has_sub_materials {
            MaterialRef::Sub(material_ref, face.material_id)
        } else {
            MaterialRef::Index(material_ref)
        };

        object.triangles.push(SourceTriangle {
            vertices,
            uvs,
            normals: face.normals,
            material,
        });
    }
    object.uvs = mesh.uvs;

    Ok(object)
}

fn check_index(object: &SourceObject, what: &'static str, index: i64, count: usize) -> Result<u32> {
    if index < 0 || index as usize >= count {
        return Err(Error::IndexOutOfRange {
            object: object.name.clone(),
            what,
            index,
            count,
        });
    }
    Ok(index as u32)
}

fn slot<'v, T>(items: &'v mut [T], index: usize, node: &Node<'_>, what: &str) -> Result<&'v mut T> {
    let count = items.len();
    items.get_mut(index).ok_or_else(|| Error::Parse {
        line: node.line,
        message: format!("{} index {} out of range ({} declared)", what, index, count),
    })
}

fn parse_value<T: FromStr>(node: &Node<'_>, token: Option<&str>, what: &str) -> Result<T> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| Error::Parse {
            line: node.line,
            message: format!("invalid {} in *{}: {:?}", what, node.name, token.unwrap_or("")),
        })
}

fn parse_vector3<'t, I>(node: &Node<'_>, tokens: &mut I) -> Result<Vector3>
where
    I: Iterator<Item = &'t str>,
{
    let x = parse_value(node, tokens.next(), "coordinate")?;
    let y = parse_value(node, tokens.next(), "coordinate")?;
    let z = parse_value(node, tokens.next(), "coordinate")?;
    Ok(Vector3::new(x, y, z))
}
