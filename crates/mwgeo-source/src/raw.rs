//! Reader for the flat binary source export (`.mwr`).
//!
//! # Layout
//!
//! All values are little-endian.
//!
//! ```text
//! i32 magic
//! i32 material_count
//! i32 object_count
//! string[material_count]          i32 length + bytes, cut at the first NUL
//! object_header[object_count]     string name, i32 vertex_count,
//!                                 i32 face_count, f32[16] transform
//! per object:
//!   vertex[vertex_count]          f32 x, y, z, nx, ny, nz
//!   face[face_count]              i32 material, i16 i1, i2, i3, i16 pad,
//!                                 f32 u1, u2, u3, v1, v2, v3
//! ```
//!
//! Faces carry their texture coordinates inline; the reader turns them into
//! three entries of [`SourceObject::uvs`] per triangle so the model stays
//! uniform across formats. Corners are kept in file order.

use mwgeo_common::{BinaryReader, Matrix4, Vector2, Vector3};

use crate::model::{
    MaterialRef, SourceFormat, SourceMaterial, SourceMesh, SourceObject, SourceTriangle,
    SourceVertex,
};
use crate::{Error, Result};

struct ObjectHeader {
    name: String,
    vertex_count: usize,
    face_count: usize,
    transform: Matrix4,
}

/// Parse a raw binary export.
pub fn parse(data: &[u8]) -> Result<SourceMesh> {
    let mut reader = BinaryReader::new(data);

    let magic = reader.read_u32()?;
    let material_count = read_count(&mut reader, "material")?;
    let object_count = read_count(&mut reader, "object")?;
    log::debug!(
        "raw export magic 0x{:08X}: {} materials, {} objects",
        magic,
        material_count,
        object_count
    );

    let mut mesh = SourceMesh::new(SourceFormat::RawBinary);
    for _ in 0..material_count {
        let name = read_string(&mut reader)?;
        log::debug!(" + material {}", name);
        mesh.materials.push(SourceMaterial::new(name));
    }

    let mut headers = Vec::with_capacity(object_count.min(reader.remaining()));
    for _ in 0..object_count {
        let name = read_string(&mut reader)?;
        let vertex_count = read_count(&mut reader, "vertex")?;
        let face_count = read_count(&mut reader, "face")?;
        let mut m = [0.0f32; 16];
        for value in &mut m {
            *value = reader.read_f32()?;
        }
        headers.push(ObjectHeader {
            name,
            vertex_count,
            face_count,
            transform: Matrix4::from_array(m),
        });
    }

    for header in headers {
        log::debug!(
            " + object {} ({} vertices, {} faces)",
            header.name,
            header.vertex_count,
            header.face_count
        );
        mesh.objects.push(read_object(&mut reader, header)?);
    }

    Ok(mesh)
}

fn read_object(reader: &mut BinaryReader<'_>, header: ObjectHeader) -> Result<SourceObject> {
    let mut object = SourceObject::new(header.name);
    object.transform = header.transform;

    object.vertices.reserve(header.vertex_count.min(reader.remaining()));
    for _ in 0..header.vertex_count {
        let position = read_vector3(reader)?;
        let normal = read_vector3(reader)?;
        object.vertices.push(SourceVertex { position, normal });
    }

    object.triangles.reserve(header.face_count.min(reader.remaining()));
    for _ in 0..header.face_count {
        let material = reader.read_i32()?;
        let mut corners = [0u32; 3];
        for corner in &mut corners {
            let index = reader.read_i16()?;
            *corner = check_index(&object, "vertex", index as i64, object.vertices.len())?;
        }
        reader.advance(2);

        let mut u = [0.0f32; 3];
        for value in &mut u {
            *value = reader.read_f32()?;
        }
        let mut v = [0.0f32; 3];
        for value in &mut v {
            *value = reader.read_f32()?;
        }

        let material = u32::try_from(material).map_err(|_| Error::InvalidCount {
            what: "material index",
            count: material,
        })?;

        let base = object.uvs.len() as u32;
        for k in 0..3 {
            object.uvs.push(Vector2::new(u[k], v[k]));
        }

        object.triangles.push(SourceTriangle {
            vertices: corners,
            uvs: [base, base + 1, base + 2],
            normals: None,
            material: MaterialRef::Index(material),
        });
    }

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

fn read_count(reader: &mut BinaryReader<'_>, what: &'static str) -> Result<usize> {
    let count = reader.read_i32()?;
    usize::try_from(count).map_err(|_| Error::InvalidCount { what, count })
}

fn read_string(reader: &mut BinaryReader<'_>) -> Result<String> {
    let length = read_count(reader, "string length")?;
    Ok(reader.read_string_in_buffer(length)?.to_string())
}

fn read_vector3(reader: &mut BinaryReader<'_>) -> Result<Vector3> {
    Ok(Vector3::new(
        reader.read_f32()?,
        reader.read_f32()?,
        reader.read_f32()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RawBuilder(Vec<u8>);

    impl RawBuilder {
        fn i32(&mut self, v: i32) -> &mut Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn i16(&mut self, v: i16) -> &mut Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn f32(&mut self, v: f32) -> &mut Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn string(&mut self, s: &str, buffer: usize) -> &mut Self {
            self.i32(buffer as i32);
            let mut bytes = s.as_bytes().to_vec();
            bytes.resize(buffer, 0);
            self.0.extend_from_slice(&bytes);
            self
        }
    }

    fn single_triangle() -> Vec<u8> {
        let mut b = RawBuilder(Vec::new());
        b.i32(0x1234).i32(1).i32(1);
        b.string("CAR/BODY", 16);
        b.string("base_body", 12).i32(3).i32(1);
        for i in 0..16 {
            b.f32(if i % 5 == 0 { 1.0 } else { 0.0 });
        }
        for i in 0..3 {
            let x = i as f32;
            b.f32(x).f32(x + 10.0).f32(x + 20.0);
            b.f32(0.0).f32(0.0).f32(1.0);
        }
        b.i32(0).i16(0).i16(1).i16(2).i16(0);
        b.f32(0.1).f32(0.2).f32(0.3);
        b.f32(0.4).f32(0.5).f32(0.6);
        b.0
    }

    #[test]
    fn test_parse_single_triangle() {
        let mesh = parse(&single_triangle()).unwrap();

        assert_eq!(mesh.format, SourceFormat::RawBinary);
        assert_eq!(mesh.materials.len(), 1);
        assert_eq!(mesh.materials[0].name, "CAR/BODY");

        let object = &mesh.objects[0];
        assert_eq!(object.name, "base_body");
        assert_eq!(object.transform, Matrix4::IDENTITY);
        assert_eq!(object.vertices.len(), 3);
        assert_eq!(object.vertices[2].position, Vector3::new(2.0, 12.0, 22.0));
        assert_eq!(object.vertices[0].normal, Vector3::new(0.0, 0.0, 1.0));

        let tri = &object.triangles[0];
        assert_eq!(tri.vertices, [0, 1, 2]);
        assert_eq!(tri.material, MaterialRef::Index(0));
        assert_eq!(object.uvs[tri.uvs[1] as usize], Vector2::new(0.2, 0.5));
        assert!(tri.normals.is_none());
    }

    #[test]
    fn test_truncated_input() {
        let data = single_triangle();
        let result = parse(&data[..data.len() - 4]);
        assert!(matches!(result, Err(Error::Common(_))));
    }

    #[test]
    fn test_negative_count() {
        let mut b = RawBuilder(Vec::new());
        b.i32(0).i32(-1).i32(0);
        assert!(matches!(
            parse(&b.0),
            Err(Error::InvalidCount { what: "material", count: -1 })
        ));
    }

    #[test]
    fn test_face_index_out_of_range() {
        let mut data = single_triangle();
        // Third corner index of the only face.
        let face = data.len() - 24 - 8 - 4;
        let i3 = face + 4 + 4;
        data[i3..i3 + 2].copy_from_slice(&7i16.to_le_bytes());

        match parse(&data) {
            Err(Error::IndexOutOfRange { what, index, count, .. }) => {
                assert_eq!(what, "vertex");
                assert_eq!(index, 7);
                assert_eq!(count, 3);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
