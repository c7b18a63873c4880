//! Turning a partitioned object into a part.

use mwgeo_common::{Bounds, NameHash};
use mwgeo_geometry::model::{DEFAULT_PART_FLAGS, DEFAULT_UV_MODE};
use mwgeo_geometry::{LodInfo, Part, PartData, PartInfo, ShadingGroup};
use mwgeo_source::SourceObject;

use crate::names::NameResolver;
use crate::partition::{Partition, SubMesh};
use crate::{Error, Result};

/// Texture slots per shading group; this pipeline fills all with one slot.
const TEXTURE_SLOTS: usize = 5;

/// Build the part for `object` from its partition.
///
/// Groups follow the submesh order. Buffers are concatenated in the same
/// order with each submesh's indices rebased by the vertices before it.
pub fn assemble_part(
    object: &SourceObject,
    partition: &Partition,
    resolver: &NameResolver,
) -> Result<Part> {
    let (name, hash) = resolver.part_hash(&object.name);

    let shaders = slot_hashes(&name, "shaders", partition.materials(), |m| {
        resolver.shader_hash(m)
    })?;
    let textures = slot_hashes(&name, "textures", partition.textures(), |t| {
        resolver.texture_hash(t)
    })?;

    let data = flatten(&name, partition.submeshes(), DEFAULT_PART_FLAGS)?;
    let triangle_count = object.triangles.len() as u32;

    let mut info = PartInfo::new(hash, name);
    info.triangle_count = triangle_count;
    info.bounds = Bounds::union_all(data.groups.iter().map(|g| g.bounds));
    info.transform = object.transform;
    info.textures = textures;
    info.shaders = shaders;
    info.lod = LodInfo::full(triangle_count);

    log::debug!(
        "{} ({}): {} vertices, {} triangles, {} group(s)",
        info.name,
        info.hash,
        data.vertices.len(),
        data.triangle_count(),
        data.groups.len()
    );
    Ok(Part::new(info, data))
}

fn slot_hashes<F>(part: &str, what: &'static str, names: &[String], hash: F) -> Result<Vec<NameHash>>
where
    F: Fn(&str) -> Result<NameHash>,
{
    if names.len() > u8::MAX as usize {
        return Err(mwgeo_geometry::Error::TooManyEntries {
            part: part.to_string(),
            what,
            count: names.len(),
        }
        .into());
    }
    names.iter().map(|n| hash(n)).collect()
}

/// Concatenate submeshes into one set of buffers with a group per submesh.
pub fn flatten(part: &str, submeshes: &[SubMesh], flags: u32) -> Result<PartData> {
    let total: usize = submeshes.iter().map(SubMesh::vertex_count).sum();
    if total > u16::MAX as usize + 1 {
        return Err(Error::IndexOverflow {
            part: part.to_string(),
            vertices: total,
        });
    }

    let mut data = PartData::new(flags);
    data.vertices.reserve(total);

    for submesh in submeshes {
        let base = data.vertices.len();
        let offset = data.indices.len();

        data.indices
            .extend(submesh.indices().iter().map(|&i| (base + i as usize) as u16));
        data.vertices.extend_from_slice(submesh.vertices());

        data.groups.push(ShadingGroup {
            bounds: submesh.bounds(),
            texture_slots: [submesh.texture as u8; TEXTURE_SLOTS],
            shader_slot: submesh.material as u8,
            uv_mode: DEFAULT_UV_MODE,
            flags,
            vertex_count: submesh.vertex_count() as u32,
            triangle_count: submesh.triangle_count() as u32,
            offset: offset as u32,
            length: submesh.indices().len() as u32,
        });
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::materials::MaterialLookup;
    use crate::names::MatTexPair;
    use crate::partition::tests::cube;
    use crate::partition::Convention;
    use crate::tables::MaterialTable;
    use mwgeo_common::hash::hash_str;
    use mwgeo_common::{Matrix4, Vector2, Vector3};
    use mwgeo_geometry::model::OPAQUE_DIFFUSE;
    use mwgeo_geometry::Vertex;
    use mwgeo_source::{MaterialRef, SourceFormat, SourceMaterial};

    fn compile_cube(materials: &[&str], split_at: usize) -> Part {
        let mut object = cube("kit00_body", MaterialRef::Index(0));
        for triangle in object.triangles.iter_mut().skip(split_at) {
            triangle.material = MaterialRef::Index(1);
        }
        object.transform = Matrix4::from_translation(Vector3::new(0.0, 0.0, 2.0));

        let materials: Vec<_> = materials.iter().map(|n| SourceMaterial::new(*n)).collect();
        let lookup = MaterialLookup::build(&materials, &MaterialTable::new(), &mut Diagnostics::new());
        let convention = Convention::for_format(SourceFormat::SceneExport);
        let partition = Partition::build(&object, &convention, &lookup, OPAQUE_DIFFUSE).unwrap();
        assemble_part(&object, &partition, &NameResolver::new("car01")).unwrap()
    }

    #[test]
    fn test_cube_part() {
        let part = compile_cube(&["carskin/x_skin1"], 12);

        assert_eq!(part.name(), "CAR01_KIT00_BODY");
        assert_eq!(part.hash().value(), hash_str("CAR01_KIT00_BODY"));
        assert_eq!(part.info.triangle_count, 12);
        assert_eq!(part.info.lod.triangles, 12.0);
        assert_eq!(part.info.shaders, [NameHash(hash_str("carskin"))]);
        assert_eq!(part.info.textures, [NameHash(hash_str("CAR01_SKIN1"))]);
        assert_eq!(part.info.transform.translation(), Vector3::new(0.0, 0.0, 2.0));

        let data = &part.data;
        assert_eq!(data.flags, DEFAULT_PART_FLAGS);
        assert_eq!(data.groups.len(), 1);
        let group = &data.groups[0];
        assert_eq!(group.vertex_count, 8);
        assert_eq!(group.triangle_count, 12);
        assert_eq!(group.offset, 0);
        assert_eq!(group.length, 36);
        assert_eq!(group.texture_slots, [0; 5]);
        assert_eq!(group.uv_mode, DEFAULT_UV_MODE);
        assert_eq!(
            part.info.bounds,
            Bounds::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0))
        );
        assert!(data.check_consistency().is_ok());
    }

    #[test]
    fn test_buffers_rebased_per_group() {
        let part = compile_cube(&["carskin/x_skin1", "chrome/chrome"], 4);
        let data = &part.data;

        assert_eq!(data.groups.len(), 2);
        assert_eq!(part.info.shaders.len(), 2);
        assert_eq!(part.info.textures.len(), 2);
        assert_eq!(data.groups[1].shader_slot, 1);
        assert_eq!(data.groups[1].texture_slots, [1; 5]);

        let first = &data.groups[0];
        let second = &data.groups[1];
        assert_eq!(second.offset, first.length);
        assert_eq!(
            (first.vertex_count + second.vertex_count) as usize,
            data.vertices.len()
        );
        assert_eq!(
            ((first.triangle_count + second.triangle_count) * 3) as usize,
            data.indices.len()
        );

        // Second group indices point past the first group's vertices.
        let tail = &data.indices[second.offset as usize..];
        assert!(tail.iter().all(|&i| i as u32 >= first.vertex_count));
        assert!(data.check_consistency().is_ok());
    }

    #[test]
    fn test_index_overflow() {
        let mut partition = Partition::new();
        let submesh = partition.submesh_for(&MatTexPair::new("a", "b"));
        for i in 0..=u16::MAX as u32 + 1 {
            let position = Vector3::new(i as f32, 0.0, 0.0);
            submesh.push_corner(Vertex::new(position, Vector3::ZERO, OPAQUE_DIFFUSE, Vector2::ZERO));
        }

        let err = flatten("big", partition.submeshes(), DEFAULT_PART_FLAGS).unwrap_err();
        assert!(matches!(err, Error::IndexOverflow { vertices: 65537, .. }));
    }

    #[test]
    fn test_empty_object() {
        let object = mwgeo_source::SourceObject::new("empty");
        let part = assemble_part(&object, &Partition::new(), &NameResolver::new("car01")).unwrap();
        assert!(part.data.groups.is_empty());
        assert_eq!(part.info.bounds, Bounds::default());
    }
}
