//! The compilation pipeline.

use std::path::Path;

use mwgeo_geometry::model::{OPAQUE_DIFFUSE, TRANSPARENT_DIFFUSE};
use mwgeo_geometry::GeometryFile;
use mwgeo_source::SourceMesh;

use crate::assemble::assemble_part;
use crate::crosslink::apply_cross_links;
use crate::diagnostics::Diagnostics;
use crate::materials::MaterialLookup;
use crate::mount::{attach_mount_points, mount_point};
use crate::names::{is_base_part, is_mount_point, NameResolver};
use crate::options::CompileOptions;
use crate::partition::{Convention, Partition};
use crate::Result;

/// A compiled file and the warnings raised while building it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Compilation {
    pub file: GeometryFile,
    pub diagnostics: Diagnostics,
}

/// Compiles source meshes with a fixed set of options.
pub struct Compiler<'a> {
    options: &'a CompileOptions,
    resolver: NameResolver,
}

impl<'a> Compiler<'a> {
    pub fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            resolver: NameResolver::new(options.xname.clone()),
        }
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    /// Load a source file by extension and compile it.
    pub fn compile_path<P: AsRef<Path>>(&self, path: P) -> Result<Compilation> {
        let path = path.as_ref();
        log::info!("loading source {}", path.display());
        let mesh = mwgeo_source::load(path)?;
        self.compile(&mesh)
    }

    /// Compile every object of `mesh` into a geometry file.
    ///
    /// Objects become parts in source order, except mount point objects,
    /// which are attached to the base parts once all objects are done.
    /// Cross links are applied last.
    pub fn compile(&self, mesh: &SourceMesh) -> Result<Compilation> {
        log::info!(
            "compiling {} object(s), {} material(s), xname {:?}",
            mesh.objects.len(),
            mesh.materials.len(),
            self.options.xname
        );

        let mut diagnostics = Diagnostics::new();
        let lookup = MaterialLookup::build(&mesh.materials, &self.options.materials, &mut diagnostics);
        let convention = Convention::for_format(mesh.format);

        let mut parts = Vec::with_capacity(mesh.objects.len());
        let mut base_parts = Vec::new();
        let mut mount_points = Vec::new();

        for object in &mesh.objects {
            if is_mount_point(&object.name) {
                log::debug!("{}: mount point", object.name);
                mount_points.push(mount_point(object, &convention, &self.resolver)?);
                continue;
            }

            let diffuse = if self.options.is_transparent(&object.name) {
                TRANSPARENT_DIFFUSE
            } else {
                OPAQUE_DIFFUSE
            };
            let partition = Partition::build(object, &convention, &lookup, diffuse)?;

            if is_base_part(&object.name) {
                base_parts.push(parts.len());
            }
            parts.push(assemble_part(object, &partition, &self.resolver)?);
        }

        if !mount_points.is_empty() {
            log::info!("merging {} mount point(s) into base parts", mount_points.len());
            attach_mount_points(&mut parts, &base_parts, &mount_points, &mut diagnostics);
        }

        let mut file = GeometryFile::new();
        for part in parts {
            file.add_part(part);
        }

        if !self.options.cross_links.is_empty() {
            log::info!("applying {} cross link(s)", self.options.cross_links.len());
            apply_cross_links(&mut file, &self.resolver, &self.options.cross_links, &mut diagnostics);
        }
        file.sync_part_count();

        log::info!(
            "compiled {} part(s) with {} warning(s)",
            file.part_count(),
            diagnostics.len()
        );
        Ok(Compilation { file, diagnostics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Warning;
    use crate::partition::tests::cube;
    use crate::tables::CrossLinkTable;
    use mwgeo_common::{Bounds, Matrix4, Vector3};
    use mwgeo_source::{MaterialRef, SourceFormat, SourceMaterial, SourceObject};

    fn scene(objects: Vec<SourceObject>) -> SourceMesh {
        let mut mesh = SourceMesh::new(SourceFormat::SceneExport);
        mesh.materials.push(SourceMaterial::new("carskin/x_skin1"));
        mesh.objects = objects;
        mesh
    }

    fn mount(name: &str) -> SourceObject {
        let mut object = SourceObject::new(name);
        object.transform = Matrix4::from_translation(Vector3::new(0.5, 1.0, 0.0));
        object
    }

    #[test]
    fn test_compile_cube() {
        let options = CompileOptions::new("car01");
        let mesh = scene(vec![cube("kit00_body", MaterialRef::Index(0))]);
        let compilation = Compiler::new(&options).compile(&mesh).unwrap();

        let file = &compilation.file;
        assert_eq!(file.part_count(), 1);
        assert_eq!(file.info().part_count, 1);
        let part = &file.parts()[0];
        assert_eq!(part.data.groups.len(), 1);
        assert_eq!(part.data.groups[0].vertex_count, 8);
        assert_eq!(part.data.groups[0].triangle_count, 12);
        assert_eq!(
            part.info.bounds,
            Bounds::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0))
        );
        assert!(compilation.diagnostics.is_empty());
    }

    #[test]
    fn test_compiled_file_round_trip() {
        let options = CompileOptions::new("car01");
        let mesh = scene(vec![
            cube("base_a", MaterialRef::Index(0)),
            mount("#wheel_fl"),
            cube("kit00_door", MaterialRef::Index(0)),
        ]);
        let compilation = Compiler::new(&options).compile(&mesh).unwrap();

        let bytes = compilation.file.to_bytes().unwrap();
        assert_eq!(bytes.len() % 0x1000, 0);
        let decoded = GeometryFile::parse(&bytes).unwrap();
        assert_eq!(decoded.parts(), compilation.file.parts());
        assert!(decoded.lookup(compilation.file.parts()[1].hash()).is_some());
    }

    #[test]
    fn test_mount_points_attach_to_base() {
        let options = CompileOptions::new("car01");
        let mesh = scene(vec![
            mount("#wheel_fl"),
            cube("base_a", MaterialRef::Index(0)),
            cube("kit00_door", MaterialRef::Index(0)),
            mount("#wheel_fr"),
        ]);
        let compilation = Compiler::new(&options).compile(&mesh).unwrap();
        let parts = compilation.file.parts();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].info.mount_points.len(), 2);
        assert!(parts[1].info.mount_points.is_empty());
        assert_eq!(
            parts[0].info.mount_points[0].transform.translation(),
            Vector3::new(-1.0, 0.5, 0.0)
        );
    }

    #[test]
    fn test_mount_point_without_base_part() {
        let options = CompileOptions::new("car01");
        let mesh = scene(vec![
            cube("kit00_door", MaterialRef::Index(0)),
            mount("#MOUNT_A"),
        ]);
        let compilation = Compiler::new(&options).compile(&mesh).unwrap();

        assert_eq!(compilation.file.part_count(), 1);
        assert!(compilation
            .file
            .parts()
            .iter()
            .all(|p| p.info.mount_points.is_empty()));
        assert_eq!(
            compilation.diagnostics.warnings(),
            [Warning::MountPointsWithoutBase { count: 1 }]
        );
    }

    #[test]
    fn test_cross_link_collision() {
        let options = CompileOptions::new("car01")
            .with_cross_links(CrossLinkTable::parse("a=b\nc=b\n"));
        let mesh = scene(vec![
            cube("a", MaterialRef::Index(0)),
            cube("b", MaterialRef::Index(0)),
        ]);
        let compilation = Compiler::new(&options).compile(&mesh).unwrap();

        assert_eq!(compilation.file.part_count(), 3);
        assert_eq!(compilation.file.info().part_count, 3);
        assert_eq!(compilation.file.parts()[2].name(), "CAR01_C");
        assert_eq!(
            compilation.diagnostics.warnings(),
            [Warning::PartAlreadyExists {
                origin: "a".to_string(),
                line: 1
            }]
        );
    }

    #[test]
    fn test_transparent_objects() {
        let options = CompileOptions::new("car01").with_transparent(["glass"]);
        let mesh = scene(vec![
            cube("glass", MaterialRef::Index(0)),
            cube("body", MaterialRef::Index(0)),
        ]);
        let compilation = Compiler::new(&options).compile(&mesh).unwrap();
        let parts = compilation.file.parts();

        assert!(parts[0].data.vertices.iter().all(|v| v.diffuse == TRANSPARENT_DIFFUSE));
        assert!(parts[1].data.vertices.iter().all(|v| v.diffuse == OPAQUE_DIFFUSE));
    }

    #[test]
    fn test_compile_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car.ase");
        std::fs::write(&path, "*3DSMAX_ASCIIEXPORT 200\n").unwrap();

        let options = CompileOptions::new("car01");
        let compilation = Compiler::new(&options).compile_path(&path).unwrap();
        assert_eq!(compilation.file.part_count(), 0);

        let missing = Compiler::new(&options).compile_path(dir.path().join("car.obj"));
        assert!(matches!(missing, Err(crate::Error::Source(_))));
    }
}
