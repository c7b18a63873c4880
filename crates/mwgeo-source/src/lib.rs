//! Source mesh readers for mwgeo.
//!
//! Both supported source formats are reduced to the same normalized model,
//! [`SourceMesh`]: a material table plus a list of named objects, each with a
//! transform, a vertex list, a texture coordinate list and a triangle list.
//!
//! # Formats
//!
//! - `.mwr` - a flat, fixed-layout binary export ([`raw`])
//! - `.ase` - the ASCII scene export text format ([`ase`])
//!
//! # Example
//!
//! ```no_run
//! use mwgeo_source::load;
//!
//! let mesh = load("car.ase")?;
//! for object in &mesh.objects {
//!     println!("{}: {} triangles", object.name, object.triangles.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod model;

pub mod ase;
pub mod raw;

use std::fs;
use std::path::Path;

pub use error::{Error, Result};
pub use model::{
    MaterialRef, SourceFormat, SourceMaterial, SourceMesh, SourceObject, SourceTriangle,
    SourceVertex,
};

/// Load a source mesh, choosing the reader from the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SourceMesh> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let format = SourceFormat::from_extension(&extension)
        .ok_or_else(|| Error::UnsupportedExtension(extension.clone()))?;

    match format {
        SourceFormat::RawBinary => {
            let data = fs::read(path)?;
            raw::parse(&data)
        }
        SourceFormat::SceneExport => {
            let text = fs::read_to_string(path)?;
            ase::parse(&text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.obj");
        std::fs::write(&path, b"v 0 0 0").unwrap();

        match load(&path) {
            Err(Error::UnsupportedExtension(ext)) => assert_eq!(ext, "obj"),
            other => panic!("expected unsupported extension, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EMPTY.ASE");
        std::fs::write(&path, "*3DSMAX_ASCIIEXPORT 200\n").unwrap();

        let mesh = load(&path).unwrap();
        assert_eq!(mesh.format, SourceFormat::SceneExport);
        assert!(mesh.objects.is_empty());
    }
}
