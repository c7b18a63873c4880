//! mwgeo - geometry compiler for Need for Speed: Most Wanted.
//!
//! This crate provides a unified interface to the mwgeo library ecosystem
//! for building and inspecting `geometry.bin` files.
//!
//! # Crates
//!
//! - [`mwgeo_common`] - Common utilities (binary reading, math records, name hash)
//! - [`mwgeo_source`] - Source mesh readers (`.mwr` raw binary, `.ase` scene export)
//! - [`mwgeo_geometry`] - Chunked `geometry.bin` reading and writing
//! - [`mwgeo_compiler`] - Source mesh to geometry file compilation
//!
//! # Example
//!
//! ```no_run
//! use mwgeo::prelude::*;
//!
//! // Compile a scene export
//! let options = CompileOptions::new("CAR01");
//! let compilation = Compiler::new(&options).compile_path("car01.ase")?;
//! compilation.file.save("geometry.bin")?;
//!
//! // Read it back and look a part up by hash
//! let file = GeometryFile::open("geometry.bin")?;
//! let hash = NameHash::from_name("CAR01_BASE_A");
//! if let Some(entry) = file.lookup(hash) {
//!     println!("{} at {:#x}, {} bytes", entry.hash, entry.offset, entry.length);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use mwgeo_common as common;
pub use mwgeo_compiler as compiler;
pub use mwgeo_geometry as geometry;
pub use mwgeo_source as source;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use mwgeo_common::{BinaryReader, Bounds, Matrix4, NameHash, Vector2, Vector3};
    pub use mwgeo_compiler::{
        apply_cross_links, CompileOptions, Compilation, Compiler, CrossLinkTable, Diagnostics,
        MaterialTable, NameResolver, Warning,
    };
    pub use mwgeo_geometry::{GeometryFile, Part, PartData, PartInfo, ReadOptions, ShadingGroup};
    pub use mwgeo_source::{SourceFormat, SourceMesh};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
