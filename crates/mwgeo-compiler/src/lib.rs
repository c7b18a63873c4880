//! Geometry compiler for mwgeo.
//!
//! Turns a [`SourceMesh`](mwgeo_source::SourceMesh) into a
//! [`GeometryFile`](mwgeo_geometry::GeometryFile) ready to be written as
//! `geometry.bin`.
//!
//! # Pipeline
//!
//! 1. **Names** ([`names`]): the X-Name prefix is applied to object names and
//!    `x_` texture placeholders, and every identity is hashed.
//! 2. **Partition** ([`partition`]): each object's triangles are grouped by
//!    shader/texture pair, converting axes and winding per source format and
//!    deduplicating vertices with a [`UniqueList`].
//! 3. **Assembly** ([`assemble`]): every group becomes a shading group over
//!    one shared vertex and 16-bit index buffer.
//! 4. **Mount points** ([`mount`]): `#` objects are attached to `BASE_` parts.
//! 5. **Cross links** ([`crosslink`]): aliases of existing parts are added.
//!
//! Naming problems never abort a compilation; they are collected as
//! [`Warning`]s in the returned [`Diagnostics`].
//!
//! # Example
//!
//! ```no_run
//! use mwgeo_compiler::{CompileOptions, Compiler, CrossLinkTable};
//!
//! let options = CompileOptions::new("CAR01")
//!     .with_cross_links(CrossLinkTable::from_path("xlink.txt")?);
//! let compilation = Compiler::new(&options).compile_path("car01.ase")?;
//! for warning in compilation.diagnostics.warnings() {
//!     eprintln!("warning: {}", warning);
//! }
//! compilation.file.save("geometry.bin")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod compiler;
mod diagnostics;
mod error;
mod materials;
mod options;
mod tables;
mod unique;

pub mod assemble;
pub mod crosslink;
pub mod mount;
pub mod names;
pub mod partition;

pub use compiler::{Compilation, Compiler};
pub use crosslink::apply_cross_links;
pub use diagnostics::{Diagnostics, Warning};
pub use error::{Error, Result};
pub use materials::MaterialLookup;
pub use names::{MatTexPair, NameResolver};
pub use options::CompileOptions;
pub use tables::{CrossLink, CrossLinkTable, MaterialTable};
pub use unique::UniqueList;
