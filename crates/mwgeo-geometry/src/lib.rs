//! Chunked geometry file codec for mwgeo.
//!
//! A geometry file is a tree of chunks. Every chunk starts with an 8-byte
//! header (`u32` type, `i32` body length); a set top bit in the type marks a
//! parent whose body is itself a sequence of chunks.
//!
//! # File Layout
//!
//! ```text
//! Geometry
//! ├── Null                      padding to 0x10
//! ├── Parts
//! │   ├── PartsDesc             GeometryInfo
//! │   ├── PartsHash             sorted (hash, 0) pairs
//! │   ├── PartsOffset           sorted (hash, offset, length, length, 0, 0)
//! │   └── PartsEmpty
//! ├── Null                      padding to 0x80
//! ├── Part                      one per part, in insertion order
//! │   ├── PartDesc              PartInfo + padded name
//! │   ├── PartTextures
//! │   ├── PartShaders
//! │   ├── PartMountPoints       only when present
//! │   └── PartData
//! │       ├── PartDataDesc
//! │       ├── PartDataGroups
//! │       ├── PartDataIndices
//! │       └── PartDataVertices
//! └── ...
//! Null                          padding to 0x1000
//! ```
//!
//! Unknown leaves are skipped and unknown parents are descended into, so
//! files carrying extra chunk types still decode.
//!
//! # Example
//!
//! ```no_run
//! use mwgeo_geometry::GeometryFile;
//!
//! let file = GeometryFile::open("GEOMETRY.BIN")?;
//! for part in file.parts() {
//!     println!("{} {} ({} triangles)", part.hash(), part.name(), part.info.triangle_count);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod file;
mod reader;
mod records;

pub mod chunk;
pub mod model;
pub mod writer;

pub use chunk::{ChunkHeader, ChunkType};
pub use error::{Error, Result};
pub use file::GeometryFile;
pub use model::{
    DirectoryEntry, GeometryInfo, LodInfo, MountPoint, Part, PartData, PartInfo, ShadingGroup,
    Vertex,
};
pub use reader::ReadOptions;
pub use writer::ChunkWriter;
