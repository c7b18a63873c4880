//! Error types for the geometry compiler.

use mwgeo_source::MaterialRef;
use thiserror::Error;

/// Errors that abort a compilation.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] mwgeo_common::Error),

    /// The source mesh could not be read.
    #[error("source error: {0}")]
    Source(#[from] mwgeo_source::Error),

    /// The geometry file could not be read or written.
    #[error("geometry error: {0}")]
    Geometry(#[from] mwgeo_geometry::Error),

    /// A triangle refers to a material the scene does not define.
    #[error("object {object:?} refers to undefined material {reference}")]
    MissingMaterial {
        object: String,
        reference: MaterialRef,
    },

    /// A part has more vertices than a 16-bit index can address.
    #[error("part {part:?} has {vertices} vertices, more than 16-bit indices can address")]
    IndexOverflow { part: String, vertices: usize },

    /// A material override table names the same material twice.
    #[error("duplicate material override {name:?} at line {line}")]
    DuplicateOverride { name: String, line: usize },
}

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;
