//! Error types for source mesh reading.

use thiserror::Error;

/// Errors that can occur when reading a source mesh.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] mwgeo_common::Error),

    /// The file extension does not name a supported source format.
    #[error("unsupported source file extension: {0:?}")]
    UnsupportedExtension(String),

    /// A count field in a binary source was negative.
    #[error("invalid {what} count: {count}")]
    InvalidCount { what: &'static str, count: i32 },

    /// A triangle refers to a vertex or texture coordinate that does not exist.
    #[error("object {object:?}: {what} index {index} out of range ({count} available)")]
    IndexOutOfRange {
        object: String,
        what: &'static str,
        index: i64,
        count: usize,
    },

    /// Not an ASCII scene export file.
    #[error("not a valid ASE file")]
    NotAse,

    /// The ASCII scene export version is not supported.
    #[error("unsupported ASE version {0} (expected 200)")]
    UnsupportedVersion(String),

    /// Malformed text on a given line.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The scene carries animation, which cannot be compiled.
    #[error("line {line}: only models without animation are supported (TIMEVALUE {time})")]
    Animated { line: usize, time: i64 },

    /// A sub-material declared its own sub-materials.
    #[error("line {line}: sub-material nested inside a sub-material")]
    NestedSubMaterial { line: usize },
}

/// Result type for source reading operations.
pub type Result<T> = std::result::Result<T, Error>;
