//! Error types for the geometry codec.

use thiserror::Error;

use crate::chunk::ChunkType;

/// Errors that can occur when reading or writing geometry files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] mwgeo_common::Error),

    /// A chunk claims a negative length or extends past the end of its buffer.
    #[error("chunk {chunk_type} at {offset:#x} has invalid length {length}")]
    InvalidChunkLength {
        chunk_type: ChunkType,
        offset: usize,
        length: i32,
    },

    /// A part-level leaf appeared before any part chunk.
    #[error("chunk {chunk_type} at {offset:#x} is outside of a part")]
    OrphanLeaf { chunk_type: ChunkType, offset: usize },

    /// `end_chunk` was called with no open chunk.
    #[error("chunk stack underflow: no open chunk to close")]
    ChunkStackUnderflow,

    /// The writer was finished while chunks were still open.
    #[error("{0} chunk(s) still open when finishing the file")]
    UnclosedChunks(usize),

    /// A table does not fit the 8-bit count field of a part descriptor.
    #[error("part {part}: {count} {what} exceed the limit of 255")]
    TooManyEntries {
        part: String,
        what: &'static str,
        count: usize,
    },

    /// The shading groups of a part do not describe its buffers.
    #[error("part {part}: {message}")]
    InconsistentPart { part: String, message: String },

    /// A size or offset does not fit its 32-bit field.
    #[error("{what} {value} does not fit in 32 bits")]
    Overflow { what: &'static str, value: usize },
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, Error>;
