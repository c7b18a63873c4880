//! Error types for mwgeo-common.

use thiserror::Error;

/// Errors raised by the shared reading and hashing utilities.
#[derive(Debug, Error)]
pub enum Error {
    /// A read ran past the end of the buffer.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// A `0x` prefixed name did not contain a valid 32-bit hex number.
    #[error("invalid hash literal: {0}")]
    InvalidHashLiteral(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A padded name has no NUL before the end of its chunk.
    #[error("padded name is missing its NUL terminator")]
    MissingNullTerminator,
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
