//! Common utilities for mwgeo.
//!
//! This crate provides foundational types and utilities used across all mwgeo crates:
//!
//! - [`BinaryReader`] - Zero-copy binary reading from byte slices
//! - [`hash`] - The 32-bit name hash used for part, texture and shader identities
//! - [`math`] - Vector, matrix and bounds records shared by source and output models

mod error;
mod reader;

pub mod hash;
pub mod math;

pub use error::{Error, Result};
pub use hash::NameHash;
pub use math::{Bounds, Matrix4, Vector2, Vector3, Vector4};
pub use reader::{align_up, BinaryReader};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
