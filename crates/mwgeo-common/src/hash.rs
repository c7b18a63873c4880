//! Name hashing for geometry identities.
//!
//! Parts, textures, shaders and mount points are all referenced by a 32-bit
//! hash of their (already resolved) name. The hash is a multiplicative
//! rolling hash seeded with all ones: `hash = hash * 33 + c` for each
//! UTF-16 code unit, wrapping on overflow.
//!
//! A name written as a hex literal (`0x1234ABCD`) is taken as the identifier
//! directly instead of being hashed.

use crate::{Error, Result};

/// Seed value of the rolling hash.
pub const HASH_SEED: u32 = u32::MAX;

/// Hash a name with the engine's rolling hash.
///
/// No case folding is applied here; callers hash the resolved name.
#[inline]
pub fn hash_str(s: &str) -> u32 {
    s.encode_utf16().fold(HASH_SEED, |hash, unit| {
        hash.wrapping_mul(33).wrapping_add(u32::from(unit))
    })
}

/// Parse a `0x`-prefixed hex literal.
///
/// Returns `Ok(None)` when the name has no hex prefix and an error when the
/// prefix is present but the remainder is not a valid 32-bit hex number.
pub fn parse_hash_literal(s: &str) -> Result<Option<u32>> {
    let digits = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => digits,
        None => return Ok(None),
    };

    u32::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|_| Error::InvalidHashLiteral(s.to_string()))
}

/// Hash a name, honouring hex literals.
pub fn hash_or_literal(s: &str) -> Result<u32> {
    Ok(parse_hash_literal(s)?.unwrap_or_else(|| hash_str(s)))
}

/// A 32-bit name hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameHash(pub u32);

impl NameHash {
    /// Create a new name hash from a string.
    pub fn from_name(s: &str) -> Self {
        Self(hash_str(s))
    }

    /// Create a name hash from a raw value.
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw hash value.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for NameHash {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for NameHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
