//! Name resolution and identity hashing.
//!
//! Every identity in a geometry file is the hash of an uppercase name. Part
//! names are minted by prefixing the X-Name (the car or object set being
//! compiled); texture names only pick up the X-Name when they start with the
//! `x_` placeholder, so they can match textures shipped with the game.

use mwgeo_common::hash::{hash_or_literal, parse_hash_literal};
use mwgeo_common::NameHash;

use crate::diagnostics::{Diagnostics, Warning};
use crate::tables::MaterialTable;
use crate::Result;

/// Name used for both halves of a material name that cannot be split.
pub const DEFAULT_NAME: &str = "DEFAULT";

/// Separator between the shader and texture halves of a material name.
pub const MATERIAL_SEPARATOR: char = '/';

/// Marks an object as a mount point rather than a part.
pub const MOUNT_POINT_MARKER: char = '#';

/// Parts whose object name starts with this prefix receive mount points.
pub const BASE_PART_PREFIX: &str = "BASE_";

const PLACEHOLDER_PREFIX: &str = "x_";

/// Applies the X-Name to raw names.
#[derive(Debug, Clone)]
pub struct NameResolver {
    xname: String,
}

impl NameResolver {
    pub fn new(xname: impl Into<String>) -> Self {
        Self {
            xname: xname.into(),
        }
    }

    pub fn xname(&self) -> &str {
        &self.xname
    }

    /// Mint a new identity name: `XNAME_NAME`, uppercased.
    pub fn resolve_force(&self, name: &str) -> String {
        format!("{}_{}", self.xname, name).to_uppercase()
    }

    /// Substitute the X-Name for a leading `x` placeholder, then uppercase.
    pub fn resolve(&self, name: &str) -> String {
        if name.starts_with(PLACEHOLDER_PREFIX) {
            format!("{}{}", self.xname.to_uppercase(), &name[1..]).to_uppercase()
        } else {
            name.to_uppercase()
        }
    }

    /// Identity of the part compiled from an object.
    pub fn part_hash(&self, object_name: &str) -> (String, NameHash) {
        let name = self.resolve_force(object_name);
        let hash = NameHash::from_name(&name);
        (name, hash)
    }

    /// Texture identity: a hex literal, or the hash of the resolved name.
    pub fn texture_hash(&self, texture: &str) -> Result<NameHash> {
        let hash = match parse_hash_literal(texture)? {
            Some(value) => value,
            None => mwgeo_common::hash::hash_str(&self.resolve(texture)),
        };
        Ok(NameHash(hash))
    }

    /// Shader identity: a hex literal, or the hash of the raw name.
    pub fn shader_hash(&self, material: &str) -> Result<NameHash> {
        Ok(NameHash(hash_or_literal(material)?))
    }

    /// Identity of a mount point object such as `#WHEEL_FL[2]`.
    ///
    /// The marker is dropped, the rest uppercased and cut at the first `[`.
    pub fn mount_hash(&self, object_name: &str) -> Result<NameHash> {
        let name = object_name
            .strip_prefix(MOUNT_POINT_MARKER)
            .unwrap_or(object_name)
            .to_uppercase();
        let name = match name.find('[') {
            Some(end) => &name[..end],
            None => &name,
        };
        Ok(NameHash(hash_or_literal(name)?))
    }
}

/// Whether an object describes a mount point.
pub fn is_mount_point(object_name: &str) -> bool {
    object_name.starts_with(MOUNT_POINT_MARKER)
}

/// Whether an object compiles into a base part.
pub fn is_base_part(object_name: &str) -> bool {
    object_name.to_uppercase().starts_with(BASE_PART_PREFIX)
}

/// The shader and texture halves of a material name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatTexPair {
    pub material: String,
    pub texture: String,
}

impl MatTexPair {
    pub fn new(material: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            texture: texture.into(),
        }
    }

    /// Split a raw material name, applying overrides first.
    ///
    /// Names without a separator fall back to [`DEFAULT_NAME`] for both
    /// halves and record a warning. Extra separators are ignored.
    pub fn split(raw: &str, overrides: &MaterialTable, diagnostics: &mut Diagnostics) -> Self {
        let name = overrides.get(raw).unwrap_or(raw);
        let mut fields = name.split(MATERIAL_SEPARATOR);

        match (fields.next(), fields.next()) {
            (Some(material), Some(texture)) => Self::new(material, texture),
            _ => {
                diagnostics.warn(Warning::InvalidMaterialName {
                    name: name.to_string(),
                });
                Self::new(DEFAULT_NAME, DEFAULT_NAME)
            }
        }
    }
}
