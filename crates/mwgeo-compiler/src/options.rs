//! Compiler configuration.

use rustc_hash::FxHashSet;

use crate::tables::{CrossLinkTable, MaterialTable};

/// Everything a compilation depends on besides the source mesh.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Prefix applied to part names and `x_` texture placeholders.
    pub xname: String,
    /// Material name substitutions.
    pub materials: MaterialTable,
    /// Part aliases created after assembly.
    pub cross_links: CrossLinkTable,
    /// Object names whose vertices get the transparent tint.
    pub transparent: FxHashSet<String>,
}

impl CompileOptions {
    pub fn new(xname: impl Into<String>) -> Self {
        Self {
            xname: xname.into(),
            ..Self::default()
        }
    }

    pub fn with_materials(mut self, materials: MaterialTable) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_cross_links(mut self, cross_links: CrossLinkTable) -> Self {
        self.cross_links = cross_links;
        self
    }

    pub fn with_transparent<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transparent.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether an object is drawn with the transparent tint.
    pub fn is_transparent(&self, object_name: &str) -> bool {
        self.transparent.contains(object_name)
    }
}
