//! Material lookup for a whole scene.

use mwgeo_source::{MaterialRef, SourceMaterial};
use rustc_hash::FxHashMap;

use crate::diagnostics::Diagnostics;
use crate::names::MatTexPair;
use crate::tables::MaterialTable;

/// Shader/texture pairs for every material and sub-material of a scene.
///
/// Names are split once up front, so an unsplittable name is reported once
/// no matter how many triangles use it.
#[derive(Debug, Clone, Default)]
pub struct MaterialLookup {
    pairs: FxHashMap<MaterialRef, MatTexPair>,
}

impl MaterialLookup {
    pub fn build(
        materials: &[SourceMaterial],
        overrides: &MaterialTable,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut pairs = FxHashMap::default();
        for (i, material) in materials.iter().enumerate() {
            let index = i as u32;
            pairs.insert(
                MaterialRef::Index(index),
                MatTexPair::split(&material.name, overrides, diagnostics),
            );
            for (j, sub) in material.sub_materials.iter().enumerate() {
                pairs.insert(
                    MaterialRef::Sub(index, j as u32),
                    MatTexPair::split(sub, overrides, diagnostics),
                );
            }
        }
        Self { pairs }
    }

    pub fn get(&self, reference: MaterialRef) -> Option<&MatTexPair> {
        self.pairs.get(&reference)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
