//! Text tables read alongside a source mesh.
//!
//! Both tables use the same line format:
//!
//! ```text
//! # comment
//! // comment
//! ; comment
//! name = value
//! ```
//!
//! Lines without `=` are ignored. Both sides are trimmed; for `a=b=c` only
//! the first two fields are used.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::{Error, Result};

const COMMENT_PREFIXES: [&str; 3] = ["#", "//", ";"];

/// Yield `(line number, name, value)` for each entry line, 1-based.
fn entries(text: &str) -> impl Iterator<Item = (usize, &str, &str)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        if COMMENT_PREFIXES.iter().any(|p| line.starts_with(p)) {
            return None;
        }
        let mut fields = line.split('=');
        let name = fields.next()?;
        let value = fields.next()?;
        Some((i + 1, name.trim(), value.trim()))
    })
}

/// Substitutes raw material names before they are split.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTable {
    entries: FxHashMap<String, String>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table. A name listed twice is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::new();
        for (line, name, value) in entries(text) {
            if table.entries.contains_key(name) {
                return Err(Error::DuplicateOverride {
                    name: name.to_string(),
                    line,
                });
            }
            table.insert(name, value);
        }
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Substitute for a raw material name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One `origin=target` line of a cross-link table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CrossLink {
    /// Name of the part to create.
    pub origin: String,
    /// Name of the existing part whose geometry is shared.
    pub target: String,
    /// 1-based line number in the table.
    pub line: usize,
}

/// Ordered list of part aliases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossLinkTable {
    links: Vec<CrossLink>,
}

impl CrossLinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let links = entries(text)
            .map(|(line, origin, target)| CrossLink {
                origin: origin.to_string(),
                target: target.to_string(),
                line,
            })
            .collect();
        Self { links }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn push(&mut self, origin: impl Into<String>, target: impl Into<String>) {
        let line = self.links.last().map_or(1, |l| l.line + 1);
        self.links.push(CrossLink {
            origin: origin.into(),
            target: target.into(),
            line,
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CrossLink> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<'a> IntoIterator for &'a CrossLinkTable {
    type Item = &'a CrossLink;
    type IntoIter = std::slice::Iter<'a, CrossLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}
