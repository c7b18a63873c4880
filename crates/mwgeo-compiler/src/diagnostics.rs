//! Non-fatal findings collected during compilation.

use std::fmt;

/// A problem that was worked around rather than treated as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Warning {
    /// A material name has no shader/texture separator.
    InvalidMaterialName { name: String },
    /// Mount points were found but no base part can carry them.
    MountPointsWithoutBase { count: usize },
    /// A cross-link names a target part that does not exist.
    NoSuchTargetPart { target: String, line: usize },
    /// A cross-link would mint a part that already exists.
    PartAlreadyExists { origin: String, line: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidMaterialName { name } => {
                write!(f, "material {} has invalid name", name)
            }
            Warning::MountPointsWithoutBase { count } => write!(
                f,
                "{} mount point(s) provided without any base parts, ignoring them",
                count
            ),
            Warning::NoSuchTargetPart { target, line } => {
                write!(f, "no such target part: {} at line {}", target, line)
            }
            Warning::PartAlreadyExists { origin, line } => {
                write!(f, "part already exists: {} at line {}", origin, line)
            }
        }
    }
}

/// Warnings in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
