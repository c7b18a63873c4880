//! Vector, matrix and bounds records.
//!
//! These are plain `repr(C)` records so they can be embedded directly in the
//! zerocopy on-disk structures of the geometry format.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A 2D vector, used for texture coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vector2 {
    pub u: f32,
    pub v: f32,
}

impl Vector2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new vector.
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    /// Raw bit patterns of the components.
    pub fn to_bits(&self) -> [u32; 2] {
        [self.u.to_bits(), self.v.to_bits()]
    }
}

/// A 3D vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a new vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(
            if other.x < self.x { other.x } else { self.x },
            if other.y < self.y { other.y } else { self.y },
            if other.z < self.z { other.z } else { self.z },
        )
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(
            if other.x > self.x { other.x } else { self.x },
            if other.y > self.y { other.y } else { self.y },
            if other.z > self.z { other.z } else { self.z },
        )
    }

    /// Extend to a 4D vector with `w = 0`.
    pub const fn extend(self) -> Vector4 {
        Vector4::new(self.x, self.y, self.z, 0.0)
    }

    /// Raw bit patterns of the components.
    pub fn to_bits(&self) -> [u32; 3] {
        [self.x.to_bits(), self.y.to_bits(), self.z.to_bits()]
    }
}

/// A 4D vector. Part bounds are stored with an unused `w`.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vector4 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new vector.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Drop the `w` component.
    pub const fn truncate(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// A row-major 4x4 matrix, translation in elements 12..15.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Matrix4 {
    pub m: [f32; 16],
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Create a matrix from its 16 row-major elements.
    pub const fn from_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    /// Identity matrix with the given translation.
    pub fn from_translation(t: Vector3) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.m[12] = t.x;
        matrix.m[13] = t.y;
        matrix.m[14] = t.z;
        matrix
    }

    /// Element at row `i`, column `j`.
    pub const fn get(&self, i: usize, j: usize) -> f32 {
        self.m[i * 4 + j]
    }

    /// Set the element at row `i`, column `j`.
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.m[i * 4 + j] = value;
    }

    /// The translation row.
    pub const fn translation(&self) -> Vector3 {
        Vector3::new(self.m[12], self.m[13], self.m[14])
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: Vector3,
    pub max: Vector3,
}

impl Bounds {
    /// Create bounds from explicit corners.
    pub const fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    /// Bounds of a point set.
    ///
    /// Initialised from the first point; an empty set yields zero bounds.
    pub fn from_points<I: IntoIterator<Item = Vector3>>(points: I) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::default();
        };
        points.fold(Self::new(first, first), |bounds, p| Self {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        })
    }

    /// Union of several bounds, min-of-mins and max-of-maxes.
    ///
    /// An empty set yields zero bounds.
    pub fn union_all<I: IntoIterator<Item = Bounds>>(bounds: I) -> Self {
        let mut bounds = bounds.into_iter();
        let Some(first) = bounds.next() else {
            return Self::default();
        };
        bounds.fold(first, |acc, b| Self {
            min: acc.min.min(b.min),
            max: acc.max.max(b.max),
        })
    }
}
