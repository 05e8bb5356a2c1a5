//! Vector and box primitives shared by the engine and the data model.
//!
//! Positions and dimensions share one vector type; placed cargo is checked
//! against the container and against itself through axis-aligned bounding boxes.

use std::cmp::Ordering;
use std::ops::Add;

/// Tolerance for coincident surfaces.
///
/// Items sit flush against each other and against the container walls, so
/// faces closer than this count as touching, not overlapping.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// A point or a size along the three container axes.
///
/// x runs along the width, y along the depth (towards the door), z upwards.
///
/// # Examples
/// ```
/// use load_planner::types::Vec3;
///
/// let position = Vec3::new(90.0, 0.0, 0.0);
/// let dims = Vec3::new(90.0, 190.0, 28.0);
/// assert_eq!((position + dims).x, 180.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The container origin: left, front, floor.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Tuple form used by the serialized records.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Product of the three components.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Footprint area (width × depth).
    #[inline]
    pub fn base_area(&self) -> f64 {
        self.x * self.y
    }

    /// Whether no component exceeds the matching component of `outer`.
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x <= outer.x + tolerance
            && self.y <= outer.y + tolerance
            && self.z <= outer.z + tolerance
    }

    /// Ordering used to scan candidate points: height first, then depth, then width.
    pub fn scan_cmp(&self, other: &Self) -> Ordering {
        self.z
            .total_cmp(&other.z)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.x.total_cmp(&other.x))
    }

    #[inline]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Anything with a box-shaped extent.
pub trait Dimensional {
    fn dimensions(&self) -> Vec3;

    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    fn base_area(&self) -> f64 {
        self.dimensions().base_area()
    }
}

/// Anything with a weight in kg.
pub trait Weighted {
    fn weight(&self) -> f64;
}

/// Axis-aligned box between two corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Left, front, bottom corner
    pub min: Vec3,
    /// Right, back, top corner
    pub max: Vec3,
}

impl BoundingBox {
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Whether the two boxes share a volume.
    ///
    /// Faces closer than `tolerance` are treated as touching.
    #[inline]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        !(self.max.x <= other.min.x + tolerance
            || other.max.x <= self.min.x + tolerance
            || self.max.y <= other.min.y + tolerance
            || other.max.y <= self.min.y + tolerance
            || self.max.z <= other.min.z + tolerance
            || other.max.z <= self.min.z + tolerance)
    }

    /// Length shared by two intervals, zero if disjoint.
    #[inline]
    pub fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
        (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
    }

    /// Area shared by the two footprints.
    #[inline]
    pub fn overlap_area_xy(&self, other: &Self) -> f64 {
        Self::overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x)
            * Self::overlap_1d(self.min.y, self.max.y, other.min.y, other.max.y)
    }

    /// Checks if a point lies in the half-open box `[min, max)`.
    ///
    /// Any box anchored at such a point would overlap this one.
    #[inline]
    pub fn contains_point(&self, point: &Vec3, tolerance: f64) -> bool {
        point.x >= self.min.x - tolerance
            && point.x < self.max.x - tolerance
            && point.y >= self.min.y - tolerance
            && point.y < self.max.y - tolerance
            && point.z >= self.min.z - tolerance
            && point.z < self.max.z - tolerance
    }

    #[inline]
    pub fn top_z(&self) -> f64 {
        self.max.z
    }
}
