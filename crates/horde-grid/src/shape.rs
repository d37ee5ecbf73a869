//! Overlap primitives.
//!
//! All shapes live in world units. Rectangles are axis-aligned and stored as
//! min/max corners. Overlap tests are strict: two rectangles that only share
//! an edge do not overlap, so entities can stand flush against each other.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Rect {
    /// Creates a rectangle from its min/max corners.
    #[must_use]
    pub const fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a rectangle of the given size centered on `center`.
    #[must_use]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Width and height.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Half of [`Rect::size`].
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Returns the same rectangle moved by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Strict overlap test. Shared edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Returns true if `other` lies entirely inside this rectangle (edges inclusive).
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Returns true if the point is inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Returns true if both corners are finite and `min <= max` on each axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
    }
}

/// Circle used for radial damage requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center in world units
    pub center: Vec2,
    /// Radius in world units
    pub radius: f32,
}

impl Circle {
    /// Creates a new circle.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Circle-rectangle overlap using the closest point on the rectangle.
    ///
    /// A circle that only touches the rectangle boundary does not overlap it.
    #[must_use]
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        let closest = self.center.clamp(rect.min, rect.max);
        self.center.distance_squared(closest) < self.radius * self.radius
    }

    /// Smallest axis-aligned rectangle containing the circle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, Vec2::splat(self.radius * 2.0))
    }
}

/// Shape of a damage request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Rectangle-rectangle test
    Rect(Rect),
    /// Circle-rectangle test
    Circle(Circle),
}

impl Shape {
    /// Tests this shape against an entity's collision rectangle.
    #[must_use]
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        match self {
            Self::Rect(r) => r.overlaps(rect),
            Self::Circle(c) => c.overlaps_rect(rect),
        }
    }

    /// Bounding rectangle, used to pick the grid cells to scan.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::Circle(c) => c.bounds(),
        }
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Self::Circle(circle)
    }
}
