//! Geometric primitives for diagram positioning and connector routing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate (or displacement vector) in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned bounding box
//!
//! # Coordinate System
//!
//! Strata uses the SVG coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! The plane is unbounded; entity positions may be negative.

use serde::{Deserialize, Serialize};

/// A 2D point in diagram coordinate space.
///
/// The same type doubles as a displacement vector for routing math.
///
/// # Examples
///
/// ```
/// # use strata_core::geometry::Point;
/// let a = Point::new(100.0, 100.0);
/// let b = Point::new(300.0, 100.0);
///
/// let mid = a.midpoint(b);
/// assert_eq!(mid.x(), 200.0);
/// assert_eq!(mid.y(), 100.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Component-wise sum.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Component-wise difference, i.e. the vector from `other` to `self`.
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Length of the vector.
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns the unit-length left-hand normal of this vector.
    ///
    /// For a vector `(dx, dy)` the normal is `(-dy, dx) / |(dx, dy)|`. A zero
    /// vector has no direction, so its normal is the zero vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # use strata_core::geometry::Point;
    /// let normal = Point::new(200.0, 0.0).unit_normal();
    /// assert_eq!(normal, Point::new(0.0, 1.0));
    ///
    /// assert!(Point::default().unit_normal().is_zero());
    /// ```
    pub fn unit_normal(self) -> Self {
        let length = self.hypot();
        if length == 0.0 {
            return Self::default();
        }
        // `0.0 - x` keeps the sign of zero positive, unlike `-x`.
        Self {
            x: 0.0 - self.y / length,
            y: self.x / length,
        }
    }

    /// The box of `size` centered on this point.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::centered(self, size)
    }
}

/// Width and height of a shape's nominal box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Half width and half height, as a displacement.
    pub fn half_extents(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// An axis-aligned box, used for clipping envelopes and the SVG viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    pub fn centered(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// The smallest box covering both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use strata_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::centered(Point::new(0.0, 0.0), Size::new(20.0, 20.0));
    /// let b = Bounds::centered(Point::new(100.0, 50.0), Size::new(20.0, 20.0));
    ///
    /// let combined = a.merge(&b);
    /// assert_eq!(combined.min_x(), -10.0);
    /// assert_eq!(combined.max_y(), 60.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the box by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}
