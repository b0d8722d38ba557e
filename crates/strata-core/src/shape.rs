//! Entity shapes and connector clipping.
//!
//! Every [`EntityShape`] has a fixed nominal bounding box tied to the default
//! render size. Connectors are clipped against that box, not against the true
//! outline, so diamonds and triangles are approximated by their envelope.

use std::{fmt, str};

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};

/// Nominal bounding box of a rectangle entity.
pub const RECTANGLE_SIZE: Size = Size::new(140.0, 80.0);
/// Nominal bounding box of a circle entity.
pub const CIRCLE_SIZE: Size = Size::new(100.0, 100.0);
/// Nominal bounding box of a diamond entity.
pub const DIAMOND_SIZE: Size = Size::new(143.0, 110.0);
/// Nominal bounding box of a triangle entity.
pub const TRIANGLE_SIZE: Size = Size::new(120.0, 100.0);

/// The outline drawn for an entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityShape {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Diamond,
}

impl EntityShape {
    /// All shapes, in palette order.
    pub const ALL: [EntityShape; 4] = [
        EntityShape::Rectangle,
        EntityShape::Circle,
        EntityShape::Triangle,
        EntityShape::Diamond,
    ];

    /// Returns the fixed bounding box used for connector clipping.
    pub fn nominal_size(self) -> Size {
        match self {
            Self::Rectangle => RECTANGLE_SIZE,
            Self::Circle => CIRCLE_SIZE,
            Self::Diamond => DIAMOND_SIZE,
            Self::Triangle => TRIANGLE_SIZE,
        }
    }

    /// Returns the serialized token, e.g. `"RECTANGLE"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "RECTANGLE",
            Self::Circle => "CIRCLE",
            Self::Triangle => "TRIANGLE",
            Self::Diamond => "DIAMOND",
        }
    }
}

impl fmt::Display for EntityShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for EntityShape {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RECTANGLE" => Ok(Self::Rectangle),
            "CIRCLE" => Ok(Self::Circle),
            "TRIANGLE" => Ok(Self::Triangle),
            "DIAMOND" => Ok(Self::Diamond),
            _ => Err("Invalid entity shape"),
        }
    }
}

/// Clips the segment running from `far` to `near` at the boundary of a box of
/// `size` centered on `near`.
///
/// With `(dx, dy) = near - far`, the scale is
/// `min((w/2)/|dx|, (h/2)/|dy|)` where a zero component contributes an
/// infinite scale, and the result is `near - (dx, dy) * scale`. Coincident
/// points have no direction and return `near` unchanged.
///
/// # Examples
///
/// ```
/// # use strata_core::geometry::{Point, Size};
/// # use strata_core::shape::clip_to_bounding_box;
/// let clipped = clip_to_bounding_box(
///     Point::new(300.0, 100.0),
///     Point::new(100.0, 100.0),
///     Size::new(140.0, 80.0),
/// );
/// assert_eq!(clipped, Point::new(170.0, 100.0));
/// ```
pub fn clip_to_bounding_box(far: Point, near: Point, size: Size) -> Point {
    let delta = near.sub_point(far);
    if delta.is_zero() {
        return near;
    }

    let half = size.half_extents();
    let scale = axis_scale(half.x(), delta.x()).min(axis_scale(half.y(), delta.y()));

    near.sub_point(delta.scale(scale))
}

fn axis_scale(half_extent: f32, component: f32) -> f32 {
    if component == 0.0 {
        f32::INFINITY
    } else {
        half_extent / component.abs()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn assert_point_eq(actual: Point, expected: Point) {
        assert_approx_eq!(f32, actual.x(), expected.x());
        assert_approx_eq!(f32, actual.y(), expected.y());
    }

    #[test]
    fn test_clip_from_right() {
        // Approaching a 40x40 box at (100,100) from (200,100) hits the right edge.
        let result = clip_to_bounding_box(
            Point::new(200.0, 100.0),
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );

        assert_point_eq(result, Point::new(120.0, 100.0));
    }

    #[test]
    fn test_clip_from_left() {
        let result = clip_to_bounding_box(
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );

        assert_point_eq(result, Point::new(80.0, 100.0));
    }

    #[test]
    fn test_clip_from_bottom() {
        let result = clip_to_bounding_box(
            Point::new(100.0, 200.0),
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );

        assert_point_eq(result, Point::new(100.0, 120.0));
    }

    #[test]
    fn test_clip_from_top() {
        let result = clip_to_bounding_box(
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );

        assert_point_eq(result, Point::new(100.0, 80.0));
    }

    #[test]
    fn test_clip_diagonal_hits_corner() {
        let result = clip_to_bounding_box(
            Point::new(200.0, 200.0),
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );

        assert_point_eq(result, Point::new(120.0, 120.0));
    }

    #[test]
    fn test_clip_shallow_angle_hits_vertical_edge() {
        // dx=200, dy=50 against 140x80: scaleX=0.35, scaleY=0.8, so the
        // vertical edge is reached first.
        let result = clip_to_bounding_box(
            Point::new(300.0, 150.0),
            Point::new(100.0, 100.0),
            RECTANGLE_SIZE,
        );

        assert_point_eq(result, Point::new(170.0, 117.5));
    }

    #[test]
    fn test_rectangle_half_width_horizontally() {
        let near = Point::new(100.0, 100.0);
        let result = clip_to_bounding_box(Point::new(-500.0, 100.0), near, RECTANGLE_SIZE);

        assert_approx_eq!(f32, near.x() - result.x(), 70.0);
        assert_approx_eq!(f32, result.y(), 100.0);
    }

    #[test]
    fn test_rectangle_half_height_vertically() {
        let near = Point::new(100.0, 100.0);
        let result = clip_to_bounding_box(Point::new(100.0, 400.0), near, RECTANGLE_SIZE);

        assert_approx_eq!(f32, result.y() - near.y(), 40.0);
        assert_approx_eq!(f32, result.x(), 100.0);
    }

    #[test]
    fn test_clip_same_point_returns_near() {
        let near = Point::new(100.0, 100.0);
        let result = clip_to_bounding_box(near, near, RECTANGLE_SIZE);

        assert_point_eq(result, near);
    }

    #[test]
    fn test_clip_zero_size_returns_near() {
        let near = Point::new(100.0, 100.0);
        let result = clip_to_bounding_box(Point::new(200.0, 100.0), near, Size::new(0.0, 0.0));

        assert_point_eq(result, near);
    }

    #[test]
    fn test_nominal_sizes() {
        assert_eq!(EntityShape::Rectangle.nominal_size(), Size::new(140.0, 80.0));
        assert_eq!(EntityShape::Circle.nominal_size(), Size::new(100.0, 100.0));
        assert_eq!(EntityShape::Diamond.nominal_size(), Size::new(143.0, 110.0));
        assert_eq!(EntityShape::Triangle.nominal_size(), Size::new(120.0, 100.0));
    }

    #[test]
    fn test_shape_from_str() {
        assert_eq!("diamond".parse::<EntityShape>(), Ok(EntityShape::Diamond));
        assert_eq!("CIRCLE".parse::<EntityShape>(), Ok(EntityShape::Circle));
        assert!("hexagon".parse::<EntityShape>().is_err());
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn shape_strategy() -> impl Strategy<Value = EntityShape> {
        prop::sample::select(EntityShape::ALL.to_vec())
    }

    /// The clipped point is finite and lies on the box edge (or is `near`).
    fn check_clip_on_boundary(far: Point, near: Point, shape: EntityShape) -> Result<(), TestCaseError> {
        let size = shape.nominal_size();
        let result = clip_to_bounding_box(far, near, size);

        prop_assert!(result.x().is_finite(), "x is not finite: {result:?}");
        prop_assert!(result.y().is_finite(), "y is not finite: {result:?}");

        if far == near {
            prop_assert_eq!(result, near);
            return Ok(());
        }

        let half = size.half_extents();
        let offset = result.sub_point(near);
        let (dx, dy) = (offset.x().abs(), offset.y().abs());
        let on_vertical_edge = approx_eq!(f32, dx, half.x(), epsilon = 0.1);
        let on_horizontal_edge = approx_eq!(f32, dy, half.y(), epsilon = 0.1);

        prop_assert!(
            on_vertical_edge || on_horizontal_edge,
            "{result:?} is not on the boundary of {size:?} at {near:?}"
        );
        prop_assert!(dx <= half.x() + 0.1 && dy <= half.y() + 0.1);
        Ok(())
    }

    /// The clipped point lies on the segment's supporting line, on the far side.
    fn check_clip_points_toward_far(far: Point, near: Point) -> Result<(), TestCaseError> {
        prop_assume!(far.sub_point(near).hypot() > 1.0);
        let result = clip_to_bounding_box(far, near, EntityShape::Rectangle.nominal_size());

        let to_far = far.sub_point(near);
        let to_result = result.sub_point(near);
        let cross = to_far.x() * to_result.y() - to_far.y() * to_result.x();
        let dot = to_far.x() * to_result.x() + to_far.y() * to_result.y();

        prop_assert!(cross.abs() <= 1e-2 * to_far.hypot() * to_result.hypot().max(1.0));
        prop_assert!(dot >= 0.0);
        Ok(())
    }

    proptest! {
        #[test]
        fn clip_on_boundary(far in point_strategy(), near in point_strategy(), shape in shape_strategy()) {
            check_clip_on_boundary(far, near, shape)?;
        }

        #[test]
        fn clip_points_toward_far(far in point_strategy(), near in point_strategy()) {
            check_clip_points_toward_far(far, near)?;
        }
    }
}
