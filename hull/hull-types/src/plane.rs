//! Point-halfspace plane primitive.

use nalgebra::{Point3, Vector3};

use crate::pose::Pose;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A plane in normal-offset form: `dot(normal, p) == offset` for points `p`
/// on the plane.
///
/// The normal is expected to be unit length; every constructor in the hull
/// builder normalizes before storing. Planes are recomputed when moved into
/// another space, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    /// Unit normal of the plane.
    pub normal: Vector3<f64>,
    /// Distance from the origin along the normal: `dot(normal, point_on_plane)`.
    pub offset: f64,
}

impl Plane {
    /// Create a plane from a unit normal and an offset.
    #[must_use]
    pub const fn new(normal: Vector3<f64>, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// Create a plane from a unit normal and a point on the plane.
    #[must_use]
    pub fn from_point(normal: Vector3<f64>, point: &Point3<f64>) -> Self {
        Self {
            offset: normal.dot(&point.coords),
            normal,
        }
    }

    /// Signed distance from `point` to the plane (positive on the normal
    /// side).
    #[must_use]
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// The point on the plane closest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.distance(point) * self.normal
    }

    /// Recompute this plane in the space `pose` maps into.
    ///
    /// The normal rotates; the offset picks up the projection of the
    /// translation onto the rotated normal.
    #[must_use]
    pub fn transform_by(&self, pose: &Pose) -> Plane {
        let normal = pose.rotation * self.normal;
        Plane {
            normal,
            offset: self.offset + normal.dot(&pose.position.coords),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn distance_sign_convention() {
        let plane = Plane::new(Vector3::z(), 1.0);
        assert_eq!(plane.distance(&Point3::new(0.0, 0.0, 3.0)), 2.0);
        assert_eq!(plane.distance(&Point3::new(5.0, -5.0, 1.0)), 0.0);
        assert_eq!(plane.distance(&Point3::new(0.0, 0.0, -1.0)), -2.0);
    }

    #[test]
    fn closest_point_lies_on_plane() {
        let plane = Plane::new(Vector3::y(), -0.5);
        let projected = plane.closest_point(&Point3::new(1.0, 4.0, 2.0));
        assert!((projected - Point3::new(1.0, -0.5, 2.0)).norm() < 1e-12);
        assert!(plane.distance(&projected).abs() < 1e-12);
    }

    #[test]
    fn transform_matches_transformed_points() {
        let plane = Plane::new(Vector3::x(), 0.5);
        let pose = Pose::from_position_rotation(
            Point3::new(0.0, 2.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        );
        let moved = plane.transform_by(&pose);

        // A point on the original plane, pushed through the pose, must lie
        // on the transformed plane.
        let on_plane = Point3::new(0.5, 7.0, -3.0);
        let world = pose.transform_point(&on_plane);
        assert!(moved.distance(&world).abs() < 1e-12);
    }
}
