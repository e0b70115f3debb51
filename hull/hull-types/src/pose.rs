//! Rigid transform type.
//!
//! A [`Pose`] is a position plus a unit-quaternion orientation. Collision
//! queries receive one pose per hull and compose them into a single
//! relative transform, so the only operations needed here are point/vector
//! transforms, their inverses, and relative composition.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and orientation of a rigid body.
///
/// # Example
///
/// ```
/// use hull_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Transform a vector from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// Compose `inverse(self) * other`: the transform that maps `other`'s
    /// local space into `self`'s local space.
    ///
    /// Both separating-axis queries work in the second hull's local frame,
    /// so this is composed once per query and reused for every face and
    /// edge.
    #[must_use]
    pub fn inverse_mul(&self, other: &Pose) -> Pose {
        let inv_rotation = self.rotation.inverse();
        Pose {
            position: Point3::from(inv_rotation * (other.position - self.position)),
            rotation: inv_rotation * other.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn transform_round_trip() {
        let pose = Pose::from_position_rotation(
            Point3::new(1.0, -2.0, 0.5),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        );
        let local = Point3::new(0.3, 0.7, -1.1);
        let world = pose.transform_point(&local);
        let back = pose.inverse_transform_point(&world);
        assert!((back - local).norm() < 1e-12);
    }

    #[test]
    fn inverse_mul_maps_between_local_frames() {
        let t1 = Pose::from_position(Point3::new(0.0, 0.0, 1.0));
        let t2 = Pose::from_position_rotation(
            Point3::new(2.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        );
        let rel = t2.inverse_mul(&t1);

        // A point in t1's local space, mapped through rel, must equal the
        // same point taken to world by t1 and back to local by t2.
        let p = Point3::new(0.25, -0.5, 0.75);
        let direct = rel.transform_point(&p);
        let via_world = t2.inverse_transform_point(&t1.transform_point(&p));
        assert!((direct - via_world).norm() < 1e-12);
    }

    #[test]
    fn identity_is_neutral() {
        let pose = Pose::identity();
        let p = Point3::new(4.0, 5.0, 6.0);
        assert_eq!(pose.transform_point(&p), p);
    }
}
