//! Contact manifold output types.
//!
//! A [`Manifold`] is the bounded set of contact points plus a shared normal
//! describing one collision event between two hulls. Each point carries a
//! [`FeaturePair`] naming the edges that produced it, which lets a solver
//! match contact points across frames.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sentinel edge id for feature-pair slots not produced by any edge.
pub const NO_FEATURE: i32 = -1;

/// Fixed manifold capacity; see [`Manifold::MAX_POINTS`].
const MAX_MANIFOLD_POINTS: usize = 24;

/// Identifies the edges of each hull (or of the clip planes) that produced a
/// contact point.
///
/// Clipped vertices are not vertices of either hull; what identifies them
/// stably across frames is which incoming/outgoing edges they were derived
/// from. Slots hold [`NO_FEATURE`] when no edge of that hull was involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeaturePair {
    /// Incoming edge on the first hull.
    pub in_edge1: i32,
    /// Outgoing edge on the first hull.
    pub out_edge1: i32,
    /// Incoming edge on the second hull.
    pub in_edge2: i32,
    /// Outgoing edge on the second hull.
    pub out_edge2: i32,
}

impl FeaturePair {
    /// A feature pair with every slot empty.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            in_edge1: NO_FEATURE,
            out_edge1: NO_FEATURE,
            in_edge2: NO_FEATURE,
            out_edge2: NO_FEATURE,
        }
    }

    /// Swap the hull-1 and hull-2 halves.
    ///
    /// Used when contact generation ran with the hulls in reversed roles, so
    /// the emitted pairs keep slot 1 = first hull, slot 2 = second hull.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            in_edge1: self.in_edge2,
            out_edge1: self.out_edge2,
            in_edge2: self.in_edge1,
            out_edge2: self.out_edge1,
        }
    }
}

/// A single contact point between two hulls.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactPoint {
    /// Contact position in world space.
    pub position: Point3<f64>,
    /// Signed separation along the manifold normal (negative = penetration).
    pub distance: f64,
    /// The edges that produced this point.
    pub feature: FeaturePair,
}

/// Bounded contact-point set for one collision event.
///
/// Holds at most [`Manifold::MAX_POINTS`] points; pushes beyond capacity are
/// silently dropped. That is a deliberate fixed-capacity contract — a convex
/// face-face contact never needs more, and the solver consuming the manifold
/// indexes a fixed-size buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Manifold {
    /// Shared contact normal, pointing from the first hull toward the second.
    pub normal: Vector3<f64>,
    points: SmallVec<[ContactPoint; MAX_MANIFOLD_POINTS]>,
}

impl Manifold {
    /// Maximum number of contact points a manifold can hold.
    pub const MAX_POINTS: usize = MAX_MANIFOLD_POINTS;

    /// Create an empty manifold with the given normal.
    #[must_use]
    pub fn new(normal: Vector3<f64>) -> Self {
        Self {
            normal,
            points: SmallVec::new(),
        }
    }

    /// Add a contact point. Points beyond [`Manifold::MAX_POINTS`] are
    /// dropped without error.
    pub fn push(&mut self, point: ContactPoint) {
        if self.points.len() < Self::MAX_POINTS {
            self.points.push(point);
        }
    }

    /// Number of contact points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the manifold holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The contact points.
    #[must_use]
    pub fn points(&self) -> &[ContactPoint] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(z: f64) -> ContactPoint {
        ContactPoint {
            position: Point3::new(0.0, 0.0, z),
            distance: -0.1,
            feature: FeaturePair::none(),
        }
    }

    #[test]
    fn push_beyond_capacity_is_dropped() {
        let mut manifold = Manifold::new(Vector3::z());
        for i in 0..Manifold::MAX_POINTS + 8 {
            manifold.push(point_at(i as f64));
        }
        assert_eq!(manifold.len(), Manifold::MAX_POINTS);
        // The first MAX_POINTS pushes survive, later ones are ignored.
        assert_eq!(
            manifold.points()[Manifold::MAX_POINTS - 1].position.z,
            (Manifold::MAX_POINTS - 1) as f64
        );
    }

    #[test]
    fn swapped_exchanges_hull_halves() {
        let pair = FeaturePair {
            in_edge1: 1,
            out_edge1: 2,
            in_edge2: 3,
            out_edge2: 4,
        };
        let swapped = pair.swapped();
        assert_eq!(swapped.in_edge1, 3);
        assert_eq!(swapped.out_edge1, 4);
        assert_eq!(swapped.in_edge2, 1);
        assert_eq!(swapped.out_edge2, 2);
        assert_eq!(swapped.swapped(), pair);
    }
}
