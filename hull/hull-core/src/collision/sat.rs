//! Separating-axis queries between two hulls.
//!
//! Both queries run in the second hull's local space: the relative transform
//! `inverse(t2) * t1` is composed once and reused for every face plane and
//! edge of the first hull, so the second hull's data needs no transform at
//! all.
//!
//! The face query maximizes the signed distance from a face plane of one
//! hull to the other hull's support point; the edge query maximizes the
//! projected separation over every edge pair that forms a face of the
//! Minkowski difference (Gauss-map arc crossing test). A positive distance
//! on any axis is authoritative proof of no collision.

use nalgebra::{Point3, Vector3};
use tracing::trace;

use crate::error::HullResult;
use crate::hull::{Hull, INVALID_INDEX};
use hull_types::Pose;

// ============================================================================
// Query results
// ============================================================================

/// Best separating face candidate of one hull against another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceQuery {
    /// Face index on the queried hull.
    pub face: u32,
    /// Signed distance from that face's plane to the other hull's support
    /// point (positive = separated along this face normal).
    pub distance: f64,
}

/// Best separating edge-pair candidate between two hulls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeQuery {
    /// Half-edge index on the first hull (even index of the twin pair), or
    /// [`EdgeQuery::NO_EDGE`] when no valid pair exists.
    pub edge1: u32,
    /// Half-edge index on the second hull, or [`EdgeQuery::NO_EDGE`].
    pub edge2: u32,
    /// Signed separation along the best edge-cross axis.
    pub distance: f64,
}

impl EdgeQuery {
    /// Sentinel for "no valid edge pair found".
    pub const NO_EDGE: u32 = INVALID_INDEX;

    /// Whether a valid edge pair was found.
    #[must_use]
    pub fn has_pair(&self) -> bool {
        self.edge1 != Self::NO_EDGE && self.edge2 != Self::NO_EDGE
    }
}

/// Aggregated result of all three separating-axis queries for one hull pair.
///
/// Read-only diagnostics data: the visualization layer polls this to draw
/// witness faces and edges without re-deriving them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    /// Face query of the first hull against the second.
    pub face1: FaceQuery,
    /// Face query of the second hull against the first.
    pub face2: FaceQuery,
    /// Edge query between the two hulls.
    pub edge: EdgeQuery,
    /// Whether every axis reported penetration.
    pub is_collision: bool,
}

// ============================================================================
// Face query
// ============================================================================

/// Find the face of `h1` whose plane is furthest along its own normal from
/// `h2`'s support point.
///
/// # Errors
///
/// [`crate::HullError::InvalidState`] when either hull has been disposed.
pub fn query_face_distance(
    t1: &Pose,
    h1: &Hull,
    t2: &Pose,
    h2: &Hull,
) -> HullResult<FaceQuery> {
    // Probe liveness once; the loops below use unchecked access.
    h1.vertex_at(0)?;
    h2.vertex_at(0)?;

    let transform = t2.inverse_mul(t1);
    let mut best = FaceQuery {
        face: 0,
        distance: f64::MIN,
    };
    for i in 0..h1.face_count() as u32 {
        let plane = h1.plane(i).transform_by(&transform);
        let support = h2.support_point(&-plane.normal);
        let distance = plane.distance(&support);
        if distance > best.distance {
            best = FaceQuery { face: i, distance };
        }
    }
    Ok(best)
}

// ============================================================================
// Edge query
// ============================================================================

/// Find the edge pair of `h1` and `h2` with the greatest separation along
/// the cross product of their directions.
///
/// Only pairs passing the Minkowski-face test are candidates; near-parallel
/// pairs score the [`f64::MIN`] sentinel and are never selected. Iteration
/// steps by two so each undirected edge (one twin pair) is visited once.
///
/// # Errors
///
/// [`crate::HullError::InvalidState`] when either hull has been disposed.
pub fn query_edge_distance(
    t1: &Pose,
    h1: &Hull,
    t2: &Pose,
    h2: &Hull,
) -> HullResult<EdgeQuery> {
    h1.vertex_at(0)?;
    h2.vertex_at(0)?;

    let transform = t2.inverse_mul(t1);
    let center1 = transform.transform_point(&h1.centroid_local());

    let mut best = EdgeQuery {
        edge1: EdgeQuery::NO_EDGE,
        edge2: EdgeQuery::NO_EDGE,
        distance: f64::MIN,
    };

    for i in (0..h1.edge_count() as u32).step_by(2) {
        let edge1 = h1.half_edge(i);
        let twin1 = h1.half_edge(i + 1);
        debug_assert_eq!(edge1.twin, i + 1, "half-edge twin pairing is broken");
        debug_assert_eq!(twin1.twin, i, "half-edge twin pairing is broken");

        let a1 = transform.transform_point(&h1.vertex(edge1.origin));
        let b1 = transform.transform_point(&h1.vertex(twin1.origin));
        let dir1 = b1 - a1;
        let n1a = transform.transform_vector(&h1.plane(edge1.face).normal);
        let n1b = transform.transform_vector(&h1.plane(twin1.face).normal);

        for j in (0..h2.edge_count() as u32).step_by(2) {
            let edge2 = h2.half_edge(j);
            let twin2 = h2.half_edge(j + 1);

            let a2 = h2.vertex(edge2.origin);
            let b2 = h2.vertex(twin2.origin);
            let dir2 = b2 - a2;
            let n2a = h2.plane(edge2.face).normal;
            let n2b = h2.plane(twin2.face).normal;

            if is_minkowski_face(&n1a, &n1b, &-dir1, &-n2a, &-n2b, &-dir2) {
                let distance = project_edge_separation(&a1, &dir1, &a2, &dir2, &center1);
                if distance > best.distance {
                    best = EdgeQuery {
                        edge1: i,
                        edge2: j,
                        distance,
                    };
                }
            }
        }
    }
    Ok(best)
}

/// Gauss-map test: does the edge pair form a face of the Minkowski
/// difference?
///
/// `a`/`b` are the face normals adjacent to the first edge and `bxa` its
/// direction; `c`/`d`/`dxc` likewise for the second edge. The pair is a
/// Minkowski face iff the two great-circle arcs properly cross.
#[must_use]
pub fn is_minkowski_face(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    bxa: &Vector3<f64>,
    c: &Vector3<f64>,
    d: &Vector3<f64>,
    dxc: &Vector3<f64>,
) -> bool {
    let bac = bxa.dot(c);
    let bad = bxa.dot(d);
    let dca = dxc.dot(a);
    let dcb = dxc.dot(b);

    bac * bad < 0.0 && dca * dcb < 0.0 && bac * dcb > 0.0
}

/// Relative tolerance below which an edge-cross axis is considered
/// degenerate (near-parallel edges).
const EDGE_PARALLEL_TOLERANCE: f64 = 0.005;

/// Separation of edge 2 from edge 1 along their cross-product axis.
///
/// The axis is oriented away from the first hull's centroid `c1`. Returns
/// [`f64::MIN`] when the edges are near-parallel and the axis is too
/// degenerate to trust.
#[must_use]
pub fn project_edge_separation(
    p1: &Point3<f64>,
    e1: &Vector3<f64>,
    p2: &Point3<f64>,
    e2: &Vector3<f64>,
    c1: &Point3<f64>,
) -> f64 {
    let axis = e1.cross(e2);
    let length = axis.norm();
    if length < EDGE_PARALLEL_TOLERANCE * (e1.norm_squared() * e2.norm_squared()).sqrt() {
        return f64::MIN;
    }
    let mut normal = axis / length;
    if normal.dot(&(c1 - p1)) > 0.0 {
        normal = -normal;
    }
    normal.dot(&(p2 - p1))
}

// ============================================================================
// Combined decision
// ============================================================================

/// Run all three separating-axis queries and combine them into the overall
/// collision decision.
///
/// Penetration exists iff every axis reports a non-positive distance; a
/// single positive distance is an authoritative separation witness.
///
/// # Errors
///
/// [`crate::HullError::InvalidState`] when either hull has been disposed.
pub fn collision_info(
    t1: &Pose,
    h1: &Hull,
    t2: &Pose,
    h2: &Hull,
) -> HullResult<CollisionInfo> {
    let face1 = query_face_distance(t1, h1, t2, h2)?;
    let face2 = query_face_distance(t2, h2, t1, h1)?;
    let edge = query_edge_distance(t1, h1, t2, h2)?;
    let is_collision = face1.distance <= 0.0 && face2.distance <= 0.0 && edge.distance <= 0.0;
    trace!(
        face1 = face1.distance,
        face2 = face2.distance,
        edge = edge.distance,
        is_collision,
        "separating-axis decision"
    );
    Ok(CollisionInfo {
        face1,
        face2,
        edge,
        is_collision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::box_hull;

    fn unit_cube() -> Hull {
        box_hull(Vector3::new(0.5, 0.5, 0.5)).unwrap()
    }

    #[test]
    fn separated_cubes_have_positive_face_distance() {
        let h1 = unit_cube();
        let h2 = unit_cube();
        let t1 = Pose::identity();
        let t2 = Pose::from_position(Point3::new(0.0, 0.0, 1.5));

        let query = query_face_distance(&t1, &h1, &t2, &h2).unwrap();
        assert!(
            (query.distance - 0.5).abs() < 1e-12,
            "expected 0.5 gap along z, got {}",
            query.distance
        );
        // The witness face must be the +z face.
        let normal = h1.plane_at(query.face as usize).unwrap().normal;
        assert!((normal - Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn overlapping_cubes_have_negative_distances_everywhere() {
        let h1 = unit_cube();
        let h2 = unit_cube();
        let t1 = Pose::identity();
        let t2 = Pose::from_position(Point3::new(0.0, 0.0, 0.5));

        let info = collision_info(&t1, &h1, &t2, &h2).unwrap();
        assert!(info.is_collision);
        assert!((info.face1.distance - (-0.5)).abs() < 1e-12);
        assert!((info.face2.distance - (-0.5)).abs() < 1e-12);
        // Axis-aligned cubes admit no valid (non-parallel) edge pair.
        assert!(info.edge.distance <= 0.0);
    }

    #[test]
    fn minkowski_face_rejects_non_crossing_arcs() {
        // Two edges of the same axis-aligned cube geometry, far apart on the
        // Gauss map: arcs do not cross.
        let a = Vector3::z();
        let b = Vector3::x();
        let bxa = b.cross(&a);
        let c = -Vector3::z();
        let d = -Vector3::x();
        let dxc = d.cross(&c);
        assert!(!is_minkowski_face(&a, &b, &bxa, &c, &d, &dxc));
    }

    #[test]
    fn parallel_edges_score_sentinel() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let e1 = Vector3::new(1.0, 0.0, 0.0);
        let p2 = Point3::new(0.0, 1.0, 0.0);
        let e2 = Vector3::new(2.0, 1.0e-5, 0.0);
        let c1 = Point3::new(0.0, -1.0, 0.0);
        assert_eq!(project_edge_separation(&p1, &e1, &p2, &e2, &c1), f64::MIN);
    }

    #[test]
    fn queries_are_bit_identical_across_calls() {
        let h1 = unit_cube();
        let h2 = unit_cube();
        let t1 = Pose::identity();
        let t2 = Pose::from_position(Point3::new(0.3, 0.2, 0.7));

        let f_a = query_face_distance(&t1, &h1, &t2, &h2).unwrap();
        let f_b = query_face_distance(&t1, &h1, &t2, &h2).unwrap();
        assert_eq!(f_a.face, f_b.face);
        assert_eq!(f_a.distance.to_bits(), f_b.distance.to_bits());

        let e_a = query_edge_distance(&t1, &h1, &t2, &h2).unwrap();
        let e_b = query_edge_distance(&t1, &h1, &t2, &h2).unwrap();
        assert_eq!((e_a.edge1, e_a.edge2), (e_b.edge1, e_b.edge2));
        assert_eq!(e_a.distance.to_bits(), e_b.distance.to_bits());
    }
}
