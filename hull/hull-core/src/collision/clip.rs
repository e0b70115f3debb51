//! Contact-manifold generation by polygon clipping.
//!
//! Face contact: the governing face's plane becomes the reference; the most
//! anti-parallel face on the other hull is the incident polygon, which is
//! clipped Sutherland-Hodgman style against one side plane per reference
//! boundary edge. Survivors below the reference plane become contact
//! points, projected onto it.
//!
//! Edge contact: a single point at the midpoint of the closest points
//! between the two witness edge segments.
//!
//! All scratch polygons are small inline buffers scoped to one call; nothing
//! here touches shared state, so any number of pairs can clip concurrently.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use hull_types::{ContactPoint, FeaturePair, Manifold, Plane, Pose, NO_FEATURE};

use crate::hull::Hull;

/// Inline capacity for clip scratch polygons. Merged faces rarely exceed a
/// handful of vertices; clipping can add at most one vertex per side plane.
const CLIP_INLINE: usize = 16;

/// A polygon vertex during clipping, tagged with the edges that produced it.
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    position: Point3<f64>,
    feature: FeaturePair,
}

type ClipPolygon = SmallVec<[ClipVertex; CLIP_INLINE]>;

/// One clip plane derived from a reference-face boundary edge.
#[derive(Debug, Clone, Copy)]
struct ClipPlane {
    plane: Plane,
    edge_id: u32,
}

/// Face index on `hull` whose world-space normal is most anti-parallel to
/// `reference_normal`.
fn incident_face_index(reference_normal: &Vector3<f64>, t: &Pose, hull: &Hull) -> u32 {
    let mut min_index = 0u32;
    let mut min_dot = reference_normal.dot(&t.transform_vector(&hull.plane(0).normal));
    for i in 1..hull.face_count() as u32 {
        let dot = reference_normal.dot(&t.transform_vector(&hull.plane(i).normal));
        if dot < min_dot {
            min_dot = dot;
            min_index = i;
        }
    }
    min_index
}

/// World-space polygon of a face, walked along its half-edge loop.
///
/// Each vertex is the far endpoint of the current half-edge (the twin's
/// origin) and is tagged with the loop edge entering and leaving it, in the
/// hull-2 half of the feature pair.
fn face_polygon(t: &Pose, hull: &Hull, face_index: u32) -> ClipPolygon {
    let mut polygon = ClipPolygon::new();
    let start = hull.face(face_index).edge;
    let mut current = start;
    loop {
        let edge = hull.half_edge(current);
        let twin = hull.half_edge(edge.twin);
        polygon.push(ClipVertex {
            position: t.transform_point(&hull.vertex(twin.origin)),
            feature: FeaturePair {
                in_edge1: NO_FEATURE,
                out_edge1: NO_FEATURE,
                in_edge2: current as i32,
                out_edge2: edge.next as i32,
            },
        });
        current = edge.next;
        if current == start {
            break;
        }
    }
    polygon
}

/// Side planes of the reference face, one per boundary edge.
///
/// Each plane contains the edge and faces outward from the face interior:
/// its normal is the edge direction crossed with the face normal.
fn side_planes(
    t: &Pose,
    hull: &Hull,
    face_index: u32,
    face_normal: &Vector3<f64>,
) -> SmallVec<[ClipPlane; CLIP_INLINE]> {
    let mut planes = SmallVec::new();
    let start = hull.face(face_index).edge;
    let mut current = start;
    loop {
        let edge = hull.half_edge(current);
        let twin = hull.half_edge(edge.twin);
        let edge_start = t.transform_point(&hull.vertex(edge.origin));
        let edge_end = t.transform_point(&hull.vertex(twin.origin));
        let normal = (edge_end - edge_start).cross(face_normal).normalize();
        planes.push(ClipPlane {
            plane: Plane::from_point(normal, &edge_start),
            edge_id: current,
        });
        current = edge.next;
        if current == start {
            break;
        }
    }
    planes
}

/// One Sutherland-Hodgman step: clip `input` against `plane`, keeping the
/// non-positive side.
///
/// A synthesized crossing vertex records the clip plane's edge id on the
/// hull-1 half of its feature pair (incoming when entering the kept side,
/// outgoing when leaving) and inherits the hull-2 half from the endpoint on
/// the kept side.
fn clip_polygon_against_plane(
    input: &ClipPolygon,
    plane: &Plane,
    clip_edge_id: u32,
    output: &mut ClipPolygon,
) {
    for (i, a) in input.iter().enumerate() {
        let b = &input[(i + 1) % input.len()];
        let da = plane.distance(&a.position);
        let db = plane.distance(&b.position);

        if da <= 0.0 {
            output.push(*a);
        }
        if da * db < 0.0 {
            let t = da / (da - db);
            let position = a.position + (b.position - a.position) * t;
            let feature = if da > 0.0 {
                // Entering the kept side: b survives, a was cut away.
                let mut feature = b.feature;
                feature.in_edge1 = clip_edge_id as i32;
                feature
            } else {
                let mut feature = a.feature;
                feature.out_edge1 = clip_edge_id as i32;
                feature
            };
            output.push(ClipVertex { position, feature });
        }
    }
}

/// Face-contact manifold: clip the incident polygon of `(t_inc, inc)`
/// against the side planes of `ref_face` on `(t_ref, reference)`.
///
/// `flipped` marks that the reference hull is the second of the colliding
/// pair; the manifold normal and the feature-pair halves are swapped back so
/// the output convention stays "first hull to second hull".
///
/// Returns `None` when clipping empties the polygon or no survivor lies
/// below the reference plane.
pub(crate) fn clip_face_contact(
    t_ref: &Pose,
    reference: &Hull,
    ref_face: u32,
    t_inc: &Pose,
    incident: &Hull,
    flipped: bool,
) -> Option<Manifold> {
    let reference_plane = reference.plane(ref_face).transform_by(t_ref);
    let incident_face = incident_face_index(&reference_plane.normal, t_inc, incident);

    let mut polygon = face_polygon(t_inc, incident, incident_face);
    let mut scratch = ClipPolygon::new();
    for clip_plane in side_planes(t_ref, reference, ref_face, &reference_plane.normal) {
        scratch.clear();
        clip_polygon_against_plane(&polygon, &clip_plane.plane, clip_plane.edge_id, &mut scratch);
        if scratch.is_empty() {
            return None;
        }
        std::mem::swap(&mut polygon, &mut scratch);
    }

    let normal = if flipped {
        -reference_plane.normal
    } else {
        reference_plane.normal
    };
    let mut manifold = Manifold::new(normal);
    for vertex in &polygon {
        let distance = reference_plane.distance(&vertex.position);
        if distance <= 0.0 {
            let feature = if flipped {
                vertex.feature.swapped()
            } else {
                vertex.feature
            };
            manifold.push(ContactPoint {
                position: reference_plane.closest_point(&vertex.position),
                distance,
                feature,
            });
        }
    }
    if manifold.is_empty() {
        None
    } else {
        Some(manifold)
    }
}

/// Edge-contact manifold: one point between the witness edges `edge1` of
/// `(t1, h1)` and `edge2` of `(t2, h2)`.
///
/// The normal is the normalized cross product of the edge directions,
/// oriented from the first hull toward the second; the point is the midpoint
/// of the closest points between the segments. Returns `None` only for a
/// degenerate (near-parallel) pair, which the edge query never selects.
pub(crate) fn edge_contact(
    t1: &Pose,
    h1: &Hull,
    edge1: u32,
    t2: &Pose,
    h2: &Hull,
    edge2: u32,
    distance: f64,
) -> Option<Manifold> {
    let e1 = h1.half_edge(edge1);
    let p1 = t1.transform_point(&h1.vertex(e1.origin));
    let q1 = t1.transform_point(&h1.vertex(h1.half_edge(e1.twin).origin));
    let e2 = h2.half_edge(edge2);
    let p2 = t2.transform_point(&h2.vertex(e2.origin));
    let q2 = t2.transform_point(&h2.vertex(h2.half_edge(e2.twin).origin));

    let dir1 = q1 - p1;
    let dir2 = q2 - p2;
    let axis = dir1.cross(&dir2);
    let length = axis.norm();
    if length < 1e-12 {
        return None;
    }
    let mut normal = axis / length;
    let centers = t2.transform_point(&h2.centroid_local()) - t1.transform_point(&h1.centroid_local());
    if normal.dot(&centers) < 0.0 {
        normal = -normal;
    }

    let (c1, c2) = closest_points_segments(&p1, &q1, &p2, &q2);
    let position = Point3::from((c1.coords + c2.coords) * 0.5);

    let mut manifold = Manifold::new(normal);
    manifold.push(ContactPoint {
        position,
        distance,
        feature: FeaturePair {
            in_edge1: edge1 as i32,
            out_edge1: edge1 as i32,
            in_edge2: edge2 as i32,
            out_edge2: edge2 as i32,
        },
    });
    Some(manifold)
}

/// Closest points between segments `[p1, q1]` and `[p2, q2]`.
fn closest_points_segments(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> (Point3<f64>, Point3<f64>) {
    const EPSILON: f64 = 1e-10;

    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;

    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);

    if a < EPSILON && e < EPSILON {
        return (*p1, *p2);
    }
    if a < EPSILON {
        let t = (f / e).clamp(0.0, 1.0);
        return (*p1, p2 + d2 * t);
    }
    if e < EPSILON {
        let s = (-d1.dot(&r) / a).clamp(0.0, 1.0);
        return (p1 + d1 * s, *p2);
    }

    let b = d1.dot(&d2);
    let c = d1.dot(&r);
    let denom = a * e - b * b;

    let mut s = if denom.abs() < EPSILON {
        // Parallel segments: pick the start of segment 1.
        0.0
    } else {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    };
    let mut t = (b * s + f) / e;

    // Clamp t, then recompute s for the clamped t.
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }

    (p1 + d1 * s, p2 + d2 * t)
}
