//! Half-edge topology invariants on constructed hulls.
//!
//! Every hull the builder releases must be a closed orientable boundary:
//! twin pairing by adjacent indices, prev/next inversion, closed face loops,
//! and Euler's formula for convex polyhedra.

use hull_core::{box_hull, build_hull, Hull};
use nalgebra::{Point3, Vector3};

/// Unit cube triangle soup: 8 vertices, 12 triangles (two per side), wound
/// counter-clockwise from outside.
fn cube_soup(half: f64) -> (Vec<Point3<f64>>, Vec<u32>) {
    let h = half;
    let vertices = vec![
        Point3::new(-h, -h, -h),
        Point3::new(h, -h, -h),
        Point3::new(h, h, -h),
        Point3::new(-h, h, -h),
        Point3::new(-h, -h, h),
        Point3::new(h, -h, h),
        Point3::new(h, h, h),
        Point3::new(-h, h, h),
    ];
    let indices = vec![
        4, 5, 6, 4, 6, 7, // +z
        0, 3, 2, 0, 2, 1, // -z
        1, 2, 6, 1, 6, 5, // +x
        0, 4, 7, 0, 7, 3, // -x
        3, 7, 6, 3, 6, 2, // +y
        0, 1, 5, 0, 5, 4, // -y
    ];
    (vertices, indices)
}

fn check_invariants(hull: &Hull) {
    // Counts: even half-edge count and Euler's formula.
    assert_eq!(hull.edge_count() % 2, 0, "half-edge count must be even");
    let v = hull.vertex_count() as i64;
    let e = (hull.edge_count() / 2) as i64;
    let f = hull.face_count() as i64;
    assert_eq!(v - e + f, 2, "Euler characteristic: V={v} E={e} F={f}");

    // Twin involution and prev/next inversion for every half-edge.
    for i in 0..hull.edge_count() {
        let edge = hull.half_edge_at(i).unwrap();
        let twin = hull.half_edge_at(edge.twin as usize).unwrap();
        assert_eq!(twin.twin as usize, i, "twin(twin(e)) != e at edge {i}");
        assert_ne!(edge.face, twin.face, "edge {i} twins share a face");

        let next = hull.half_edge_at(edge.next as usize).unwrap();
        assert_eq!(next.prev as usize, i, "prev(next(e)) != e at edge {i}");
        let prev = hull.half_edge_at(edge.prev as usize).unwrap();
        assert_eq!(prev.next as usize, i, "next(prev(e)) != e at edge {i}");
    }

    // Walking next from any edge returns to it in exactly the face's vertex
    // count.
    for face_index in 0..hull.face_count() {
        let face = hull.face_at(face_index).unwrap();
        let loop_len = hull.face_vertices(face_index).unwrap().count();
        assert!(loop_len >= 3, "face {face_index} has {loop_len} vertices");

        let mut current = face.edge;
        let mut steps = 0;
        loop {
            current = hull.half_edge_at(current as usize).unwrap().next;
            steps += 1;
            if current == face.edge {
                break;
            }
        }
        assert_eq!(steps, loop_len, "face {face_index} loop length mismatch");
    }

    hull.validate().unwrap();
}

#[test]
fn cube_from_triangle_soup_has_expected_counts() {
    let (vertices, indices) = cube_soup(0.5);
    let hull = build_hull(&vertices, &indices).unwrap();

    assert_eq!(hull.vertex_count(), 8);
    assert_eq!(hull.face_count(), 6);
    assert_eq!(hull.edge_count(), 24, "12 undirected edges = 24 half-edges");
    check_invariants(&hull);
}

#[test]
fn box_hull_invariants() {
    let hull = box_hull(Vector3::new(0.3, 0.7, 1.1)).unwrap();
    check_invariants(&hull);
}

#[test]
fn tetrahedron_invariants() {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ];
    let indices = vec![0, 2, 1, 0, 3, 2, 0, 1, 3, 1, 2, 3];
    let hull = build_hull(&vertices, &indices).unwrap();

    assert_eq!(hull.vertex_count(), 4);
    assert_eq!(hull.face_count(), 4);
    assert_eq!(hull.edge_count(), 12);
    check_invariants(&hull);
}

#[test]
fn noisy_cube_soup_still_merges_cleanly() {
    // Export-level noise (sub-millimeter, below the rounding precision) must
    // not change the merged topology.
    let (mut vertices, indices) = cube_soup(0.5);
    for (i, v) in vertices.iter_mut().enumerate() {
        let jitter = 1.0e-4 * ((i % 3) as f64 - 1.0);
        v.x += jitter;
        v.y -= jitter;
    }
    let hull = build_hull(&vertices, &indices).unwrap();
    assert_eq!(hull.vertex_count(), 8);
    assert_eq!(hull.face_count(), 6);
    check_invariants(&hull);
}
