//! Hull construction from a triangulated surface.
//!
//! Mesh exporters hand us triangle soup: near-duplicate vertices, large flat
//! regions split into fans of triangles, no adjacency. Construction recovers
//! a clean boundary representation in four passes:
//!
//! 1. Round coordinates to a fixed precision and deduplicate vertices.
//! 2. Group triangles by rounded normal, then split each group into
//!    connected components by shared vertices; each component is one merged
//!    polygonal face.
//! 3. Extract each merged face's perimeter by cancelling interior edges,
//!    re-chaining it into a closed loop, and dropping vertices that ended up
//!    interior to a merged face.
//! 4. Fit a plane to every face loop (Newell's method) and stitch the
//!    half-edge topology, allocating twin pairs as face loops first meet
//!    their shared edges.
//!
//! Any topological impossibility (a directed edge claimed by two faces, an
//! unmatched boundary edge) aborts construction; no partially built hull is
//! ever returned.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use hull_types::Plane;

use crate::error::{HullError, HullResult};
use crate::hull::{Face, HalfEdge, Hull, INVALID_INDEX};

/// Rounding factor for vertex coordinates and face normals: three fractional
/// digits. Collapses the floating-point noise that mesh export introduces
/// between vertices that are geometrically identical.
const ROUND_FACTOR: f64 = 1000.0;

/// Triangles with a cross product shorter than this are dropped as
/// zero-area slivers (typically produced by the rounding pass collapsing a
/// near-degenerate triangle's vertices together).
const DEGENERATE_TRIANGLE_EPSILON: f64 = 1e-12;

fn round_coord(value: f64) -> f64 {
    (value * ROUND_FACTOR).round() / ROUND_FACTOR
}

fn round_point(p: &Point3<f64>) -> Point3<f64> {
    Point3::new(round_coord(p.x), round_coord(p.y), round_coord(p.z))
}

/// Quantized coordinate key for hashing rounded points and normals.
fn quantize(v: &Vector3<f64>) -> (i64, i64, i64) {
    // Values are already rounded to 1/ROUND_FACTOR steps, so scaling and
    // rounding again is exact; the integer cast also folds -0.0 into 0.
    (
        (v.x * ROUND_FACTOR).round() as i64,
        (v.y * ROUND_FACTOR).round() as i64,
        (v.z * ROUND_FACTOR).round() as i64,
    )
}

/// Build a hull from a triangulated surface.
///
/// `indices` holds one vertex-index triple per triangle, wound
/// counter-clockwise when seen from outside the solid.
///
/// # Errors
///
/// [`HullError::EmptyMesh`] for empty input, [`HullError::OutOfRange`] for a
/// triangle index beyond the vertex array, [`HullError::Topology`] when the
/// surface is not a closed orientable boundary, and
/// [`HullError::DegenerateFace`] when a merged face degenerates below three
/// vertices.
pub fn build_hull(vertices: &[Point3<f64>], indices: &[u32]) -> HullResult<Hull> {
    if vertices.is_empty() || indices.is_empty() {
        return Err(HullError::EmptyMesh);
    }
    if indices.len() % 3 != 0 {
        return Err(HullError::Topology {
            details: format!("triangle index count {} is not a multiple of 3", indices.len()),
        });
    }
    for &index in indices {
        if index as usize >= vertices.len() {
            return Err(HullError::OutOfRange {
                kind: "vertex",
                index: index as usize,
                count: vertices.len(),
            });
        }
    }

    // Pass 1: round and deduplicate vertices.
    let rounded: Vec<Point3<f64>> = vertices.iter().map(round_point).collect();
    let mut unique_vertices: Vec<Point3<f64>> = Vec::new();
    let mut key_to_unique: HashMap<(i64, i64, i64), u32> = HashMap::new();
    let remap: Vec<u32> = rounded
        .iter()
        .map(|p| {
            *key_to_unique.entry(quantize(&p.coords)).or_insert_with(|| {
                unique_vertices.push(*p);
                (unique_vertices.len() - 1) as u32
            })
        })
        .collect();

    // Pass 2: per-triangle rounded normals, grouped by normal.
    struct Triangle {
        indices: [u32; 3],
    }
    let mut normal_groups: HashMap<(i64, i64, i64), Vec<Triangle>> = HashMap::new();
    let mut dropped = 0usize;
    for triangle in indices.chunks_exact(3) {
        let p1 = rounded[triangle[0] as usize];
        let p2 = rounded[triangle[1] as usize];
        let p3 = rounded[triangle[2] as usize];
        let cross = (p3 - p2).cross(&(p1 - p2));
        if cross.norm_squared() < DEGENERATE_TRIANGLE_EPSILON {
            dropped += 1;
            continue;
        }
        let normal = round_point(&Point3::from(cross.normalize())).coords;
        normal_groups
            .entry(quantize(&normal))
            .or_default()
            .push(Triangle {
                indices: [
                    remap[triangle[0] as usize],
                    remap[triangle[1] as usize],
                    remap[triangle[2] as usize],
                ],
            });
    }
    if dropped > 0 {
        warn!(dropped, "dropped zero-area triangles during hull construction");
    }
    if normal_groups.is_empty() {
        return Err(HullError::EmptyMesh);
    }

    // Pass 2b: split each normal group into connected components by shared
    // vertex. Two triangles belong to the same merged face when a chain of
    // shared vertices links them.
    let mut merged_faces: Vec<Vec<Triangle>> = Vec::new();
    // Deterministic iteration: sort groups by normal key so the face order
    // does not depend on hash-map ordering.
    let mut groups: Vec<_> = normal_groups.into_iter().collect();
    groups.sort_by_key(|(key, _)| *key);
    for (_, group) in groups {
        let mut components: Vec<(HashSet<u32>, Vec<Triangle>)> = Vec::new();
        for triangle in group {
            let touching: Vec<usize> = components
                .iter()
                .enumerate()
                .filter(|(_, (verts, _))| triangle.indices.iter().any(|i| verts.contains(i)))
                .map(|(i, _)| i)
                .collect();
            match touching.split_first() {
                None => {
                    let verts = triangle.indices.iter().copied().collect();
                    components.push((verts, vec![triangle]));
                }
                Some((&first, rest)) => {
                    // Merge every touched component into the first, then add
                    // the triangle; a triangle can bridge components that
                    // were disjoint until now.
                    for &i in rest.iter().rev() {
                        let (verts, triangles) = components.remove(i);
                        components[first].0.extend(verts);
                        components[first].1.extend(triangles);
                    }
                    components[first].0.extend(triangle.indices);
                    components[first].1.push(triangle);
                }
            }
        }
        merged_faces.extend(components.into_iter().map(|(_, triangles)| triangles));
    }

    // Pass 3: perimeter extraction and orphan-vertex removal.
    let mut face_loops: Vec<Vec<u32>> = Vec::with_capacity(merged_faces.len());
    let mut orphans: HashSet<u32> = HashSet::new();
    for (face_index, triangles) in merged_faces.iter().enumerate() {
        let perimeter = face_perimeter(triangles.iter().map(|t| t.indices), face_index)?;
        for triangle in triangles {
            for &v in &triangle.indices {
                if !perimeter.contains(&v) {
                    orphans.insert(v);
                }
            }
        }
        face_loops.push(perimeter);
    }

    let mut orphan_list: Vec<u32> = orphans.into_iter().collect();
    orphan_list.sort_unstable_by(|a, b| b.cmp(a));
    for orphan in orphan_list {
        unique_vertices.remove(orphan as usize);
        for face in &mut face_loops {
            for v in face.iter_mut() {
                if *v >= orphan {
                    *v -= 1;
                }
            }
        }
    }

    debug!(
        input_vertices = vertices.len(),
        input_triangles = indices.len() / 3,
        merged_faces = face_loops.len(),
        unique_vertices = unique_vertices.len(),
        "merged triangle soup into polygonal faces"
    );

    build_hull_from_faces(unique_vertices, &face_loops)
}

/// Ordered perimeter of a merged face.
///
/// Every directed edge of every member triangle goes into a working list; an
/// edge whose partner (in either direction) is already present is interior
/// to the merged face and cancels it. What survives is the boundary, which
/// is then re-chained by start-to-end adjacency in case the triangles were
/// visited in a non-contiguous order.
fn face_perimeter(
    triangles: impl Iterator<Item = [u32; 3]>,
    face_index: usize,
) -> HullResult<Vec<u32>> {
    let mut boundary: Vec<(u32, u32)> = Vec::new();
    for [v1, v2, v3] in triangles {
        for (a, b) in [(v1, v2), (v2, v3), (v3, v1)] {
            if let Some(pos) = boundary
                .iter()
                .position(|&(s, e)| (s == a && e == b) || (s == b && e == a))
            {
                boundary.remove(pos);
            } else {
                boundary.push((a, b));
            }
        }
    }
    if boundary.len() < 3 {
        return Err(HullError::DegenerateFace {
            face: face_index,
            vertex_count: boundary.len(),
        });
    }

    let chained = boundary
        .iter()
        .zip(boundary.iter().cycle().skip(1))
        .all(|(edge, next)| edge.1 == next.0);
    let ordered = if chained {
        boundary
    } else {
        rechain_perimeter(&boundary, face_index)?
    };
    Ok(ordered.into_iter().map(|(_, end)| end).collect())
}

/// Reorder boundary edges into a single closed loop by following
/// start-to-end adjacency.
fn rechain_perimeter(boundary: &[(u32, u32)], face_index: usize) -> HullResult<Vec<(u32, u32)>> {
    let mut successor: HashMap<u32, u32> = HashMap::with_capacity(boundary.len());
    for &(start, end) in boundary {
        if successor.insert(start, end).is_some() {
            return Err(HullError::Topology {
                details: format!("face {face_index} boundary branches at vertex {start}"),
            });
        }
    }
    let mut result = Vec::with_capacity(boundary.len());
    let mut current = boundary[0].0;
    for _ in 0..boundary.len() {
        let Some(&end) = successor.get(&current) else {
            return Err(HullError::Topology {
                details: format!("face {face_index} boundary is not a closed loop"),
            });
        };
        result.push((current, end));
        current = end;
    }
    if current != result[0].0 {
        return Err(HullError::Topology {
            details: format!("face {face_index} boundary does not close"),
        });
    }
    Ok(result)
}

/// Build a hull from pre-merged polygonal faces.
///
/// `faces` holds one ordered vertex-index loop per face, wound
/// counter-clockwise seen from outside. This is the second construction
/// entry point, for callers that already hold polygon faces and do not need
/// the triangle-soup merging pass.
///
/// # Errors
///
/// [`HullError::EmptyMesh`], [`HullError::DegenerateFace`],
/// [`HullError::OutOfRange`] as for [`build_hull`];
/// [`HullError::Topology`] when two faces traverse a shared edge in the same
/// direction or an edge never finds its twin.
pub fn build_hull_from_faces(
    vertices: Vec<Point3<f64>>,
    faces: &[Vec<u32>],
) -> HullResult<Hull> {
    if vertices.is_empty() || faces.is_empty() {
        return Err(HullError::EmptyMesh);
    }
    for (face_index, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(HullError::DegenerateFace {
                face: face_index,
                vertex_count: face.len(),
            });
        }
        for &v in face {
            if v as usize >= vertices.len() {
                return Err(HullError::OutOfRange {
                    kind: "vertex",
                    index: v as usize,
                    count: vertices.len(),
                });
            }
        }
    }

    let planes = face_planes(&vertices, faces)?;

    // Stitch half-edges. Each directed edge is looked up in the map; a hit
    // means the adjacent face already allocated the twin pair and this face
    // binds the free side. A miss allocates a fresh pair with the far side
    // left unbound for the neighbor.
    let mut edge_map: HashMap<(u32, u32), u32> = HashMap::new();
    let mut edges: Vec<HalfEdge> = Vec::with_capacity(faces.len() * 8);
    let mut face_records: Vec<Face> = vec![Face { edge: INVALID_INDEX }; faces.len()];

    for (face_index, face) in faces.iter().enumerate() {
        let face_index = face_index as u32;
        let mut loop_edges: Vec<u32> = Vec::with_capacity(face.len());

        for (j, &v1) in face.iter().enumerate() {
            let v2 = face[(j + 1) % face.len()];
            let forward = edge_map.get(&(v1, v2)).copied();
            let reverse = edge_map.contains_key(&(v2, v1));
            if forward.is_some() != reverse {
                return Err(HullError::Topology {
                    details: format!(
                        "asymmetric half-edge map for edge ({v1}, {v2}): forward and reverse must be registered together"
                    ),
                });
            }

            let edge_index = if let Some(existing) = forward {
                let slot = &mut edges[existing as usize];
                if slot.face != INVALID_INDEX {
                    return Err(HullError::Topology {
                        details: format!(
                            "shared edge ({v1}, {v2}) traversed in the same direction by faces {} and {face_index}",
                            slot.face
                        ),
                    });
                }
                slot.face = face_index;
                existing
            } else {
                let e12 = edges.len() as u32;
                let e21 = e12 + 1;
                edges.push(HalfEdge {
                    origin: v1,
                    twin: e21,
                    next: INVALID_INDEX,
                    prev: INVALID_INDEX,
                    face: face_index,
                });
                edges.push(HalfEdge {
                    origin: v2,
                    twin: e12,
                    next: INVALID_INDEX,
                    prev: INVALID_INDEX,
                    face: INVALID_INDEX,
                });
                edge_map.insert((v1, v2), e12);
                edge_map.insert((v2, v1), e21);
                e12
            };

            if face_records[face_index as usize].edge == INVALID_INDEX {
                face_records[face_index as usize].edge = edge_index;
            }
            loop_edges.push(edge_index);
        }

        for (j, &e1) in loop_edges.iter().enumerate() {
            let e2 = loop_edges[(j + 1) % loop_edges.len()];
            edges[e1 as usize].next = e2;
            edges[e2 as usize].prev = e1;
        }
    }

    if let Some(unbound) = edges.iter().position(|e| e.face == INVALID_INDEX) {
        let twin = edges[unbound].twin;
        return Err(HullError::Topology {
            details: format!(
                "edge {unbound} (twin of {twin}) never bound to a face: surface is not closed"
            ),
        });
    }

    let hull = Hull::from_parts(vertices, face_records, planes, edges);
    hull.validate()?;
    debug!(
        vertices = hull.vertex_count(),
        faces = hull.face_count(),
        half_edges = hull.edge_count(),
        "constructed half-edge hull"
    );
    Ok(hull)
}

/// Fit a plane to every face loop with Newell's method; the offset goes
/// through the loop centroid.
fn face_planes(vertices: &[Point3<f64>], faces: &[Vec<u32>]) -> HullResult<Vec<Plane>> {
    faces
        .iter()
        .enumerate()
        .map(|(face_index, face)| {
            let mut normal = Vector3::zeros();
            let mut center = Vector3::zeros();
            for (j, &i1) in face.iter().enumerate() {
                let i2 = face[(j + 1) % face.len()];
                let a = vertices[i1 as usize];
                let b = vertices[i2 as usize];
                normal += Vector3::new(
                    (a.y - b.y) * (a.z + b.z),
                    (a.z - b.z) * (a.x + b.x),
                    (a.x - b.x) * (a.y + b.y),
                );
                center += a.coords;
            }
            center /= face.len() as f64;
            let length = normal.norm();
            if length < DEGENERATE_TRIANGLE_EPSILON {
                return Err(HullError::Topology {
                    details: format!("face {face_index} has no area, cannot fit a plane"),
                });
            }
            let normal = normal / length;
            Ok(Plane::new(normal, normal.dot(&center)))
        })
        .collect()
}

/// Axis-aligned box hull with the given half extents, centered at the local
/// origin.
///
/// # Errors
///
/// Propagates construction errors; with positive extents they cannot occur.
pub fn box_hull(half_extents: Vector3<f64>) -> HullResult<Hull> {
    let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
    let vertices = vec![
        Point3::new(-x, -y, -z),
        Point3::new(x, -y, -z),
        Point3::new(x, y, -z),
        Point3::new(-x, y, -z),
        Point3::new(-x, -y, z),
        Point3::new(x, -y, z),
        Point3::new(x, y, z),
        Point3::new(-x, y, z),
    ];
    let faces: Vec<Vec<u32>> = vec![
        vec![1, 2, 6, 5], // +x
        vec![0, 4, 7, 3], // -x
        vec![3, 7, 6, 2], // +y
        vec![0, 1, 5, 4], // -y
        vec![4, 5, 6, 7], // +z
        vec![0, 3, 2, 1], // -z
    ];
    build_hull_from_faces(vertices, &faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cube as triangle soup: 8 vertices, 12 triangles, two per side,
    /// wound counter-clockwise from outside.
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

    #[test]
    fn cube_soup_merges_to_six_faces() {
        let (vertices, indices) = cube_soup(0.5);
        let hull = build_hull(&vertices, &indices).unwrap();
        assert_eq!(hull.vertex_count(), 8);
        assert_eq!(hull.face_count(), 6);
        assert_eq!(hull.edge_count(), 24);
        hull.validate().unwrap();
    }

    #[test]
    fn near_duplicate_vertices_collapse() {
        let (mut vertices, indices) = cube_soup(0.5);
        // Perturb below the rounding precision; the rounded coordinates are
        // identical, so the hull must come out the same.
        vertices[2].x += 3.0e-4;
        vertices[6].y -= 4.0e-4;
        let hull = build_hull(&vertices, &indices).unwrap();
        assert_eq!(hull.vertex_count(), 8);
        assert_eq!(hull.face_count(), 6);
    }

    #[test]
    fn split_quad_keeps_midpoint_out_of_perimeter() {
        // A cube whose +z face is a fan of four triangles around a center
        // vertex. The center vertex is interior to the merged face and must
        // be orphaned out of the final hull.
        let h = 0.5;
        let (mut vertices, mut indices) = cube_soup(h);
        vertices.push(Point3::new(0.0, 0.0, h)); // index 8, center of +z
        indices.splice(
            0..6,
            [4u32, 5, 8, 5, 6, 8, 6, 7, 8, 7, 4, 8],
        );
        let hull = build_hull(&vertices, &indices).unwrap();
        assert_eq!(hull.vertex_count(), 8);
        assert_eq!(hull.face_count(), 6);
        assert_eq!(hull.edge_count(), 24);
        hull.validate().unwrap();
    }

    #[test]
    fn tetrahedron_counts() {
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
        hull.validate().unwrap();
    }

    #[test]
    fn empty_mesh_rejected() {
        assert!(matches!(
            build_hull(&[], &[]),
            Err(HullError::EmptyMesh)
        ));
    }

    #[test]
    fn degenerate_face_rejected() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0u32, 1]];
        assert!(matches!(
            build_hull_from_faces(vertices, &faces),
            Err(HullError::DegenerateFace { vertex_count: 2, .. })
        ));
    }

    #[test]
    fn repeated_directed_edge_rejected() {
        // Faces [0,1,2] and [0,1,3] both traverse the directed edge (0, 1).
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![vec![0u32, 1, 2], vec![0u32, 1, 3]];
        assert!(matches!(
            build_hull_from_faces(vertices, &faces),
            Err(HullError::Topology { .. })
        ));
    }

    #[test]
    fn open_surface_rejected() {
        // A single triangle never closes; its twins stay unbound.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0u32, 1, 2]];
        assert!(matches!(
            build_hull_from_faces(vertices, &faces),
            Err(HullError::Topology { .. })
        ));
    }

    #[test]
    fn box_hull_is_valid() {
        let hull = box_hull(Vector3::new(0.5, 1.0, 2.0)).unwrap();
        assert_eq!(hull.vertex_count(), 8);
        assert_eq!(hull.face_count(), 6);
        assert_eq!(hull.edge_count(), 24);
        hull.validate().unwrap();
        // Every face plane's normal points away from the centroid.
        for f in 0..hull.face_count() {
            let plane = hull.plane_at(f).unwrap();
            assert!(plane.distance(&hull.centroid().unwrap()) < 0.0);
        }
    }
}
