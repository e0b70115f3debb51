//! Half-edge boundary representation of a convex polyhedron.
//!
//! Topology is stored as a dense index arena: vertices, faces, planes and
//! half-edges live in four parallel arrays, and every relation (`twin`,
//! `next`, `prev`, `origin`, `face`) is an index into those arrays. Half
//! edges are always allocated in twin pairs `(e, e + 1)`, so the twin of an
//! even edge is the following odd edge and vice versa.
//!
//! A [`Hull`] is immutable once built. Construction lives in
//! [`crate::builder`]; queries only ever read. Because of that, a hull can
//! be shared by reference across any number of concurrent queries.

use nalgebra::{Point3, Vector3};

use hull_types::Plane;

use crate::error::{HullError, HullResult};

/// Sentinel index for "not yet bound" arena slots.
pub(crate) const INVALID_INDEX: u32 = u32::MAX;

/// One directed traversal of a polygon edge.
///
/// The undirected edge `{origin, twin.origin}` is shared with the adjacent
/// face, which traverses it in the opposite direction through the twin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HalfEdge {
    /// Index of the vertex this edge starts from.
    pub origin: u32,
    /// Index of the oppositely-oriented edge on the adjacent face.
    pub twin: u32,
    /// Next edge in this face's loop.
    pub next: u32,
    /// Previous edge in this face's loop.
    pub prev: u32,
    /// Face this edge belongs to.
    pub face: u32,
}

/// A polygonal face, anchored by one half-edge of its boundary loop.
///
/// The full vertex loop is derived by walking `next` from `edge` until it
/// recurs. The face's supporting plane lives at the same index in the hull's
/// plane array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Face {
    /// Anchor half-edge of the boundary loop.
    pub edge: u32,
}

/// Immutable half-edge hull.
///
/// Owns its vertex, face, plane and half-edge arrays exclusively; the counts
/// are always consistent and the edge count is always even. A valid hull
/// satisfies Euler's formula for convex polyhedra (`V - E/2 + F == 2`) and
/// every face has at least three vertices.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hull {
    vertices: Vec<Point3<f64>>,
    faces: Vec<Face>,
    planes: Vec<Plane>,
    edges: Vec<HalfEdge>,
    centroid: Point3<f64>,
    disposed: bool,
}

impl Hull {
    pub(crate) fn from_parts(
        vertices: Vec<Point3<f64>>,
        faces: Vec<Face>,
        planes: Vec<Plane>,
        edges: Vec<HalfEdge>,
    ) -> Self {
        let mut centroid = Vector3::zeros();
        for v in &vertices {
            centroid += v.coords;
        }
        if !vertices.is_empty() {
            centroid /= vertices.len() as f64;
        }
        Self {
            vertices,
            faces,
            planes,
            edges,
            centroid: Point3::from(centroid),
            disposed: false,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of half-edges (always even; undirected edges are half this).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn ensure_live(&self) -> HullResult<()> {
        if self.disposed {
            return Err(HullError::InvalidState {
                details: "hull used after dispose",
            });
        }
        Ok(())
    }

    /// Vertex position at `index`.
    pub fn vertex_at(&self, index: usize) -> HullResult<Point3<f64>> {
        self.ensure_live()?;
        self.vertices
            .get(index)
            .copied()
            .ok_or(HullError::OutOfRange {
                kind: "vertex",
                index,
                count: self.vertices.len(),
            })
    }

    /// Face at `index`.
    pub fn face_at(&self, index: usize) -> HullResult<Face> {
        self.ensure_live()?;
        self.faces.get(index).copied().ok_or(HullError::OutOfRange {
            kind: "face",
            index,
            count: self.faces.len(),
        })
    }

    /// Supporting plane of the face at `index`.
    pub fn plane_at(&self, index: usize) -> HullResult<Plane> {
        self.ensure_live()?;
        self.planes
            .get(index)
            .copied()
            .ok_or(HullError::OutOfRange {
                kind: "plane",
                index,
                count: self.planes.len(),
            })
    }

    /// Half-edge at `index`.
    pub fn half_edge_at(&self, index: usize) -> HullResult<HalfEdge> {
        self.ensure_live()?;
        self.edges.get(index).copied().ok_or(HullError::OutOfRange {
            kind: "half-edge",
            index,
            count: self.edges.len(),
        })
    }

    // Unchecked accessors for the query inner loops. Callers hold a live,
    // validated hull (checked once at query entry), so plain slice indexing
    // is correct here.

    pub(crate) fn vertex(&self, index: u32) -> Point3<f64> {
        self.vertices[index as usize]
    }

    pub(crate) fn face(&self, index: u32) -> Face {
        self.faces[index as usize]
    }

    pub(crate) fn plane(&self, index: u32) -> Plane {
        self.planes[index as usize]
    }

    pub(crate) fn half_edge(&self, index: u32) -> HalfEdge {
        self.edges[index as usize]
    }

    pub(crate) fn centroid_local(&self) -> Point3<f64> {
        self.centroid
    }

    /// Average of all vertex positions, in hull-local space.
    pub fn centroid(&self) -> HullResult<Point3<f64>> {
        self.ensure_live()?;
        Ok(self.centroid)
    }

    /// Index of the vertex maximizing `dot(direction, vertex)`.
    ///
    /// Linear scan; ties break to the first-encountered index, so the result
    /// is stable and deterministic for identical inputs.
    pub fn support_index(&self, direction: &Vector3<f64>) -> HullResult<usize> {
        self.ensure_live()?;
        Ok(self.support_index_local(direction))
    }

    /// The vertex maximizing `dot(direction, vertex)`.
    pub fn support(&self, direction: &Vector3<f64>) -> HullResult<Point3<f64>> {
        self.ensure_live()?;
        Ok(self.support_point(direction))
    }

    pub(crate) fn support_index_local(&self, direction: &Vector3<f64>) -> usize {
        let mut best = 0;
        let mut best_dot = direction.dot(&self.vertices[0].coords);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let dot = direction.dot(&v.coords);
            if dot > best_dot {
                best = i;
                best_dot = dot;
            }
        }
        best
    }

    pub(crate) fn support_point(&self, direction: &Vector3<f64>) -> Point3<f64> {
        self.vertices[self.support_index_local(direction)]
    }

    /// Average of the vertices along the face's boundary loop.
    pub fn face_centroid(&self, face_index: usize) -> HullResult<Point3<f64>> {
        let face = self.face_at(face_index)?;
        let mut center = Vector3::zeros();
        let mut count = 0;
        let start = face.edge;
        let mut current = start;
        loop {
            let edge = self.half_edge(current);
            center += self.vertex(edge.origin).coords;
            count += 1;
            current = edge.next;
            if current == start {
                break;
            }
        }
        Ok(Point3::from(center / f64::from(count)))
    }

    /// Iterate the vertex positions of a face's boundary loop in order.
    pub fn face_vertices(&self, face_index: usize) -> HullResult<FaceVertices<'_>> {
        let face = self.face_at(face_index)?;
        Ok(FaceVertices {
            hull: self,
            start: face.edge,
            current: face.edge,
            done: false,
        })
    }

    /// World endpoints of the undirected edge containing half-edge `index`.
    pub fn edge_segment(&self, index: usize) -> HullResult<(Point3<f64>, Point3<f64>)> {
        let edge = self.half_edge_at(index)?;
        let twin = self.half_edge(edge.twin);
        Ok((self.vertex(edge.origin), self.vertex(twin.origin)))
    }

    /// Check every topology invariant of the half-edge representation.
    ///
    /// Verifies twin pairing and involution, `prev`/`next` inversion, loop
    /// closure, per-face vertex counts, twin faces differing, and Euler's
    /// formula. Construction runs this before releasing a hull; it is public
    /// so callers deserializing hull data can re-check it.
    pub fn validate(&self) -> HullResult<()> {
        self.ensure_live()?;
        if self.vertices.is_empty() || self.faces.is_empty() {
            return Err(HullError::EmptyMesh);
        }
        if self.edges.len() % 2 != 0 {
            return Err(HullError::Topology {
                details: format!("odd half-edge count {}", self.edges.len()),
            });
        }
        if self.planes.len() != self.faces.len() {
            return Err(HullError::Topology {
                details: format!(
                    "plane count {} does not match face count {}",
                    self.planes.len(),
                    self.faces.len()
                ),
            });
        }

        for (i, edge) in self.edges.iter().enumerate() {
            let i = i as u32;
            let expected_twin = i ^ 1;
            if edge.twin != expected_twin {
                return Err(HullError::Topology {
                    details: format!("edge {i} has twin {}, expected {expected_twin}", edge.twin),
                });
            }
            let twin = self.half_edge(edge.twin);
            if twin.twin != i {
                return Err(HullError::Topology {
                    details: format!("twin involution broken at edge {i}"),
                });
            }
            if edge.face == twin.face {
                return Err(HullError::Topology {
                    details: format!("edge {i} and its twin lie on the same face {}", edge.face),
                });
            }
            if edge.origin == twin.origin {
                return Err(HullError::Topology {
                    details: format!("edge {i} and its twin share origin {}", edge.origin),
                });
            }
            if edge.origin as usize >= self.vertices.len()
                || edge.face as usize >= self.faces.len()
                || edge.next as usize >= self.edges.len()
                || edge.prev as usize >= self.edges.len()
            {
                return Err(HullError::Topology {
                    details: format!("edge {i} references out-of-range indices"),
                });
            }
            if self.half_edge(edge.next).prev != i || self.half_edge(edge.prev).next != i {
                return Err(HullError::Topology {
                    details: format!("prev/next inversion broken at edge {i}"),
                });
            }
        }

        for (f, face) in self.faces.iter().enumerate() {
            let f = f as u32;
            let start = face.edge;
            if start as usize >= self.edges.len() {
                return Err(HullError::Topology {
                    details: format!("face {f} anchors out-of-range edge {start}"),
                });
            }
            let mut current = start;
            let mut steps = 0;
            loop {
                let edge = self.half_edge(current);
                if edge.face != f {
                    return Err(HullError::Topology {
                        details: format!("edge {current} in face {f}'s loop claims face {}", edge.face),
                    });
                }
                steps += 1;
                if steps > self.edges.len() {
                    return Err(HullError::Topology {
                        details: format!("face {f}'s loop does not close"),
                    });
                }
                current = edge.next;
                if current == start {
                    break;
                }
            }
            if steps < 3 {
                return Err(HullError::DegenerateFace {
                    face: f as usize,
                    vertex_count: steps,
                });
            }
        }

        let v = self.vertices.len() as i64;
        let e = (self.edges.len() / 2) as i64;
        let f = self.faces.len() as i64;
        if v - e + f != 2 {
            return Err(HullError::Topology {
                details: format!("Euler characteristic violated: V={v} E={e} F={f}"),
            });
        }
        Ok(())
    }

    /// Release the hull's arrays.
    ///
    /// The hull remains as a husk that rejects every further operation with
    /// [`HullError::InvalidState`]; disposing twice is also an error. Plain
    /// drops need none of this — the method exists for owners that keep the
    /// hull allocated in a slot and must not double-release it.
    pub fn dispose(&mut self) -> HullResult<()> {
        if self.disposed {
            return Err(HullError::InvalidState {
                details: "hull disposed twice",
            });
        }
        self.disposed = true;
        self.vertices = Vec::new();
        self.faces = Vec::new();
        self.planes = Vec::new();
        self.edges = Vec::new();
        Ok(())
    }

    /// Whether `dispose` has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Iterator over the vertex positions of one face loop.
#[derive(Debug)]
pub struct FaceVertices<'a> {
    hull: &'a Hull,
    start: u32,
    current: u32,
    done: bool,
}

impl Iterator for FaceVertices<'_> {
    type Item = Point3<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let edge = self.hull.half_edge(self.current);
        let vertex = self.hull.vertex(edge.origin);
        self.current = edge.next;
        if self.current == self.start {
            self.done = true;
        }
        Some(vertex)
    }
}
