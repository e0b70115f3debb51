//! Narrow-phase collision between two convex hulls.
//!
//! [`compute_contact`] is the top-level entry point: it runs the three
//! separating-axis queries, short-circuits on the first separation witness,
//! then picks the contact strategy — edge-edge when the edge axis clearly
//! dominates both face axes, otherwise face clipping with the less
//! penetrating face as reference.
//!
//! Everything here is a pure function over immutable hulls: no shared
//! state, no allocation kept beyond the call, safe to run on any number of
//! worker threads over disjoint pairs.

mod clip;
mod sat;

pub use sat::{
    collision_info, is_minkowski_face, project_edge_separation, query_edge_distance,
    query_face_distance, CollisionInfo, EdgeQuery, FaceQuery,
};

use tracing::trace;

use hull_types::{Manifold, Pose};

use crate::error::HullResult;
use crate::hull::Hull;

/// Tolerances steering the contact-strategy decision.
///
/// Edge contacts are only preferred when the edge axis beats both face axes
/// by a clear relative-plus-absolute margin, and likewise for the second
/// hull's face beating the first's. The bias keeps contact generation on
/// the same strategy across consecutive frames when the axes are nearly
/// tied, which the solver rewards with far more stable stacking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactConfig {
    /// Relative weight an edge axis must exceed the best face axis by.
    pub rel_edge_tol: f64,
    /// Relative weight the second hull's face must exceed the first's by.
    pub rel_face_tol: f64,
    /// Absolute slop added to both comparisons.
    pub abs_tol: f64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            rel_edge_tol: 0.9,
            rel_face_tol: 0.95,
            abs_tol: 0.0025,
        }
    }
}

impl ContactConfig {
    /// Override the edge-preference tolerance.
    #[must_use]
    pub const fn with_rel_edge_tol(mut self, tol: f64) -> Self {
        self.rel_edge_tol = tol;
        self
    }

    /// Override the face-preference tolerance.
    #[must_use]
    pub const fn with_rel_face_tol(mut self, tol: f64) -> Self {
        self.rel_face_tol = tol;
        self
    }

    /// Override the absolute slop.
    #[must_use]
    pub const fn with_abs_tol(mut self, tol: f64) -> Self {
        self.abs_tol = tol;
        self
    }
}

/// Compute the contact manifold between two hulls, or `None` when they do
/// not interpenetrate.
///
/// The manifold normal points from the first hull toward the second. Face
/// contacts carry up to [`Manifold::MAX_POINTS`] clipped points; edge
/// contacts carry exactly one.
///
/// # Errors
///
/// [`crate::HullError::InvalidState`] when either hull has been disposed.
pub fn compute_contact(
    t1: &Pose,
    h1: &Hull,
    t2: &Pose,
    h2: &Hull,
    config: &ContactConfig,
) -> HullResult<Option<Manifold>> {
    let face1 = query_face_distance(t1, h1, t2, h2)?;
    if face1.distance > 0.0 {
        return Ok(None);
    }
    let face2 = query_face_distance(t2, h2, t1, h1)?;
    if face2.distance > 0.0 {
        return Ok(None);
    }
    let edge = query_edge_distance(t1, h1, t2, h2)?;
    if edge.distance > 0.0 {
        return Ok(None);
    }

    let max_face = face1.distance.max(face2.distance);
    let manifold = if edge.has_pair()
        && edge.distance > config.rel_edge_tol * max_face + config.abs_tol
    {
        trace!(distance = edge.distance, "edge contact selected");
        clip::edge_contact(t1, h1, edge.edge1, t2, h2, edge.edge2, edge.distance)
    } else if face2.distance > config.rel_face_tol * face1.distance + config.abs_tol {
        trace!(face = face2.face, distance = face2.distance, "face contact, reference on second hull");
        clip::clip_face_contact(t2, h2, face2.face, t1, h1, true)
    } else {
        trace!(face = face1.face, distance = face1.distance, "face contact, reference on first hull");
        clip::clip_face_contact(t1, h1, face1.face, t2, h2, false)
    };
    Ok(manifold)
}
