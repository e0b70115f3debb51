//! Narrow-phase collision for convex polyhedra.
//!
//! This crate represents arbitrary convex solids as half-edge boundary
//! meshes and determines, for any pair of rigidly transformed solids,
//! whether they interpenetrate and with what contact geometry.
//!
//! # Architecture
//!
//! ```text
//! triangle soup ──► builder ──► Hull (half-edge arena, immutable)
//!                                 │
//!            (Pose, Hull) pairs   ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ collision: face query · edge query (SAT)     │
//!   │            └─► strategy └─► clip / edge      │
//!   └──────────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//!                         Manifold (≤ 24 points)
//! ```
//!
//! - [`builder`] turns a triangulated surface into a [`Hull`]: coplanar
//!   triangles merge into polygonal faces, the boundary is extracted and the
//!   half-edge topology stitched. Construction is fallible and never leaks a
//!   partially built hull.
//! - [`Hull`] is immutable after construction and safe to share across
//!   threads; every query borrows it read-only.
//! - [`collision`] holds the separating-axis queries and the clipping-based
//!   contact generation. All of it is pure: no caches, no globals, bit-equal
//!   results for bit-equal inputs.
//!
//! # Quick start
//!
//! ```
//! use hull_core::builder::box_hull;
//! use hull_core::collision::{compute_contact, ContactConfig};
//! use hull_types::Pose;
//! use nalgebra::{Point3, Vector3};
//!
//! # fn main() -> Result<(), hull_core::HullError> {
//! let cube = box_hull(Vector3::new(0.5, 0.5, 0.5))?;
//! let t1 = Pose::identity();
//! let t2 = Pose::from_position(Point3::new(0.0, 0.0, 0.75));
//!
//! let manifold = compute_contact(&t1, &cube, &t2, &cube, &ContactConfig::default())?;
//! assert!(manifold.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(
    clippy::missing_const_for_fn,      // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::cast_possible_truncation,  // Arena indices fit u32 by construction
    clippy::doc_markdown,              // Not all technical terms need backticks
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod builder;
pub mod collision;
pub mod error;
pub mod hull;

pub use builder::{box_hull, build_hull, build_hull_from_faces};
pub use collision::{
    collision_info, compute_contact, query_edge_distance, query_face_distance, CollisionInfo,
    ContactConfig, EdgeQuery, FaceQuery,
};
pub use error::{HullError, HullResult};
pub use hull::{Face, FaceVertices, HalfEdge, Hull};
