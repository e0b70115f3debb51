//! Shared value types for convex-hull collision detection.
//!
//! This crate holds the small, dependency-light types exchanged between the
//! collision core and its callers: rigid [`Pose`]s, halfspace [`Plane`]s, and
//! the contact output types ([`ContactPoint`], [`FeaturePair`], [`Manifold`]).
//!
//! Everything here is a plain value type with pure operations. The half-edge
//! hull itself and the collision algorithms live in `hull-core`; host-engine
//! concerns (which pairs to test, how to resolve contacts) stay with the
//! caller.

#![warn(missing_docs)]

pub mod contact;
pub mod plane;
pub mod pose;

pub use contact::{ContactPoint, FeaturePair, Manifold, NO_FEATURE};
pub use plane::Plane;
pub use pose::Pose;
