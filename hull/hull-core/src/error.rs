//! Error types for hull construction and queries.

use thiserror::Error;

/// Result type for hull operations.
pub type HullResult<T> = Result<T, HullError>;

/// Errors that can occur while building or querying a hull.
///
/// Degenerate geometry during separating-axis tests (near-parallel edge
/// pairs, near-zero cross products) is deliberately *not* represented here:
/// such axes are folded into the algorithms as sentinel "never selected"
/// scores instead of errors.
#[derive(Debug, Error)]
pub enum HullError {
    /// Input mesh has no vertices or no faces.
    #[error("input mesh is empty")]
    EmptyMesh,

    /// A face has fewer than three vertices.
    #[error("face {face} has {vertex_count} vertices, need at least 3")]
    DegenerateFace {
        /// Index of the offending face.
        face: usize,
        /// Number of vertices the face actually has.
        vertex_count: usize,
    },

    /// Construction discovered an impossible half-edge pairing.
    #[error("hull topology violation: {details}")]
    Topology {
        /// Description of the violated invariant.
        details: String,
    },

    /// An accessor was given an index beyond the relevant count.
    #[error("{kind} index {index} out of range (count {count})")]
    OutOfRange {
        /// Which array was indexed ("vertex", "face", "plane", "half-edge").
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Number of elements actually present.
        count: usize,
    },

    /// The hull was used after disposal, or disposed twice.
    #[error("invalid hull state: {details}")]
    InvalidState {
        /// What was attempted.
        details: &'static str,
    },
}
