//! Errors returned by [`combine`](crate::combine).

use nebula_grid::GridError;
use thiserror::Error;

use crate::source_mesh::Topology;

/// Structural failures of a merge. All are detected before any output is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombineError {
    /// The submesh list was empty, so there is no topology to merge under.
    #[error("no submeshes to combine")]
    NoSubmeshes,

    /// Grid problems, including more submeshes than cells.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// A submesh reference points at a mesh or submesh that does not exist.
    #[error("mesh {mesh} has no submesh {submesh}")]
    UnknownSubmesh { mesh: usize, submesh: usize },

    /// Submeshes with different primitive topologies cannot share a range.
    #[error("mesh {mesh} submesh {submesh} is {found:?}, expected {expected:?}")]
    TopologyMismatch {
        mesh: usize,
        submesh: usize,
        expected: Topology,
        found: Topology,
    },

    /// The UV buffer must have one entry per vertex.
    #[error("mesh {mesh} has {uvs} uvs for {vertices} vertices")]
    UvCountMismatch {
        mesh: usize,
        vertices: usize,
        uvs: usize,
    },

    /// A submesh's index range reaches past the end of the index buffer.
    #[error("mesh {mesh} submesh {submesh} index range {start}..{end} exceeds {len} indices")]
    SubmeshRangeOutOfBounds {
        mesh: usize,
        submesh: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    /// An index (after base vertex) does not address a vertex.
    #[error("mesh {mesh} submesh {submesh} references vertex {index} of {vertices}")]
    IndexOutOfRange {
        mesh: usize,
        submesh: usize,
        index: u64,
        vertices: usize,
    },

    /// The combined vertex buffer would not be addressable with `u32` indices.
    #[error("combined mesh needs {count} vertices, more than u32 indices can address")]
    TooManyVertices { count: usize },

    /// An index buffer longer than a `u32` range can describe.
    #[error("index buffer of {count} entries exceeds the u32 range")]
    TooManyIndices { count: usize },
}
