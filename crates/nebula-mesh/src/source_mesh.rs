//! Source mesh data: shared vertex buffer plus per-submesh index ranges.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::error::CombineError;

/// Primitive type an index range is drawn as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    #[default]
    Triangles,
    Quads,
    Lines,
    LineStrip,
    Points,
}

/// One submesh: a range of the owning mesh's index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmeshDescriptor {
    /// First index of the range.
    pub index_start: u32,
    /// Number of indices in the range.
    pub index_count: u32,
    /// Added to every index of the range before it addresses a vertex.
    #[serde(default)]
    pub base_vertex: u32,
    #[serde(default)]
    pub topology: Topology,
}

impl SubmeshDescriptor {
    pub fn new(index_start: u32, index_count: u32, topology: Topology) -> Self {
        Self {
            index_start,
            index_count,
            base_vertex: 0,
            topology,
        }
    }
}

fn identity() -> [f32; 16] {
    Mat4::IDENTITY.to_cols_array()
}

/// A mesh taking part in a merge.
///
/// `positions` and `uvs` are parallel per-vertex buffers. `transform` is the
/// column-major local-to-world matrix, used only when several meshes are
/// merged into one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceMesh {
    #[serde(default)]
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubmeshDescriptor>,
    #[serde(default = "identity")]
    pub transform: [f32; 16],
}

impl SourceMesh {
    /// Creates a mesh with the given vertices and no submeshes.
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>, uvs: Vec<[f32; 2]>) -> Self {
        Self {
            name: name.into(),
            positions,
            uvs,
            indices: Vec::new(),
            submeshes: Vec::new(),
            transform: identity(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform.to_cols_array();
        self
    }

    pub fn local_to_world(&self) -> Mat4 {
        Mat4::from_cols_array(&self.transform)
    }

    /// Appends `indices` to the index buffer as a new submesh and returns its index.
    pub fn push_submesh(
        &mut self,
        indices: &[u32],
        topology: Topology,
    ) -> Result<usize, CombineError> {
        let start = index_len(self.indices.len())?;
        let count = index_len(indices.len())?;
        index_len(self.indices.len() + indices.len())?;
        self.indices.extend_from_slice(indices);
        self.submeshes.push(SubmeshDescriptor::new(start, count, topology));
        Ok(self.submeshes.len() - 1)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Total index count over all submeshes.
    pub fn index_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.index_count as usize).sum()
    }

    /// Returns a submesh's indices with its base vertex applied, checked
    /// against both the index buffer and the vertex buffer.
    ///
    /// `mesh` is only used to label errors.
    pub fn submesh_indices(&self, mesh: usize, submesh: usize) -> Result<Vec<u32>, CombineError> {
        let desc = self
            .submeshes
            .get(submesh)
            .ok_or(CombineError::UnknownSubmesh { mesh, submesh })?;

        let start = desc.index_start as usize;
        let end = start + desc.index_count as usize;
        let range = self
            .indices
            .get(start..end)
            .ok_or(CombineError::SubmeshRangeOutOfBounds {
                mesh,
                submesh,
                start,
                end,
                len: self.indices.len(),
            })?;

        let vertices = self.vertex_count();
        range
            .iter()
            .map(|&i| {
                let index = u64::from(i) + u64::from(desc.base_vertex);
                if index >= vertices as u64 {
                    return Err(CombineError::IndexOutOfRange {
                        mesh,
                        submesh,
                        index,
                        vertices,
                    });
                }
                u32::try_from(index).map_err(|_| CombineError::IndexOutOfRange {
                    mesh,
                    submesh,
                    index,
                    vertices,
                })
            })
            .collect()
    }
}

/// Length of an index range as `u32`.
pub(crate) fn index_len(count: usize) -> Result<u32, CombineError> {
    u32::try_from(count).map_err(|_| CombineError::TooManyIndices { count })
}
