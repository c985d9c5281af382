//! The submesh enumeration that assigns every submesh its atlas cell.

use serde::{Deserialize, Serialize};

/// One submesh of one source mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmeshRef {
    /// Index of the source mesh.
    pub mesh: usize,
    /// Submesh index within that mesh.
    pub submesh: usize,
}

impl SubmeshRef {
    pub fn new(mesh: usize, submesh: usize) -> Self {
        Self { mesh, submesh }
    }
}

/// Enumerates submeshes by mesh index, then submesh index, both ascending.
///
/// `counts[m]` is the submesh count of mesh `m`. The position of an entry in
/// the result is its cell index for both UV remapping and texture placement.
pub fn submesh_order<I>(counts: I) -> Vec<SubmeshRef>
where
    I: IntoIterator<Item = usize>,
{
    counts
        .into_iter()
        .enumerate()
        .flat_map(|(mesh, count)| (0..count).map(move |submesh| SubmeshRef { mesh, submesh }))
        .collect()
}
