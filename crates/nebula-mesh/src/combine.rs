//! Combines submeshes into one mesh with one index range and atlas-cell UVs.
//!
//! UVs live per vertex, not per triangle corner. When a vertex is referenced
//! by submeshes assigned to different cells, the submesh that comes later in
//! the order wins and the earlier submesh samples the wrong cell at that
//! vertex. This is a known approximation; callers that need exact results
//! split shared vertices along submesh boundaries before combining. The
//! number of affected vertices is reported in
//! [`CombinedMesh::shared_vertex_conflicts`].

use glam::{Vec2, Vec3};
use nebula_grid::{GridLayout, SubmeshRef};
use serde::{Deserialize, Serialize};

use crate::error::CombineError;
use crate::source_mesh::{SourceMesh, SubmeshDescriptor, Topology, index_len};

/// Options for [`combine`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineOptions {
    /// Compute [`CombinedMesh::bounds`]. Off by default; callers usually
    /// recompute bounds once the mesh is placed.
    pub recalculate_bounds: bool,
}

/// Axis-aligned bounds of a vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Returns `None` for an empty point set.
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = Vec3::from(*first);
        let mut max = min;
        for p in rest {
            let p = Vec3::from(*p);
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self {
            min: min.into(),
            max: max.into(),
        })
    }
}

/// The merged mesh. Owned by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedMesh {
    pub positions: Vec<[f32; 3]>,
    /// Atlas UVs, one per entry of `positions`. Vertices no submesh
    /// references keep `(0, 0)`.
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Exactly one descriptor spanning all of `indices`.
    pub submeshes: Vec<SubmeshDescriptor>,
    /// Only filled when [`CombineOptions::recalculate_bounds`] is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    /// Vertices whose UV was overwritten by a submesh in a different cell.
    #[serde(skip)]
    pub shared_vertex_conflicts: usize,
}

impl CombinedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn topology(&self) -> Option<Topology> {
        self.submeshes.first().map(|s| s.topology)
    }

    pub fn recalculate_bounds(&mut self) {
        self.bounds = Bounds::from_points(&self.positions);
    }
}

/// Enumerates every submesh of `meshes` in cell order.
pub fn submesh_order(meshes: &[SourceMesh]) -> Vec<SubmeshRef> {
    nebula_grid::submesh_order(meshes.iter().map(SourceMesh::submesh_count))
}

/// A submesh whose references and indices have been validated.
struct Resolved {
    /// Position of the owning mesh in the touched list.
    slot: usize,
    indices: Vec<u32>,
}

/// Per-mesh working copy. UVs are written here, never into the source.
struct WorkingMesh {
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    /// Cell that last wrote each vertex.
    written_by: Vec<Option<usize>>,
    conflicted: Vec<bool>,
}

/// Merges the submeshes in `order` into one mesh.
///
/// The submesh at `order[t]` has its UVs remapped into cell `t` of `grid`.
/// Indices are concatenated in `order`, keeping each submesh's triangle order.
/// With a single source mesh its vertex buffer is returned as-is; with several,
/// positions are moved into world space by each mesh's transform and the
/// vertex buffers are appended in order of first use.
pub fn combine(
    meshes: &[SourceMesh],
    order: &[SubmeshRef],
    grid: &GridLayout,
    options: &CombineOptions,
) -> Result<CombinedMesh, CombineError> {
    grid.check_capacity(order.len())?;
    let (topology, touched, resolved) = resolve(meshes, order)?;
    let index_total: usize = resolved.iter().map(|s| s.indices.len()).sum();
    let index_count = index_len(index_total)?;

    tracing::debug!(
        submeshes = order.len(),
        meshes = touched.len(),
        columns = grid.columns(),
        rows = grid.rows(),
        "combining submeshes"
    );

    let mut working: Vec<WorkingMesh> = touched
        .iter()
        .map(|&m| {
            let n = meshes[m].vertex_count();
            WorkingMesh {
                positions: meshes[m].positions.clone(),
                uvs: vec![[0.0, 0.0]; n],
                written_by: vec![None; n],
                conflicted: vec![false; n],
            }
        })
        .collect();

    let mut conflicts = 0;
    for (t, submesh) in resolved.iter().enumerate() {
        let source = &meshes[touched[submesh.slot]];
        let work = &mut working[submesh.slot];
        for &index in &submesh.indices {
            let i = index as usize;
            if let Some(previous) = work.written_by[i]
                && previous != t
                && !work.conflicted[i]
            {
                work.conflicted[i] = true;
                conflicts += 1;
            }
            let uv = grid.remap_uv(Vec2::from(source.uvs[i]), t);
            work.uvs[i] = uv.into();
            work.written_by[i] = Some(t);
        }
    }

    if conflicts > 0 {
        tracing::warn!(
            vertices = conflicts,
            "vertices shared across atlas cells; the later submesh's uv was kept"
        );
    }

    let mut indices = Vec::with_capacity(index_total);

    let (positions, uvs) = if working.len() == 1 {
        for submesh in &resolved {
            indices.extend_from_slice(&submesh.indices);
        }
        let work = working.swap_remove(0);
        (work.positions, work.uvs)
    } else {
        let vertex_total: usize = working.iter().map(|w| w.positions.len()).sum();
        if u32::try_from(vertex_total).is_err() {
            return Err(CombineError::TooManyVertices {
                count: vertex_total,
            });
        }

        let mut bases = Vec::with_capacity(working.len());
        let mut positions = Vec::with_capacity(vertex_total);
        let mut uvs = Vec::with_capacity(vertex_total);
        for (slot, work) in working.into_iter().enumerate() {
            bases.push(positions.len() as u32);
            let transform = meshes[touched[slot]].local_to_world();
            positions.extend(
                work.positions
                    .iter()
                    .map(|p| transform.transform_point3(Vec3::from(*p)).to_array()),
            );
            uvs.extend(work.uvs);
        }

        for submesh in &resolved {
            let base = bases[submesh.slot];
            indices.extend(submesh.indices.iter().map(|&i| i + base));
        }
        (positions, uvs)
    };

    let mut mesh = CombinedMesh {
        positions,
        uvs,
        submeshes: vec![SubmeshDescriptor::new(0, index_count, topology)],
        indices,
        bounds: None,
        shared_vertex_conflicts: conflicts,
    };
    if options.recalculate_bounds {
        mesh.recalculate_bounds();
    }
    Ok(mesh)
}

/// Validates every reference in `order` and gathers its indices.
///
/// Returns the common topology, the touched mesh indices in order of first
/// use, and one resolved entry per submesh.
fn resolve(
    meshes: &[SourceMesh],
    order: &[SubmeshRef],
) -> Result<(Topology, Vec<usize>, Vec<Resolved>), CombineError> {
    let mut topology = None;
    let mut touched = Vec::new();
    let mut slots: Vec<Option<usize>> = vec![None; meshes.len()];
    let mut resolved = Vec::with_capacity(order.len());

    for r in order {
        let unknown = CombineError::UnknownSubmesh {
            mesh: r.mesh,
            submesh: r.submesh,
        };
        let mesh = meshes.get(r.mesh).ok_or(unknown.clone())?;
        let desc = mesh.submeshes.get(r.submesh).ok_or(unknown)?;

        let expected = *topology.get_or_insert(desc.topology);
        if desc.topology != expected {
            return Err(CombineError::TopologyMismatch {
                mesh: r.mesh,
                submesh: r.submesh,
                expected,
                found: desc.topology,
            });
        }

        if mesh.uvs.len() != mesh.vertex_count() {
            return Err(CombineError::UvCountMismatch {
                mesh: r.mesh,
                vertices: mesh.vertex_count(),
                uvs: mesh.uvs.len(),
            });
        }

        let indices = mesh.submesh_indices(r.mesh, r.submesh)?;
        let slot = *slots[r.mesh].get_or_insert_with(|| {
            touched.push(r.mesh);
            touched.len() - 1
        });
        resolved.push(Resolved { slot, indices });
    }

    let topology = topology.ok_or(CombineError::NoSubmeshes)?;
    Ok((topology, touched, resolved))
}
