//! The merge job file: meshes plus the material bound to each submesh.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use nebula_grid::SubmeshRef;
use nebula_mesh::SourceMesh;
use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Material of one submesh. Only the shader and texture slots matter here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMaterial {
    pub shader: String,
    /// Texture channel name (e.g. `_MainTex`) to image path. Relative paths
    /// resolve against the job file's directory.
    #[serde(default)]
    pub textures: BTreeMap<String, PathBuf>,
}

/// A mesh and its materials, `materials[i]` drawing submesh `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMesh {
    pub mesh: SourceMesh,
    #[serde(default)]
    pub materials: Vec<JobMaterial>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeJob {
    /// Base name of every output file.
    pub name: String,
    pub meshes: Vec<JobMesh>,
}

impl MergeJob {
    pub fn load(path: &Path) -> Result<Self, JobError> {
        let contents = std::fs::read_to_string(path).map_err(|source| JobError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| JobError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn source_meshes(&self) -> Vec<SourceMesh> {
        self.meshes.iter().map(|m| m.mesh.clone()).collect()
    }

    pub fn submesh_order(&self) -> Vec<SubmeshRef> {
        nebula_grid::submesh_order(self.meshes.iter().map(|m| m.mesh.submesh_count()))
    }

    /// Material bound to a submesh, if the mesh lists one.
    pub fn material(&self, submesh: SubmeshRef) -> Option<&JobMaterial> {
        self.meshes.get(submesh.mesh)?.materials.get(submesh.submesh)
    }

    /// The shader shared by every submesh material.
    ///
    /// Warns about meshes whose material count differs from their submesh
    /// count and fails if two materials use different shaders.
    pub fn shared_shader(&self) -> Result<Option<&str>, JobError> {
        for (m, job_mesh) in self.meshes.iter().enumerate() {
            let submeshes = job_mesh.mesh.submesh_count();
            if job_mesh.materials.len() != submeshes {
                tracing::warn!(
                    mesh = m,
                    materials = job_mesh.materials.len(),
                    submeshes,
                    "material count does not match submesh count"
                );
            }
        }

        let mut shader: Option<&str> = None;
        for r in self.submesh_order() {
            let Some(material) = self.material(r) else {
                continue;
            };
            match shader {
                None => shader = Some(material.shader.as_str()),
                Some(expected) if expected != material.shader => {
                    return Err(JobError::MixedShaders {
                        mesh: r.mesh,
                        submesh: r.submesh,
                        expected: expected.to_string(),
                        found: material.shader.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(shader)
    }

    /// Texture paths per channel, aligned to `order`.
    ///
    /// Channels are the union of slots over all materials. A submesh without
    /// a texture for a channel gets `None` and its cell stays empty.
    pub fn channel_bindings(&self, order: &[SubmeshRef]) -> BTreeMap<String, Vec<Option<PathBuf>>> {
        let channels: BTreeSet<&String> = order
            .iter()
            .filter_map(|&r| self.material(r))
            .flat_map(|material| material.textures.keys())
            .collect();

        let mut bindings = BTreeMap::new();
        for channel in channels {
            let paths: Vec<Option<PathBuf>> = order
                .iter()
                .map(|&r| self.material(r).and_then(|m| m.textures.get(channel)).cloned())
                .collect();

            let bound = paths.iter().flatten().count();
            if bound != order.len() {
                tracing::warn!(
                    channel = channel.as_str(),
                    bound,
                    expected = order.len(),
                    "texture channel is not assigned for every submesh"
                );
            }
            bindings.insert(channel.clone(), paths);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_mesh::Topology;

    fn material(shader: &str, textures: &[(&str, &str)]) -> JobMaterial {
        JobMaterial {
            shader: shader.to_string(),
            textures: textures
                .iter()
                .map(|(k, v)| (k.to_string(), PathBuf::from(v)))
                .collect(),
        }
    }

    fn mesh_with_submeshes(count: usize) -> SourceMesh {
        let mut mesh = SourceMesh::new("m", vec![[0.0; 3]; 3], vec![[0.0; 2]; 3]);
        for _ in 0..count {
            mesh.push_submesh(&[0, 1, 2], Topology::Triangles).unwrap();
        }
        mesh
    }

    fn job() -> MergeJob {
        MergeJob {
            name: "crate".to_string(),
            meshes: vec![
                JobMesh {
                    mesh: mesh_with_submeshes(2),
                    materials: vec![
                        material("Standard", &[("_MainTex", "a.png"), ("_BumpMap", "a_n.png")]),
                        material("Standard", &[("_MainTex", "b.png")]),
                    ],
                },
                JobMesh {
                    mesh: mesh_with_submeshes(1),
                    materials: vec![material("Standard", &[("_MainTex", "c.png")])],
                },
            ],
        }
    }

    #[test]
    fn test_channel_bindings_align_with_order() {
        let job = job();
        let order = job.submesh_order();
        let bindings = job.channel_bindings(&order);

        assert_eq!(bindings.len(), 2);
        assert_eq!(
            bindings["_MainTex"],
            vec![
                Some(PathBuf::from("a.png")),
                Some(PathBuf::from("b.png")),
                Some(PathBuf::from("c.png"))
            ]
        );
        assert_eq!(
            bindings["_BumpMap"],
            vec![Some(PathBuf::from("a_n.png")), None, None]
        );
    }

    #[test]
    fn test_missing_materials_leave_cells_empty() {
        let mut job = job();
        job.meshes[1].materials.clear();
        let bindings = job.channel_bindings(&job.submesh_order());
        assert_eq!(bindings["_MainTex"][2], None);
        assert_eq!(job.shared_shader().unwrap(), Some("Standard"));
    }

    #[test]
    fn test_mixed_shaders_rejected() {
        let mut job = job();
        job.meshes[1].materials[0].shader = "Unlit".to_string();
        let err = job.shared_shader().unwrap_err();
        assert!(matches!(
            err,
            JobError::MixedShaders {
                mesh: 1,
                submesh: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_load_from_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.ron");
        let src = r#"(
            name: "barrel",
            meshes: [(
                mesh: (
                    positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)],
                    uvs: [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
                    indices: [0, 1, 2],
                    submeshes: [(index_start: 0, index_count: 3)],
                ),
                materials: [(shader: "Standard", textures: {"_MainTex": "wood.png"})],
            )],
        )"#;
        std::fs::write(&path, src).unwrap();

        let job = MergeJob::load(&path).unwrap();
        assert_eq!(job.name, "barrel");
        assert_eq!(job.submesh_order(), vec![SubmeshRef::new(0, 0)]);
        assert_eq!(
            job.material(SubmeshRef::new(0, 0)).unwrap().textures["_MainTex"],
            PathBuf::from("wood.png")
        );
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "(name: ").unwrap();
        assert!(matches!(MergeJob::load(&path), Err(JobError::Parse { .. })));
        assert!(matches!(
            MergeJob::load(&dir.path().join("missing.ron")),
            Err(JobError::Read { .. })
        ));
    }
}
