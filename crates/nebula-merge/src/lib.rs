//! Merge jobs: loads meshes, materials, and textures described in a RON
//! file, runs the mesh combiner and the atlas compositor over them, and
//! writes the merged mesh, atlases, and material manifest.

pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod preview;

pub use error::JobError;
pub use job::{JobMaterial, JobMesh, MergeJob};
pub use output::{MaterialManifest, TextureBinding, WrittenFiles, write_outputs};
pub use pipeline::{MergeOutputs, merge, run};
pub use preview::render_preview;
