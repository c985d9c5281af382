//! Submesh merging: collapses several mesh/submesh pairs into one mesh whose
//! UVs address a shared texture atlas.

pub mod combine;
pub mod error;
pub mod source_mesh;

pub use combine::{Bounds, CombineOptions, CombinedMesh, combine, submesh_order};
pub use error::CombineError;
pub use source_mesh::{SourceMesh, SubmeshDescriptor, Topology};
