//! Texture atlas compositing: places one source texture per submesh into the
//! grid cell the mesh combiner assigned to that submesh.

mod backend;
mod compositor;
mod cpu;
mod error;

pub use backend::{BlitBackend, ScopedSurface};
pub use compositor::{AtlasCompositor, AtlasTexture, Resolution};
pub use cpu::CpuBlitter;
pub use error::AtlasError;
