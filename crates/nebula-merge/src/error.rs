//! Errors surfaced by the merge front-end.

use std::path::PathBuf;

use nebula_atlas::AtlasError;
use nebula_config::ConfigError;
use nebula_grid::GridError;
use nebula_mesh::CombineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read job {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    /// Every submesh material must use the shader of the first one.
    #[error("mesh {mesh} submesh {submesh} uses shader {found:?}, expected {expected:?}")]
    MixedShaders {
        mesh: usize,
        submesh: usize,
        expected: String,
        found: String,
    },

    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] ron::Error),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Combine(#[from] CombineError),

    #[error(transparent)]
    Atlas(#[from] AtlasError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
