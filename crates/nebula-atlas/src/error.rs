//! Atlas compositing errors.

use nebula_grid::GridError;
use thiserror::Error;

/// Errors returned while compositing an atlas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AtlasError {
    /// Width and height must both be non-zero.
    #[error("invalid atlas resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    /// Grid problems, including more textures than cells.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The backend could not provide a work surface. Not a property of the
    /// input; the same call may succeed with more memory available.
    #[error("could not allocate {width}x{height} work surface: {reason}")]
    ResourceExhaustion {
        width: u32,
        height: u32,
        reason: String,
    },

    /// A pixel count that is not one of the [`Resolution`](crate::Resolution) presets.
    #[error("{0} is not a supported resolution preset")]
    UnknownPreset(u32),
}
