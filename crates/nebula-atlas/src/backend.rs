//! The blit primitive supplied by a rendering backend, and the scoped work
//! surface the compositor draws into.

use image::{Rgba, RgbaImage};
use nebula_grid::UvRect;

use crate::error::AtlasError;

/// Rendering backend used by [`AtlasCompositor`](crate::AtlasCompositor).
///
/// All rects are normalized UV rects with `v = 0` at the bottom edge.
pub trait BlitBackend {
    /// Render target the atlas is drawn into.
    type Surface;

    /// Allocates a `width × height` surface filled with `clear`.
    ///
    /// Allocation failures must be reported as
    /// [`AtlasError::ResourceExhaustion`].
    fn create_surface(
        &self,
        width: u32,
        height: u32,
        clear: Rgba<u8>,
    ) -> Result<Self::Surface, AtlasError>;

    /// Copies `src_rect` of `src` into `dst_rect` of `dst`, resampling as
    /// needed. Pixels outside `dst_rect` are left untouched.
    fn blit(
        &self,
        src: &RgbaImage,
        src_rect: UvRect,
        dst: &mut Self::Surface,
        dst_rect: UvRect,
    ) -> Result<(), AtlasError>;

    /// Reads the surface back into a CPU image.
    fn read_back(&self, surface: &Self::Surface) -> Result<RgbaImage, AtlasError>;

    /// Frees backend resources held by `surface`. Called exactly once per
    /// created surface, right before it is dropped.
    fn release(&self, _surface: &mut Self::Surface) {}
}

/// A work surface that is released when it goes out of scope, on success
/// and error paths alike.
pub struct ScopedSurface<'a, B: BlitBackend> {
    backend: &'a B,
    surface: B::Surface,
}

impl<'a, B: BlitBackend> ScopedSurface<'a, B> {
    pub fn acquire(
        backend: &'a B,
        width: u32,
        height: u32,
        clear: Rgba<u8>,
    ) -> Result<Self, AtlasError> {
        let surface = backend.create_surface(width, height, clear)?;
        Ok(Self { backend, surface })
    }

    pub fn blit(
        &mut self,
        src: &RgbaImage,
        src_rect: UvRect,
        dst_rect: UvRect,
    ) -> Result<(), AtlasError> {
        self.backend.blit(src, src_rect, &mut self.surface, dst_rect)
    }

    pub fn read_back(&self) -> Result<RgbaImage, AtlasError> {
        self.backend.read_back(&self.surface)
    }
}

impl<B: BlitBackend> Drop for ScopedSurface<'_, B> {
    fn drop(&mut self) {
        self.backend.release(&mut self.surface);
    }
}
