//! CPU blit backend built on the `image` crate.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use nebula_grid::UvRect;

use crate::backend::BlitBackend;
use crate::error::AtlasError;

/// Largest surface edge accepted by default, matching the biggest atlas preset.
pub const DEFAULT_MAX_SURFACE_SIZE: u32 = 16384;

/// Blits by cropping the source, resampling it to the destination size, and
/// replacing the destination pixels.
#[derive(Clone, Copy, Debug)]
pub struct CpuBlitter {
    filter: FilterType,
    max_surface_size: u32,
}

impl Default for CpuBlitter {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            max_surface_size: DEFAULT_MAX_SURFACE_SIZE,
        }
    }
}

impl CpuBlitter {
    pub fn new(filter: FilterType, max_surface_size: u32) -> Self {
        Self {
            filter,
            max_surface_size,
        }
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    pub fn max_surface_size(&self) -> u32 {
        self.max_surface_size
    }
}

impl BlitBackend for CpuBlitter {
    type Surface = RgbaImage;

    fn create_surface(
        &self,
        width: u32,
        height: u32,
        clear: Rgba<u8>,
    ) -> Result<RgbaImage, AtlasError> {
        let exhausted = |reason: String| AtlasError::ResourceExhaustion {
            width,
            height,
            reason,
        };

        if width > self.max_surface_size || height > self.max_surface_size {
            return Err(exhausted(format!(
                "edge exceeds the {} pixel surface limit",
                self.max_surface_size
            )));
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| exhausted("byte size overflows usize".to_string()))?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|e| exhausted(e.to_string()))?;
        buffer.resize(len, 0);
        if clear.0 != [0; 4] {
            for pixel in buffer.chunks_exact_mut(4) {
                pixel.copy_from_slice(&clear.0);
            }
        }

        RgbaImage::from_raw(width, height, buffer)
            .ok_or_else(|| exhausted("buffer does not match dimensions".to_string()))
    }

    fn blit(
        &self,
        src: &RgbaImage,
        src_rect: UvRect,
        dst: &mut RgbaImage,
        dst_rect: UvRect,
    ) -> Result<(), AtlasError> {
        let from = src_rect.to_pixels(src.width(), src.height());
        let to = dst_rect.to_pixels(dst.width(), dst.height());
        if from.is_empty() || to.is_empty() {
            return Ok(());
        }

        let region = imageops::crop_imm(src, from.x, from.y, from.width, from.height).to_image();
        let tile = if region.dimensions() == (to.width, to.height) {
            region
        } else {
            imageops::resize(&region, to.width, to.height, self.filter)
        };

        imageops::replace(dst, &tile, i64::from(to.x), i64::from(to.y));
        Ok(())
    }

    fn read_back(&self, surface: &RgbaImage) -> Result<RgbaImage, AtlasError> {
        Ok(surface.clone())
    }
}
