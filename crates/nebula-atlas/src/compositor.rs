//! [`AtlasCompositor`]: draws per-submesh textures into their grid cells.

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};
use nebula_grid::{GridLayout, UvRect};
use serde::{Deserialize, Serialize};

use crate::backend::{BlitBackend, ScopedSurface};
use crate::error::AtlasError;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Common square atlas edge lengths. Any non-zero size is accepted by
/// [`AtlasCompositor::composite`]; these are the offered presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    R512,
    R1024,
    R2048,
    R4096,
    R8192,
    R16384,
}

impl Resolution {
    pub const ALL: [Resolution; 6] = [
        Resolution::R512,
        Resolution::R1024,
        Resolution::R2048,
        Resolution::R4096,
        Resolution::R8192,
        Resolution::R16384,
    ];

    /// Edge length in pixels.
    pub fn pixels(self) -> u32 {
        match self {
            Resolution::R512 => 512,
            Resolution::R1024 => 1024,
            Resolution::R2048 => 2048,
            Resolution::R4096 => 4096,
            Resolution::R8192 => 8192,
            Resolution::R16384 => 16384,
        }
    }
}

impl TryFrom<u32> for Resolution {
    type Error = AtlasError;

    fn try_from(pixels: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|r| r.pixels() == pixels)
            .ok_or(AtlasError::UnknownPreset(pixels))
    }
}

// ---------------------------------------------------------------------------
// AtlasTexture
// ---------------------------------------------------------------------------

/// One composited atlas image.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasTexture {
    /// Texture channel (material slot) name, when produced per channel.
    pub channel: Option<String>,
    pub image: RgbaImage,
}

impl AtlasTexture {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Largest edge, used as the import max-size for the written texture.
    pub fn max_texture_size(&self) -> u32 {
        self.width().max(self.height())
    }
}

// ---------------------------------------------------------------------------
// AtlasCompositor
// ---------------------------------------------------------------------------

/// Composites atlases through an injected [`BlitBackend`].
///
/// Holds no per-call state: every call acquires its own work surface, so one
/// compositor can serve several channels at once.
pub struct AtlasCompositor<B> {
    backend: B,
    clear: Rgba<u8>,
}

impl<B: BlitBackend> AtlasCompositor<B> {
    /// Creates a compositor clearing to transparent black.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            clear: Rgba([0, 0, 0, 0]),
        }
    }

    /// Sets the value empty cells keep.
    pub fn with_clear_color(mut self, clear: Rgba<u8>) -> Self {
        self.clear = clear;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clear_color(&self) -> Rgba<u8> {
        self.clear
    }

    /// Draws `textures[t]` over cell `t` of `grid`, stretching the whole
    /// source over the cell. `None` entries leave their cell cleared.
    pub fn composite(
        &self,
        resolution: (u32, u32),
        grid: &GridLayout,
        textures: &[Option<&RgbaImage>],
    ) -> Result<AtlasTexture, AtlasError> {
        let (width, height) = resolution;
        if width == 0 || height == 0 {
            return Err(AtlasError::InvalidResolution { width, height });
        }
        grid.check_capacity(textures.len())?;

        tracing::debug!(
            width,
            height,
            cells = textures.len(),
            bound = textures.iter().flatten().count(),
            "compositing atlas"
        );

        let mut surface = ScopedSurface::acquire(&self.backend, width, height, self.clear)?;
        for (t, texture) in textures.iter().enumerate() {
            if let Some(texture) = texture {
                surface.blit(texture, UvRect::FULL, grid.cell_rect(t))?;
            }
        }
        let image = surface.read_back()?;

        Ok(AtlasTexture {
            channel: None,
            image,
        })
    }

    /// Runs [`composite`](Self::composite) once per channel, each on its own
    /// scoped thread. The first failing channel's error is returned.
    pub fn composite_channels(
        &self,
        resolution: (u32, u32),
        grid: &GridLayout,
        channels: &BTreeMap<String, Vec<Option<RgbaImage>>>,
    ) -> Result<BTreeMap<String, AtlasTexture>, AtlasError>
    where
        B: Sync,
    {
        std::thread::scope(|scope| {
            let handles: Vec<_> = channels
                .iter()
                .map(|(name, textures)| {
                    let handle = scope.spawn(move || {
                        let textures: Vec<Option<&RgbaImage>> =
                            textures.iter().map(Option::as_ref).collect();
                        self.composite(resolution, grid, &textures)
                    });
                    (name, handle)
                })
                .collect();

            let mut atlases = BTreeMap::new();
            for (name, handle) in handles {
                let mut atlas = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
                atlas.channel = Some(name.clone());
                atlases.insert(name.clone(), atlas);
            }
            Ok(atlases)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::imageops::FilterType;
    use nebula_grid::GridError;

    use super::*;
    use crate::cpu::CpuBlitter;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn compositor() -> AtlasCompositor<CpuBlitter> {
        AtlasCompositor::new(CpuBlitter::new(FilterType::Nearest, 1024))
    }

    fn grid(columns: u32, rows: u32) -> GridLayout {
        GridLayout::new(columns, rows).unwrap()
    }

    /// Wraps the CPU backend, counting surfaces and optionally failing blits.
    #[derive(Default)]
    struct CountingBackend {
        inner: CpuBlitter,
        created: AtomicUsize,
        released: AtomicUsize,
        fail_blits: bool,
    }

    impl BlitBackend for CountingBackend {
        type Surface = RgbaImage;

        fn create_surface(
            &self,
            width: u32,
            height: u32,
            clear: Rgba<u8>,
        ) -> Result<RgbaImage, AtlasError> {
            let surface = self.inner.create_surface(width, height, clear)?;
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(surface)
        }

        fn blit(
            &self,
            src: &RgbaImage,
            src_rect: UvRect,
            dst: &mut RgbaImage,
            dst_rect: UvRect,
        ) -> Result<(), AtlasError> {
            if self.fail_blits {
                return Err(AtlasError::ResourceExhaustion {
                    width: dst.width(),
                    height: dst.height(),
                    reason: "device lost".to_string(),
                });
            }
            self.inner.blit(src, src_rect, dst, dst_rect)
        }

        fn read_back(&self, surface: &RgbaImage) -> Result<RgbaImage, AtlasError> {
            self.inner.read_back(surface)
        }

        fn release(&self, _surface: &mut RgbaImage) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_all_empty_is_uniformly_cleared() {
        let atlas = compositor()
            .composite((16, 8), &grid(3, 3), &[None, None, None, None])
            .unwrap();
        assert_eq!((atlas.width(), atlas.height()), (16, 8));
        assert!(atlas.image.pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn test_clear_color_is_configurable() {
        let background = Rgba([10, 20, 30, 255]);
        let atlas = compositor()
            .with_clear_color(background)
            .composite((4, 4), &grid(1, 1), &[])
            .unwrap();
        assert!(atlas.image.pixels().all(|p| *p == background));
    }

    #[test]
    fn test_second_cell_of_2x2_is_bottom_right() {
        let red = RgbaImage::from_pixel(8, 8, RED);
        let atlas = compositor()
            .composite((4, 4), &grid(2, 2), &[None, Some(&red)])
            .unwrap();

        // UV rect (0.5, 0, 0.5, 0.5) is the right half of the bottom row.
        for (x, y, p) in atlas.image.enumerate_pixels() {
            let inside = x >= 2 && y >= 2;
            assert_eq!(*p, if inside { RED } else { CLEAR }, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_cells_follow_submesh_order() {
        let textures = [
            RgbaImage::from_pixel(2, 2, RED),
            RgbaImage::from_pixel(2, 2, GREEN),
            RgbaImage::from_pixel(2, 2, BLUE),
        ];
        let refs: Vec<Option<&RgbaImage>> = textures.iter().map(Some).collect();
        let atlas = compositor().composite((30, 10), &grid(3, 1), &refs).unwrap();

        assert_eq!(*atlas.image.get_pixel(5, 5), RED);
        assert_eq!(*atlas.image.get_pixel(15, 5), GREEN);
        assert_eq!(*atlas.image.get_pixel(25, 5), BLUE);
    }

    #[test]
    fn test_full_cell_blit_keeps_orientation() {
        let mut texture = RgbaImage::from_pixel(4, 4, BLUE);
        for x in 0..4 {
            for y in 0..2 {
                texture.put_pixel(x, y, RED);
            }
        }
        let atlas = compositor()
            .composite((4, 4), &grid(1, 1), &[Some(&texture)])
            .unwrap();
        assert_eq!(atlas.image, texture);
    }

    #[test]
    fn test_invalid_resolution() {
        let result = compositor().composite((0, 512), &grid(1, 1), &[]);
        assert_eq!(
            result,
            Err(AtlasError::InvalidResolution {
                width: 0,
                height: 512
            })
        );
    }

    #[test]
    fn test_grid_overflow_produces_nothing() {
        let backend = CountingBackend::default();
        let compositor = AtlasCompositor::new(backend);
        let result = compositor.composite((4, 4), &grid(1, 2), &[None, None, None]);
        assert_eq!(
            result,
            Err(AtlasError::Grid(GridError::Overflow {
                count: 3,
                capacity: 2
            }))
        );
        assert_eq!(compositor.backend().created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_surface_released_on_success_and_failure() {
        let red = RgbaImage::from_pixel(2, 2, RED);

        let ok = AtlasCompositor::new(CountingBackend::default());
        ok.composite((4, 4), &grid(2, 1), &[Some(&red)]).unwrap();
        assert_eq!(ok.backend().created.load(Ordering::SeqCst), 1);
        assert_eq!(ok.backend().released.load(Ordering::SeqCst), 1);

        let failing = AtlasCompositor::new(CountingBackend {
            fail_blits: true,
            ..Default::default()
        });
        let result = failing.composite((4, 4), &grid(2, 1), &[Some(&red)]);
        assert!(matches!(result, Err(AtlasError::ResourceExhaustion { .. })));
        assert_eq!(failing.backend().created.load(Ordering::SeqCst), 1);
        assert_eq!(failing.backend().released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_composite_channels() {
        let mut channels = BTreeMap::new();
        channels.insert(
            "_MainTex".to_string(),
            vec![Some(RgbaImage::from_pixel(2, 2, RED)), None],
        );
        channels.insert(
            "_BumpMap".to_string(),
            vec![None, Some(RgbaImage::from_pixel(2, 2, BLUE))],
        );

        let compositor = AtlasCompositor::new(CountingBackend {
            inner: CpuBlitter::new(FilterType::Nearest, 1024),
            ..Default::default()
        });
        let atlases = compositor
            .composite_channels((8, 4), &grid(2, 1), &channels)
            .unwrap();

        assert_eq!(atlases.len(), 2);
        let main = &atlases["_MainTex"];
        assert_eq!(main.channel.as_deref(), Some("_MainTex"));
        assert_eq!(*main.image.get_pixel(1, 1), RED);
        assert_eq!(*main.image.get_pixel(6, 1), CLEAR);
        assert_eq!(*atlases["_BumpMap"].image.get_pixel(6, 1), BLUE);
        assert_eq!(compositor.backend().released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolution_presets() {
        assert_eq!(Resolution::R4096.pixels(), 4096);
        assert_eq!(Resolution::try_from(2048), Ok(Resolution::R2048));
        assert_eq!(Resolution::try_from(4098), Err(AtlasError::UnknownPreset(4098)));
        let json = serde_json::to_string(&Resolution::R512).unwrap();
        assert_eq!(serde_json::from_str::<Resolution>(&json).unwrap(), Resolution::R512);
    }

    #[test]
    fn test_max_texture_size() {
        let atlas = compositor().composite((512, 128), &grid(1, 1), &[]).unwrap();
        assert_eq!(atlas.max_texture_size(), 512);
    }
}
