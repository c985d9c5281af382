//! Normalized UV rectangles and their pixel-space counterparts.

use glam::Vec2;

/// Axis-aligned rectangle in normalized UV space (`v = 0` at the bottom edge).
///
/// Containment is half-open: `min` inclusive, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn x(&self) -> f32 {
        self.min.x
    }

    pub fn y(&self) -> f32 {
        self.min.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, uv: Vec2) -> bool {
        uv.x >= self.min.x && uv.x < self.max.x && uv.y >= self.min.y && uv.y < self.max.y
    }

    /// Converts to pixel coordinates of a `width × height` image whose row 0
    /// is the top row. Edges are rounded to the nearest pixel and clamped to
    /// the image, so rects sharing an edge in UV space share it in pixels.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        let w = width as f32;
        let h = height as f32;
        let edge = |v: f32, size: f32, limit: u32| ((v * size).round().max(0.0) as u32).min(limit);

        let x0 = edge(self.min.x, w, width);
        let x1 = edge(self.max.x, w, width);
        let y0 = edge(1.0 - self.max.y, h, height);
        let y1 = edge(1.0 - self.min.y, h, height);

        PixelRect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// Rectangle in image pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
