//! Surface sizing: keeps each raster surface's backing resolution and logical
//! size consistent with the container box and the display's pixel density.
//!
//! Everything outside this module works in logical units. A [`Surface`] owns a
//! backing [`Pixmap`] of `logical × scale` pixels and exposes [`Surface::transform`]
//! so drawing code can issue calls in logical coordinates.

use egui::Vec2;
use tiny_skia::{Pixmap, Transform};

use crate::config::SurfaceConfig;

/// The outcome of a sizing pass: logical size plus backing size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    logical_width: u32,
    logical_height: u32,
    pixels_per_point: f32,
    backing_width: u32,
    backing_height: u32,
}

impl SurfaceLayout {
    /// A layout whose backing resolution equals its logical size.
    pub fn logical(width: u32, height: u32) -> Option<Self> {
        Self::with_scale(width, height, 1.0)
    }

    pub fn with_scale(width: u32, height: u32, pixels_per_point: f32) -> Option<Self> {
        if width == 0 || height == 0 || !(pixels_per_point > 0.0) {
            return None;
        }
        let backing_width = ((width as f32 * pixels_per_point).floor() as u32).max(1);
        let backing_height = ((height as f32 * pixels_per_point).floor() as u32).max(1);
        Some(Self {
            logical_width: width,
            logical_height: height,
            pixels_per_point,
            backing_width,
            backing_height,
        })
    }

    pub fn logical_size(&self) -> Vec2 {
        Vec2::new(self.logical_width as f32, self.logical_height as f32)
    }

    pub fn logical_width(&self) -> u32 {
        self.logical_width
    }

    pub fn logical_height(&self) -> u32 {
        self.logical_height
    }

    pub fn backing_size(&self) -> [u32; 2] {
        [self.backing_width, self.backing_height]
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    /// Maps logical coordinates onto the backing buffer.
    pub fn transform(&self) -> Transform {
        Transform::from_scale(
            self.backing_width as f32 / self.logical_width as f32,
            self.backing_height as f32 / self.logical_height as f32,
        )
    }

    /// Maps the backing buffer back onto logical coordinates.
    pub fn inverse_transform(&self) -> Transform {
        Transform::from_scale(
            self.logical_width as f32 / self.backing_width as f32,
            self.logical_height as f32 / self.backing_height as f32,
        )
    }
}

/// Computes a [`SurfaceLayout`] from a container box.
#[derive(Debug, Clone, Default)]
pub struct SurfaceSizer {
    config: SurfaceConfig,
}

impl SurfaceSizer {
    pub fn new(config: SurfaceConfig) -> Self {
        Self { config }
    }

    /// Width is the padded container width capped at `max_width`; height is a
    /// fraction of the padded width bounded to `[min_height, max_height]`.
    ///
    /// Returns `None` for a zero-size (or too narrow) container.
    pub fn layout(&self, container: Vec2, pixels_per_point: f32) -> Option<SurfaceLayout> {
        let c = &self.config;
        if container.x <= 0.0 || container.y < 0.0 {
            return None;
        }
        let inner = container.x - c.container_padding;
        let width = inner.min(c.max_width).floor();
        if width < 1.0 {
            return None;
        }
        let height = (inner * c.height_ratio).min(c.max_height).max(c.min_height).floor();
        SurfaceLayout::with_scale(width as u32, height as u32, pixels_per_point)
    }
}

/// One raster rendering target.
#[derive(Clone)]
pub struct Surface {
    pixmap: Pixmap,
    layout: SurfaceLayout,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Creates a transparent surface. `None` only if the backing buffer cannot
    /// be allocated.
    pub fn new(layout: SurfaceLayout) -> Option<Self> {
        let [w, h] = layout.backing_size();
        Some(Self {
            pixmap: Pixmap::new(w, h)?,
            layout,
        })
    }

    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    pub fn transform(&self) -> Transform {
        self.layout.transform()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// True when no pixel carries any alpha.
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    /// Sum of alpha over a logical rectangle, a proxy for opaque ink coverage.
    pub fn coverage(&self, logical: egui::Rect) -> u64 {
        let [bw, bh] = self.layout.backing_size();
        let t = self.layout.transform();
        let x0 = ((logical.min.x * t.sx).floor().max(0.0) as u32).min(bw);
        let y0 = ((logical.min.y * t.sy).floor().max(0.0) as u32).min(bh);
        let x1 = ((logical.max.x * t.sx).ceil().max(0.0) as u32).min(bw);
        let y1 = ((logical.max.y * t.sy).ceil().max(0.0) as u32).min(bh);

        let pixels = self.pixmap.pixels();
        let mut total = 0u64;
        for y in y0..y1 {
            let row = (y * bw) as usize;
            for x in x0..x1 {
                total += pixels[row + x as usize].alpha() as u64;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_container_caps_width_and_height() {
        let sizer = SurfaceSizer::default();
        let layout = sizer.layout(Vec2::new(1200.0, 900.0), 1.0).unwrap();
        assert_eq!(layout.logical_width(), 700);
        assert_eq!(layout.logical_height(), 480);
    }

    #[test]
    fn test_narrow_container_uses_min_height() {
        let sizer = SurfaceSizer::default();
        let layout = sizer.layout(Vec2::new(332.0, 600.0), 1.0).unwrap();
        assert_eq!(layout.logical_width(), 300);
        assert_eq!(layout.logical_height(), 300);
    }

    #[test]
    fn test_height_is_fraction_of_width() {
        let sizer = SurfaceSizer::default();
        let layout = sizer.layout(Vec2::new(632.0, 600.0), 1.0).unwrap();
        assert_eq!(layout.logical_width(), 600);
        assert_eq!(layout.logical_height(), 360);
    }

    #[test]
    fn test_zero_container_is_noop() {
        let sizer = SurfaceSizer::default();
        assert!(sizer.layout(Vec2::ZERO, 2.0).is_none());
        assert!(sizer.layout(Vec2::new(20.0, 100.0), 2.0).is_none());
    }

    #[test]
    fn test_backing_scales_with_density() {
        let layout = SurfaceLayout::with_scale(300, 200, 2.0).unwrap();
        assert_eq!(layout.backing_size(), [600, 400]);
        let surface = Surface::new(layout).unwrap();
        assert_eq!(surface.pixmap().width(), 600);
        assert_eq!(surface.transform().sx, 2.0);
        assert!(surface.is_blank());
    }
}
