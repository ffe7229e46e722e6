use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::config::PaperConfig;
use crate::surface::{Surface, SurfaceLayout};

/// Paints the paper texture: a flat fill plus evenly spaced guide lines.
///
/// Pure function of the logical size; `transform` maps logical units onto the
/// target's pixels.
pub fn paint_paper(
    pixmap: &mut Pixmap,
    transform: Transform,
    width: f32,
    height: f32,
    paper: &PaperConfig,
) {
    let mut fill = Paint::default();
    fill.set_color(paper.color.to_skia());
    fill.anti_alias = false;
    if let Some(rect) = Rect::from_xywh(0.0, 0.0, width, height) {
        pixmap.fill_rect(rect, &fill, transform, None);
    }

    let mut line = Paint::default();
    line.set_color(paper.guide_color.to_skia());
    line.anti_alias = true;
    let stroke = Stroke {
        width: paper.guide_width,
        ..Default::default()
    };

    let mut pb = PathBuilder::new();
    let mut y = paper.guide_gap;
    while y < height {
        pb.move_to(paper.guide_inset, y);
        pb.line_to(width - paper.guide_inset, y);
        y += paper.guide_gap;
    }
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, &line, &stroke, transform, None);
    }
}

/// Repaints a whole surface. Called after every resize since resizing
/// discards the surface's contents.
pub fn render_into(surface: &mut Surface, paper: &PaperConfig) {
    let layout = *surface.layout();
    let size = layout.logical_size();
    surface.clear();
    paint_paper(surface.pixmap_mut(), layout.transform(), size.x, size.y, paper);
}

/// Renders the paper at logical resolution.
pub fn render(width: u32, height: u32, paper: &PaperConfig) -> Option<Pixmap> {
    let layout = SurfaceLayout::logical(width, height)?;
    let mut surface = Surface::new(layout)?;
    render_into(&mut surface, paper);
    Some(surface.pixmap().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_is_opaque_everywhere() {
        let paper = PaperConfig::default();
        let pixmap = render(120, 90, &paper).unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 255));
    }

    #[test]
    fn test_guide_lines_darken_rows() {
        let paper = PaperConfig::default();
        let pixmap = render(120, 90, &paper).unwrap();
        let plain = pixmap.pixel(60, 10).unwrap();
        let guide = pixmap.pixel(60, 28).unwrap();
        assert_eq!(plain.red(), 0xf3);
        assert!(guide.red() < plain.red());
        // the inset keeps the margin clean
        assert_eq!(pixmap.pixel(2, 28).unwrap().red(), 0xf3);
    }

    #[test]
    fn test_render_is_idempotent() {
        let paper = PaperConfig::default();
        let a = render(64, 64, &paper).unwrap();
        let b = render(64, 64, &paper).unwrap();
        assert_eq!(a.data(), b.data());
    }
}
