use egui::epaint::Vertex;
use egui::{Color32, CursorIcon, Mesh, Painter, Pos2, Rect, Shape, Stroke, TextureId, Vec2, pos2};

use crate::sticker::{StickerEngine, StickerHandle, StickerInstance, rotate};

const HANDLE_COLOR: Color32 = Color32::from_rgb(59, 110, 196);
const DELETE_COLOR: Color32 = Color32::from_rgb(37, 47, 80);

impl StickerHandle {
    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            StickerHandle::Body => CursorIcon::Grab,
            StickerHandle::Rotate => CursorIcon::Crosshair,
            StickerHandle::Resize => CursorIcon::ResizeNwSe,
            StickerHandle::Delete => CursorIcon::PointingHand,
        }
    }
}

/// Maps logical sheet coordinates to screen points.
#[derive(Debug, Clone, Copy)]
pub struct SheetToScreen {
    pub origin: Pos2,
}

impl SheetToScreen {
    pub fn point(&self, logical: Pos2) -> Pos2 {
        self.origin + logical.to_vec2()
    }

    pub fn logical(&self, screen: Pos2) -> Pos2 {
        (screen - self.origin).to_pos2()
    }
}

/// Corners of the rotated sprite box, clockwise from top-left.
fn corners(sticker: &StickerInstance, natural: Vec2) -> [Vec2; 4] {
    let half = sticker.half_extents(natural);
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|corner| rotate(corner, sticker.rotation))
}

/// Paints a sprite texture as a rotated, scaled quad.
pub fn paint_sprite(
    painter: &Painter,
    map: SheetToScreen,
    sticker: &StickerInstance,
    natural: Vec2,
    texture: TextureId,
    tint: Color32,
) {
    let center = map.point(sticker.position);
    let [tl, tr, br, bl] = corners(sticker, natural);
    let uvs = [pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(1.0, 1.0), pos2(0.0, 1.0)];

    let mut mesh = Mesh::with_texture(texture);
    for (offset, uv) in [tl, tr, br, bl].into_iter().zip(uvs) {
        mesh.vertices.push(Vertex {
            pos: center + offset,
            uv,
            color: tint,
        });
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(Shape::mesh(mesh));
}

/// Stand-in for a sprite that has not loaded (or failed).
pub fn paint_missing(painter: &Painter, map: SheetToScreen, sticker: &StickerInstance, natural: Vec2) {
    let center = map.point(sticker.position);
    let points = corners(sticker, natural).map(|offset| center + offset).to_vec();
    painter.add(Shape::convex_polygon(
        points,
        Color32::from_black_alpha(20),
        Stroke::new(1.0, Color32::from_black_alpha(60)),
    ));
    painter.text(
        center,
        egui::Align2::CENTER_CENTER,
        sticker.kind().key(),
        egui::FontId::proportional(12.0),
        Color32::from_black_alpha(140),
    );
}

/// Outline plus rotate, resize and delete handles of the selected sticker.
pub fn paint_selection(
    painter: &Painter,
    map: SheetToScreen,
    engine: &StickerEngine,
    sticker: &StickerInstance,
    natural: Vec2,
) {
    let center = map.point(sticker.position);
    let outline = corners(sticker, natural).map(|offset| center + offset).to_vec();
    painter.add(Shape::closed_line(outline, Stroke::new(2.0, HANDLE_COLOR)));

    let radius = engine.config().handle_radius * 0.6;
    let box_top = map.point(sticker.local_rect(natural).center_top());
    for (handle, anchor) in engine.handle_anchors(sticker, natural) {
        let at = map.point(anchor);
        match handle {
            StickerHandle::Rotate => {
                painter.line_segment([box_top, at], Stroke::new(1.0, HANDLE_COLOR));
                painter.circle_filled(at, radius, HANDLE_COLOR);
            }
            StickerHandle::Resize => {
                painter.rect_filled(Rect::from_center_size(at, Vec2::splat(radius * 2.0)), 2.0, HANDLE_COLOR);
            }
            StickerHandle::Delete => {
                painter.circle_filled(at, radius, Color32::WHITE);
                painter.text(
                    at,
                    egui::Align2::CENTER_CENTER,
                    "x",
                    egui::FontId::proportional(radius * 1.6),
                    DELETE_COLOR,
                );
            }
            StickerHandle::Body => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    #[test]
    fn test_sheet_mapping_round_trips() {
        let map = SheetToScreen { origin: pos2(16.0, 40.0) };
        let logical = pos2(10.0, 20.0);
        assert_eq!(map.point(logical), pos2(26.0, 60.0));
        assert_eq!(map.logical(map.point(logical)), logical);
    }

    #[test]
    fn test_corners_follow_rotation() {
        use crate::sticker::StickerKind;

        let mut sticker = StickerInstance::new(StickerKind::Sao, pos2(0.0, 0.0), 1.0, false);
        sticker.rotation = 90.0;
        let [top_left, _, bottom_right, _] = corners(&sticker, vec2(40.0, 20.0));
        assert!((top_left - vec2(10.0, -20.0)).length() < 1e-4);
        assert!((bottom_right - vec2(-10.0, 20.0)).length() < 1e-4);
    }
}
