use egui::{Sense, vec2};

use crate::SketchpadApp;
use crate::sticker::{DragPayload, StickerKind};
use crate::textures::{TextureSlot, pixmap_to_image};

const THUMB_SIZE: f32 = 56.0;
const PANEL_MARGIN: f32 = 8.0;

/// Vertical catalog of stickers floating over the top-right corner of the
/// canvas area. Drag one onto the sheet, or double-click to drop it in the
/// middle. Takes no space from the canvas.
pub fn sticker_panel(app: &mut SketchpadApp, ctx: &egui::Context) {
    let Some(container) = app.canvas_rect else {
        return;
    };
    let width = THUMB_SIZE + 2.0 * PANEL_MARGIN;
    egui::Area::new(egui::Id::new("sticker_panel"))
        .order(egui::Order::Foreground)
        .fixed_pos(container.right_top() + vec2(-width - PANEL_MARGIN, PANEL_MARGIN))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_width(THUMB_SIZE);
                egui::ScrollArea::vertical()
                    .max_height((container.height() - 4.0 * PANEL_MARGIN).max(THUMB_SIZE))
                    .show(ui, |ui| {
                        for kind in StickerKind::ALL {
                            let id = egui::Id::new(("sticker_source", kind));
                            let response = ui
                                .dnd_drag_source(id, DragPayload::for_kind(kind), |ui| {
                                    sticker_thumb(app, ctx, ui, kind);
                                })
                                .response
                                .interact(Sense::click());
                            if response.double_clicked() {
                                app.pad.quick_add(kind);
                            }
                        }
                    });
            });
        });
}

fn sticker_thumb(app: &mut SketchpadApp, ctx: &egui::Context, ui: &mut egui::Ui, kind: StickerKind) {
    let Some(sprite) = app.pad.assets().sprite(kind) else {
        let (rect, _) = ui.allocate_exact_size(vec2(THUMB_SIZE, THUMB_SIZE), Sense::hover());
        ui.painter()
            .rect_stroke(rect, 4.0, egui::Stroke::new(1.0, ui.visuals().weak_text_color()));
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            kind.key(),
            egui::FontId::proportional(12.0),
            ui.visuals().weak_text_color(),
        );
        return;
    };
    let natural = sprite.natural_size();
    let fit = THUMB_SIZE / natural.x.max(natural.y).max(1.0);
    match app
        .textures
        .get_or_create(ctx, TextureSlot::Sprite(kind), 0, || pixmap_to_image(sprite.pixmap()))
    {
        Ok(texture) => {
            ui.add(egui::Image::from_texture((texture, natural * fit)).sense(Sense::hover()))
                .on_hover_text(kind.key());
        }
        Err(err) => log::warn!("Sprite texture for {kind} failed: {err}"),
    }
}
