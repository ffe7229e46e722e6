use egui::{Color32, CursorIcon, Pos2, Rect, Sense, Vec2, pos2, vec2};

use crate::SketchpadApp;
use crate::sticker::DragPayload;
use crate::textures::{TextureSlot, pixmap_to_image};
use crate::util::time;
use crate::widgets::{SheetToScreen, paint_missing, paint_selection, paint_sprite};

/// Vertical travel of the sheet during the commit transition, in sheet heights.
const FALL_DISTANCE: f32 = 1.2;

pub fn canvas_panel(app: &mut SketchpadApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::central_panel(&ctx.style()).fill(Color32::from_gray(28)))
        .show(ctx, |ui| {
            app.canvas_rect = Some(ui.max_rect());
            app.pad.resize(ui.available_size(), ctx.pixels_per_point());
            let Some(layout) = app.pad.layout() else {
                return;
            };
            let size = layout.logical_size();

            ui.vertical_centered(|ui| {
                let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
                let now = ctx.input(|i| i.time);
                let progress = commit_progress(app, ctx, now);
                let sheet = rect.translate(vec2(0.0, progress * progress * size.y * FALL_DISTANCE));
                let tint = Color32::WHITE.gamma_multiply(1.0 - progress);

                paint_sheet(app, ctx, ui, sheet, tint);

                if progress == 0.0 {
                    handle_pointer(app, ctx, rect, &response);
                    handle_drop(app, rect, &response);
                }
                if app.pad.is_committing() && app.commit_started.is_none() {
                    app.commit_started = Some(now);
                    ctx.request_repaint();
                }
            });
        });
}

/// 0 while editing, rising to 1 over the commit transition. Finishes the
/// commit once the transition is over.
fn commit_progress(app: &mut SketchpadApp, ctx: &egui::Context, now: f64) -> f32 {
    let Some(started) = app.commit_started else {
        return 0.0;
    };
    let duration = f64::from(app.pad.config().commit_transition_secs.max(0.01));
    let t = ((now - started) / duration) as f32;
    if t >= 1.0 {
        app.pad.finish_commit();
        app.commit_started = None;
        return 0.0;
    }
    ctx.request_repaint();
    t.max(f32::EPSILON)
}

fn paint_sheet(app: &mut SketchpadApp, ctx: &egui::Context, ui: &egui::Ui, sheet: Rect, tint: Color32) {
    let painter = ui.painter_at(sheet.expand(64.0));
    let full_uv = Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0));

    if let Some(bg) = app.pad.background() {
        match app.textures.get_or_create(ctx, TextureSlot::Background, app.pad.background_version(), || {
            pixmap_to_image(bg.pixmap())
        }) {
            Ok(texture) => {
                painter.image(texture, sheet, full_uv, tint);
            }
            Err(err) => log::warn!("Background texture failed: {err}"),
        }
    }
    if let Some(ink) = app.pad.ink().surface() {
        match app.textures.get_or_create(ctx, TextureSlot::Ink, app.pad.ink().version(), || {
            pixmap_to_image(ink.pixmap())
        }) {
            Ok(texture) => {
                painter.image(texture, sheet, full_uv, tint);
            }
            Err(err) => log::warn!("Ink texture failed: {err}"),
        }
    }

    let map = SheetToScreen { origin: sheet.min };
    let engine = app.pad.stickers();
    let fallback = engine.fallback_size();
    // most recent is stored first and drawn last
    for sticker in engine.stickers().iter().rev() {
        let kind = sticker.kind();
        let Some(sprite) = app.pad.assets().sprite(kind) else {
            paint_missing(&painter, map, sticker, fallback);
            continue;
        };
        match app.textures.get_or_create(ctx, TextureSlot::Sprite(kind), 0, || {
            pixmap_to_image(sprite.pixmap())
        }) {
            Ok(texture) => paint_sprite(&painter, map, sticker, sprite.natural_size(), texture, tint),
            Err(err) => log::warn!("Sprite texture for {kind} failed: {err}"),
        }
    }

    if app.select_mode.is_engaged() {
        if let Some(selected) = engine.selected() {
            let natural = app.pad.natural_size(selected.kind()).unwrap_or(fallback);
            paint_selection(&painter, map, engine, selected, natural);
        }
    }
}

fn handle_pointer(app: &mut SketchpadApp, ctx: &egui::Context, rect: Rect, response: &egui::Response) {
    let map = SheetToScreen { origin: rect.min };
    let (pressed, released, moved, pos) = ctx.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.delta() != Vec2::ZERO,
            i.pointer.interact_pos(),
        )
    });
    let Some(pos) = pos else {
        app.pad.pointer_leave();
        return;
    };
    let local = map.logical(pos);

    if response.hovered() {
        let icon = if app.select_mode.is_engaged() {
            app.pad
                .hit_test(local)
                .map_or(CursorIcon::Default, |hit| hit.handle.cursor_icon())
        } else {
            CursorIcon::Crosshair
        };
        ctx.set_cursor_icon(icon);
    }

    if pressed && response.hovered() {
        app.pad.pointer_down(local);
    } else if moved {
        if !rect.contains(pos) {
            app.pad.pointer_leave();
        }
        if app.pad.pointer_move(local) {
            ctx.request_repaint();
        }
    }
    if released {
        if let Some(saved) = app.pad.pointer_up(local) {
            log::debug!("Committed sheet {saved}");
        }
    }
}

fn handle_drop(app: &mut SketchpadApp, rect: Rect, response: &egui::Response) {
    let Some(payload) = response.dnd_release_payload::<DragPayload>() else {
        return;
    };
    let Some(pos) = response.interact_pointer_pos().or(response.hover_pos()) else {
        return;
    };
    let local = SheetToScreen { origin: rect.min }.logical(pos);
    app.pad.drop_sticker(&payload, local, time::now_millis());
}
