use egui::{Color32, Sense, Stroke, vec2};

use crate::SketchpadApp;
use crate::gallery::CompositionId;
use crate::send::Notice;
use crate::textures::{TextureSlot, data_url_to_image};

const THUMB_WIDTH: f32 = 150.0;
const SELECTED_RING: Color32 = Color32::from_rgb(59, 110, 196);

enum ItemAction {
    Toggle,
    Deselect,
    Export,
    Delete,
}

/// Saved compositions plus the batch-send controls.
pub fn gallery_panel(app: &mut SketchpadApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("gallery_panel")
        .resizable(app.prefs.gallery_open)
        .show(ctx, |ui| {
            send_row(app, ui);
            if !app.prefs.gallery_open {
                return;
            }
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                if app.pad.gallery().is_empty() {
                    ui.vertical_centered(|ui| {
                        ui.weak("No saved notes yet.");
                    });
                    return;
                }
                let mut actions = Vec::new();
                ui.horizontal_wrapped(|ui| {
                    let ids: Vec<CompositionId> =
                        app.pad.gallery().items().iter().map(|item| item.id()).collect();
                    for id in ids {
                        if let Some(action) = gallery_item(app, ctx, ui, id) {
                            actions.push((id, action));
                        }
                    }
                });
                for (id, action) in actions {
                    apply(app, id, action);
                }
            });
        });
}

fn send_row(app: &mut SketchpadApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        let label = format!("Gallery ({})", app.pad.gallery().len());
        ui.toggle_value(&mut app.prefs.gallery_open, label);

        if app.send.is_entering_email() {
            ui.add(
                egui::TextEdit::singleline(&mut app.send.email)
                    .hint_text("Your email")
                    .desired_width(200.0),
            );
        }
        let button = egui::Button::new(app.send.button_label());
        let hint = if app.send.is_entering_email() {
            "Send selected notes"
        } else {
            "Select notes then click to send"
        };
        if ui
            .add_enabled(!app.send.in_flight(), button)
            .on_hover_text(hint)
            .clicked()
        {
            app.request_send();
        }
        let selected = app.pad.gallery().selection().len();
        if selected > 0 {
            ui.weak(format!("{selected} selected"));
        }
    });
}

fn gallery_item(
    app: &mut SketchpadApp,
    ctx: &egui::Context,
    ui: &mut egui::Ui,
    id: CompositionId,
) -> Option<ItemAction> {
    let item = app.pad.gallery().get(id)?;
    let selected = app.pad.gallery().is_selected(id);
    let mut action = None;

    let stroke = if selected {
        Stroke::new(2.0, SELECTED_RING)
    } else {
        Stroke::new(1.0, ui.visuals().weak_text_color())
    };
    egui::Frame::group(ui.style()).stroke(stroke).show(ui, |ui| {
        ui.set_width(THUMB_WIDTH);
        ui.vertical(|ui| {
            let texture = app.textures.get_or_create(ctx, TextureSlot::Gallery(id), 0, || {
                data_url_to_image(item.data_url())
            });
            let response = match texture {
                Ok(texture) => {
                    let size = ctx
                        .tex_manager()
                        .read()
                        .meta(texture)
                        .map_or(vec2(5.0, 3.0), |meta| vec2(meta.size[0] as f32, meta.size[1] as f32));
                    let shown = size * (THUMB_WIDTH / size.x.max(1.0));
                    ui.add(egui::Image::from_texture((texture, shown)).sense(Sense::click()))
                }
                Err(err) => {
                    log::warn!("Thumbnail for {id} failed: {err}");
                    ui.add(egui::Label::new("(unreadable)").sense(Sense::click()))
                }
            };
            if response.double_clicked() {
                action = Some(ItemAction::Deselect);
            } else if response.clicked() {
                action = Some(ItemAction::Toggle);
            }

            ui.small(if selected { "Selected" } else { "Click to select" });
            ui.horizontal(|ui| {
                if ui.small_button("⬇ Export").on_hover_text("Export PNG").clicked() {
                    action = Some(ItemAction::Export);
                }
                if ui.small_button("🗑 Delete").on_hover_text("Delete").clicked() {
                    action = Some(ItemAction::Delete);
                }
            });
        });
    });
    action
}

fn apply(app: &mut SketchpadApp, id: CompositionId, action: ItemAction) {
    match action {
        ItemAction::Toggle => {
            app.pad.gallery_mut().toggle_select(id);
        }
        ItemAction::Deselect => {
            if app.pad.gallery().is_selected(id) {
                app.pad.gallery_mut().toggle_select(id);
            }
        }
        ItemAction::Export => {
            let result = app.export_saved(id);
            app.report_export(result);
        }
        ItemAction::Delete => {
            if app.pad.delete_saved(id) {
                app.textures.invalidate(TextureSlot::Gallery(id));
            }
        }
    }
}

/// Blocking notice for send outcomes.
pub fn notice_window(app: &mut SketchpadApp, ctx: &egui::Context) {
    let Some(notice) = app.send.notice().cloned() else {
        return;
    };
    let (title, text) = match &notice {
        Notice::Info(text) => ("Notes", text),
        Notice::Error(text) => ("Could not send", text),
    };
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label(text.as_str());
            if ui.button("OK").clicked() {
                app.send.dismiss_notice();
            }
        });
}
