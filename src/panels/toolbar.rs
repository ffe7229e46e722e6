use crate::SketchpadApp;
use crate::components::{SwatchButton, ToolButton};
use crate::tool::{Swatch, Tool};

pub fn toolbar(app: &mut SketchpadApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let active = app.pad.tool();
            for tool in Tool::ALL {
                if ToolButton::new(tool, tool == active).show(ui).clicked() {
                    log::info!("Tool selected from UI: {}", tool.label());
                    app.pad.set_tool(tool);
                }
            }

            ui.separator();

            let current = app.pad.color().swatch();
            for swatch in Swatch::ALL {
                if SwatchButton::new(swatch, swatch == current).show(ui).clicked() {
                    app.set_swatch(swatch);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("⬇ Export").on_hover_text("Export as PNG").clicked() {
                    let result = app.export_current().map(Some);
                    app.report_export(result);
                }
                ui.toggle_value(&mut app.prefs.stickers_open, "Stickers");
                ui.toggle_value(&mut app.prefs.gallery_open, "Gallery");
            });
        });

        if let Some(status) = &app.status {
            ui.small(status);
        }
    });
}
