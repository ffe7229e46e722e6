use egui::{Color32, Response, Sense, Stroke, Ui, vec2};

use crate::tool::{Swatch, Tool};

const SELECTED_FILL: Color32 = Color32::from_rgb(100, 181, 246);
const SELECTED_STROKE: Color32 = Color32::from_rgb(33, 150, 243);

/// Toolbar button for one [`Tool`].
pub struct ToolButton {
    pub tool: Tool,
    pub selected: bool,
}

impl ToolButton {
    pub fn new(tool: Tool, selected: bool) -> Self {
        Self { tool, selected }
    }

    pub fn show(&self, ui: &mut Ui) -> Response {
        let galley = ui.painter().layout_no_wrap(
            self.tool.label().to_owned(),
            egui::FontId::proportional(15.0),
            Color32::PLACEHOLDER,
        );
        let size = galley.size() + vec2(16.0, 10.0);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected {
                SELECTED_FILL
            } else if response.hovered() {
                Color32::from_gray(60)
            } else {
                Color32::from_gray(40)
            };
            ui.painter().rect_filled(rect, 4.0, bg_color);

            let text_color = if self.selected {
                Color32::BLACK
            } else {
                Color32::WHITE
            };
            let text_pos = rect.center() - galley.size() / 2.0;
            ui.painter().galley(text_pos, galley, text_color);

            if self.selected {
                ui.painter()
                    .rect_stroke(rect, 4.0, Stroke::new(2.0, SELECTED_STROKE));
            }
        }

        response.on_hover_text(self.tool.label())
    }
}

/// Round colour chip for one palette [`Swatch`].
pub struct SwatchButton {
    pub swatch: Swatch,
    pub selected: bool,
}

impl SwatchButton {
    pub fn new(swatch: Swatch, selected: bool) -> Self {
        Self { swatch, selected }
    }

    pub fn show(&self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(vec2(22.0, 22.0), Sense::click());
        if ui.is_rect_visible(rect) {
            let radius = if self.selected { 11.0 } else { 9.0 };
            let fill = self.swatch.resolve().rgba().to_egui();
            ui.painter().circle_filled(rect.center(), radius, fill);
            let border = if self.selected {
                Color32::WHITE
            } else {
                Color32::from_white_alpha(100)
            };
            ui.painter()
                .circle_stroke(rect.center(), radius, Stroke::new(2.0, border));
        }
        response.on_hover_text(format!("color-{}", self.swatch.name()))
    }
}
