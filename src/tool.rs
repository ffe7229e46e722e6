use serde::{Deserialize, Serialize};

use crate::config::{InkConfig, Rgba};

/// The active input mode. Exactly one is active at a time and it decides which
/// engine receives pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
    Select,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Pen, Tool::Eraser, Tool::Select];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Pen => "✏ Pen",
            Tool::Eraser => "⌫ Eraser",
            Tool::Select => "⬉ Select",
        }
    }

    /// Snapshot of the brush this tool strokes with, or `None` for `Select`
    /// (the ink engine is disabled in selection mode).
    pub fn brush(self, color: ActiveColor, ink: &InkConfig) -> Option<InkBrush> {
        match self {
            Tool::Pen => Some(InkBrush::Pen {
                color: color.rgba(),
                width: ink.pen_width,
            }),
            Tool::Eraser => Some(InkBrush::Eraser {
                width: ink.eraser_width,
            }),
            Tool::Select => None,
        }
    }
}

/// The fixed theme palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Swatch {
    #[default]
    TomatoRed,
    TomatoGreen,
    TomatoBlue,
}

impl Swatch {
    pub const ALL: [Swatch; 3] = [Swatch::TomatoRed, Swatch::TomatoGreen, Swatch::TomatoBlue];

    pub fn name(self) -> &'static str {
        match self {
            Swatch::TomatoRed => "tomato-red",
            Swatch::TomatoGreen => "tomato-green",
            Swatch::TomatoBlue => "tomato-blue",
        }
    }

    /// Resolves the theme token to a concrete colour.
    pub fn resolve(self) -> ActiveColor {
        let rgba = match self {
            Swatch::TomatoRed => Rgba::rgb(0xe5, 0x48, 0x3a),
            Swatch::TomatoGreen => Rgba::rgb(0x4f, 0x9a, 0x5b),
            Swatch::TomatoBlue => Rgba::rgb(0x3b, 0x6e, 0xc4),
        };
        ActiveColor { swatch: self, rgba }
    }
}

/// The current ink colour, resolved once from a [`Swatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveColor {
    swatch: Swatch,
    rgba: Rgba,
}

impl ActiveColor {
    pub fn swatch(&self) -> Swatch {
        self.swatch
    }

    pub fn rgba(&self) -> Rgba {
        self.rgba
    }
}

impl Default for ActiveColor {
    fn default() -> Self {
        Swatch::default().resolve()
    }
}

/// Immutable per-segment brush snapshot handed to the ink engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InkBrush {
    /// Composites normally with the colour.
    Pen { color: Rgba, width: f32 },
    /// Removes existing ink regardless of colour.
    Eraser { width: f32 },
}

impl InkBrush {
    pub fn width(&self) -> f32 {
        match self {
            InkBrush::Pen { width, .. } | InkBrush::Eraser { width } => *width,
        }
    }

    pub(crate) fn paint(&self) -> tiny_skia::Paint<'static> {
        let mut paint = tiny_skia::Paint::default();
        paint.anti_alias = true;
        match self {
            InkBrush::Pen { color, .. } => {
                paint.set_color(color.to_skia());
                paint.blend_mode = tiny_skia::BlendMode::SourceOver;
            }
            InkBrush::Eraser { .. } => {
                paint.set_color(tiny_skia::Color::BLACK);
                paint.blend_mode = tiny_skia::BlendMode::DestinationOut;
            }
        }
        paint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_has_no_brush() {
        let ink = InkConfig::default();
        assert!(Tool::Select.brush(ActiveColor::default(), &ink).is_none());
    }

    #[test]
    fn test_eraser_is_wider_than_pen() {
        let ink = InkConfig::default();
        let color = Swatch::TomatoBlue.resolve();
        let pen = Tool::Pen.brush(color, &ink).unwrap();
        let eraser = Tool::Eraser.brush(color, &ink).unwrap();
        assert!(eraser.width() > pen.width());
        assert_eq!(pen, InkBrush::Pen { color: color.rgba(), width: 4.0 });
    }

    #[test]
    fn test_first_swatch_is_default_color() {
        assert_eq!(ActiveColor::default().swatch(), Swatch::TomatoRed);
    }
}
