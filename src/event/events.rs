use egui::Vec2;

use crate::gallery::CompositionId;
use crate::sticker::{StickerId, StickerKind};
use crate::tool::Tool;

/// Messages published by the sketchpad coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchEvent {
    ToolChanged {
        old: Tool,
        new: Tool,
    },
    /// The selected sticker changed; `None` when nothing is selected.
    SelectionChanged {
        selected: Option<StickerId>,
    },
    AssetLoaded {
        kind: StickerKind,
        natural_size: Vec2,
    },
    SheetCommitted {
        saved: CompositionId,
    },
    /// Ink and stickers were cleared for a new sheet.
    SheetReset,
    GalleryChanged {
        len: usize,
    },
}
