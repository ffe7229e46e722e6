mod sticker_overlay;

pub use sticker_overlay::{SheetToScreen, paint_missing, paint_selection, paint_sprite};
