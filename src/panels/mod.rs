mod canvas;
mod gallery;
mod stickers;
mod toolbar;

pub use canvas::canvas_panel;
pub use gallery::{gallery_panel, notice_window};
pub use stickers::sticker_panel;
pub use toolbar::toolbar;
