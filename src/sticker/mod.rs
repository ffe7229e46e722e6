mod catalog;
mod engine;
mod instance;

pub use catalog::{DragPayload, STICKER_KEY_SLOT, StickerKind, resolve_asset};
pub use engine::{StickerEngine, StickerGesture, StickerHandle, StickerHit, resized_scale};
pub use instance::{StickerId, StickerInstance, fit_scale, rotate};
