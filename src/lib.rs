#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod assets;
pub mod background;
mod components;
pub mod config;
pub mod download;
pub mod error;
pub mod event;
pub mod export;
pub mod gallery;
pub mod ink;
mod panels;
pub mod relay;
pub mod runtime;
pub mod send;
pub mod sketchpad;
pub mod sticker;
pub mod storage;
pub mod surface;
pub mod textures;
pub mod tool;
pub mod util;
mod widgets;

pub use app::{SketchpadApp, UiPrefs};
pub use config::SketchpadConfig;
pub use error::{SketchError, SketchResult};
pub use event::{EventBus, EventHandler, SketchEvent};
pub use sketchpad::{SheetState, Sketchpad};
pub use tool::{Swatch, Tool};
