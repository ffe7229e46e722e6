//! The sketchpad coordinator.
//!
//! Owns every engine for one widget instance and routes pointer input to the
//! engine the active tool selects. All state changes of interest to the rest
//! of the page are published on the [`EventBus`].

use egui::{Pos2, Rect, Vec2};

use crate::assets::{AssetError, AssetEvent, AssetRegistry, Sprite};
use crate::background;
use crate::config::SketchpadConfig;
use crate::download::{self, Download};
use crate::event::{EventBus, SketchEvent};
use crate::export::{self, ExportError, PngDataUrl};
use crate::gallery::{CompositionId, GalleryStore};
use crate::ink::InkEngine;
use crate::sticker::{
    DragPayload, StickerEngine, StickerHandle, StickerHit, StickerId, StickerKind,
};
use crate::storage::DurableStore;
use crate::surface::{Surface, SurfaceLayout, SurfaceSizer};
use crate::tool::{ActiveColor, Swatch, Tool};

/// Lifecycle of the current sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetState {
    #[default]
    Editing,
    /// Flattened and saved; waiting for the removal transition to finish.
    /// `saved` is `None` when the export failed.
    Committing { saved: Option<CompositionId> },
}

/// What the current press engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Press {
    Ink,
    Sticker,
    /// Select-mode press on bare sheet: a commit candidate.
    Sheet,
}

pub struct Sketchpad {
    config: SketchpadConfig,
    sizer: SurfaceSizer,
    background: Option<Surface>,
    background_version: u64,
    ink: InkEngine,
    stickers: StickerEngine,
    assets: AssetRegistry,
    tool: Tool,
    color: ActiveColor,
    sheet: SheetState,
    press: Option<Press>,
    last_drop_ms: Option<f64>,
    events: EventBus,
    gallery: GalleryStore,
}

impl std::fmt::Debug for Sketchpad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sketchpad")
            .field("layout", &self.layout())
            .field("tool", &self.tool)
            .field("color", &self.color)
            .field("sheet", &self.sheet)
            .field("stickers", &self.stickers.len())
            .field("gallery", &self.gallery)
            .finish_non_exhaustive()
    }
}

impl Sketchpad {
    pub fn new(config: SketchpadConfig, store: Box<dyn DurableStore>) -> Self {
        let gallery = GalleryStore::load(store, config.gallery.clone());
        Self {
            sizer: SurfaceSizer::new(config.surface.clone()),
            stickers: StickerEngine::new(config.stickers.clone()),
            config,
            background: None,
            background_version: 0,
            ink: InkEngine::new(),
            assets: AssetRegistry::new(),
            tool: Tool::default(),
            color: ActiveColor::default(),
            sheet: SheetState::Editing,
            press: None,
            last_drop_ms: None,
            events: EventBus::new(),
            gallery,
        }
    }

    pub fn config(&self) -> &SketchpadConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn layout(&self) -> Option<SurfaceLayout> {
        self.background.as_ref().map(|bg| *bg.layout())
    }

    pub fn background(&self) -> Option<&Surface> {
        self.background.as_ref()
    }

    /// Bumped whenever the background is repainted.
    pub fn background_version(&self) -> u64 {
        self.background_version
    }

    pub fn ink(&self) -> &InkEngine {
        &self.ink
    }

    pub fn stickers(&self) -> &StickerEngine {
        &self.stickers
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn gallery(&self) -> &GalleryStore {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut GalleryStore {
        &mut self.gallery
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> ActiveColor {
        self.color
    }

    pub fn sheet(&self) -> SheetState {
        self.sheet
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.sheet, SheetState::Committing { .. })
    }

    /// Re-runs surface sizing for a new container box.
    ///
    /// A zero-size container leaves everything untouched. Otherwise the
    /// background is repainted and the ink surface is reallocated (and
    /// therefore cleared) whenever the layout changes.
    pub fn resize(&mut self, container: Vec2, pixels_per_point: f32) -> bool {
        let Some(layout) = self.sizer.layout(container, pixels_per_point) else {
            return false;
        };
        if self.layout() == Some(layout) {
            return false;
        }
        let Some(mut surface) = Surface::new(layout) else {
            log::warn!("Could not allocate a {:?} surface", layout.backing_size());
            return false;
        };
        background::render_into(&mut surface, &self.config.paper);
        log::debug!(
            "Surface resized to {:?} (backing {:?})",
            layout.logical_size(),
            layout.backing_size()
        );
        self.background = Some(surface);
        self.background_version += 1;
        self.ink.resize(layout);
        true
    }

    fn sheet_rect(&self) -> Option<Rect> {
        self.layout()
            .map(|layout| Rect::from_min_size(Pos2::ZERO, layout.logical_size()))
    }

    fn selected_sticker(&self) -> Option<StickerId> {
        self.stickers.selected().map(|s| s.id())
    }

    /// Publishes a selection change if the selected sticker differs from
    /// `before`.
    fn notify_selection(&self, before: Option<StickerId>) {
        let selected = self.selected_sticker();
        if selected != before {
            self.events.emit(SketchEvent::SelectionChanged { selected });
        }
    }

    /// Switching to pen or eraser clears the sticker selection.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        let old = self.tool;
        self.tool = tool;
        self.ink.end();
        if tool != Tool::Select {
            let before = self.selected_sticker();
            self.stickers.clear_selection();
            self.notify_selection(before);
        }
        log::debug!("Tool {} -> {}", old.label(), tool.label());
        self.events.emit(SketchEvent::ToolChanged { old, new: tool });
    }

    /// Takes effect from the next stroke segment.
    pub fn set_color(&mut self, swatch: Swatch) {
        self.color = swatch.resolve();
    }

    pub fn natural_size(&self, kind: StickerKind) -> Option<Vec2> {
        self.assets.natural_size(kind)
    }

    pub fn hit_test(&self, pos: Pos2) -> Option<StickerHit> {
        self.stickers.hit_test(pos, |kind| self.assets.natural_size(kind))
    }

    /// Pointer pressed at `pos` (logical units). Returns whether the press
    /// was taken by an engine.
    pub fn pointer_down(&mut self, pos: Pos2) -> bool {
        if self.is_committing() || self.press.is_some() {
            return false;
        }
        let before = self.selected_sticker();
        let press = match self.tool {
            Tool::Pen | Tool::Eraser => {
                self.stickers.clear_selection();
                self.ink.begin(pos).then_some(Press::Ink)
            }
            Tool::Select => match self.hit_test(pos) {
                Some(StickerHit { id, handle }) => {
                    match handle {
                        StickerHandle::Body => self.stickers.begin_drag(id, pos),
                        StickerHandle::Rotate => self.stickers.begin_rotate(id, pos),
                        StickerHandle::Resize => self.stickers.begin_resize(id, pos),
                        StickerHandle::Delete => {
                            log::debug!("Deleting sticker {id}");
                            self.stickers.delete(id)
                        }
                    };
                    Some(Press::Sticker)
                }
                None => Some(Press::Sheet),
            },
        };
        self.notify_selection(before);
        self.press = press;
        press.is_some()
    }

    /// Pointer moved to `pos`. The brush is snapshotted here, per segment.
    pub fn pointer_move(&mut self, pos: Pos2) -> bool {
        if self.is_committing() {
            return false;
        }
        match self.press {
            Some(Press::Sticker) => self.stickers.update_gesture(pos),
            Some(Press::Ink) => match self.tool.brush(self.color, &self.config.ink) {
                Some(brush) => self.ink.extend(pos, brush),
                None => false,
            },
            Some(Press::Sheet) | None => false,
        }
    }

    /// Pointer released at `pos`. Returns the saved composition when the
    /// release completed a commit tap.
    ///
    /// A release that ends a sticker drag, rotate or resize never commits.
    pub fn pointer_up(&mut self, pos: Pos2) -> Option<CompositionId> {
        match self.press.take()? {
            Press::Ink => {
                self.ink.end();
                None
            }
            Press::Sticker => {
                if let Some(gesture) = self.stickers.end_gesture() {
                    log::trace!("Gesture finished: {gesture:?}");
                }
                None
            }
            Press::Sheet => {
                let on_sheet = self.sheet_rect().is_some_and(|rect| rect.contains(pos));
                if on_sheet && self.tool == Tool::Select {
                    self.commit()
                } else {
                    None
                }
            }
        }
    }

    /// Pointer left the surface: closes any stroke and forgets a pending
    /// commit tap. Sticker gestures carry on until release.
    pub fn pointer_leave(&mut self) {
        match self.press {
            Some(Press::Ink) => {
                self.ink.end();
                self.press = None;
            }
            Some(Press::Sheet) => self.press = None,
            Some(Press::Sticker) | None => {}
        }
    }

    /// Places a sticker from a drag payload. Drops arriving within the
    /// debounce window of the previous one are ignored.
    pub fn drop_sticker(&mut self, payload: &DragPayload, pos: Pos2, now_ms: f64) -> Option<StickerId> {
        if self.is_committing() {
            return None;
        }
        if let Some(last) = self.last_drop_ms {
            if now_ms - last < self.config.stickers.drop_debounce_ms {
                log::debug!("Ignoring duplicate drop");
                return None;
            }
        }
        self.last_drop_ms = Some(now_ms);
        let Some(kind) = payload.kind() else {
            log::warn!("Ignoring drop with unknown sticker key {:?}", payload.key());
            return None;
        };
        let before = self.selected_sticker();
        let id = self.stickers.add(kind, pos, self.assets.natural_size(kind));
        self.notify_selection(before);
        Some(id)
    }

    /// Adds a sticker at the centre of the sheet with the fixed quick-add
    /// scale.
    pub fn quick_add(&mut self, kind: StickerKind) -> Option<StickerId> {
        if self.is_committing() {
            return None;
        }
        let center = self.sheet_rect()?.center();
        let before = self.selected_sticker();
        let id = self
            .stickers
            .add_scaled(kind, center, self.config.stickers.quick_add_scale);
        self.notify_selection(before);
        Some(id)
    }

    /// Records the outcome of a sprite load and refits stickers that were
    /// placed before its size was known.
    pub fn asset_resolved(&mut self, kind: StickerKind, result: Result<Sprite, AssetError>) {
        match self.assets.complete(kind, result) {
            Some(AssetEvent::Loaded { kind, natural_size }) => {
                let refit = self.stickers.on_asset_loaded(kind, natural_size);
                if refit > 0 {
                    log::debug!("Refit {refit} {kind} sticker(s)");
                }
                self.events
                    .emit(SketchEvent::AssetLoaded { kind, natural_size });
            }
            Some(AssetEvent::Failed { .. }) | None => {}
        }
    }

    /// Flattens the current sheet.
    pub fn export_current(&self) -> Result<PngDataUrl, ExportError> {
        let ink = self.ink.surface().ok_or(ExportError::NoSurface)?;
        let pixmap = export::compose(
            ink,
            self.stickers.stickers(),
            &self.assets,
            &self.config.paper,
        )?;
        export::encode_data_url(&pixmap)
    }

    /// The current sheet as a `note.png` download.
    pub fn download_current(&self) -> Result<Download, ExportError> {
        Ok(Download::new(download::CURRENT_FILENAME, self.export_current()?))
    }

    /// Saves the flattened sheet to the gallery and enters
    /// [`SheetState::Committing`]. Input is ignored until
    /// [`Self::finish_commit`].
    pub fn commit(&mut self) -> Option<CompositionId> {
        if self.is_committing() {
            return None;
        }
        self.ink.end();
        self.stickers.end_gesture();
        self.press = None;

        let saved = match self.export_current() {
            Ok(data_url) => {
                let id = self.gallery.save(data_url);
                log::info!("Sheet saved as {id}");
                self.events.emit(SketchEvent::GalleryChanged {
                    len: self.gallery.len(),
                });
                self.events.emit(SketchEvent::SheetCommitted { saved: id });
                Some(id)
            }
            Err(err) => {
                log::warn!("Sheet not saved: {err}");
                None
            }
        };
        self.sheet = SheetState::Committing { saved };
        saved
    }

    /// Ends the commit transition: clears ink and stickers for a new sheet.
    pub fn finish_commit(&mut self) {
        if !self.is_committing() {
            return;
        }
        let before = self.selected_sticker();
        self.ink.clear();
        self.stickers.clear();
        self.sheet = SheetState::Editing;
        self.notify_selection(before);
        self.events.emit(SketchEvent::SheetReset);
    }

    pub fn delete_saved(&mut self, id: CompositionId) -> bool {
        let removed = self.gallery.delete(id);
        if removed {
            self.events.emit(SketchEvent::GalleryChanged {
                len: self.gallery.len(),
            });
        }
        removed
    }

    /// A saved composition as a `note-<id prefix>.png` download.
    pub fn download_saved(&self, id: CompositionId) -> Option<Download> {
        let item = self.gallery.get(id)?;
        Some(Download::new(item.export_filename(), item.data_url().clone()))
    }
}
