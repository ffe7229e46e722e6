use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use crate::assets::{AssetResult, AssetSource, spawn_catalog_load};
use crate::config::SketchpadConfig;
use crate::error::SketchResult;
use crate::event::{EventLogger, SelectModeFlag};
use crate::gallery::CompositionId;
use crate::panels;
use crate::runtime;
use crate::send::{HttpSendGateway, SendFlow, SendGateway, SendStep};
use crate::sketchpad::Sketchpad;
use crate::storage::{self, DurableStore};
use crate::textures::TextureCache;
use crate::tool::Swatch;

const TEXTURE_CACHE_SIZE: usize = 96;

/// UI preferences restored between runs.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Default)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct UiPrefs {
    pub stickers_open: bool,
    pub gallery_open: bool,
    pub swatch: Swatch,
}

pub struct SketchpadApp {
    pub(crate) pad: Sketchpad,
    pub(crate) textures: TextureCache,
    pub(crate) prefs: UiPrefs,
    pub(crate) send: SendFlow,
    pub(crate) select_mode: SelectModeFlag,
    /// `ctx` time at which the current commit transition started.
    pub(crate) commit_started: Option<f64>,
    /// Last download result, shown under the toolbar.
    pub(crate) status: Option<String>,
    /// Box the central panel gave the canvas last frame. Overlays anchor to it.
    pub(crate) canvas_rect: Option<egui::Rect>,
    gateway: Arc<dyn SendGateway>,
    assets: Option<mpsc::Receiver<AssetResult>>,
}

impl SketchpadApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = SketchpadConfig::from_env_or_default();
        let prefs: UiPrefs = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let source = asset_source(&config);
        let gateway: Arc<dyn SendGateway> = Arc::new(HttpSendGateway::new(
            absolute_url(&config.send.endpoint),
            Duration::from_secs(config.send.timeout_secs),
        ));
        let mut app = Self::with_parts(config, storage::platform_store(), gateway, prefs);
        app.assets = Some(spawn_catalog_load(source, app.pad.config().stickers.clone()));
        app
    }

    /// Builds the app around explicit collaborators. Sprites are not
    /// requested until a receiver is attached.
    pub fn with_parts(
        config: SketchpadConfig,
        store: Box<dyn DurableStore>,
        gateway: Arc<dyn SendGateway>,
        prefs: UiPrefs,
    ) -> Self {
        let mut pad = Sketchpad::new(config, store);
        pad.set_color(prefs.swatch);
        let select_mode = SelectModeFlag::new();
        pad.events().subscribe(Box::new(EventLogger));
        pad.events().subscribe(select_mode.handler());

        Self {
            pad,
            textures: TextureCache::new(TEXTURE_CACHE_SIZE),
            prefs,
            send: SendFlow::new(),
            select_mode,
            commit_started: None,
            status: None,
            canvas_rect: None,
            gateway,
            assets: None,
        }
    }

    pub fn sketchpad(&self) -> &Sketchpad {
        &self.pad
    }

    pub(crate) fn set_swatch(&mut self, swatch: Swatch) {
        self.prefs.swatch = swatch;
        self.pad.set_color(swatch);
    }

    /// Applies sprite loads that finished since the last frame.
    fn poll_assets(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.assets else {
            return;
        };
        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok((kind, result)) => {
                    self.pad.asset_resolved(kind, result);
                    ctx.request_repaint();
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            log::debug!("All sticker sprites resolved");
            self.assets = None;
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn poll_send(&mut self, ctx: &egui::Context) {
        if !self.send.in_flight() {
            return;
        }
        if self.send.poll(self.pad.gallery_mut()).is_none() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    /// Send button pressed.
    pub(crate) fn request_send(&mut self) {
        match self.send.submit(self.pad.gallery(), self.gateway.as_ref()) {
            Ok(SendStep::Dispatched(task)) => runtime::spawn("send-notes", task),
            Ok(SendStep::EmailRequested) => {}
            Err(err) => log::debug!("Send not started: {err}"),
        }
    }

    /// Flattens the current sheet and hands it over as `note.png`.
    pub fn export_current(&self) -> SketchResult<String> {
        let download = self.pad.download_current()?;
        let location = download.deliver()?;
        Ok(location)
    }

    /// Hands a saved composition over as `note-<id prefix>.png`.
    pub fn export_saved(&self, id: CompositionId) -> SketchResult<Option<String>> {
        match self.pad.download_saved(id) {
            Some(download) => Ok(Some(download.deliver()?)),
            None => Ok(None),
        }
    }

    /// Shows the outcome of an export under the toolbar.
    pub(crate) fn report_export(&mut self, result: SketchResult<Option<String>>) {
        self.status = match result {
            Ok(Some(location)) => Some(format!("Exported {location}")),
            Ok(None) => None,
            Err(err) => {
                log::error!("Export failed: {err}");
                Some(format!("Export failed: {err}"))
            }
        };
    }

    fn show(&mut self, ctx: &egui::Context) {
        panels::toolbar(self, ctx);
        panels::gallery_panel(self, ctx);
        panels::canvas_panel(self, ctx);
        if self.prefs.stickers_open {
            panels::sticker_panel(self, ctx);
        }
        panels::notice_window(self, ctx);
    }
}

impl eframe::App for SketchpadApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.prefs);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.textures.begin_frame();
        self.poll_assets(ctx);
        self.poll_send(ctx);
        self.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.pad.events().clear();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn asset_source(_config: &SketchpadConfig) -> Arc<dyn AssetSource> {
    Arc::new(crate::assets::FileAssetSource::new("."))
}

#[cfg(target_arch = "wasm32")]
fn asset_source(_config: &SketchpadConfig) -> Arc<dyn AssetSource> {
    Arc::new(crate::assets::HttpAssetSource::new(absolute_url("/")))
}

/// Resolves a site-relative path against the page origin in the browser.
#[cfg(target_arch = "wasm32")]
fn absolute_url(path: &str) -> String {
    if path.contains("://") {
        return path.to_owned();
    }
    match web_sys::window().and_then(|w| w.location().origin().ok()) {
        Some(origin) => format!("{}/{}", origin.trim_end_matches('/'), path.trim_start_matches('/')),
        None => path.to_owned(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn absolute_url(path: &str) -> String {
    if !path.contains("://") {
        log::warn!("Send endpoint {path} is relative; sends will fail outside a browser");
    }
    path.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SketchError;
    use crate::export::ExportError;
    use crate::runtime::TaskFuture;
    use crate::send::{SendError, SendRequest};
    use crate::storage::MemoryStore;
    use egui::{Pos2, Rect, pos2, vec2};

    struct NoSend;

    impl SendGateway for NoSend {
        fn send(&self, _request: SendRequest) -> TaskFuture<Result<(), SendError>> {
            runtime::boxed(async { Err(SendError::Transport("offline".to_owned())) })
        }
    }

    fn app() -> SketchpadApp {
        SketchpadApp::with_parts(
            SketchpadConfig::default(),
            Box::new(MemoryStore::new()),
            Arc::new(NoSend),
            UiPrefs::default(),
        )
    }

    fn run_frame(app: &mut SketchpadApp, ctx: &egui::Context) {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, vec2(780.0, 720.0))),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| app.show(ctx));
    }

    #[test]
    fn test_opening_sticker_panel_keeps_sheet_and_ink() {
        let ctx = egui::Context::default();
        let mut app = app();
        run_frame(&mut app, &ctx);
        let layout = app.pad.layout().expect("canvas sized on first frame");

        assert!(app.pad.pointer_down(pos2(20.0, 20.0)));
        app.pad.pointer_move(pos2(90.0, 60.0));
        app.pad.pointer_up(pos2(90.0, 60.0));
        assert!(!app.pad.ink().surface().unwrap().is_blank());

        app.prefs.stickers_open = true;
        run_frame(&mut app, &ctx);
        run_frame(&mut app, &ctx);

        assert_eq!(app.pad.layout(), Some(layout));
        assert!(!app.pad.ink().surface().unwrap().is_blank());
    }

    #[test]
    fn test_export_before_sizing_reports_missing_surface() {
        let mut app = app();
        let result = app.export_current();
        assert!(matches!(result, Err(SketchError::Export(ExportError::NoSurface))));

        app.report_export(result.map(Some));
        assert!(app.status.as_deref().is_some_and(|s| s.starts_with("Export failed")));
    }
}
