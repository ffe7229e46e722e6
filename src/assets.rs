//! Sprite asset registry.
//!
//! Each catalog sprite is `Pending` until its load resolves, then either
//! `Loaded` or `Failed`. Resolution is reported once as an [`AssetEvent`] so the
//! sticker engine can refit instances that were dropped before the sprite's
//! natural size was known.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;

use egui::Vec2;
use thiserror::Error;
use tiny_skia::{IntSize, Pixmap};

use crate::config::StickerConfig;
use crate::runtime::{self, TaskFuture};
use crate::sticker::{StickerKind, resolve_asset};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },

    #[error("Failed to decode sprite: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid sprite dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("Placeholder failed after {primary}: {placeholder}")]
    PlaceholderFailed {
        primary: Box<AssetError>,
        placeholder: Box<AssetError>,
    },
}

/// A decoded sprite, stored premultiplied for compositing.
#[derive(Clone)]
pub struct Sprite {
    pixmap: Arc<Pixmap>,
    placeholder: bool,
}

impl std::fmt::Debug for Sprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sprite")
            .field("size", &self.natural_size())
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

impl Sprite {
    /// Builds a sprite from straight-alpha RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self, AssetError> {
        let size = IntSize::from_wh(width, height)
            .ok_or(AssetError::InvalidDimensions(width, height))?;
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return Err(AssetError::InvalidDimensions(width, height));
        }
        let mut data = Vec::with_capacity(rgba.len());
        for px in rgba.chunks_exact(4) {
            let a = px[3] as u16;
            data.extend_from_slice(&[
                ((px[0] as u16 * a + 127) / 255) as u8,
                ((px[1] as u16 * a + 127) / 255) as u8,
                ((px[2] as u16 * a + 127) / 255) as u8,
                px[3],
            ]);
        }
        let pixmap =
            Pixmap::from_vec(data, size).ok_or(AssetError::InvalidDimensions(width, height))?;
        Ok(Self {
            pixmap: Arc::new(pixmap),
            placeholder: false,
        })
    }

    /// Decodes an encoded image (PNG, JPEG, ...).
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_rgba8(rgba.width(), rgba.height(), rgba.as_raw())
    }

    pub fn natural_size(&self) -> Vec2 {
        Vec2::new(self.pixmap.width() as f32, self.pixmap.height() as f32)
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    fn into_placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }
}

/// Load status of one catalog sprite.
#[derive(Debug, Clone)]
pub enum AssetState {
    Pending,
    Loaded(Sprite),
    Failed,
}

/// Published once per sprite when its load resolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssetEvent {
    Loaded { kind: StickerKind, natural_size: Vec2 },
    Failed { kind: StickerKind },
}

#[derive(Debug)]
pub struct AssetRegistry {
    states: HashMap<StickerKind, AssetState>,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    /// Every catalog sprite starts out requested.
    pub fn new() -> Self {
        Self {
            states: StickerKind::ALL
                .into_iter()
                .map(|kind| (kind, AssetState::Pending))
                .collect(),
        }
    }

    pub fn get(&self, kind: StickerKind) -> &AssetState {
        static PENDING: AssetState = AssetState::Pending;
        self.states.get(&kind).unwrap_or(&PENDING)
    }

    pub fn sprite(&self, kind: StickerKind) -> Option<&Sprite> {
        match self.get(kind) {
            AssetState::Loaded(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn natural_size(&self, kind: StickerKind) -> Option<Vec2> {
        self.sprite(kind).map(Sprite::natural_size)
    }

    /// Resolves a pending sprite. Already-resolved entries are left alone:
    /// there is no retry.
    pub fn complete(
        &mut self,
        kind: StickerKind,
        result: Result<Sprite, AssetError>,
    ) -> Option<AssetEvent> {
        if !matches!(self.get(kind), AssetState::Pending) {
            log::debug!("Ignoring late asset result for {kind}");
            return None;
        }
        let (state, event) = match result {
            Ok(sprite) => {
                let natural_size = sprite.natural_size();
                log::debug!("Sprite {kind} loaded: {natural_size:?}");
                (
                    AssetState::Loaded(sprite),
                    AssetEvent::Loaded { kind, natural_size },
                )
            }
            Err(err) => {
                log::warn!("Sticker failed to load: {kind}: {err}");
                (AssetState::Failed, AssetEvent::Failed { kind })
            }
        };
        self.states.insert(kind, state);
        Some(event)
    }
}

/// Where sprite bytes come from.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, path: &str) -> TaskFuture<Result<Vec<u8>, AssetError>>;
}

/// Reads sprites from a directory on disk.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FileAssetSource {
    fn fetch(&self, path: &str) -> TaskFuture<Result<Vec<u8>, AssetError>> {
        let full = self.root.join(path.trim_start_matches('/'));
        let path = path.to_owned();
        runtime::boxed(async move {
            std::fs::read(&full).map_err(|err| AssetError::Fetch {
                path,
                reason: err.to_string(),
            })
        })
    }
}

/// Fetches sprites over HTTP (relative paths resolve against `base_url`).
#[derive(Debug, Clone)]
pub struct HttpAssetSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAssetSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl AssetSource for HttpAssetSource {
    fn fetch(&self, path: &str) -> TaskFuture<Result<Vec<u8>, AssetError>> {
        let client = self.client.clone();
        let url = resolve_asset(&self.base_url, path);
        runtime::boxed(async move {
            let fail = |reason: String| AssetError::Fetch {
                path: url.clone(),
                reason,
            };
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|err| fail(err.to_string()))?;
            if !response.status().is_success() {
                return Err(fail(format!("HTTP {}", response.status())));
            }
            let bytes = response.bytes().await.map_err(|err| fail(err.to_string()))?;
            Ok(bytes.to_vec())
        })
    }
}

/// Loads one sprite, falling back to the placeholder asset exactly once.
pub async fn load_sprite(
    kind: StickerKind,
    source: &dyn AssetSource,
    config: &StickerConfig,
) -> Result<Sprite, AssetError> {
    let primary = match source.fetch(&kind.resolve(&config.asset_base)).await {
        Ok(bytes) => Sprite::decode(&bytes),
        Err(err) => Err(err),
    };
    let primary = match primary {
        Ok(sprite) => return Ok(sprite),
        Err(err) => err,
    };

    log::warn!("Sticker {kind} failed, using placeholder: {primary}");
    let placeholder_path = resolve_asset(&config.asset_base, &config.placeholder_asset);
    let placeholder = match source.fetch(&placeholder_path).await {
        Ok(bytes) => Sprite::decode(&bytes),
        Err(err) => Err(err),
    };
    placeholder
        .map(Sprite::into_placeholder)
        .map_err(|placeholder| AssetError::PlaceholderFailed {
            primary: Box::new(primary),
            placeholder: Box::new(placeholder),
        })
}

pub type AssetResult = (StickerKind, Result<Sprite, AssetError>);

/// Starts loading every catalog sprite; results arrive on the returned channel.
pub fn spawn_catalog_load(
    source: Arc<dyn AssetSource>,
    config: StickerConfig,
) -> mpsc::Receiver<AssetResult> {
    let (tx, rx) = mpsc::channel();
    runtime::spawn(
        "sticker-assets",
        runtime::boxed(async move {
            for kind in StickerKind::ALL {
                let result = load_sprite(kind, source.as_ref(), &config).await;
                if tx.send((kind, result)).is_err() {
                    break;
                }
            }
        }),
    );
    rx
}
