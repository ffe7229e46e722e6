//! Composition exporter: flattens paper + ink + stickers into one raster at
//! logical resolution and encodes it as a self-contained PNG data URL.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::assets::AssetRegistry;
use crate::background;
use crate::config::PaperConfig;
use crate::sticker::StickerInstance;
use crate::surface::Surface;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: the drawing surface has no size yet")]
    NoSurface,

    #[error("Failed to allocate a {0}x{1} export raster")]
    Allocation(u32, u32),

    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum DataUrlError {
    #[error("Not a PNG data URL")]
    NotPng,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A `data:image/png;base64,...` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PngDataUrl(String);

impl PngDataUrl {
    pub fn from_png_bytes(png: &[u8]) -> Self {
        Self(format!("{PNG_DATA_URL_PREFIX}{}", BASE64.encode(png)))
    }

    /// Accepts only strings carrying the PNG data URL prefix.
    pub fn parse(value: impl Into<String>) -> Result<Self, DataUrlError> {
        let value = value.into();
        if is_png_data_url(&value) {
            Ok(Self(value))
        } else {
            Err(DataUrlError::NotPng)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base64 body without the prefix.
    pub fn payload(&self) -> &str {
        self.0.strip_prefix(PNG_DATA_URL_PREFIX).unwrap_or(&self.0)
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        Ok(BASE64.decode(self.payload())?)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PngDataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_png_data_url(value: &str) -> bool {
    value.starts_with(PNG_DATA_URL_PREFIX)
}

/// Paints, in order, the paper, the ink surface and every sticker (topmost
/// last) into a fresh raster of the ink surface's logical size.
///
/// Stickers whose sprite has not loaded are skipped for this pass.
pub fn compose(
    ink: &Surface,
    stickers: &[StickerInstance],
    assets: &AssetRegistry,
    paper: &PaperConfig,
) -> Result<Pixmap, ExportError> {
    let layout = ink.layout();
    let (width, height) = (layout.logical_width(), layout.logical_height());
    let mut out = background::render(width, height, paper)
        .ok_or(ExportError::Allocation(width, height))?;

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..Default::default()
    };
    out.draw_pixmap(
        0,
        0,
        ink.pixmap().as_ref(),
        &paint,
        layout.inverse_transform(),
        None,
    );

    // stored most-recent first; the most recent must end up on top
    for sticker in stickers.iter().rev() {
        let Some(sprite) = assets.sprite(sticker.kind()) else {
            log::debug!("Skipping sticker {} in export: sprite not loaded", sticker.kind());
            continue;
        };
        let natural = sprite.natural_size();
        let transform = Transform::from_translate(sticker.position.x, sticker.position.y)
            .pre_rotate(sticker.rotation)
            .pre_scale(sticker.scale, sticker.scale)
            .pre_translate(-natural.x / 2.0, -natural.y / 2.0);
        out.draw_pixmap(0, 0, sprite.pixmap().as_ref(), &paint, transform, None);
    }

    Ok(out)
}

/// Encodes a premultiplied raster as PNG bytes.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let image = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .ok_or(ExportError::Allocation(pixmap.width(), pixmap.height()))?;
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn encode_data_url(pixmap: &Pixmap) -> Result<PngDataUrl, ExportError> {
    Ok(PngDataUrl::from_png_bytes(&encode_png(pixmap)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Sprite;
    use crate::config::StickerConfig;
    use crate::sticker::{StickerEngine, StickerKind};
    use crate::surface::SurfaceLayout;
    use egui::{pos2, vec2};

    fn blank_ink(scale: f32) -> Surface {
        Surface::new(SurfaceLayout::with_scale(80, 60, scale).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_sheet_equals_background() {
        let paper = PaperConfig::default();
        for scale in [1.0, 2.0] {
            let composed = compose(&blank_ink(scale), &[], &AssetRegistry::new(), &paper).unwrap();
            let bg = background::render(80, 60, &paper).unwrap();
            assert_eq!(composed.width(), 80);
            assert_eq!(composed.data(), bg.data());
        }
    }

    #[test]
    fn test_loaded_sticker_is_painted_and_pending_is_skipped() {
        let paper = PaperConfig::default();
        let mut assets = AssetRegistry::new();
        let red = vec![255, 0, 0, 255].repeat(10 * 10);
        assets.complete(StickerKind::Ghe, Ok(Sprite::from_rgba8(10, 10, &red).unwrap()));

        let mut engine = StickerEngine::new(StickerConfig::default());
        engine.add(StickerKind::Ghe, pos2(40.0, 30.0), Some(vec2(10.0, 10.0)));
        engine.add(StickerKind::Tai, pos2(10.0, 10.0), None);

        let composed = compose(&blank_ink(1.0), engine.stickers(), &assets, &paper).unwrap();
        let center = composed.pixel(40, 30).unwrap();
        assert_eq!((center.red(), center.green()), (255, 0));
        let bg = background::render(80, 60, &paper).unwrap();
        assert_eq!(composed.pixel(10, 10), bg.pixel(10, 10));
    }

    #[test]
    fn test_data_url_round_trip() {
        let paper = PaperConfig::default();
        let pixmap = background::render(16, 16, &paper).unwrap();
        let url = encode_data_url(&pixmap).unwrap();
        assert!(url.as_str().starts_with(PNG_DATA_URL_PREFIX));
        let decoded = image::load_from_memory(&url.decode().unwrap()).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(decoded.get_pixel(0, 0).0, [0xf3, 0xf1, 0xec, 255]);
    }

    #[test]
    fn test_parse_rejects_other_payloads() {
        assert!(PngDataUrl::parse("data:image/jpeg;base64,AAAA").is_err());
        assert!(PngDataUrl::parse("data:image/png;base64,AAAA").is_ok());
    }
}
