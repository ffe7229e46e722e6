use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an optional JSON config file (native only).
pub const CONFIG_ENV_VAR: &str = "SKETCHPAD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// An sRGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        let [r, g, b, a] = self.0;
        tiny_skia::Color::from_rgba8(r, g, b, a)
    }

    pub fn to_egui(self) -> egui::Color32 {
        let [r, g, b, a] = self.0;
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

/// Surface sizing clamps, applied to the container's content box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub container_padding: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub height_ratio: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            container_padding: 32.0,
            max_width: 700.0,
            min_height: 300.0,
            max_height: 480.0,
            height_ratio: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub color: Rgba,
    pub guide_color: Rgba,
    pub guide_width: f32,
    pub guide_gap: f32,
    pub guide_inset: f32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            color: Rgba::rgb(0xf3, 0xf1, 0xec),
            // rgba(37,47,80,0.10)
            guide_color: Rgba([37, 47, 80, 26]),
            guide_width: 1.0,
            guide_gap: 28.0,
            guide_inset: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkConfig {
    pub pen_width: f32,
    pub eraser_width: f32,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            pen_width: 4.0,
            eraser_width: 18.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickerConfig {
    /// Longest on-screen side of a freshly dropped sticker, in logical px.
    pub fit_max: f32,
    /// Scale used while the sprite's natural size is still unknown.
    pub provisional_scale: f32,
    /// Fixed scale for a sticker added from the panel without dragging.
    pub quick_add_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Pointer displacement (logical px) that adds 1.0 to the scale.
    pub resize_divisor: f32,
    pub rotate_handle_offset: f32,
    pub handle_radius: f32,
    pub drop_debounce_ms: f64,
    pub asset_base: String,
    /// Fetched once for a sprite whose own asset fails to load.
    pub placeholder_asset: String,
}

impl Default for StickerConfig {
    fn default() -> Self {
        Self {
            fit_max: 90.0,
            provisional_scale: 0.5,
            quick_add_scale: 0.7,
            min_scale: 0.2,
            max_scale: 3.0,
            resize_divisor: 200.0,
            rotate_handle_offset: 24.0,
            handle_radius: 10.0,
            drop_debounce_ms: 250.0,
            asset_base: "assets/".to_owned(),
            placeholder_asset: "/placeholder.png".to_owned(),
        }
    }
}

impl StickerConfig {
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub capacity: usize,
    pub storage_key: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            storage_key: "noteCanvas:saved".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            endpoint: "/.netlify/functions/send-note".to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Every tunable of the sketchpad. Partial JSON files are accepted; missing
/// fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchpadConfig {
    pub surface: SurfaceConfig,
    pub paper: PaperConfig,
    pub ink: InkConfig,
    pub stickers: StickerConfig,
    pub gallery: GalleryConfig,
    pub send: SendConfig,
    /// Length of the "sheet removed" transition.
    pub commit_transition_secs: f32,
}

impl Default for SketchpadConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            paper: PaperConfig::default(),
            ink: InkConfig::default(),
            stickers: StickerConfig::default(),
            gallery: GalleryConfig::default(),
            send: SendConfig::default(),
            commit_transition_secs: 0.6,
        }
    }
}

impl SketchpadConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reads the file named by [`CONFIG_ENV_VAR`], falling back to defaults.
    pub fn from_env_or_default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            match Self::load(&path) {
                Ok(config) => {
                    log::info!("Loaded sketchpad config from {path}");
                    return config;
                }
                Err(err) => log::warn!("Ignoring sketchpad config {path}: {err}"),
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.stickers;
        if !(s.min_scale > 0.0 && s.min_scale <= s.max_scale) {
            return Err(ConfigError::Invalid(format!(
                "scale range [{}, {}]",
                s.min_scale, s.max_scale
            )));
        }
        if s.resize_divisor <= 0.0 {
            return Err(ConfigError::Invalid("resize_divisor must be positive".into()));
        }
        if self.paper.guide_gap <= 0.0 {
            return Err(ConfigError::Invalid("guide_gap must be positive".into()));
        }
        if self.gallery.capacity == 0 {
            return Err(ConfigError::Invalid("gallery capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SketchpadConfig::from_json(r#"{ "ink": { "pen_width": 6.0 } }"#).unwrap();
        assert_eq!(config.ink.pen_width, 6.0);
        assert_eq!(config.ink.eraser_width, 18.0);
        assert_eq!(config.gallery.capacity, 50);
    }

    #[test]
    fn test_invalid_scale_range_rejected() {
        let json = r#"{ "stickers": { "min_scale": 2.0, "max_scale": 1.0 } }"#;
        assert!(matches!(
            SketchpadConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            SketchpadConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
