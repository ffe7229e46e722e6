use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use thiserror::Error;
use tiny_skia::Pixmap;

use crate::export::{DataUrlError, PngDataUrl};
use crate::gallery::CompositionId;
use crate::sticker::StickerKind;

/// Errors that can occur while turning a raster into a texture
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Invalid texture dimensions")]
    InvalidDimensions,
    #[error(transparent)]
    DataUrl(#[from] DataUrlError),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// What a cached texture shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Background,
    Ink,
    Sprite(StickerKind),
    Gallery(CompositionId),
}

impl TextureSlot {
    fn name(&self, version: u64) -> String {
        match self {
            Self::Background => format!("background_v{version}"),
            Self::Ink => format!("ink_v{version}"),
            Self::Sprite(kind) => format!("sprite_{kind}_v{version}"),
            Self::Gallery(id) => format!("gallery_{id}_v{version}"),
        }
    }
}

type CacheKey = (TextureSlot, u64);

/// GPU textures keyed by (slot, version) with LRU pruning.
///
/// Uploading a new version of a slot drops its older versions.
pub struct TextureCache {
    textures: HashMap<CacheKey, TextureHandle>,
    /// Frame each texture was last used in
    last_used: HashMap<CacheKey, u64>,
    current_frame: u64,
    max_cache_size: usize,
}

impl TextureCache {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            textures: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    pub fn get_or_create<F>(
        &mut self,
        ctx: &Context,
        slot: TextureSlot,
        version: u64,
        generator: F,
    ) -> Result<TextureId, TextureError>
    where
        F: FnOnce() -> Result<ColorImage, TextureError>,
    {
        let key = (slot, version);
        if let Some(handle) = self.textures.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }

        let image = generator()?;
        self.invalidate(slot);
        self.prune_for_insert();

        let handle = ctx.load_texture(slot.name(version), image, TextureOptions::LINEAR);
        let id = handle.id();
        self.textures.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        Ok(id)
    }

    /// Drops every version of `slot`.
    pub fn invalidate(&mut self, slot: TextureSlot) {
        self.textures.retain(|(s, _), _| *s != slot);
        self.last_used.retain(|(s, _), _| *s != slot);
    }

    /// Evicts least recently used textures so one more fits.
    fn prune_for_insert(&mut self) {
        if self.textures.len() < self.max_cache_size {
            return;
        }
        let mut entries: Vec<(CacheKey, u64)> =
            self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = self.textures.len() + 1 - self.max_cache_size;
        for (key, _) in entries.into_iter().take(to_remove) {
            self.textures.remove(&key);
            self.last_used.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.last_used.clear();
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn contains(&self, slot: TextureSlot, version: u64) -> bool {
        self.textures.contains_key(&(slot, version))
    }
}

/// Uploads a premultiplied raster as is.
pub fn pixmap_to_image(pixmap: &Pixmap) -> Result<ColorImage, TextureError> {
    let size = [pixmap.width() as usize, pixmap.height() as usize];
    if size[0] == 0 || size[1] == 0 {
        return Err(TextureError::InvalidDimensions);
    }
    Ok(ColorImage::from_rgba_premultiplied(size, pixmap.data()))
}

/// Decodes a saved composition for its thumbnail.
pub fn data_url_to_image(data_url: &PngDataUrl) -> Result<ColorImage, TextureError> {
    let rgba = image::load_from_memory(&data_url.decode()?)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
