use thiserror::Error;

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::download::DownloadError;
use crate::export::{DataUrlError, ExportError};
use crate::send::SendError;
use crate::storage::StoreError;
use crate::textures::TextureError;

/// Any failure surfaced by the sketchpad.
///
/// Each concern keeps its own error type; this enum exists for callers that
/// only need to report.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    DataUrl(#[from] DataUrlError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

pub type SketchResult<T> = Result<T, SketchError>;
