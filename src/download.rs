//! Hands an exported PNG to the user: a file in the download directory on
//! native, an anchor-triggered download in the browser.

use thiserror::Error;

use crate::export::{DataUrlError, PngDataUrl};

pub const CURRENT_FILENAME: &str = "note.png";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    DataUrl(#[from] DataUrlError),

    #[error("Failed to write download: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser refused the download: {0}")]
    Browser(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    filename: String,
    data_url: PngDataUrl,
}

impl Download {
    pub fn new(filename: impl Into<String>, data_url: PngDataUrl) -> Self {
        Self {
            filename: filename.into(),
            data_url,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn data_url(&self) -> &PngDataUrl {
        &self.data_url
    }

    /// Writes the PNG into `dir`, returning the written path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn write_to(&self, dir: &std::path::Path) -> Result<std::path::PathBuf, DownloadError> {
        let bytes = self.data_url.decode()?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Saves into the user's download directory, or the working directory
    /// when there is none. Returns a description of where it went.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn deliver(&self) -> Result<String, DownloadError> {
        let dir = directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(std::path::Path::to_path_buf))
            .map_or_else(std::env::current_dir, Ok)?;
        let path = self.write_to(&dir)?;
        log::info!("Saved {}", path.display());
        Ok(path.display().to_string())
    }

    /// Clicks a temporary `<a download>` pointing at the data URL.
    #[cfg(target_arch = "wasm32")]
    pub fn deliver(&self) -> Result<String, DownloadError> {
        use eframe::wasm_bindgen::JsCast as _;

        let browser = |err: eframe::wasm_bindgen::JsValue| DownloadError::Browser(format!("{err:?}"));
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| DownloadError::Browser("no document".to_owned()))?;
        let body = document
            .body()
            .ok_or_else(|| DownloadError::Browser("no body".to_owned()))?;
        let anchor = document
            .create_element("a")
            .map_err(browser)?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| DownloadError::Browser("not an anchor".to_owned()))?;
        anchor.set_href(self.data_url.as_str());
        anchor.set_download(&self.filename);
        body.append_child(&anchor).map_err(browser)?;
        anchor.click();
        anchor.remove();
        Ok(self.filename.clone())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_write_to_decodes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let png = [0x89, b'P', b'N', b'G'];
        let download = Download::new("note.png", PngDataUrl::from_png_bytes(&png));
        let path = download.write_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "note.png");
        assert_eq!(std::fs::read(path).unwrap(), png);
    }
}
