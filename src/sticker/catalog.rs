use serde::{Deserialize, Serialize};

/// MIME-like slot a catalog drag source writes the sticker key into.
pub const STICKER_KEY_SLOT: &str = "application/x-sticker-key";

/// The fixed sticker catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerKind {
    But,
    Ca1,
    Ca2,
    Ghe,
    Sao,
    Not,
    Chuoi,
    Tai,
}

impl StickerKind {
    pub const ALL: [StickerKind; 8] = [
        StickerKind::But,
        StickerKind::Ca1,
        StickerKind::Ca2,
        StickerKind::Ghe,
        StickerKind::Sao,
        StickerKind::Not,
        StickerKind::Chuoi,
        StickerKind::Tai,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StickerKind::But => "but",
            StickerKind::Ca1 => "ca1",
            StickerKind::Ca2 => "ca2",
            StickerKind::Ghe => "ghe",
            StickerKind::Sao => "sao",
            StickerKind::Not => "not",
            StickerKind::Chuoi => "chuoi",
            StickerKind::Tai => "tai",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key.trim())
    }

    pub fn asset_path(self) -> String {
        format!("/{}.png", self.key())
    }

    /// Resolves the asset path against `base`, tolerating a leading slash.
    pub fn resolve(self, base: &str) -> String {
        resolve_asset(base, &self.asset_path())
    }
}

impl std::fmt::Display for StickerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

pub fn resolve_asset(base: &str, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    if base.is_empty() {
        path.to_owned()
    } else if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// What a drop onto the drawing surface carries. Any of the slots may be
/// filled; the custom slot wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragPayload {
    pub sticker_key: Option<String>,
    pub text_plain: Option<String>,
    pub text: Option<String>,
}

impl DragPayload {
    /// Payload a catalog entry writes when its drag starts.
    pub fn for_kind(kind: StickerKind) -> Self {
        Self {
            sticker_key: Some(kind.key().to_owned()),
            text_plain: Some(kind.key().to_owned()),
            text: Some(kind.key().to_owned()),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text_plain: Some(text.into()),
            ..Default::default()
        }
    }

    /// First non-empty slot.
    pub fn key(&self) -> Option<&str> {
        [&self.sticker_key, &self.text_plain, &self.text]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
    }

    pub fn kind(&self) -> Option<StickerKind> {
        self.key().and_then(StickerKind::from_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for kind in StickerKind::ALL {
            assert_eq!(StickerKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(StickerKind::from_key("nope"), None);
    }

    #[test]
    fn test_resolve_against_base() {
        assert_eq!(StickerKind::Ghe.resolve("/"), "/ghe.png");
        assert_eq!(StickerKind::Ghe.resolve("/portfolio"), "/portfolio/ghe.png");
        assert_eq!(StickerKind::Tai.resolve("assets/"), "assets/tai.png");
    }

    #[test]
    fn test_payload_slot_precedence() {
        let payload = DragPayload {
            sticker_key: Some(String::new()),
            text_plain: Some("sao".into()),
            text: Some("but".into()),
        };
        assert_eq!(payload.kind(), Some(StickerKind::Sao));
        assert_eq!(DragPayload::default().key(), None);
        assert_eq!(DragPayload::for_kind(StickerKind::Not).kind(), Some(StickerKind::Not));
    }
}
