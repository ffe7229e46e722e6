use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GalleryConfig;
use crate::export::PngDataUrl;
use crate::storage::{DurableStore, StoreError};
use crate::util::time;

pub type CompositionId = Uuid;

/// A frozen flattening of one sheet. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedComposition {
    id: CompositionId,
    /// Epoch milliseconds.
    created_at: u64,
    data_url: PngDataUrl,
}

impl SavedComposition {
    pub fn id(&self) -> CompositionId {
        self.id
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn data_url(&self) -> &PngDataUrl {
        &self.data_url
    }

    /// `note-<first six id chars>.png`
    pub fn export_filename(&self) -> String {
        let id = self.id.to_string();
        format!("note-{}.png", &id[..6])
    }
}

/// Bounded, most-recent-first collection of saved compositions plus the
/// batch-send selection.
///
/// Every mutation is written through to the durable store. Store failures are
/// logged and otherwise ignored: the in-memory collection stays authoritative
/// for the session.
pub struct GalleryStore {
    items: Vec<SavedComposition>,
    selection: HashSet<CompositionId>,
    store: Box<dyn DurableStore>,
    config: GalleryConfig,
}

impl std::fmt::Debug for GalleryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryStore")
            .field("items", &self.items.len())
            .field("selection", &self.selection)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GalleryStore {
    /// Reads the persisted collection once. An unreadable or malformed record
    /// yields an empty gallery.
    pub fn load(store: Box<dyn DurableStore>, config: GalleryConfig) -> Self {
        let mut items = match Self::read_record(store.as_ref(), &config.storage_key) {
            Ok(items) => items,
            Err(err) => {
                log::warn!("Ignoring saved gallery: {err}");
                Vec::new()
            }
        };
        items.truncate(config.capacity);
        log::debug!("Gallery loaded with {} item(s)", items.len());
        Self {
            items,
            selection: HashSet::new(),
            store,
            config,
        }
    }

    fn read_record(
        store: &dyn DurableStore,
        key: &str,
    ) -> Result<Vec<SavedComposition>, StoreError> {
        match store.load(key)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|err| StoreError::Read(format!("malformed gallery record: {err}"))),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.items) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Failed to serialize gallery: {err}");
                return;
            }
        };
        if let Err(err) = self.store.store(&self.config.storage_key, &json) {
            log::warn!("Gallery not persisted: {err}");
        }
    }

    /// Most-recent first.
    pub fn items(&self) -> &[SavedComposition] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn get(&self, id: CompositionId) -> Option<&SavedComposition> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn save(&mut self, data_url: PngDataUrl) -> CompositionId {
        self.save_at(data_url, time::epoch_millis())
    }

    /// Prepends a new composition and silently evicts beyond capacity.
    pub fn save_at(&mut self, data_url: PngDataUrl, created_at: u64) -> CompositionId {
        let id = Uuid::new_v4();
        self.items.insert(
            0,
            SavedComposition {
                id,
                created_at,
                data_url,
            },
        );
        for evicted in self.items.drain(self.config.capacity.min(self.items.len())..) {
            log::debug!("Gallery full, evicting {}", evicted.id);
            self.selection.remove(&evicted.id);
        }
        self.persist();
        id
    }

    pub fn delete(&mut self, id: CompositionId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.selection.remove(&id);
        let removed = self.items.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Flips membership in the send selection; returns the new membership.
    pub fn toggle_select(&mut self, id: CompositionId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        }
    }

    pub fn is_selected(&self, id: CompositionId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selection(&self) -> &HashSet<CompositionId> {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Payloads of the selected compositions, in gallery order.
    pub fn selected_images(&self) -> Vec<PngDataUrl> {
        self.items
            .iter()
            .filter(|item| self.selection.contains(&item.id))
            .map(|item| item.data_url.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreResult};

    struct BrokenStore;

    impl DurableStore for BrokenStore {
        fn load(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Unavailable("disabled".into()))
        }

        fn store(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Write("quota exceeded".into()))
        }
    }

    fn url(n: usize) -> PngDataUrl {
        PngDataUrl::parse(format!("data:image/png;base64,{n}")).unwrap()
    }

    #[test]
    fn test_store_failures_degrade_to_memory() {
        let mut gallery = GalleryStore::load(Box::new(BrokenStore), GalleryConfig::default());
        assert!(gallery.is_empty());
        let id = gallery.save(url(1));
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.items()[0].id(), id);
    }

    #[test]
    fn test_malformed_record_yields_empty_gallery() {
        let store = MemoryStore::with_record("noteCanvas:saved", "{oops");
        let gallery = GalleryStore::load(Box::new(store), GalleryConfig::default());
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_record_schema_is_camel_case() {
        let handle = MemoryStore::new();
        let mut gallery = GalleryStore::load(Box::new(handle.clone()), GalleryConfig::default());
        gallery.save_at(url(7), 1_700_000_000_000);
        let json: serde_json::Value =
            serde_json::from_str(&handle.get("noteCanvas:saved").unwrap()).unwrap();
        let entry = &json[0];
        assert_eq!(entry["createdAt"], 1_700_000_000_000u64);
        assert_eq!(entry["dataUrl"], "data:image/png;base64,7");
        assert!(entry["id"].is_string());
    }

    #[test]
    fn test_toggle_select_and_delete() {
        let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()), GalleryConfig::default());
        let a = gallery.save(url(1));
        let b = gallery.save(url(2));
        assert!(gallery.toggle_select(a));
        assert!(gallery.toggle_select(b));
        assert!(!gallery.toggle_select(b));
        assert!(gallery.toggle_select(b));
        assert_eq!(gallery.selected_images(), vec![url(2), url(1)]);

        assert!(gallery.delete(a));
        assert!(!gallery.is_selected(a));
        assert_eq!(gallery.selection().len(), 1);
        assert!(!gallery.toggle_select(a));
    }

    #[test]
    fn test_export_filename_uses_id_prefix() {
        let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()), GalleryConfig::default());
        let id = gallery.save(url(1));
        let item = gallery.get(id).unwrap();
        assert_eq!(item.export_filename(), format!("note-{}.png", &id.to_string()[..6]));
    }
}
