use eframe_sketchpad::config::GalleryConfig;
use eframe_sketchpad::export::PngDataUrl;
use eframe_sketchpad::gallery::GalleryStore;
use eframe_sketchpad::storage::{FileStore, MemoryStore};

fn image(n: u8) -> PngDataUrl {
    PngDataUrl::from_png_bytes(&[0x89, b'P', b'N', b'G', n])
}

#[test]
fn test_capacity_evicts_oldest() {
    let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()), GalleryConfig::default());
    assert_eq!(gallery.capacity(), 50);

    let ids: Vec<_> = (0..51u8)
        .map(|n| gallery.save_at(image(n), 1_000 + u64::from(n)))
        .collect();

    assert_eq!(gallery.len(), 50);
    assert!(gallery.get(ids[0]).is_none());
    assert!(gallery.get(ids[50]).is_some());
    assert_eq!(gallery.items()[0].id(), ids[50]);
    assert_eq!(gallery.items()[49].id(), ids[1]);
}

#[test]
fn test_eviction_drops_selection_of_evicted_item() {
    let config = GalleryConfig {
        capacity: 2,
        ..GalleryConfig::default()
    };
    let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()), config);
    let oldest = gallery.save_at(image(1), 1);
    assert!(gallery.toggle_select(oldest));
    gallery.save_at(image(2), 2);
    gallery.save_at(image(3), 3);
    assert!(gallery.get(oldest).is_none());
    assert!(gallery.selection().is_empty());
}

#[test]
fn test_delete_persists_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config = GalleryConfig::default();

    let (kept, deleted) = {
        let mut gallery = GalleryStore::load(Box::new(FileStore::new(dir.path())), config.clone());
        let first = gallery.save_at(image(1), 10);
        let second = gallery.save_at(image(2), 20);
        let third = gallery.save_at(image(3), 30);
        assert!(gallery.delete(second));
        ([third, first], second)
    };

    let reloaded = GalleryStore::load(Box::new(FileStore::new(dir.path())), config);
    let ids: Vec<_> = reloaded.items().iter().map(|item| item.id()).collect();
    assert_eq!(ids, kept);
    assert!(reloaded.get(deleted).is_none());
    assert_eq!(reloaded.items()[0].created_at(), 30);
    assert_eq!(reloaded.items()[0].data_url(), &image(3));
    assert!(reloaded.selection().is_empty());
}

#[test]
fn test_selected_images_follow_gallery_order() {
    let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()), GalleryConfig::default());
    let a = gallery.save_at(image(1), 1);
    gallery.save_at(image(2), 2);
    let c = gallery.save_at(image(3), 3);
    gallery.toggle_select(a);
    gallery.toggle_select(c);
    assert_eq!(gallery.selected_images(), vec![image(3), image(1)]);
}
