use eframe_sketchpad::config::StickerConfig;
use eframe_sketchpad::sticker::{StickerEngine, StickerKind, resized_scale};
use egui::{Pos2, pos2, vec2};

const CENTER: Pos2 = Pos2::new(200.0, 200.0);

fn engine() -> StickerEngine {
    StickerEngine::new(StickerConfig::default())
}

fn on_circle(degrees: f32) -> Pos2 {
    let radians = degrees.to_radians();
    CENTER + 80.0 * vec2(radians.cos(), radians.sin())
}

fn same_angle(a: f32, b: f32) -> bool {
    let diff = (a - b).rem_euclid(360.0);
    diff < 1e-2 || 360.0 - diff < 1e-2
}

#[test]
fn test_exactly_one_selected_after_each_add() {
    let mut engine = engine();
    let natural = Some(vec2(120.0, 80.0));
    let mut last = None;
    for (i, kind) in StickerKind::ALL.iter().enumerate() {
        last = Some(engine.add(*kind, pos2(10.0 * i as f32, 20.0), natural));
        let selected: Vec<_> = engine.stickers().iter().filter(|s| s.is_selected()).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(Some(selected[0].id()), last);
    }
    assert_eq!(engine.stickers()[0].id(), last.unwrap());
}

#[test]
fn test_rotate_then_rotate_back_restores_rotation() {
    for theta in [15.0_f32, 90.0, 179.0, 200.0, 359.0] {
        let mut engine = engine();
        let id = engine.add(StickerKind::But, CENTER, None);
        let original = engine.get(id).unwrap().rotation;

        let start = on_circle(-90.0);
        let turned = on_circle(-90.0 + theta);
        assert!(engine.begin_rotate(id, start));
        engine.update_gesture(turned);
        engine.end_gesture();

        assert!(engine.begin_rotate(id, turned));
        engine.update_gesture(start);
        engine.end_gesture();

        let rotation = engine.get(id).unwrap().rotation;
        assert!(same_angle(rotation, original), "theta {theta}: {rotation} vs {original}");
    }
}

#[test]
fn test_resize_is_monotonic_and_clamped() {
    let config = StickerConfig::default();
    let mut previous = f32::MIN;
    for step in 0..200 {
        let displacement = step as f32 * 5.0;
        let scale = resized_scale(0.5, displacement, config.resize_divisor, config.min_scale, config.max_scale);
        assert!(scale >= previous);
        assert!((0.2..=3.0).contains(&scale));
        previous = scale;
    }
    assert_eq!(previous, 3.0);
}

#[test]
fn test_resize_gesture_clamps_at_both_ends() {
    let mut engine = engine();
    let id = engine.add(StickerKind::Ca1, CENTER, Some(vec2(100.0, 100.0)));
    assert!(engine.begin_resize(id, pos2(250.0, 250.0)));
    engine.update_gesture(pos2(5_000.0, 250.0));
    assert_eq!(engine.get(id).unwrap().scale, 3.0);
    engine.end_gesture();

    // displacement is measured by magnitude, so the scale only grows
    let start = engine.get(id).unwrap().scale;
    assert!(engine.begin_resize(id, pos2(250.0, 250.0)));
    engine.update_gesture(pos2(-5_000.0, 250.0));
    assert_eq!(engine.get(id).unwrap().scale, start);
}

#[test]
fn test_drag_moves_by_pointer_delta() {
    let mut engine = engine();
    let id = engine.add(StickerKind::Tai, pos2(50.0, 50.0), None);
    assert!(engine.begin_drag(id, pos2(55.0, 52.0)));
    engine.update_gesture(pos2(75.0, 92.0));
    assert!(engine.end_gesture().is_some());
    assert_eq!(engine.get(id).unwrap().position, pos2(70.0, 90.0));
}
