use egui::{Pos2, Vec2, pos2, vec2};

use super::instance::{StickerId, StickerInstance, angle_between, fit_scale};
use super::StickerKind;
use crate::config::StickerConfig;

/// Which part of a sticker the pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickerHandle {
    Body,
    Rotate,
    Resize,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickerHit {
    pub id: StickerId,
    pub handle: StickerHandle,
}

/// In-progress transform of the selected instance. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StickerGesture {
    Drag {
        id: StickerId,
        pointer_start: Pos2,
        origin: Pos2,
    },
    Rotate {
        id: StickerId,
        center: Pos2,
        start_angle: f32,
        start_rotation: f32,
    },
    Resize {
        id: StickerId,
        pointer_start: Pos2,
        start_scale: f32,
    },
}

impl StickerGesture {
    pub fn id(&self) -> StickerId {
        match self {
            StickerGesture::Drag { id, .. }
            | StickerGesture::Rotate { id, .. }
            | StickerGesture::Resize { id, .. } => *id,
        }
    }
}

/// Owns the placed stickers of the current sheet.
///
/// The collection is kept most-recent first; index 0 renders on top.
#[derive(Debug, Clone, Default)]
pub struct StickerEngine {
    config: StickerConfig,
    stickers: Vec<StickerInstance>,
    gesture: Option<StickerGesture>,
}

impl StickerEngine {
    pub fn new(config: StickerConfig) -> Self {
        Self {
            config,
            stickers: Vec::new(),
            gesture: None,
        }
    }

    pub fn config(&self) -> &StickerConfig {
        &self.config
    }

    /// Most-recent first.
    pub fn stickers(&self) -> &[StickerInstance] {
        &self.stickers
    }

    pub fn get(&self, id: StickerId) -> Option<&StickerInstance> {
        self.stickers.iter().find(|s| s.id() == id)
    }

    fn get_mut(&mut self, id: StickerId) -> Option<&mut StickerInstance> {
        self.stickers.iter_mut().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    pub fn selected(&self) -> Option<&StickerInstance> {
        self.stickers.iter().find(|s| s.is_selected())
    }

    pub fn gesture(&self) -> Option<&StickerGesture> {
        self.gesture.as_ref()
    }

    /// Initial scale for a sprite, or the provisional scale if its size is
    /// still unknown.
    pub fn initial_scale(&self, natural: Option<Vec2>) -> f32 {
        match natural {
            Some(natural) => self.config.clamp_scale(fit_scale(natural, self.config.fit_max)),
            None => self.config.clamp_scale(self.config.provisional_scale),
        }
    }

    /// Places a new instance at `position`, selected, with all others
    /// deselected.
    pub fn add(&mut self, kind: StickerKind, position: Pos2, natural: Option<Vec2>) -> StickerId {
        let scale = self.initial_scale(natural);
        self.insert(StickerInstance::new(kind, position, scale, natural.is_none()))
    }

    /// Like [`Self::add`] but with an explicit scale that is never refit.
    pub fn add_scaled(&mut self, kind: StickerKind, position: Pos2, scale: f32) -> StickerId {
        let scale = self.config.clamp_scale(scale);
        self.insert(StickerInstance::new(kind, position, scale, false))
    }

    fn insert(&mut self, instance: StickerInstance) -> StickerId {
        let (id, kind, position, scale) =
            (instance.id(), instance.kind(), instance.position, instance.scale);
        for sticker in &mut self.stickers {
            sticker.selected = false;
        }
        self.stickers.insert(0, instance);
        log::debug!("Added sticker {kind} at {position:?} (scale {scale:.2})");
        id
    }

    /// Refits instances created before `kind`'s natural size was known.
    pub fn on_asset_loaded(&mut self, kind: StickerKind, natural: Vec2) -> usize {
        let scale = self.config.clamp_scale(fit_scale(natural, self.config.fit_max));
        let mut refit = 0;
        for sticker in self.stickers.iter_mut().filter(|s| s.kind() == kind && s.fit_pending) {
            sticker.scale = scale;
            sticker.fit_pending = false;
            refit += 1;
        }
        refit
    }

    /// Exclusive selection. Returns false for an unknown id.
    pub fn select(&mut self, id: StickerId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        for sticker in &mut self.stickers {
            sticker.selected = sticker.id() == id;
        }
        true
    }

    /// Clears every selection flag. Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let mut changed = false;
        for sticker in &mut self.stickers {
            changed |= sticker.selected;
            sticker.selected = false;
        }
        changed
    }

    pub fn delete(&mut self, id: StickerId) -> bool {
        let before = self.stickers.len();
        self.stickers.retain(|s| s.id() != id);
        if self.gesture.is_some_and(|g| g.id() == id) {
            self.gesture = None;
        }
        self.stickers.len() != before
    }

    /// Removes every instance (sheet reset).
    pub fn clear(&mut self) {
        self.stickers.clear();
        self.gesture = None;
    }

    pub fn begin_drag(&mut self, id: StickerId, pointer: Pos2) -> bool {
        let Some(origin) = self.get(id).map(|s| s.position) else {
            return false;
        };
        self.select(id);
        self.gesture = Some(StickerGesture::Drag {
            id,
            pointer_start: pointer,
            origin,
        });
        true
    }

    pub fn begin_rotate(&mut self, id: StickerId, pointer: Pos2) -> bool {
        let Some((center, start_rotation)) = self.get(id).map(|s| (s.position, s.rotation)) else {
            return false;
        };
        self.select(id);
        self.gesture = Some(StickerGesture::Rotate {
            id,
            center,
            start_angle: angle_between(center, pointer),
            start_rotation,
        });
        true
    }

    pub fn begin_resize(&mut self, id: StickerId, pointer: Pos2) -> bool {
        let Some(start_scale) = self.get(id).map(|s| s.scale) else {
            return false;
        };
        self.select(id);
        self.gesture = Some(StickerGesture::Resize {
            id,
            pointer_start: pointer,
            start_scale,
        });
        true
    }

    /// Applies a pointer move to the active gesture.
    pub fn update_gesture(&mut self, pointer: Pos2) -> bool {
        let Some(gesture) = self.gesture else {
            return false;
        };
        let config = &self.config;
        let (min_scale, max_scale, divisor) =
            (config.min_scale, config.max_scale, config.resize_divisor);
        let Some(sticker) = self.get_mut(gesture.id()) else {
            self.gesture = None;
            return false;
        };
        match gesture {
            StickerGesture::Drag {
                pointer_start,
                origin,
                ..
            } => {
                sticker.position = origin + (pointer - pointer_start);
            }
            StickerGesture::Rotate {
                center,
                start_angle,
                start_rotation,
                ..
            } => {
                sticker.rotation = start_rotation + (angle_between(center, pointer) - start_angle);
            }
            StickerGesture::Resize {
                pointer_start,
                start_scale,
                ..
            } => {
                let delta = pointer - pointer_start;
                let displacement = delta.x.abs().max(delta.y.abs());
                sticker.scale = resized_scale(start_scale, displacement, divisor, min_scale, max_scale);
            }
        }
        true
    }

    /// Ends the active gesture; returns it so callers know a transform (not a
    /// tap) just finished.
    pub fn end_gesture(&mut self) -> Option<StickerGesture> {
        self.gesture.take()
    }

    /// Hit-tests topmost first. Handles only respond on the selected instance.
    pub fn hit_test(
        &self,
        pos: Pos2,
        natural_size: impl Fn(StickerKind) -> Option<Vec2>,
    ) -> Option<StickerHit> {
        let radius = self.config.handle_radius;
        if let Some(selected) = self.selected() {
            let natural = natural_size(selected.kind()).unwrap_or(self.fallback_size());
            for (handle, anchor) in self.handle_anchors(selected, natural) {
                if anchor.distance(pos) <= radius {
                    return Some(StickerHit {
                        id: selected.id(),
                        handle,
                    });
                }
            }
        }
        self.stickers.iter().find_map(|sticker| {
            let natural = natural_size(sticker.kind()).unwrap_or(self.fallback_size());
            sticker.contains(pos, natural).then(|| StickerHit {
                id: sticker.id(),
                handle: StickerHandle::Body,
            })
        })
    }

    /// Logical positions of the rotate, resize and delete handles. They sit on
    /// the unrotated box: rotate above, resize bottom-right, delete top-right.
    pub fn handle_anchors(
        &self,
        sticker: &StickerInstance,
        natural: Vec2,
    ) -> [(StickerHandle, Pos2); 3] {
        let rect = sticker.local_rect(natural);
        [
            (
                StickerHandle::Rotate,
                pos2(rect.center().x, rect.min.y - self.config.rotate_handle_offset),
            ),
            (StickerHandle::Resize, rect.right_bottom()),
            (StickerHandle::Delete, rect.right_top()),
        ]
    }

    /// Box used for a sprite whose size is not known yet: a square at the
    /// fit limit, scaled back by the provisional scale.
    pub fn fallback_size(&self) -> Vec2 {
        let side = self.config.fit_max / self.config.provisional_scale.max(f32::EPSILON);
        vec2(side, side)
    }
}

/// Maps a pointer displacement linearly onto a clamped scale.
pub fn resized_scale(start: f32, displacement: f32, divisor: f32, min: f32, max: f32) -> f32 {
    (start + displacement / divisor).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> StickerEngine {
        StickerEngine::new(StickerConfig::default())
    }

    fn size_of(_: StickerKind) -> Option<Vec2> {
        Some(vec2(100.0, 100.0))
    }

    #[test]
    fn test_add_fits_known_sprite() {
        let mut engine = engine();
        let id = engine.add(StickerKind::Sao, pos2(50.0, 50.0), Some(vec2(360.0, 180.0)));
        let sticker = engine.get(id).unwrap();
        assert!((sticker.scale - 0.25).abs() < 1e-6);
        assert!(!sticker.is_fit_pending());
    }

    #[test]
    fn test_add_clamps_tiny_fit_to_min_scale() {
        let mut engine = engine();
        let id = engine.add(StickerKind::Sao, pos2(0.0, 0.0), Some(vec2(2000.0, 100.0)));
        assert_eq!(engine.get(id).unwrap().scale, 0.2);
    }

    #[test]
    fn test_pending_sprite_is_refit_on_load() {
        let mut engine = engine();
        let pending = engine.add(StickerKind::Chuoi, pos2(10.0, 10.0), None);
        let other = engine.add(StickerKind::Tai, pos2(10.0, 10.0), None);
        assert_eq!(engine.get(pending).unwrap().scale, 0.5);

        assert_eq!(engine.on_asset_loaded(StickerKind::Chuoi, vec2(120.0, 60.0)), 1);
        assert!((engine.get(pending).unwrap().scale - 0.75).abs() < 1e-6);
        assert!(engine.get(other).unwrap().is_fit_pending());

        // a later resize is not overwritten by a second notification
        engine.begin_resize(pending, pos2(0.0, 0.0));
        engine.update_gesture(pos2(40.0, 0.0));
        engine.end_gesture();
        assert_eq!(engine.on_asset_loaded(StickerKind::Chuoi, vec2(120.0, 60.0)), 0);
    }

    #[test]
    fn test_drag_applies_delta_to_origin() {
        let mut engine = engine();
        let id = engine.add(StickerKind::Ghe, pos2(100.0, 100.0), Some(vec2(90.0, 90.0)));
        assert!(engine.begin_drag(id, pos2(105.0, 95.0)));
        engine.update_gesture(pos2(125.0, 85.0));
        engine.update_gesture(pos2(115.0, 135.0));
        assert_eq!(engine.get(id).unwrap().position, pos2(110.0, 140.0));
        assert!(matches!(engine.end_gesture(), Some(StickerGesture::Drag { .. })));
        assert!(!engine.update_gesture(pos2(0.0, 0.0)));
        assert_eq!(engine.get(id).unwrap().position, pos2(110.0, 140.0));
    }

    #[test]
    fn test_rotate_by_pointer_angle() {
        let mut engine = engine();
        let id = engine.add(StickerKind::Ghe, pos2(0.0, 0.0), Some(vec2(90.0, 90.0)));
        engine.begin_rotate(id, pos2(0.0, -50.0));
        engine.update_gesture(pos2(50.0, 0.0));
        assert!((engine.get(id).unwrap().rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_uses_larger_axis() {
        let mut engine = engine();
        let id = engine.add(StickerKind::Ghe, pos2(0.0, 0.0), Some(vec2(90.0, 90.0)));
        engine.begin_resize(id, pos2(45.0, 45.0));
        engine.update_gesture(pos2(45.0 - 100.0, 65.0));
        assert!((engine.get(id).unwrap().scale - 1.5).abs() < 1e-6);
        engine.update_gesture(pos2(2000.0, 45.0));
        assert_eq!(engine.get(id).unwrap().scale, 3.0);
    }

    #[test]
    fn test_engaging_other_instance_switches_selection() {
        let mut engine = engine();
        let first = engine.add(StickerKind::But, pos2(0.0, 0.0), None);
        let second = engine.add(StickerKind::Not, pos2(200.0, 0.0), None);
        assert!(engine.get(second).unwrap().is_selected());
        engine.begin_drag(first, pos2(0.0, 0.0));
        assert!(engine.get(first).unwrap().is_selected());
        assert!(!engine.get(second).unwrap().is_selected());
    }

    #[test]
    fn test_hit_test_prefers_handles_then_topmost_body() {
        let mut engine = engine();
        let below = engine.add(StickerKind::But, pos2(100.0, 100.0), Some(vec2(100.0, 100.0)));
        let above = engine.add(StickerKind::Not, pos2(120.0, 100.0), Some(vec2(100.0, 100.0)));

        let hit = engine.hit_test(pos2(110.0, 100.0), size_of).unwrap();
        assert_eq!(hit, StickerHit { id: above, handle: StickerHandle::Body });

        let hit = engine.hit_test(pos2(60.0, 100.0), size_of).unwrap();
        assert_eq!(hit, StickerHit { id: below, handle: StickerHandle::Body });

        // selected instance (above) scale 0.9 -> box 90x90 centred at (120, 100)
        let hit = engine.hit_test(pos2(165.0, 145.0), size_of).unwrap();
        assert_eq!(hit.handle, StickerHandle::Resize);
        let hit = engine.hit_test(pos2(120.0, 55.0 - 24.0), size_of).unwrap();
        assert_eq!(hit.handle, StickerHandle::Rotate);
        let hit = engine.hit_test(pos2(165.0, 55.0), size_of).unwrap();
        assert_eq!(hit.handle, StickerHandle::Delete);

        assert!(engine.hit_test(pos2(400.0, 400.0), size_of).is_none());
    }

    #[test]
    fn test_delete_cancels_gesture() {
        let mut engine = engine();
        let id = engine.add(StickerKind::Ca1, pos2(0.0, 0.0), None);
        engine.begin_drag(id, pos2(0.0, 0.0));
        assert!(engine.delete(id));
        assert!(engine.gesture().is_none());
        assert!(!engine.delete(id));
    }
}
