use egui::{Pos2, Rect, Vec2};
use uuid::Uuid;

use super::StickerKind;

pub type StickerId = Uuid;

/// A placed, transformable occurrence of a catalog sprite.
///
/// `position` is the visual centre; rotation and scale pivot on it.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerInstance {
    id: StickerId,
    kind: StickerKind,
    pub position: Pos2,
    pub scale: f32,
    /// Degrees, clockwise on screen.
    pub rotation: f32,
    pub(crate) selected: bool,
    /// Created with the provisional scale; refit once the sprite resolves.
    pub(crate) fit_pending: bool,
}

impl StickerInstance {
    pub(crate) fn new(kind: StickerKind, position: Pos2, scale: f32, fit_pending: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            scale,
            rotation: 0.0,
            selected: true,
            fit_pending,
        }
    }

    pub fn id(&self) -> StickerId {
        self.id
    }

    pub fn kind(&self) -> StickerKind {
        self.kind
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_fit_pending(&self) -> bool {
        self.fit_pending
    }

    /// Rotation folded into `[0, 360)`.
    pub fn rotation_normalized(&self) -> f32 {
        self.rotation.rem_euclid(360.0)
    }

    /// Half extents of the scaled, unrotated sprite.
    pub fn half_extents(&self, natural: Vec2) -> Vec2 {
        natural * self.scale * 0.5
    }

    /// Axis-aligned box of the scaled sprite before rotation.
    pub fn local_rect(&self, natural: Vec2) -> Rect {
        Rect::from_center_size(self.position, natural * self.scale)
    }

    /// Whether `pos` falls inside the rotated sprite body.
    pub fn contains(&self, pos: Pos2, natural: Vec2) -> bool {
        let half = self.half_extents(natural);
        let local = rotate(pos - self.position, -self.rotation);
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }
}

/// Rotates `v` by `degrees` (clockwise on a y-down screen).
pub fn rotate(v: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Angle in degrees from `center` to `pointer`.
pub(crate) fn angle_between(center: Pos2, pointer: Pos2) -> f32 {
    let d = pointer - center;
    d.y.atan2(d.x).to_degrees()
}

/// Uniform scale that fits `natural` under `max_side`, never enlarging.
pub fn fit_scale(natural: Vec2, max_side: f32) -> f32 {
    let longest = natural.x.max(natural.y);
    let longest = if longest > 0.0 { longest } else { 1.0 };
    (max_side / longest).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn test_contains_respects_rotation() {
        let mut sticker = StickerInstance::new(StickerKind::Ghe, pos2(100.0, 100.0), 1.0, false);
        let natural = vec2(100.0, 20.0);
        assert!(sticker.contains(pos2(145.0, 100.0), natural));
        assert!(!sticker.contains(pos2(100.0, 145.0), natural));

        sticker.rotation = 90.0;
        assert!(!sticker.contains(pos2(145.0, 100.0), natural));
        assert!(sticker.contains(pos2(100.0, 145.0), natural));
    }

    #[test]
    fn test_fit_scale_never_enlarges() {
        assert_eq!(fit_scale(vec2(45.0, 30.0), 90.0), 1.0);
        assert_eq!(fit_scale(vec2(180.0, 90.0), 90.0), 0.5);
        assert_eq!(fit_scale(Vec2::ZERO, 90.0), 1.0);
    }

    #[test]
    fn test_angle_between_axes() {
        let c = pos2(0.0, 0.0);
        assert!((angle_between(c, pos2(10.0, 0.0)) - 0.0).abs() < 1e-4);
        assert!((angle_between(c, pos2(0.0, 10.0)) - 90.0).abs() < 1e-4);
    }
}
