use egui::Pos2;
use tiny_skia::{LineCap, LineJoin, PathBuilder, Stroke};

use crate::surface::{Surface, SurfaceLayout};
use crate::tool::InkBrush;

/// Stroke lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InkState {
    #[default]
    Idle,
    Drawing {
        last: Pos2,
    },
}

/// Owns the ink surface and the pen/eraser stroke lifecycle.
///
/// Every segment is rasterized as soon as it arrives; no vector history is
/// kept.
#[derive(Debug)]
pub struct InkEngine {
    surface: Option<Surface>,
    state: InkState,
    version: u64,
}

impl Default for InkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InkEngine {
    pub fn new() -> Self {
        Self {
            surface: None,
            state: InkState::Idle,
            version: 0,
        }
    }

    /// Replaces the backing surface. Existing ink is discarded, just as
    /// resizing a raster target clears it.
    pub fn resize(&mut self, layout: SurfaceLayout) {
        self.surface = Surface::new(layout);
        self.state = InkState::Idle;
        self.version += 1;
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn state(&self) -> InkState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, InkState::Drawing { .. })
    }

    /// Bumped on every pixel change; used for texture invalidation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// `pointer-down`: starts a path. Ignored unless idle and sized.
    pub fn begin(&mut self, pos: Pos2) -> bool {
        if self.surface.is_none() || self.is_drawing() {
            return false;
        }
        self.state = InkState::Drawing { last: pos };
        true
    }

    /// `pointer-move`: extends the path and strokes the new segment with the
    /// brush snapshot taken at this moment.
    pub fn extend(&mut self, pos: Pos2, brush: InkBrush) -> bool {
        let InkState::Drawing { last } = self.state else {
            return false;
        };
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        let mut pb = PathBuilder::new();
        pb.move_to(last.x, last.y);
        pb.line_to(pos.x, pos.y);
        self.state = InkState::Drawing { last: pos };

        let Some(path) = pb.finish() else {
            return false;
        };
        let stroke = Stroke {
            width: brush.width(),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        let transform = surface.transform();
        surface
            .pixmap_mut()
            .stroke_path(&path, &brush.paint(), &stroke, transform, None);
        self.version += 1;
        true
    }

    /// `pointer-up` / `pointer-leave`: closes the path.
    pub fn end(&mut self) -> bool {
        let was_drawing = self.is_drawing();
        self.state = InkState::Idle;
        was_drawing
    }

    /// Wipes the ink for a fresh sheet.
    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
        self.state = InkState::Idle;
        self.version += 1;
    }
}
