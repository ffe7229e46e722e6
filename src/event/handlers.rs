use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::event::{EventHandler, SketchEvent};
use crate::tool::Tool;

/// Logs every event at debug level.
#[derive(Debug, Default)]
pub struct EventLogger;

impl EventHandler for EventLogger {
    fn handle_event(&mut self, event: &SketchEvent) {
        log::debug!("{event:?}");
    }
}

/// Shared "select tool engaged" flag for consumers outside the sketchpad,
/// such as the pointer decoration.
#[derive(Debug, Clone, Default)]
pub struct SelectModeFlag(Arc<AtomicBool>);

impl SelectModeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// A handler that keeps this flag in step with tool changes.
    pub fn handler(&self) -> Box<dyn EventHandler> {
        let flag = Arc::clone(&self.0);
        Box::new(move |event: &SketchEvent| {
            if let SketchEvent::ToolChanged { new, .. } = event {
                flag.store(*new == Tool::Select, Ordering::Relaxed);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;

    #[test]
    fn test_select_mode_flag_tracks_tool_changes() {
        let bus = EventBus::new();
        let flag = SelectModeFlag::new();
        bus.subscribe(flag.handler());
        assert!(!flag.is_engaged());

        bus.emit(SketchEvent::ToolChanged {
            old: Tool::Pen,
            new: Tool::Select,
        });
        assert!(flag.is_engaged());

        bus.emit(SketchEvent::ToolChanged {
            old: Tool::Select,
            new: Tool::Eraser,
        });
        assert!(!flag.is_engaged());
    }
}
