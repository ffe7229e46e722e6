use std::cell::RefCell;

use crate::event::{EventHandler, SketchEvent};

/// Broadcasts sketchpad events to registered handlers, in subscription order.
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Drops every handler.
    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Handlers must not emit on the same bus.
    pub fn emit(&self, event: SketchEvent) {
        log::trace!("event: {event:?}");
        for handler in &mut *self.handlers.borrow_mut() {
            handler.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Tool;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_emit_reaches_every_subscriber_until_cleared() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(Box::new(move |event: &SketchEvent| {
                seen.lock().push((tag, event.clone()));
            }));
        }

        let changed = SketchEvent::ToolChanged {
            old: Tool::Pen,
            new: Tool::Select,
        };
        bus.emit(changed.clone());
        assert_eq!(*seen.lock(), vec![("a", changed.clone()), ("b", changed)]);

        bus.clear();
        assert!(bus.is_empty());
        bus.emit(SketchEvent::SheetReset);
        assert_eq!(seen.lock().len(), 2);
    }
}
