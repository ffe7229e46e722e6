mod bus;
mod events;
mod handlers;

pub use bus::EventBus;
pub use events::SketchEvent;
pub use handlers::{EventLogger, SelectModeFlag};

pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &SketchEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&SketchEvent) + Send,
{
    fn handle_event(&mut self, event: &SketchEvent) {
        self(event)
    }
}
