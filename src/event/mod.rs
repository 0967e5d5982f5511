//! Notifications from the engine to its host.

mod bus;
mod events;

pub use bus::EventBus;
pub use events::EngineEvent;

/// Receives engine events
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &EngineEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&EngineEvent) + Send,
{
    fn handle_event(&mut self, event: &EngineEvent) {
        self(event)
    }
}
