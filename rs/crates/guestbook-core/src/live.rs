use std::time::Duration;

use guestbook_dom::DomNode;

use crate::event::ViewEvent;

/// A per-session view driven by a single sequential event loop.
pub trait LiveView: Send + 'static {
    /// Process one event to completion.
    fn handle_event(&mut self, event: ViewEvent);

    /// Render the current state.
    fn render(&self) -> DomNode;

    /// Cadence of [`ViewEvent::Tick`], or `None` if the view does not tick.
    fn tick_interval(&self) -> Option<Duration> {
        None
    }
}
