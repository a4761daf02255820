//! Standalone guest book page.
//!
//! Mounted once for the server-side first paint (`Disconnected`, no timer) and
//! again when the live stream is established (`Connected`), at which point the
//! visitor counter starts ticking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use guestbook_dom::DomNode;

use crate::entry::{is_valid, EntryForm, GuestEntry};
use crate::event::ViewEvent;
use crate::live::LiveView;
use crate::random::RandomSource;
use crate::render::{entry_form, entry_list};
use crate::store::EntryStore;

/// Entries shown on the standalone page
pub const STANDALONE_ENTRY_LIMIT: usize = 20;

/// Visitor counter cadence while connected
pub const TICK_INTERVAL: Duration = Duration::from_millis(5000);

const VISITOR_BASE: u32 = 500;
const VISITOR_SPREAD: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

pub struct GuestBookView {
    store: Arc<dyn EntryStore>,
    rng: Box<dyn RandomSource>,
    connection: ConnectionState,
    tick_interval: Duration,
    title: String,
    entries: Vec<GuestEntry>,
    form: EntryForm,
    visitor_count: u32,
}

impl GuestBookView {
    pub fn mount(
        store: Arc<dyn EntryStore>,
        mut rng: Box<dyn RandomSource>,
        connection: ConnectionState,
    ) -> Self {
        store.ensure_exists();
        let entries = store.list_recent(STANDALONE_ENTRY_LIMIT);
        let visitor_count = VISITOR_BASE + rng.range(0, VISITOR_SPREAD);
        GuestBookView {
            store,
            rng,
            connection,
            tick_interval: TICK_INTERVAL,
            title: "Guest Book".to_string(),
            entries,
            form: EntryForm::default(),
            visitor_count,
        }
    }

    /// Override the tick cadence (must be non-zero).
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn entries(&self) -> &[GuestEntry] {
        &self.entries
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }

    pub fn visitor_count(&self) -> u32 {
        self.visitor_count
    }

    pub fn submit(&mut self, form: EntryForm) {
        let candidate = GuestEntry::candidate(self.store.next_id(), &form, Utc::now());
        if is_valid(&candidate) {
            tracing::debug!(id = candidate.id, name = %candidate.name, "guest entry accepted");
            self.store.insert(candidate);
            self.entries = self.store.list_recent(STANDALONE_ENTRY_LIMIT);
        } else {
            tracing::debug!("blank guest entry ignored");
        }
        self.form = EntryForm::default();
    }

    pub fn clear(&mut self) {
        tracing::debug!("guest book cleared");
        self.store.clear();
        self.entries.clear();
    }

    pub fn tick(&mut self) {
        if self.connection == ConnectionState::Connected {
            self.visitor_count += self.rng.range(1, 4);
        }
    }
}

impl LiveView for GuestBookView {
    fn handle_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Submit(form) => self.submit(form),
            ViewEvent::Clear => self.clear(),
            ViewEvent::Tick => self.tick(),
            // Embedded-only events
            ViewEvent::Refresh | ViewEvent::Update(_) => {}
        }
    }

    fn render(&self) -> DomNode {
        let header = DomNode::element("header")
            .with_key("header")
            .with_child(DomNode::text("h1", &self.title))
            .with_child(
                DomNode::text("p", &format!("Visitors: {}", self.visitor_count))
                    .with_key("visitors")
                    .with_class("visitors"),
            );

        let clear = DomNode::text("button", "Clear all")
            .with_key("clear")
            .with_class("clear-btn")
            .with_attr("type", "button")
            .on("click", "clear");

        DomNode::element("div")
            .with_key("guestbook")
            .with_class("guestbook")
            .with_child(header)
            .with_child(entry_form(&self.form))
            .with_child(clear)
            .with_child(entry_list(&self.entries, false))
    }

    fn tick_interval(&self) -> Option<Duration> {
        match self.connection {
            ConnectionState::Connected => Some(self.tick_interval),
            ConnectionState::Disconnected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::EMPTY_TEXT;
    use crate::store::GuestTable;
    use std::collections::VecDeque;

    /// Replays scripted offsets from `low`.
    struct Scripted(VecDeque<u32>);

    impl RandomSource for Scripted {
        fn range(&mut self, low: u32, high: u32) -> u32 {
            let v = low + self.0.pop_front().unwrap_or(0);
            assert!(v < high);
            v
        }
    }

    fn scripted(values: &[u32]) -> Box<dyn RandomSource> {
        Box::new(Scripted(values.iter().copied().collect()))
    }

    fn connected(store: &Arc<GuestTable>, values: &[u32]) -> GuestBookView {
        GuestBookView::mount(store.clone(), scripted(values), ConnectionState::Connected)
    }

    #[test]
    fn test_mount_initial_state() {
        let store = Arc::new(GuestTable::new());
        let view = connected(&store, &[250]);
        assert!(store.exists());
        assert!(view.entries().is_empty());
        assert_eq!(view.form(), &EntryForm::default());
        assert_eq!(view.visitor_count(), 750);
        assert_eq!(view.tick_interval(), Some(TICK_INTERVAL));
    }

    #[test]
    fn test_disconnected_mount_does_not_tick() {
        let store = Arc::new(GuestTable::new());
        let mut view = GuestBookView::mount(store, scripted(&[0, 2]), ConnectionState::Disconnected);
        assert_eq!(view.tick_interval(), None);
        view.handle_event(ViewEvent::Tick);
        assert_eq!(view.visitor_count(), 500);
    }

    #[test]
    fn test_tick_increments_counter() {
        let store = Arc::new(GuestTable::new());
        let mut view = connected(&store, &[0, 0, 2, 1]);
        view.handle_event(ViewEvent::Tick);
        view.handle_event(ViewEvent::Tick);
        view.handle_event(ViewEvent::Tick);
        assert_eq!(view.visitor_count(), 500 + 1 + 3 + 2);
    }

    #[test]
    fn test_submit_then_blank_submit() {
        let store = Arc::new(GuestTable::new());
        let mut view = connected(&store, &[]);
        view.handle_event(ViewEvent::Submit(EntryForm::new("Alice", "Hi!")));
        view.handle_event(ViewEvent::Submit(EntryForm::new("", "Bye")));

        let rows = store.list_recent(STANDALONE_ENTRY_LIMIT);
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].name.as_str(), rows[0].message.as_str()), ("Alice", "Hi!"));
        assert_eq!(view.entries(), rows.as_slice());
        assert_eq!(view.form(), &EntryForm::default());
    }

    #[test]
    fn test_display_list_keeps_newest_twenty() {
        let store = Arc::new(GuestTable::new());
        let mut view = connected(&store, &[]);
        for i in 1..=25 {
            view.submit(EntryForm::new(format!("E{i}"), "hello"));
        }
        let names: Vec<_> = view.entries().iter().map(|e| e.name.clone()).collect();
        let expected: Vec<_> = (6..=25).rev().map(|i| format!("E{i}")).collect();
        assert_eq!(names, expected);
        assert_eq!(store.len(), 25);
    }

    #[test]
    fn test_clear() {
        let store = Arc::new(GuestTable::new());
        let mut view = connected(&store, &[]);
        view.submit(EntryForm::new("Alice", "Hi!"));
        view.handle_event(ViewEvent::Clear);
        assert!(view.entries().is_empty());
        assert!(store.list_recent(STANDALONE_ENTRY_LIMIT).is_empty());
    }

    #[test]
    fn test_embedded_only_events_are_ignored() {
        let store = Arc::new(GuestTable::new());
        let mut view = connected(&store, &[]);
        let before = view.render();
        view.handle_event(ViewEvent::Refresh);
        view.handle_event(ViewEvent::Update(Default::default()));
        assert_eq!(view.render(), before);
    }

    #[test]
    fn test_render() {
        let store = Arc::new(GuestTable::new());
        let mut view = connected(&store, &[42]).with_title("Sign here");
        let dom = view.render();
        assert_eq!(dom.find_key("visitors").and_then(|n| n.text.as_deref()), Some("Visitors: 542"));
        assert_eq!(dom.find_key("entries").and_then(|n| n.text.as_deref()), Some(EMPTY_TEXT));
        assert_eq!(dom.find_key("form").and_then(|n| n.event("submit")), Some("submit"));
        assert_eq!(dom.find_key("clear").and_then(|n| n.event("click")), Some("clear"));

        view.submit(EntryForm::new("Alice", "Hi!"));
        let id = view.entries()[0].id;
        let dom = view.render();
        let item = dom.find_key(&format!("entry-{id}")).expect("entry rendered");
        assert_eq!(item.children[1].text.as_deref(), Some("Hi!"));
    }
}
