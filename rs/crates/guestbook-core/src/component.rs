//! Guest book component for embedding in a host application.
//!
//! Same validator and table as the standalone page. The host supplies `id`,
//! `host_app` and `theme`; every host update re-reads the latest entries. There
//! is no visitor counter and no timer.

use std::sync::Arc;

use chrono::Utc;
use guestbook_dom::DomNode;

use crate::entry::{is_valid, EntryForm, GuestEntry};
use crate::event::{HostConfig, ViewEvent};
use crate::live::LiveView;
use crate::render::{entry_form, entry_list};
use crate::store::EntryStore;

/// Entries shown by an embedded component
pub const EMBED_ENTRY_LIMIT: usize = 15;

const DEFAULT_HOST_APP: &str = "unknown";
const DEFAULT_THEME: &str = "dark";

/// Styling variant. Anything other than "light" uses the dark palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Theme::Light => "theme-light",
            Theme::Dark => "theme-dark",
        }
    }
}

pub struct EmbeddedGuestBook {
    store: Arc<dyn EntryStore>,
    id: String,
    host_app: String,
    /// Raw theme name as supplied by the host
    theme: String,
    entries: Vec<GuestEntry>,
    form: EntryForm,
}

impl EmbeddedGuestBook {
    pub fn mount(store: Arc<dyn EntryStore>, config: HostConfig) -> Self {
        store.ensure_exists();
        let mut component = EmbeddedGuestBook {
            store,
            id: String::new(),
            host_app: DEFAULT_HOST_APP.to_string(),
            theme: DEFAULT_THEME.to_string(),
            entries: Vec::new(),
            form: EntryForm::default(),
        };
        component.update(config);
        component
    }

    /// Merge host-supplied assigns and re-read the latest entries. Fields the
    /// host leaves out keep their current value.
    pub fn update(&mut self, config: HostConfig) {
        if !config.id.is_empty() {
            self.id = config.id;
        }
        if let Some(host_app) = config.host_app {
            self.host_app = host_app;
        }
        if let Some(theme) = config.theme {
            self.theme = theme;
        }
        self.refresh();
    }

    pub fn refresh(&mut self) {
        self.entries = self.store.list_recent(EMBED_ENTRY_LIMIT);
    }

    pub fn submit(&mut self, form: EntryForm) {
        let candidate = GuestEntry::candidate(self.store.next_id(), &form, Utc::now())
            .with_origin_host(self.host_app.as_str());
        if is_valid(&candidate) {
            tracing::debug!(id = candidate.id, host = %self.host_app, "embedded guest entry accepted");
            self.store.insert(candidate);
            self.refresh();
        } else {
            tracing::debug!(host = %self.host_app, "blank embedded guest entry ignored");
        }
        self.form = EntryForm::default();
    }

    pub fn clear(&mut self) {
        tracing::debug!(host = %self.host_app, "guest book cleared from embed");
        self.store.clear();
        self.entries.clear();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host_app(&self) -> &str {
        &self.host_app
    }

    pub fn theme(&self) -> Theme {
        Theme::from_name(&self.theme)
    }

    pub fn entries(&self) -> &[GuestEntry] {
        &self.entries
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }
}

impl LiveView for EmbeddedGuestBook {
    fn handle_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Submit(form) => self.submit(form),
            ViewEvent::Clear => self.clear(),
            ViewEvent::Refresh => self.refresh(),
            ViewEvent::Update(config) => self.update(config),
            ViewEvent::Tick => {}
        }
    }

    fn render(&self) -> DomNode {
        let toolbar = DomNode::element("div")
            .with_key("toolbar")
            .with_class("embed-toolbar")
            .with_child(
                DomNode::text("span", &format!("Embedded in {}", self.host_app))
                    .with_key("host")
                    .with_class("embed-host"),
            )
            .with_child(
                DomNode::text("button", "Refresh")
                    .with_key("refresh")
                    .with_attr("type", "button")
                    .on("click", "refresh"),
            )
            .with_child(
                DomNode::text("button", "Clear all")
                    .with_key("clear")
                    .with_attr("type", "button")
                    .on("click", "clear"),
            );

        DomNode::element("div")
            .with_key("guestbook-embed")
            .with_class(format!("guestbook-embed {}", self.theme().class()))
            .with_attr("data-embed-id", self.id.as_str())
            .with_child(DomNode::text("h2", "Guest Book"))
            .with_child(toolbar)
            .with_child(entry_form(&self.form))
            .with_child(entry_list(&self.entries, true))
    }
}
