// DomNode fragments shared by the standalone page and the embedded component.

use guestbook_dom::DomNode;

use crate::entry::{EntryForm, GuestEntry};

pub(crate) const EMPTY_TEXT: &str = "No entries yet. Be the first to sign!";

pub(crate) fn entry_form(form: &EntryForm) -> DomNode {
    DomNode::element("form")
        .with_key("form")
        .with_class("guest-form")
        .on("submit", "submit")
        .with_child(
            DomNode::element("input")
                .with_key("name")
                .with_attr("type", "text")
                .with_attr("name", "name")
                .with_attr("placeholder", "Your name")
                .with_attr("value", form.name.as_str()),
        )
        .with_child(
            DomNode::element("textarea")
                .with_key("message")
                .with_attr("name", "message")
                .with_attr("placeholder", "Leave a message")
                .with_attr("rows", "3")
                .with_text(form.message.as_str()),
        )
        .with_child(
            DomNode::text("button", "Sign")
                .with_key("sign")
                .with_attr("type", "submit"),
        )
}

pub(crate) fn entry_list(entries: &[GuestEntry], show_origin: bool) -> DomNode {
    if entries.is_empty() {
        return DomNode::text("p", EMPTY_TEXT)
            .with_key("entries")
            .with_class("empty");
    }

    let items = entries.iter().map(|entry| {
        let mut meta = DomNode::element("div")
            .with_class("entry-meta")
            .with_child(DomNode::text("strong", &entry.name).with_class("entry-name"))
            .with_child(DomNode::text("time", &entry.display_time()));
        if show_origin {
            let host = entry.origin_host.as_deref().unwrap_or("unknown");
            meta = meta.with_child(DomNode::text("span", &format!("via {host}")).with_class("entry-origin"));
        }
        DomNode::element("li")
            .with_key(format!("entry-{}", entry.id))
            .with_class("entry")
            .with_child(meta)
            .with_child(DomNode::text("p", &entry.message).with_class("entry-message"))
    });

    DomNode::element("ul")
        .with_key("entries")
        .with_class("entries")
        .with_children(items)
}
