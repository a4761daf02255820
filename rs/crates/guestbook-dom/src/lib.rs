//! guestbook-dom — DomNode snapshot types for the guest book views
//!
//! Views render into a `DomNode` tree. The tree is serialized as the JSON
//! snapshot pushed to live clients and is also the input of the HTML renderer
//! used for the first (server-side) paint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single node in the rendered tree.
///
/// Attribute and event maps are ordered so that two renders of the same state
/// serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomNode {
    /// HTML tag name (e.g. "div", "button", "input")
    pub tag: String,

    /// Stable identity for efficient DOM reuse on the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// HTML attributes (class, placeholder, name, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    /// DOM event name → action name (e.g. "submit" → "submit")
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, String>,

    /// Text content for leaf nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomNode>,
}

/// A complete snapshot wrapping the root node. This is the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub root: DomNode,
}

impl Snapshot {
    pub fn new(root: DomNode) -> Self {
        Snapshot { root }
    }

    pub fn to_json(&self) -> String {
        // DomNode contains only strings and string maps; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from(r#"{"root":{"tag":"div"}}"#))
    }
}

impl DomNode {
    /// Create an empty element
    pub fn element(tag: &str) -> Self {
        DomNode {
            tag: tag.to_string(),
            ..DomNode::default()
        }
    }

    /// Create a simple text node
    pub fn text(tag: &str, content: &str) -> Self {
        DomNode::element(tag).with_text(content)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attr("class", class)
    }

    /// Bind a DOM event to a server action
    pub fn on(mut self, event: &str, action: &str) -> Self {
        self.events.insert(event.to_string(), action.to_string());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = DomNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Get a class attribute if present
    pub fn class(&self) -> Option<&str> {
        self.attr("class")
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    /// Get an event action by event name
    pub fn event(&self, name: &str) -> Option<&str> {
        self.events.get(name).map(|s| s.as_str())
    }

    /// Depth-first search for the first node carrying `key`
    pub fn find_key(&self, key: &str) -> Option<&DomNode> {
        if self.key.as_deref() == Some(key) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_key(key))
    }
}

/// Parse a snapshot from a JSON string
pub fn parse_snapshot(json: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(json)
}
