//! guestbook-render-html — Render DomNode trees to HTML strings
//!
//! Produces the server-side first paint with `data-key` and `data-a_<event>`
//! attributes so the client script can take over once the live stream is up.

use guestbook_dom::DomNode;

/// Void elements that must not have closing tags
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Render a DomNode tree to an HTML string.
pub fn render_to_html(node: &DomNode) -> String {
    let mut buf = String::with_capacity(4096);
    write_node(node, &mut buf);
    buf
}

/// Options for rendering a full HTML page.
pub struct PageOptions {
    pub root: DomNode,
    pub title: String,
    pub inline_css: Option<String>,
    /// External scripts, loaded before the bootstrap
    pub scripts: Vec<String>,
    /// Live stream endpoint; no bootstrap is emitted when absent
    pub sse_url: Option<String>,
    /// Base URL actions are posted to (`<action_url>/<name>`)
    pub action_url: String,
    /// Session the page belongs to, appended to every action post
    pub session: Option<String>,
    pub mount_selector: String,
}

impl PageOptions {
    pub fn new(root: DomNode, title: &str) -> Self {
        PageOptions {
            root,
            title: title.to_string(),
            inline_css: None,
            scripts: Vec::new(),
            sse_url: None,
            action_url: "/actions".to_string(),
            session: None,
            mount_selector: "#app".to_string(),
        }
    }
}

/// Render a full HTML page with SSR content, scripts, and styles.
pub fn render_page(opts: &PageOptions) -> String {
    let body_html = render_to_html(&opts.root);

    let mut html = String::with_capacity(body_html.len() + 2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\" />\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&opts.title)));

    if let Some(css) = &opts.inline_css {
        html.push_str(&format!("<style>{}</style>\n", css));
    }

    html.push_str("</head>\n<body>\n");

    let id = opts.mount_selector.trim_start_matches('#');
    html.push_str(&format!("<div id=\"{}\">{}</div>\n", escape_attr(id), body_html));

    for src in &opts.scripts {
        html.push_str(&format!("<script src=\"{}\"></script>\n", escape_attr(src)));
    }

    if let Some(sse_url) = &opts.sse_url {
        html.push_str("<script>\n");
        html.push_str(&format!(
            "GuestBook.connect({}, {}, {}, {});\n",
            js_string(sse_url),
            js_string(&opts.action_url),
            js_string(opts.session.as_deref().unwrap_or("")),
            js_string(&opts.mount_selector),
        ));
        html.push_str("</script>\n");
    }

    html.push_str("</body>\n</html>");
    html
}

fn write_node(node: &DomNode, buf: &mut String) {
    let is_void = VOID_ELEMENTS.contains(&node.tag.as_str());

    buf.push('<');
    buf.push_str(&node.tag);

    if let Some(key) = &node.key {
        buf.push_str(" data-key=\"");
        buf.push_str(&escape_attr(key));
        buf.push('"');
    }

    // Maps are ordered, so attribute order is deterministic
    for (k, v) in &node.attrs {
        buf.push(' ');
        buf.push_str(k);
        buf.push_str("=\"");
        buf.push_str(&escape_attr(v));
        buf.push('"');
    }

    for (k, v) in &node.events {
        buf.push_str(" data-a_");
        buf.push_str(k);
        buf.push_str("=\"");
        buf.push_str(&escape_attr(v));
        buf.push('"');
    }

    buf.push('>');

    if is_void {
        return;
    }

    if let Some(text) = &node.text {
        buf.push_str(&escape_html(text));
    }

    for child in &node.children {
        write_node(child, buf);
    }

    buf.push_str("</");
    buf.push_str(&node.tag);
    buf.push('>');
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Quote a value as a JS string literal safe to place inside a <script> block
fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '<' => out.push_str("\\u003c"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
