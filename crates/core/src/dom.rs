//! Owned markup tree and traversal primitives.
//!
//! This module provides the [`Fragment`], [`Node`], and [`Element`] types
//! shared by the extractor and the sanitizer. HTML is parsed with scraper's
//! browser-grade error recovery and converted into a plain owned tree, so
//! the rewrite passes can mutate child lists directly instead of going
//! through a live selector engine.
//!
//! # Example
//!
//! ```rust
//! use legible_core::dom::Fragment;
//!
//! let fragment = Fragment::parse_fragment("<p>Hello <b>world</b></p>");
//! assert_eq!(fragment.to_html(), "<p>Hello <b>world</b></p>");
//! assert_eq!(fragment.text(), "Hello world");
//! ```

use scraper::Html;
use ego_tree::NodeRef;
use scraper::node::Node as RawNode;

/// Tags serialized without children or a closing tag.
pub const SELF_CLOSING_TAGS: &[&str] = &["br", "hr", "img"];

/// Returns whether a tag serializes self-closing.
pub fn is_self_closing(tag: &str) -> bool {
    SELF_CLOSING_TAGS.contains(&tag)
}

/// A node in the markup tree.
///
/// Comments are carried through parsing so the sanitizer can remove them
/// explicitly, but they are inert: they never count as content and never
/// serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with a lowercase tag name, attributes, and owned children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attribute name/value pairs in source order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(tag: &str) -> Self {
        Self { tag: tag.to_lowercase(), attrs: Vec::new(), children: Vec::new() }
    }

    /// Gets an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Removes an attribute by name; no-op if absent.
    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(attr_name, _)| attr_name != name);
    }

    /// Returns whether the `class` attribute contains `token` as a whole
    /// whitespace-separated word.
    pub fn has_class_token(&self, token: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|class| class == token))
            .unwrap_or(false)
    }

    /// Collects the concatenated text of the subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Returns whether any descendant element matches the predicate.
    pub fn has_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(el) => pred(el) || el.has_descendant(pred),
            _ => false,
        })
    }

    /// Serializes the element including its own tags.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self);
        out
    }

    /// Serializes the element's children only.
    pub fn inner_html(&self) -> String {
        serialize_nodes(&self.children)
    }
}

/// An ordered sequence of top-level nodes with no root-element requirement.
///
/// Both full documents and bare fragments parse into this shape; an empty
/// input yields an empty node list and serializes back to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    /// Parses a full HTML document with best-effort error recovery.
    ///
    /// Unclosed tags are auto-closed, unknown tags are kept as generic
    /// elements, and text outside any tag is preserved, matching browser
    /// behavior. The `html`/`head`/`body` scaffolding the parser inserts is
    /// part of the resulting tree.
    pub fn parse_document(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        Self { nodes: convert_children(parsed.tree.root()) }
    }

    /// Parses an HTML fragment (body context, no document scaffolding).
    pub fn parse_fragment(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        let root = parsed.tree.root();
        match root.children().find(|child| child.value().is_element()) {
            Some(synthetic_root) => Self { nodes: convert_children(synthetic_root) },
            None => Self { nodes: convert_children(root) },
        }
    }

    /// Serializes all top-level nodes.
    pub fn to_html(&self) -> String {
        serialize_nodes(&self.nodes)
    }

    /// Collects the concatenated text of the whole tree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(el) => collect_text(&el.children, out),
            Node::Text(text) => out.push_str(text),
            Node::Comment(_) => {}
        }
    }
}

fn convert_children(raw: NodeRef<'_, RawNode>) -> Vec<Node> {
    raw.children().filter_map(convert).collect()
}

fn convert(raw: NodeRef<'_, RawNode>) -> Option<Node> {
    match raw.value() {
        RawNode::Element(el) => {
            let mut element = Element::new(el.name());
            for (name, value) in el.attrs() {
                element.attrs.push((name.to_string(), value.to_string()));
            }
            element.children = convert_children(raw);
            Some(Node::Element(element))
        }
        RawNode::Text(text) => Some(Node::Text(text.to_string())),
        RawNode::Comment(comment) => Some(Node::Comment(comment.to_string())),
        _ => None,
    }
}

/// Returns all descendant elements matching the predicate, depth-first in
/// document order.
pub fn select<'a>(nodes: &'a [Node], pred: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
    let mut matches = Vec::new();
    collect_matches(nodes, pred, &mut matches);
    matches
}

fn collect_matches<'a>(nodes: &'a [Node], pred: &dyn Fn(&Element) -> bool, matches: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(el) = node {
            if pred(el) {
                matches.push(el);
            }
            collect_matches(&el.children, pred, matches);
        }
    }
}

/// Returns the first element matching the predicate in document order.
pub fn find_first<'a>(nodes: &'a [Node], pred: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = find_first(&el.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

/// Counts descendant elements matching the predicate.
pub fn count_elements(nodes: &[Node], pred: &dyn Fn(&Element) -> bool) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Element(el) => usize::from(pred(el)) + count_elements(&el.children, pred),
            _ => 0,
        })
        .sum()
}

/// Detaches every element matching the predicate, subtree included.
pub fn remove_where(nodes: &mut Vec<Node>, pred: &dyn Fn(&Element) -> bool) {
    nodes.retain_mut(|node| match node {
        Node::Element(el) => {
            if pred(el) {
                return false;
            }
            remove_where(&mut el.children, pred);
            true
        }
        _ => true,
    });
}

/// Replaces every element matching the predicate by its own children,
/// preserving order. Applied bottom-up so unwrapping a parent re-examines
/// the children it exposes.
pub fn unwrap_where(nodes: &mut Vec<Node>, pred: &dyn Fn(&Element) -> bool) {
    let mut result = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        if let Node::Element(el) = &mut node {
            unwrap_where(&mut el.children, pred);
            if pred(el) {
                result.append(&mut el.children);
                continue;
            }
        }
        result.push(node);
    }
    *nodes = result;
}

/// Serializes a node sequence to HTML text.
///
/// Self-closing tags render as `<br>`; every other element renders with an
/// explicit open/close pair. Comments are skipped. Text and attribute
/// values are entity-escaped so a serialize/parse round trip is stable.
pub fn serialize_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(el) => write_element(out, el),
        Node::Text(text) => escape_text(out, text),
        Node::Comment(_) => {}
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(out, value);
        out.push('"');
    }
    out.push('>');

    if is_self_closing(&el.tag) {
        return;
    }

    for child in &el.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}

/// Safely truncate a string to at most `max_len` bytes at a character boundary
///
/// This function ensures we never slice in the middle of a multi-byte UTF-8
/// character. If `max_len` falls inside a character, the previous boundary
/// is used.
pub fn truncate_at_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }

    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
