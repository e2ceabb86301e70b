//! Main-content extraction from full pages.
//!
//! [`extract_page`] takes a whole HTML document and returns a best-guess
//! title plus the inner HTML of the best-guess article subtree. It is a
//! total function: malformed, hostile, or empty input degrades to emptier
//! output, never an error.
//!
//! The selection is rule-based rather than scored: strip boilerplate,
//! prefer semantic containers, fall back to a paragraph/link-density scan
//! over `div`s, then to the document body.

use crate::dom::{self, Element, Fragment, Node, truncate_at_char_boundary};

/// Substrings that mark an element as boilerplate when found in its tag
/// name or `class`/`id` attribute value.
const BOILERPLATE_SUBSTRINGS: &[&str] = &[
    "sidebar", "footer", "menu", "ad", "ads", "advertisement", "sponsored",
    "social", "share", "comments", "related", "popular", "trending",
    "cookie", "consent", "search-form",
];

/// Tags removed outright, with no sheltered-content exception.
const INTERACTIVE_TAGS: &[&str] = &["nav", "aside", "form", "button", "input", "select", "textarea"];

/// Class tokens treated as interactive-control styling.
const INTERACTIVE_CLASSES: &[&str] = &["form", "button", "btn"];

/// Configuration for content extraction.
///
/// The thresholds were tuned empirically against real article pages; they
/// are fields rather than literals so callers can adjust them.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum number of `p` descendants for the div fallback scan.
    pub min_paragraphs: usize,
    /// Upper bound (exclusive) on `links / (paragraphs + 1)` for the div
    /// fallback scan.
    pub max_link_density: f64,
    /// Input-size cap applied before parsing, in bytes.
    pub max_input_bytes: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { min_paragraphs: 3, max_link_density: 0.3, max_input_bytes: 2 * 1024 * 1024 }
    }
}

/// The result of content extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Best-guess page title; empty if none was found.
    pub title: String,
    /// Inner HTML of the selected content subtree, trimmed.
    pub content: String,
}

/// Extracts the title and main content from a full HTML document.
///
/// # Example
///
/// ```rust
/// use legible_core::extract::{ExtractConfig, extract_page};
///
/// let html = "<html><body><nav>menu</nav><article><h1>T</h1><p>Body</p></article></body></html>";
/// let page = extract_page(html, &ExtractConfig::default());
/// assert_eq!(page.title, "T");
/// assert_eq!(page.content, "<h1>T</h1><p>Body</p>");
/// ```
pub fn extract_page(html: &str, config: &ExtractConfig) -> ExtractedPage {
    if html.trim().is_empty() {
        return ExtractedPage::default();
    }

    let html = truncate_at_char_boundary(html, config.max_input_bytes);
    let mut doc = Fragment::parse_document(html);

    // The title chain may read from <head>, which boilerplate stripping
    // can remove, so it runs on the pristine tree.
    let title = extract_title(&doc);

    strip_boilerplate(&mut doc.nodes);

    let mut content = locate_main_content(&doc, config);
    strip_classes(&mut content);
    collapse_empty_nodes(&mut content);
    collapse_wrapper_divs(&mut content);

    let content = dom::serialize_nodes(&content).trim().to_string();
    ExtractedPage { title, content }
}

/// Title priority chain: `og:title` meta, `title` meta, first `h1`,
/// `<title>` element, empty string. First match wins; the winner is
/// trimmed.
fn extract_title(doc: &Fragment) -> String {
    if let Some(meta) =
        dom::find_first(&doc.nodes, &|el| el.tag == "meta" && el.attr("property") == Some("og:title"))
        && let Some(content) = meta.attr("content")
    {
        return content.trim().to_string();
    }

    if let Some(meta) = dom::find_first(&doc.nodes, &|el| el.tag == "meta" && el.attr("name") == Some("title"))
        && let Some(content) = meta.attr("content")
    {
        return content.trim().to_string();
    }

    if let Some(h1) = dom::find_first(&doc.nodes, &|el| el.tag == "h1") {
        return h1.text().trim().to_string();
    }

    if let Some(title) = dom::find_first(&doc.nodes, &|el| el.tag == "title") {
        return title.text().trim().to_string();
    }

    String::new()
}

/// Removes navigation, interactive controls, and denylisted containers
/// anywhere in the tree.
///
/// A container matched only by the substring denylist is spared when it
/// holds an `article` or `main` descendant, so a styled wrapper around
/// real content is never eaten. Protection depends only on the subtree,
/// which makes the mark-then-prune query a single recursive pass.
fn strip_boilerplate(nodes: &mut Vec<Node>) {
    nodes.retain_mut(|node| {
        let Node::Element(el) = node else {
            return true;
        };

        if is_interactive(el) {
            return false;
        }
        if matches_boilerplate(el) && !shelters_content(el) {
            return false;
        }

        strip_boilerplate(&mut el.children);
        true
    });
}

fn is_interactive(el: &Element) -> bool {
    INTERACTIVE_TAGS.contains(&el.tag.as_str())
        || INTERACTIVE_CLASSES.iter().any(|class| el.has_class_token(class))
}

fn matches_boilerplate(el: &Element) -> bool {
    BOILERPLATE_SUBSTRINGS.iter().any(|needle| {
        el.tag.contains(needle)
            || el.attr("class").is_some_and(|value| value.contains(needle))
            || el.attr("id").is_some_and(|value| value.contains(needle))
    })
}

fn shelters_content(el: &Element) -> bool {
    el.has_descendant(&|descendant| matches!(descendant.tag.as_str(), "article" | "main"))
}

/// Picks the content subtree and returns a copy of its children.
///
/// Priority: semantic containers, then the first `div` that reads like an
/// article body (enough paragraphs, low link density), then
/// `body`/`.wrapper`/`.main`/`.container`, then the whole document.
fn locate_main_content(doc: &Fragment, config: &ExtractConfig) -> Vec<Node> {
    if let Some(el) = dom::find_first(&doc.nodes, &is_semantic_container) {
        return el.children.clone();
    }

    if let Some(el) = dom::find_first(&doc.nodes, &|el| el.tag == "div" && is_article_like(el, config)) {
        return el.children.clone();
    }

    if let Some(el) = dom::find_first(&doc.nodes, &|el| {
        el.tag == "body"
            || el.has_class_token("wrapper")
            || el.has_class_token("main")
            || el.has_class_token("container")
    }) {
        return el.children.clone();
    }

    doc.nodes.clone()
}

fn is_semantic_container(el: &Element) -> bool {
    matches!(el.tag.as_str(), "article" | "main")
        || el.has_class_token("article")
        || el.has_class_token("content")
        || el.has_class_token("post")
        || el.has_class_token("entry")
        || el.attr("role") == Some("main")
}

/// Link density is `a` descendants over `p` descendants plus one; article
/// bodies sit well below link-heavy navigation blocks on this ratio.
fn is_article_like(el: &Element, config: &ExtractConfig) -> bool {
    let paragraphs = dom::count_elements(&el.children, &|d| d.tag == "p");
    if paragraphs < config.min_paragraphs {
        return false;
    }

    let links = dom::count_elements(&el.children, &|d| d.tag == "a");
    (links as f64) / (paragraphs as f64 + 1.0) < config.max_link_density
}

/// Presentation hints are never meaningful downstream.
fn strip_classes(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            el.remove_attr("class");
            strip_classes(&mut el.children);
        }
    }
}

/// Removes elements with no rendered text and no self-closing descendant.
///
/// Post-order: children are collapsed first, so a removal that empties the
/// parent cascades upward within the same pass. `br`/`hr`/`img` count as
/// content here; the sanitizer applies its own stricter rule later.
fn collapse_empty_nodes(nodes: &mut Vec<Node>) {
    nodes.retain_mut(|node| {
        let Node::Element(el) = node else {
            return true;
        };

        if dom::is_self_closing(&el.tag) {
            return true;
        }

        collapse_empty_nodes(&mut el.children);
        el.children.iter().any(|child| match child {
            Node::Element(_) => true,
            Node::Text(text) => !text.trim().is_empty(),
            Node::Comment(_) => false,
        })
    });
}

/// Replaces a `div` whose only element child is another `div` (and whose
/// own text is all whitespace) by that inner `div`, flattening wrapper
/// chains one level at a time until none remain.
fn collapse_wrapper_divs(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            collapse_wrapper_divs(&mut el.children);
            while let Some(inner) = wrapped_div(el) {
                *el = inner;
            }
        }
    }
}

fn wrapped_div(el: &Element) -> Option<Element> {
    if el.tag != "div" {
        return None;
    }

    let mut element_children = el.children.iter().filter_map(|child| match child {
        Node::Element(inner) => Some(inner),
        _ => None,
    });
    let first = element_children.next()?;
    if first.tag != "div" || element_children.next().is_some() {
        return None;
    }

    let text_all_blank = el.children.iter().all(|child| match child {
        Node::Text(text) => text.trim().is_empty(),
        _ => true,
    });
    if !text_all_blank {
        return None;
    }

    Some(first.clone())
}
