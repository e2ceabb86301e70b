//! Fragment sanitization to a fixed, text-only vocabulary.
//!
//! [`sanitize_fragment`] reduces an arbitrary HTML fragment to the allowed
//! tag/attribute sets: structural and scripted markup is removed with its
//! subtree, links and unknown wrappers are unwrapped so their text
//! survives, every attribute outside the allowed set is stripped, and
//! elements left empty by those removals are collapsed. The function is
//! pure and idempotent; sanitizing its own output is a no-op.
//!
//! The pass structure mirrors the rest of the crate: a streaming
//! `lol_html` sweep for the removal steps, one post-order pass over the
//! owned tree for the structural fixed points, and regex cleanup on the
//! serialized result.

use regex::Regex;

use crate::dom::{Element, Fragment, Node, truncate_at_char_boundary};

/// Tags allowed to survive sanitization.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "span", "div",
    "h1", "h2", "h3", "h4", "h5", "h6",
    "ul", "ol", "li",
    "strong", "b", "em", "i", "u", "small", "del", "ins", "sub", "sup",
    "blockquote", "cite", "q",
    "pre", "code", "kbd", "samp", "var",
    "abbr", "dfn", "time",
    "dl", "dt", "dd",
    "article", "section", "aside",
    "header", "footer", "main",
    "table", "thead", "tbody", "tfoot", "tr", "th", "td", "caption",
    "br",
];

/// Attributes allowed on any surviving element.
pub const ALLOWED_ATTRIBUTES: &[&str] = &["lang", "dir"];

/// Tags the earlier vocabulary generation additionally allowed.
const LEGACY_EXTRA_TAGS: &[&str] = &["mark", "hr"];

/// Attributes the earlier vocabulary generation additionally allowed.
const LEGACY_EXTRA_ATTRIBUTES: &[&str] = &["id"];

/// Tags removed outright together with their entire subtree.
const REMOVED_TAGS: &[&str] = &[
    "script", "style", "link", "meta",
    "form", "input", "textarea", "select", "button", "label", "fieldset", "legend",
    "canvas", "map", "area",
    "base", "head", "title",
    "noscript", "template", "slot",
    "nav",
];

/// Media and embed tags, removed with their subtree.
const MEDIA_TAGS: &[&str] = &["img", "picture", "svg", "video", "audio", "iframe", "embed", "object"];

/// Configuration for fragment sanitization.
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Use the earlier vocabulary generation (`mark`/`hr` tags, `id`
    /// attribute) in addition to the canonical set.
    pub legacy: bool,
    /// Input-size cap applied before parsing, in bytes.
    pub max_input_bytes: usize,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self { legacy: false, max_input_bytes: 2 * 1024 * 1024 }
    }
}

impl SanitizeConfig {
    fn tag_allowed(&self, tag: &str) -> bool {
        ALLOWED_TAGS.contains(&tag) || (self.legacy && LEGACY_EXTRA_TAGS.contains(&tag))
    }

    fn attr_allowed(&self, name: &str) -> bool {
        ALLOWED_ATTRIBUTES.contains(&name) || (self.legacy && LEGACY_EXTRA_ATTRIBUTES.contains(&name))
    }

    fn allowed_tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        let legacy = self.legacy;
        ALLOWED_TAGS
            .iter()
            .copied()
            .chain(LEGACY_EXTRA_TAGS.iter().copied().filter(move |_| legacy))
    }
}

/// Sanitizes an HTML fragment with the default (strict) vocabulary.
///
/// Empty or whitespace-only input short-circuits to an empty string before
/// any parsing occurs.
///
/// # Example
///
/// ```rust
/// use legible_core::sanitize::sanitize_fragment;
///
/// let clean = sanitize_fragment(r#"<p>see <a href="http://x">here</a></p>"#);
/// assert_eq!(clean, "<p>see here</p>");
/// ```
pub fn sanitize_fragment(html: &str) -> String {
    sanitize_fragment_with(html, &SanitizeConfig::default())
}

/// Sanitizes an HTML fragment with an explicit configuration.
pub fn sanitize_fragment_with(html: &str, config: &SanitizeConfig) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let html = truncate_at_char_boundary(html, config.max_input_bytes);
    let swept = sweep_markup(html);

    let mut fragment = Fragment::parse_fragment(&swept);
    clean_nodes(&mut fragment.nodes, config);

    let serialized = fragment.to_html();
    let collapsed = collapse_whitespace(&serialized);

    collapse_empty_pairs(collapsed.trim(), config)
}

/// Streaming removal pass: comments, removed-tag subtrees, media subtrees,
/// and link unwrapping.
fn sweep_markup(html: &str) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("*", |el| {
                let tag = el.tag_name().to_ascii_lowercase();
                if REMOVED_TAGS.contains(&tag.as_str()) || MEDIA_TAGS.contains(&tag.as_str()) {
                    el.remove();
                } else if tag == "a" {
                    el.remove_and_keep_content();
                }
                Ok(())
            })],
            document_content_handlers: vec![lol_html::doc_comments!(|comment| {
                comment.remove();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    match rewriter.write(html.as_bytes()) {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    match rewriter.end() {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    if output.is_empty() { html.to_string() } else { output }
}

/// Post-order structural pass: re-applies the removal sets, unwraps
/// non-whitelisted elements, strips disallowed attributes, and removes
/// empty elements.
///
/// Children are cleaned before their parent is judged, so a removal that
/// empties a parent cascades upward and the whole pass reaches its fixed
/// point in one traversal.
fn clean_nodes(nodes: &mut Vec<Node>, config: &SanitizeConfig) {
    let mut result = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Element(mut el) => {
                if REMOVED_TAGS.contains(&el.tag.as_str()) || MEDIA_TAGS.contains(&el.tag.as_str()) {
                    continue;
                }

                clean_nodes(&mut el.children, config);

                if !config.tag_allowed(&el.tag) {
                    result.append(&mut el.children);
                    continue;
                }

                el.attrs.retain(|(name, _)| config.attr_allowed(name));

                if is_empty_element(&el) {
                    continue;
                }
                result.push(Node::Element(el));
            }
            Node::Text(text) => result.push(Node::Text(text)),
            Node::Comment(_) => {}
        }
    }
    *nodes = result;
}

/// An element is empty when, after its children have been cleaned, it has
/// no remaining element children and no non-whitespace text. `br` and `hr`
/// are never empty.
fn is_empty_element(el: &Element) -> bool {
    if matches!(el.tag.as_str(), "br" | "hr") {
        return false;
    }

    !el.children.iter().any(|child| match child {
        Node::Element(_) => true,
        Node::Text(text) => !text.trim().is_empty(),
        Node::Comment(_) => false,
    })
}

/// Collapse every whitespace run in the serialized output to a single space.
fn collapse_whitespace(html: &str) -> String {
    let re = Regex::new(r"\s+").unwrap();
    re.replace_all(html, " ").to_string()
}

/// Final syntactic pass: repeatedly drop `<tag></tag>` pairs with only
/// whitespace between, until a full pass over the vocabulary removes
/// nothing. Guards against pairs the tree-level pass cannot see once
/// whitespace collapsing has run.
fn collapse_empty_pairs(html: &str, config: &SanitizeConfig) -> String {
    let mut result = html.to_string();

    loop {
        let before = result.clone();

        for tag in config.allowed_tags() {
            if matches!(tag, "br" | "hr") {
                continue;
            }
            let re = Regex::new(&format!(r"<{tag}(?:\s[^>]*)?>\s*</{tag}>")).unwrap();
            result = re.replace_all(&result, "").to_string();
        }

        if result == before {
            break;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_input_short_circuits() {
        assert_eq!(sanitize_fragment(""), "");
        assert_eq!(sanitize_fragment("   \n\t "), "");
    }

    #[test]
    fn test_scripts_removed_with_content() {
        let html = r#"<p>before</p><script>alert("x");</script><p>after</p>"#;
        let result = sanitize_fragment(html);
        assert!(!result.contains("script"));
        assert!(!result.contains("alert"));
        assert!(result.contains("<p>before</p>"));
        assert!(result.contains("<p>after</p>"));
    }

    #[test]
    fn test_links_unwrapped() {
        let result = sanitize_fragment(r#"<p>see <a href="http://x">here</a></p>"#);
        assert_eq!(result, "<p>see here</p>");
    }

    #[test]
    fn test_media_removed_with_subtree() {
        let html = r#"<p>text</p><picture><img src="a.jpg"></picture><video><source src="v.mp4"></video>"#;
        let result = sanitize_fragment(html);
        assert_eq!(result, "<p>text</p>");
    }

    #[test]
    fn test_disallowed_wrapper_unwrapped_not_deleted() {
        let html = r#"<center><p>kept</p></center><font color="red">inline kept</font>"#;
        let result = sanitize_fragment(html);
        assert!(result.contains("<p>kept</p>"));
        assert!(result.contains("inline kept"));
        assert!(!result.contains("center"));
        assert!(!result.contains("font"));
    }

    #[test]
    fn test_attributes_stripped_to_allowed_set() {
        let html = r#"<p id="a" class="b" style="c" onclick="evil()" lang="en" dir="ltr">x</p>"#;
        let result = sanitize_fragment(html);
        assert_eq!(result, r#"<p lang="en" dir="ltr">x</p>"#);
    }

    #[test]
    fn test_comments_removed() {
        let result = sanitize_fragment("<p>a<!-- note -->b</p><!-- top level -->");
        assert_eq!(result, "<p>ab</p>");
    }

    #[test]
    fn test_empty_elements_collapsed_to_fixed_point() {
        let html = "<div><p></p><span>  </span></div><p>keep</p>";
        let result = sanitize_fragment(html);
        assert_eq!(result, "<p>keep</p>");
    }

    #[test]
    fn test_br_survives_empty_collapse() {
        let result = sanitize_fragment("<p>a<br></p><br>");
        assert!(result.contains("<br>"));
        // An element whose only content is a br also survives
        assert!(result.contains("<p>a<br></p>"));
    }

    #[test]
    fn test_hr_dropped_in_strict_kept_in_legacy() {
        assert_eq!(sanitize_fragment("<p>a</p><hr>"), "<p>a</p>");

        let legacy = SanitizeConfig { legacy: true, ..Default::default() };
        let result = sanitize_fragment_with("<p>a</p><hr>", &legacy);
        assert_eq!(result, "<p>a</p><hr>");
    }

    #[test]
    fn test_legacy_vocabulary_flag() {
        let html = r#"<mark id="m">hi</mark>"#;
        assert_eq!(sanitize_fragment(html), "hi");

        let legacy = SanitizeConfig { legacy: true, ..Default::default() };
        assert_eq!(sanitize_fragment_with(html, &legacy), r#"<mark id="m">hi</mark>"#);
    }

    #[test]
    fn test_whitespace_normalized() {
        let html = "<p>one\n\n   two\tthree</p>   <p>four</p>";
        let result = sanitize_fragment(html);
        assert_eq!(result, "<p>one two three</p> <p>four</p>");
    }

    #[rstest]
    #[case("<p>hello</p>")]
    #[case(r#"<div class="x"><p>hello</p></div>"#)]
    #[case(r#"<ul><li>a</li><li><a href="/b">b</a></li></ul>"#)]
    #[case("<article><h1>t</h1><p>b<br>c</p></article>")]
    #[case("<table><tr><td>cell</td></tr></table>")]
    #[case("plain text &amp; entities")]
    fn test_sanitize_idempotent(#[case] input: &str) {
        let once = sanitize_fragment(input);
        let twice = sanitize_fragment(&once);
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case("<nav><a href=\"/\">home</a></nav><p>x</p>", "<p>x</p>")]
    #[case("<form><input value=\"q\"><button>go</button></form><p>x</p>", "<p>x</p>")]
    #[case("<noscript>enable js</noscript><p>x</p>", "<p>x</p>")]
    fn test_structural_tags_removed(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_fragment(input), expected);
    }

    #[test]
    fn test_nested_disallowed_wrappers_fully_unwrapped() {
        let html = "<custom-a><custom-b><p>deep</p></custom-b></custom-a>";
        assert_eq!(sanitize_fragment(html), "<p>deep</p>");
    }

    #[test]
    fn test_unwrap_then_empty_cascade() {
        // Unwrapping the font exposes nothing; the emptied div must go too.
        let html = "<div><font> </font></div><p>x</p>";
        assert_eq!(sanitize_fragment(html), "<p>x</p>");
    }
}
