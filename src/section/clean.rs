//! Markup to narrative plain text.
//!
//! Cleaning is two passes over the parsed tree: [`prune`] unlinks every
//! subtree that cannot carry narrative, then [`extract_text`] flattens what
//! remains, turning block boundaries into paragraph breaks.

use crate::dom::{Dom, NodeId, NodeKind, Syntax, parse_markup};
use crate::util::collapse_whitespace;

/// Separator between paragraphs in cleaned text.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Elements removed together with their content.
const REMOVED_TAGS: &[&str] = &[
    // document chrome
    "head", "title", "nav", "aside", "template", "noscript",
    // scripting and styling
    "script", "style", "link", "meta",
    // media
    "img", "picture", "figure", "svg", "math", "video", "audio", "source", "track", "canvas",
    "iframe", "object", "embed", "map", "area",
    // forms
    "form", "input", "button", "select", "option", "optgroup", "textarea", "fieldset",
    "legend", "label", "datalist", "output",
    // tables
    "table",
];

/// ARIA roles that mark navigation or page furniture.
const REMOVED_ROLES: &[&str] = &[
    "navigation",
    "banner",
    "contentinfo",
    "complementary",
    "doc-toc",
    "doc-pagebreak",
    "doc-pagelist",
    "doc-noteref",
];

/// `epub:type` values that mark navigation or page furniture.
const REMOVED_EPUB_TYPES: &[&str] = &[
    "toc",
    "landmarks",
    "page-list",
    "pagebreak",
    "noteref",
    "footnote",
    "endnote",
    "rearnote",
];

/// Elements whose boundaries end a paragraph.
const BLOCK_TAGS: &[&str] = &[
    "html", "body", "main", "article", "section", "div", "p", "blockquote", "pre", "address",
    "header", "footer", "hgroup", "details", "summary", "center", "h1", "h2", "h3", "h4", "h5",
    "h6", "ul", "ol", "li", "dl", "dt", "dd", "figcaption", "caption", "hr",
];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// A content document reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedDocument {
    /// Paragraphs separated by [`PARAGRAPH_BREAK`].
    pub text: String,
    /// Text of the first surviving heading element.
    pub heading: Option<String>,
}

/// Parse, prune and flatten an (X)HTML document, choosing the parser from
/// its XML declaration.
pub fn clean_markup(markup: &str) -> CleanedDocument {
    clean_markup_as(markup, Syntax::sniff(markup))
}

/// Like [`clean_markup`] with the parser chosen by the caller.
pub fn clean_markup_as(markup: &str, syntax: Syntax) -> CleanedDocument {
    let mut dom = parse_markup(markup, syntax);
    prune(&mut dom);

    let root = dom.root();
    let heading = dom
        .find(root, |id| HEADING_TAGS.iter().any(|tag| dom.is_tag(id, tag)))
        .map(|id| collapse_whitespace(&dom.text_content(id)))
        .filter(|text| !text.is_empty());

    CleanedDocument {
        text: extract_text(&dom),
        heading,
    }
}

/// Plain-text content files: blank-line separated blocks become paragraphs.
pub fn clean_plain_text(text: &str) -> CleanedDocument {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut paragraphs, &mut current);
        } else {
            current.push(' ');
            current.push_str(line);
        }
    }
    push_paragraph(&mut paragraphs, &mut current);

    CleanedDocument {
        text: paragraphs.join(PARAGRAPH_BREAK),
        heading: None,
    }
}

/// Whether an element is dropped with its whole subtree.
pub fn is_removed(dom: &Dom, id: NodeId) -> bool {
    let Some(tag) = dom.tag(id) else {
        return false;
    };
    REMOVED_TAGS.contains(&tag)
        || REMOVED_ROLES
            .iter()
            .any(|role| dom.has_token(id, "role", role))
        || REMOVED_EPUB_TYPES
            .iter()
            .any(|epub_type| dom.has_token(id, "epub:type", epub_type))
}

/// Unlink every removable subtree.
pub fn prune(dom: &mut Dom) {
    let doomed: Vec<NodeId> = {
        let dom: &Dom = dom;
        let mut doomed = Vec::new();
        let mut stack = vec![dom.root()];
        while let Some(id) = stack.pop() {
            if is_removed(dom, id) {
                // Descendants go with it; no need to look further down.
                doomed.push(id);
                continue;
            }
            stack.extend(dom.children(id));
        }
        doomed
    };

    for id in doomed {
        dom.detach(id);
    }
}

fn is_block(dom: &Dom, id: NodeId) -> bool {
    dom.tag(id).is_some_and(|tag| BLOCK_TAGS.contains(&tag))
}

enum Visit {
    Enter(NodeId),
    Exit(NodeId),
}

/// Flatten the tree into paragraphs.
///
/// Whitespace inside a paragraph collapses to single spaces; empty paragraphs
/// vanish, so there is never more than one blank line in a row.
pub fn extract_text(dom: &Dom) -> String {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut stack = vec![Visit::Enter(dom.root())];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id) => {
                let Some(node) = dom.node(id) else { continue };
                match &node.kind {
                    NodeKind::Text(text) => current.push_str(text),
                    NodeKind::Element { .. } | NodeKind::Root => {
                        // An unclosed <br> in XHTML swallows what follows it.
                        if dom.is_tag(id, "br") {
                            current.push(' ');
                        }
                        let block = is_block(dom, id);
                        if block {
                            push_paragraph(&mut paragraphs, &mut current);
                            stack.push(Visit::Exit(id));
                        }
                        let mut children: Vec<_> = dom.children(id).collect();
                        children.reverse();
                        stack.extend(children.into_iter().map(Visit::Enter));
                    }
                    NodeKind::Other => {}
                }
            }
            Visit::Exit(_) => push_paragraph(&mut paragraphs, &mut current),
        }
    }
    push_paragraph(&mut paragraphs, &mut current);

    paragraphs.join(PARAGRAPH_BREAK)
}

fn push_paragraph(paragraphs: &mut Vec<String>, current: &mut String) {
    let paragraph = collapse_whitespace(current);
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
    current.clear();
}
