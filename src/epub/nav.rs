//! Table of contents recovery.
//!
//! Three strategies, tried in order: the EPUB 3 navigation document, the
//! EPUB 2 NCX, and finally one flat entry per spine item. Resolution never
//! fails; a broken navigation document just falls through to the next
//! strategy.

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::archive::Archive;
use super::package::Package;
use super::xml::{attr, local_name, resolve_entity};
use crate::book::{Toc, TocEntry, TocSource};
use crate::dom::{Dom, NodeId, Syntax, parse_markup};
use crate::util::{collapse_whitespace, parent_dir, resolve_href};

/// Recover the table of contents for a package.
///
/// `package_dir` is the package descriptor's directory (with trailing slash);
/// manifest hrefs are resolved against it. Entry hrefs in the result are
/// archive paths.
pub fn resolve_toc(archive: &Archive, package: &Package, package_dir: &str) -> Toc {
    if let Some(item) = package.nav_item() {
        let path = resolve_href(package_dir, &item.href);
        match archive.read_text(&path) {
            Some(content) => {
                let syntax = Syntax::for_media_type(&item.media_type, &content);
                let entries = parse_nav_document_as(&content, syntax, parent_dir(&path));
                if !entries.is_empty() {
                    debug!("TOC from navigation document {path}: {} roots", entries.len());
                    return Toc {
                        source: TocSource::NavDocument,
                        entries,
                    };
                }
                debug!("Navigation document {path} has no usable toc");
            }
            None => warn!("Navigation document {path} is missing from the archive"),
        }
    }

    if let Some(item) = package.ncx_item() {
        let path = resolve_href(package_dir, &item.href);
        match archive.read_text(&path) {
            Some(content) => match parse_ncx(&content, parent_dir(&path)) {
                Ok(entries) if !entries.is_empty() => {
                    debug!("TOC from NCX {path}: {} roots", entries.len());
                    return Toc {
                        source: TocSource::Ncx,
                        entries,
                    };
                }
                Ok(_) => debug!("NCX {path} has no navPoints"),
                Err(e) => warn!("Ignoring malformed NCX {path}: {e}"),
            },
            None => warn!("NCX {path} is missing from the archive"),
        }
    }

    debug!("No navigation metadata; synthesizing TOC from spine");
    Toc {
        source: TocSource::Spine,
        entries: spine_toc(package, package_dir),
    }
}

/// One top-level entry per resolvable spine item, labelled by position.
pub fn spine_toc(package: &Package, package_dir: &str) -> Vec<TocEntry> {
    package
        .spine
        .iter()
        .enumerate()
        .filter_map(|(i, itemref)| {
            let item = package.manifest.get(&itemref.idref)?;
            Some(
                TocEntry::new(format!("Chapter {}", i + 1), resolve_href(package_dir, &item.href))
                    .with_id(item.id.clone()),
            )
        })
        .collect()
}

// ----------------------------------------------------------------------------
// EPUB 3 navigation document
// ----------------------------------------------------------------------------

/// Parse the `toc` nav of an XHTML navigation document.
///
/// `base_dir` is the navigation document's own directory; its hrefs are
/// relative to it.
pub fn parse_nav_document(content: &str, base_dir: &str) -> Vec<TocEntry> {
    parse_nav_document_as(content, Syntax::sniff(content), base_dir)
}

fn parse_nav_document_as(content: &str, syntax: Syntax, base_dir: &str) -> Vec<TocEntry> {
    let dom = parse_markup(content, syntax);
    let root = dom.root();

    let navs: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| dom.is_tag(id, "nav"))
        .collect();

    let toc_nav = navs
        .iter()
        .copied()
        .find(|&id| dom.has_token(id, "epub:type", "toc") || dom.has_token(id, "role", "doc-toc"))
        .or_else(|| {
            navs.iter().copied().find(|&id| {
                !dom.has_token(id, "epub:type", "landmarks")
                    && !dom.has_token(id, "epub:type", "page-list")
            })
        });

    let Some(nav) = toc_nav else {
        return Vec::new();
    };

    let Some(list) = dom.find(nav, |id| dom.is_tag(id, "ol") || dom.is_tag(id, "ul")) else {
        return Vec::new();
    };

    let mut walker = NavWalker {
        dom: &dom,
        base_dir,
        counter: 0,
    };
    walker.list(list, 1)
}

struct NavWalker<'a> {
    dom: &'a Dom,
    base_dir: &'a str,
    counter: usize,
}

impl NavWalker<'_> {
    fn list(&mut self, list: NodeId, level: usize) -> Vec<TocEntry> {
        let items: Vec<_> = self
            .dom
            .children(list)
            .filter(|&id| self.dom.is_tag(id, "li"))
            .collect();

        let mut entries = Vec::new();
        for li in items {
            entries.extend(self.item(li, level));
        }
        entries
    }

    /// One `<li>`; returns its children directly when it has no label.
    fn item(&mut self, li: NodeId, level: usize) -> Vec<TocEntry> {
        let dom = self.dom;
        let mut label = String::new();
        let mut href = String::new();
        let mut id = dom.attr(li, "id").map(str::to_string);
        let mut children = Vec::new();

        for child in dom.children(li) {
            if dom.is_tag(child, "a") || dom.is_tag(child, "span") {
                if label.is_empty() {
                    label = collapse_whitespace(&dom.text_content(child));
                    if let Some(target) = dom.attr(child, "href") {
                        href = resolve_href(self.base_dir, target);
                    }
                    if let Some(anchor_id) = dom.attr(child, "id") {
                        id = Some(anchor_id.to_string());
                    }
                }
            } else if dom.is_tag(child, "ol") || dom.is_tag(child, "ul") {
                children.extend(self.list(child, level + 1));
            }
        }

        if label.is_empty() && href.is_empty() {
            return children;
        }

        self.counter += 1;
        vec![TocEntry {
            id: id.unwrap_or_else(|| format!("nav-{}", self.counter)),
            label,
            href,
            level,
            children,
            play_order: None,
        }]
    }
}

// ----------------------------------------------------------------------------
// EPUB 2 NCX
// ----------------------------------------------------------------------------

/// Parse NCX table of contents.
///
/// `base_dir` is the NCX's own directory; `content/@src` is relative to it.
pub fn parse_ncx(content: &str, base_dir: &str) -> Result<Vec<TocEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    struct NavPointState {
        id: String,
        children: Vec<TocEntry>,
        text: Option<String>,
        src: Option<String>,
        play_order: Option<usize>,
    }

    let mut stack: Vec<NavPointState> = vec![NavPointState {
        id: String::new(),
        children: Vec::new(),
        text: None,
        src: None,
        play_order: None,
    }];
    let mut in_label = false;
    let mut in_text = false;

    fn set_src(stack: &mut [NavPointState], e: &BytesStart<'_>) {
        if let Some(state) = stack.last_mut()
            && state.src.is_none()
        {
            state.src = attr(e, b"src");
        }
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"navPoint" => stack.push(NavPointState {
                    id: attr(&e, b"id").unwrap_or_default(),
                    children: Vec::new(),
                    text: None,
                    src: None,
                    play_order: attr(&e, b"playOrder").and_then(|s| s.trim().parse().ok()),
                }),
                b"navLabel" => in_label = true,
                b"text" => in_text = in_label,
                b"content" => set_src(&mut stack, &e),
                _ => {}
            },
            Event::Empty(e) => {
                if local_name(e.name().as_ref()) == b"content" {
                    set_src(&mut stack, &e);
                }
            }
            Event::Text(e) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    state.text.get_or_insert_with(String::new).push_str(&raw);
                }
            }
            Event::GeneralRef(e) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        state.text.get_or_insert_with(String::new).push_str(&resolved);
                    }
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navLabel" => in_label = false,
                b"navPoint" if stack.len() > 1 => {
                    let Some(state) = stack.pop() else { break };
                    let level = stack.len();
                    let Some(parent) = stack.last_mut() else { break };

                    let label = state.text.as_deref().map(collapse_whitespace).unwrap_or_default();
                    match state.src {
                        Some(src) => parent.children.push(TocEntry {
                            id: state.id,
                            label,
                            href: resolve_href(base_dir, &src),
                            level,
                            children: state.children,
                            play_order: state.play_order,
                        }),
                        // A navPoint without a target only groups its children.
                        None => parent.children.extend(state.children),
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(stack.into_iter().next().map(|s| s.children).unwrap_or_default())
}
