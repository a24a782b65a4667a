//! Lenient markup parsing into an index-linked tree.
//!
//! HTML goes through html5ever and XHTML through xml5ever. Both drive the
//! same [`DomSink`], so everything downstream sees one tree shape.

mod sink;
mod tree;

pub use sink::DomSink;
pub use tree::{Dom, Node, NodeId, NodeKind};

use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;
use xml5ever::driver::XmlParseOpts;

/// Which tree builder a document needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Html,
    /// XML rules: `<title/>` and `<script/>` close themselves.
    Xhtml,
}

impl Syntax {
    /// XHTML when the document opens with an XML declaration.
    pub fn sniff(markup: &str) -> Self {
        if markup
            .trim_start_matches('\u{feff}')
            .trim_start()
            .starts_with("<?xml")
        {
            Syntax::Xhtml
        } else {
            Syntax::Html
        }
    }

    /// XHTML for `application/xhtml+xml` manifest items, otherwise sniffed.
    pub fn for_media_type(media_type: &str, markup: &str) -> Self {
        if media_type.trim().eq_ignore_ascii_case("application/xhtml+xml") {
            Syntax::Xhtml
        } else {
            Self::sniff(markup)
        }
    }
}

/// Parse a document with the tree builder `syntax` calls for. Never fails.
pub fn parse_markup(markup: &str, syntax: Syntax) -> Dom {
    match syntax {
        Syntax::Html => parse_html(markup),
        Syntax::Xhtml => parse_xhtml(markup),
    }
}

/// Parse an HTML document. Broken markup is repaired the way browsers
/// repair it.
pub fn parse_html(html: &str) -> Dom {
    html5ever::parse_document(DomSink::default(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse an XHTML document. xml5ever recovers from unbalanced tags rather
/// than rejecting the document.
pub fn parse_xhtml(xml: &str) -> Dom {
    xml5ever::driver::parse_document(DomSink::default(), XmlParseOpts::default())
        .from_utf8()
        .one(xml.as_bytes())
        .into_dom()
}
