//! Value types produced by a parse.
//!
//! Everything here is created once per parse and never mutated afterwards.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const UNKNOWN_LANGUAGE: &str = "und";

/// Book metadata (Dublin Core subset).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
    pub publisher: Option<String>,
    pub publication_date: Option<String>,
    pub description: Option<String>,
    pub identifier: Option<String>,
}

impl Default for BookMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            language: UNKNOWN_LANGUAGE.to_string(),
            publisher: None,
            publication_date: None,
            description: None,
            identifier: None,
        }
    }
}

/// A resource declared in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Path relative to the package descriptor's directory.
    pub href: String,
    pub media_type: String,
    pub properties: Vec<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    /// Whether this item holds narrative markup or text worth loading.
    ///
    /// Navigation documents and cover images are structural even when their
    /// media type is XHTML.
    pub fn is_content_document(&self) -> bool {
        let media_type = self.media_type.to_ascii_lowercase();
        let textual = media_type.contains("html")
            || media_type.contains("xml")
            || media_type == "text/plain";
        textual
            && media_type != "application/x-dtbncx+xml"
            && !self.has_property("nav")
            && !self.has_property("cover-image")
    }
}

/// Manifest keyed by item id.
pub type Manifest = HashMap<String, ManifestItem>;

/// An item in the reading order (spine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    /// Manifest id this entry refers to.
    pub idref: String,
    pub linear: bool,
}

/// Where the table of contents was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum TocSource {
    /// EPUB 3 navigation document.
    NavDocument,
    /// EPUB 2 NCX document.
    Ncx,
    /// Synthesized from the spine; labels carry no information.
    Spine,
}

/// A table of contents entry (hierarchical).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct TocEntry {
    pub id: String,
    pub label: String,
    /// Archive path of the target, fragment included.
    pub href: String,
    /// Nesting depth, 1 for top-level entries.
    pub level: usize,
    pub children: Vec<TocEntry>,
    /// Play order for sorting (from NCX playOrder attribute)
    pub play_order: Option<usize>,
}

impl TocEntry {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            label: label.into(),
            href: href.into(),
            level: 1,
            children: Vec::new(),
            play_order: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_child(mut self, mut child: TocEntry) -> Self {
        child.level = self.level + 1;
        self.children.push(child);
        self
    }

    /// Href without its fragment.
    pub fn target_path(&self) -> &str {
        crate::util::split_fragment(&self.href).0
    }
}

/// Recovered table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toc {
    pub source: TocSource,
    pub entries: Vec<TocEntry>,
}

impl Toc {
    /// Depth-first iterator over every entry in document order.
    pub fn iter(&self) -> impl Iterator<Item = &TocEntry> {
        let mut stack: Vec<&TocEntry> = self.entries.iter().rev().collect();
        std::iter::from_fn(move || {
            let entry = stack.pop()?;
            stack.extend(entry.children.iter().rev());
            Some(entry)
        })
    }

    /// Label of the first entry pointing at `path`, ignoring fragments.
    ///
    /// Synthesized tables never provide labels.
    pub fn label_for(&self, path: &str) -> Option<&str> {
        if self.source == TocSource::Spine {
            return None;
        }
        self.iter()
            .find(|entry| entry.target_path() == path)
            .map(|entry| entry.label.as_str())
            .filter(|label| !label.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One loaded and cleaned spine document, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Manifest id.
    pub id: String,
    /// Best-effort title: TOC label, then first heading.
    pub title: Option<String>,
    /// Plain text with paragraphs separated by blank lines.
    pub content: String,
    /// Manifest href (relative to the package descriptor).
    pub href: String,
    /// Spine position, 0-based.
    pub order: usize,
}

impl Section {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Title for display and audit, "Section N" when none was found.
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Section {}", self.order + 1),
        }
    }
}

/// A section that the classifier accepted as narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub content: String,
    pub href: String,
    pub order: usize,
}

/// A candidate the classifier rejected, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExcludedSection {
    pub title: String,
    pub reason: String,
}

impl std::fmt::Display for ExcludedSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.reason)
    }
}

/// Output of the chapter classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    /// Accepted chapters in spine order.
    pub chapters: Vec<Chapter>,
    pub excluded_sections: Vec<ExcludedSection>,
    pub total_sections: usize,
    pub chapter_count: usize,
    /// Whether the longest-sections fallback produced `chapters`.
    pub used_fallback: bool,
}

/// A spine document that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SkippedSection {
    pub href: String,
    pub reason: String,
}

/// Audit information returned next to the chapters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct ProcessingInfo {
    pub total_sections: usize,
    /// `"<title>: <reason>"` for every rejected candidate.
    pub excluded_sections: Vec<String>,
    pub chapter_count: usize,
    pub skipped_sections: Vec<SkippedSection>,
}

/// The complete result of parsing one book.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct ParsedBook {
    pub metadata: BookMetadata,
    pub chapters: Vec<Chapter>,
    pub processing_info: ProcessingInfo,
}
