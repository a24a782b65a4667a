//! Spine documents to cleaned [`Section`]s.

pub mod clean;

use std::collections::HashSet;

use log::{debug, warn};

pub use clean::{CleanedDocument, clean_markup, clean_markup_as, clean_plain_text};

use crate::book::{ManifestItem, Section, SkippedSection, Toc};
use crate::dom::Syntax;
use crate::epub::{Archive, Entry, Package};
use crate::error::{Error, Result};
use crate::pipeline::Deadline;
use crate::util::{decode_xml, resolve_href, split_fragment};

/// Sections loaded from a spine, plus the ones that failed to load.
#[derive(Debug, Default)]
pub struct LoadedSections {
    /// Non-empty sections in spine order.
    pub sections: Vec<Section>,
    pub skipped: Vec<SkippedSection>,
}

/// Load, clean and title every content document referenced by the spine.
///
/// A manifest item referenced twice is loaded once, at its first position.
/// Documents whose cleaned text is empty are dropped. A document that cannot
/// be read is recorded in [`LoadedSections::skipped`] without aborting the
/// others. Only an expired `deadline` fails the whole load.
pub fn load_sections(
    archive: &Archive,
    package: &Package,
    package_dir: &str,
    toc: &Toc,
    deadline: &Deadline,
) -> Result<LoadedSections> {
    let mut loaded = LoadedSections::default();
    let mut seen = HashSet::new();

    for (order, itemref) in package.spine.iter().enumerate() {
        deadline.check()?;

        let Some(item) = package.manifest.get(&itemref.idref) else {
            warn!("Spine references unknown manifest id {:?}", itemref.idref);
            loaded.skipped.push(SkippedSection {
                href: itemref.idref.clone(),
                reason: "spine entry has no manifest item".to_string(),
            });
            continue;
        };
        if !item.is_content_document() {
            debug!("Skipping non-content spine item {} ({})", item.id, item.media_type);
            continue;
        }
        if !seen.insert(item.id.as_str()) {
            debug!("Skipping repeated spine item {}", item.id);
            continue;
        }

        match load_section(archive, item, package_dir, order, toc) {
            Ok(Some(section)) => loaded.sections.push(section),
            Ok(None) => debug!("Dropping {}: no text after cleaning", item.href),
            Err(Error::SectionLoad { href, reason }) => {
                warn!("Skipping {href}: {reason}");
                loaded.skipped.push(SkippedSection { href, reason });
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "Loaded {} sections, skipped {}",
        loaded.sections.len(),
        loaded.skipped.len()
    );
    Ok(loaded)
}

/// Load and clean one manifest item.
///
/// Returns `Ok(None)` when the document has no text left after cleaning.
pub fn load_section(
    archive: &Archive,
    item: &ManifestItem,
    package_dir: &str,
    order: usize,
    toc: &Toc,
) -> Result<Option<Section>> {
    let (href, _) = split_fragment(&item.href);
    let path = resolve_href(package_dir, href);

    let bytes = match archive.entry(&path) {
        Entry::Found(bytes) => bytes,
        Entry::Unreadable(reason) => {
            return Err(Error::SectionLoad {
                href: item.href.clone(),
                reason: reason.to_string(),
            });
        }
        Entry::Missing => {
            return Err(Error::SectionLoad {
                href: item.href.clone(),
                reason: format!("{path} not found in archive"),
            });
        }
    };

    let text = decode_xml(bytes);
    if text.contains('\0') {
        return Err(Error::SectionLoad {
            href: item.href.clone(),
            reason: "binary data in content document".to_string(),
        });
    }

    let cleaned = if item.media_type.eq_ignore_ascii_case("text/plain") {
        clean_plain_text(&text)
    } else {
        clean_markup_as(&text, Syntax::for_media_type(&item.media_type, &text))
    };
    if cleaned.text.is_empty() {
        return Ok(None);
    }

    let title = toc
        .label_for(&path)
        .map(str::to_string)
        .or(cleaned.heading);

    Ok(Some(Section {
        id: item.id.clone(),
        title,
        content: cleaned.text,
        href: item.href.clone(),
        order,
    }))
}
