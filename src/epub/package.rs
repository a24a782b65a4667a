//! Package descriptor (OPF) parsing.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::xml::{attr, local_name, resolve_entity};
use crate::book::{BookMetadata, Manifest, ManifestItem, SpineItem};
use crate::error::{Error, Result};
use crate::util::{collapse_whitespace, truncate_to_date};

/// Parsed OPF package data.
#[derive(Debug, Clone)]
pub struct Package {
    pub metadata: BookMetadata,
    pub manifest: Manifest,
    pub spine: Vec<SpineItem>,
    /// Manifest id named by the spine's `toc` attribute (EPUB 2 NCX).
    pub ncx_id: Option<String>,
}

impl Package {
    /// First manifest item flagged as the EPUB 3 navigation document.
    ///
    /// Items are compared by id so the choice does not depend on map order.
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest
            .values()
            .filter(|item| item.has_property("nav"))
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        self.ncx_id.as_ref().and_then(|id| self.manifest.get(id))
    }
}

#[derive(Default)]
struct MetadataFields {
    title: Option<String>,
    creators: Vec<String>,
    language: Option<String>,
    identifier: Option<String>,
    publisher: Option<String>,
    description: Option<String>,
    date: Option<String>,
}

impl MetadataFields {
    fn set(&mut self, element: &str, value: String) {
        if value.is_empty() {
            return;
        }
        let slot = match element {
            "title" => &mut self.title,
            "creator" => {
                self.creators.push(value);
                return;
            }
            "language" => &mut self.language,
            "identifier" => &mut self.identifier,
            "publisher" => &mut self.publisher,
            "description" => &mut self.description,
            "date" => &mut self.date,
            _ => return,
        };
        // The first occurrence is the primary one.
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn into_metadata(self) -> BookMetadata {
        let defaults = BookMetadata::default();
        BookMetadata {
            title: self.title.unwrap_or(defaults.title),
            author: if self.creators.is_empty() {
                defaults.author
            } else {
                self.creators.join(", ")
            },
            language: self.language.unwrap_or(defaults.language),
            publisher: self.publisher,
            publication_date: self.date.map(|d| truncate_to_date(&d)),
            description: self.description,
            identifier: self.identifier,
        }
    }
}

/// Parse OPF package document.
///
/// Elements are matched by local name, so `dc:title`, `opf:item` and
/// unprefixed forms are all accepted.
pub fn parse_package(content: &str) -> Result<Package> {
    // Text is whitespace-collapsed per field, so entity boundaries must keep
    // their surrounding spaces.
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut fields = MetadataFields::default();
    let mut manifest = Manifest::new();
    let mut spine = Vec::new();
    let mut ncx_id = None;

    let mut seen_metadata = false;
    let mut seen_manifest = false;
    let mut seen_spine = false;

    let mut in_metadata = false;
    let mut current_element: Option<String> = None;
    let mut buf_text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::InvalidPackageDescriptor(e.to_string()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"metadata" => {
                        seen_metadata = true;
                        in_metadata = !is_empty;
                    }
                    b"manifest" => seen_manifest = true,
                    b"spine" => {
                        seen_spine = true;
                        ncx_id = attr(e, b"toc").filter(|id| !id.is_empty());
                    }
                    b"item" => {
                        if let Some(item) = manifest_item(e) {
                            manifest.insert(item.id.clone(), item);
                        }
                    }
                    b"itemref" => {
                        if let Some(idref) = attr(e, b"idref") {
                            spine.push(SpineItem {
                                idref,
                                linear: attr(e, b"linear").as_deref() != Some("no"),
                            });
                        }
                    }
                    local if in_metadata && !is_empty => {
                        current_element = Some(String::from_utf8_lossy(local).into_owned());
                        buf_text.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"metadata" {
                    in_metadata = false;
                }

                if let Some(elem) = current_element.take_if(|elem| elem.as_bytes() == local) {
                    fields.set(&elem, collapse_whitespace(&buf_text));
                    buf_text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_metadata {
        return Err(Error::InvalidPackageDescriptor(
            "missing <metadata> element".into(),
        ));
    }
    if !seen_manifest {
        return Err(Error::InvalidPackageDescriptor(
            "missing <manifest> element".into(),
        ));
    }
    if !seen_spine {
        return Err(Error::InvalidPackageDescriptor(
            "missing <spine> element".into(),
        ));
    }

    Ok(Package {
        metadata: fields.into_metadata(),
        manifest,
        spine,
        ncx_id,
    })
}

fn manifest_item(e: &BytesStart<'_>) -> Option<ManifestItem> {
    let id = attr(e, b"id").filter(|id| !id.is_empty())?;
    Some(ManifestItem {
        id,
        href: attr(e, b"href").unwrap_or_default(),
        media_type: attr(e, b"media-type").unwrap_or_default(),
        properties: attr(e, b"properties")
            .map(|props| props.split_ascii_whitespace().map(String::from).collect())
            .unwrap_or_default(),
    })
}
