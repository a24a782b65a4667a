//! In-memory EPUB construction for integration tests and benchmarks.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const XHTML: &str = "application/xhtml+xml";

struct Item {
    id: String,
    href: String,
    media_type: String,
    properties: Option<String>,
}

/// Builds a minimal but valid EPUB 3 archive.
pub struct EpubBuilder {
    package_path: String,
    metadata: Vec<String>,
    items: Vec<Item>,
    spine: Vec<String>,
    spine_toc: Option<String>,
    files: Vec<(String, Vec<u8>)>,
    /// Files addressed relative to the package descriptor.
    package_files: Vec<(String, Vec<u8>)>,
    container: Option<String>,
    package_override: Option<String>,
}

impl Default for EpubBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self {
            package_path: "OEBPS/content.opf".to_string(),
            metadata: Vec::new(),
            items: Vec::new(),
            spine: Vec::new(),
            spine_toc: None,
            files: Vec::new(),
            package_files: Vec::new(),
            container: None,
            package_override: None,
        }
    }

    fn package_dir(&self) -> &str {
        match self.package_path.rfind('/') {
            Some(i) => &self.package_path[..=i],
            None => "",
        }
    }

    pub fn package_path(mut self, path: &str) -> Self {
        self.package_path = path.to_string();
        self
    }

    /// Raw Dublin Core element, e.g. `<dc:title>T</dc:title>`.
    pub fn metadata(mut self, element: &str) -> Self {
        self.metadata.push(element.to_string());
        self
    }

    pub fn title(self, title: &str) -> Self {
        self.metadata(&format!("<dc:title>{title}</dc:title>"))
    }

    pub fn author(self, author: &str) -> Self {
        self.metadata(&format!("<dc:creator>{author}</dc:creator>"))
    }

    pub fn language(self, language: &str) -> Self {
        self.metadata(&format!("<dc:language>{language}</dc:language>"))
    }

    /// Manifest item stored at `href` (relative to the package) without a
    /// spine reference.
    pub fn item(mut self, id: &str, href: &str, media_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.package_files.push((href.to_string(), body.into()));
        self.items.push(Item {
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type.to_string(),
            properties: None,
        });
        self
    }

    /// Manifest item whose file is absent from the archive.
    pub fn dangling_item(mut self, id: &str, href: &str) -> Self {
        self.items.push(Item {
            id: id.to_string(),
            href: href.to_string(),
            media_type: XHTML.to_string(),
            properties: None,
        });
        self
    }

    /// XHTML document added to both manifest and spine.
    pub fn section(self, id: &str, xhtml: &str) -> Self {
        self.item(id, &format!("{id}.xhtml"), XHTML, xhtml).spine_ref(id)
    }

    pub fn spine_ref(mut self, idref: &str) -> Self {
        self.spine.push(idref.to_string());
        self
    }

    /// EPUB 3 navigation document (manifest only, `properties="nav"`).
    pub fn nav(mut self, href: &str, xhtml: &str) -> Self {
        self = self.item("nav", href, XHTML, xhtml);
        if let Some(item) = self.items.last_mut() {
            item.properties = Some("nav".to_string());
        }
        self
    }

    /// EPUB 2 NCX referenced from the spine's `toc` attribute.
    pub fn ncx(mut self, href: &str, xml: &str) -> Self {
        self = self.item("ncx", href, "application/x-dtbncx+xml", xml);
        self.spine_toc = Some("ncx".to_string());
        self
    }

    /// Arbitrary archive entry at an absolute archive path.
    pub fn file(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.to_string(), body.into()));
        self
    }

    /// Replace the generated `META-INF/container.xml`.
    pub fn container_xml(mut self, xml: &str) -> Self {
        self.container = Some(xml.to_string());
        self
    }

    /// Replace the generated package descriptor.
    pub fn package_xml(mut self, xml: &str) -> Self {
        self.package_override = Some(xml.to_string());
        self
    }

    fn render_container(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
            self.package_path
        )
    }

    fn render_package(&self) -> String {
        let manifest: String = self
            .items
            .iter()
            .map(|item| {
                let properties = item
                    .properties
                    .as_ref()
                    .map(|p| format!(r#" properties="{p}""#))
                    .unwrap_or_default();
                format!(
                    r#"    <item id="{}" href="{}" media-type="{}"{properties}/>
"#,
                    item.id, item.href, item.media_type
                )
            })
            .collect();
        let spine: String = self
            .spine
            .iter()
            .map(|idref| format!("    <itemref idref=\"{idref}\"/>\n"))
            .collect();
        let toc = self
            .spine_toc
            .as_ref()
            .map(|id| format!(r#" toc="{id}""#))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    {}
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine{toc}>
{spine}  </spine>
</package>"#,
            self.metadata.join("\n    ")
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        let container = self.container.clone().unwrap_or_else(|| self.render_container());
        zip.start_file("META-INF/container.xml", deflated).unwrap();
        zip.write_all(container.as_bytes()).unwrap();

        let package = self
            .package_override
            .clone()
            .unwrap_or_else(|| self.render_package());
        zip.start_file(self.package_path.as_str(), deflated).unwrap();
        zip.write_all(package.as_bytes()).unwrap();

        for (path, body) in &self.files {
            zip.start_file(path.as_str(), deflated).unwrap();
            zip.write_all(body).unwrap();
        }
        for (href, body) in &self.package_files {
            zip.start_file(format!("{}{href}", self.package_dir()), deflated)
                .unwrap();
            zip.write_all(body).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}

/// XHTML document with an optional `<h1>` and one `<p>` per paragraph.
pub fn xhtml(heading: Option<&str>, paragraphs: &[String]) -> String {
    let heading = heading.map(|h| format!("<h1>{h}</h1>\n")).unwrap_or_default();
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>\n")).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>section</title></head>
<body>
{heading}{body}</body>
</html>"#
    )
}

/// `n` lower-case filler words with no narrative markers.
pub fn filler(n: usize) -> String {
    const WORDS: &[&str] = &["the", "river", "ran", "slow", "past", "old", "stone", "walls"];
    (0..n)
        .map(|i| WORDS[i % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dialogue-bearing prose of exactly `n` words (`n >= 4`).
pub fn dialogue(n: usize) -> String {
    format!("\"Come here,\" she said. {}", filler(n.saturating_sub(4)))
}

/// Nav document listing `(label, href)` pairs in a `toc` nav.
pub fn nav_document(entries: &[(&str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(label, href)| format!("<li><a href=\"{href}\">{label}</a></li>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Navigation</title></head>
<body>
<nav epub:type="toc" id="toc"><h1>Contents</h1><ol>
{items}</ol></nav>
</body>
</html>"#
    )
}
