//! Archive, container and package descriptor failures, end to end.

mod common;

use std::io::Write;

use chapterize::{Error, parse_epub, parse_epub_file};
use common::{EpubBuilder, XHTML, dialogue, filler, xhtml};
use tempfile::NamedTempFile;

fn one_chapter_book() -> EpubBuilder {
    EpubBuilder::new()
        .title("Test Book")
        .author("Test Author")
        .language("en")
        .section("ch1", &xhtml(Some("Chapter 1"), &[dialogue(300)]))
}

// ============================================================================
// Fatal structure errors
// ============================================================================

#[test]
fn test_not_a_zip() {
    let err = parse_epub(b"This is plain text, not an archive.").unwrap_err();
    assert!(matches!(err, Error::MalformedArchive(_)));
    assert!(err.is_fatal());
    assert_eq!(err.user_message(), "not a valid e-book archive");
}

#[test]
fn test_empty_input() {
    let err = parse_epub(&[]).unwrap_err();
    assert!(matches!(err, Error::MalformedArchive(_)));
}

#[test]
fn test_missing_container() {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("mimetype", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let err = parse_epub(&bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidContainer(_)));
    assert_eq!(err.user_message(), "e-book archive is structurally invalid");
}

#[test]
fn test_container_without_rootfile() {
    let bytes = one_chapter_book()
        .container_xml(
            r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles/>
</container>"#,
        )
        .build();

    assert!(matches!(parse_epub(&bytes), Err(Error::InvalidContainer(_))));
}

#[test]
fn test_container_points_at_missing_package() {
    let bytes = one_chapter_book()
        .container_xml(
            r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/missing.opf"/></rootfiles>
</container>"#,
        )
        .build();

    let err = parse_epub(&bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidPackageDescriptor(_)));
    assert!(err.to_string().contains("OEBPS/missing.opf"));
}

#[test]
fn test_package_without_manifest() {
    let bytes = one_chapter_book()
        .package_xml(
            r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>T</dc:title></metadata>
  <spine><itemref idref="ch1"/></spine>
</package>"#,
        )
        .build();

    assert!(matches!(
        parse_epub(&bytes),
        Err(Error::InvalidPackageDescriptor(_))
    ));
}

#[test]
fn test_package_not_xml() {
    let bytes = one_chapter_book()
        .package_xml("<package><metadata></manifest>")
        .build();

    assert!(matches!(
        parse_epub(&bytes),
        Err(Error::InvalidPackageDescriptor(_))
    ));
}

// ============================================================================
// Recoverable problems
// ============================================================================

#[test]
fn test_missing_section_file_is_skipped() {
    let bytes = one_chapter_book()
        .dangling_item("ghost", "ghost.xhtml")
        .spine_ref("ghost")
        .section("ch2", &xhtml(Some("Chapter 2"), &[filler(300)]))
        .build();

    let book = parse_epub(&bytes).unwrap();

    let ids: Vec<_> = book.chapters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["ch1", "ch2"]);
    assert_eq!(book.processing_info.skipped_sections.len(), 1);
    assert_eq!(book.processing_info.skipped_sections[0].href, "ghost.xhtml");
    assert_eq!(book.processing_info.total_sections, 2);
}

#[test]
fn test_percent_encoded_href() {
    let bytes = EpubBuilder::new()
        .title("Spaces")
        .file(
            "OEBPS/chapter one.xhtml",
            xhtml(Some("Chapter 1"), &[filler(150)]),
        )
        .package_xml(
            r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Spaces</dc:title></metadata>
  <manifest>
    <item id="c1" href="chapter%20one.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/></spine>
</package>"#,
        )
        .build();

    let book = parse_epub(&bytes).unwrap();
    assert_eq!(book.chapters.len(), 1);
    assert_eq!(book.chapters[0].href, "chapter%20one.xhtml");
    assert!(book.processing_info.skipped_sections.is_empty());
}

#[test]
fn test_windows_1252_section() {
    let mut body = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?>\n<html><body><h1>Chapter 1</h1><p>Caf\xe9 ".to_vec();
    body.extend_from_slice(filler(150).as_bytes());
    body.extend_from_slice(b"</p></body></html>");

    let bytes = EpubBuilder::new()
        .title("Legacy")
        .item("c1", "c1.xhtml", XHTML, body)
        .spine_ref("c1")
        .build();

    let book = parse_epub(&bytes).unwrap();
    assert!(book.chapters[0].content.contains("Café"));
}

#[test]
fn test_package_in_archive_root() {
    let bytes = one_chapter_book().package_path("content.opf").build();

    let book = parse_epub(&bytes).unwrap();
    assert_eq!(book.chapters.len(), 1);
    assert_eq!(book.chapters[0].href, "ch1.xhtml");
}

// ============================================================================
// File entry point
// ============================================================================

#[test]
fn test_parse_epub_file() {
    let bytes = one_chapter_book().build();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();

    let book = parse_epub_file(file.path()).unwrap();
    assert_eq!(book.metadata.title, "Test Book");
    assert_eq!(book.metadata.author, "Test Author");
    assert_eq!(book.chapters.len(), 1);
    assert_eq!(book, parse_epub(&bytes).unwrap());
}

#[test]
fn test_parse_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_epub_file(dir.path().join("nope.epub")).unwrap_err();
    assert!(matches!(err, Error::MalformedArchive(_)));
}
