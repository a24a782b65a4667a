//! # chapterize
//!
//! Extract the story chapters of an EPUB as plain text.
//!
//! A parse locates the package descriptor, reads the metadata, manifest and
//! spine, recovers a table of contents, cleans each spine document down to
//! paragraphs of text, and then decides which documents are narrative
//! chapters and which are front or back matter (covers, copyright pages,
//! tables of contents, indices...).
//!
//! ## Quick Start
//!
//! ```no_run
//! use chapterize::parse_epub_file;
//!
//! let book = parse_epub_file("novel.epub").unwrap();
//! println!("{} by {}", book.metadata.title, book.metadata.author);
//! for chapter in &book.chapters {
//!     println!("{}: {} words", chapter.title, chapter.content.split_whitespace().count());
//! }
//! for excluded in &book.processing_info.excluded_sections {
//!     println!("skipped {excluded}");
//! }
//! ```
//!
//! ## Tuning
//!
//! ```no_run
//! use std::time::Duration;
//! use chapterize::{ClassifierConfig, ParseOptions, parse_epub_with};
//!
//! let bytes = std::fs::read("novel.epub").unwrap();
//! let options = ParseOptions::default()
//!     .with_timeout(Duration::from_secs(5))
//!     .with_classifier(ClassifierConfig::default().with_min_words(50));
//! let book = parse_epub_with(&bytes, &options).unwrap();
//! ```

pub mod book;
pub mod classify;
pub mod dom;
pub mod epub;
pub mod error;
pub mod pipeline;
pub mod section;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

use std::path::Path;

pub use book::{
    BookMetadata, Chapter, ClassificationResult, ExcludedSection, ParsedBook, ProcessingInfo,
    Section, SkippedSection, Toc, TocEntry, TocSource,
};
pub use classify::{ClassifierConfig, classify_sections};
pub use error::{Error, Result};
pub use pipeline::{Deadline, ParseOptions, parse_epub_with};

/// Parse an EPUB held in memory with default options.
pub fn parse_epub(bytes: &[u8]) -> Result<ParsedBook> {
    parse_epub_with(bytes, &ParseOptions::default())
}

/// Read and parse an EPUB file with default options.
///
/// An unreadable file is reported as a malformed archive.
pub fn parse_epub_file(path: impl AsRef<Path>) -> Result<ParsedBook> {
    let bytes = std::fs::read(path).map_err(|e| Error::MalformedArchive(e.into()))?;
    parse_epub(&bytes)
}
