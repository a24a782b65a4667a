//! The end-to-end parse: bytes in, [`ParsedBook`] out.

use std::time::Duration;

use log::{debug, info};

use crate::book::{ParsedBook, ProcessingInfo};
use crate::classify::{ClassifierConfig, classify_sections};
use crate::epub::{Archive, Entry, parse_package, resolve_package_path, resolve_toc};
use crate::error::{Error, Result};
use crate::section::load_sections;
use crate::util::{Instant, decode_xml, parent_dir};

/// Time budget for a parse.
///
/// Checked between archive entries and between pipeline stages; work already
/// in flight is never interrupted.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    budget: Duration,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline `budget` from now. A budget too large to represent never
    /// expires.
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            expires_at: Instant::now().checked_add(budget),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            budget: Duration::MAX,
            expires_at: None,
        }
    }

    /// A deadline that has already passed.
    pub fn expired() -> Self {
        Self {
            budget: Duration::ZERO,
            expires_at: Some(Instant::now()),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fail with [`Error::ParseTimeout`] once the deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            Err(Error::ParseTimeout {
                budget: self.budget,
            })
        } else {
            Ok(())
        }
    }
}

/// Options for [`parse_epub_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Budget for the whole parse. Defaults to 30 seconds.
    pub timeout: Duration,
    pub classifier: ClassifierConfig,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ParseOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }
}

/// Parse an EPUB held in memory with custom options.
///
/// Fails on anything that prevents locating the book's structure (a bad ZIP,
/// container or package descriptor) or when the timeout expires. Sections
/// that cannot be read are reported in
/// [`ProcessingInfo::skipped_sections`] instead.
///
/// The archive lives only for the duration of this call.
pub fn parse_epub_with(bytes: &[u8], options: &ParseOptions) -> Result<ParsedBook> {
    let deadline = Deadline::new(options.timeout);

    let archive = Archive::from_bytes(bytes, &deadline)?;
    deadline.check()?;

    let package_path = resolve_package_path(&archive)?;
    let package_dir = parent_dir(&package_path);
    debug!("Package descriptor at {package_path}");

    let package_xml = match archive.entry(&package_path) {
        Entry::Found(data) => decode_xml(data),
        Entry::Unreadable(reason) => {
            return Err(Error::InvalidPackageDescriptor(format!(
                "{package_path} could not be read: {reason}"
            )));
        }
        Entry::Missing => {
            return Err(Error::InvalidPackageDescriptor(format!(
                "{package_path} is missing from the archive"
            )));
        }
    };
    let package = parse_package(&package_xml)?;
    deadline.check()?;

    let toc = resolve_toc(&archive, &package, package_dir);
    debug!("TOC: {} entries from {:?}", toc.len(), toc.source);

    let loaded = load_sections(&archive, &package, package_dir, &toc, &deadline)?;
    let result = classify_sections(loaded.sections, &toc, &options.classifier);

    info!(
        "Parsed {:?}: {} of {} sections are chapters{}",
        package.metadata.title,
        result.chapter_count,
        result.total_sections,
        if result.used_fallback {
            " (longest-sections fallback)"
        } else {
            ""
        }
    );

    Ok(ParsedBook {
        metadata: package.metadata,
        processing_info: ProcessingInfo {
            total_sections: result.total_sections,
            excluded_sections: result
                .excluded_sections
                .iter()
                .map(ToString::to_string)
                .collect(),
            chapter_count: result.chapter_count,
            skipped_sections: loaded.skipped,
        },
        chapters: result.chapters,
    })
}
