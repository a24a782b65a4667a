//! In-memory ZIP container.
//!
//! The whole archive is inflated once up front; every later lookup is a map
//! access. Entries that fail to inflate are remembered so the section that
//! needs them can report a precise failure instead of failing the whole book.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, Cursor};

use log::{debug, warn};
use zip::ZipArchive;

use crate::error::Result;
use crate::pipeline::Deadline;
use crate::util::decode_xml;

/// Random-access view of an EPUB's files, keyed by archive path.
pub struct Archive {
    entries: HashMap<String, Vec<u8>>,
    /// Entries present in the central directory that failed to inflate.
    unreadable: HashMap<String, String>,
}

/// Result of a lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum Entry<'a> {
    Found(&'a [u8]),
    Unreadable(&'a str),
    Missing,
}

impl Archive {
    /// Inflate every entry of a ZIP byte stream.
    ///
    /// Fails with [`crate::Error::MalformedArchive`] when the central directory
    /// cannot be read, and with [`crate::Error::ParseTimeout`] if `deadline`
    /// expires between entries.
    pub fn from_bytes(bytes: &[u8], deadline: &Deadline) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;

        let mut entries = HashMap::with_capacity(zip.len());
        let mut unreadable = HashMap::new();

        for i in 0..zip.len() {
            deadline.check()?;

            let mut file = match zip.by_index(i) {
                Ok(file) => file,
                Err(e) => {
                    warn!("Skipping unreadable ZIP entry #{i}: {e}");
                    continue;
                }
            };
            if file.is_dir() {
                continue;
            }

            let name = file.name().replace('\\', "/");
            // The declared size is untrusted; the buffer grows with what
            // actually inflates.
            let mut data = Vec::new();
            match io::copy(&mut file, &mut data) {
                Ok(_) => {
                    entries.insert(name, data);
                }
                Err(e) => {
                    warn!("Failed to inflate {name}: {e}");
                    unreadable.insert(name, e.to_string());
                }
            }
        }

        debug!(
            "Decoded archive: {} entries, {} unreadable",
            entries.len(),
            unreadable.len()
        );

        Ok(Self {
            entries,
            unreadable,
        })
    }

    /// Look up an entry by archive path.
    ///
    /// Falls back to the percent-decoded path, since some producers write
    /// encoded hrefs into the manifest but store plain names in the ZIP.
    pub fn entry(&self, path: &str) -> Entry<'_> {
        let decoded = percent_encoding::percent_decode_str(path).decode_utf8().ok();
        let candidates = std::iter::once(path).chain(decoded.as_deref());

        for candidate in candidates {
            if let Some(data) = self.entries.get(candidate) {
                return Entry::Found(data);
            }
            if let Some(reason) = self.unreadable.get(candidate) {
                return Entry::Unreadable(reason);
            }
        }
        Entry::Missing
    }

    /// Raw bytes of an entry, if it exists and inflated cleanly.
    pub fn read(&self, path: &str) -> Option<&[u8]> {
        match self.entry(path) {
            Entry::Found(data) => Some(data),
            _ => None,
        }
    }

    /// Entry decoded as text (see [`crate::util::decode_text`]).
    pub fn read_text(&self, path: &str) -> Option<Cow<'_, str>> {
        self.read(path).map(decode_xml)
    }

    pub fn contains(&self, path: &str) -> bool {
        !matches!(self.entry(path), Entry::Missing)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
