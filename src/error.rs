//! Error types for chapter extraction.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while extracting chapters from an EPUB.
///
/// Everything except [`Error::SectionLoad`] is fatal: the parse stops and no
/// partial book is returned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed archive: {0}")]
    MalformedArchive(#[from] zip::result::ZipError),

    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    #[error("Invalid package descriptor: {0}")]
    InvalidPackageDescriptor(String),

    #[error("Parse timed out after {budget:?}")]
    ParseTimeout { budget: Duration },

    #[error("Failed to load section {href}: {reason}")]
    SectionLoad { href: String, reason: String },
}

impl Error {
    /// Whether this error aborts the whole parse.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::SectionLoad { .. })
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::MalformedArchive(_) => "not a valid e-book archive",
            Error::InvalidContainer(_) | Error::InvalidPackageDescriptor(_) => {
                "e-book archive is structurally invalid"
            }
            Error::ParseTimeout { .. } => "parsing took too long",
            Error::SectionLoad { .. } => "a section of the e-book could not be read",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
