//! `META-INF/container.xml` resolution.

use quick_xml::Reader;
use quick_xml::events::Event;

use super::archive::{Archive, Entry};
use super::xml::{attr, local_name};
use crate::error::{Error, Result};
use crate::util::decode_xml;

pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Find the package descriptor path declared by the archive's container.
pub fn resolve_package_path(archive: &Archive) -> Result<String> {
    match archive.entry(CONTAINER_PATH) {
        Entry::Found(bytes) => parse_container_xml(bytes),
        Entry::Unreadable(reason) => Err(Error::InvalidContainer(format!(
            "{CONTAINER_PATH} could not be read: {reason}"
        ))),
        Entry::Missing => Err(Error::InvalidContainer(format!(
            "{CONTAINER_PATH} is missing"
        ))),
    }
}

/// Parse META-INF/container.xml to find the first rootfile's `full-path`.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = decode_xml(bytes);

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"rootfile" => {
                return match attr(&e, b"full-path") {
                    Some(path) if !path.trim().is_empty() => Ok(path.trim().to_string()),
                    _ => Err(Error::InvalidContainer(
                        "rootfile has no full-path attribute".into(),
                    )),
                };
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::InvalidContainer(e.to_string())),
            _ => {}
        }
    }

    Err(Error::InvalidContainer(
        "No rootfile found in container.xml".into(),
    ))
}
