//! EPUB container structure: the ZIP archive, `container.xml`, the OPF
//! package descriptor and the navigation documents.

mod archive;
mod container;
mod nav;
mod package;
mod xml;

pub use archive::{Archive, Entry};
pub use container::{CONTAINER_PATH, parse_container_xml, resolve_package_path};
pub use nav::{parse_nav_document, parse_ncx, resolve_toc, spine_toc};
pub use package::{Package, parse_package};
