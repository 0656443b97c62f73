//! # `xmp_tag`
//!
//! An `xmp` template tag that reads one XMP property out of a JPEG or PNG
//! file, without an image decoder or an external metadata tool.
//!
//! ```text
//! {% xmp file_path="photos/cat.jpg" property_namespace="dc" property_name="rights" %}
//! ```
//!
//! The pieces can also be used on their own:
//!
//! - [`markup`] parses the tag's `key=value` arguments.
//! - [`container`] finds the raw XMP packet in a JPEG or PNG.
//! - [`xmp`] reads a property out of that packet.
//! - [`tag`] ties them together for a host template engine.
//!
//! ## Usage
//!
//! ```
//! // a tiny PNG with an XMP `iTXt` chunk (and no image, but we don't care)
//! let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
//!     <rdf:Description xmlns:dc="http://purl.org/dc/elements/1.1/" dc:format="image/png"/>
//! </rdf:RDF>"#;
//!
//! let mut itxt = b"XML:com.adobe.xmp\0\0\0\0\0".to_vec();
//! itxt.extend_from_slice(xml.as_bytes());
//!
//! let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
//! png.extend((itxt.len() as u32).to_be_bytes());
//! png.extend_from_slice(b"iTXt");
//! png.extend_from_slice(&itxt);
//! png.extend([0; 4]); // crc
//!
//! assert_eq!(
//!     xmp_tag::property(&png, "dc", "format").as_deref(),
//!     Some("image/png"),
//! );
//! ```
//!
//! ## License
//!
//! This project is dual-licensed under either the Apache License 2.0 or the MIT License at your option.

#![forbid(unsafe_code)]

pub mod container;
pub mod error;
pub mod markup;
pub mod tag;
pub mod xmp;

pub use error::TagError;
pub use tag::{RenderContext, TAG_NAME, TagRegistry, XmpTag, register};
pub use xmp_tag_types::ContainerKind;

/// Finds the XMP property `name` in `namespace` in an in-memory JPEG or PNG.
///
/// `None` means there was no property to find: the container is unknown or
/// broken, it has no XMP, the XMP can't be read, or the property isn't there.
pub fn property(input: &impl AsRef<[u8]>, namespace: &str, name: &str) -> Option<String> {
    let packet = container::extract_packet(input)?;

    xmp::Xmp::from_packet(&packet)
        .inspect_err(|e| log::warn!("Found an XMP packet, but couldn't read it. err: {e}"))
        .ok()?
        .property(namespace, name)
}

/// Internal utility methods.
pub(crate) mod util {
    /// Helper function to initialize the logger for testing.
    #[cfg(test)]
    pub fn logger() {
        _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::max())
            .format_file(true)
            .format_line_number(true)
            .try_init();
    }
}
