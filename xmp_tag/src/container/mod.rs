//! Finds raw XMP packets inside image containers.
//!
//! We don't decode images here. Instead, we sniff the container from its
//! magic number, then walk just enough of its structure to find the packet:
//!
//! - JPEG: the first `APP1` segment carrying the XMP signature.
//! - PNG: the last `iTXt` chunk with the `XML:com.adobe.xmp` keyword.
//!
//! ```
//! use xmp_tag::container::{self, ContainerKind};
//!
//! let mut jpeg: Vec<u8> = vec![0xFF, 0xD8];
//! let packet = b"<x:xmpmeta xmlns:x='adobe:ns:meta/'/>";
//! let signature = b"http://ns.adobe.com/xap/1.0/\0";
//!
//! // APP1, then its length (which counts its own two bytes)
//! jpeg.extend([0xFF, 0xE1]);
//! jpeg.extend(((2 + signature.len() + packet.len()) as u16).to_be_bytes());
//! jpeg.extend_from_slice(signature);
//! jpeg.extend_from_slice(packet);
//! jpeg.extend([0xFF, 0xD9]);
//!
//! assert_eq!(container::detect_kind(&jpeg), ContainerKind::Jpeg);
//! assert_eq!(container::extract_packet(&jpeg), Some(packet.to_vec()));
//! ```

use std::{fs::File, io::Read as _, path::Path};

pub mod error;
mod jpeg;
mod png;

pub use error::IncompleteDataError;
pub use jpeg::XMP_SIGNATURE;
pub use png::XMP_KEYWORD;
pub use xmp_tag_types::{ContainerKind, MetadataPacket};

#[cfg(test)]
pub(crate) use jpeg::tests::{make_jpeg_sample, xmp_app1};
#[cfg(test)]
pub(crate) use png::tests::{itxt, make_png_sample};

/// The first three bytes of every JPEG: `SOI`, then the start of the next
/// marker.
pub const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// The PNG file signature.
pub const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// The most a compressed PNG `iTXt` chunk may inflate to.
///
/// Real XMP packets are a few KiB, and rarely more than a few MiB.
pub const MAX_INFLATED_LEN: u64 = 16 * 1024 * 1024;

/// Figures out which container the input is, judging only by its first few
/// bytes.
///
/// Anything that's neither a JPEG nor a PNG is [`ContainerKind::Unknown`].
pub fn detect_kind(input: &impl AsRef<[u8]>) -> ContainerKind {
    let input: &[u8] = input.as_ref();

    if input.starts_with(&JPEG_MAGIC) {
        return ContainerKind::Jpeg;
    }

    if input.starts_with(&PNG_MAGIC) {
        return ContainerKind::Png;
    }

    log::trace!("No known magic number in input. It's not a supported container.");
    ContainerKind::Unknown
}

/// Attempts to find the XMP packet in the given container.
///
/// - `Ok(Some(packet))`: found one.
/// - `Ok(None)`: the container is fine, but it has no packet. Unknown
///   containers also land here.
/// - `Err(_)`: the container's structure ended early or was malformed.
pub fn try_extract_packet(
    input: &impl AsRef<[u8]>,
) -> Result<Option<MetadataPacket>, IncompleteDataError> {
    let input: &[u8] = input.as_ref();

    let kind = detect_kind(&input);
    log::trace!("Scanning a `{kind}` container of `{}` bytes.", input.len());

    match kind {
        ContainerKind::Jpeg => jpeg::xmp_packet(input),
        ContainerKind::Png => png::xmp_packet(input),
        ContainerKind::Unknown => Ok(None),
    }
}

/// Finds the XMP packet in the given container, if it has one.
///
/// Incomplete or malformed containers are treated as having no packet. Use
/// [`try_extract_packet`] to see why a scan failed.
pub fn extract_packet(input: &impl AsRef<[u8]>) -> Option<MetadataPacket> {
    try_extract_packet(input).unwrap_or_else(|e| {
        log::warn!("Container was incomplete. Treating it as having no XMP. err: {e}");
        None
    })
}

/// Reads the file at `path`, then finds its XMP packet.
///
/// The file is closed before this returns. Only failing to open or read the
/// file is an error; a bad container is just `Ok(None)`.
pub fn extract_packet_from_path(path: impl AsRef<Path>) -> std::io::Result<Option<MetadataPacket>> {
    let path: &Path = path.as_ref();

    let bytes: Vec<u8> = {
        let mut file: File = File::open(path).inspect_err(|e| {
            log::error!("Failed to open `{}` for reading. err: {e}", path.display())
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).inspect_err(|e| {
            log::error!("Failed to read `{}`. err: {e}", path.display())
        })?;
        bytes
    };

    log::trace!("Read `{}` bytes from `{}`.", bytes.len(), path.display());
    Ok(extract_packet(&bytes))
}
