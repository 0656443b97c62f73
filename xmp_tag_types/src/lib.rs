//! # `xmp_tag_types`
//!
//! Plain types shared between `xmp_tag` and the hosts that embed it.
//!
//! Nothing in here parses anything. If you only need to name a container kind
//! or look up a namespace prefix, you can depend on this crate alone.

pub mod namespaces;

/// The kind of image container a byte stream holds.
///
/// This is decided by a fixed-length magic-byte prefix, never by a file's
/// extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContainerKind {
    /// Starts with `FF D8 FF`.
    Jpeg,

    /// Starts with `89 50 4E 47 0D 0A 1A 0A`.
    Png,

    /// Anything else.
    ///
    /// Unknown containers never carry a packet we can find, but that's not an
    /// error.
    Unknown,
}

impl ContainerKind {
    /// A short, human-readable name for this kind.
    pub const fn name(&self) -> &'static str {
        match self {
            ContainerKind::Jpeg => "JPEG",
            ContainerKind::Png => "PNG",
            ContainerKind::Unknown => "unknown",
        }
    }
}

impl core::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// The raw bytes of an extracted XMP packet.
///
/// No structure is imposed here - it's whatever the container stored.
pub type MetadataPacket = Vec<u8>;
