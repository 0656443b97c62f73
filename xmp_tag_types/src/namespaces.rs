//! Namespace URIs used by XMP, plus a table of their customary prefixes.
//!
//! Template authors tend to write `dc` rather than
//! `http://purl.org/dc/elements/1.1/`, so the property query accepts either.
//! This table is what turns the former into the latter.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

/// The RDF syntax namespace. Containers (`rdf:Alt`, `rdf:Bag`, `rdf:Seq`)
/// and `rdf:Description` live here.
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// The `x:xmpmeta` wrapper's namespace.
pub const X: &str = "adobe:ns:meta/";

/// The XML namespace, which owns `xml:lang`.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// XMP Basic. Also the JPEG APP1 signature, minus its NUL terminator.
pub const XMP_BASIC: &str = "http://ns.adobe.com/xap/1.0/";

/// Dublin Core.
pub const DUBLIN_CORE: &str = "http://purl.org/dc/elements/1.1/";

/// A map, (key, value), where:
///
/// - `key` is a customary prefix, like `dc`
/// - `value` is the namespace URI that prefix usually stands for
pub static WELL_KNOWN_PREFIXES: LazyLock<FxHashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m: FxHashMap<&'static str, &'static str> = FxHashMap::default();
        map(&mut m);
        m
    });

/// Returns the namespace URI for a well-known prefix, if we know it.
///
/// ```
/// use xmp_tag_types::namespaces::{self, uri_for_prefix};
///
/// assert_eq!(uri_for_prefix("dc"), Some(namespaces::DUBLIN_CORE));
/// assert_eq!(uri_for_prefix("not_a_real_prefix"), None);
/// ```
pub fn uri_for_prefix(prefix: &str) -> Option<&'static str> {
    WELL_KNOWN_PREFIXES.get(prefix).copied()
}

/// Adds all (key, value) pairs to the currently empty map.
fn map(m: &mut FxHashMap<&'static str, &'static str>) {
    let mut i = |prefix: &'static str, uri: &'static str| m.insert(prefix, uri);

    // plumbing
    i("rdf", RDF);
    i("x", X);
    i("xml", XML);

    // XMP standard namespaces
    i("xmp", XMP_BASIC);
    i("xap", XMP_BASIC);
    i("dc", DUBLIN_CORE);
    i("xmpRights", "http://ns.adobe.com/xap/1.0/rights/");
    i("xmpMM", "http://ns.adobe.com/xap/1.0/mm/");
    i("xmpBJ", "http://ns.adobe.com/xap/1.0/bj/");
    i("xmpTPg", "http://ns.adobe.com/xap/1.0/t/pg/");
    i("xmpDM", "http://ns.adobe.com/xmp/1.0/DynamicMedia/");
    i("xmpNote", "http://ns.adobe.com/xmp/note/");
    i("pdf", "http://ns.adobe.com/pdf/1.3/");

    // media-specific namespaces
    i("photoshop", "http://ns.adobe.com/photoshop/1.0/");
    i("crs", "http://ns.adobe.com/camera-raw-settings/1.0/");
    i("tiff", "http://ns.adobe.com/tiff/1.0/");
    i("exif", "http://ns.adobe.com/exif/1.0/");
    i("exifEX", "http://cipa.jp/exif/1.0/");
    i("aux", "http://ns.adobe.com/exif/1.0/aux/");
    i("lr", "http://ns.adobe.com/lightroom/1.0/");

    // IPTC
    i("Iptc4xmpCore", "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/");
    i("Iptc4xmpExt", "http://iptc.org/std/Iptc4xmpExt/2008-02-29/");
    i("plus", "http://ns.useplus.org/ldf/xmp/1.0/");

    // misc. but common
    i("cc", "http://creativecommons.org/ns#");
    i("GPano", "http://ns.google.com/photos/1.0/panorama/");
}
