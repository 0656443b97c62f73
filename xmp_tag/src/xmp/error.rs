use std::sync::Arc;

/// Something went wrong while reading an XMP packet.
///
/// A missing property isn't an error. This only covers packets we can't read
/// at all.
#[derive(Clone, Debug)]
pub enum XmpError {
    /// `xmltree` failed to parse the XML.
    XmlParseError(
        // note: `Arc` allows us to impl `Clone`
        Arc<xmltree::ParseError>,
    ),

    /// The packet's bytes weren't valid UTF-8.
    NotUtf8(core::str::Utf8Error),

    /// No `rdf:RDF` element was found, either as the root or under
    /// `x:xmpmeta`.
    NoRdfElement,

    /// We couldn't find any `rdf:Description` elements in the `rdf:RDF`
    /// element.
    NoDescriptionElements,
}

impl core::fmt::Display for XmpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            XmpError::XmlParseError(e) => {
                write!(f, "Encountered error while parsing XML. err: {e}")
            }

            XmpError::NotUtf8(e) => write!(f, "The XMP packet isn't valid UTF-8. err: {e}"),

            XmpError::NoRdfElement => {
                f.write_str("The XML is missing the `rdf:RDF` element, which is required.")
            }

            XmpError::NoDescriptionElements => f.write_str(
                "The `rdf:RDF` element has no `rdf:Description` elements. \
                    One or more are required.",
            ),
        }
    }
}

impl core::error::Error for XmpError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            XmpError::XmlParseError(e) => Some(e.as_ref()),
            XmpError::NotUtf8(e) => Some(e),
            XmpError::NoRdfElement | XmpError::NoDescriptionElements => None,
        }
    }
}

impl From<xmltree::ParseError> for XmpError {
    fn from(value: xmltree::ParseError) -> Self {
        XmpError::XmlParseError(value.into())
    }
}

impl From<core::str::Utf8Error> for XmpError {
    fn from(value: core::str::Utf8Error) -> Self {
        XmpError::NotUtf8(value)
    }
}
