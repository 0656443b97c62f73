//! Reads single properties out of an XMP packet.
//!
//! XMP is RDF serialized as XML. A packet looks something like this:
//!
//! ```xml
//! <x:xmpmeta xmlns:x="adobe:ns:meta/">
//!   <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
//!     <rdf:Description rdf:about="" xmlns:xmp="http://ns.adobe.com/xap/1.0/"
//!         xmp:CreateDate="2024-05-01T10:00:00">
//!       <dc:rights xmlns:dc="http://purl.org/dc/elements/1.1/">
//!         <rdf:Alt><rdf:li xml:lang="x-default">(c) Someone</rdf:li></rdf:Alt>
//!       </dc:rights>
//!     </rdf:Description>
//!   </rdf:RDF>
//! </x:xmpmeta>
//! ```
//!
//! Properties live on the `rdf:Description` elements, either as attributes
//! or as child elements. [`Xmp::property`] looks in both.

use xmltree::Element;
use xmp_tag_types::namespaces::{RDF, X, uri_for_prefix};

use crate::xmp::{
    collection::{CollectionKind, RdfElementExt as _},
    error::XmpError,
};

mod collection;
pub mod error;

/// A parsed XMP packet.
#[derive(Clone, Debug)]
pub struct Xmp {
    document: Element,
}

impl Xmp {
    /// Parses the given raw XML string.
    pub fn new(raw_xml: &str) -> Result<Self, XmpError> {
        let document: Element = Element::parse(raw_xml.as_bytes())
            .inspect_err(|e| log::error!("Failed to parse XMP as XML. err: {e}"))?;

        Ok(Self { document })
    }

    /// Parses a packet straight out of a container.
    ///
    /// Packets are often padded with whitespace (so they can be edited in
    /// place) and sometimes with NUL bytes. Both are trimmed from the end,
    /// and a leading byte-order mark is dropped.
    pub fn from_packet(packet: &[u8]) -> Result<Self, XmpError> {
        let raw_xml: &str = core::str::from_utf8(packet)
            .inspect_err(|e| log::warn!("XMP packet isn't UTF-8. err: {e}"))?;

        Self::new(
            raw_xml
                .trim_start_matches('\u{feff}')
                .trim_end_matches(|c: char| c == '\0' || c.is_whitespace()),
        )
    }

    /// Returns the underlying XML document.
    pub fn document(&self) -> &Element {
        &self.document
    }

    /// Finds the `rdf:RDF` element.
    ///
    /// It's either the document's root or a child of it (usually of
    /// `x:xmpmeta`).
    fn rdf(&self) -> Result<&Element, XmpError> {
        let root: &Element = &self.document;

        if root.is(RDF, "RDF") {
            return Ok(root);
        }

        if !root.is(X, "xmpmeta") {
            log::warn!(
                "Expected `x:xmpmeta` or `rdf:RDF` as the root element. got: `{}` in ns `{:?}`",
                root.name,
                root.namespace
            );
        }

        root.child_elements()
            .find(|c| c.is(RDF, "RDF"))
            .ok_or_else(|| {
                log::error!("Couldn't find an `rdf:RDF` element in the document.");
                XmpError::NoRdfElement
            })
    }

    /// Returns every `rdf:Description` element, in document order.
    pub fn descriptions(&self) -> Result<Vec<&Element>, XmpError> {
        let descriptions: Vec<&Element> = self
            .rdf()?
            .child_elements()
            .filter(|child| {
                if child.name != "Description" {
                    return false;
                }

                if child.namespace.as_deref() != Some(RDF) {
                    log::error!(
                        "Cannot use `Description` due to incorrect namespace!
                            - expected: {RDF}
                            - got: {:?}",
                        child.namespace
                    );
                    return false;
                }

                true
            })
            .collect();

        if descriptions.is_empty() {
            log::warn!("No `rdf:Description` elements found in the `rdf:RDF` element.");
            return Err(XmpError::NoDescriptionElements);
        }

        Ok(descriptions)
    }

    /// Finds the value of the property `name` in `namespace`.
    ///
    /// `namespace` can be a full namespace URI (`http://purl.org/dc/elements/1.1/`)
    /// or a prefix (`dc`). Well-known prefixes resolve to their URI; any other
    /// prefix matches whatever the packet itself binds it to.
    ///
    /// Simple values are returned trimmed. For collections:
    ///
    /// - `rdf:Alt`: the `x-default` item, or the first one.
    /// - `rdf:Seq` and `rdf:Bag`: every item, joined with `", "`.
    ///
    /// ```
    /// use xmp_tag::xmp::Xmp;
    ///
    /// let xmp = Xmp::new(r#"
    ///     <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    ///         <rdf:Description xmlns:xmp="http://ns.adobe.com/xap/1.0/"
    ///             xmp:Rating="4" />
    ///     </rdf:RDF>
    /// "#).unwrap();
    ///
    /// assert_eq!(xmp.property("xmp", "Rating").as_deref(), Some("4"));
    /// assert_eq!(
    ///     xmp.property("http://ns.adobe.com/xap/1.0/", "Rating").as_deref(),
    ///     Some("4"),
    /// );
    /// assert_eq!(xmp.property("xmp", "Label"), None);
    /// ```
    pub fn property(&self, namespace: &str, name: &str) -> Option<String> {
        let query = NamespaceQuery::new(namespace);
        log::trace!("Looking for property `{name}` with {query:?}.");

        let descriptions = self
            .descriptions()
            .inspect_err(|e| log::warn!("XMP has nowhere to look for properties. err: {e}"))
            .ok()?;

        descriptions.into_iter().find_map(|description| {
            // attributes are the "simple, unqualified" form
            let from_attribute = description
                .attributes
                .iter()
                .find(|(key, _)| {
                    key.local_name == name && query.matches(key.namespace_ref(), key.prefix_ref())
                })
                .map(|(_, value)| value.clone());

            if from_attribute.is_some() {
                log::debug!("Found property `{name}` as an attribute.");
                return from_attribute;
            }

            description
                .child_elements()
                .find(|child| {
                    child.name == name
                        && query.matches(child.namespace.as_deref(), child.prefix.as_deref())
                })
                .map(|child| {
                    log::debug!("Found property `{name}` as an element.");
                    element_value(child)
                })
        })
    }
}

/// Turns a property element into its string form.
fn element_value(element: &Element) -> String {
    if let Some(resource) = element.attribute(RDF, "resource") {
        return resource.to_string();
    }

    let Some((collection, kind)) = element.collection() else {
        return element.trimmed_text();
    };

    match kind {
        CollectionKind::Alternatives => {
            let items: Vec<&Element> = collection.list_items().collect();
            items
                .iter()
                .find(|li| li.language() == Some("x-default"))
                .or_else(|| {
                    log::debug!("`rdf:Alt` has no `x-default` item. Using the first.");
                    items.first()
                })
                .map(|li| li.trimmed_text())
                .unwrap_or_default()
        }

        CollectionKind::Ordered | CollectionKind::Unordered => collection
            .list_items()
            .map(|li| li.trimmed_text())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// How a caller named a namespace.
#[derive(Debug)]
enum NamespaceQuery<'query> {
    /// A full URI, like `http://purl.org/dc/elements/1.1/`.
    Uri(&'query str),

    /// A prefix, like `dc`. Known prefixes also carry their URI.
    Prefix {
        prefix: &'query str,
        uri: Option<&'static str>,
    },
}

impl<'query> NamespaceQuery<'query> {
    fn new(namespace: &'query str) -> Self {
        // every namespace URI has a scheme. prefixes can't contain a colon
        if namespace.contains(':') {
            return Self::Uri(namespace);
        }

        Self::Prefix {
            prefix: namespace,
            uri: uri_for_prefix(namespace),
        }
    }

    fn matches(&self, namespace: Option<&str>, prefix: Option<&str>) -> bool {
        match *self {
            Self::Uri(uri) => namespace == Some(uri),
            Self::Prefix {
                uri: Some(uri),
                prefix: wanted,
            } => namespace == Some(uri) || (namespace.is_some() && prefix == Some(wanted)),
            Self::Prefix { uri: None, prefix: wanted } => {
                namespace.is_some() && prefix == Some(wanted)
            }
        }
    }
}
