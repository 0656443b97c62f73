//! Helpers for reading RDF structure off of `xmltree` elements.
//!
//! XMP properties are either simple text or wrapped in one of three RDF
//! collections (`rdf:Alt`, `rdf:Bag`, `rdf:Seq`), each holding `rdf:li`
//! items.

use xmltree::{Element, XMLNode};
use xmp_tag_types::namespaces::{RDF, XML};

pub(super) trait RdfElementExt {
    /// Whether this element is `ns:name`.
    fn is(&self, namespace: &str, name: &str) -> bool;

    /// Finds the value of the attribute `ns:local_name`.
    fn attribute(&self, namespace: &str, local_name: &str) -> Option<&str>;

    /// Child elements, skipping text and comments.
    fn child_elements(&self) -> impl Iterator<Item = &Element>;

    /// The first RDF collection directly under this element.
    fn collection(&self) -> Option<(&Element, CollectionKind)>;

    /// The `rdf:li` items of a collection element.
    fn list_items(&self) -> impl Iterator<Item = &Element>;

    /// This element's `xml:lang`, if it has one.
    fn language(&self) -> Option<&str>;

    /// The element's text, trimmed. No text is an empty string.
    fn trimmed_text(&self) -> String;
}

impl RdfElementExt for Element {
    fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    fn attribute(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| {
                key.local_name == local_name && key.namespace_ref() == Some(namespace)
            })
            .map(|(_, value)| value.as_str())
    }

    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(XMLNode::as_element)
    }

    fn collection(&self) -> Option<(&Element, CollectionKind)> {
        self.child_elements()
            .filter(|c| c.namespace.as_deref() == Some(RDF))
            .find_map(|c| match c.name.as_str() {
                "Alt" => Some((c, CollectionKind::Alternatives)),
                "Bag" => Some((c, CollectionKind::Unordered)),
                "Seq" => Some((c, CollectionKind::Ordered)),
                _ => None,
            })
    }

    fn list_items(&self) -> impl Iterator<Item = &Element> {
        self.child_elements().filter(|maybe_li| {
            if maybe_li.is(RDF, "li") {
                return true;
            }

            log::warn!(
                "sub-element of `rdf:{}` was expected to be `rdf:li`. got: `{}`",
                self.name,
                maybe_li.name
            );
            false
        })
    }

    fn language(&self) -> Option<&str> {
        // some writers leave `xml` unbound, so the prefix is enough
        self.attributes
            .iter()
            .find(|(key, _)| {
                key.local_name == "lang"
                    && (key.namespace_ref() == Some(XML) || key.prefix_ref() == Some("xml"))
            })
            .map(|(_, value)| value.as_str())
    }

    fn trimmed_text(&self) -> String {
        self.get_text()
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }
}

/// The kind of collection we've detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CollectionKind {
    /// `rdf:Alt`: one item is picked, usually by language.
    Alternatives,

    /// `rdf:Bag`
    Unordered,

    /// `rdf:Seq`
    Ordered,
}
