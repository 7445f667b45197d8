//! XML element content.

use std::fmt;

use super::namespace::QName;
use super::{Node, NsMap};
use crate::error::Result;

/// An XML element with a qualified tag, attributes, children and text.
///
/// Tags and attribute keys are qualified-name tokens (`{namespace}local`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// The qualified tag of the element.
    tag: String,
    /// Attributes in document order, keyed by qualified name.
    attributes: Vec<(String, String)>,
    /// Child elements and comments in document order.
    children: Vec<Node>,
    /// Character data directly inside this element, if any.
    text: Option<String>,
    /// Namespace bindings in scope on this element (inherited ones included).
    nsmap: NsMap,
}

impl Element {
    /// Creates an empty element with the given qualified tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Creates an empty element carrying namespace bindings.
    pub fn with_nsmap(tag: impl Into<String>, nsmap: NsMap) -> Self {
        Element {
            tag: tag.into(),
            nsmap,
            ..Default::default()
        }
    }

    /// Returns the qualified tag of the element.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Decodes the tag into namespace and local name.
    pub fn qname(&self) -> Result<QName> {
        QName::parse(&self.tag)
    }

    /// Returns the attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Looks up an attribute by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Returns the child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Iterates over the child elements, skipping comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Appends a child node.
    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Returns the element's own text.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Sets the element's own text.
    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Appends character data to the element's text.
    pub(crate) fn append_text(&mut self, chunk: &str) {
        self.text.get_or_insert_with(String::new).push_str(chunk);
    }

    /// Returns the namespace bindings in scope.
    pub fn nsmap(&self) -> &NsMap {
        &self.nsmap
    }

    /// Replaces the namespace bindings.
    pub fn set_nsmap(&mut self, nsmap: NsMap) {
        self.nsmap = nsmap;
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.tag)?;
        for (name, value) in &self.attributes {
            write!(f, " {}={}", name, value)?;
        }
        write!(f, " }}")
    }
}
