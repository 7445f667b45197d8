//! Element tree representation.
//!
//! The loader and dumper work on a plain owned tree: an [`Element`] with a
//! qualified tag, ordered attributes, ordered children, its own text and the
//! namespace-prefix map in scope. Children are either elements or comments;
//! comments are kept so that the loader can reject them.

mod element;
pub mod namespace;

pub use element::Element;
pub use namespace::{format_ns, is_xmlns_attr, split_qname, QName};

use std::collections::BTreeMap;

/// Prefix -> namespace URI bindings. The `None` key is the default namespace.
pub type NsMap = BTreeMap<Option<String>, String>;

/// A child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// A comment (without the `<!--` and `-->` markers).
    Comment(String),
}

impl Node {
    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Returns true if this is a comment node.
    pub fn is_comment(&self) -> bool {
        matches!(self, Node::Comment(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Comment(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}
