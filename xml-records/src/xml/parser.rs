//! XML parser that builds element trees.
//!
//! This parser uses quick-xml's streaming API. Prefixes are resolved while
//! reading, so the resulting tree only carries qualified-name tokens plus the
//! prefix map in scope on each element.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::node::namespace::NamespaceContext;
use crate::node::{is_xmlns_attr, split_qname, Element, Node};

/// XML parser that builds element trees.
#[derive(Debug, Default)]
pub struct XmlParser;

impl XmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        XmlParser
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        // Text is kept verbatim; record text values must survive unchanged
        reader.config_mut().trim_text(false);
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Element> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text(false);
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a quick-xml Reader.
    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<Element> {
        let mut ctx = NamespaceContext::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let element = self.parse_element(e, reader, &mut ctx)?;
                    stack.push(element);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = self.parse_element(e, reader, &mut ctx)?;
                    ctx.pop_scope();
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::End(_)) => {
                    ctx.pop_scope();
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Parse("unexpected closing tag".to_string()))?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::Text(e)) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::GeneralRef(ref e)) => {
                    let resolved = resolve_reference(e)?;
                    append_text(&mut stack, &resolved)?;
                }
                Ok(Event::Comment(ref e)) => {
                    let comment = String::from_utf8_lossy(e.as_ref()).to_string();
                    // Comments outside the root element are dropped
                    if let Some(parent) = stack.last_mut() {
                        parent.push(Node::Comment(comment));
                    }
                }
                Ok(Event::Decl(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => {
                    // Ignore XML declaration, processing instructions and DOCTYPE
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Parse("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| Error::Parse("document has no root element".to_string()))
    }

    /// Parses an element's name and attributes, opening a namespace scope.
    fn parse_element<R: BufRead>(
        &self,
        e: &BytesStart,
        reader: &Reader<R>,
        ctx: &mut NamespaceContext,
    ) -> Result<Element> {
        let decoder = reader.decoder();
        let name = decoder
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        ctx.push_scope();
        let mut raw_attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
            let key = decoder
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            if is_xmlns_attr(&key) {
                let (_, prefix) = split_qname(&key);
                let prefix = if key.contains(':') { prefix } else { "" };
                ctx.bind(prefix, &value);
            } else {
                raw_attributes.push((key, value));
            }
        }

        let tag = ctx.resolve_qname(&name, false)?;
        let mut element = Element::with_nsmap(tag.to_string(), ctx.in_scope());
        for (key, value) in raw_attributes {
            let qname = ctx.resolve_qname(&key, true)?.to_string();
            if element.attribute(&qname).is_some() {
                return Err(Error::Parse(format!(
                    "duplicated attribute '{}' on '{}'",
                    qname,
                    element.tag()
                )));
            }
            element.set_attribute(qname, value);
        }
        Ok(element)
    }
}

/// Attaches a finished element to its parent, or makes it the root.
fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Parse("multiple root elements".to_string())),
    }
    Ok(())
}

/// Adds character data to the open element; only whitespace may sit outside.
fn append_text(stack: &mut [Element], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(current) => current.append_text(text),
        None if text.trim().is_empty() => {}
        None => return Err(Error::Parse("text outside of root element".to_string())),
    }
    Ok(())
}

/// Resolves a character or predefined entity reference.
fn resolve_reference(e: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = e
        .resolve_char_ref()
        .map_err(|err| Error::Parse(err.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = e.decode().map_err(|err| Error::Parse(err.to_string()))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| Error::Parse(format!("unknown entity '&{};'", name)))
}

/// Parses XML from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Element> {
    XmlParser::new().parse_file(path)
}

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<Element> {
    XmlParser::new().parse_str(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let root = parse_str(r#"<root><child>text</child></root>"#).unwrap();
        assert_eq!(root.tag(), "root");
        assert_eq!(root.children().len(), 1);

        let child = root.child_elements().next().unwrap();
        assert_eq!(child.tag(), "child");
        assert_eq!(child.text(), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes() {
        let root = parse_str(r#"<root id="foo" class="bar">content</root>"#).unwrap();
        assert_eq!(root.attribute("id"), Some("foo"));
        assert_eq!(root.attribute("class"), Some("bar"));
        assert_eq!(root.attributes()[0].0, "id");
        assert_eq!(root.text(), Some("content"));
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let root = parse_str("<root>  hello   world  </root>").unwrap();
        assert_eq!(root.text(), Some("  hello   world  "));
    }

    #[test]
    fn test_empty_element_has_no_text() {
        let root = parse_str(r#"<root><empty /><also></also></root>"#).unwrap();
        for child in root.child_elements() {
            assert_eq!(child.text(), None);
            assert!(child.children().is_empty());
        }
    }

    #[test]
    fn test_entities() {
        let root = parse_str(r#"<root a="&amp;&lt;&quot;">x &amp; y &#65;&#x42;</root>"#).unwrap();
        assert_eq!(root.attribute("a"), Some("&<\""));
        assert_eq!(root.text(), Some("x & y AB"));
    }

    #[test]
    fn test_namespaces_resolved() {
        let xml = r#"<c:container xmlns:c="urn:container" xmlns="urn:default" version="1.0">
            <rootfiles c:flag="yes"/>
        </c:container>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(root.tag(), "{urn:container}container");
        assert_eq!(root.attribute("version"), Some("1.0"));
        assert_eq!(root.nsmap().len(), 2);
        assert_eq!(
            root.nsmap().get(&None).map(String::as_str),
            Some("urn:default")
        );

        let child = root.child_elements().next().unwrap();
        assert_eq!(child.tag(), "{urn:default}rootfiles");
        assert_eq!(child.attribute("{urn:container}flag"), Some("yes"));
        // inherited bindings are visible on children
        assert_eq!(child.nsmap(), root.nsmap());
    }

    #[test]
    fn test_comments_are_nodes() {
        let root = parse_str("<!-- before --><root><!-- inside --><a/></root>").unwrap();
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0], Node::Comment(" inside ".to_string()));
    }

    #[test]
    fn test_unbound_prefix_is_error() {
        assert!(parse_str("<x:root/>").is_err());
    }

    #[test]
    fn test_attributes_resolving_to_one_name() {
        let err = parse_str(r#"<root xmlns:p="urn:a" xmlns:q="urn:a" p:x="1" q:x="2"/>"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicated attribute '{urn:a}x'"));

        let root = parse_str(r#"<root xmlns:p="urn:a" p:x="1" x="2"/>"#).unwrap();
        assert_eq!(root.attribute("{urn:a}x"), Some("1"));
        assert_eq!(root.attribute("x"), Some("2"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_str("").is_err());
        assert!(parse_str("<a/><b/>").is_err());
        assert!(parse_str("<a><b></a>").is_err());
    }
}
