//! XML printer that outputs element trees.
//!
//! Qualified-name tokens are turned back into prefixed names here. Each
//! element declares only the bindings of its namespace map that are not
//! already in scope from its parent; namespaces with no binding at all get a
//! generated `nsN` prefix.

use std::io::Write;

use crate::constants::{
    GENERATED_PREFIX, INDENT, XMLNS, XML_DECLARATION, XML_NAMESPACE, XML_PREFIX,
};
use crate::error::Result;
use crate::node::{Element, Node, NsMap, QName};

/// Options for XML printing.
#[derive(Debug, Clone)]
pub struct PrinterOptions {
    /// Whether to pretty-print with indentation.
    pub pretty_print: bool,
    /// Whether to start the output with an XML declaration.
    pub xml_declaration: bool,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        PrinterOptions {
            pretty_print: false,
            xml_declaration: true,
        }
    }
}

/// XML printer that outputs element trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: PrinterOptions,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, PrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(writer: W, options: PrinterOptions) -> Self {
        XmlPrinter { writer, options }
    }

    /// Prints an element tree as a document.
    pub fn print(&mut self, root: &Element) -> Result<()> {
        if self.options.xml_declaration {
            write!(self.writer, "{}", XML_DECLARATION)?;
            writeln!(self.writer)?;
        }
        self.print_element(root, &NsMap::new(), 0)?;
        if self.options.pretty_print || self.options.xml_declaration {
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn print_element(
        &mut self,
        element: &Element,
        parent_scope: &NsMap,
        level: usize,
    ) -> Result<()> {
        let mut scope = parent_scope.clone();
        let mut decls: Vec<(Option<String>, String)> = Vec::new();

        for (prefix, uri) in element.nsmap() {
            if scope.get(prefix) != Some(uri) {
                scope.insert(prefix.clone(), uri.clone());
                decls.push((prefix.clone(), uri.clone()));
            }
        }

        let tag = QName::parse(element.tag())?;
        let lexical_tag = match tag.namespace() {
            Some(uri) => {
                let prefix = match element_prefix(&scope, uri) {
                    Some(prefix) => prefix,
                    None => {
                        let prefix = generate_prefix(&scope);
                        scope.insert(Some(prefix.clone()), uri.to_string());
                        decls.push((Some(prefix.clone()), uri.to_string()));
                        Some(prefix)
                    }
                };
                lexical(prefix.as_deref(), &tag.local_name)
            }
            None => {
                // An un-namespaced element must not sit in a default namespace
                decls.retain(|(prefix, _)| prefix.is_some());
                scope.remove(&None);
                if parent_scope.contains_key(&None) {
                    decls.insert(0, (None, String::new()));
                }
                tag.local_name.clone()
            }
        };

        let mut attributes = Vec::with_capacity(element.attributes().len());
        for (key, value) in element.attributes() {
            let name = QName::parse(key)?;
            let lexical_name = match name.namespace() {
                Some(XML_NAMESPACE) => lexical(Some(XML_PREFIX), &name.local_name),
                Some(uri) => {
                    let prefix = match attribute_prefix(&scope, uri) {
                        Some(prefix) => prefix,
                        None => {
                            let prefix = generate_prefix(&scope);
                            scope.insert(Some(prefix.clone()), uri.to_string());
                            decls.push((Some(prefix.clone()), uri.to_string()));
                            prefix
                        }
                    };
                    lexical(Some(&prefix), &name.local_name)
                }
                None => name.local_name.clone(),
            };
            attributes.push((lexical_name, value));
        }

        let pretty = self.options.pretty_print;
        if pretty {
            write!(self.writer, "{}", INDENT.repeat(level))?;
        }
        write!(self.writer, "<{}", lexical_tag)?;
        for (prefix, uri) in &decls {
            match prefix {
                Some(prefix) => {
                    write!(self.writer, " {}:{}=\"{}\"", XMLNS, prefix, to_entities(uri))?
                }
                None => write!(self.writer, " {}=\"{}\"", XMLNS, to_entities(uri))?,
            }
        }
        for (name, value) in &attributes {
            write!(self.writer, " {}=\"{}\"", name, to_entities(value))?;
        }

        // Whitespace between child elements is indentation, not content
        let text = element
            .text()
            .filter(|t| !(pretty && !element.children().is_empty() && t.trim().is_empty()));

        if element.children().is_empty() && text.is_none() {
            write!(self.writer, " />")?;
            return Ok(());
        }
        write!(self.writer, ">")?;
        if let Some(text) = text {
            write!(self.writer, "{}", to_entities(text))?;
        }

        if !element.children().is_empty() {
            for child in element.children() {
                if pretty {
                    writeln!(self.writer)?;
                }
                match child {
                    Node::Element(child) => self.print_element(child, &scope, level + 1)?,
                    Node::Comment(comment) => {
                        if pretty {
                            write!(self.writer, "{}", INDENT.repeat(level + 1))?;
                        }
                        write!(self.writer, "<!--{}-->", comment)?;
                    }
                }
            }
            if pretty {
                writeln!(self.writer)?;
                write!(self.writer, "{}", INDENT.repeat(level))?;
            }
        }
        write!(self.writer, "</{}>", lexical_tag)?;
        Ok(())
    }
}

/// Picks a prefix for an element namespace, preferring the default binding.
fn element_prefix(scope: &NsMap, uri: &str) -> Option<Option<String>> {
    if scope.get(&None).map(String::as_str) == Some(uri) {
        return Some(None);
    }
    attribute_prefix(scope, uri).map(Some)
}

/// Picks a non-default prefix for a namespace; attributes cannot use the default.
fn attribute_prefix(scope: &NsMap, uri: &str) -> Option<String> {
    scope
        .iter()
        .find_map(|(prefix, bound)| prefix.as_ref().filter(|_| bound == uri).cloned())
}

/// Finds the first `nsN` prefix not bound in scope.
fn generate_prefix(scope: &NsMap) -> String {
    (0..)
        .map(|n| format!("{}{}", GENERATED_PREFIX, n))
        .find(|candidate| !scope.contains_key(&Some(candidate.clone())))
        .unwrap_or_else(|| GENERATED_PREFIX.to_string())
}

fn lexical(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

/// Converts special characters to XML entities.
fn to_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\'' => result.push_str("&apos;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Prints an element tree to a string.
pub fn print_to_string(root: &Element) -> Result<String> {
    let mut output = Vec::new();
    XmlPrinter::new(&mut output).print(root)?;
    Ok(String::from_utf8_lossy(&output).to_string())
}

/// Prints an element tree to a string with pretty printing.
pub fn print_to_string_pretty(root: &Element) -> Result<String> {
    let mut output = Vec::new();
    let options = PrinterOptions {
        pretty_print: true,
        ..Default::default()
    };
    XmlPrinter::with_options(&mut output, options).print(root)?;
    Ok(String::from_utf8_lossy(&output).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    fn compact(root: &Element) -> String {
        let mut output = Vec::new();
        let options = PrinterOptions {
            pretty_print: false,
            xml_declaration: false,
        };
        XmlPrinter::with_options(&mut output, options)
            .print(root)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_print_simple() {
        let root = parse_str(r#"<root>text</root>"#).unwrap();
        let output = print_to_string(&root).unwrap();
        assert!(output.starts_with(XML_DECLARATION));
        assert!(output.contains("<root>text</root>"));
    }

    #[test]
    fn test_print_keeps_attribute_order() {
        let root = parse_str(r#"<root b="2" a="1" />"#).unwrap();
        assert_eq!(compact(&root), r#"<root b="2" a="1" />"#);
    }

    #[test]
    fn test_entity_encoding() {
        let root = parse_str(r#"<root attr="&amp;&lt;&gt;">&amp;&lt;&gt;</root>"#).unwrap();
        assert_eq!(
            compact(&root),
            r#"<root attr="&amp;&lt;&gt;">&amp;&lt;&gt;</root>"#
        );
    }

    #[test]
    fn test_default_namespace_declared_once() {
        let xml = r#"<container xmlns="urn:c" version="1.0"><rootfiles><rootfile id="a" /></rootfiles></container>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(compact(&root), xml);
    }

    #[test]
    fn test_prefixed_namespaces_preserved() {
        let xml = r#"<opf:package xmlns:dc="urn:dc" xmlns:opf="urn:opf"><dc:title opf:lang="en">T</dc:title></opf:package>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(compact(&root), xml);
    }

    #[test]
    fn test_generated_prefixes() {
        let mut root = Element::new("{urn:a}root");
        root.set_attribute("{urn:b}flag", "y");
        assert_eq!(
            compact(&root),
            r#"<ns0:root xmlns:ns0="urn:a" xmlns:ns1="urn:b" ns1:flag="y" />"#
        );
    }

    #[test]
    fn test_unnamespaced_child_under_default() {
        let mut nsmap = NsMap::new();
        nsmap.insert(None, "urn:a".to_string());
        let mut root = Element::with_nsmap("{urn:a}root", nsmap);
        root.push(Element::new("plain"));
        assert_eq!(
            compact(&root),
            r#"<root xmlns="urn:a"><plain xmlns="" /></root>"#
        );
    }

    #[test]
    fn test_unnamespaced_root_drops_own_default() {
        let mut nsmap = NsMap::new();
        nsmap.insert(None, "urn:a".to_string());
        nsmap.insert(Some("a".to_string()), "urn:a".to_string());
        let mut root = Element::with_nsmap("root", nsmap.clone());
        root.set_attribute("version", "1.0");
        root.push(Element::with_nsmap("{urn:a}item", nsmap));

        let output = compact(&root);
        assert_eq!(
            output,
            r#"<root xmlns:a="urn:a" version="1.0"><item xmlns="urn:a" /></root>"#
        );
        assert_eq!(parse_str(&output).unwrap().tag(), "root");
    }

    #[test]
    fn test_pretty_print() {
        let root = parse_str("<root>\n<child>text</child>\n<!--note--></root>").unwrap();
        let output = print_to_string_pretty(&root).unwrap();
        assert!(output.contains("<root>\n  <child>text</child>\n  <!--note-->\n</root>"));
    }

    #[test]
    fn test_double_round_trip() {
        let xml = r#"<doc xmlns:x="urn:x"><section x:id="s1"><para>First.</para><para>Second &amp; last.</para></section></doc>"#;
        let tree1 = parse_str(xml).unwrap();
        let output1 = print_to_string_pretty(&tree1).unwrap();
        let tree2 = parse_str(&output1).unwrap();
        let output2 = print_to_string_pretty(&tree2).unwrap();

        assert_eq!(output1, output2);
    }
}
