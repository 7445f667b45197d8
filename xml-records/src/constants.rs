//! Constants used throughout the crate.

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Reserved prefix for [`XML_NAMESPACE`]; never declared explicitly.
pub const XML_PREFIX: &str = "xml";

/// Attribute name used for namespace declarations.
pub const XMLNS: &str = "xmlns";

/// Base used when the printer has to invent a prefix (`ns0`, `ns1`, ...).
pub const GENERATED_PREFIX: &str = "ns";

/// Declaration written at the top of printed documents.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Indentation unit for pretty printing.
pub const INDENT: &str = "  ";
