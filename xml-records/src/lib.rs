//! XML Records - schema-checked XML data binding
//!
//! This library maps XML elements to typed records and back. A record type
//! declares its fields in order; each string field becomes an attribute or
//! the element's text, each record-typed field becomes child elements.
//!
//! # Overview
//!
//! - [`RecordType`] declarations are compiled once into a [`Schema`], which
//!   rejects ambiguous or unsupported mappings up front.
//! - [`load`] checks an [`Element`] against a schema and builds a [`Record`].
//!   Undeclared attributes or children are errors unless [`LoadOptions`]
//!   say otherwise. Union fields try each admissible type in order.
//! - [`dump`] writes a record back, reusing the namespace prefixes captured
//!   when it was loaded.
//! - [`parse_str`] and [`XmlPrinter`] convert between text and trees.
//!
//! # Example
//!
//! ```
//! use xml_records::{load, dump, parse_str, print_to_string, FieldDecl, FieldType, RecordType};
//!
//! let item = RecordType::builder("Item")
//!     .no_namespace()
//!     .field(FieldDecl::new("id", FieldType::Str))
//!     .register()
//!     .unwrap();
//! let root = RecordType::builder("Root")
//!     .no_namespace()
//!     .field(FieldDecl::new("version", FieldType::Str))
//!     .field(FieldDecl::new("items", FieldType::list(FieldType::record(&item))))
//!     .register()
//!     .unwrap();
//!
//! let tree = parse_str(r#"<root version="1.0"><items id="a"/><items id="b"/></root>"#).unwrap();
//! let record = load(&root, &tree, Some("root")).unwrap();
//! assert_eq!(record.list_field("items").unwrap().len(), 2);
//!
//! let xml = print_to_string(&dump(&record, "root", None).unwrap()).unwrap();
//! assert!(xml.contains(r#"<items id="b" />"#));
//! ```

pub mod constants;
pub mod dump;
pub mod error;
pub mod load;
pub mod node;
pub mod record;
pub mod schema;
pub mod typed;
pub mod xml;

// Re-export commonly used types
pub use dump::dump;
pub use error::{
    DumpError, Error, FieldKind, LoadError, RecordError, Result, SchemaError, TypeError,
};
pub use load::{load, load_with_options, LoadOptions};
pub use node::{format_ns, Element, Node, NsMap, QName};
pub use record::{Record, RecordBuilder, Value};
pub use schema::{
    AttrInfo, ChildInfo, FieldDecl, FieldDefault, FieldInfo, FieldMetadata, FieldType, RecordType,
    RecordTypeBuilder, Schema, TextInfo,
};
pub use typed::{dump_as, load_as, load_as_with_options, XmlRecord};
pub use xml::{
    parse_file, parse_str, print_to_string, print_to_string_pretty, PrinterOptions, XmlParser,
    XmlPrinter,
};
