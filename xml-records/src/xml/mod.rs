//! XML parsing and output.
//!
//! This is the tree adapter the loader and dumper sit on: text in, an
//! [`Element`](crate::node::Element) tree out, and back.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str, XmlParser};
pub use printer::{print_to_string, print_to_string_pretty, PrinterOptions, XmlPrinter};
