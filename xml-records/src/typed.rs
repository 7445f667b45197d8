//! Static Rust types backed by a record type.
//!
//! Implement [`XmlRecord`] for a struct to load and dump it directly; the
//! conversion goes through a [`Record`] checked against the struct's record
//! type.
//!
//! ```ignore
//! static ROOTFILE: Lazy<RecordType> = Lazy::new(|| {
//!     RecordType::builder("Rootfile")
//!         .namespace(CONTAINER_NS)
//!         .field(FieldDecl::new("full_path", FieldType::Str).rename("full-path"))
//!         .build()
//! });
//!
//! impl XmlRecord for Rootfile {
//!     fn record_type() -> &'static RecordType { &ROOTFILE }
//!     // ...
//! }
//!
//! let rootfile: Rootfile = load_as(&element, Some("rootfile"))?;
//! ```

use crate::dump::dump;
use crate::error::{RecordError, Result};
use crate::load::{load_with_options, LoadOptions};
use crate::node::{Element, NsMap};
use crate::record::Record;
use crate::schema::RecordType;

/// A Rust type with an XML record mapping.
pub trait XmlRecord: Sized {
    /// The record type describing this struct.
    fn record_type() -> &'static RecordType;

    /// Reads a struct out of a record of [`record_type`](Self::record_type).
    fn from_record(record: &Record) -> std::result::Result<Self, RecordError>;

    /// Converts the struct into a record of [`record_type`](Self::record_type).
    fn to_record(&self) -> std::result::Result<Record, RecordError>;
}

/// Loads a `T` from `element`, compiling its record type first if needed.
pub fn load_as<T: XmlRecord>(element: &Element, expected_name: Option<&str>) -> Result<T> {
    load_as_with_options(element, expected_name, &LoadOptions::default())
}

/// Loads a `T` from `element` with the given options.
pub fn load_as_with_options<T: XmlRecord>(
    element: &Element,
    expected_name: Option<&str>,
    options: &LoadOptions,
) -> Result<T> {
    let record_type = T::record_type();
    record_type.compile()?;
    let record = load_with_options(record_type, element, expected_name, options)?;
    record.expect_type(record_type)?;
    Ok(T::from_record(&record)?)
}

/// Dumps `value` as an element named `name`.
pub fn dump_as<T: XmlRecord>(value: &T, name: &str, nsmap: Option<&NsMap>) -> Result<Element> {
    T::record_type().compile()?;
    let record = value.to_record()?;
    record.expect_type(T::record_type())?;
    Ok(dump(&record, name, nsmap)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::{FieldDecl, FieldType};
    use crate::xml::parse_str;
    use once_cell::sync::Lazy;

    static POINT: Lazy<RecordType> = Lazy::new(|| {
        RecordType::builder("Point")
            .no_namespace()
            .field(FieldDecl::new("x", FieldType::Str))
            .field(FieldDecl::new("y", FieldType::Str))
            .build()
    });

    #[derive(Debug, PartialEq)]
    struct Point {
        x: String,
        y: String,
    }

    impl XmlRecord for Point {
        fn record_type() -> &'static RecordType {
            &POINT
        }

        fn from_record(record: &Record) -> std::result::Result<Self, RecordError> {
            Ok(Point {
                x: record.str_field("x")?.to_string(),
                y: record.str_field("y")?.to_string(),
            })
        }

        fn to_record(&self) -> std::result::Result<Record, RecordError> {
            Record::builder(Self::record_type())
                .set("x", self.x.as_str())
                .set("y", self.y.as_str())
                .build()
        }
    }

    #[test]
    fn test_load_compiles_on_first_use() {
        let el = parse_str(r#"<point x="1" y="2"/>"#).unwrap();
        let point: Point = load_as(&el, Some("point")).unwrap();
        assert_eq!(
            point,
            Point {
                x: "1".to_string(),
                y: "2".to_string()
            }
        );
        assert!(POINT.is_compiled());
    }

    #[test]
    fn test_dump_as() {
        let point = Point {
            x: "3".to_string(),
            y: "4".to_string(),
        };
        let el = dump_as(&point, "point", None).unwrap();
        assert_eq!(el.attribute("x"), Some("3"));
        assert_eq!(el.attribute("y"), Some("4"));
    }

    #[test]
    fn test_load_error_is_wrapped() {
        let el = parse_str(r#"<point x="1"/>"#).unwrap();
        let err = load_as::<Point>(&el, None).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }
}
