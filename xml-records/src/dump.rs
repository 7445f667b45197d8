//! Dumping records to element trees.

use tracing::trace;

use crate::error::DumpError;
use crate::node::{format_ns, Element, NsMap};
use crate::record::{Record, Value};
use crate::schema::FieldInfo;

/// Writes `record` as an element named `name`.
///
/// A bare `name` is placed in the record type's namespace; a
/// `{namespace}local` token is used as is. The element carries the record's
/// own namespace bindings, or `nsmap` when the record has none.
pub fn dump(record: &Record, name: &str, nsmap: Option<&NsMap>) -> Result<Element, DumpError> {
    let record_type = record.record_type();
    let schema = record_type.schema().ok_or_else(|| DumpError::NotCompiled {
        record: record_type.name().to_string(),
    })?;

    let tag = if name.starts_with('{') {
        name.to_string()
    } else {
        format_ns(name, record_type.namespace())
    };
    trace!(tag = %tag, record = record_type.name(), "dumping record");

    let bindings = record
        .nsmap()
        .filter(|map| !map.is_empty())
        .or(nsmap)
        .cloned()
        .unwrap_or_default();
    let mut element = Element::with_nsmap(tag, bindings);

    for info in schema.attributes() {
        match record.get(&info.field.field_name) {
            Some(Value::Str(value)) => {
                element.set_attribute(info.xml_name.as_str(), value.as_str())
            }
            Some(Value::Absent) if info.field.is_optional => {}
            _ => return Err(invalid_value(record, &info.field, "an attribute")),
        }
    }

    if let Some(info) = schema.text() {
        match record.get(&info.field.field_name) {
            Some(Value::Str(text)) => element.set_text(Some(text.clone())),
            Some(Value::Absent) if info.field.is_optional => {}
            _ => return Err(invalid_value(record, &info.field, "text")),
        }
        return Ok(element);
    }

    for info in schema.children() {
        match (record.get(&info.field.field_name), info.is_list) {
            (Some(Value::Record(child)), false) => {
                element.push(dump(child, &info.xml_name, nsmap)?)
            }
            (Some(Value::List(items)), true) => {
                for item in items {
                    element.push(dump(item, &info.xml_name, nsmap)?);
                }
            }
            (Some(Value::Absent), _) if info.field.is_optional => {}
            (_, false) => return Err(invalid_value(record, &info.field, "a child element")),
            (_, true) => return Err(invalid_value(record, &info.field, "child elements")),
        }
    }
    Ok(element)
}

fn invalid_value(record: &Record, field: &FieldInfo, expected: &'static str) -> DumpError {
    DumpError::InvalidValue {
        record: record.record_type().name().to_string(),
        field: field.field_name.clone(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::load;
    use crate::schema::{FieldDecl, FieldType, RecordType};
    use crate::xml::{parse_str, print_to_string, PrinterOptions, XmlPrinter};

    const NS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";

    fn print_compact(element: &Element) -> String {
        let mut out = Vec::new();
        let options = PrinterOptions {
            pretty_print: false,
            xml_declaration: false,
        };
        XmlPrinter::with_options(&mut out, options)
            .print(element)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn item_type() -> RecordType {
        RecordType::builder("Item")
            .no_namespace()
            .field(FieldDecl::new("id", FieldType::Str))
            .register()
            .unwrap()
    }

    #[test]
    fn test_list_scenario_round_trip() {
        let item = item_type();
        let root = RecordType::builder("Root")
            .no_namespace()
            .field(FieldDecl::new("version", FieldType::Str))
            .field(FieldDecl::new("items", FieldType::list(FieldType::record(&item))))
            .register()
            .unwrap();

        let xml = r#"<root version="1.0"><items id="a" /><items id="b" /></root>"#;
        let record = load(&root, &parse_str(xml).unwrap(), Some("root")).unwrap();
        let element = dump(&record, "root", None).unwrap();
        assert_eq!(print_compact(&element), xml);
    }

    #[test]
    fn test_optional_attribute_omitted_only_when_absent() {
        let rt = RecordType::builder("Foo")
            .no_namespace()
            .field(
                FieldDecl::new("lang", FieldType::optional(FieldType::Str))
                    .default(Value::Absent),
            )
            .field(FieldDecl::new("dir", FieldType::optional(FieldType::Str)).default("ltr"))
            .register()
            .unwrap();

        let record = Record::builder(&rt).build().unwrap();
        let element = dump(&record, "foo", None).unwrap();
        // a value equal to the literal default is still written
        assert_eq!(element.attributes(), &[("dir".to_string(), "ltr".to_string())]);
    }

    #[test]
    fn test_text_record() {
        let rt = RecordType::builder("Title")
            .namespace("urn:dc")
            .field(FieldDecl::new("value", FieldType::Str).text())
            .register()
            .unwrap();
        let record = Record::builder(&rt).set("value", "Moby Dick").build().unwrap();
        let element = dump(&record, "title", None).unwrap();
        assert_eq!(element.tag(), "{urn:dc}title");
        assert_eq!(element.text(), Some("Moby Dick"));
    }

    #[test]
    fn test_namespace_fallback() {
        let rt = RecordType::builder("Container")
            .namespace(NS)
            .field(FieldDecl::new("version", FieldType::Str))
            .register()
            .unwrap();
        let mut fallback = NsMap::new();
        fallback.insert(None, NS.to_string());

        let record = Record::builder(&rt).set("version", "1.0").build().unwrap();
        assert!(record.nsmap().is_none());
        let element = dump(&record, "container", Some(&fallback)).unwrap();
        assert_eq!(
            print_compact(&element),
            format!(r#"<container xmlns="{}" version="1.0" />"#, NS)
        );

        let mut own = NsMap::new();
        own.insert(Some("c".to_string()), NS.to_string());
        let record = record.with_nsmap(Some(own));
        let element = dump(&record, "container", Some(&fallback)).unwrap();
        assert_eq!(
            print_compact(&element),
            format!(r#"<c:container xmlns:c="{}" version="1.0" />"#, NS)
        );
    }

    #[test]
    fn test_explicit_qualified_name() {
        let item = item_type();
        let record = Record::builder(&item).set("id", "a").build().unwrap();
        let element = dump(&record, "{urn:x}entry", None).unwrap();
        assert_eq!(element.tag(), "{urn:x}entry");
        assert!(print_to_string(&element).unwrap().contains("<ns0:entry"));
    }

    #[test]
    fn test_unnamespaced_record_with_default_fallback() {
        let rt = RecordType::builder("Root")
            .no_namespace()
            .field(FieldDecl::new("version", FieldType::Str))
            .register()
            .unwrap();
        let mut fallback = NsMap::new();
        fallback.insert(None, "urn:a".to_string());

        let record = Record::builder(&rt).set("version", "1.0").build().unwrap();
        let element = dump(&record, "root", Some(&fallback)).unwrap();
        let xml = print_compact(&element);
        assert_eq!(xml, r#"<root version="1.0" />"#);

        let reloaded = load(&rt, &parse_str(&xml).unwrap(), Some("root")).unwrap();
        assert_eq!(reloaded, record);
    }

    #[test]
    fn test_value_of_wrong_kind_is_an_error() {
        let item = item_type();
        let rt = RecordType::builder("Root")
            .no_namespace()
            .field(FieldDecl::new("version", FieldType::Str))
            .field(FieldDecl::new("items", FieldType::list(FieldType::record(&item))))
            .register()
            .unwrap();

        let missing_attr = Record::from_parts(
            rt.clone(),
            vec![
                ("version".to_string(), Value::Absent),
                ("items".to_string(), Value::List(Vec::new())),
            ],
            None,
        );
        let err = dump(&missing_attr, "root", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'version' of 'Root' holds no value that can be written as an attribute"
        );

        let bad_list = Record::from_parts(
            rt,
            vec![
                ("version".to_string(), Value::from("1.0")),
                ("items".to_string(), Value::from("oops")),
            ],
            None,
        );
        assert!(matches!(
            dump(&bad_list, "root", None),
            Err(DumpError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_uncompiled_type() {
        let rt = RecordType::builder("Foo").no_namespace().build();
        let record = Record::builder(&rt).build().unwrap();
        assert!(matches!(
            dump(&record, "foo", None),
            Err(DumpError::NotCompiled { .. })
        ));
    }
}
