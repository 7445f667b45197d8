//! Round-trip properties: dumping a record, printing it, parsing the output
//! and loading it again gives back an equal record.

use proptest::prelude::*;
use xml_records::{
    dump, load, parse_str, print_to_string, FieldDecl, FieldType, Record, RecordType, Value,
};

struct Types {
    item: RecordType,
    title: RecordType,
    root: RecordType,
}

fn types() -> Types {
    let item = RecordType::builder("Item")
        .no_namespace()
        .field(FieldDecl::new("id", FieldType::Str))
        .field(FieldDecl::new("label", FieldType::optional(FieldType::Str)).default(Value::Absent))
        .register()
        .unwrap();
    let title = RecordType::builder("Title")
        .namespace("urn:example:title")
        .field(FieldDecl::new("value", FieldType::Str).text())
        .register()
        .unwrap();
    let root = RecordType::builder("Root")
        .no_namespace()
        .field(FieldDecl::new("version", FieldType::Str))
        .field(
            FieldDecl::new("title", FieldType::optional(FieldType::record(&title)))
                .default(Value::Absent),
        )
        .field(
            FieldDecl::new("items", FieldType::list(FieldType::record(&item)))
                .default_with(|| Value::List(Vec::new())),
        )
        .register()
        .unwrap();
    Types { item, title, root }
}

fn attr_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 &<>\"'.:/-]{0,16}"
}

fn text_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9&<>\"'.:/-][a-zA-Z0-9 &<>\"'.:/-]{0,24}"
}

fn round_trip(types: &Types, record: &Record) -> Record {
    let el = dump(record, "root", None).unwrap();
    let xml = print_to_string(&el).unwrap();
    let parsed = parse_str(&xml).unwrap();
    load(&types.root, &parsed, Some("root")).unwrap()
}

proptest! {
    #[test]
    fn prop_record_round_trip(
        version in attr_value(),
        title in proptest::option::of(text_value()),
        items in proptest::collection::vec((attr_value(), proptest::option::of(attr_value())), 0..5),
    ) {
        let types = types();
        let title = title
            .map(|value| Record::builder(&types.title).set("value", value).build())
            .transpose()
            .unwrap();
        let items = items
            .into_iter()
            .map(|(id, label)| {
                Record::builder(&types.item)
                    .set("id", id)
                    .set("label", label)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let record = Record::builder(&types.root)
            .set("version", version)
            .set("title", title)
            .set("items", items)
            .build()
            .unwrap();

        let loaded = round_trip(&types, &record);
        prop_assert_eq!(loaded, record);
    }
}

#[test]
fn test_scenario_is_byte_equivalent() {
    let types = types();
    let xml = r#"<root version="1.0"><items id="a" /><items id="b" /></root>"#;
    let record = load(&types.root, &parse_str(xml).unwrap(), Some("root")).unwrap();

    let items = record.list_field("items").unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].str_field("id").unwrap(), "a");
    assert_eq!(items[1].str_field("id").unwrap(), "b");
    assert_eq!(record.opt_record_field("title").unwrap(), None);

    let printed = print_to_string(&dump(&record, "root", None).unwrap()).unwrap();
    assert!(printed.ends_with(&format!("{}\n", xml)));
}
