//! Loading records from element trees.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::error::LoadError;
use crate::node::{Element, Node, QName};
use crate::record::{Record, Value};
use crate::schema::{ChildInfo, FieldInfo, RecordType, Schema};

/// Options for loading.
///
/// The default is strict: undeclared attributes and child elements are
/// errors. The options apply to nested records as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip attributes the schema does not declare.
    pub ignore_unknown_attributes: bool,
    /// Skip child elements the schema does not declare.
    pub ignore_unknown_children: bool,
}

impl LoadOptions {
    /// Creates strict options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerates undeclared attributes and children.
    pub fn lenient() -> Self {
        LoadOptions {
            ignore_unknown_attributes: true,
            ignore_unknown_children: true,
        }
    }

    pub fn ignore_unknown_attributes(mut self, ignore: bool) -> Self {
        self.ignore_unknown_attributes = ignore;
        self
    }

    pub fn ignore_unknown_children(mut self, ignore: bool) -> Self {
        self.ignore_unknown_children = ignore;
        self
    }
}

/// Loads an instance of `record_type` from `element` with strict options.
///
/// When `expected_name` is given, the element's local name must equal it and
/// its namespace must be the record type's namespace.
pub fn load(
    record_type: &RecordType,
    element: &Element,
    expected_name: Option<&str>,
) -> Result<Record, LoadError> {
    load_with_options(record_type, element, expected_name, &LoadOptions::default())
}

/// Loads an instance of `record_type` from `element`.
pub fn load_with_options(
    record_type: &RecordType,
    element: &Element,
    expected_name: Option<&str>,
    options: &LoadOptions,
) -> Result<Record, LoadError> {
    let schema = record_type.schema().ok_or_else(|| LoadError::NotCompiled {
        record: record_type.name().to_string(),
    })?;
    trace!(tag = element.tag(), record = record_type.name(), "loading element");

    if let Some(expected) = expected_name {
        validate_name(record_type, element, expected)?;
    }

    let mut loader = Loader {
        element,
        options,
        values: HashMap::new(),
    };
    loader.load_attributes(schema)?;
    if schema.text().is_some() {
        loader.load_text(schema)?;
    } else {
        loader.load_children(schema)?;
    }

    let mut values = Vec::with_capacity(record_type.fields().len());
    for decl in record_type.fields() {
        let value = match loader.values.remove(decl.name()) {
            Some(value) => value,
            None => decl.default_policy().get().unwrap_or(Value::Absent),
        };
        // Defaults from a factory are only known now
        if !decl.metadata().ignored && !decl.ty().admits(&value) {
            return Err(LoadError::InvalidDefault {
                field: decl.name().to_string(),
                ty: decl.ty().to_string(),
                tag: element.tag().to_string(),
            });
        }
        values.push((decl.name().to_string(), value));
    }
    let record = Record::from_parts(record_type.clone(), values, Some(element.nsmap().clone()));

    if let Some(validator) = record_type.validator() {
        validator(&record).map_err(LoadError::Validation)?;
    }
    Ok(record)
}

fn validate_name(
    record_type: &RecordType,
    element: &Element,
    expected: &str,
) -> Result<(), LoadError> {
    // A tag that does not decode is compared as a bare local name
    let name = element
        .qname()
        .unwrap_or_else(|_| QName::no_namespace(element.tag()));

    if name.local_name != expected {
        return Err(LoadError::NameMismatch {
            found: name.local_name,
            expected: expected.to_string(),
            tag: element.tag().to_string(),
        });
    }
    if name.namespace() != record_type.namespace() {
        return Err(LoadError::NamespaceMismatch {
            found: display_ns(name.namespace()),
            expected: display_ns(record_type.namespace()),
            tag: element.tag().to_string(),
        });
    }
    Ok(())
}

fn display_ns(ns: Option<&str>) -> String {
    ns.unwrap_or("<none>").to_string()
}

/// Resolved values of one element, keyed by field name.
struct Loader<'a> {
    element: &'a Element,
    options: &'a LoadOptions,
    values: HashMap<String, Value>,
}

impl<'a> Loader<'a> {
    fn tag(&self) -> String {
        self.element.tag().to_string()
    }

    fn load_attributes(&mut self, schema: &Schema) -> Result<(), LoadError> {
        let mut consumed = HashSet::new();
        for info in schema.attributes() {
            let value = match self.element.attribute(&info.xml_name) {
                Some(value) => {
                    consumed.insert(info.xml_name.as_str());
                    Value::Str(value.to_string())
                }
                None => or_default(
                    &info.field,
                    LoadError::MissingAttribute {
                        name: info.xml_name.clone(),
                        tag: self.tag(),
                    },
                )?,
            };
            self.values.insert(info.field.field_name.clone(), value);
        }

        let undeclared: Vec<String> = self
            .element
            .attributes()
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !consumed.contains(name.as_str()))
            .cloned()
            .collect();
        if !undeclared.is_empty() {
            if !self.options.ignore_unknown_attributes {
                return Err(LoadError::UndeclaredAttributes {
                    tag: self.tag(),
                    names: undeclared,
                });
            }
            debug!(tag = self.element.tag(), names = ?undeclared, "ignoring undeclared attributes");
        }
        Ok(())
    }

    fn load_text(&mut self, schema: &Schema) -> Result<(), LoadError> {
        let Some(info) = schema.text() else {
            return Ok(());
        };
        match self.element.children().first() {
            Some(Node::Comment(_)) => {
                return Err(LoadError::ContainsComments { tag: self.tag() });
            }
            Some(Node::Element(_)) => {
                return Err(LoadError::HasChildElements { tag: self.tag() });
            }
            None => {}
        }

        let value = match self.element.text() {
            Some(text) => Value::Str(text.to_string()),
            None => or_default(&info.field, LoadError::NoText { tag: self.tag() })?,
        };
        self.values.insert(info.field.field_name.clone(), value);
        Ok(())
    }

    fn load_children(&mut self, schema: &Schema) -> Result<(), LoadError> {
        if self.element.text().is_some_and(|t| !t.trim().is_empty()) {
            return Err(LoadError::HasText { tag: self.tag() });
        }

        let element = self.element;
        let mut groups: Vec<(&str, Vec<&Element>)> = Vec::new();
        for child in element.children() {
            let child = match child {
                Node::Element(child) => child,
                Node::Comment(_) => {
                    return Err(LoadError::ContainsComments { tag: self.tag() });
                }
            };
            match groups.iter_mut().find(|(tag, _)| *tag == child.tag()) {
                Some((_, group)) => group.push(child),
                None => groups.push((child.tag(), vec![child])),
            }
        }

        let mut consumed = HashSet::new();
        for info in schema.children() {
            let group = groups
                .iter()
                .find(|(tag, _)| *tag == info.xml_name)
                .map(|(_, group)| group);
            let value = match group {
                None => or_default(
                    &info.field,
                    LoadError::MissingChild {
                        name: info.xml_name.clone(),
                        tag: self.tag(),
                    },
                )?,
                Some(group) => {
                    consumed.insert(info.xml_name.as_str());
                    self.load_group(info, group)?
                }
            };
            self.values.insert(info.field.field_name.clone(), value);
        }

        let undeclared: Vec<String> = groups
            .iter()
            .map(|(tag, _)| *tag)
            .filter(|tag| !consumed.contains(tag))
            .map(str::to_string)
            .collect();
        if !undeclared.is_empty() {
            if !self.options.ignore_unknown_children {
                return Err(LoadError::UndeclaredChildren {
                    tag: self.tag(),
                    names: undeclared,
                });
            }
            debug!(tag = self.element.tag(), names = ?undeclared, "ignoring undeclared children");
        }
        Ok(())
    }

    fn load_group(&self, info: &ChildInfo, group: &[&Element]) -> Result<Value, LoadError> {
        if info.is_list {
            let items = group
                .iter()
                .map(|child| self.load_child(info, child))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::List(items));
        }
        match group {
            [child] => Ok(Value::Record(self.load_child(info, child)?)),
            _ => Err(LoadError::MultipleChildren {
                name: info.xml_name.clone(),
                tag: self.tag(),
            }),
        }
    }

    /// Loads one child against the field's admissible types, first match wins.
    fn load_child(&self, info: &ChildInfo, child: &Element) -> Result<Record, LoadError> {
        if let [record_type] = info.types.as_slice() {
            return load_with_options(record_type, child, None, self.options);
        }

        let mut failures = Vec::with_capacity(info.types.len());
        for record_type in &info.types {
            match load_with_options(record_type, child, None, self.options) {
                Ok(record) => return Ok(record),
                Err(err) => {
                    debug!(
                        tag = child.tag(),
                        record = record_type.name(),
                        error = %err,
                        "union member rejected"
                    );
                    failures.push(err);
                }
            }
        }
        Err(LoadError::NoMatchingType {
            field: info.field.field_name.clone(),
            tag: self.tag(),
            failures,
        })
    }
}

/// Falls back to the field default, or fails with `missing` when required.
fn or_default(field: &FieldInfo, missing: LoadError) -> Result<Value, LoadError> {
    field.default_value().ok_or(missing)
}
