//! Schema compiler.

use std::collections::HashMap;

use tracing::debug;

use super::{AttrInfo, ChildInfo, FieldDecl, FieldInfo, FieldType, RecordType, Schema, TextInfo};
use crate::error::{FieldKind, SchemaError, TypeError};
use crate::node::format_ns;

/// A field after its role has been resolved.
enum Resolved {
    Attribute(AttrInfo),
    Text(TextInfo),
    Child(ChildInfo),
}

/// Remembers which field claimed each qualified name.
struct NameTracker {
    kind: FieldKind,
    seen: HashMap<String, String>,
}

impl NameTracker {
    fn new(kind: FieldKind) -> Self {
        NameTracker {
            kind,
            seen: HashMap::new(),
        }
    }

    fn add(&mut self, xml_name: &str, field_name: &str) -> Result<(), SchemaError> {
        if let Some(previous) = self.seen.get(xml_name) {
            return Err(SchemaError::DuplicateField {
                kind: self.kind,
                xml_name: xml_name.to_string(),
                field: field_name.to_string(),
                previous: previous.clone(),
            });
        }
        self.seen
            .insert(xml_name.to_string(), field_name.to_string());
        Ok(())
    }
}

/// Builds the schema of `record_type` from its field declarations.
pub(crate) fn compile(record_type: &RecordType) -> Result<Schema, SchemaError> {
    if !record_type.declares_namespace() {
        return Err(SchemaError::NoNamespace {
            record: record_type.name().to_string(),
        });
    }

    let mut seen_attributes = NameTracker::new(FieldKind::Attribute);
    let mut seen_children = NameTracker::new(FieldKind::Child);
    let mut schema = Schema::default();

    for decl in record_type.fields() {
        if decl.metadata().ignored {
            continue;
        }

        match resolve_field(decl)? {
            Resolved::Text(info) => {
                if let Some(previous) = &schema.text {
                    return Err(SchemaError::DuplicateText {
                        field: info.field.field_name,
                        previous: previous.field.field_name.clone(),
                    });
                }
                schema.text = Some(info);
            }
            Resolved::Attribute(info) => {
                seen_attributes.add(&info.xml_name, &info.field.field_name)?;
                schema.attributes.push(info);
            }
            Resolved::Child(info) => {
                seen_children.add(&info.xml_name, &info.field.field_name)?;
                schema.children.push(info);
            }
        }
        check_default(decl)?;
    }

    if schema.text.is_some() && !schema.children.is_empty() {
        return Err(SchemaError::TextWithChildren {
            record: record_type.name().to_string(),
        });
    }

    debug!(
        record = record_type.name(),
        attributes = schema.attributes.len(),
        children = schema.children.len(),
        text = schema.text.is_some(),
        "compiled record schema"
    );
    Ok(schema)
}

fn resolve_field(decl: &FieldDecl) -> Result<Resolved, SchemaError> {
    // Optional is only meaningful at the outermost level
    let (ty, is_optional) = resolve_optional(decl.ty());
    let info = FieldInfo::new(decl, is_optional);
    let metadata = decl.metadata();

    if let FieldType::Str = ty {
        if metadata.text {
            if metadata.rename.is_some() {
                return Err(SchemaError::TextRenamed {
                    field: info.field_name,
                });
            }
            if metadata.namespace.is_some() {
                return Err(SchemaError::TextNamespaced {
                    field: info.field_name,
                });
            }
            return Ok(Resolved::Text(TextInfo { field: info }));
        }
        let local = metadata.rename.as_deref().unwrap_or(decl.name());
        let xml_name = format_ns(local, metadata.namespace.as_deref());
        return Ok(Resolved::Attribute(AttrInfo {
            field: info,
            xml_name,
        }));
    }

    let (types, is_list) = resolve_child_type(ty).map_err(|source| SchemaError::InvalidType {
        field: decl.name().to_string(),
        ty: decl.ty().to_string(),
        source,
    })?;
    if metadata.namespace.is_some() {
        return Err(SchemaError::ChildNamespaced {
            field: info.field_name,
        });
    }
    // All admissible types share one namespace, checked above
    let namespace = types.first().and_then(|t| t.namespace());
    let local = metadata.rename.as_deref().unwrap_or(decl.name());
    let xml_name = format_ns(local, namespace);

    Ok(Resolved::Child(ChildInfo {
        field: info,
        xml_name,
        types,
        is_list,
    }))
}

/// Strips `Optional` wrappers, reporting whether there were any.
fn resolve_optional(mut ty: &FieldType) -> (&FieldType, bool) {
    let mut is_optional = false;
    while let FieldType::Optional(inner) = ty {
        ty = inner;
        is_optional = true;
    }
    (ty, is_optional)
}

/// Resolves `T`, `List[T]` or a union of either into record types.
fn resolve_child_type(ty: &FieldType) -> Result<(Vec<RecordType>, bool), TypeError> {
    let (ty, is_list) = match ty {
        FieldType::List(inner) => (inner.as_ref(), true),
        other => (other, false),
    };

    let members: Vec<&FieldType> = match ty {
        FieldType::Union(members) => {
            if members.is_empty() {
                return Err(TypeError::EmptyUnion);
            }
            if members.iter().any(|m| matches!(m, FieldType::Optional(_))) {
                return Err(TypeError::NestedOptional { ty: ty.to_string() });
            }
            members.iter().collect()
        }
        FieldType::Optional(_) => {
            return Err(TypeError::NestedOptional { ty: ty.to_string() });
        }
        other => vec![other],
    };

    let mut types = Vec::with_capacity(members.len());
    for member in members {
        match member {
            FieldType::Record(record_type) if record_type.is_compiled() => {
                types.push(record_type.clone());
            }
            other => {
                return Err(TypeError::NotRecordType {
                    ty: other.to_string(),
                })
            }
        }
    }

    let mut namespaces: Vec<Option<&str>> = Vec::new();
    for record_type in &types {
        if !namespaces.contains(&record_type.namespace()) {
            namespaces.push(record_type.namespace());
        }
    }
    if namespaces.len() > 1 {
        let joined = namespaces
            .iter()
            .map(|ns| ns.unwrap_or("None"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(TypeError::MixedNamespaces { namespaces: joined });
    }

    Ok((types, is_list))
}

/// A literal default has to be a value of the declared type.
fn check_default(decl: &FieldDecl) -> Result<(), SchemaError> {
    if let super::FieldDefault::Value(value) = decl.default_policy() {
        if !decl.ty().admits(value) {
            return Err(SchemaError::InvalidDefault {
                field: decl.name().to_string(),
                ty: decl.ty().to_string(),
            });
        }
    }
    Ok(())
}
