//! Error types for XML records.
//!
//! Each stage has its own error kind: [`SchemaError`] when a record type is
//! compiled, [`LoadError`] when a tree does not satisfy a schema,
//! [`DumpError`] when an instance cannot be written, and [`RecordError`]
//! when a record is built or converted by hand. [`Error`] wraps all of them
//! together with the tree adapter's parse and I/O failures.

use thiserror::Error;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a post-load validation hook.
pub type ValidationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in any crate operation.
#[derive(Error, Debug)]
pub enum Error {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed record schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Element content does not satisfy a schema.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Record instance could not be dumped.
    #[error(transparent)]
    Dump(#[from] DumpError),

    /// Record instance could not be built or converted.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Which set a duplicate qualified name was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Attribute,
    Child,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Attribute => write!(f, "attribute"),
            FieldKind::Child => write!(f, "child"),
        }
    }
}

/// A record type's declarations cannot be turned into a schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("XML record type '{record}' without namespace")]
    NoNamespace { record: String },

    #[error("XML record type '{record}' with text-only content has children declared")]
    TextWithChildren { record: String },

    #[error("duplicate {kind} '{xml_name}' on '{field}', previously declared on '{previous}'")]
    DuplicateField {
        kind: FieldKind,
        xml_name: String,
        field: String,
        previous: String,
    },

    #[error("duplicate text field '{field}', previously declared on '{previous}'")]
    DuplicateText { field: String, previous: String },

    #[error("field '{field}' is text and cannot be renamed")]
    TextRenamed { field: String },

    #[error("field '{field}' is text and cannot have a namespace")]
    TextNamespaced { field: String },

    #[error("field '{field}' is a child and cannot have a namespace")]
    ChildNamespaced { field: String },

    #[error("invalid type '{ty}' on field '{field}': {source}")]
    InvalidType {
        field: String,
        ty: String,
        #[source]
        source: TypeError,
    },

    #[error("default value of field '{field}' is not a valid '{ty}'")]
    InvalidDefault { field: String, ty: String },
}

/// Why a declared field type cannot be mapped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error(
        "child type must be a compiled XML record type ('{ty}'); \
         attributes must be an optional or required string"
    )]
    NotRecordType { ty: String },

    #[error("nested type cannot be optional ('{ty}')")]
    NestedOptional { ty: String },

    #[error("found different namespaces for child types ({namespaces})")]
    MixedNamespaces { namespaces: String },

    #[error("union type has no members")]
    EmptyUnion,
}

/// An element does not satisfy the schema it is loaded against.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("'{record}' is not a compiled XML record type")]
    NotCompiled { record: String },

    #[error("found element '{found}', expected '{expected}' ('{tag}')")]
    NameMismatch {
        found: String,
        expected: String,
        tag: String,
    },

    #[error("found namespace '{found}', expected '{expected}' ('{tag}')")]
    NamespaceMismatch {
        found: String,
        expected: String,
        tag: String,
    },

    #[error("required attribute '{name}' not found on '{tag}'")]
    MissingAttribute { name: String, tag: String },

    #[error("found undeclared attributes on '{tag}': {}", quote_list(.names))]
    UndeclaredAttributes { tag: String, names: Vec<String> },

    #[error("element '{tag}' has child elements (expected text only)")]
    HasChildElements { tag: String },

    #[error("element '{tag}' contains comments")]
    ContainsComments { tag: String },

    #[error("element '{tag}' has no text")]
    NoText { tag: String },

    #[error("element '{tag}' has text (expected child elements only)")]
    HasText { tag: String },

    #[error("required child element '{name}' not found in '{tag}'")]
    MissingChild { name: String, tag: String },

    #[error("multiple child elements '{name}' in '{tag}'")]
    MultipleChildren { name: String, tag: String },

    #[error("invalid child elements found for '{field}' in '{tag}':{}", line_list(.failures))]
    NoMatchingType {
        field: String,
        tag: String,
        failures: Vec<LoadError>,
    },

    #[error("found undeclared child elements on '{tag}': {}", quote_list(.names))]
    UndeclaredChildren { tag: String, names: Vec<String> },

    #[error("default for field '{field}' in '{tag}' is not a valid '{ty}'")]
    InvalidDefault {
        field: String,
        ty: String,
        tag: String,
    },

    /// Raised by a record type's validation hook, passed through as-is.
    #[error(transparent)]
    Validation(ValidationError),
}

/// A record instance cannot be written to a tree.
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("'{record}' is not a compiled XML record type")]
    NotCompiled { record: String },

    #[error("field '{field}' of '{record}' holds no value that can be written as {expected}")]
    InvalidValue {
        record: String,
        field: String,
        expected: &'static str,
    },
}

/// A record cannot be built from values, or read back into a typed value.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record type '{record}' has no field '{field}'")]
    UnknownField { record: String, field: String },

    #[error("missing required field '{field}' for '{record}'")]
    MissingField { record: String, field: String },

    #[error("value for field '{field}' of '{record}' is not a valid '{ty}'")]
    InvalidValue {
        record: String,
        field: String,
        ty: String,
    },

    #[error("expected {expected} for field '{field}' of '{record}'")]
    WrongKind {
        record: String,
        field: String,
        expected: &'static str,
    },

    #[error("record of type '{found}' cannot be read as '{expected}'")]
    WrongType { found: String, expected: String },
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn line_list(errors: &[LoadError]) -> String {
    errors.iter().map(|e| format!("\n{}", e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_lists_every_name() {
        let err = LoadError::UndeclaredAttributes {
            tag: "foo".to_string(),
            names: vec!["a".to_string(), "{urn:x}b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "found undeclared attributes on 'foo': 'a', '{urn:x}b'"
        );
    }

    #[test]
    fn test_union_failure_reports_each_member() {
        let err = LoadError::NoMatchingType {
            field: "bar".to_string(),
            tag: "foo".to_string(),
            failures: vec![
                LoadError::MissingAttribute {
                    name: "spam".to_string(),
                    tag: "bar".to_string(),
                },
                LoadError::MissingAttribute {
                    name: "wibble".to_string(),
                    tag: "bar".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("invalid child elements found for 'bar' in 'foo':\n"));
        assert!(msg.contains("'spam'"));
        assert!(msg.contains("'wibble'"));
    }

    #[test]
    fn test_validation_is_transparent() {
        let inner: ValidationError = "unknown container version '2.0'".into();
        let err = LoadError::Validation(inner);
        assert_eq!(err.to_string(), "unknown container version '2.0'");
    }
}
