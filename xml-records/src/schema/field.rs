//! Field declarations: the input the schema compiler consumes.

use std::fmt;
use std::sync::Arc;

use super::RecordType;
use crate::record::{Record, Value};

/// Zero-argument provider of a fresh default value.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// How a field obtains a value when the XML does not supply one.
#[derive(Clone)]
pub enum FieldDefault {
    /// No default; the field must be present.
    Required,
    /// A fixed value, cloned for every use.
    Value(Value),
    /// A factory called for every use, so instances never share a default.
    Factory(DefaultFactory),
}

impl FieldDefault {
    /// Returns true when there is no default at all.
    pub fn is_required(&self) -> bool {
        matches!(self, FieldDefault::Required)
    }

    /// Produces the default value, if any.
    pub fn get(&self) -> Option<Value> {
        match self {
            FieldDefault::Required => None,
            FieldDefault::Value(value) => Some(value.clone()),
            FieldDefault::Factory(factory) => Some(factory()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Required => write!(f, "Required"),
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

/// The declared type of a field.
///
/// Only strings, record types and optional/list/union wrappings of them can
/// be mapped; anything else is [`FieldType::Opaque`] and rejected when the
/// owning record type is compiled.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A string scalar: an attribute or the text content.
    Str,
    /// A nested record.
    Record(RecordType),
    /// The inner type, or absent.
    Optional(Box<FieldType>),
    /// An ordered list of the inner type.
    List(Box<FieldType>),
    /// One of several types.
    Union(Vec<FieldType>),
    /// Any other host type, by name.
    Opaque(String),
}

impl FieldType {
    pub fn record(record_type: &RecordType) -> Self {
        FieldType::Record(record_type.clone())
    }

    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    pub fn list(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    pub fn union(members: impl IntoIterator<Item = FieldType>) -> Self {
        FieldType::Union(members.into_iter().collect())
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        FieldType::Opaque(name.into())
    }

    /// Checks whether a value is an instance of this type.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Optional(_), Value::Absent) => true,
            (FieldType::Optional(inner), value) => inner.admits(value),
            (FieldType::Str, Value::Str(_)) => true,
            (FieldType::Record(_), Value::Record(record)) => self.admits_record(record),
            (FieldType::Union(members), value) => members.iter().any(|m| m.admits(value)),
            (FieldType::List(inner), Value::List(items)) => {
                items.iter().all(|item| inner.admits_record(item))
            }
            _ => false,
        }
    }

    fn admits_record(&self, record: &Record) -> bool {
        match self {
            FieldType::Record(record_type) => record.record_type() == record_type,
            FieldType::Optional(inner) => inner.admits_record(record),
            FieldType::Union(members) => members.iter().any(|m| m.admits_record(record)),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Str => write!(f, "str"),
            FieldType::Record(record_type) => write!(f, "{}", record_type.name()),
            FieldType::Optional(inner) => write!(f, "Optional[{}]", inner),
            FieldType::List(inner) => write!(f, "List[{}]", inner),
            FieldType::Union(members) => {
                write!(f, "Union[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, "]")
            }
            FieldType::Opaque(name) => write!(f, "{}", name),
        }
    }
}

/// Per-field XML metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMetadata {
    /// XML name to use instead of the field name.
    pub rename: Option<String>,
    /// Namespace override (attributes only).
    pub namespace: Option<String>,
    /// Marks a string field as the element's text content.
    pub text: bool,
    /// Excludes the field from XML entirely.
    pub ignored: bool,
}

/// One declared field of a record type.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    ty: FieldType,
    default: FieldDefault,
    metadata: FieldMetadata,
}

impl FieldDecl {
    /// Declares a required field.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        FieldDecl {
            name: name.into(),
            ty,
            default: FieldDefault::Required,
            metadata: FieldMetadata::default(),
        }
    }

    /// Uses `name` as the XML name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.metadata.rename = Some(name.into());
        self
    }

    /// Puts the attribute in namespace `ns`.
    pub fn ns(mut self, ns: impl Into<String>) -> Self {
        self.metadata.namespace = Some(ns.into());
        self
    }

    /// Maps the field to the element's text content.
    pub fn text(mut self) -> Self {
        self.metadata.text = true;
        self
    }

    /// Keeps the field out of XML.
    pub fn ignored(mut self) -> Self {
        self.metadata.ignored = true;
        self
    }

    /// Sets a fixed default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Sets a default factory, called once per use.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn default_policy(&self) -> &FieldDefault {
        &self.default
    }

    pub fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let item = RecordType::builder("Item").no_namespace().build();
        let other = RecordType::builder("Other").no_namespace().build();
        let ty = FieldType::optional(FieldType::list(FieldType::union([
            FieldType::record(&item),
            FieldType::record(&other),
        ])));
        assert_eq!(ty.to_string(), "Optional[List[Union[Item, Other]]]");
        assert_eq!(FieldType::opaque("i32").to_string(), "i32");
    }

    #[test]
    fn test_admits() {
        let opt = FieldType::optional(FieldType::Str);
        assert!(opt.admits(&Value::Absent));
        assert!(opt.admits(&Value::from("x")));
        assert!(!FieldType::Str.admits(&Value::Absent));
        assert!(FieldType::list(FieldType::Str).admits(&Value::List(vec![])));
        assert!(!FieldType::opaque("i32").admits(&Value::from("1")));
    }

    #[test]
    fn test_factory_default_is_fresh() {
        let decl = FieldDecl::new("items", FieldType::Str).default_with(|| Value::from("x"));
        assert!(!decl.default_policy().is_required());
        assert_eq!(decl.default_policy().get(), Some(Value::from("x")));
        assert_eq!(decl.default_policy().get(), Some(Value::from("x")));
        assert!(FieldDecl::new("a", FieldType::Str)
            .default_policy()
            .is_required());
    }
}
