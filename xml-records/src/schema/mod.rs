//! Record schemas.
//!
//! A [`RecordType`] is declared with a builder: an ordered list of
//! [`FieldDecl`]s, a namespace and optional hooks. Compiling it resolves every
//! field into one of three roles (attribute, text or child) and checks the
//! declarations against each other. The resulting [`Schema`] is what the
//! loader and dumper walk.

mod compiler;
mod field;
mod record_type;

pub use field::{DefaultFactory, FieldDecl, FieldDefault, FieldMetadata, FieldType};
pub use record_type::{RecordType, RecordTypeBuilder, Validator};

use crate::record::Value;

/// What every mapped field carries, whatever its role.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// The declared field name.
    pub field_name: String,
    /// An absent value may be left out when dumping.
    pub is_optional: bool,
    default: FieldDefault,
}

impl FieldInfo {
    pub(crate) fn new(decl: &FieldDecl, is_optional: bool) -> Self {
        FieldInfo {
            field_name: decl.name().to_string(),
            is_optional,
            default: decl.default_policy().clone(),
        }
    }

    /// The field must be present when loading.
    ///
    /// This is independent of [`is_optional`](Self::is_optional): a field can
    /// be optional with no default, or required-to-dump with one.
    pub fn is_required(&self) -> bool {
        self.default.is_required()
    }

    /// Produces the default value, if there is one.
    pub fn default_value(&self) -> Option<Value> {
        self.default.get()
    }
}

/// A field mapped to an XML attribute.
#[derive(Debug, Clone)]
pub struct AttrInfo {
    pub field: FieldInfo,
    /// Qualified attribute name.
    pub xml_name: String,
}

/// A field mapped to the element's text content.
#[derive(Debug, Clone)]
pub struct TextInfo {
    pub field: FieldInfo,
}

/// A field mapped to child elements.
#[derive(Debug, Clone)]
pub struct ChildInfo {
    pub field: FieldInfo,
    /// Qualified tag of the child elements.
    pub xml_name: String,
    /// Admissible record types, tried in order. Never empty.
    pub types: Vec<RecordType>,
    /// Any number of child elements, in order.
    pub is_list: bool,
}

/// The compiled mapping of a record type's fields to XML.
///
/// A schema has either a text field or children, never both.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<AttrInfo>,
    children: Vec<ChildInfo>,
    text: Option<TextInfo>,
}

impl Schema {
    pub fn attributes(&self) -> &[AttrInfo] {
        &self.attributes
    }

    pub fn children(&self) -> &[ChildInfo] {
        &self.children
    }

    pub fn text(&self) -> Option<&TextInfo> {
        self.text.as_ref()
    }
}
