//! Record instances and their field values.

use std::fmt;

use crate::error::RecordError;
use crate::node::NsMap;
use crate::schema::RecordType;

/// The value of one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value; only valid for optional fields.
    Absent,
    /// Attribute or text content.
    Str(String),
    /// A single child record.
    Record(Record),
    /// Child records in document order.
    List(Vec<Record>),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Record]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Vec<Record>> for Value {
    fn from(items: Vec<Record>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Absent, Into::into)
    }
}

/// An instance of a [`RecordType`]: one value per declared field.
///
/// A loaded record also remembers the namespace bindings of its source
/// element so dumping can reproduce the original prefixes. Two records are
/// equal when their types and values are; the bindings are not compared.
#[derive(Clone)]
pub struct Record {
    record_type: RecordType,
    values: Vec<(String, Value)>,
    nsmap: Option<NsMap>,
}

impl Record {
    /// Starts building an instance of `record_type`.
    pub fn builder(record_type: &RecordType) -> RecordBuilder {
        RecordBuilder {
            record_type: record_type.clone(),
            values: Vec::new(),
            nsmap: record_type.nsmap().cloned(),
        }
    }

    pub(crate) fn from_parts(
        record_type: RecordType,
        values: Vec<(String, Value)>,
        nsmap: Option<NsMap>,
    ) -> Self {
        Record {
            record_type,
            values,
            nsmap,
        }
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Returns a field's value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Returns all values in declaration order.
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// Returns the captured namespace bindings.
    pub fn nsmap(&self) -> Option<&NsMap> {
        self.nsmap.as_ref()
    }

    /// Replaces the captured namespace bindings.
    pub fn with_nsmap(mut self, nsmap: Option<NsMap>) -> Self {
        self.nsmap = nsmap;
        self
    }

    /// Fails unless this record is an instance of `expected`.
    pub fn expect_type(&self, expected: &RecordType) -> Result<(), RecordError> {
        if &self.record_type == expected {
            Ok(())
        } else {
            Err(RecordError::WrongType {
                found: self.record_type.name().to_string(),
                expected: expected.name().to_string(),
            })
        }
    }

    pub fn str_field(&self, field: &str) -> Result<&str, RecordError> {
        match self.field(field)? {
            Value::Str(s) => Ok(s),
            _ => Err(self.wrong_kind(field, "a string")),
        }
    }

    pub fn opt_str_field(&self, field: &str) -> Result<Option<&str>, RecordError> {
        match self.field(field)? {
            Value::Absent => Ok(None),
            Value::Str(s) => Ok(Some(s)),
            _ => Err(self.wrong_kind(field, "an optional string")),
        }
    }

    pub fn record_field(&self, field: &str) -> Result<&Record, RecordError> {
        match self.field(field)? {
            Value::Record(record) => Ok(record),
            _ => Err(self.wrong_kind(field, "a record")),
        }
    }

    pub fn opt_record_field(&self, field: &str) -> Result<Option<&Record>, RecordError> {
        match self.field(field)? {
            Value::Absent => Ok(None),
            Value::Record(record) => Ok(Some(record)),
            _ => Err(self.wrong_kind(field, "an optional record")),
        }
    }

    pub fn list_field(&self, field: &str) -> Result<&[Record], RecordError> {
        match self.field(field)? {
            Value::List(items) => Ok(items),
            _ => Err(self.wrong_kind(field, "a list")),
        }
    }

    pub fn opt_list_field(&self, field: &str) -> Result<Option<&[Record]>, RecordError> {
        match self.field(field)? {
            Value::Absent => Ok(None),
            Value::List(items) => Ok(Some(items)),
            _ => Err(self.wrong_kind(field, "an optional list")),
        }
    }

    fn field(&self, field: &str) -> Result<&Value, RecordError> {
        self.get(field).ok_or_else(|| RecordError::UnknownField {
            record: self.record_type.name().to_string(),
            field: field.to_string(),
        })
    }

    fn wrong_kind(&self, field: &str, expected: &'static str) -> RecordError {
        RecordError::WrongKind {
            record: self.record_type.name().to_string(),
            field: field.to_string(),
            expected,
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.record_type == other.record_type && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.record_type.name());
        for (name, value) in &self.values {
            s.field(name, value);
        }
        s.finish()
    }
}

/// Builds a [`Record`] field by field.
pub struct RecordBuilder {
    record_type: RecordType,
    values: Vec<(String, Value)>,
    nsmap: Option<NsMap>,
}

impl RecordBuilder {
    /// Sets a field, replacing any earlier value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field, value)),
        }
        self
    }

    /// Sets the namespace bindings used when dumping.
    pub fn nsmap(mut self, nsmap: NsMap) -> Self {
        self.nsmap = Some(nsmap);
        self
    }

    /// Checks the values against the declarations and fills in defaults.
    pub fn build(mut self) -> Result<Record, RecordError> {
        let record_name = self.record_type.name().to_string();

        if let Some((name, _)) = self
            .values
            .iter()
            .find(|(name, _)| self.record_type.field(name).is_none())
        {
            return Err(RecordError::UnknownField {
                record: record_name,
                field: name.clone(),
            });
        }

        let mut values = Vec::with_capacity(self.record_type.fields().len());
        for decl in self.record_type.fields() {
            let given = self
                .values
                .iter()
                .position(|(name, _)| name == decl.name())
                .map(|i| self.values.swap_remove(i).1);
            let value = match given.or_else(|| decl.default_policy().get()) {
                Some(value) => value,
                None if decl.metadata().ignored => Value::Absent,
                None => {
                    return Err(RecordError::MissingField {
                        record: record_name,
                        field: decl.name().to_string(),
                    })
                }
            };
            // Ignored fields are never written, so any value will do
            if !decl.metadata().ignored && !decl.ty().admits(&value) {
                return Err(RecordError::InvalidValue {
                    record: record_name,
                    field: decl.name().to_string(),
                    ty: decl.ty().to_string(),
                });
            }
            values.push((decl.name().to_string(), value));
        }

        Ok(Record::from_parts(self.record_type, values, self.nsmap))
    }
}
