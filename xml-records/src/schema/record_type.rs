//! Record types: field declarations plus their compiled schema.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use super::compiler;
use super::{FieldDecl, Schema};
use crate::error::{SchemaError, ValidationError};
use crate::node::NsMap;
use crate::record::Record;

/// Post-load validation hook.
pub type Validator = Arc<dyn Fn(&Record) -> Result<(), ValidationError> + Send + Sync>;

/// A schema-bearing record type.
///
/// Cloning is cheap and clones compare equal: identity is shared. The schema
/// is compiled at most once and never changes afterwards, so a record type
/// can be used from several threads at once.
#[derive(Clone)]
pub struct RecordType {
    inner: Arc<RecordTypeInner>,
}

struct RecordTypeInner {
    name: String,
    /// `None` until declared; `Some(None)` declares no namespace.
    namespace: Option<Option<String>>,
    nsmap: Option<NsMap>,
    fields: Vec<FieldDecl>,
    validator: Option<Validator>,
    schema: OnceCell<Schema>,
}

impl RecordType {
    /// Starts declaring a record type.
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            namespace: None,
            nsmap: None,
            fields: Vec::new(),
            validator: None,
        }
    }

    /// Returns the type name used in messages.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the element namespace, `None` for no namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_ref().and_then(|ns| ns.as_deref())
    }

    /// Returns true if a namespace (possibly none) was declared.
    pub fn declares_namespace(&self) -> bool {
        self.inner.namespace.is_some()
    }

    /// Returns the default namespace-prefix map for new instances.
    pub fn nsmap(&self) -> Option<&NsMap> {
        self.inner.nsmap.as_ref()
    }

    /// Returns the declared fields in order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.inner.fields
    }

    /// Looks up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.inner.fields.iter().find(|f| f.name() == name)
    }

    pub(crate) fn validator(&self) -> Option<&Validator> {
        self.inner.validator.as_ref()
    }

    /// Compiles the schema, or returns the one compiled earlier.
    pub fn compile(&self) -> Result<&Schema, SchemaError> {
        if let Some(schema) = self.inner.schema.get() {
            debug!(record = self.name(), "schema already compiled");
            return Ok(schema);
        }
        self.inner.schema.get_or_try_init(|| compiler::compile(self))
    }

    /// Returns the compiled schema, if any.
    pub fn schema(&self) -> Option<&Schema> {
        self.inner.schema.get()
    }

    /// Returns true once the schema has been compiled.
    pub fn is_compiled(&self) -> bool {
        self.inner.schema.get().is_some()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.inner.name)
            .field("namespace", &self.inner.namespace)
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

/// Declares a [`RecordType`].
pub struct RecordTypeBuilder {
    name: String,
    namespace: Option<Option<String>>,
    nsmap: Option<NsMap>,
    fields: Vec<FieldDecl>,
    validator: Option<Validator>,
}

impl RecordTypeBuilder {
    /// Places elements of this type in namespace `ns`.
    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(Some(ns.into()));
        self
    }

    /// Declares that elements of this type have no namespace.
    pub fn no_namespace(mut self) -> Self {
        self.namespace = Some(None);
        self
    }

    /// Sets the prefix map used when dumping instances that carry none.
    pub fn nsmap(mut self, nsmap: NsMap) -> Self {
        self.nsmap = Some(nsmap);
        self
    }

    /// Appends a field declaration.
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets a hook run on every loaded instance.
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Record) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Finishes the declaration without compiling it.
    pub fn build(self) -> RecordType {
        RecordType {
            inner: Arc::new(RecordTypeInner {
                name: self.name,
                namespace: self.namespace,
                nsmap: self.nsmap,
                fields: self.fields,
                validator: self.validator,
                schema: OnceCell::new(),
            }),
        }
    }

    /// Finishes the declaration and compiles it.
    pub fn register(self) -> Result<RecordType, SchemaError> {
        let record_type = self.build();
        record_type.compile()?;
        Ok(record_type)
    }
}
