//! Namespace handling and the qualified-name codec.
//!
//! Trees key element tags and attributes by a single token: `{namespace}local`
//! when namespaced, the bare local name otherwise. [`QName`] converts between
//! that token and its (namespace, local name) parts.

use std::collections::HashMap;
use std::fmt;

use crate::constants::{XMLNS, XML_NAMESPACE, XML_PREFIX};
use crate::error::{Error, Result};

use super::NsMap;

/// A namespace-qualified XML name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// The namespace URI, `None` for no namespace.
    pub namespace: Option<String>,
    /// The local part of the name (without prefix).
    pub local_name: String,
}

impl QName {
    /// Creates a name, treating an empty namespace as no namespace.
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local_name: local.into(),
        }
    }

    /// Creates a name with no namespace.
    pub fn no_namespace(local: impl Into<String>) -> Self {
        Self::new(None, local)
    }

    /// Decodes a `{namespace}local` or bare `local` token.
    pub fn parse(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::Parse("empty qualified name".to_string()));
        }
        match token.strip_prefix('{') {
            Some(rest) => {
                let (ns, local) = rest.split_once('}').ok_or_else(|| {
                    Error::Parse(format!("unterminated namespace in '{}'", token))
                })?;
                Ok(Self::new(Some(ns), local))
            }
            None => Ok(Self::no_namespace(token)),
        }
    }

    /// Returns the namespace as a string slice.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Encodes a local name and namespace as a qualified-name token.
pub fn format_ns(local: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{{{}}}{}", ns, local),
        _ => local.to_string(),
    }
}

/// Tracks namespace bindings during parsing.
pub(crate) struct NamespaceContext {
    /// Stack of scopes, each containing prefix -> URI bindings.
    /// The empty prefix holds the default namespace; an empty URI unbinds it.
    scopes: Vec<HashMap<String, String>>,
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceContext {
    /// Creates a new namespace context with the XML namespace pre-bound.
    pub fn new() -> Self {
        let mut ctx = NamespaceContext {
            scopes: vec![HashMap::new()],
        };
        ctx.bind(XML_PREFIX, XML_NAMESPACE);
        ctx
    }

    /// Pushes a new scope for entering an element.
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the current scope when leaving an element.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Binds a prefix to a URI in the current scope.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(prefix.to_string(), uri.to_string());
        }
    }

    /// Resolves a prefix to its URI, searching from innermost scope.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(prefix))
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    /// Returns the default namespace (empty prefix binding).
    pub fn default_namespace(&self) -> Option<&str> {
        self.resolve("")
    }

    /// Returns every binding visible in the current scope, minus `xml`.
    pub fn in_scope(&self) -> NsMap {
        let mut visible: HashMap<&str, &str> = HashMap::new();
        for scope in &self.scopes {
            for (prefix, uri) in scope {
                visible.insert(prefix.as_str(), uri.as_str());
            }
        }
        visible
            .into_iter()
            .filter(|(prefix, uri)| *prefix != XML_PREFIX && !uri.is_empty())
            .map(|(prefix, uri)| {
                let key = (!prefix.is_empty()).then(|| prefix.to_string());
                (key, uri.to_string())
            })
            .collect()
    }

    /// Resolves a lexical `prefix:local` name to a qualified name.
    ///
    /// Unprefixed attributes are never in the default namespace.
    pub fn resolve_qname(&self, lexical: &str, is_attribute: bool) -> Result<QName> {
        match split_qname(lexical) {
            (Some(prefix), local) => {
                let uri = self.resolve(prefix).ok_or_else(|| {
                    Error::Parse(format!(
                        "unbound namespace prefix '{}' in '{}'",
                        prefix, lexical
                    ))
                })?;
                Ok(QName::new(Some(uri), local))
            }
            (None, local) if is_attribute => Ok(QName::no_namespace(local)),
            (None, local) => Ok(QName::new(self.default_namespace(), local)),
        }
    }
}

/// Splits a qualified name into prefix and local name.
///
/// Returns (Some(prefix), local) for "prefix:local"
/// Returns (None, name) for "name" without prefix
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_xmlns_attr(name: &str) -> bool {
    name == XMLNS || name.starts_with("xmlns:")
}
