//! Cache key derivation
//!
//! Keys are explicit tagged values rather than ad-hoc strings, so equality is
//! structural and the prefix hierarchy is checkable: `Root` covers every key
//! under the resource tag, `Lists` covers itself and every filtered list,
//! while `List` and `Detail` keys cover only themselves.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Scope of a cache key within one resource type
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyScope {
    /// The whole resource type
    Root,
    /// All list queries for the resource
    Lists,
    /// One filtered list, identified by its canonical filter serialization
    List(String),
    /// One record
    Detail(String),
}

/// Structured identifier under which a fetched result is stored
///
/// Equality, ordering, and hashing are derived, so keys recomputed on every
/// call compare by content, never by identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    resource: &'static str,
    scope: KeyScope,
}

impl QueryKey {
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn scope(&self) -> &KeyScope {
        &self.scope
    }

    /// Whether invalidating `self` reaches `other`
    ///
    /// Keys from different resource types never cover each other.
    pub fn covers(&self, other: &QueryKey) -> bool {
        if self.resource != other.resource {
            return false;
        }
        match (&self.scope, &other.scope) {
            (KeyScope::Root, _) => true,
            (KeyScope::Lists, KeyScope::Lists | KeyScope::List(_)) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            KeyScope::Root => write!(f, "{}", self.resource),
            KeyScope::Lists => write!(f, "{}:lists", self.resource),
            KeyScope::List(filter) => write!(f, "{}:lists:{}", self.resource, filter),
            KeyScope::Detail(id) => write!(f, "{}:detail:{}", self.resource, id),
        }
    }
}

/// Derives cache keys for one resource type
#[derive(Debug, Clone, Copy)]
pub struct KeyFactory {
    resource: &'static str,
}

impl KeyFactory {
    pub const fn new(resource: &'static str) -> Self {
        Self { resource }
    }

    /// Key identifying the whole resource type
    pub fn root(&self) -> QueryKey {
        QueryKey {
            resource: self.resource,
            scope: KeyScope::Root,
        }
    }

    /// Key identifying all list queries; a child of `root()`
    pub fn lists(&self) -> QueryKey {
        QueryKey {
            resource: self.resource,
            scope: KeyScope::Lists,
        }
    }

    /// Key identifying one filtered list; a child of `lists()`
    ///
    /// Pure and order-stable: two filters with equal field content yield
    /// equal keys regardless of how the filter value was built, so repeated
    /// calls hit the same cache entry. `None` collapses to the unfiltered
    /// list key.
    pub fn list<F: Serialize>(&self, filter: Option<&F>) -> QueryKey {
        let serialized = match filter {
            Some(f) => serde_json::to_value(f)
                .map(|v| canonical_json(&v))
                .unwrap_or_default(),
            None => String::new(),
        };
        QueryKey {
            resource: self.resource,
            scope: KeyScope::List(serialized),
        }
    }

    /// Key identifying one record; a child of `root()`, sibling of `lists()`
    pub fn detail(&self, id: &str) -> QueryKey {
        QueryKey {
            resource: self.resource,
            scope: KeyScope::Detail(id.to_string()),
        }
    }
}

/// Serialize a JSON value with object keys sorted at every level
///
/// Array order is preserved (arrays are semantically ordered).
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(k, _)| *k);
            let body: Vec<String> = entries
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(v)
                    )
                })
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}
