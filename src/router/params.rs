use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 path params (e.g., /users/{id}/posts/{post_id}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// A coerced path parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// `str` and `path` parameters (percent-decoded)
    Str(String),
    /// `int` parameters
    Int(i64),
    /// `float` parameters
    Float(f64),
    /// `uuid` parameters
    Uuid(Uuid),
}

impl ParamValue {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value; `int` parameters widen to `f64`
    #[inline]
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            ParamValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Uuid(u) => write!(f, "{u}"),
        }
    }
}

/// Parameters captured by a successful match, in pattern order
///
/// Stack-allocated for ≤8 params. Names are shared with the compiled
/// pattern (`Arc<str>`), values are owned by this request. Nothing here
/// borrows from the route table, so the list can be moved into the handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: SmallVec<[(Arc<str>, ParamValue); MAX_INLINE_PARAMS]>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SmallVec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: ParamValue) {
        self.entries.push((name, value));
    }

    /// Get a parameter by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// String value of a `str` / `path` parameter
    #[inline]
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    #[inline]
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    #[inline]
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    #[inline]
    #[must_use]
    pub fn get_uuid(&self, name: &str) -> Option<Uuid> {
        self.get(name).and_then(ParamValue::as_uuid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Convert to a HashMap keyed by parameter name
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn into_map(self) -> HashMap<String, ParamValue> {
        self.entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}
