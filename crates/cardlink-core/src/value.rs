//! Caller-neutral value tree.
//!
//! [`GenericValue`] is the only shape a result payload takes once it leaves the
//! bridge. It mirrors the structured documents produced by the command layer:
//! scalars, ordered lists and ordered string-keyed maps, with integers and
//! floats kept apart.
//!
//! # Examples
//!
//! ```
//! use cardlink_core::{GenericValue, ValueMap};
//!
//! let mut card = ValueMap::new();
//! card.insert("cardId".to_string(), GenericValue::from("CB79000000018201"));
//! card.insert("health".to_string(), GenericValue::Int(0));
//!
//! let value = GenericValue::Map(card);
//! assert_eq!(value.get("health").and_then(GenericValue::as_i64), Some(0));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Ordered map used for [`GenericValue::Map`].
///
/// Keys are unique and iteration follows insertion order.
pub type ValueMap = IndexMap<String, GenericValue>;

/// Recursive tagged value handed to the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenericValue {
    /// Explicit null.
    #[default]
    Null,

    /// Boolean.
    Bool(bool),

    /// Integral number.
    Int(i64),

    /// Fractional number.
    Float(f64),

    /// UTF-8 string.
    String(String),

    /// Ordered list.
    List(Vec<GenericValue>),

    /// Ordered key to value mapping.
    Map(ValueMap),
}

/// Variant tag of a [`GenericValue`], without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
}

impl ValueKind {
    /// Lower-case name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl GenericValue {
    /// Build an empty map value.
    pub fn map() -> Self {
        Self::Map(ValueMap::new())
    }

    /// Variant tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as `f64`; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[GenericValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&GenericValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Insert into a map value, returning the previous entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAMap`] if this value is not a map.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<GenericValue>,
    ) -> Result<Option<GenericValue>> {
        match self {
            Self::Map(map) => Ok(map.insert(key.into(), value.into())),
            other => Err(Error::NotAMap(other.kind().name())),
        }
    }

    /// Read a required boolean field out of a map value.
    ///
    /// # Errors
    ///
    /// Returns an error if this is not a map, the field is absent, or the
    /// field is not a boolean.
    pub fn require_bool(&self, field: &str) -> Result<bool> {
        let map = self.as_map().ok_or(Error::NotAMap(self.kind().name()))?;
        let value = map
            .get(field)
            .ok_or_else(|| Error::MissingField(field.to_string()))?;
        value.as_bool().ok_or_else(|| Error::TypeMismatch {
            field: field.to_string(),
            expected: ValueKind::Bool.name(),
            actual: value.kind().name(),
        })
    }

    /// Convert into the `serde_json` document model.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<GenericValue> for serde_json::Value {
    fn from(value: GenericValue) -> Self {
        value.to_json()
    }
}

impl From<bool> for GenericValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for GenericValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for GenericValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for GenericValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for GenericValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for GenericValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<GenericValue>> for GenericValue {
    fn from(value: Vec<GenericValue>) -> Self {
        Self::List(value)
    }
}

impl From<ValueMap> for GenericValue {
    fn from(value: ValueMap) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<GenericValue>> From<Option<T>> for GenericValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl FromIterator<(String, GenericValue)> for GenericValue {
    fn from_iter<I: IntoIterator<Item = (String, GenericValue)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().collect())
    }
}

impl FromIterator<GenericValue> for GenericValue {
    fn from_iter<I: IntoIterator<Item = GenericValue>>(iter: I) -> Self {
        Self::List(iter.into_iter().collect())
    }
}
