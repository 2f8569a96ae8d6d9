use super::error::ValidationError;
use super::pattern::IDENTIFIER;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Wire format for timestamps inside events and property values.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Checks an event name or property key against the identifier pattern.
pub fn validate_identifier(name: &str) -> Result<bool, ValidationError> {
    Ok(IDENTIFIER.get()?.is_match(name))
}

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Wall-clock time; any zone offset is dropped when converting.
    Time(NaiveDateTime),
    List(Vec<PropertyValue>),
    Map(Properties),
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::String(value) => serializer.serialize_str(value),
            PropertyValue::Int(value) => serializer.serialize_i64(*value),
            PropertyValue::Float(value) => serializer.serialize_f64(*value),
            PropertyValue::Bool(value) => serializer.serialize_bool(*value),
            PropertyValue::Time(value) => {
                serializer.collect_str(&value.format(DATE_FORMAT))
            }
            PropertyValue::List(values) => values.serialize(serializer),
            PropertyValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<NaiveDateTime> for PropertyValue {
    fn from(value: NaiveDateTime) -> Self {
        PropertyValue::Time(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for PropertyValue {
    fn from(value: DateTime<Tz>) -> Self {
        PropertyValue::Time(value.naive_local())
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(values: Vec<PropertyValue>) -> Self {
        PropertyValue::List(values)
    }
}

impl From<Properties> for PropertyValue {
    fn from(map: Properties) -> Self {
        PropertyValue::Map(map)
    }
}

/// Property map keyed by validated identifiers.
///
/// Keys are kept sorted so two maps with the same content always serialize
/// to the same bytes, which keeps request signatures stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: BTreeMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, rejecting keys that do not match the identifier pattern.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<Option<PropertyValue>, ValidationError> {
        let key = key.into();
        if !validate_identifier(&key)? {
            return Err(ValidationError::InvalidPropertyKey(key));
        }
        Ok(self.entries.insert(key, value.into()))
    }

    /// Builder form of [`Properties::insert`].
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<Self, ValidationError> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn try_from_pairs<K, V, I>(pairs: I) -> Result<Self, ValidationError>
    where
        K: Into<String>,
        V: Into<PropertyValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut properties = Self::new();
        for (key, value) in pairs {
            properties.insert(key, value)?;
        }
        Ok(properties)
    }

    /// Copies every entry of `other` over this map. Keys are already valid.
    pub fn merge(&mut self, other: &Properties) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyValue> {
        self.entries.iter()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
