use std::cmp::Ordering;
use std::collections::HashSet;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::comparator::{compare_values, lookup_path};
use crate::engine::errors::MergeError;
use crate::engine::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    /// Orients an ascending comparison result for this direction.
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }

    fn from_json(field: &str, value: &Value) -> Result<Self, MergeError> {
        let direction = value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64));
        match direction {
            Some(1) => Ok(SortDirection::Ascending),
            Some(-1) => Ok(SortDirection::Descending),
            _ => Err(MergeError::InvalidSort(format!(
                "direction for '{}' must be 1 or -1, got {}",
                field, value
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Ordered list of `(field, direction)` pairs defining a total order over
/// documents. The first key that differs decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Result<Self, MergeError> {
        if keys.is_empty() {
            return Err(MergeError::InvalidSort(
                "sort pattern must have at least one key".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if key.field.is_empty() || key.field.split('.').any(str::is_empty) {
                return Err(MergeError::InvalidSort(format!(
                    "invalid sort field '{}'",
                    key.field
                )));
            }
            if !seen.insert(key.field.as_str()) {
                return Err(MergeError::InvalidSort(format!(
                    "duplicate sort field '{}'",
                    key.field
                )));
            }
        }

        Ok(Self { keys })
    }

    /// Parses a sort pattern of the form `{"a": 1, "b": -1}`.
    pub fn from_json(value: &Value) -> Result<Self, MergeError> {
        let pattern = value.as_object().ok_or_else(|| {
            MergeError::InvalidSort(format!("sort pattern must be an object, got {}", value))
        })?;

        let keys = pattern
            .iter()
            .map(|(field, direction)| {
                Ok(SortKey {
                    field: field.clone(),
                    direction: SortDirection::from_json(field, direction)?,
                })
            })
            .collect::<Result<Vec<_>, MergeError>>()?;

        Self::new(keys)
    }

    pub fn to_json(&self) -> Value {
        let mut pattern = Map::with_capacity(self.keys.len());
        for key in &self.keys {
            pattern.insert(key.field.clone(), Value::from(key.direction.as_i32()));
        }
        Value::Object(pattern)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Extracts the values this spec sorts on; missing fields become `null`.
    pub fn extract_key(&self, doc: &Document) -> Vec<Value> {
        self.keys
            .iter()
            .map(|key| lookup_path(doc, &key.field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Compares two keys previously produced by [`SortSpec::extract_key`].
    pub fn compare_keys(&self, a: &[Value], b: &[Value]) -> Ordering {
        for (idx, key) in self.keys.iter().enumerate() {
            let ord = match (a.get(idx), b.get(idx)) {
                (Some(lhs), Some(rhs)) => compare_values(lhs, rhs),
                (lhs, rhs) => lhs.is_some().cmp(&rhs.is_some()),
            };
            let ord = key.direction.apply(ord);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.keys {
            let null = Value::Null;
            let lhs = lookup_path(a, &key.field).unwrap_or(&null);
            let rhs = lookup_path(b, &key.field).unwrap_or(&null);
            let ord = key.direction.apply(compare_values(lhs, rhs));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for key in &self.keys {
            map.serialize_entry(&key.field, &key.direction.as_i32())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SortSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SortSpec::from_json(&value).map_err(D::Error::custom)
    }
}
