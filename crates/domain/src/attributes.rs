use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single attribute value attached to a principal or carried in a request context.
///
/// Deliberately closed over four shapes: ABAC conditions never need richer
/// structure than scalars and lists of scalars, and keeping it closed lets
/// the evaluator pattern-match exhaustively instead of reflecting into JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A UTF-8 string value.
    String(String),
    /// A signed integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
    /// An ordered list of attribute values, used with `in` / `contains`.
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the value as a string slice, if it holds a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it holds one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it holds one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a list, if it holds one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }
}

/// A flat, dotted-path-addressable bag of attributes.
///
/// Attribute keys are stored verbatim (`"department"`, `"clearance_level"`);
/// nested lookups such as `"manager.department"` are resolved by an outer
/// context assembler, not by this map, so the map itself stays a one-level
/// `BTreeMap` rather than a recursive tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, AttributeValue>);

impl AttributeMap {
    /// Creates an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts or replaces an attribute value.
    pub fn insert(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.0.insert(key.into(), value);
    }

    /// Looks up an attribute by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Returns whether the map has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the attribute entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeMap, AttributeValue};

    #[test]
    fn insert_and_get_round_trips() {
        let mut attributes = AttributeMap::new();
        attributes.insert("department", AttributeValue::String("finance".to_owned()));
        assert_eq!(
            attributes.get("department").and_then(AttributeValue::as_str),
            Some("finance")
        );
    }

    #[test]
    fn missing_key_resolves_to_none() {
        let attributes = AttributeMap::new();
        assert!(attributes.get("clearance_level").is_none());
    }

    #[test]
    fn list_values_expose_their_elements() {
        let mut attributes = AttributeMap::new();
        attributes.insert(
            "regions",
            AttributeValue::List(vec![
                AttributeValue::String("us".to_owned()),
                AttributeValue::String("eu".to_owned()),
            ]),
        );
        let regions = attributes.get("regions").and_then(AttributeValue::as_list);
        assert_eq!(regions.map(<[_]>::len), Some(2));
    }
}
