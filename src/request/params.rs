use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// One stringified element of an outgoing parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    /// Nested values are left untouched for structured encodings.
    Structured(Map<String, Value>),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            ParamValue::Structured(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(text) => Value::String(text.clone()),
            ParamValue::Structured(map) => Value::Object(map.clone()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Wire parameters before serialization, keyed by wire name.
///
/// `complex` is set when any value holds a structured element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    params: BTreeMap<String, Vec<ParamValue>>,
    complex: bool,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, wire_name: impl Into<String>, values: Vec<ParamValue>) {
        if values.iter().any(|value| matches!(value, ParamValue::Structured(_))) {
            self.complex = true;
        }
        self.params.insert(wire_name.into(), values);
    }

    pub fn remove(&mut self, wire_name: &str) -> Option<Vec<ParamValue>> {
        let removed = self.params.remove(wire_name);
        self.complex = self
            .params
            .values()
            .flatten()
            .any(|value| matches!(value, ParamValue::Structured(_)));
        removed
    }

    pub fn get(&self, wire_name: &str) -> Option<&[ParamValue]> {
        self.params.get(wire_name).map(Vec::as_slice)
    }

    /// Forces structured encoding, e.g. when a service rewrites values into objects.
    pub fn mark_complex(&mut self) {
        self.complex = true;
    }

    pub fn is_complex(&self) -> bool {
        self.complex
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<ParamValue>> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Ready-to-send `(wire name, value)` pairs, in the order they should be encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SerializedParams(Vec<(String, String)>);

impl SerializedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(name, _)| name == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SerializedParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for SerializedParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_flag_follows_contents() {
        let mut params = ParamSet::new();
        params.insert("elems", vec![ParamValue::from("pcpn")]);
        assert!(!params.is_complex());

        let mut elem = Map::new();
        elem.insert("name".to_string(), Value::from("maxt"));
        params.insert("meta", vec![ParamValue::Structured(elem)]);
        assert!(params.is_complex());

        params.remove("meta");
        assert!(!params.is_complex());
    }

    #[test]
    fn test_serialized_lookup() {
        let mut serialized: SerializedParams = [("site", "01"), ("format", "rdb")]
            .into_iter()
            .collect();
        assert_eq!(serialized.get("format"), Some("rdb"));
        assert_eq!(serialized.remove("site"), Some("01".to_string()));
        assert_eq!(serialized.len(), 1);
    }
}
