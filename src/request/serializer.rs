//! Strategies for turning a [`ParamSet`] into query parameters.

use crate::request::error::SerializeError;
use crate::request::params::{ParamSet, ParamValue, SerializedParams};
use serde_json::{Map, Value};

pub trait ParamSerializer: Send + Sync {
    fn serialize(&self, params: &ParamSet) -> Result<SerializedParams, SerializeError>;
}

/// Comma-joins every parameter into a plain `key=value` pair.
///
/// Fails on complex parameter sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSerializer;

impl ParamSerializer for SimpleSerializer {
    fn serialize(&self, params: &ParamSet) -> Result<SerializedParams, SerializeError> {
        if params.is_complex() {
            return Err(SerializeError::UnsupportedComplexParams {
                params: format!("{:?}", params),
            });
        }
        Ok(params
            .iter()
            .map(|(key, values)| {
                let joined: Vec<&str> = values.iter().filter_map(ParamValue::as_text).collect();
                (key.clone(), joined.join(","))
            })
            .collect())
    }
}

/// Encodes complex parameter sets as one JSON object in a single query parameter.
///
/// Single-element text lists collapse to a plain string inside the object. Simple
/// parameter sets fall back to [`SimpleSerializer`].
#[derive(Debug, Clone, Copy)]
pub struct JsonParamsSerializer {
    key: &'static str,
}

impl JsonParamsSerializer {
    pub const fn new(key: &'static str) -> Self {
        Self { key }
    }
}

impl Default for JsonParamsSerializer {
    fn default() -> Self {
        Self::new("params")
    }
}

impl ParamSerializer for JsonParamsSerializer {
    fn serialize(&self, params: &ParamSet) -> Result<SerializedParams, SerializeError> {
        if !params.is_complex() {
            return SimpleSerializer.serialize(params);
        }

        let mut object = Map::new();
        for (key, values) in params.iter() {
            let value = match values.as_slice() {
                [ParamValue::Text(text)] => Value::String(text.clone()),
                _ => Value::Array(values.iter().map(ParamValue::to_json).collect()),
            };
            object.insert(key.clone(), value);
        }

        let mut serialized = SerializedParams::new();
        serialized.push(self.key, serde_json::to_string(&Value::Object(object))?);
        Ok(serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complex_params() -> ParamSet {
        let mut params = ParamSet::new();
        params.insert("county", vec![ParamValue::from("27053")]);
        let mut elem = Map::new();
        elem.insert("name".to_string(), Value::from("pcpn"));
        elem.insert("add".to_string(), Value::from("f,t"));
        params.insert(
            "elems",
            vec![ParamValue::Structured(elem), ParamValue::from("maxt")],
        );
        params
    }

    #[test]
    fn test_simple_joins_with_commas() {
        let mut params = ParamSet::new();
        params.insert("parameterCd", vec!["00060".into(), "00065".into()]);
        params.insert("site", vec!["05331000".into()]);
        let serialized = SimpleSerializer.serialize(&params).unwrap();
        assert_eq!(serialized.get("parameterCd"), Some("00060,00065"));
        assert_eq!(serialized.get("site"), Some("05331000"));
    }

    #[test]
    fn test_simple_rejects_complex() {
        let result = SimpleSerializer.serialize(&complex_params());
        assert!(matches!(
            result,
            Err(SerializeError::UnsupportedComplexParams { .. })
        ));
    }

    #[test]
    fn test_json_params() {
        let serialized = JsonParamsSerializer::default()
            .serialize(&complex_params())
            .unwrap();
        assert_eq!(serialized.len(), 1);
        let encoded: Value = serde_json::from_str(serialized.get("params").unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "county": "27053",
                "elems": [{"name": "pcpn", "add": "f,t"}, "maxt"],
            })
        );
    }

    #[test]
    fn test_json_params_simple_fallback() {
        let mut params = ParamSet::new();
        params.insert("county", vec!["27053".into()]);
        let serialized = JsonParamsSerializer::default().serialize(&params).unwrap();
        assert_eq!(serialized.get("county"), Some("27053"));
        assert_eq!(serialized.get("params"), None);
    }
}
