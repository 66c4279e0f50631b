use crate::decode::error::DecodeError;
use crate::decode::Record;
use serde_json::{Map, Value};

/// Decodes a JSON array of objects, optionally nested under `namespace`.
///
/// Non-object array elements become a record with a single `value` field.
pub fn decode_json(body: &[u8], namespace: Option<&str>) -> Result<Vec<Record>, DecodeError> {
    let document: Value = serde_json::from_slice(body)?;
    let items = match namespace {
        Some(key) => match document {
            Value::Object(mut object) => object
                .remove(key)
                .ok_or_else(|| DecodeError::MissingNamespace(key.to_string()))?,
            _ => return Err(DecodeError::MissingNamespace(key.to_string())),
        },
        None => document,
    };

    match items {
        Value::Array(items) => Ok(items.into_iter().map(into_record).collect()),
        Value::Object(object) => Ok(vec![object]),
        other => Err(DecodeError::UnexpectedShape(format!(
            "expected an array of objects, found {}",
            other
        ))),
    }
}

fn into_record(item: Value) -> Record {
    match item {
        Value::Object(object) => object,
        other => {
            let mut record = Map::new();
            record.insert("value".to_string(), other);
            record
        }
    }
}
