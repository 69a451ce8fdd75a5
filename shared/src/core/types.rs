//! Record types shared by entities, codecs and the transcoding pipeline.

use serde_json::{Map, Value};

use super::errors::{EntityError, EntityResult};

/// A structured record: field name -> scalar, null, nested record or list of records
pub type Dto = Map<String, Value>;

/// Unwrap a JSON value into a record, rejecting anything that is not an object
pub fn dto_from_value(entity: &str, value: Value) -> EntityResult<Dto> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(EntityError::Serialization {
            message: format!(
                "{entity} expects a structured record, got {}",
                value_kind(&other)
            ),
        }),
    }
}

/// Short JSON type name used in diagnostics
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
