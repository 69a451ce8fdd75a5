//! Declarative entity schemas
//!
//! A [`Schema`] describes the shape of one record: which fields are required
//! and which constraints apply to each declared property. Schemas are built
//! once per entity type with the builder methods below and validated by
//! [`validator::EntitySchema`].
//!
//! ```rust
//! use credport_shared::schema::{Format, PropertySchema, Schema};
//!
//! let schema = Schema::object()
//!     .required(&["name"])
//!     .property("id", PropertySchema::string().format(Format::Uuid))
//!     .property("name", PropertySchema::string().min_length(1).max_length(256));
//!
//! assert!(schema.property_schema("name").is_some());
//! ```

pub mod format;
pub mod validator;

pub use format::Format;
pub use validator::EntitySchema;

use serde_json::{json, Map, Value};

use crate::core::types::value_kind;

/// JSON types a property may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Object => "object",
            PropertyType::Array => "array",
            PropertyType::Null => "null",
        }
    }

    /// Check whether a JSON value is of this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            PropertyType::Number => value.is_number(),
            other => value_kind(value) == other.as_str(),
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constraints for a single declared property.
///
/// More than one entry in `types` behaves like an `anyOf` union, which is how
/// nullable fields are declared.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    pub types: Vec<PropertyType>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub enum_values: Option<Vec<Value>>,
    pub format: Option<Format>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Element schema of an array property
    pub items: Option<Box<PropertySchema>>,
    /// Nested record schema of an object property
    pub properties: Option<Box<Schema>>,
}

impl PropertySchema {
    fn of(types: Vec<PropertyType>) -> Self {
        Self {
            types,
            min_length: None,
            max_length: None,
            enum_values: None,
            format: None,
            minimum: None,
            maximum: None,
            items: None,
            properties: None,
        }
    }

    pub fn string() -> Self {
        Self::of(vec![PropertyType::String])
    }

    pub fn integer() -> Self {
        Self::of(vec![PropertyType::Integer])
    }

    pub fn number() -> Self {
        Self::of(vec![PropertyType::Number])
    }

    pub fn boolean() -> Self {
        Self::of(vec![PropertyType::Boolean])
    }

    /// Free-form object with no declared inner shape
    pub fn any_object() -> Self {
        Self::of(vec![PropertyType::Object])
    }

    /// Object validated against a nested schema
    pub fn object(schema: Schema) -> Self {
        let mut property = Self::of(vec![PropertyType::Object]);
        property.properties = Some(Box::new(schema));
        property
    }

    /// Array whose elements are validated against `items`
    pub fn array(items: PropertySchema) -> Self {
        let mut property = Self::of(vec![PropertyType::Array]);
        property.items = Some(Box::new(items));
        property
    }

    /// String constrained to the hyphenated UUID form
    pub fn uuid() -> Self {
        Self::string().format(Format::Uuid)
    }

    pub fn date_time() -> Self {
        Self::string().format(Format::DateTime)
    }

    /// Also accept `null`
    pub fn nullable(mut self) -> Self {
        if !self.types.contains(&PropertyType::Null) {
            self.types.push(PropertyType::Null);
        }
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Restrict the value to a closed list of allowed values
    pub fn enumeration<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn allows(&self, kind: PropertyType) -> bool {
        self.types.contains(&kind)
    }

    /// JSON Schema keywords for this property
    pub fn to_json_schema(&self) -> Value {
        let mut keywords = Map::new();
        let types: Vec<&str> = self.types.iter().map(PropertyType::as_str).collect();
        let kind = match types.as_slice() {
            [single] => json!(single),
            _ => json!(types),
        };
        keywords.insert("type".into(), kind);

        if let Some(min) = self.min_length {
            keywords.insert("minLength".into(), json!(min));
        }
        if let Some(max) = self.max_length {
            keywords.insert("maxLength".into(), json!(max));
        }
        if let Some(format) = self.format {
            keywords.insert("format".into(), json!(format.keyword()));
        }
        if let Some(minimum) = self.minimum {
            keywords.insert("minimum".into(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            keywords.insert("maximum".into(), json!(maximum));
        }
        if let Some(allowed) = &self.enum_values {
            let mut allowed = allowed.clone();
            if self.allows(PropertyType::Null) && !allowed.contains(&Value::Null) {
                allowed.push(Value::Null);
            }
            keywords.insert("enum".into(), Value::Array(allowed));
        }
        if let Some(items) = &self.items {
            keywords.insert("items".into(), items.to_json_schema());
        }
        if let Some(nested) = &self.properties {
            keywords.insert("required".into(), json!(nested.required));
            keywords.insert("properties".into(), nested.properties_json());
        }
        Value::Object(keywords)
    }

    /// Human readable type list, e.g. `string or null`
    pub fn type_label(&self) -> String {
        self.types
            .iter()
            .map(PropertyType::as_str)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// Schema of a record: required field names plus per-property constraints
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub required: Vec<String>,
    /// Declared properties, in declaration order
    pub properties: Vec<(String, PropertySchema)>,
}

impl Schema {
    pub fn object() -> Self {
        Self::default()
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        self.required.extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn property<S: Into<String>>(mut self, name: S, property: PropertySchema) -> Self {
        self.properties.push((name.into(), property));
        self
    }

    pub fn property_schema(&self, name: &str) -> Option<&PropertySchema> {
        self.properties
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, property)| property)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|required| required == name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    /// The record schema as a JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": self.required,
            "properties": self.properties_json(),
        })
    }

    fn properties_json(&self) -> Value {
        Value::Object(
            self.properties
                .iter()
                .map(|(name, property)| (name.clone(), property.to_json_schema()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_type_matches() {
        assert!(PropertyType::Integer.matches(&json!(15)));
        assert!(!PropertyType::Integer.matches(&json!(1.5)));
        assert!(PropertyType::Number.matches(&json!(15)));
        assert!(PropertyType::Number.matches(&json!(1.5)));
        assert!(PropertyType::Null.matches(&Value::Null));
        assert!(!PropertyType::String.matches(&json!([])));
    }

    #[test]
    fn test_nullable_is_idempotent() {
        let property = PropertySchema::string().nullable().nullable();
        assert_eq!(property.types, vec![PropertyType::String, PropertyType::Null]);
        assert_eq!(property.type_label(), "string or null");
    }

    #[test]
    fn test_json_schema_document() {
        let schema = Schema::object()
            .required(&["name"])
            .property("name", PropertySchema::string().min_length(1).max_length(10))
            .property(
                "status",
                PropertySchema::string().enumeration(["active"]).nullable(),
            )
            .property("ids", PropertySchema::array(PropertySchema::uuid()));

        assert_eq!(
            schema.to_json_schema(),
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string", "minLength": 1, "maxLength": 10},
                    "status": {"type": ["string", "null"], "enum": ["active", null]},
                    "ids": {"type": "array", "items": {"type": "string", "format": "x-uuid"}}
                }
            })
        );
    }

    #[test]
    fn test_schema_builder() {
        let schema = Schema::object()
            .required(&["name"])
            .property("name", PropertySchema::string().max_length(10))
            .property("id", PropertySchema::uuid());

        assert!(schema.is_required("name"));
        assert!(!schema.is_required("id"));
        assert_eq!(schema.property_names().collect::<Vec<_>>(), vec!["name", "id"]);
        assert_eq!(
            schema.property_schema("id").and_then(|p| p.format),
            Some(Format::Uuid)
        );
    }
}
