//! Schema validation for entity records
//!
//! Keyword checks run through the `jsonschema` crate against the JSON Schema
//! rendering of a [`Schema`]. Every violation it reports is mapped onto the
//! `field -> rule -> message` details, so a single pass reports the complete
//! set of violations. Violations inside nested objects and arrays are keyed
//! by their dotted path from the root record (`options.credentials.keyfile`,
//! `resource_ids.0`).
//!
//! Only declared properties survive validation; undeclared fields are dropped
//! from the normalized record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::Value;

use super::{Format, PropertySchema, PropertyType, Schema};
use crate::core::errors::{EntityResult, EntityValidationError, SchemaError};
use crate::core::types::{dto_from_value, Dto};

/// Compiled validators keyed by their JSON Schema document
static VALIDATORS: OnceLock<Mutex<HashMap<String, Arc<Validator>>>> = OnceLock::new();

/// Rule names reported in [`EntityValidationError`] details
pub mod rules {
    pub const REQUIRED: &str = "required";
    pub const TYPE: &str = "type";
    pub const MIN_LENGTH: &str = "minLength";
    pub const MAX_LENGTH: &str = "maxLength";
    pub const ENUM: &str = "enum";
    pub const FORMAT: &str = "format";
    pub const MINIMUM: &str = "minimum";
    pub const MAXIMUM: &str = "maximum";
}

/// Validator entry points
pub struct EntitySchema;

impl EntitySchema {
    /// Validate a record against a schema.
    ///
    /// Returns the normalized record (declared properties only) or an
    /// [`EntityValidationError`] holding every violation found.
    pub fn validate(name: &str, record: &Dto, schema: &Schema) -> EntityResult<Dto> {
        let validator = compiled(name, schema)?;
        let instance = Value::Object(record.clone());

        let mut errors = EntityValidationError::new(name);
        for error in validator.iter_errors(&instance) {
            let segments = pointer_segments(&error.instance_path.to_string());
            report(schema, &segments, &error.kind, &mut errors);
        }
        errors.into_result(normalize(schema, record))
    }

    /// Validate an arbitrary JSON value that is expected to be a record
    pub fn validate_value(name: &str, value: Value, schema: &Schema) -> EntityResult<Dto> {
        let record = dto_from_value(name, value)?;
        Self::validate(name, &record, schema)
    }

    /// Sanity check a schema description.
    ///
    /// Structural rules are checked first, then the JSON Schema rendering is
    /// compiled, which checks it against the meta-schema. Intended for
    /// startup and test time, not for every record.
    pub fn validate_schema(name: &str, schema: &Schema) -> Result<(), SchemaError> {
        check_schema(name, schema, "")?;
        compiled(name, schema).map(|_| ())
    }
}

fn build_validator(document: &Value) -> Result<Validator, String> {
    let mut options = jsonschema::options();
    options.with_draft(jsonschema::Draft::Draft202012);
    options.should_validate_formats(true);
    for format in Format::ALL {
        options.with_format(format.keyword(), move |value: &str| format.is_valid(value));
    }
    options.build(document).map_err(|e| e.to_string())
}

fn compiled(name: &str, schema: &Schema) -> Result<Arc<Validator>, SchemaError> {
    let document = schema.to_json_schema();
    let key = document.to_string();
    let cache = VALIDATORS.get_or_init(|| Mutex::new(HashMap::new()));

    if let Some(validator) = cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Arc::clone(validator));
    }

    let validator = build_validator(&document).map_err(|reason| SchemaError::new(name, reason))?;
    let validator = Arc::new(validator);
    cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, Arc::clone(&validator));
    Ok(validator)
}

/// Split a JSON pointer (`/options/credentials/keyfile`) into its unescaped
/// segments
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Declared property at the path given by `segments`
fn property_at<'s>(schema: &'s Schema, segments: &[String]) -> Option<&'s PropertySchema> {
    let (first, rest) = segments.split_first()?;
    descend(schema.property_schema(first)?, rest)
}

fn descend<'s>(property: &'s PropertySchema, segments: &[String]) -> Option<&'s PropertySchema> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(property);
    };
    if let Some(items) = &property.items {
        if segment.parse::<usize>().is_ok() {
            return descend(items, rest);
        }
    }
    property_at(property.properties.as_deref()?, segments)
}

fn report(
    schema: &Schema,
    segments: &[String],
    kind: &ValidationErrorKind,
    errors: &mut EntityValidationError,
) {
    if let ValidationErrorKind::Required { property } = kind {
        if let Some(field) = property.as_str() {
            let mut path = segments.to_vec();
            path.push(field.to_string());
            let path = path.join(".");
            errors.add_error(&path, rules::REQUIRED, format!("The {path} is required."));
        }
        return;
    }

    let path = segments.join(".");
    let Some(property) = property_at(schema, segments) else {
        return;
    };
    if let Some((rule, message)) = describe(property, kind, &path) {
        errors.add_error(&path, rule, message);
    }
}

/// Rule name and message for a keyword violation on `property`
fn describe(
    property: &PropertySchema,
    kind: &ValidationErrorKind,
    path: &str,
) -> Option<(&'static str, String)> {
    let described = match kind {
        ValidationErrorKind::Type { .. } => (
            rules::TYPE,
            format!("The {path} is not a valid {}.", property.type_label()),
        ),
        ValidationErrorKind::Enum { .. } => (
            rules::ENUM,
            format!("The {path} value is not included in the supported list."),
        ),
        ValidationErrorKind::MinLength { .. } => (
            rules::MIN_LENGTH,
            format!(
                "The {path} should be {} character in length minimum.",
                property.min_length?
            ),
        ),
        ValidationErrorKind::MaxLength { .. } => (
            rules::MAX_LENGTH,
            format!(
                "The {path} should be {} character in length maximum.",
                property.max_length?
            ),
        ),
        ValidationErrorKind::Format { .. } => (
            rules::FORMAT,
            format!("The {path} is not a valid {}.", property.format?.label()),
        ),
        ValidationErrorKind::Minimum { .. } => (
            rules::MINIMUM,
            format!(
                "The {path} should be greater than or equal to {}.",
                property.minimum?
            ),
        ),
        ValidationErrorKind::Maximum { .. } => (
            rules::MAXIMUM,
            format!(
                "The {path} should be lesser than or equal to {}.",
                property.maximum?
            ),
        ),
        _ => return None,
    };
    Some(described)
}

fn normalize(schema: &Schema, record: &Dto) -> Dto {
    schema
        .properties
        .iter()
        .filter_map(|(name, property)| {
            record
                .get(name)
                .map(|value| (name.clone(), normalize_value(property, value)))
        })
        .collect()
}

fn normalize_value(property: &PropertySchema, value: &Value) -> Value {
    match (value, &property.properties, &property.items) {
        (Value::Object(record), Some(nested), _) => Value::Object(normalize(nested, record)),
        (Value::Array(items), _, Some(item)) => Value::Array(
            items
                .iter()
                .map(|value| normalize_value(item, value))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn check_schema(name: &str, schema: &Schema, prefix: &str) -> Result<(), SchemaError> {
    for required in &schema.required {
        if schema.property_schema(required).is_none() {
            return Err(SchemaError::new(
                name,
                format!(
                    "required field {} is not a declared property",
                    join_path(prefix, required)
                ),
            ));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for (property_name, property) in &schema.properties {
        let path = join_path(prefix, property_name);
        if !seen.insert(property_name.as_str()) {
            return Err(SchemaError::new(name, format!("{path} is declared twice")));
        }
        check_property(name, property, &path)?;
    }
    Ok(())
}

fn check_property(name: &str, property: &PropertySchema, path: &str) -> Result<(), SchemaError> {
    if property.types.is_empty() {
        return Err(SchemaError::new(name, format!("{path} declares no type")));
    }

    let has_length = property.min_length.is_some() || property.max_length.is_some();
    if (has_length || property.format.is_some()) && !property.allows(PropertyType::String) {
        return Err(SchemaError::new(
            name,
            format!("{path} declares string constraints on a non-string property"),
        ));
    }

    if let (Some(min), Some(max)) = (property.min_length, property.max_length) {
        if min > max {
            return Err(SchemaError::new(
                name,
                format!("{path} minLength {min} exceeds maxLength {max}"),
            ));
        }
    }

    if let (Some(min), Some(max)) = (property.minimum, property.maximum) {
        if min > max {
            return Err(SchemaError::new(
                name,
                format!("{path} minimum {min} exceeds maximum {max}"),
            ));
        }
    }

    if let Some(allowed) = &property.enum_values {
        if allowed.is_empty() {
            return Err(SchemaError::new(name, format!("{path} has an empty enum")));
        }
        if let Some(stray) = allowed
            .iter()
            .find(|value| !property.types.iter().any(|kind| kind.matches(value)))
        {
            return Err(SchemaError::new(
                name,
                format!("{path} enum value {stray} does not match the declared type"),
            ));
        }
    }

    if property.allows(PropertyType::Array) {
        if let Some(items) = &property.items {
            check_property(name, items, &join_path(path, "items"))?;
        }
    } else if property.items.is_some() {
        return Err(SchemaError::new(
            name,
            format!("{path} declares items but is not an array"),
        ));
    }

    if let Some(nested) = &property.properties {
        if !property.allows(PropertyType::Object) {
            return Err(SchemaError::new(
                name,
                format!("{path} declares properties but is not an object"),
            ));
        }
        check_schema(name, nested, path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Format;
    use serde_json::json;

    fn folder_schema() -> Schema {
        Schema::object()
            .required(&["name"])
            .property("id", PropertySchema::uuid())
            .property(
                "name",
                PropertySchema::string().min_length(1).max_length(256),
            )
            .property("folder_parent_id", PropertySchema::uuid().nullable())
    }

    fn record(value: Value) -> Dto {
        dto_from_value("test", value).unwrap()
    }

    #[test]
    fn test_valid_record_is_returned() {
        let dto = record(json!({"name": "folder", "folder_parent_id": null}));
        let result = EntitySchema::validate("Folder", &dto, &folder_schema()).unwrap();
        assert_eq!(result, dto);
    }

    #[test]
    fn test_undeclared_fields_are_dropped() {
        let dto = record(json!({"name": "folder", "description": "dropped"}));
        let result = EntitySchema::validate("Folder", &dto, &folder_schema()).unwrap();
        assert!(!result.contains_key("description"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let dto = record(json!({"id": "nope", "folder_parent_id": 12}));
        let err = EntitySchema::validate("Folder", &dto, &folder_schema()).unwrap_err();
        let details = err.validation_details().unwrap();

        assert!(details.has_error("name", rules::REQUIRED));
        assert!(details.has_error("id", rules::FORMAT));
        assert!(details.has_error("folder_parent_id", rules::TYPE));
        assert_eq!(
            details.details()["folder_parent_id"][rules::TYPE],
            "The folder_parent_id is not a valid string or null."
        );
    }

    #[test]
    fn test_length_bounds_use_characters() {
        let schema = folder_schema();

        let empty = record(json!({"name": ""}));
        let err = EntitySchema::validate("Folder", &empty, &schema).unwrap_err();
        assert!(err.validation_details().unwrap().has_error("name", rules::MIN_LENGTH));

        let exact = record(json!({"name": "ツ".repeat(256)}));
        assert!(EntitySchema::validate("Folder", &exact, &schema).is_ok());

        let long = record(json!({"name": "ツ".repeat(257)}));
        let err = EntitySchema::validate("Folder", &long, &schema).unwrap_err();
        assert!(err.validation_details().unwrap().has_error("name", rules::MAX_LENGTH));
    }

    #[test]
    fn test_enum_and_number_rules() {
        let schema = Schema::object()
            .property("type", PropertySchema::integer().enumeration([1, 7, 15]))
            .property("count", PropertySchema::integer().minimum(0.0).maximum(10.0));

        let dto = record(json!({"type": 3, "count": 11}));
        let err = EntitySchema::validate("Permission", &dto, &schema).unwrap_err();
        let details = err.validation_details().unwrap();
        assert!(details.has_error("type", rules::ENUM));
        assert!(details.has_error("count", rules::MAXIMUM));
    }

    #[test]
    fn test_nested_violations_use_dotted_paths() {
        let credentials = Schema::object()
            .property("keyfile", PropertySchema::string().format(Format::Base64).nullable());
        let item = Schema::object()
            .required(&["name"])
            .property("name", PropertySchema::string());
        let schema = Schema::object()
            .property(
                "options",
                PropertySchema::object(
                    Schema::object().property("credentials", PropertySchema::object(credentials)),
                ),
            )
            .property("items", PropertySchema::array(PropertySchema::object(item)));

        let dto = record(json!({
            "options": {"credentials": {"keyfile": "%%%"}},
            "items": [{"name": "ok"}, {"other": true}]
        }));
        let err = EntitySchema::validate("Export", &dto, &schema).unwrap_err();
        let details = err.validation_details().unwrap();

        assert!(details.has_error("options.credentials.keyfile", rules::FORMAT));
        assert!(details.has_error("items.1.name", rules::REQUIRED));
        assert!(!details.has_error("items.0.name", rules::REQUIRED));
    }

    #[test]
    fn test_nullable_enum_accepts_null() {
        let schema = Schema::object().property(
            "status",
            PropertySchema::string().enumeration(["active", "disabled"]).nullable(),
        );

        assert!(EntitySchema::validate("Settings", &record(json!({"status": null})), &schema).is_ok());
        let err = EntitySchema::validate("Settings", &record(json!({"status": "gone"})), &schema)
            .unwrap_err();
        assert!(err.validation_details().unwrap().has_error("status", rules::ENUM));
    }

    #[test]
    fn test_pointer_segments() {
        assert!(pointer_segments("").is_empty());
        assert_eq!(
            pointer_segments("/export_resources/0/name"),
            vec!["export_resources", "0", "name"]
        );
        assert_eq!(pointer_segments("/a~1b/c~0d"), vec!["a/b", "c~d"]);
    }

    #[test]
    fn test_validate_value_rejects_non_records() {
        let err = EntitySchema::validate_value("Folder", json!("folder"), &folder_schema())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::core::errors::EntityError::Serialization { .. }
        ));
    }

    #[test]
    fn test_validate_schema() {
        assert!(EntitySchema::validate_schema("Folder", &folder_schema()).is_ok());

        let missing = Schema::object().required(&["name"]);
        assert!(EntitySchema::validate_schema("Broken", &missing).is_err());

        let inverted = Schema::object()
            .property("name", PropertySchema::string().min_length(5).max_length(1));
        assert!(EntitySchema::validate_schema("Broken", &inverted).is_err());

        let bad_enum = Schema::object()
            .property("status", PropertySchema::string().enumeration([1, 2]));
        assert!(EntitySchema::validate_schema("Broken", &bad_enum).is_err());

        let empty_enum = Schema::object()
            .property("status", PropertySchema::string().enumeration(Vec::<String>::new()));
        assert!(EntitySchema::validate_schema("Broken", &empty_enum).is_err());

        let length_on_integer = Schema::object()
            .property("count", PropertySchema::integer().max_length(3));
        assert!(EntitySchema::validate_schema("Broken", &length_on_integer).is_err());
    }
}
