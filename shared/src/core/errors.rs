//! Core error types for credport.
//!
//! Every failure in the entity and transcoding layers surfaces as a distinct
//! [`EntityError`] variant. Field level validation failures carry the complete
//! `field -> rule -> message` map collected in a single pass over the record.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field name -> (rule name -> human readable message)
pub type ValidationDetails = BTreeMap<String, BTreeMap<String, String>>;

/// Main error type for entity construction and transcoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    /// The record violates one or more schema rules
    #[error(transparent)]
    Validation(#[from] EntityValidationError),

    /// An armored envelope is missing a delimiter or has them out of order
    #[error("Malformed envelope in {entity}.{field}: {reason}")]
    MalformedEnvelope {
        entity: String,
        field: String,
        reason: String,
    },

    /// An association setter received a value of the wrong associated type
    #[error("{entity}.{association} must be a valid {expected}, got {found}")]
    TypeMismatch {
        entity: String,
        association: String,
        expected: String,
        found: String,
    },

    /// No codec is registered for the requested format
    #[error("This format is not supported: {format}")]
    UnsupportedFormat { format: String },

    /// The schema description itself is not well formed
    #[error(transparent)]
    InvalidSchema(#[from] SchemaError),

    /// An element of a collection could not be built
    #[error("{entity} item #{index} is invalid: {source}")]
    CollectionItem {
        entity: String,
        index: usize,
        #[source]
        source: Box<EntityError>,
    },

    /// A data row of an imported document could not be built
    #[error("Row {row} could not be imported: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<EntityError>,
    },

    /// The tabular document is structurally unreadable
    #[error("CSV error: {message}")]
    Csv { message: String },

    /// The DTO is not a structured record
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Result type alias for entity and transcoding operations
pub type EntityResult<T> = Result<T, EntityError>;

impl EntityError {
    /// Validation details of this error, looking through collection and row wrappers
    pub fn validation_details(&self) -> Option<&EntityValidationError> {
        match self {
            EntityError::Validation(err) => Some(err),
            EntityError::CollectionItem { source, .. } | EntityError::Row { source, .. } => {
                source.validation_details()
            }
            _ => None,
        }
    }
}

impl From<csv::Error> for EntityError {
    fn from(err: csv::Error) -> Self {
        EntityError::Csv {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EntityError {
    fn from(err: serde_json::Error) -> Self {
        EntityError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Multi-field validation failure raised when a record cannot become an entity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityValidationError {
    entity: String,
    details: ValidationDetails,
}

impl EntityValidationError {
    pub fn new<S: Into<String>>(entity: S) -> Self {
        Self {
            entity: entity.into(),
            details: BTreeMap::new(),
        }
    }

    /// Record a violated rule for a field. A second message for the same
    /// field and rule replaces the first.
    pub fn add_error<F, R, M>(&mut self, field: F, rule: R, message: M)
    where
        F: Into<String>,
        R: Into<String>,
        M: Into<String>,
    {
        self.details
            .entry(field.into())
            .or_default()
            .insert(rule.into(), message.into());
    }

    /// Name of the entity that failed validation
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn details(&self) -> &ValidationDetails {
        &self.details
    }

    pub fn has_errors(&self) -> bool {
        !self.details.is_empty()
    }

    /// Check whether `field` violated `rule`
    pub fn has_error(&self, field: &str, rule: &str) -> bool {
        self.details
            .get(field)
            .is_some_and(|rules| rules.contains_key(rule))
    }

    /// Names of all fields carrying at least one violation
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.details.keys().map(String::as_str)
    }

    /// The same violations attributed to `entity`, with every field keyed
    /// under `prefix` (`name` becomes `export_resources.0.name`)
    pub fn nested_under<S: Into<String>>(self, entity: S, prefix: &str) -> Self {
        let details = self
            .details
            .into_iter()
            .map(|(field, rules)| (format!("{prefix}.{field}"), rules))
            .collect();
        Self {
            entity: entity.into(),
            details,
        }
    }

    pub(crate) fn into_result<T>(self, value: T) -> EntityResult<T> {
        if self.has_errors() {
            Err(EntityError::Validation(self))
        } else {
            Ok(value)
        }
    }
}

impl fmt::Display for EntityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not validate entity {}.", self.entity)?;
        for (field, rules) in &self.details {
            for message in rules.values() {
                write!(f, " {field}: {message}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for EntityValidationError {}

/// A schema description that cannot be used for validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid schema for {entity}: {reason}")]
pub struct SchemaError {
    pub entity: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new<E: Into<String>, R: Into<String>>(entity: E, reason: R) -> Self {
        Self {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}
