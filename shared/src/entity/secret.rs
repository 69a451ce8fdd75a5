//! Secret entity
//!
//! Holds an armored ciphertext envelope for one user and one resource. The
//! interior of the envelope is opaque; the only structural check performed is
//! that the begin marker is present and precedes the end marker.

use std::sync::OnceLock;

use super::{Entity, EntityCollection};
use crate::core::errors::{EntityError, EntityResult};
use crate::core::types::Dto;
use crate::schema::{PropertySchema, Schema};

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub const MESSAGE_BEGIN_MARKER: &str = "-----BEGIN PGP MESSAGE-----";
pub const MESSAGE_END_MARKER: &str = "-----END PGP MESSAGE-----";

/// Upper bound on the armored envelope size
pub const MAX_DATA_LENGTH: usize = 10_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SecretEntity {
    props: Dto,
}

pub type SecretsCollection = EntityCollection<SecretEntity>;

impl Entity for SecretEntity {
    const ENTITY_NAME: &'static str = "Secret";
    const COLLECTION_NAME: &'static str = "SecretsCollection";

    fn schema() -> &'static Schema {
        SCHEMA.get_or_init(|| {
            Schema::object()
                .required(&["user_id", "resource_id", "data"])
                .property("id", PropertySchema::uuid())
                .property("user_id", PropertySchema::uuid())
                .property("resource_id", PropertySchema::uuid())
                .property(
                    "data",
                    PropertySchema::string().max_length(MAX_DATA_LENGTH),
                )
                .property("created", PropertySchema::date_time())
                .property("modified", PropertySchema::date_time())
        })
    }

    fn from_props(props: Dto) -> EntityResult<Self> {
        let data = props.get("data").and_then(|value| value.as_str()).unwrap_or_default();
        check_envelope(data)?;
        Ok(Self { props })
    }

    fn props(&self) -> &Dto {
        &self.props
    }
}

impl SecretEntity {
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn user_id(&self) -> &str {
        self.get_str("user_id").unwrap_or_default()
    }

    pub fn resource_id(&self) -> &str {
        self.get_str("resource_id").unwrap_or_default()
    }

    /// The armored envelope, unparsed
    pub fn data(&self) -> &str {
        self.get_str("data").unwrap_or_default()
    }

    pub fn created(&self) -> Option<&str> {
        self.get_str("created")
    }

    pub fn modified(&self) -> Option<&str> {
        self.get_str("modified")
    }
}

fn malformed(reason: &str) -> EntityError {
    EntityError::MalformedEnvelope {
        entity: SecretEntity::ENTITY_NAME.to_string(),
        field: "data".to_string(),
        reason: reason.to_string(),
    }
}

/// Verify the begin marker exists and an end marker follows it
pub fn check_envelope(data: &str) -> EntityResult<()> {
    let begin = data
        .find(MESSAGE_BEGIN_MARKER)
        .ok_or_else(|| malformed("the begin marker is missing"))?;

    let after_begin = begin + MESSAGE_BEGIN_MARKER.len();
    if data[after_begin..].contains(MESSAGE_END_MARKER) {
        return Ok(());
    }

    if data.contains(MESSAGE_END_MARKER) {
        Err(malformed("the end marker precedes the begin marker"))
    } else {
        Err(malformed("the end marker is missing"))
    }
}
