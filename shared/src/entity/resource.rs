//! External resource entity
//!
//! The canonical transfer representation of one credential, used uniformly by
//! every import and export format. It may carry the clear-text secret while a
//! transcoding call is in flight; the secret is wiped when the entity drops.
//! Clones and the records returned by `to_dto` carry their own copy of the
//! secret, which the caller is responsible for wiping.

use std::sync::OnceLock;

use serde_json::{json, Value};
use zeroize::Zeroize;

use super::{Entity, EntityCollection};
use crate::core::errors::EntityResult;
use crate::core::types::Dto;
use crate::schema::{PropertySchema, Schema};

static SCHEMA: OnceLock<Schema> = OnceLock::new();

/// Maximum length of a resource name
pub const MAX_NAME_LENGTH: usize = 255;
/// Maximum length of a resource username
pub const MAX_USERNAME_LENGTH: usize = 255;
/// Maximum length of a resource uri
pub const MAX_URI_LENGTH: usize = 1024;
/// Maximum length of a resource description
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;
/// Maximum length of a clear-text secret
pub const MAX_SECRET_LENGTH: usize = 4096;

/// One credential in transfer form.
///
/// Each clone wipes its own `secret_clear` on drop. Records produced by
/// [`Entity::to_dto`] are plain `serde_json` values and are not wiped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalResourceEntity {
    props: Dto,
}

pub type ExternalResourcesCollection = EntityCollection<ExternalResourceEntity>;

impl Entity for ExternalResourceEntity {
    const ENTITY_NAME: &'static str = "ExternalResource";
    const COLLECTION_NAME: &'static str = "ExternalResourcesCollection";

    fn schema() -> &'static Schema {
        SCHEMA.get_or_init(|| {
            Schema::object()
                .required(&["name", "secret_clear"])
                .property("id", PropertySchema::uuid())
                .property(
                    "name",
                    PropertySchema::string()
                        .min_length(1)
                        .max_length(MAX_NAME_LENGTH),
                )
                .property(
                    "username",
                    PropertySchema::string()
                        .max_length(MAX_USERNAME_LENGTH)
                        .nullable(),
                )
                .property(
                    "uri",
                    PropertySchema::string().max_length(MAX_URI_LENGTH).nullable(),
                )
                .property(
                    "description",
                    PropertySchema::string()
                        .max_length(MAX_DESCRIPTION_LENGTH)
                        .nullable(),
                )
                .property(
                    "secret_clear",
                    PropertySchema::string().max_length(MAX_SECRET_LENGTH),
                )
                .property("folder_parent_id", PropertySchema::uuid().nullable())
                .property("folder_parent_path", PropertySchema::string())
                .property("resource_type_id", PropertySchema::uuid().nullable())
        })
    }

    fn default_props() -> Dto {
        match json!({"secret_clear": "", "folder_parent_path": ""}) {
            Value::Object(defaults) => defaults,
            _ => Dto::new(),
        }
    }

    fn from_props(props: Dto) -> EntityResult<Self> {
        Ok(Self { props })
    }

    fn props(&self) -> &Dto {
        &self.props
    }
}

impl ExternalResourceEntity {
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn name(&self) -> &str {
        self.get_str("name").unwrap_or_default()
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
    }

    pub fn uri(&self) -> Option<&str> {
        self.get_str("uri")
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    pub fn secret_clear(&self) -> &str {
        self.get_str("secret_clear").unwrap_or_default()
    }

    pub fn folder_parent_id(&self) -> Option<&str> {
        self.get_str("folder_parent_id")
    }

    pub fn folder_parent_path(&self) -> &str {
        self.get_str("folder_parent_path").unwrap_or_default()
    }

    pub fn resource_type_id(&self) -> Option<&str> {
        self.get_str("resource_type_id")
    }
}

impl Drop for ExternalResourceEntity {
    fn drop(&mut self) {
        if let Some(Value::String(secret)) = self.props.get_mut("secret_clear") {
            secret.zeroize();
        }
    }
}
