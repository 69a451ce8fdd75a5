//! Permission entity: an access level granted to a user or group on a
//! resource or folder.

use std::sync::OnceLock;

use serde_json::Value;

use super::Entity;
use crate::core::errors::EntityResult;
use crate::core::types::Dto;
use crate::schema::{PropertySchema, Schema};

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub const PERMISSION_READ: i64 = 1;
pub const PERMISSION_UPDATE: i64 = 7;
pub const PERMISSION_OWNER: i64 = 15;

pub const ACO_RESOURCE: &str = "Resource";
pub const ACO_FOLDER: &str = "Folder";
pub const ARO_USER: &str = "User";
pub const ARO_GROUP: &str = "Group";

#[derive(Debug, Clone, PartialEq)]
pub struct PermissionEntity {
    props: Dto,
}

impl Entity for PermissionEntity {
    const ENTITY_NAME: &'static str = "Permission";
    const COLLECTION_NAME: &'static str = "PermissionsCollection";

    fn schema() -> &'static Schema {
        SCHEMA.get_or_init(|| {
            Schema::object()
                .required(&["aco", "aco_foreign_key", "aro", "aro_foreign_key", "type"])
                .property("id", PropertySchema::uuid())
                .property(
                    "aco",
                    PropertySchema::string().enumeration([ACO_RESOURCE, ACO_FOLDER]),
                )
                .property("aco_foreign_key", PropertySchema::uuid())
                .property(
                    "aro",
                    PropertySchema::string().enumeration([ARO_USER, ARO_GROUP]),
                )
                .property("aro_foreign_key", PropertySchema::uuid())
                .property(
                    "type",
                    PropertySchema::integer().enumeration([
                        PERMISSION_READ,
                        PERMISSION_UPDATE,
                        PERMISSION_OWNER,
                    ]),
                )
                .property("created", PropertySchema::date_time())
                .property("modified", PropertySchema::date_time())
        })
    }

    fn from_props(props: Dto) -> EntityResult<Self> {
        Ok(Self { props })
    }

    fn props(&self) -> &Dto {
        &self.props
    }
}

impl PermissionEntity {
    pub fn aco(&self) -> &str {
        self.get_str("aco").unwrap_or_default()
    }

    pub fn aco_foreign_key(&self) -> &str {
        self.get_str("aco_foreign_key").unwrap_or_default()
    }

    pub fn aro(&self) -> &str {
        self.get_str("aro").unwrap_or_default()
    }

    pub fn aro_foreign_key(&self) -> &str {
        self.get_str("aro_foreign_key").unwrap_or_default()
    }

    pub fn permission_type(&self) -> i64 {
        self.get("type").and_then(Value::as_i64).unwrap_or_default()
    }

    pub fn is_owner(&self) -> bool {
        self.permission_type() == PERMISSION_OWNER
    }

    /// Whether this permission allows at least updating the target
    pub fn can_update(&self) -> bool {
        self.permission_type() >= PERMISSION_UPDATE
    }
}
