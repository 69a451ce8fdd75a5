//! Folder entities
//!
//! [`FolderEntity`] is the stored folder with an optional `permission`
//! association; [`ExternalFolderEntity`] is the format-agnostic transfer
//! representation used by import and export.

use std::sync::OnceLock;

use serde_json::{json, Value};

use super::{Association, AssociationDecl, Entity, EntityCollection, PermissionEntity};
use crate::core::errors::{EntityError, EntityResult};
use crate::core::types::Dto;
use crate::schema::{PropertySchema, Schema};

static FOLDER_SCHEMA: OnceLock<Schema> = OnceLock::new();
static EXTERNAL_FOLDER_SCHEMA: OnceLock<Schema> = OnceLock::new();

/// Maximum length of a folder name
pub const MAX_FOLDER_NAME_LENGTH: usize = 256;

/// Separator between folder names in a `folder_parent_path`
pub const PATH_SEPARATOR: char = '/';

const PERMISSION: &str = "permission";

fn build_permission(value: Value) -> EntityResult<Association> {
    PermissionEntity::from_dto(value).map(Association::Permission)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderEntity {
    props: Dto,
    permission: Option<PermissionEntity>,
}

pub type FoldersCollection = EntityCollection<FolderEntity>;

impl Entity for FolderEntity {
    const ENTITY_NAME: &'static str = "Folder";
    const COLLECTION_NAME: &'static str = "FoldersCollection";
    const ASSOCIATIONS: &'static [AssociationDecl] = &[AssociationDecl {
        name: PERMISSION,
        build: build_permission,
    }];

    fn schema() -> &'static Schema {
        FOLDER_SCHEMA.get_or_init(|| {
            Schema::object()
                .required(&["name"])
                .property("id", PropertySchema::uuid())
                .property(
                    "name",
                    PropertySchema::string()
                        .min_length(1)
                        .max_length(MAX_FOLDER_NAME_LENGTH),
                )
                .property("folder_parent_id", PropertySchema::uuid().nullable())
                .property("created", PropertySchema::date_time())
                .property("modified", PropertySchema::date_time())
                .property("created_by", PropertySchema::uuid())
                .property("modified_by", PropertySchema::uuid())
                .property("personal", PropertySchema::boolean())
                .property(PERMISSION, PropertySchema::any_object().nullable())
        })
    }

    fn from_props(props: Dto) -> EntityResult<Self> {
        Ok(Self {
            props,
            permission: None,
        })
    }

    fn props(&self) -> &Dto {
        &self.props
    }

    fn set_association(&mut self, name: &str, association: Association) -> EntityResult<()> {
        match (name, association) {
            (PERMISSION, Association::Permission(permission)) => {
                self.permission = Some(permission);
                Ok(())
            }
            (_, other) => Err(EntityError::TypeMismatch {
                entity: Self::ENTITY_NAME.to_string(),
                association: name.to_string(),
                expected: PermissionEntity::ENTITY_NAME.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    fn association_value(&self, name: &str) -> Option<Value> {
        match name {
            PERMISSION => self.permission.as_ref().map(|permission| permission.to_json()),
            _ => None,
        }
    }
}

impl FolderEntity {
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn name(&self) -> &str {
        self.get_str("name").unwrap_or_default()
    }

    pub fn folder_parent_id(&self) -> Option<&str> {
        self.get_str("folder_parent_id")
    }

    pub fn created(&self) -> Option<&str> {
        self.get_str("created")
    }

    pub fn modified(&self) -> Option<&str> {
        self.get_str("modified")
    }

    pub fn is_personal(&self) -> Option<bool> {
        self.get("personal").and_then(Value::as_bool)
    }

    pub fn permission(&self) -> Option<&PermissionEntity> {
        self.permission.as_ref()
    }

    pub fn set_permission(&mut self, permission: PermissionEntity) {
        self.permission = Some(permission);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalFolderEntity {
    props: Dto,
}

pub type ExternalFoldersCollection = EntityCollection<ExternalFolderEntity>;

impl Entity for ExternalFolderEntity {
    const ENTITY_NAME: &'static str = "ExternalFolder";
    const COLLECTION_NAME: &'static str = "ExternalFoldersCollection";

    fn schema() -> &'static Schema {
        EXTERNAL_FOLDER_SCHEMA.get_or_init(|| {
            Schema::object()
                .required(&["name"])
                .property("id", PropertySchema::uuid())
                .property(
                    "name",
                    PropertySchema::string()
                        .min_length(1)
                        .max_length(MAX_FOLDER_NAME_LENGTH),
                )
                .property("folder_parent_id", PropertySchema::uuid().nullable())
                .property("folder_parent_path", PropertySchema::string())
        })
    }

    fn default_props() -> Dto {
        match json!({"folder_parent_path": ""}) {
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

impl ExternalFolderEntity {
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn name(&self) -> &str {
        self.get_str("name").unwrap_or_default()
    }

    pub fn folder_parent_id(&self) -> Option<&str> {
        self.get_str("folder_parent_id")
    }

    pub fn folder_parent_path(&self) -> &str {
        self.get_str("folder_parent_path").unwrap_or_default()
    }

    /// Full path of this folder, parent path included
    pub fn path(&self) -> String {
        let parent = self.folder_parent_path();
        if parent.is_empty() {
            self.name().to_string()
        } else {
            format!("{parent}{PATH_SEPARATOR}{}", self.name())
        }
    }
}
