//! Schema-validated entities
//!
//! An entity wraps exactly one record that passed its schema. Construction is
//! all-or-nothing: [`Entity::from_dto`] either returns a fully valid entity or
//! the complete [`EntityValidationError`](crate::core::EntityValidationError).
//!
//! Associations (nested entities or collections) are declared per entity type
//! in a static [`AssociationDecl`] table. At construction time each declared
//! association is removed from the base record, built with its own
//! constructor and handed to [`Entity::set_association`]. From then on the
//! association slot is the single source of truth and it is serialized only
//! when [`DtoOptions`] asks for it by name.
//!
//! Ownership is a strict tree: a collection owns its elements and an entity
//! owns its association slots. Nothing refers back to its parent.

pub mod collection;
pub mod export;
pub mod folder;
pub mod organization_settings;
pub mod permission;
pub mod resource;
pub mod resource_type;
pub mod secret;

pub use collection::EntityCollection;
pub use export::{ExportFormat, ExportOutput, ExportResourcesFileEntity};
pub use folder::{
    ExternalFolderEntity, ExternalFoldersCollection, FolderEntity, FoldersCollection,
};
pub use organization_settings::{OrganizationSettingsEntity, OrganizationStatus};
pub use permission::PermissionEntity;
pub use resource::{ExternalResourceEntity, ExternalResourcesCollection};
pub use resource_type::{ResourceTypeEntity, ResourceTypesCollection};
pub use secret::{SecretEntity, SecretsCollection};

use std::collections::BTreeSet;

use serde_json::Value;

use crate::core::errors::{EntityError, EntityResult};
use crate::core::types::{dto_from_value, Dto};
use crate::schema::{EntitySchema, PropertySchema, Schema};

/// Names of the associations to include when serializing an entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DtoOptions {
    contain: BTreeSet<String>,
}

impl DtoOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the association called `name`
    pub fn with<S: Into<String>>(mut self, name: S) -> Self {
        self.contain.insert(name.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contain.contains(name)
    }
}

/// A built association value, ready to be stored in its slot
#[derive(Debug, Clone, PartialEq)]
pub enum Association {
    ExternalResources(ExternalResourcesCollection),
    ExternalFolders(ExternalFoldersCollection),
    Permission(PermissionEntity),
}

impl Association {
    /// Name of the associated type, used in type mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Association::ExternalResources(_) => ExternalResourceEntity::COLLECTION_NAME,
            Association::ExternalFolders(_) => ExternalFolderEntity::COLLECTION_NAME,
            Association::Permission(_) => PermissionEntity::ENTITY_NAME,
        }
    }

    pub fn to_value(&self) -> Value {
        let options = DtoOptions::default();
        match self {
            Association::ExternalResources(collection) => collection.to_value(&options),
            Association::ExternalFolders(collection) => collection.to_value(&options),
            Association::Permission(permission) => Value::Object(permission.to_dto(&options)),
        }
    }
}

/// Static declaration of one association: its field name and how to build it
pub struct AssociationDecl {
    pub name: &'static str,
    pub build: fn(Value) -> EntityResult<Association>,
}

/// A record that has passed its schema, plus its associations
pub trait Entity: Sized {
    const ENTITY_NAME: &'static str;

    /// Name used for collections of this entity
    const COLLECTION_NAME: &'static str;

    /// Associations extracted from the raw record at construction time
    const ASSOCIATIONS: &'static [AssociationDecl] = &[];

    fn schema() -> &'static Schema;

    /// Values merged into the raw record before validation
    fn default_props() -> Dto {
        Dto::new()
    }

    /// Build the entity from an already validated base record
    fn from_props(props: Dto) -> EntityResult<Self>;

    /// The base record, without associations
    fn props(&self) -> &Dto;

    /// Store a built association. Entities with associations override this and
    /// reject any value that is not of the declared type.
    fn set_association(&mut self, name: &str, association: Association) -> EntityResult<()> {
        Err(EntityError::TypeMismatch {
            entity: Self::ENTITY_NAME.to_string(),
            association: name.to_string(),
            expected: "declared association".to_string(),
            found: association.kind().to_string(),
        })
    }

    /// Serialized form of a stored association, if the slot is filled
    fn association_value(&self, _name: &str) -> Option<Value> {
        None
    }

    fn from_dto(dto: Value) -> EntityResult<Self> {
        let mut record = dto_from_value(Self::ENTITY_NAME, dto)?;
        for (name, value) in Self::default_props() {
            record.entry(name).or_insert(value);
        }

        let mut props = EntitySchema::validate(Self::ENTITY_NAME, &record, Self::schema())?;

        let mut extracted = Vec::new();
        for decl in Self::ASSOCIATIONS {
            match props.remove(decl.name) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    let association = (decl.build)(value)
                        .map_err(|err| association_error(Self::ENTITY_NAME, decl.name, err))?;
                    extracted.push((decl.name, association));
                }
            }
        }

        let mut entity = Self::from_props(props)?;
        for (name, association) in extracted {
            entity.set_association(name, association)?;
        }
        Ok(entity)
    }

    /// Base record plus the associations named in `options`
    fn to_dto(&self, options: &DtoOptions) -> Dto {
        let mut dto = self.props().clone();
        for decl in Self::ASSOCIATIONS {
            if options.contains(decl.name) {
                if let Some(value) = self.association_value(decl.name) {
                    dto.insert(decl.name.to_string(), value);
                }
            }
        }
        dto
    }

    /// Base record only, as a JSON value
    fn to_json(&self) -> Value {
        Value::Object(self.to_dto(&DtoOptions::default()))
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.props().get(field)
    }

    /// String field accessor; `None` when absent, null or not a string
    fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }
}

/// Property schema for an association field holding a list of records.
///
/// Only the outer shape is checked here. Each element goes through its own
/// entity constructor, defaults included, when the association is built.
pub fn record_list_schema() -> PropertySchema {
    PropertySchema::array(PropertySchema::any_object())
}

/// Attribute an association's validation failure to the owning entity, keyed
/// under the association name and, for collections, the element index.
fn association_error(entity: &str, association: &str, err: EntityError) -> EntityError {
    match err {
        EntityError::Validation(details) => {
            EntityError::Validation(details.nested_under(entity, association))
        }
        EntityError::CollectionItem {
            entity: collection,
            index,
            source,
        } => match *source {
            EntityError::Validation(details) => EntityError::Validation(
                details.nested_under(entity, &format!("{association}.{index}")),
            ),
            other => EntityError::CollectionItem {
                entity: collection,
                index,
                source: Box::new(other),
            },
        },
        other => other,
    }
}
