//! Resource type catalog entries
//!
//! Import parsers consult the available resource types (keyed by slug) to
//! give a default type to records coming from formats without a type column.

use std::sync::OnceLock;

use serde_json::Value;

use super::{Entity, EntityCollection};
use crate::core::errors::EntityResult;
use crate::core::types::Dto;
use crate::schema::{PropertySchema, Schema};

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub const SLUG_PASSWORD_STRING: &str = "password-string";
pub const SLUG_PASSWORD_AND_DESCRIPTION: &str = "password-and-description";
pub const SLUG_PASSWORD_DESCRIPTION_TOTP: &str = "password-description-totp";
pub const SLUG_TOTP: &str = "totp";

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTypeEntity {
    props: Dto,
}

pub type ResourceTypesCollection = EntityCollection<ResourceTypeEntity>;

impl Entity for ResourceTypeEntity {
    const ENTITY_NAME: &'static str = "ResourceType";
    const COLLECTION_NAME: &'static str = "ResourceTypesCollection";

    fn schema() -> &'static Schema {
        SCHEMA.get_or_init(|| {
            Schema::object()
                .required(&["id", "slug"])
                .property("id", PropertySchema::uuid())
                .property(
                    "slug",
                    PropertySchema::string().min_length(1).max_length(64),
                )
                .property("name", PropertySchema::string().max_length(255))
                .property(
                    "description",
                    PropertySchema::string().max_length(255).nullable(),
                )
                .property("definition", PropertySchema::any_object())
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

impl ResourceTypeEntity {
    pub fn id(&self) -> &str {
        self.get_str("id").unwrap_or_default()
    }

    pub fn slug(&self) -> &str {
        self.get_str("slug").unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn definition(&self) -> Option<&Value> {
        self.get("definition")
    }
}

impl ResourceTypesCollection {
    pub fn get_first_by_slug(&self, slug: &str) -> Option<&ResourceTypeEntity> {
        self.get_first_str("slug", slug)
    }

    pub fn is_slug_available(&self, slug: &str) -> bool {
        self.get_first_by_slug(slug).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntitySchema;
    use serde_json::json;

    fn catalog() -> ResourceTypesCollection {
        ResourceTypesCollection::from_dtos(json!([
            {
                "id": "669f8c64-242a-59fb-92fc-81f660975fd3",
                "slug": "password-string",
                "name": "Simple password"
            },
            {
                "id": "a28a04cd-6f53-518a-967c-9963bf9cec51",
                "slug": "password-and-description",
                "name": "Password with description",
                "definition": {"resource": {}, "secret": {}}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_schema_must_validate() {
        EntitySchema::validate_schema(ResourceTypeEntity::ENTITY_NAME, ResourceTypeEntity::schema())
            .unwrap();
    }

    #[test]
    fn test_lookup_by_slug() {
        let types = catalog();
        let found = types.get_first_by_slug(SLUG_PASSWORD_AND_DESCRIPTION).unwrap();
        assert_eq!(found.id(), "a28a04cd-6f53-518a-967c-9963bf9cec51");
        assert!(found.definition().is_some());
        assert!(!types.is_slug_available(SLUG_TOTP));
    }

    #[test]
    fn test_slug_is_required() {
        let err = ResourceTypeEntity::from_dto(json!({
            "id": "669f8c64-242a-59fb-92fc-81f660975fd3"
        }))
        .unwrap_err();
        assert!(err.validation_details().unwrap().has_error("slug", "required"));
    }
}
