//! Organization settings
//!
//! Server side settings carrying the organization status, application
//! settings such as the locale, and the per-plugin configuration.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Entity;
use crate::core::errors::EntityResult;
use crate::core::types::Dto;
use crate::schema::{PropertySchema, Schema};

static SCHEMA: OnceLock<Schema> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizationStatus {
    #[serde(rename = "enabled")]
    Enabled,
    #[serde(rename = "disabled")]
    Disabled,
    #[serde(rename = "not found")]
    NotFound,
}

impl OrganizationStatus {
    pub const ALL: [OrganizationStatus; 3] = [
        OrganizationStatus::Enabled,
        OrganizationStatus::Disabled,
        OrganizationStatus::NotFound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationStatus::Enabled => "enabled",
            OrganizationStatus::Disabled => "disabled",
            OrganizationStatus::NotFound => "not found",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationSettingsEntity {
    props: Dto,
}

impl Entity for OrganizationSettingsEntity {
    const ENTITY_NAME: &'static str = "OrganizationSettings";
    const COLLECTION_NAME: &'static str = "OrganizationSettingsCollection";

    fn schema() -> &'static Schema {
        SCHEMA.get_or_init(|| {
            Schema::object()
                .property(
                    "status",
                    PropertySchema::string()
                        .enumeration(OrganizationStatus::ALL.iter().map(OrganizationStatus::as_str)),
                )
                .property("app", PropertySchema::any_object())
                .property("passbolt", PropertySchema::any_object())
        })
    }

    fn default_props() -> Dto {
        let mut defaults = Dto::new();
        defaults.insert(
            "status".to_string(),
            Value::String(OrganizationStatus::Enabled.as_str().to_string()),
        );
        defaults
    }

    fn from_props(props: Dto) -> EntityResult<Self> {
        Ok(Self { props })
    }

    fn props(&self) -> &Dto {
        &self.props
    }
}

impl OrganizationSettingsEntity {
    /// Settings of an organization that is switched off
    pub fn disabled() -> EntityResult<Self> {
        Self::from_dto(json!({"status": OrganizationStatus::Disabled.as_str()}))
    }

    pub fn status(&self) -> OrganizationStatus {
        self.get_str("status")
            .and_then(OrganizationStatus::from_id)
            .unwrap_or(OrganizationStatus::Enabled)
    }

    pub fn locale(&self) -> Option<&str> {
        self.get("app")
            .and_then(|app| app.get("locale"))
            .and_then(Value::as_str)
    }

    fn plugin(&self, name: &str) -> Option<&Value> {
        self.get("passbolt")
            .and_then(|passbolt| passbolt.get("plugins"))
            .and_then(|plugins| plugins.get(name))
    }

    /// A plugin is enabled when it is listed and not explicitly disabled
    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        match self.plugin(name) {
            Some(Value::Null) | None => false,
            Some(plugin) => plugin.get("enabled") != Some(&Value::Bool(false)),
        }
    }

    /// Settings of an enabled plugin
    pub fn plugin_settings(&self, name: &str) -> Option<&Value> {
        if self.is_plugin_enabled(name) {
            self.plugin(name)
        } else {
            None
        }
    }
}
