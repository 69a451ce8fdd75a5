//! Export file entity
//!
//! Describes one export request: the target format, optional id filters, the
//! resources and folders selected for export, the protection options of the
//! produced file, and the output buffer filled by the transcoding pipeline.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroize;

use super::{
    record_list_schema, Association, AssociationDecl, Entity, ExternalFolderEntity,
    ExternalFoldersCollection, ExternalResourceEntity, ExternalResourcesCollection,
};
use crate::core::errors::{EntityError, EntityResult};
use crate::core::types::Dto;
use crate::schema::{Format, PropertySchema, Schema};

static SCHEMA: OnceLock<Schema> = OnceLock::new();

const EXPORT_RESOURCES: &str = "export_resources";
const EXPORT_FOLDERS: &str = "export_folders";

/// Separator between the file type and the dialect in a format identifier
const FORMAT_SEPARATOR: char = '-';

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    /// KeePass database
    #[serde(rename = "kdbx")]
    Kdbx,
    /// CSV with KeePass column names
    #[serde(rename = "csv-kdbx")]
    CsvKdbx,
    /// CSV with LastPass column names
    #[serde(rename = "csv-lastpass")]
    CsvLastPass,
    /// CSV with 1Password column names
    #[serde(rename = "csv-1password")]
    Csv1Password,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Kdbx,
        ExportFormat::CsvKdbx,
        ExportFormat::CsvLastPass,
        ExportFormat::Csv1Password,
    ];

    /// Format identifier as it appears in requests
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Kdbx => "kdbx",
            ExportFormat::CsvKdbx => "csv-kdbx",
            ExportFormat::CsvLastPass => "csv-lastpass",
            ExportFormat::Csv1Password => "csv-1password",
        }
    }

    /// Look a format up by identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.as_str() == id)
    }

    /// File type: the part of the identifier before the first separator
    pub fn file_type(&self) -> &'static str {
        let id = self.as_str();
        id.split(FORMAT_SEPARATOR).next().unwrap_or(id)
    }

    /// Get MIME type for the produced file
    pub fn mime_type(&self) -> &'static str {
        match self.file_type() {
            "csv" => "text/csv",
            _ => "application/octet-stream",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ExportFormat::Kdbx => "KeePass (kdbx)",
            ExportFormat::CsvKdbx => "CSV (KeePass)",
            ExportFormat::CsvLastPass => "CSV (LastPass)",
            ExportFormat::Csv1Password => "CSV (1Password)",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| EntityError::UnsupportedFormat {
            format: s.to_string(),
        })
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A produced export, handed by value to whoever saves it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutput {
    pub content: String,
    pub filename: String,
    pub mime_type: String,
}

fn build_export_resources(value: Value) -> EntityResult<Association> {
    ExternalResourcesCollection::from_dtos(value).map(Association::ExternalResources)
}

fn build_export_folders(value: Value) -> EntityResult<Association> {
    ExternalFoldersCollection::from_dtos(value).map(Association::ExternalFolders)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportResourcesFileEntity {
    props: Dto,
    format: ExportFormat,
    export_resources: ExternalResourcesCollection,
    export_folders: ExternalFoldersCollection,
    file: Option<String>,
}

impl Entity for ExportResourcesFileEntity {
    const ENTITY_NAME: &'static str = "ExportResourcesFile";
    const COLLECTION_NAME: &'static str = "ExportResourcesFilesCollection";
    const ASSOCIATIONS: &'static [AssociationDecl] = &[
        AssociationDecl {
            name: EXPORT_RESOURCES,
            build: build_export_resources,
        },
        AssociationDecl {
            name: EXPORT_FOLDERS,
            build: build_export_folders,
        },
    ];

    fn schema() -> &'static Schema {
        SCHEMA.get_or_init(|| {
            let credentials = Schema::object()
                .property("password", PropertySchema::string().nullable())
                .property(
                    "keyfile",
                    PropertySchema::string().format(Format::Base64).nullable(),
                );

            Schema::object()
                .required(&["format"])
                .property(
                    "format",
                    PropertySchema::string()
                        .enumeration(ExportFormat::ALL.iter().map(ExportFormat::as_str)),
                )
                .property(
                    "resource_ids",
                    PropertySchema::array(PropertySchema::uuid()).nullable(),
                )
                .property(
                    "folder_ids",
                    PropertySchema::array(PropertySchema::uuid()).nullable(),
                )
                .property(EXPORT_RESOURCES, record_list_schema())
                .property(EXPORT_FOLDERS, record_list_schema())
                .property(
                    "options",
                    PropertySchema::object(
                        Schema::object()
                            .property("credentials", PropertySchema::object(credentials)),
                    ),
                )
        })
    }

    fn from_props(props: Dto) -> EntityResult<Self> {
        let format = props
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .parse()?;

        Ok(Self {
            props,
            format,
            export_resources: ExternalResourcesCollection::new(),
            export_folders: ExternalFoldersCollection::new(),
            file: None,
        })
    }

    fn props(&self) -> &Dto {
        &self.props
    }

    fn set_association(&mut self, name: &str, association: Association) -> EntityResult<()> {
        match (name, association) {
            (EXPORT_RESOURCES, Association::ExternalResources(collection)) => {
                self.export_resources = collection;
                Ok(())
            }
            (EXPORT_FOLDERS, Association::ExternalFolders(collection)) => {
                self.export_folders = collection;
                Ok(())
            }
            (_, other) => {
                let expected = match name {
                    EXPORT_RESOURCES => ExternalResourceEntity::COLLECTION_NAME,
                    EXPORT_FOLDERS => ExternalFolderEntity::COLLECTION_NAME,
                    _ => "declared association",
                };
                Err(EntityError::TypeMismatch {
                    entity: Self::ENTITY_NAME.to_string(),
                    association: name.to_string(),
                    expected: expected.to_string(),
                    found: other.kind().to_string(),
                })
            }
        }
    }

    fn association_value(&self, name: &str) -> Option<Value> {
        let options = Default::default();
        match name {
            EXPORT_RESOURCES => Some(self.export_resources.to_value(&options)),
            EXPORT_FOLDERS => Some(self.export_folders.to_value(&options)),
            _ => None,
        }
    }
}

impl ExportResourcesFileEntity {
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Derived from the format on every call
    pub fn file_type(&self) -> &'static str {
        self.format.file_type()
    }

    /// Resource id filter; `None` means no filter
    pub fn resource_ids(&self) -> Option<Vec<&str>> {
        self.id_list("resource_ids")
    }

    /// Folder id filter; `None` means no filter
    pub fn folder_ids(&self) -> Option<Vec<&str>> {
        self.id_list("folder_ids")
    }

    fn id_list(&self, field: &str) -> Option<Vec<&str>> {
        self.get(field)
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
    }

    fn credentials(&self) -> Option<&Dto> {
        self.get("options")
            .and_then(|options| options.get("credentials"))
            .and_then(Value::as_object)
    }

    /// Password protecting the produced file
    pub fn password(&self) -> Option<&str> {
        self.credentials()
            .and_then(|credentials| credentials.get("password"))
            .and_then(Value::as_str)
    }

    /// Base64 keyfile protecting the produced file
    pub fn keyfile(&self) -> Option<&str> {
        self.credentials()
            .and_then(|credentials| credentials.get("keyfile"))
            .and_then(Value::as_str)
    }

    pub fn export_resources(&self) -> &ExternalResourcesCollection {
        &self.export_resources
    }

    pub fn set_export_resources(&mut self, collection: ExternalResourcesCollection) {
        self.export_resources = collection;
    }

    pub fn export_folders(&self) -> &ExternalFoldersCollection {
        &self.export_folders
    }

    pub fn set_export_folders(&mut self, collection: ExternalFoldersCollection) {
        self.export_folders = collection;
    }

    /// Output buffer, filled by an exporter
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: String) {
        self.file = Some(file);
    }

    /// Package the produced file for the output sink, or `None` before export
    pub fn to_output(&self, filename_prefix: &str) -> Option<ExportOutput> {
        self.to_output_on(filename_prefix, Utc::now().date_naive())
    }

    pub fn to_output_on(&self, filename_prefix: &str, date: NaiveDate) -> Option<ExportOutput> {
        self.file.as_ref().map(|content| ExportOutput {
            content: content.clone(),
            filename: format!(
                "{filename_prefix}-{}.{}",
                date.format("%Y-%m-%d"),
                self.file_type()
            ),
            mime_type: self.format.mime_type().to_string(),
        })
    }
}

impl Drop for ExportResourcesFileEntity {
    fn drop(&mut self) {
        let credentials = self
            .props
            .get_mut("options")
            .and_then(|options| options.get_mut("credentials"))
            .and_then(Value::as_object_mut);
        if let Some(credentials) = credentials {
            for field in ["password", "keyfile"] {
                if let Some(Value::String(secret)) = credentials.get_mut(field) {
                    secret.zeroize();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DtoOptions;
    use crate::schema::EntitySchema;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn export_dto() -> Value {
        json!({
            "format": "csv-kdbx",
            "resource_ids": ["7f077753-0835-4054-92ee-556660ea04f1"],
            "folder_ids": null,
            "export_resources": [
                {
                    "id": "7f077753-0835-4054-92ee-556660ea04f1",
                    "name": "site",
                    "secret_clear": "p@ss",
                    "folder_parent_path": "Work"
                }
            ],
            "export_folders": [
                {"name": "Work", "folder_parent_path": ""}
            ],
            "options": {"credentials": {"password": "secret", "keyfile": null}}
        })
    }

    #[test]
    fn test_schema_must_validate() {
        EntitySchema::validate_schema(
            ExportResourcesFileEntity::ENTITY_NAME,
            ExportResourcesFileEntity::schema(),
        )
        .unwrap();
    }

    #[test]
    fn test_format_identifiers() {
        assert_eq!(ExportFormat::CsvLastPass.as_str(), "csv-lastpass");
        assert_eq!(ExportFormat::from_id("csv-1password"), Some(ExportFormat::Csv1Password));
        assert_eq!(ExportFormat::from_id("csv-bitwarden"), None);
        assert_matches!(
            "xml".parse::<ExportFormat>(),
            Err(EntityError::UnsupportedFormat { .. })
        );
        assert_eq!(
            serde_json::to_value(ExportFormat::CsvKdbx).unwrap(),
            json!("csv-kdbx")
        );
    }

    #[test]
    fn test_file_type_is_derived() {
        assert_eq!(ExportFormat::Kdbx.file_type(), "kdbx");
        for format in [
            ExportFormat::CsvKdbx,
            ExportFormat::CsvLastPass,
            ExportFormat::Csv1Password,
        ] {
            assert_eq!(format.file_type(), "csv");
            assert_eq!(format.mime_type(), "text/csv");
        }
    }

    #[test]
    fn test_minimal_export() {
        let export = ExportResourcesFileEntity::from_dto(json!({"format": "kdbx"})).unwrap();
        assert_eq!(export.format(), ExportFormat::Kdbx);
        assert_eq!(export.file_type(), "kdbx");
        assert!(export.resource_ids().is_none());
        assert!(export.folder_ids().is_none());
        assert!(export.export_resources().is_empty());
        assert!(export.password().is_none());
        assert!(export.file().is_none());
    }

    #[test]
    fn test_associations_are_extracted() {
        let export = ExportResourcesFileEntity::from_dto(export_dto()).unwrap();

        assert_eq!(export.export_resources().len(), 1);
        assert_eq!(export.export_folders().len(), 1);
        assert_eq!(
            export.resource_ids(),
            Some(vec!["7f077753-0835-4054-92ee-556660ea04f1"])
        );
        assert_eq!(export.folder_ids(), None);
        assert_eq!(export.password(), Some("secret"));
        assert_eq!(export.keyfile(), None);

        let base = export.to_dto(&DtoOptions::default());
        assert!(!base.contains_key("export_resources"));
        assert!(!base.contains_key("export_folders"));

        let full = export.to_dto(&DtoOptions::new().with("export_resources"));
        assert_eq!(full["export_resources"][0]["name"], json!("site"));
        assert!(!full.contains_key("export_folders"));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = ExportResourcesFileEntity::from_dto(json!({"format": "csv-bitwarden"}))
            .unwrap_err();
        assert!(err.validation_details().unwrap().has_error("format", "enum"));
    }

    #[test]
    fn test_invalid_nested_options() {
        let err = ExportResourcesFileEntity::from_dto(json!({
            "format": "kdbx",
            "resource_ids": ["nope"],
            "options": {"credentials": {"password": 12, "keyfile": "***"}}
        }))
        .unwrap_err();

        let details = err.validation_details().unwrap();
        assert!(details.has_error("resource_ids.0", "format"));
        assert!(details.has_error("options.credentials.password", "type"));
        assert!(details.has_error("options.credentials.keyfile", "format"));
    }

    #[test]
    fn test_invalid_export_resource_is_reported() {
        let mut dto = export_dto();
        dto["export_resources"][0]["name"] = json!("");
        let err = ExportResourcesFileEntity::from_dto(dto).unwrap_err();
        assert!(err
            .validation_details()
            .unwrap()
            .has_error("export_resources.0.name", "minLength"));
    }

    #[test]
    fn test_export_resources_take_their_defaults() {
        let export = ExportResourcesFileEntity::from_dto(json!({
            "format": "csv-kdbx",
            "export_resources": [{"name": "site"}],
            "export_folders": [{"name": "Work"}]
        }))
        .unwrap();

        let resource = export.export_resources().get(0).unwrap();
        assert_eq!(resource.secret_clear(), "");
        assert_eq!(resource.folder_parent_path(), "");
        assert_eq!(export.export_folders().get(0).unwrap().path(), "Work");
    }

    #[test]
    fn test_invalid_export_folder_names_its_index() {
        let err = ExportResourcesFileEntity::from_dto(json!({
            "format": "csv-kdbx",
            "export_folders": [{"name": "Work"}, {"name": 7}]
        }))
        .unwrap_err();

        let details = err.validation_details().unwrap();
        assert_eq!(details.entity(), "ExportResourcesFile");
        assert!(details.has_error("export_folders.1.name", "type"));
        assert!(!details.has_error("export_folders.0.name", "type"));
    }

    #[test]
    fn test_association_setter_checks_type() {
        let mut export = ExportResourcesFileEntity::from_dto(json!({"format": "csv-kdbx"})).unwrap();

        let err = export
            .set_association(
                "export_resources",
                Association::ExternalFolders(ExternalFoldersCollection::new()),
            )
            .unwrap_err();
        assert_matches!(
            err,
            EntityError::TypeMismatch { ref expected, ref found, .. }
                if expected == "ExternalResourcesCollection" && found == "ExternalFoldersCollection"
        );

        export
            .set_association(
                "export_folders",
                Association::ExternalFolders(ExternalFoldersCollection::new()),
            )
            .unwrap();
    }

    #[test]
    fn test_output_for_sink() {
        let mut export = ExportResourcesFileEntity::from_dto(json!({"format": "csv-lastpass"})).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert!(export.to_output_on("passbolt-export", date).is_none());

        export.set_file("\"name\"\r\n".to_string());
        let output = export.to_output_on("passbolt-export", date).unwrap();
        assert_eq!(output.filename, "passbolt-export-2024-03-09.csv");
        assert_eq!(output.mime_type, "text/csv");
        assert_eq!(output.content, "\"name\"\r\n");
    }
}
