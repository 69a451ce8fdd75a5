//! credport Shared Library
//!
//! Schema-validated entities and the CSV transcoding pipeline used to move
//! credentials in and out of password manager export formats.
//!
//! # Features
//!
//! - **Schemas**: Declarative per-entity rules with multi-field error reporting
//! - **Entities**: Validated records with typed accessors and named associations
//! - **Codecs**: KeePass, LastPass and 1Password CSV layouts
//! - **Pipeline**: Export of resource collections and strict, row-indexed import
//! - **Secrets**: Structural checks on armored ciphertext envelopes
//!
//! # Usage
//!
//! ```rust
//! use credport_shared::entity::{Entity, ExportResourcesFileEntity};
//! use credport_shared::pipeline::ResourcesCsvExporter;
//! use serde_json::json;
//!
//! let mut export = ExportResourcesFileEntity::from_dto(json!({
//!     "format": "csv-kdbx",
//!     "export_resources": [{
//!         "name": "site",
//!         "username": "ada",
//!         "uri": "https://x",
//!         "secret_clear": "p@ss",
//!         "description": "note",
//!         "folder_parent_path": "Work"
//!     }]
//! }))
//! .unwrap();
//!
//! ResourcesCsvExporter::new(&mut export).export().unwrap();
//! assert_eq!(
//!     export.file().unwrap(),
//!     "\"Title\",\"Username\",\"URL\",\"Password\",\"Notes\",\"Group\"\r\n\
//!      \"site\",\"ada\",\"https://x\",\"p@ss\",\"note\",\"Work\"\r\n"
//! );
//! ```

pub mod codec;
pub mod config;
pub mod core;
pub mod entity;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod service;

// Re-export commonly used types for convenience
pub use crate::core::{Dto, EntityError, EntityResult, EntityValidationError, SchemaError};

pub use entity::{
    DtoOptions, Entity, EntityCollection, ExportFormat, ExportOutput, ExportResourcesFileEntity,
    ExternalFolderEntity, ExternalFoldersCollection, ExternalResourceEntity,
    ExternalResourcesCollection, FolderEntity, FoldersCollection, OrganizationSettingsEntity,
    PermissionEntity, ResourceTypeEntity, ResourceTypesCollection, SecretEntity,
    SecretsCollection,
};

pub use codec::{find_codec, supported_formats, ParseContext};
pub use config::TranscodingConfig;
pub use pipeline::{folders_from_resources, ResourcesCsvExporter, ResourcesCsvImporter};
pub use schema::{EntitySchema, PropertySchema, Schema};
pub use service::{ExportService, ImportedResources};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
