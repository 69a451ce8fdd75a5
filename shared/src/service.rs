//! Async entry points for export and import requests
//!
//! Requests for the same operation and format are serialized; requests for
//! different formats run independently. The transcoding itself is
//! synchronous and runs while the key's lock is held.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::TranscodingConfig;
use crate::core::errors::{EntityError, EntityResult};
use crate::entity::{
    Entity, ExportOutput, ExportResourcesFileEntity, ExternalFoldersCollection,
    ExternalResourcesCollection, ResourceTypesCollection,
};
use crate::pipeline::{folders_from_resources, ResourcesCsvExporter, ResourcesCsvImporter};
use crate::{log_debug, log_info};

/// Resources read from a document and the folders their paths imply
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedResources {
    pub resources: ExternalResourcesCollection,
    pub folders: ExternalFoldersCollection,
}

#[derive(Debug, Default)]
pub struct ExportService {
    config: TranscodingConfig,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ExportService {
    pub fn new(config: TranscodingConfig) -> Self {
        Self {
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TranscodingConfig {
        &self.config
    }

    async fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key).or_default().clone()
    }

    /// Validate an export request, produce its document and package it
    pub async fn export(&self, dto: Value) -> EntityResult<ExportOutput> {
        let mut export = ExportResourcesFileEntity::from_dto(dto)?;
        let format = export.format();

        let lock = self.lock_for(format!("export:{format}")).await;
        let _guard = lock.lock().await;
        log_debug!("Export lock acquired for {}", format);

        ResourcesCsvExporter::new(&mut export).export()?;
        let output = export
            .to_output(&self.config.export_filename_prefix)
            .ok_or_else(|| EntityError::Serialization {
                message: format!("{} produced no file", ExportResourcesFileEntity::ENTITY_NAME),
            })?;

        log_info!("Export ready: {}", output.filename);
        Ok(output)
    }

    /// Read a document in `format`, or detect the format from its header
    /// when `format` is `None`
    pub async fn import(
        &self,
        format: Option<&str>,
        document: &str,
        resource_types: Option<&ResourceTypesCollection>,
    ) -> EntityResult<ImportedResources> {
        let importer = match format {
            Some(format) => ResourcesCsvImporter::from_config(format, resource_types, &self.config)?,
            None => {
                let detected = ResourcesCsvImporter::detect(document, Default::default())?;
                let format = detected.format();
                ResourcesCsvImporter::from_config(format.as_str(), resource_types, &self.config)?
            }
        };

        let lock = self.lock_for(format!("import:{}", importer.format())).await;
        let _guard = lock.lock().await;
        log_debug!("Import lock acquired for {}", importer.format());

        let resources = importer.import(document)?;
        let folders = folders_from_resources(&resources)?;
        log_info!(
            "Import read {} resources in {} folders",
            resources.len(),
            folders.len()
        );
        Ok(ImportedResources { resources, folders })
    }
}
