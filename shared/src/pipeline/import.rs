//! CSV import
//!
//! Reads a document in one of the registered layouts back into resources.
//! Import is strict: the first row that cannot become a resource fails the
//! whole document, reported with its 1-based row number.

use std::collections::BTreeSet;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::json;
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::codec::registry::{detect_codec, find_codec, CodecEntry};
use crate::codec::{CsvRow, ParseContext, RowParser};
use crate::config::TranscodingConfig;
use crate::core::errors::{EntityError, EntityResult};
use crate::entity::folder::PATH_SEPARATOR;
use crate::entity::{
    ExportFormat, ExternalFoldersCollection, ExternalResourcesCollection, ResourceTypesCollection,
};
use crate::log_warn;

const BYTE_ORDER_MARK: char = '\u{feff}';

fn row_error(row: usize, source: EntityError) -> EntityError {
    EntityError::Row {
        row,
        source: Box::new(source),
    }
}

fn read_header(document: &str) -> EntityResult<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(document.as_bytes());
    Ok(reader.headers()?.clone())
}

/// Builds resources from a CSV document. Any invalid row fails the whole
/// import with that row's 1-based index.
#[derive(Debug)]
pub struct ResourcesCsvImporter<'a> {
    codec: &'static CodecEntry,
    context: ParseContext<'a>,
    max_rows: usize,
    trim_cells: bool,
}

impl<'a> ResourcesCsvImporter<'a> {
    pub fn new(format: &str, context: ParseContext<'a>) -> EntityResult<Self> {
        Ok(Self {
            codec: find_codec(format)?,
            context,
            max_rows: 0,
            trim_cells: false,
        })
    }

    /// Pick the codec whose columns all appear in the document header
    pub fn detect(document: &str, context: ParseContext<'a>) -> EntityResult<Self> {
        let header = read_header(document.trim_start_matches(BYTE_ORDER_MARK))?;
        let columns: Vec<&str> = header.iter().collect();
        let codec = detect_codec(&columns).ok_or_else(|| EntityError::UnsupportedFormat {
            format: columns.join(","),
        })?;
        debug!("Detected csv format {}", codec.format);

        Ok(Self {
            codec,
            context,
            max_rows: 0,
            trim_cells: false,
        })
    }

    /// Importer for `format` using the limits and default slug of `config`
    pub fn from_config(
        format: &str,
        resource_types: Option<&'a ResourceTypesCollection>,
        config: &'a TranscodingConfig,
    ) -> EntityResult<Self> {
        let context = ParseContext::new(resource_types, &config.default_resource_type_slug);
        Ok(Self::new(format, context)?
            .with_max_rows(config.max_import_rows)
            .with_trim_cells(config.trim_cells))
    }

    /// Limit the number of data rows, 0 for unlimited
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_trim_cells(mut self, trim_cells: bool) -> Self {
        self.trim_cells = trim_cells;
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.codec.format
    }

    pub fn import(&self, document: &str) -> EntityResult<ExternalResourcesCollection> {
        let trim = if self.trim_cells { Trim::All } else { Trim::None };
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(trim)
            .from_reader(document.trim_start_matches(BYTE_ORDER_MARK).as_bytes());

        let header = reader.headers()?.clone();
        let missing: Vec<&str> = self
            .codec
            .parser
            .parse_mapping()
            .iter()
            .map(|(_, column)| *column)
            .filter(|column| !header.iter().any(|name| name == *column))
            .collect();
        if !missing.is_empty() {
            return Err(EntityError::Csv {
                message: format!(
                    "The {} header is missing the columns: {}",
                    self.codec.format,
                    missing.join(", ")
                ),
            });
        }

        let mut resources = ExternalResourcesCollection::new();
        for (index, record) in reader.records().enumerate() {
            let row_number = index + 1;
            let record = record.map_err(|e| row_error(row_number, e.into()))?;
            if self.max_rows > 0 && resources.len() >= self.max_rows {
                log_warn!("Import stopped at row {}: limit of {} rows", row_number, self.max_rows);
                return Err(EntityError::Csv {
                    message: format!("The document exceeds the limit of {} rows", self.max_rows),
                });
            }

            let mut row: CsvRow = header
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.to_string(), cell.to_string()))
                .collect();
            let parsed = self.codec.parser.parse(&row, &self.context);
            for cell in row.values_mut() {
                cell.zeroize();
            }
            resources.push(parsed.map_err(|e| row_error(row_number, e))?);
        }

        info!(
            "Imported {} resources from {}",
            resources.len(),
            self.codec.format
        );
        Ok(resources)
    }
}

/// Folders implied by the resources' parent paths, parents first, each
/// path once.
pub fn folders_from_resources(
    resources: &ExternalResourcesCollection,
) -> EntityResult<ExternalFoldersCollection> {
    let mut seen = BTreeSet::new();
    let mut folders = ExternalFoldersCollection::new();

    for resource in resources {
        let mut parent = String::new();
        let names = resource
            .folder_parent_path()
            .split(PATH_SEPARATOR)
            .filter(|name| !name.is_empty());

        for name in names {
            let path = if parent.is_empty() {
                name.to_string()
            } else {
                format!("{parent}{PATH_SEPARATOR}{name}")
            };
            if seen.insert(path.clone()) {
                folders.push_dto(json!({"name": name, "folder_parent_path": parent}))?;
            }
            parent = path;
        }
    }

    Ok(folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const KDBX_DOCUMENT: &str = "\"Title\",\"Username\",\"URL\",\"Password\",\"Notes\",\"Group\"\r\n\
        \"site\",\"ada\",\"https://x\",\"p@ss\",\"note\",\"Work\"\r\n\
        \"db\",\"root\",\"\",\"toor\",\"\",\"Work/Servers\"\r\n";

    #[test]
    fn test_import_kdbx() {
        let importer = ResourcesCsvImporter::new("csv-kdbx", ParseContext::default()).unwrap();
        let resources = importer.import(KDBX_DOCUMENT).unwrap();

        assert_eq!(resources.len(), 2);
        let site = resources.get(0).unwrap();
        assert_eq!(site.name(), "site");
        assert_eq!(site.username(), Some("ada"));
        assert_eq!(site.secret_clear(), "p@ss");
        let db = resources.get(1).unwrap();
        assert_eq!(db.uri(), None);
        assert_eq!(db.folder_parent_path(), "Work/Servers");
    }

    #[test]
    fn test_header_only_document() {
        let importer = ResourcesCsvImporter::new("csv-lastpass", ParseContext::default()).unwrap();
        let resources = importer
            .import("\"name\",\"username\",\"url\",\"password\",\"extra\",\"grouping\"\r\n")
            .unwrap();
        assert!(resources.is_empty());
    }

    #[test]
    fn test_invalid_row_reports_index() {
        let document = "Title,Username,URL,Password,Notes,Group\r\n\
            ok,,,,,\r\n\
            ,nameless,,,,\r\n";
        let importer = ResourcesCsvImporter::new("csv-kdbx", ParseContext::default()).unwrap();
        let err = importer.import(document).unwrap_err();

        assert_matches!(err, EntityError::Row { row: 2, .. });
        assert!(err.validation_details().unwrap().has_error("name", "required"));
    }

    #[test]
    fn test_row_of_empty_cells_is_rejected() {
        let document = "\"Title\",\"Username\",\"URL\",\"Password\",\"Notes\",\"Group\"\r\n\
            \"site\",\"ada\",\"\",\"p@ss\",\"\",\"\"\r\n\
            \"\",\"\",\"\",\"\",\"\",\"\"\r\n";
        let importer = ResourcesCsvImporter::new("csv-kdbx", ParseContext::default()).unwrap();
        let err = importer.import(document).unwrap_err();

        assert_matches!(err, EntityError::Row { row: 2, .. });
        assert!(err.validation_details().unwrap().has_error("name", "required"));
    }

    #[test]
    fn test_blank_lines_are_not_rows() {
        let document = "Title,Username,URL,Password,Notes,Group\r\n\r\nsite,,,,,\r\n\r\n";
        let importer = ResourcesCsvImporter::new("csv-kdbx", ParseContext::default()).unwrap();
        let resources = importer.import(document).unwrap();
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let document = "Title,Username,URL,Password,Notes,Group\r\nonly,two\r\n";
        let importer = ResourcesCsvImporter::new("csv-kdbx", ParseContext::default()).unwrap();
        assert_matches!(
            importer.import(document),
            Err(EntityError::Row { row: 1, ref source }) if matches!(**source, EntityError::Csv { .. })
        );
    }

    #[test]
    fn test_missing_columns() {
        let importer = ResourcesCsvImporter::new("csv-1password", ParseContext::default()).unwrap();
        let err = importer.import("Title,Password\r\nx,y\r\n").unwrap_err();
        assert_matches!(err, EntityError::Csv { ref message } if message.contains("Username"));
    }

    #[test]
    fn test_row_limit() {
        let importer = ResourcesCsvImporter::new("csv-kdbx", ParseContext::default())
            .unwrap()
            .with_max_rows(1);
        assert_matches!(importer.import(KDBX_DOCUMENT), Err(EntityError::Csv { .. }));
    }

    #[test]
    fn test_trim_cells() {
        let document = "Title,Username,URL,Password,Notes,Group\r\n  site  , ada ,,secret,,\r\n";
        let importer = ResourcesCsvImporter::new("csv-kdbx", ParseContext::default())
            .unwrap()
            .with_trim_cells(true);
        let resources = importer.import(document).unwrap();
        assert_eq!(resources.get(0).unwrap().name(), "site");
        assert_eq!(resources.get(0).unwrap().username(), Some("ada"));
    }

    #[test]
    fn test_from_config() {
        let types = ResourceTypesCollection::from_dtos(json!([
            {"id": "669f8c64-242a-59fb-92fc-81f660975fd3", "slug": "password-string"}
        ]))
        .unwrap();
        let config = TranscodingConfig {
            default_resource_type_slug: "password-string".to_string(),
            ..Default::default()
        };

        let importer = ResourcesCsvImporter::from_config("csv-kdbx", Some(&types), &config).unwrap();
        let resources = importer.import(KDBX_DOCUMENT).unwrap();
        assert!(resources
            .iter()
            .all(|resource| resource.resource_type_id() == Some("669f8c64-242a-59fb-92fc-81f660975fd3")));
    }

    #[test]
    fn test_detect() {
        let document = format!("{BYTE_ORDER_MARK}name,username,url,password,extra,grouping\r\nx,,,,,\r\n");
        let importer = ResourcesCsvImporter::detect(&document, ParseContext::default()).unwrap();
        assert_eq!(importer.format(), ExportFormat::CsvLastPass);
        assert_eq!(importer.import(&document).unwrap().len(), 1);

        assert_matches!(
            ResourcesCsvImporter::detect("a,b\r\n", ParseContext::default()),
            Err(EntityError::UnsupportedFormat { .. })
        );
    }

    #[test]
    fn test_folders_from_resources() {
        let resources = ExternalResourcesCollection::from_dtos(json!([
            {"name": "a", "folder_parent_path": "Work/Servers"},
            {"name": "b", "folder_parent_path": "Work"},
            {"name": "c", "folder_parent_path": "Home"},
            {"name": "d"}
        ]))
        .unwrap();

        let folders = folders_from_resources(&resources).unwrap();
        let paths: Vec<String> = folders.iter().map(|folder| folder.path()).collect();
        assert_eq!(paths, vec!["Work", "Work/Servers", "Home"]);
        assert_eq!(folders.get(1).unwrap().folder_parent_path(), "Work");
        assert_eq!(folders.get(1).unwrap().name(), "Servers");
    }
}
