//! Row codecs for the tabular credential formats
//!
//! Each supported CSV dialect is a unit type implementing [`RowComposer`]
//! (canonical resource to flat row) and [`RowParser`] (flat row to canonical
//! resource). The dialects differ only in their column mapping, so the
//! conversion logic lives in the trait default methods.
//!
//! The set of dialects is closed and held in a read-only table, see
//! [`registry`].

pub mod kdbx;
pub mod lastpass;
pub mod onepassword;
pub mod registry;

pub use kdbx::CsvKdbxCodec;
pub use lastpass::CsvLastPassCodec;
pub use onepassword::Csv1PasswordCodec;
pub use registry::{detect_codec, find_codec, supported_formats, CodecEntry};

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::errors::EntityResult;
use crate::core::types::Dto;
use crate::entity::resource_type::SLUG_PASSWORD_AND_DESCRIPTION;
use crate::entity::{
    Entity, ExportFormat, ExternalResourceEntity, ResourceTypeEntity, ResourceTypesCollection,
};

/// Canonical field name -> column name, in column order
pub type ColumnMapping = &'static [(&'static str, &'static str)];

/// One flat row keyed by column name
pub type CsvRow = BTreeMap<String, String>;

/// Column names of a mapping, in declared order
pub fn header(mapping: ColumnMapping) -> Vec<&'static str> {
    mapping.iter().map(|(_, column)| *column).collect()
}

/// Lookups available to a parser while it builds resources
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub resource_types: Option<&'a ResourceTypesCollection>,
    pub default_slug: &'a str,
}

impl<'a> ParseContext<'a> {
    pub fn new(resource_types: Option<&'a ResourceTypesCollection>, default_slug: &'a str) -> Self {
        Self {
            resource_types,
            default_slug,
        }
    }

    /// Resource type given to rows of formats without a type column.
    /// Without a catalog no default is applied.
    pub fn default_resource_type(&self) -> Option<&'a ResourceTypeEntity> {
        self.resource_types
            .and_then(|types| types.get_first_by_slug(self.default_slug))
    }
}

impl Default for ParseContext<'_> {
    fn default() -> Self {
        Self::new(None, SLUG_PASSWORD_AND_DESCRIPTION)
    }
}

/// A CSV dialect: its format identifier and its column layout
pub trait CsvDialect: Send + Sync {
    fn format(&self) -> ExportFormat;

    /// Columns written on export, in order
    fn mapping(&self) -> ColumnMapping;
}

pub trait RowComposer: CsvDialect {
    /// Flatten a resource; absent fields become empty cells
    fn compose(&self, resource: &ExternalResourceEntity) -> CsvRow {
        self.mapping()
            .iter()
            .map(|(field, column)| {
                let cell = resource.get_str(field).unwrap_or_default();
                (column.to_string(), cell.to_string())
            })
            .collect()
    }
}

pub trait RowParser: CsvDialect {
    /// Columns read on import; defaults to the export layout
    fn parse_mapping(&self) -> ColumnMapping {
        self.mapping()
    }

    fn resolve_resource_type<'a>(
        &self,
        _row: &CsvRow,
        context: &ParseContext<'a>,
    ) -> Option<&'a ResourceTypeEntity> {
        context.default_resource_type()
    }

    /// Build a resource from a row. Empty cells are treated as absent.
    fn parse(&self, row: &CsvRow, context: &ParseContext<'_>) -> EntityResult<ExternalResourceEntity> {
        let mut dto = Dto::new();
        if let Some(resource_type) = self.resolve_resource_type(row, context) {
            dto.insert(
                "resource_type_id".to_string(),
                Value::String(resource_type.id().to_string()),
            );
        }
        for (field, column) in self.parse_mapping() {
            match row.get(*column) {
                Some(cell) if !cell.is_empty() => {
                    dto.insert(field.to_string(), Value::String(cell.clone()));
                }
                _ => {}
            }
        }
        ExternalResourceEntity::from_dto(Value::Object(dto))
    }
}
