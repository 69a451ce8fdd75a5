//! LastPass compatible CSV layout

use super::{ColumnMapping, CsvDialect, RowComposer, RowParser};
use crate::entity::ExportFormat;

const MAPPING: ColumnMapping = &[
    ("name", "name"),
    ("username", "username"),
    ("uri", "url"),
    ("secret_clear", "password"),
    ("description", "extra"),
    ("folder_parent_path", "grouping"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLastPassCodec;

impl CsvDialect for CsvLastPassCodec {
    fn format(&self) -> ExportFormat {
        ExportFormat::CsvLastPass
    }

    fn mapping(&self) -> ColumnMapping {
        MAPPING
    }
}

impl RowComposer for CsvLastPassCodec {}

impl RowParser for CsvLastPassCodec {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{header, ParseContext};
    use crate::entity::{Entity, ExternalResourceEntity};
    use serde_json::json;

    #[test]
    fn test_columns() {
        assert_eq!(
            header(CsvLastPassCodec.mapping()),
            vec!["name", "username", "url", "password", "extra", "grouping"]
        );
    }

    #[test]
    fn test_compose_then_parse_keeps_mapped_fields() {
        let resource = ExternalResourceEntity::from_dto(json!({
            "id": "7f077753-0835-4054-92ee-556660ea04f1",
            "name": "mail",
            "username": "ada@example.com",
            "uri": "https://mail.example.com",
            "secret_clear": "hunter2",
            "description": "personal",
            "folder_parent_path": "Home/Mail"
        }))
        .unwrap();

        let row = CsvLastPassCodec.compose(&resource);
        assert_eq!(row["grouping"], "Home/Mail");
        assert_eq!(row["extra"], "personal");

        let parsed = CsvLastPassCodec.parse(&row, &ParseContext::default()).unwrap();
        for (field, _) in CsvLastPassCodec.mapping() {
            assert_eq!(parsed.get(field), resource.get(field), "field {field}");
        }
        // id has no column
        assert_eq!(parsed.id(), None);
    }
}
