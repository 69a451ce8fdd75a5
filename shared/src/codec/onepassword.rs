//! 1Password compatible CSV layout. Folders are not represented.

use super::{ColumnMapping, CsvDialect, RowComposer, RowParser};
use crate::entity::ExportFormat;

const MAPPING: ColumnMapping = &[
    ("name", "Title"),
    ("username", "Username"),
    ("uri", "Url"),
    ("secret_clear", "Password"),
    ("description", "Notes"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Csv1PasswordCodec;

impl CsvDialect for Csv1PasswordCodec {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv1Password
    }

    fn mapping(&self) -> ColumnMapping {
        MAPPING
    }
}

impl RowComposer for Csv1PasswordCodec {}

impl RowParser for Csv1PasswordCodec {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ParseContext;
    use crate::entity::{Entity, ExternalResourceEntity};
    use serde_json::json;

    #[test]
    fn test_folder_path_is_dropped() {
        let resource = ExternalResourceEntity::from_dto(json!({
            "name": "bank",
            "secret_clear": "1234",
            "folder_parent_path": "Finance"
        }))
        .unwrap();

        let row = Csv1PasswordCodec.compose(&resource);
        assert_eq!(row.len(), 5);
        assert!(!row.values().any(|cell| cell == "Finance"));

        let parsed = Csv1PasswordCodec.parse(&row, &ParseContext::default()).unwrap();
        assert_eq!(parsed.name(), "bank");
        assert_eq!(parsed.secret_clear(), "1234");
        assert_eq!(parsed.folder_parent_path(), "");
    }
}
