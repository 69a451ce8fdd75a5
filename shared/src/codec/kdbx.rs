//! KeePass compatible CSV layout

use super::{ColumnMapping, CsvDialect, RowComposer, RowParser};
use crate::entity::ExportFormat;

const MAPPING: ColumnMapping = &[
    ("name", "Title"),
    ("username", "Username"),
    ("uri", "URL"),
    ("secret_clear", "Password"),
    ("description", "Notes"),
    ("folder_parent_path", "Group"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvKdbxCodec;

impl CsvDialect for CsvKdbxCodec {
    fn format(&self) -> ExportFormat {
        ExportFormat::CsvKdbx
    }

    fn mapping(&self) -> ColumnMapping {
        MAPPING
    }
}

impl RowComposer for CsvKdbxCodec {}

impl RowParser for CsvKdbxCodec {}
