//! Read-only table of the registered CSV dialects
//!
//! Adding a format means adding one [`CodecEntry`] here.

use tracing::debug;

use super::{
    Csv1PasswordCodec, CsvDialect, CsvKdbxCodec, CsvLastPassCodec, RowComposer, RowParser,
};
use crate::core::errors::{EntityError, EntityResult};
use crate::entity::ExportFormat;

/// A registered format: identifier plus its composer and parser
pub struct CodecEntry {
    pub format: ExportFormat,
    pub composer: &'static dyn RowComposer,
    pub parser: &'static dyn RowParser,
}

impl std::fmt::Debug for CodecEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecEntry")
            .field("format", &self.format)
            .finish()
    }
}

impl CodecEntry {
    /// Column names, in the order they are written
    pub fn header(&self) -> Vec<&'static str> {
        super::header(self.composer.mapping())
    }
}

static REGISTRY: [CodecEntry; 3] = [
    CodecEntry {
        format: ExportFormat::CsvKdbx,
        composer: &CsvKdbxCodec,
        parser: &CsvKdbxCodec,
    },
    CodecEntry {
        format: ExportFormat::CsvLastPass,
        composer: &CsvLastPassCodec,
        parser: &CsvLastPassCodec,
    },
    CodecEntry {
        format: ExportFormat::Csv1Password,
        composer: &Csv1PasswordCodec,
        parser: &Csv1PasswordCodec,
    },
];

/// Look up the codec registered for a format identifier
pub fn find_codec(format: &str) -> EntityResult<&'static CodecEntry> {
    let entry = ExportFormat::from_id(format)
        .and_then(|format| REGISTRY.iter().find(|entry| entry.format == format));

    match entry {
        Some(entry) => {
            debug!("Selected codec for format {}", format);
            Ok(entry)
        }
        None => {
            debug!("No codec registered for format {}", format);
            Err(EntityError::UnsupportedFormat {
                format: format.to_string(),
            })
        }
    }
}

/// Formats that have a registered codec
pub fn supported_formats() -> impl Iterator<Item = ExportFormat> {
    REGISTRY.iter().map(|entry| entry.format)
}

/// First codec whose parser columns all appear in `header`
pub fn detect_codec(header: &[&str]) -> Option<&'static CodecEntry> {
    REGISTRY.iter().find(|entry| {
        entry
            .parser
            .parse_mapping()
            .iter()
            .all(|(_, column)| header.contains(column))
    })
}
