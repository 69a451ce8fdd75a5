//! CSV export
//!
//! Turns the resources of an export request into a document in the
//! requested layout. Every cell is quoted and lines end with CRLF.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::{debug, info};

use crate::codec::registry::find_codec;
use crate::codec::{header, CsvDialect, RowComposer};
use crate::core::errors::{EntityError, EntityResult};
use crate::entity::{ExportResourcesFileEntity, ExternalResourcesCollection};

/// Write the header and one row per resource.
/// The header is written even when there are no resources.
pub fn compose_document(
    composer: &dyn RowComposer,
    resources: &ExternalResourcesCollection,
) -> EntityResult<String> {
    let columns = header(composer.mapping());
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for resource in resources {
        let row = composer.compose(resource);
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(*column).map(String::as_str).unwrap_or_default()),
        )?;
    }

    let bytes = writer.into_inner().map_err(|e| EntityError::Csv {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| EntityError::Serialization {
        message: e.to_string(),
    })
}

/// Fills the output buffer of an export request
pub struct ResourcesCsvExporter<'a> {
    export: &'a mut ExportResourcesFileEntity,
}

impl<'a> ResourcesCsvExporter<'a> {
    pub fn new(export: &'a mut ExportResourcesFileEntity) -> Self {
        Self { export }
    }

    /// Fails with `UnsupportedFormat` before any row is composed when the
    /// requested format has no codec.
    pub fn export(self) -> EntityResult<()> {
        let format = self.export.format();
        let codec = find_codec(format.as_str())?;

        let resources = self.export.export_resources();
        debug!("Composing {} resources as {}", resources.len(), format);
        let document = compose_document(codec.composer, resources)?;

        info!(
            "Exported {} resources to {} ({} bytes)",
            resources.len(),
            format,
            document.len()
        );
        self.export.set_file(document);
        Ok(())
    }
}
