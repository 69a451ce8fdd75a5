//! Transcoding pipeline
//!
//! Moves resource collections through a registered codec, to and from one
//! flat CSV document. Every call builds its own exporter or importer and
//! keeps no state once the document or the collection is produced.
//!
//! Documents use comma separators, quote every cell and end every line,
//! header included, with CRLF.

pub mod export;
pub mod import;

pub use export::{compose_document, ResourcesCsvExporter};
pub use import::{folders_from_resources, ResourcesCsvImporter};
