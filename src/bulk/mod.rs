//! Bulk listing import and export.
//!
//! An uploaded sheet goes through [`tokenizer`] (line splitting), [`schema`]
//! (header synonyms and value coercion) and [`importer`] (required-field
//! checks). Valid rows are committed by the caller in a single bulk insert.

pub mod exporter;
pub mod importer;
pub mod schema;
pub mod tokenizer;

pub use exporter::export_businesses;
pub use importer::{parse_business_sheet, ImportError, ImportReport};
