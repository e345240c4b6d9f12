#![forbid(unsafe_code)]
//! Translation memory conversion between CSV tables and TMX documents.
//!
//! A CSV file whose first row lists one language code per column becomes a
//! TMX 1.4 document with one `<tu>` per row and one `<tuv>` per column, and
//! back again. TMX documents can also be checked against the TMX DTD.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tmxconv::{csv_to_tmx, tmx_to_csv, CsvToTmxOptions, TmxToCsvOptions, SegType};
//!
//! let options = CsvToTmxOptions::new()
//!     .with_source_lang("es")
//!     .with_seg_type(SegType::Phrase);
//! let units = csv_to_tmx("memory.csv", "memory.tmx", &options)?;
//!
//! // And back; columns follow the first unit's language order
//! let rows = tmx_to_csv("memory.tmx", "memory_copy.csv", &TmxToCsvOptions::new())?;
//! assert_eq!(units, rows);
//! # Ok::<(), tmxconv::Error>(())
//! ```
//!
//! # Validation
//!
//! ```rust,no_run
//! use tmxconv::schema::{SchemaCache, SchemaLocation};
//!
//! let cache = SchemaCache::new(SchemaLocation::default());
//! for violation in cache.validate_file("memory.tmx")? {
//!     println!("{violation}");
//! }
//! # Ok::<(), tmxconv::Error>(())
//! ```

pub mod converter;
pub mod error;
pub mod formats;
pub mod options;
pub mod path;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    converter::{convert_auto, csv_to_tmx, document_to_table, table_to_document, tmx_to_csv},
    error::Error,
    formats::FormatType,
    options::{Alignment, CsvToTmxOptions, TmxToCsvOptions},
    path::derive_output_path,
    types::{Document, Header, SegType, Table, TranslationUnit, Variant},
};
