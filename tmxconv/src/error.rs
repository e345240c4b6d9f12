//! All error types for the tmxconv crate.
//!
//! Every conversion reports failures through [`Error`]. Errors are scoped to a
//! single file; batch drivers collect them per input and keep going.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("source column not found (index: {index:?}, language: `{lang}`)")]
    SourceColumnNotFound { index: Option<usize>, lang: String },

    #[error("row {row} has {found} cells but the header has {expected} columns")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("document has zero translation units")]
    EmptyDocument,

    #[error("table has no header row")]
    EmptyTable,

    #[error("{} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("unit {unit} has {found} variants but the header has {expected} languages")]
    RowArityMismatch {
        unit: usize,
        expected: usize,
        found: usize,
    },

    #[error("unit {unit} has a `{lang}` variant that does not match the header languages")]
    UnknownLanguageTag { unit: usize, lang: String },

    #[error("invalid segtype `{0}` (expected `sentence` or `phrase`)")]
    InvalidSegType(String),

    #[error("invalid alignment `{0}` (expected `by-language` or `positional`)")]
    InvalidAlignment(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Creates a new invalid document error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Error::InvalidDocument(message.into())
    }

    /// Creates a new schema error
    pub fn schema_error(message: impl Into<String>) -> Self {
        Error::Schema(message.into())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Error::InvalidDocument(value.to_string())
    }
}
