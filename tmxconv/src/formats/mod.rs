//! File formats understood by tmxconv.
//!
//! [`FormatType`] names each format and its conventional extension, which the
//! path deriver uses when naming converter output.

pub mod csv;
pub mod tmx;

use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

pub use tmx::{TMX_VERSION, XML_DECLARATION};

use crate::Error;

/// The two sides of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// Comma-separated table with a language-code header row.
    Csv,
    /// TMX 1.4 translation memory document.
    Tmx,
}

impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Csv => write!(f, "csv"),
            FormatType::Tmx => write!(f, "tmx"),
        }
    }
}

/// Accepts `csv` and `tmx` (also `xml`), case-insensitively.
///
/// # Example
/// ```rust
/// use tmxconv::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("TMX").unwrap(), FormatType::Tmx);
/// assert!(FormatType::from_str("xliff").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "csv" => Ok(FormatType::Csv),
            "tmx" | "xml" => Ok(FormatType::Tmx),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Csv => ".csv",
            FormatType::Tmx => ".tmx",
        }
    }

    /// The format on the other side of a conversion.
    pub fn counterpart(&self) -> FormatType {
        match self {
            FormatType::Csv => FormatType::Tmx,
            FormatType::Tmx => FormatType::Csv,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_and_counterpart() {
        assert_eq!(FormatType::Csv.extension(), ".csv");
        assert_eq!(FormatType::Csv.counterpart(), FormatType::Tmx);
        assert_eq!(FormatType::Tmx.counterpart().extension(), ".csv");
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FormatType::from_path("data/a.CSV"), Some(FormatType::Csv));
        assert_eq!(FormatType::from_path("a.tmx"), Some(FormatType::Tmx));
        assert_eq!(FormatType::from_path("a.txt"), None);
        assert_eq!(FormatType::from_path("noext"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FormatType::Tmx.to_string(), "tmx");
    }
}
