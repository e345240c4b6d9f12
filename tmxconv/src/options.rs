//! Options for the two converters.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::Error, types::SegType};

/// Default source language looked up in the CSV header.
pub const DEFAULT_SOURCE_LANG: &str = "en";

/// Behavior options for [`crate::converter::csv_to_tmx`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvToTmxOptions {
    /// Explicit source column; takes precedence over `source_lang`.
    pub source_index: Option<usize>,
    /// Language searched for in the header when no index is given.
    pub source_lang: String,
    /// Segmentation level written to the header.
    pub seg_type: SegType,
    /// `creationtool` header attribute.
    pub creation_tool: String,
    /// `creationtoolversion` header attribute.
    pub creation_tool_version: String,
}

impl Default for CsvToTmxOptions {
    fn default() -> Self {
        Self {
            source_index: None,
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            seg_type: SegType::Sentence,
            creation_tool: String::new(),
            creation_tool_version: String::new(),
        }
    }
}

impl CsvToTmxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_index(mut self, source_index: Option<usize>) -> Self {
        self.source_index = source_index;
        self
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }

    pub fn with_seg_type(mut self, seg_type: SegType) -> Self {
        self.seg_type = seg_type;
        self
    }

    pub fn with_creation_tool(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.creation_tool = name.into();
        self.creation_tool_version = version.into();
        self
    }
}

/// How TMX→CSV places each unit's texts into the header columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    /// Look each header language up in the unit's own tags. Units that do not
    /// carry exactly the header's languages are rejected.
    #[default]
    ByLanguage,
    /// Write each unit's texts in its own document order, ignoring tags.
    ///
    /// Assumes every unit lists its languages in the same order as the first
    /// unit. Input violating that yields silently misaligned columns, and
    /// units with a different variant count yield short or long rows.
    Positional,
}

impl Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alignment::ByLanguage => f.write_str("by-language"),
            Alignment::Positional => f.write_str("positional"),
        }
    }
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "by-language" | "language" => Ok(Alignment::ByLanguage),
            "positional" | "position" => Ok(Alignment::Positional),
            _ => Err(Error::InvalidAlignment(s.to_string())),
        }
    }
}

/// Behavior options for [`crate::converter::tmx_to_csv`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TmxToCsvOptions {
    pub alignment: Alignment,
}

impl TmxToCsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_to_tmx_defaults() {
        let options = CsvToTmxOptions::new();
        assert_eq!(options.source_index, None);
        assert_eq!(options.source_lang, "en");
        assert_eq!(options.seg_type, SegType::Sentence);
    }

    #[test]
    fn test_alignment_parse() {
        assert_eq!("positional".parse::<Alignment>().unwrap(), Alignment::Positional);
        assert_eq!("by_language".parse::<Alignment>().unwrap(), Alignment::ByLanguage);
        assert!("sorted".parse::<Alignment>().is_err());
        assert_eq!(Alignment::default().to_string(), "by-language");
    }
}
