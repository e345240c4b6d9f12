//! Core, format-agnostic types for tmxconv.
//! The CSV codec decodes into [`Table`], the TMX codec into [`Document`];
//! the converters move data between the two.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// A table of aligned per-language text.
///
/// `languages` is the header row; every row holds one cell per language, in
/// header order. Language ids are not required to be unique, but lookups by
/// language always resolve to the first matching column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Table {
    /// Header row: one language identifier per column.
    pub languages: Vec<String>,

    /// Data rows, excluding the header.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(languages: Vec<String>) -> Self {
        Self {
            languages,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn column_count(&self) -> usize {
        self.languages.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column tagged `lang`.
    pub fn column_of(&self, lang: &str) -> Option<usize> {
        self.languages.iter().position(|l| l == lang)
    }

    /// Resolve the source column.
    ///
    /// An explicit `index` wins over `lang` and must address an existing
    /// column. Without an index, the first header cell equal to `lang` is used.
    pub fn source_column(&self, index: Option<usize>, lang: &str) -> Result<usize, Error> {
        let resolved = match index {
            Some(i) if i < self.column_count() => Some(i),
            Some(_) => None,
            None => self.column_of(lang),
        };
        resolved.ok_or_else(|| Error::SourceColumnNotFound {
            index,
            lang: lang.to_string(),
        })
    }

    /// Check that every row has exactly one cell per header column.
    ///
    /// Row numbers in errors count file records, so the header is record 1
    /// and the first data row is record 2.
    pub fn validate(&self) -> Result<(), Error> {
        let expected = self.column_count();
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != expected {
                return Err(Error::MalformedRow {
                    row: i + 2,
                    expected,
                    found: row.len(),
                });
            }
        }
        Ok(())
    }

    /// Header entries that are not well-formed BCP 47 identifiers.
    pub fn unrecognized_languages(&self) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|l| l.parse::<LanguageIdentifier>().is_err())
            .map(String::as_str)
            .collect()
    }

    /// Re-express each row as a translation unit, in header order.
    pub fn units(&self) -> Result<Vec<TranslationUnit>, Error> {
        self.validate()?;
        Ok(self
            .rows
            .iter()
            .map(|row| TranslationUnit {
                variants: self
                    .languages
                    .iter()
                    .zip(row)
                    .map(|(lang, text)| Variant::new(lang.clone(), text.clone()))
                    .collect(),
            })
            .collect())
    }
}

/// One aligned set of per-language segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslationUnit {
    /// Variants in serialized order.
    pub variants: Vec<Variant>,
}

impl TranslationUnit {
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.lang.as_str())
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.text.as_str())
    }

    /// Text of the first variant tagged `lang`.
    pub fn text_for(&self, lang: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.lang == lang)
            .map(|v| v.text.as_str())
    }
}

/// A single segment of plain text in one language (`<tuv>` holding one `<seg>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Variant {
    pub lang: String,
    pub text: String,
}

impl Variant {
    pub fn new(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            text: text.into(),
        }
    }
}

/// Segmentation level recorded in the TMX header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegType {
    Block,
    Paragraph,
    #[default]
    Sentence,
    Phrase,
}

impl SegType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegType::Block => "block",
            SegType::Paragraph => "paragraph",
            SegType::Sentence => "sentence",
            SegType::Phrase => "phrase",
        }
    }

    /// Parse any segtype a TMX 1.4 document may carry.
    pub fn parse_any(s: &str) -> Result<Self, Error> {
        match s {
            "block" => Ok(SegType::Block),
            "paragraph" => Ok(SegType::Paragraph),
            other => other.parse(),
        }
    }
}

impl Display for SegType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts only the segtypes the CSV converter produces.
impl FromStr for SegType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentence" => Ok(SegType::Sentence),
            "phrase" => Ok(SegType::Phrase),
            _ => Err(Error::InvalidSegType(s.to_string())),
        }
    }
}

/// Metadata carried by the TMX `<header>` element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Header {
    pub creation_tool: String,
    pub creation_tool_version: String,
    pub datatype: String,
    pub seg_type: SegType,
    pub admin_lang: String,
    pub src_lang: String,
    /// Written as the `targetlang` attribute. It has always carried the
    /// output encoding name rather than a language.
    pub target_encoding: String,
}

impl Header {
    pub fn new(src_lang: impl Into<String>, seg_type: SegType) -> Self {
        Self {
            src_lang: src_lang.into(),
            seg_type,
            ..Self::default()
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self {
            creation_tool: String::new(),
            creation_tool_version: String::new(),
            datatype: "PlainText".to_string(),
            seg_type: SegType::Sentence,
            admin_lang: "en".to_string(),
            src_lang: String::new(),
            target_encoding: "UTF-8".to_string(),
        }
    }
}

/// A TMX document: one header and the body's translation units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Document {
    pub header: Header,
    pub units: Vec<TranslationUnit>,
}

impl Document {
    pub fn new(header: Header, units: Vec<TranslationUnit>) -> Self {
        Self { header, units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
