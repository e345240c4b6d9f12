//! CSV ⇄ TMX conversion.
//!
//! Both directions read the whole input into memory, transform it, and only
//! then write the output. A failure at any stage leaves the output path as it
//! was.

use std::{collections::HashMap, path::Path};

use tracing::{debug, info, info_span, warn};

use crate::{
    error::Error,
    formats::FormatType,
    options::{Alignment, CsvToTmxOptions, TmxToCsvOptions},
    traits::Parser,
    types::{Document, Header, Table, TranslationUnit},
};

/// Build a TMX document from a table.
///
/// The source column is resolved from `options` (explicit index first, then
/// the first header cell equal to the source language). Every row must have
/// one cell per header column.
pub fn table_to_document(table: &Table, options: &CsvToTmxOptions) -> Result<Document, Error> {
    let source = table.source_column(options.source_index, &options.source_lang)?;
    let src_lang = &table.languages[source];
    debug!(column = source, lang = %src_lang, "resolved source column");

    for lang in table.unrecognized_languages() {
        warn!(%lang, "header cell is not a BCP 47 language identifier");
    }

    let header = Header {
        creation_tool: options.creation_tool.clone(),
        creation_tool_version: options.creation_tool_version.clone(),
        seg_type: options.seg_type,
        src_lang: src_lang.clone(),
        ..Header::default()
    };
    Ok(Document::new(header, table.units()?))
}

/// Flatten a TMX document into a table.
///
/// The header row is taken from the first unit's language tags. Every unit,
/// the first included, becomes one row; see [`Alignment`] for how its texts
/// are placed.
pub fn document_to_table(document: &Document, options: &TmxToCsvOptions) -> Result<Table, Error> {
    let first = document.units.first().ok_or(Error::EmptyDocument)?;
    let languages: Vec<String> = first.languages().map(str::to_string).collect();

    let rows = document
        .units
        .iter()
        .enumerate()
        .map(|(i, unit)| match options.alignment {
            Alignment::Positional => Ok(unit.texts().map(str::to_string).collect()),
            Alignment::ByLanguage => align_by_language(&languages, unit, i + 1),
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Table { languages, rows })
}

/// Place a unit's texts into header order by matching language tags.
///
/// A language repeated in the header is matched occurrence by occurrence.
fn align_by_language(
    languages: &[String],
    unit: &TranslationUnit,
    unit_number: usize,
) -> Result<Vec<String>, Error> {
    let mut by_lang: HashMap<&str, Vec<&str>> = HashMap::new();
    for variant in &unit.variants {
        by_lang
            .entry(variant.lang.as_str())
            .or_default()
            .push(variant.text.as_str());
    }

    let mut wanted: HashMap<&str, usize> = HashMap::new();
    for lang in languages {
        *wanted.entry(lang.as_str()).or_default() += 1;
    }
    for variant in &unit.variants {
        let have = by_lang.get(variant.lang.as_str()).map_or(0, Vec::len);
        if have > wanted.get(variant.lang.as_str()).copied().unwrap_or(0) {
            return Err(Error::UnknownLanguageTag {
                unit: unit_number,
                lang: variant.lang.clone(),
            });
        }
    }
    if unit.variants.len() != languages.len() {
        return Err(Error::RowArityMismatch {
            unit: unit_number,
            expected: languages.len(),
            found: unit.variants.len(),
        });
    }

    // Same multiset of tags as the header from here on, so every lookup hits
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut row = Vec::with_capacity(languages.len());
    for lang in languages {
        let nth = seen.entry(lang.as_str()).or_default();
        let text = by_lang
            .get(lang.as_str())
            .and_then(|texts| texts.get(*nth))
            .copied()
            .unwrap_or_default();
        *nth += 1;
        row.push(text.to_string());
    }
    Ok(row)
}

/// Convert a CSV table file into a TMX document file.
///
/// Returns the number of translation units written (data rows, header
/// excluded). The output is overwritten unconditionally.
///
/// # Example
///
/// ```rust,no_run
/// use tmxconv::{converter::csv_to_tmx, options::CsvToTmxOptions};
///
/// let units = csv_to_tmx("memory.csv", "memory.tmx", &CsvToTmxOptions::new())?;
/// println!("{units} pairs are done.");
/// # Ok::<(), tmxconv::Error>(())
/// ```
pub fn csv_to_tmx<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &CsvToTmxOptions,
) -> Result<usize, Error> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let _span = info_span!("csv_to_tmx", input = %input.display()).entered();

    let table = Table::read_from(input)?;
    debug!(
        columns = table.column_count(),
        rows = table.len(),
        "read table"
    );
    let document = table_to_document(&table, options)?;
    document.write_to(output)?;

    info!(output = %output.display(), units = document.len(), "wrote tmx");
    Ok(document.len())
}

/// Convert a TMX document file into a CSV table file.
///
/// Returns the number of translation units, which equals the number of data
/// rows written. A document without units fails with
/// [`Error::EmptyDocument`] and no output file is created.
pub fn tmx_to_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &TmxToCsvOptions,
) -> Result<usize, Error> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let _span = info_span!("tmx_to_csv", input = %input.display()).entered();

    let document = Document::read_from(input)?;
    debug!(units = document.len(), alignment = %options.alignment, "read tmx");
    let table = document_to_table(&document, options)?;
    table.write_to(output)?;

    info!(output = %output.display(), rows = table.len(), "wrote csv");
    Ok(table.len())
}

/// Convert between CSV and TMX, picking the direction from file extensions
/// and using default options.
pub fn convert_auto<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<usize, Error> {
    let (input, output) = (input.as_ref(), output.as_ref());
    match (FormatType::from_path(input), FormatType::from_path(output)) {
        (Some(FormatType::Csv), Some(FormatType::Tmx)) => {
            csv_to_tmx(input, output, &CsvToTmxOptions::default())
        }
        (Some(FormatType::Tmx), Some(FormatType::Csv)) => {
            tmx_to_csv(input, output, &TmxToCsvOptions::default())
        }
        _ => Err(Error::UnknownFormat(format!(
            "{} -> {}",
            input.display(),
            output.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SegType, Variant};

    fn table(languages: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(languages.iter().map(|s| s.to_string()).collect()).with_rows(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn unit(pairs: &[(&str, &str)]) -> TranslationUnit {
        TranslationUnit {
            variants: pairs.iter().map(|(l, t)| Variant::new(*l, *t)).collect(),
        }
    }

    #[test]
    fn test_single_row_document() {
        let t = table(&["en", "es"], &[&["Hi", "Hola"]]);
        let doc = table_to_document(&t, &CsvToTmxOptions::new()).unwrap();
        assert_eq!(doc.header.src_lang, "en");
        assert_eq!(doc.units, vec![unit(&[("en", "Hi"), ("es", "Hola")])]);
    }

    #[test]
    fn test_source_index_overrides_language() {
        let t = table(&["es", "en"], &[&["Hola", "Hi"]]);
        let options = CsvToTmxOptions::new()
            .with_source_index(Some(0))
            .with_seg_type(SegType::Phrase);
        let doc = table_to_document(&t, &options).unwrap();
        assert_eq!(doc.header.src_lang, "es");
        assert_eq!(doc.header.seg_type, SegType::Phrase);
    }

    #[test]
    fn test_duplicate_source_language_resolves_first() {
        let t = table(&["fr", "en", "en"], &[&["a", "b", "c"]]);
        let doc = table_to_document(&t, &CsvToTmxOptions::new()).unwrap();
        assert_eq!(doc.header.src_lang, "en");
        assert_eq!(t.source_column(None, "en").unwrap(), 1);
    }

    #[test]
    fn test_missing_source_language() {
        let t = table(&["fr", "de"], &[&["a", "b"]]);
        let err = table_to_document(&t, &CsvToTmxOptions::new()).unwrap_err();
        assert!(matches!(err, Error::SourceColumnNotFound { .. }));
    }

    #[test]
    fn test_malformed_row_is_rejected() {
        let t = table(&["en", "es"], &[&["Hi", "Hola"], &["a", "b", "c"]]);
        let err = table_to_document(&t, &CsvToTmxOptions::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { row: 3, found: 3, .. }));
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::default();
        let err = document_to_table(&doc, &TmxToCsvOptions::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn test_positional_alignment_trusts_first_unit_order() {
        let doc = Document::new(
            Header::default(),
            vec![
                unit(&[("es", "Hola"), ("en", "Hi")]),
                unit(&[("en", "Bye"), ("es", "Adiós")]),
            ],
        );
        let options = TmxToCsvOptions::new().with_alignment(Alignment::Positional);
        let t = document_to_table(&doc, &options).unwrap();
        assert_eq!(t.languages, vec!["es", "en"]);
        // second unit's first child lands in the `es` column regardless of its tag
        assert_eq!(t.rows[1], vec!["Bye", "Adiós"]);
    }

    #[test]
    fn test_by_language_alignment_realigns() {
        let doc = Document::new(
            Header::default(),
            vec![
                unit(&[("es", "Hola"), ("en", "Hi")]),
                unit(&[("en", "Bye"), ("es", "Adiós")]),
            ],
        );
        let t = document_to_table(&doc, &TmxToCsvOptions::new()).unwrap();
        assert_eq!(t.rows, vec![vec!["Hola", "Hi"], vec!["Adiós", "Bye"]]);
    }

    #[test]
    fn test_by_language_rejects_missing_variant() {
        let doc = Document::new(
            Header::default(),
            vec![unit(&[("en", "Hi"), ("es", "Hola")]), unit(&[("en", "Bye")])],
        );
        let err = document_to_table(&doc, &TmxToCsvOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::RowArityMismatch {
                unit: 2,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_by_language_rejects_unknown_tag() {
        let doc = Document::new(
            Header::default(),
            vec![
                unit(&[("en", "Hi"), ("es", "Hola")]),
                unit(&[("en", "Bye"), ("de", "Tschüss")]),
            ],
        );
        let err = document_to_table(&doc, &TmxToCsvOptions::new()).unwrap_err();
        match err {
            Error::UnknownLanguageTag { unit, lang } => {
                assert_eq!(unit, 2);
                assert_eq!(lang, "de");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_by_language_handles_repeated_header_language() {
        let doc = Document::new(
            Header::default(),
            vec![
                unit(&[("en", "a"), ("fr", "b"), ("en", "c")]),
                unit(&[("fr", "y"), ("en", "x"), ("en", "z")]),
            ],
        );
        let t = document_to_table(&doc, &TmxToCsvOptions::new()).unwrap();
        assert_eq!(t.rows[1], vec!["x", "y", "z"]);
    }

    #[test]
    fn test_positional_keeps_ragged_rows() {
        let doc = Document::new(
            Header::default(),
            vec![unit(&[("en", "Hi"), ("es", "Hola")]), unit(&[("en", "Bye")])],
        );
        let options = TmxToCsvOptions::new().with_alignment(Alignment::Positional);
        let t = document_to_table(&doc, &options).unwrap();
        assert_eq!(t.rows[1], vec!["Bye"]);
    }
}
