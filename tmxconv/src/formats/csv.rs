//! Support for the CSV translation table format.
//!
//! The first record is the language header; every following record is one row
//! of aligned translations. Input is decoded BOM-aware, so a leading byte-order
//! mark never reaches the first header cell.
use std::io::{BufRead, Write};

use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::{error::Error, traits::Parser, types::Table};

impl Parser for Table {
    /// Parse from any reader.
    ///
    /// Rows are read flexibly; arity is checked by [`Table::validate`] so the
    /// error can name the offending record.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        // Strip a UTF-8 BOM, transcode UTF-16 with BOM; other bytes pass through
        let decoder = DecodeReaderBytesBuilder::new()
            .encoding(Some(encoding_rs::UTF_8))
            .bom_override(true)
            .utf8_passthru(true)
            .build(reader);

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(decoder);

        let mut records = rdr.records();
        let languages: Vec<String> = match records.next() {
            Some(header) => header?.iter().map(str::to_string).collect(),
            None => return Err(Error::EmptyTable),
        };

        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Table { languages, rows })
    }

    /// Write to any writer (file, memory, etc.).
    ///
    /// Rows are written as they are; a short or long row stays short or long.
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);
        wtr.write_record(&self.languages)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_simple_csv() {
        let csv_content = "en,es\nHi,Hola\nBye,Adiós\n";
        let table = Table::from_reader(Cursor::new(csv_content)).unwrap();
        assert_eq!(table.languages, vec!["en", "es"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["Bye", "Adiós"]);
    }

    #[test]
    fn test_bom_is_stripped_from_first_header_cell() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("en,es\nHi,Hola\n".as_bytes());
        let table = Table::from_bytes(&bytes).unwrap();
        assert_eq!(table.languages[0], "en");
        assert!(!table.languages[0].starts_with('\u{feff}'));
    }

    #[test]
    fn test_utf16_bom_is_decoded() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "en,ja\nHi,こんにちは\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let table = Table::from_bytes(&bytes).unwrap();
        assert_eq!(table.languages, vec!["en", "ja"]);
        assert_eq!(table.rows[0][1], "こんにちは");
    }

    #[test]
    fn test_quoted_comma_is_one_cell() {
        let csv_content = "es,en\n\"Hola, John\",\"Hi John\"\n";
        let table = Table::from_str(csv_content).unwrap();
        assert_eq!(table.rows[0], vec!["Hola, John", "Hi John"]);
    }

    #[test]
    fn test_empty_input_has_no_header() {
        let err = Table::from_str("").unwrap_err();
        assert!(matches!(err, Error::EmptyTable));
    }

    #[test]
    fn test_ragged_rows_are_read_not_rejected() {
        let table = Table::from_str("en,es\nHi\n").unwrap();
        assert_eq!(table.rows[0], vec!["Hi"]);
        assert!(matches!(
            table.validate(),
            Err(Error::MalformedRow { row: 2, .. })
        ));
    }

    #[test]
    fn test_write_quotes_embedded_comma() {
        let table = Table::new(vec!["es".into(), "en".into()])
            .with_rows(vec![vec!["Hola, John".into(), "Hi John".into()]]);
        let out = String::from_utf8(table.to_bytes().unwrap()).unwrap();
        assert_eq!(out, "es,en\n\"Hola, John\",Hi John\n");
    }
}
