//! Support for TMX 1.4 translation memory documents.
//!
//! Only the flat `tmx/header` + `tmx/body/tu/tuv/seg` structure is handled.
//! Inline markup inside `<seg>` is not interpreted: its text is kept, its tags
//! are dropped.

use std::io::{BufRead, Write};

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use tracing::warn;

use crate::{
    error::Error,
    traits::Parser,
    types::{Document, Header, SegType, TranslationUnit, Variant},
};

/// Written verbatim ahead of the serialized tree.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub const TMX_VERSION: &str = "1.4";

const INDENT: usize = 2;

impl Parser for Document {
    /// Parse from any reader.
    ///
    /// Every `<tu>` in the document is collected in document order, wherever
    /// it sits in the tree.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut state = ReadState::default();

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => state.open(e, false)?,
                Event::Empty(ref e) => {
                    state.open(e, true)?;
                    state.close(e.name().as_ref())?;
                }
                Event::End(ref e) => state.close(e.name().as_ref())?,
                Event::Text(e) => {
                    if state.in_seg() {
                        state.push_text(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if state.in_seg() {
                        state.push_text(&String::from_utf8(e.into_inner().into_owned())?);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Document {
            header: state.header,
            units: state.units,
        })
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(XML_DECLARATION.as_bytes())?;
        writer.write_all(b"\n")?;

        let mut xml_writer = Writer::new_with_indent(&mut writer, b' ', INDENT);

        let mut tmx = BytesStart::new("tmx");
        tmx.push_attribute(("version", TMX_VERSION));
        xml_writer.write_event(Event::Start(tmx))?;

        xml_writer.write_event(Event::Empty(header_element(&self.header)))?;

        if self.units.is_empty() {
            xml_writer.write_event(Event::Empty(BytesStart::new("body")))?;
        } else {
            xml_writer.write_event(Event::Start(BytesStart::new("body")))?;
            for unit in &self.units {
                write_unit(&mut xml_writer, unit)?;
            }
            xml_writer.write_event(Event::End(BytesEnd::new("body")))?;
        }

        xml_writer.write_event(Event::End(BytesEnd::new("tmx")))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn header_element(header: &Header) -> BytesStart<'_> {
    let mut elem = BytesStart::new("header");
    elem.push_attribute(("creationtool", header.creation_tool.as_str()));
    elem.push_attribute((
        "creationtoolversion",
        header.creation_tool_version.as_str(),
    ));
    elem.push_attribute(("datatype", header.datatype.as_str()));
    elem.push_attribute(("segtype", header.seg_type.as_str()));
    elem.push_attribute(("adminlang", header.admin_lang.as_str()));
    elem.push_attribute(("srclang", header.src_lang.as_str()));
    elem.push_attribute(("targetlang", header.target_encoding.as_str()));
    elem
}

fn write_unit<W: Write>(xml_writer: &mut Writer<W>, unit: &TranslationUnit) -> Result<(), Error> {
    xml_writer.write_event(Event::Start(BytesStart::new("tu")))?;
    for variant in &unit.variants {
        let mut tuv = BytesStart::new("tuv");
        tuv.push_attribute(("xml:lang", variant.lang.as_str()));
        xml_writer.write_event(Event::Start(tuv))?;
        xml_writer.write_event(Event::Start(BytesStart::new("seg")))?;
        // Only markup characters are escaped; non-ASCII text is written as-is
        xml_writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
            &variant.text,
        ))))?;
        xml_writer.write_event(Event::End(BytesEnd::new("seg")))?;
        xml_writer.write_event(Event::End(BytesEnd::new("tuv")))?;
    }
    xml_writer.write_event(Event::End(BytesEnd::new("tu")))?;
    Ok(())
}

/// Streaming state while walking the event stream.
#[derive(Default)]
struct ReadState {
    header: Header,
    units: Vec<TranslationUnit>,
    unit: Option<TranslationUnit>,
    /// Language of the open `<tuv>`, if any.
    variant_lang: Option<String>,
    variant_text: String,
    /// Nesting depth inside the open `<seg>`; zero when outside.
    seg_depth: usize,
}

impl ReadState {
    fn in_seg(&self) -> bool {
        self.seg_depth > 0
    }

    fn push_text(&mut self, text: &str) {
        self.variant_text.push_str(text);
    }

    fn open(&mut self, e: &BytesStart, empty: bool) -> Result<(), Error> {
        if self.in_seg() {
            // inline markup: keep walking, its text still belongs to the segment
            self.seg_depth += 1;
            return Ok(());
        }
        match e.name().as_ref() {
            b"header" => self.read_header(e)?,
            b"tu" => self.unit = Some(TranslationUnit::default()),
            b"tuv" if self.unit.is_some() => {
                let lang = variant_lang(e)?
                    .ok_or_else(|| Error::invalid_document("<tuv> without xml:lang"))?;
                self.variant_lang = Some(lang);
                self.variant_text.clear();
            }
            b"seg" if self.variant_lang.is_some() => {
                if !empty {
                    self.seg_depth = 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), Error> {
        if self.seg_depth > 1 {
            self.seg_depth -= 1;
            return Ok(());
        }
        match name {
            b"seg" => self.seg_depth = 0,
            b"tuv" => {
                if let (Some(unit), Some(lang)) = (self.unit.as_mut(), self.variant_lang.take()) {
                    let text = std::mem::take(&mut self.variant_text);
                    unit.variants.push(Variant { lang, text });
                }
            }
            b"tu" => {
                if let Some(unit) = self.unit.take() {
                    self.units.push(unit);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn read_header(&mut self, e: &BytesStart) -> Result<(), Error> {
        for attr in e.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.as_ref() {
                b"creationtool" => self.header.creation_tool = value,
                b"creationtoolversion" => self.header.creation_tool_version = value,
                b"datatype" => self.header.datatype = value,
                b"segtype" => match SegType::parse_any(&value) {
                    Ok(seg_type) => self.header.seg_type = seg_type,
                    Err(_) => warn!(segtype = %value, "ignoring unknown segtype"),
                },
                b"adminlang" => self.header.admin_lang = value,
                b"srclang" => self.header.src_lang = value,
                b"targetlang" => self.header.target_encoding = value,
                _ => {}
            }
        }
        Ok(())
    }
}

/// `xml:lang`, falling back to the pre-1.4 `lang` attribute.
fn variant_lang(e: &BytesStart) -> Result<Option<String>, Error> {
    let mut legacy = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"xml:lang" => return Ok(Some(attr.unescape_value()?.into_owned())),
            b"lang" => legacy = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok(legacy)
}
