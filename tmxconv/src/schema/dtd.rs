//! A parser for the subset of DTD syntax needed to check TMX documents.
//!
//! Handles comments, parameter entities, `<!ELEMENT>` and `<!ATTLIST>`
//! declarations. General entities and notations are accepted and ignored.
//! Conditional sections are not supported.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::error::Error;

lazy_static! {
    static ref COMMENT_REGEX: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref PE_DECL_REGEX: Regex =
        Regex::new(r#"<!ENTITY\s+%\s+([A-Za-z_:][\w.:-]*)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
            .unwrap();
    static ref PE_REF_REGEX: Regex = Regex::new(r"%([A-Za-z_:][\w.:-]*);").unwrap();
}

/// Parameter entities may reference each other; expansion stops after this
/// many passes.
const MAX_ENTITY_DEPTH: usize = 16;

/// How many times a particle may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    Once,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

/// A node of an element-content model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Particle {
    Name(String, Occurrence),
    Seq(Vec<Particle>, Occurrence),
    Choice(Vec<Particle>, Occurrence),
}

/// Allowed content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpec {
    Empty,
    Any,
    /// Character data mixed with any of the listed elements.
    Mixed(Vec<String>),
    /// Element-only content following a content model.
    Children(Particle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    CData,
    /// `ID`, `IDREF`, `NMTOKEN` and friends; values are not checked further.
    Tokenized(String),
    Enumeration(Vec<String>),
    Notation(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDefault {
    Required,
    Implied,
    Fixed(String),
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: String,
    pub kind: AttributeType,
    pub default: AttributeDefault,
}

/// Parsed element and attribute declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dtd {
    pub(crate) elements: HashMap<String, ContentSpec>,
    pub(crate) attributes: HashMap<String, Vec<AttributeDef>>,
}

impl Dtd {
    /// Parse DTD text.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let text = COMMENT_REGEX.replace_all(text, "");
        let text = expand_parameter_entities(&text)?;

        let mut dtd = Dtd::default();
        for decl in Declarations::new(&text) {
            let (keyword, body) = decl?;
            match keyword {
                "ELEMENT" => {
                    let (name, spec) = parse_element(body)?;
                    if dtd.elements.insert(name.clone(), spec).is_some() {
                        return Err(Error::schema_error(format!(
                            "element `{name}` declared twice"
                        )));
                    }
                }
                "ATTLIST" => {
                    let (element, defs) = parse_attlist(body)?;
                    let known = dtd.attributes.entry(element).or_default();
                    for def in defs {
                        // first declaration of an attribute is binding
                        if !known.iter().any(|d| d.name == def.name) {
                            known.push(def);
                        }
                    }
                }
                "ENTITY" | "NOTATION" => {}
                other => {
                    return Err(Error::schema_error(format!(
                        "unsupported declaration `<!{other}`"
                    )));
                }
            }
        }
        Ok(dtd)
    }

    pub fn element(&self, name: &str) -> Option<&ContentSpec> {
        self.elements.get(name)
    }

    pub fn attributes(&self, element: &str) -> &[AttributeDef] {
        self.attributes.get(element).map_or(&[], Vec::as_slice)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}

fn expand_parameter_entities(text: &str) -> Result<String, Error> {
    let mut entities = HashMap::new();
    for caps in PE_DECL_REGEX.captures_iter(text) {
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        // first declaration wins
        entities
            .entry(caps[1].to_string())
            .or_insert_with(|| value.to_string());
    }
    let mut out = PE_DECL_REGEX.replace_all(text, "").into_owned();

    for _ in 0..MAX_ENTITY_DEPTH {
        if !PE_REF_REGEX.is_match(&out) {
            return Ok(out);
        }
        let mut missing = None;
        out = PE_REF_REGEX
            .replace_all(&out, |caps: &Captures| match entities.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            })
            .into_owned();
        if let Some(name) = missing {
            return Err(Error::schema_error(format!(
                "undefined parameter entity `%{name};`"
            )));
        }
    }
    Err(Error::schema_error("parameter entities nest too deeply"))
}

/// Iterates over `<!KEYWORD body>` markup declarations.
struct Declarations<'a> {
    rest: &'a str,
}

impl<'a> Declarations<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Declarations<'a> {
    type Item = Result<(&'a str, &'a str), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest: &'a str = self.rest;
            let start = rest.find('<')?;
            let tail = &rest[start..];
            if let Some(pi) = tail.strip_prefix("<?") {
                let end = pi.find("?>")?;
                self.rest = &pi[end + 2..];
                continue;
            }
            let Some(decl) = tail.strip_prefix("<!") else {
                self.rest = "";
                return Some(Err(Error::schema_error("unexpected markup in DTD")));
            };
            let Some(end) = find_declaration_end(decl) else {
                self.rest = "";
                return Some(Err(Error::schema_error("unterminated declaration")));
            };
            self.rest = &decl[end + 1..];
            let inner = &decl[..end];
            let keyword_end = inner
                .find(|c: char| c.is_whitespace())
                .unwrap_or(inner.len());
            return Some(Ok((&inner[..keyword_end], inner[keyword_end..].trim())));
        }
    }
}

/// Position of the `>` closing a declaration, skipping quoted literals.
fn find_declaration_end(decl: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in decl.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_name(body: &str) -> Result<(&str, &str), Error> {
    let body = body.trim_start();
    let end = body.find(|c: char| c.is_whitespace()).unwrap_or(body.len());
    if end == 0 {
        return Err(Error::schema_error("declaration without a name"));
    }
    Ok((&body[..end], body[end..].trim()))
}

fn parse_element(body: &str) -> Result<(String, ContentSpec), Error> {
    let (name, content) = split_name(body)?;
    let spec = match content {
        "EMPTY" => ContentSpec::Empty,
        "ANY" => ContentSpec::Any,
        c if c.contains("#PCDATA") => ContentSpec::Mixed(
            c.split(|ch: char| matches!(ch, '(' | ')' | '|' | '*') || ch.is_whitespace())
                .filter(|s| !s.is_empty() && *s != "#PCDATA")
                .map(str::to_string)
                .collect(),
        ),
        c if c.starts_with('(') => {
            let mut parser = ModelParser::new(c);
            let particle = parser.particle()?;
            parser.expect_end()?;
            ContentSpec::Children(particle)
        }
        other => {
            return Err(Error::schema_error(format!(
                "invalid content model for `{name}`: {other}"
            )));
        }
    };
    Ok((name.to_string(), spec))
}

/// Recursive-descent parser for element content models.
struct ModelParser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
}

impl<'a> ModelParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn error(&self, what: &str) -> Error {
        Error::schema_error(format!("{what} in content model `{}`", self.src))
    }

    fn particle(&mut self) -> Result<Particle, Error> {
        self.skip_ws();
        if self.chars.next_if(|(_, c)| *c == '(').is_some() {
            let mut items = vec![self.particle()?];
            let mut separator = None;
            loop {
                self.skip_ws();
                match self.chars.next() {
                    Some((_, ')')) => break,
                    Some((_, sep @ (',' | '|'))) => {
                        if separator.is_some_and(|s| s != sep) {
                            return Err(self.error("mixed `,` and `|`"));
                        }
                        separator = Some(sep);
                        items.push(self.particle()?);
                    }
                    _ => return Err(self.error("expected `,`, `|` or `)`")),
                }
            }
            let occurrence = self.occurrence();
            Ok(match separator {
                Some('|') => Particle::Choice(items, occurrence),
                _ => Particle::Seq(items, occurrence),
            })
        } else {
            let start = match self.chars.peek() {
                Some((i, _)) => *i,
                None => return Err(self.error("unexpected end")),
            };
            let mut end = start;
            while let Some((i, c)) = self
                .chars
                .next_if(|(_, c)| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
            {
                end = i + c.len_utf8();
            }
            if end == start {
                return Err(self.error("expected element name"));
            }
            let name = self.src[start..end].to_string();
            Ok(Particle::Name(name, self.occurrence()))
        }
    }

    fn occurrence(&mut self) -> Occurrence {
        match self.chars.next_if(|(_, c)| matches!(c, '?' | '*' | '+')) {
            Some((_, '?')) => Occurrence::Optional,
            Some((_, '*')) => Occurrence::ZeroOrMore,
            Some((_, '+')) => Occurrence::OneOrMore,
            _ => Occurrence::Once,
        }
    }

    fn expect_end(&mut self) -> Result<(), Error> {
        self.skip_ws();
        match self.chars.next() {
            None => Ok(()),
            Some(_) => Err(self.error("trailing characters")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Group(Vec<String>),
    Quoted(String),
}

fn tokenize_attlist(body: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut chars = body.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            let rest = &body[i + 1..];
            let end = rest
                .find(c)
                .ok_or_else(|| Error::schema_error("unterminated attribute default"))?;
            tokens.push(Token::Quoted(rest[..end].to_string()));
            while chars.next_if(|(j, _)| *j <= i + end + 1).is_some() {}
        } else if c == '(' {
            let rest = &body[i + 1..];
            let end = rest
                .find(')')
                .ok_or_else(|| Error::schema_error("unterminated enumeration"))?;
            tokens.push(Token::Group(
                rest[..end]
                    .split('|')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ));
            while chars.next_if(|(j, _)| *j <= i + end + 1).is_some() {}
        } else {
            let rest = &body[i..];
            let end = rest
                .find(|ch: char| ch.is_whitespace() || matches!(ch, '(' | '"' | '\''))
                .unwrap_or(rest.len());
            tokens.push(Token::Word(rest[..end].to_string()));
            while chars.next_if(|(j, _)| *j < i + end).is_some() {}
        }
    }
    Ok(tokens)
}

fn parse_attlist(body: &str) -> Result<(String, Vec<AttributeDef>), Error> {
    let (element, rest) = split_name(body)?;
    let mut tokens = tokenize_attlist(rest)?.into_iter();
    let mut defs = Vec::new();

    while let Some(token) = tokens.next() {
        let Token::Word(name) = token else {
            return Err(Error::schema_error(format!(
                "expected attribute name in ATTLIST for `{element}`"
            )));
        };
        let kind = match tokens.next() {
            Some(Token::Word(w)) if w == "CDATA" => AttributeType::CData,
            Some(Token::Word(w)) if w == "NOTATION" => match tokens.next() {
                Some(Token::Group(values)) => AttributeType::Notation(values),
                _ => {
                    return Err(Error::schema_error(format!(
                        "NOTATION without values for `{element}@{name}`"
                    )));
                }
            },
            Some(Token::Word(w)) => AttributeType::Tokenized(w),
            Some(Token::Group(values)) => AttributeType::Enumeration(values),
            _ => {
                return Err(Error::schema_error(format!(
                    "missing type for `{element}@{name}`"
                )));
            }
        };
        let default = match tokens.next() {
            Some(Token::Word(w)) if w == "#REQUIRED" => AttributeDefault::Required,
            Some(Token::Word(w)) if w == "#IMPLIED" => AttributeDefault::Implied,
            Some(Token::Word(w)) if w == "#FIXED" => match tokens.next() {
                Some(Token::Quoted(v)) => AttributeDefault::Fixed(v),
                _ => {
                    return Err(Error::schema_error(format!(
                        "#FIXED without value for `{element}@{name}`"
                    )));
                }
            },
            Some(Token::Quoted(v)) => AttributeDefault::Value(v),
            _ => {
                return Err(Error::schema_error(format!(
                    "missing default for `{element}@{name}`"
                )));
            }
        };
        defs.push(AttributeDef {
            name,
            kind,
            default,
        });
    }
    Ok((element.to_string(), defs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_element_kinds() {
        let dtd = Dtd::parse(indoc! {r#"
            <!-- a comment with <!ELEMENT fake ANY> inside -->
            <!ELEMENT tmx (header, body)>
            <!ELEMENT ude (map+)>
            <!ELEMENT map EMPTY>
            <!ELEMENT note (#PCDATA)>
            <!ELEMENT seg (#PCDATA | bpt | ept)*>
            <!ELEMENT misc ANY>
        "#})
        .unwrap();
        assert_eq!(dtd.element_count(), 6);
        assert!(dtd.element("fake").is_none());
        assert_eq!(dtd.element("map"), Some(&ContentSpec::Empty));
        assert_eq!(dtd.element("note"), Some(&ContentSpec::Mixed(vec![])));
        assert_eq!(
            dtd.element("seg"),
            Some(&ContentSpec::Mixed(vec!["bpt".into(), "ept".into()]))
        );
        assert_eq!(
            dtd.element("tmx"),
            Some(&ContentSpec::Children(Particle::Seq(
                vec![
                    Particle::Name("header".into(), Occurrence::Once),
                    Particle::Name("body".into(), Occurrence::Once),
                ],
                Occurrence::Once
            )))
        );
    }

    #[test]
    fn test_parse_nested_model() {
        let dtd = Dtd::parse("<!ELEMENT tu ((note|prop)*, tuv+)>").unwrap();
        assert_eq!(
            dtd.element("tu"),
            Some(&ContentSpec::Children(Particle::Seq(
                vec![
                    Particle::Choice(
                        vec![
                            Particle::Name("note".into(), Occurrence::Once),
                            Particle::Name("prop".into(), Occurrence::Once),
                        ],
                        Occurrence::ZeroOrMore
                    ),
                    Particle::Name("tuv".into(), Occurrence::OneOrMore),
                ],
                Occurrence::Once
            )))
        );
    }

    #[test]
    fn test_parameter_entities_expand() {
        let dtd = Dtd::parse(indoc! {r##"
            <!ENTITY % segtypes "block|paragraph|sentence|phrase">
            <!ENTITY % req "#REQUIRED">
            <!ELEMENT header EMPTY>
            <!ATTLIST header segtype (%segtypes;) %req;>
        "##})
        .unwrap();
        assert_eq!(
            dtd.attributes("header"),
            &[AttributeDef {
                name: "segtype".into(),
                kind: AttributeType::Enumeration(vec![
                    "block".into(),
                    "paragraph".into(),
                    "sentence".into(),
                    "phrase".into(),
                ]),
                default: AttributeDefault::Required,
            }]
        );
    }

    #[test]
    fn test_parse_attlist_defaults() {
        let dtd = Dtd::parse(indoc! {r#"
            <!ELEMENT tmx ANY>
            <!ATTLIST tmx
                version CDATA #FIXED "1.4"
                id ID #IMPLIED
                kind (a|b) 'a'>
            <!ATTLIST tmx version CDATA #REQUIRED>
        "#})
        .unwrap();
        let attrs = dtd.attributes("tmx");
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].default, AttributeDefault::Fixed("1.4".into()));
        assert_eq!(attrs[1].kind, AttributeType::Tokenized("ID".into()));
        assert_eq!(attrs[2].default, AttributeDefault::Value("a".into()));
    }

    #[test]
    fn test_undefined_parameter_entity() {
        let err = Dtd::parse("<!ATTLIST x a (%nope;) #IMPLIED>").unwrap_err();
        assert!(err.to_string().contains("%nope;"));
    }

    #[test]
    fn test_invalid_models() {
        assert!(Dtd::parse("<!ELEMENT a (b, c | d)>").is_err());
        assert!(Dtd::parse("<!ELEMENT a (b, c>").is_err());
        assert!(Dtd::parse("<!ELEMENT a whatever>").is_err());
        assert!(Dtd::parse("<!ELEMENT a EMPTY").is_err());
    }

    #[test]
    fn test_entities_and_notations_are_ignored() {
        let dtd = Dtd::parse(indoc! {r#"
            <!ENTITY lt "&#38;#60;">
            <!NOTATION gif SYSTEM "image/gif">
            <!ELEMENT a EMPTY>
        "#})
        .unwrap();
        assert_eq!(dtd.element_count(), 1);
    }
}
