//! Checks an XML document against a [`Dtd`].

use std::{
    collections::BTreeSet,
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, Cursor},
    path::Path,
};

use quick_xml::{Reader, events::BytesStart, events::Event};
use serde::Serialize;

use super::dtd::{AttributeDefault, AttributeType, ContentSpec, Dtd, Occurrence, Particle};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    UndeclaredElement,
    InvalidContent,
    MissingAttribute,
    UndeclaredAttribute,
    InvalidAttributeValue,
}

/// One schema violation found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Slash-separated element path, e.g. `/tmx/body/tu`.
    pub path: String,
    /// Byte offset in the input where the offending element ended or started.
    pub offset: u64,
    pub message: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (byte {}): {}", self.path, self.offset, self.message)
    }
}

struct Frame {
    name: String,
    path: String,
    children: Vec<String>,
    has_text: bool,
}

impl Dtd {
    /// Validate a document read from `reader`. An empty result means valid.
    pub fn validate_reader<R: BufRead>(&self, reader: R) -> Result<Vec<Violation>, Error> {
        let mut xml_reader = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut violations = Vec::new();

        loop {
            let offset = xml_reader.buffer_position();
            match xml_reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let frame = self.open(e, &mut stack, offset, &mut violations)?;
                    stack.push(frame);
                }
                Event::Empty(ref e) => {
                    let frame = self.open(e, &mut stack, offset, &mut violations)?;
                    self.close(frame, offset, &mut violations);
                }
                Event::End(_) => {
                    if let Some(frame) = stack.pop() {
                        self.close(frame, xml_reader.buffer_position(), &mut violations);
                    }
                }
                Event::Text(ref e) => {
                    if let Some(frame) = stack.last_mut() {
                        if !e.unescape()?.trim().is_empty() {
                            frame.has_text = true;
                        }
                    }
                }
                Event::CData(_) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.has_text = true;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(violations)
    }

    pub fn validate_str(&self, xml: &str) -> Result<Vec<Violation>, Error> {
        self.validate_reader(Cursor::new(xml))
    }

    pub fn validate_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Violation>, Error> {
        let file = File::open(path)?;
        self.validate_reader(BufReader::new(file))
    }

    fn open(
        &self,
        e: &BytesStart,
        stack: &mut [Frame],
        offset: u64,
        violations: &mut Vec<Violation>,
    ) -> Result<Frame, Error> {
        let name = String::from_utf8(e.name().as_ref().to_vec())?;
        let path = match stack.last_mut() {
            Some(parent) => {
                parent.children.push(name.clone());
                format!("{}/{}", parent.path, name)
            }
            None => format!("/{name}"),
        };

        if self.element(&name).is_none() {
            violations.push(Violation {
                kind: ViolationKind::UndeclaredElement,
                path: path.clone(),
                offset,
                message: format!("element `{name}` is not declared"),
            });
        } else {
            self.check_attributes(e, &name, &path, offset, violations)?;
        }

        Ok(Frame {
            name,
            path,
            children: Vec::new(),
            has_text: false,
        })
    }

    fn check_attributes(
        &self,
        e: &BytesStart,
        name: &str,
        path: &str,
        offset: u64,
        violations: &mut Vec<Violation>,
    ) -> Result<(), Error> {
        let defs = self.attributes(name);
        let mut present = Vec::new();

        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.as_ref().to_vec())?;
            let value = attr.unescape_value()?.into_owned();
            let mut violation = |kind, message| {
                violations.push(Violation {
                    kind,
                    path: path.to_string(),
                    offset,
                    message,
                })
            };

            match defs.iter().find(|d| d.name == key) {
                None => violation(
                    ViolationKind::UndeclaredAttribute,
                    format!("attribute `{key}` is not declared for `{name}`"),
                ),
                Some(def) => {
                    if let AttributeType::Enumeration(allowed) | AttributeType::Notation(allowed) =
                        &def.kind
                    {
                        if !allowed.contains(&value) {
                            violation(
                                ViolationKind::InvalidAttributeValue,
                                format!(
                                    "`{key}` is `{value}`, expected one of {}",
                                    allowed.join("|")
                                ),
                            );
                        }
                    }
                    if let AttributeDefault::Fixed(fixed) = &def.default {
                        if *fixed != value {
                            violation(
                                ViolationKind::InvalidAttributeValue,
                                format!("`{key}` is `{value}`, fixed value is `{fixed}`"),
                            );
                        }
                    }
                }
            }
            present.push(key);
        }

        for def in defs {
            if def.default == AttributeDefault::Required && !present.contains(&def.name) {
                violations.push(Violation {
                    kind: ViolationKind::MissingAttribute,
                    path: path.to_string(),
                    offset,
                    message: format!("required attribute `{}` is missing", def.name),
                });
            }
        }
        Ok(())
    }

    fn close(&self, frame: Frame, offset: u64, violations: &mut Vec<Violation>) {
        let Some(spec) = self.element(&frame.name) else {
            return;
        };
        let message = match spec {
            ContentSpec::Any => None,
            ContentSpec::Empty => (frame.has_text || !frame.children.is_empty())
                .then(|| format!("`{}` must be empty", frame.name)),
            ContentSpec::Mixed(allowed) => frame
                .children
                .iter()
                .find(|c| !allowed.contains(c))
                .map(|c| format!("`{c}` is not allowed in `{}`", frame.name)),
            ContentSpec::Children(model) => {
                if frame.has_text {
                    Some(format!("`{}` does not allow character data", frame.name))
                } else if !matches_model(model, &frame.children) {
                    Some(format!(
                        "children ({}) do not match the content model of `{}`",
                        frame.children.join(", "),
                        frame.name
                    ))
                } else {
                    None
                }
            }
        };
        if let Some(message) = message {
            violations.push(Violation {
                kind: ViolationKind::InvalidContent,
                path: frame.path,
                offset,
                message,
            });
        }
    }
}

fn matches_model(model: &Particle, children: &[String]) -> bool {
    ends(model, children, 0).contains(&children.len())
}

/// Every position the particle can stop at when it starts matching at `start`.
fn ends(particle: &Particle, children: &[String], start: usize) -> BTreeSet<usize> {
    let occurrence = match particle {
        Particle::Name(_, o) | Particle::Seq(_, o) | Particle::Choice(_, o) => *o,
    };
    let once = |from: usize| ends_once(particle, children, from);
    match occurrence {
        Occurrence::Once => once(start),
        Occurrence::Optional => {
            let mut out = once(start);
            out.insert(start);
            out
        }
        Occurrence::ZeroOrMore => repeat(once, BTreeSet::from([start])),
        Occurrence::OneOrMore => repeat(once, ends_once(particle, children, start)),
    }
}

/// Close `seed` under repeated application of `step`.
fn repeat(step: impl Fn(usize) -> BTreeSet<usize>, seed: BTreeSet<usize>) -> BTreeSet<usize> {
    let mut reached = seed.clone();
    let mut frontier: Vec<usize> = seed.into_iter().collect();
    while let Some(pos) = frontier.pop() {
        for next in step(pos) {
            if reached.insert(next) {
                frontier.push(next);
            }
        }
    }
    reached
}

fn ends_once(particle: &Particle, children: &[String], start: usize) -> BTreeSet<usize> {
    match particle {
        Particle::Name(name, _) => match children.get(start) {
            Some(child) if child == name => BTreeSet::from([start + 1]),
            _ => BTreeSet::new(),
        },
        Particle::Seq(items, _) => items.iter().fold(BTreeSet::from([start]), |acc, item| {
            acc.into_iter()
                .flat_map(|pos| ends(item, children, pos))
                .collect()
        }),
        Particle::Choice(items, _) => items
            .iter()
            .flat_map(|item| ends(item, children, start))
            .collect(),
    }
}
