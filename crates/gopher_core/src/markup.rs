//! Markup events consumed by the walker, and an XML source producing them.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// A name/value attribute on an opening element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One event in a markup stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    Open {
        name: String,
        attributes: Vec<Attribute>,
    },
    Close {
        name: String,
    },
    Text(String),
    /// Comments, processing instructions, declarations and doctypes.
    Ignorable,
}

impl MarkupEvent {
    pub fn open(name: impl Into<String>) -> Self {
        MarkupEvent::Open {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn open_with(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        MarkupEvent::Open {
            name: name.into(),
            attributes,
        }
    }

    pub fn close(name: impl Into<String>) -> Self {
        MarkupEvent::Close { name: name.into() }
    }

    pub fn text(content: impl Into<String>) -> Self {
        MarkupEvent::Text(content.into())
    }
}

/// A malformed-markup error from the decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at byte {position})")]
pub struct DecodeError {
    pub position: u64,
    pub message: String,
}

/// Whether `s` consists only of whitespace characters.
pub fn is_whitespace(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Lazily decodes XML into [`MarkupEvent`]s.
///
/// Self-closing elements are reported as an open immediately followed by a
/// close. The iterator ends after the first decode error.
pub struct MarkupReader<'a> {
    reader: Reader<&'a [u8]>,
    finished: bool,
}

impl<'a> MarkupReader<'a> {
    pub fn new(xml: &'a str) -> Self {
        Self::from_bytes(xml.as_bytes())
    }

    pub fn from_bytes(xml: &'a [u8]) -> Self {
        let mut reader = Reader::from_reader(xml);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = true;
        config.check_end_names = true;
        Self {
            reader,
            finished: false,
        }
    }

    /// Byte offset reached in the input.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    fn next_event(&mut self) -> Result<Option<MarkupEvent>, DecodeError> {
        let event = match self.reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(DecodeError {
                    position: self.reader.error_position(),
                    message: e.to_string(),
                })
            }
        };

        let markup = match event {
            Event::Start(start) => self.open_event(&start)?,
            Event::Empty(start) => self.open_event(&start)?,
            Event::End(end) => MarkupEvent::Close {
                name: utf8(end.local_name().as_ref()).into_owned(),
            },
            Event::Text(text) => {
                let content = text.unescape().map_err(|e| self.decode_error(e))?;
                MarkupEvent::Text(content.into_owned())
            }
            Event::CData(data) => MarkupEvent::Text(utf8(&data.into_inner()).into_owned()),
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                MarkupEvent::Ignorable
            }
            Event::Eof => return Ok(None),
        };

        Ok(Some(markup))
    }

    fn open_event(&self, start: &BytesStart<'_>) -> Result<MarkupEvent, DecodeError> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.decode_error(e))?;
            let value = attr.unescape_value().map_err(|e| self.decode_error(e))?;
            attributes.push(Attribute::new(
                utf8(attr.key.local_name().as_ref()),
                value,
            ));
        }

        Ok(MarkupEvent::Open {
            name: utf8(start.local_name().as_ref()).into_owned(),
            attributes,
        })
    }

    fn decode_error(&self, error: impl std::fmt::Display) -> DecodeError {
        DecodeError {
            position: self.reader.buffer_position(),
            message: error.to_string(),
        }
    }
}

impl Iterator for MarkupReader<'_> {
    type Item = Result<MarkupEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn utf8(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str) -> Vec<Result<MarkupEvent, DecodeError>> {
        MarkupReader::new(xml).collect()
    }

    #[test]
    fn test_is_whitespace() {
        let cases = [
            (" ", true),
            ("abc", false),
            ("   abc", false),
            ("\n\t\u{b}\u{c}\r ", true),
            ("\n\t\u{b}\u{c}\r abc", false),
            ("abc \n\t\u{b}\u{c}\r 123", false),
            ("a b c 1 2 3", false),
        ];
        for (input, want) in cases {
            assert_eq!(is_whitespace(input), want, "input {:?}", input);
        }
    }

    #[test]
    fn test_reads_elements_attributes_and_text() {
        let events = events(
            r#"<?xml version="1.0"?><Patients><Patient ID="7">Ann &amp; Bo</Patient></Patients>"#,
        );
        let events: Vec<_> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            events,
            vec![
                MarkupEvent::Ignorable,
                MarkupEvent::open("Patients"),
                MarkupEvent::open_with("Patient", vec![Attribute::new("ID", "7")]),
                MarkupEvent::text("Ann & Bo"),
                MarkupEvent::close("Patient"),
                MarkupEvent::close("Patients"),
            ]
        );
    }

    #[test]
    fn test_self_closing_expands() {
        let events: Vec<_> = events("<A><B/></A>").into_iter().map(Result::unwrap).collect();
        assert_eq!(
            events,
            vec![
                MarkupEvent::open("A"),
                MarkupEvent::open("B"),
                MarkupEvent::close("B"),
                MarkupEvent::close("A"),
            ]
        );
    }

    #[test]
    fn test_cdata_is_text() {
        let events: Vec<_> = events("<A><![CDATA[x < y]]></A>")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(events[1], MarkupEvent::text("x < y"));
    }

    #[test]
    fn test_stops_after_error() {
        let events = events("<A><B></A><C/>");
        assert!(events.last().unwrap().is_err());
        assert_eq!(events.iter().filter(|e| e.is_err()).count(), 1);
    }
}
