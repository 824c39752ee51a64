//! Owned XML event source over [`quick_xml::Reader`].
//!
//! quick-xml hands out events that borrow its read buffer, which makes it
//! awkward to dispatch on a tag and then keep reading. [`EventSource`] turns
//! each event into an owned [`XmlEvent`] and drops the event kinds the feed
//! parser never looks at (comments, declarations, processing instructions,
//! doctypes). CDATA sections arrive as ordinary text chunks.
//!
//! Only one buffer is allocated per source and it is reused for every event,
//! so memory use does not grow with the size of the document.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::error::ParseError;

const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// One owned XML event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Open(OpenTag),
    /// Local name of the element being closed.
    Close(String),
    /// Unescaped, untrimmed character data.
    Text(String),
    Eof,
}

/// A start tag with its attributes copied out of the read buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    qname: Vec<u8>,
    local: String,
    attributes: Vec<(String, String)>,
}

impl OpenTag {
    fn from_start(start: &BytesStart<'_>, position: u64) -> Result<Self, ParseError> {
        let local = std::str::from_utf8(start.local_name().as_ref())
            .map_err(|_| ParseError::Encoding { position })?
            .to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|source| ParseError::Attribute { position, source })?;
            let key = std::str::from_utf8(attr.key.local_name().as_ref())
                .map_err(|_| ParseError::Encoding { position })?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|source| ParseError::Xml { position, source })?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            qname: start.name().as_ref().to_vec(),
            local,
            attributes,
        })
    }

    /// Local (namespace-stripped) element name.
    pub fn name(&self) -> &str {
        &self.local
    }

    /// Attribute value by local name; empty when the attribute is absent.
    pub fn attribute(&self, name: &str) -> &str {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }
}

/// Pull-based event source. Advances exactly one XML event per call.
pub struct EventSource<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> EventSource<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        let config = reader.config_mut();
        // `<Tag/>` arrives as a start plus an end event.
        config.expand_empty_elements = true;
        config.check_end_names = true;
        Self {
            reader,
            buf: Vec::with_capacity(READ_BUFFER_CAPACITY),
        }
    }

    /// Byte offset of the reader in the source stream.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Pull the next event the feed parser cares about.
    pub fn next_event(&mut self) -> Result<XmlEvent, ParseError> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position() as u64;
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|source| ParseError::Xml { position, source })?;

            match event {
                Event::Start(start) => {
                    return Ok(XmlEvent::Open(OpenTag::from_start(&start, position)?));
                }
                Event::End(end) => {
                    let name = std::str::from_utf8(end.local_name().as_ref())
                        .map_err(|_| ParseError::Encoding { position })?
                        .to_string();
                    return Ok(XmlEvent::Close(name));
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|source| ParseError::Xml { position, source })?;
                    return Ok(XmlEvent::Text(text.into_owned()));
                }
                Event::CData(data) => {
                    let text = std::str::from_utf8(&data)
                        .map_err(|_| ParseError::Encoding { position })?;
                    return Ok(XmlEvent::Text(text.to_string()));
                }
                Event::Eof => return Ok(XmlEvent::Eof),
                _ => {}
            }
        }
    }

    /// Discard everything up to and including the close of `tag`.
    pub fn skip(&mut self, tag: &OpenTag) -> Result<(), ParseError> {
        self.buf.clear();
        let position = self.reader.buffer_position() as u64;
        self.reader
            .read_to_end_into(QName(&tag.qname), &mut self.buf)
            .map_err(|source| ParseError::Xml { position, source })?;
        Ok(())
    }

    /// Read the character data of a leaf element up to its close tag.
    ///
    /// Text may arrive in several chunks (split by comments or CDATA
    /// sections). Each chunk is trimmed, empty chunks are dropped, and the
    /// rest are joined with a single space. Nested elements are skipped.
    pub fn read_leaf_text(&mut self, tag: &OpenTag) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                XmlEvent::Text(chunk) => push_chunk(&mut text, &chunk),
                XmlEvent::Open(nested) => self.skip(&nested)?,
                // End names are checked by quick-xml, so this is our close.
                XmlEvent::Close(_) => break,
                XmlEvent::Eof => {
                    return Err(ParseError::UnexpectedEof {
                        position: self.position(),
                        open: tag.name().to_string(),
                    })
                }
            }
        }
        Ok(text.trim().to_string())
    }
}

fn push_chunk(text: &mut String, chunk: &str) {
    let chunk = chunk.trim();
    if chunk.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(chunk);
}
