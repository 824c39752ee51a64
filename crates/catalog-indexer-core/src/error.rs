//! Structural parse errors.
//!
//! Every variant is terminal: the item stream that produced it is fused and
//! yields nothing further. Missing data, unknown tags and blank part numbers
//! are not errors and never reach this type.

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying XML is malformed: bad syntax, mismatched end tag,
    /// I/O failure while pulling the next event.
    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed attribute near byte {position}: {source}")]
    Attribute {
        position: u64,
        #[source]
        source: AttrError,
    },

    #[error("invalid UTF-8 in character data near byte {position}")]
    Encoding { position: u64 },

    /// The stream ended while `<open>` was still open.
    #[error("unexpected end of stream near byte {position} inside <{open}>")]
    UnexpectedEof { position: u64, open: String },
}

impl ParseError {
    /// Approximate byte offset into the source stream.
    pub fn position(&self) -> u64 {
        match self {
            ParseError::Xml { position, .. }
            | ParseError::Attribute { position, .. }
            | ParseError::Encoding { position }
            | ParseError::UnexpectedEof { position, .. } => *position,
        }
    }
}
