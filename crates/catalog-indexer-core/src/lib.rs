//! # Catalog Indexer Core
//!
//! Parse and document-shaping logic for catalog item feeds: the typed item
//! model, a streaming XML parser that yields one item at a time, and the
//! transform from items to search-index documents.
//!
//! This crate does no filesystem, terminal or network I/O of its own. It
//! reads from any [`std::io::BufRead`] handed to it and returns plain values.

pub mod document;
pub mod error;
pub mod model;
pub mod parser;
pub mod reader;

pub use document::{ChildDocument, DocumentBuilder, DocumentFields, IndexDocument};
pub use error::ParseError;
pub use model::{Item, Scalar, SubGroup};
pub use parser::{parse_items, ItemStream};
