//! # Catalog Indexer
//!
//! Streams large catalog item feeds (XML), hands every parsed item to a
//! persistence sink and ships a derived search document per item to an
//! index sink in batches.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────────┐   ┌──────────────┐
//! │ Feed files │──▶│ ItemStream │──▶│ DocumentBuilder │──▶│ DocumentSink │
//! │ (sources)  │   │  (core)    │   │     (core)      │   │  (batches)   │
//! └────────────┘   └─────┬──────┘   └─────────────────┘   └──────────────┘
//!                        ▼
//!                  ┌──────────┐
//!                  │ ItemSink │
//!                  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catidx feeds                          # list discovered feed files
//! catidx parse feeds/parts.xml          # items as JSON lines
//! catidx index --output docs.jsonl      # build and write index documents
//! catidx index feeds/parts.xml --dry-run
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`sources`] | Feed file discovery |
//! | [`sink`] | Item and document sink traits plus implementations |
//! | [`ingest`] | Pipeline orchestration |
//! | [`progress`] | Progress reporting on stderr |
//! | [`logging`] | Tracing subscriber set-up |

pub mod config;
pub mod ingest;
pub mod logging;
pub mod progress;
pub mod sink;
pub mod sources;
