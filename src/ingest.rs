//! Ingestion pipeline orchestration.
//!
//! Coordinates the full index flow: feed file → [`ItemStream`] → item sink,
//! and item → [`DocumentBuilder`] → batched document sink. Items are pulled
//! one at a time, so memory stays bounded by the largest item plus one
//! document batch regardless of feed size.
//!
//! A feed is committed to the document sink only after it has parsed to the
//! end. A structural error aborts the run before that commit, so a broken
//! feed never becomes visible in the index.

use anyhow::{Context, Result};
use catalog_indexer_core::{DocumentBuilder, IndexDocument, ItemStream};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::Config;
use crate::progress::{IngestProgressEvent, IngestProgressReporter, PROGRESS_INTERVAL};
use crate::sink::{DocumentSink, ItemSink};

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Parse and build, but hand nothing to the sinks.
    pub dry_run: bool,
    /// Stop after this many items across the whole run.
    pub limit: Option<u64>,
}

/// Counters for one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub feeds: Vec<String>,
    pub items: u64,
    pub documents: u64,
    /// Items without a part number; parsed but not indexed.
    pub skipped: u64,
    pub children: u64,
    pub batches: u64,
    pub commits: u64,
}

impl IngestSummary {
    /// Print the summary block.
    pub fn write_to(&self, out: &mut dyn Write, index: &str, dry_run: bool) -> std::io::Result<()> {
        if dry_run {
            writeln!(out, "index {} (dry-run)", index)?;
        } else {
            writeln!(out, "index {}", index)?;
        }
        for feed in &self.feeds {
            writeln!(out, "  feed: {}", feed)?;
        }
        writeln!(out, "  items parsed: {}", self.items)?;
        writeln!(out, "  documents built: {}", self.documents)?;
        writeln!(out, "  items skipped: {}", self.skipped)?;
        writeln!(out, "  child documents: {}", self.children)?;
        if !dry_run {
            writeln!(out, "  batches submitted: {}", self.batches)?;
        }
        writeln!(out, "ok")
    }
}

/// One ingest run over any number of feeds.
pub struct Ingest<'a> {
    builder: DocumentBuilder,
    batch_size: usize,
    options: IngestOptions,
    item_sink: &'a mut dyn ItemSink,
    doc_sink: &'a mut dyn DocumentSink,
    progress: &'a dyn IngestProgressReporter,
    summary: IngestSummary,
}

impl<'a> Ingest<'a> {
    pub fn new(
        config: &Config,
        options: IngestOptions,
        item_sink: &'a mut dyn ItemSink,
        doc_sink: &'a mut dyn DocumentSink,
        progress: &'a dyn IngestProgressReporter,
    ) -> Self {
        Self {
            builder: DocumentBuilder::new(),
            batch_size: config.index.batch_size.max(1),
            options,
            item_sink,
            doc_sink,
            progress,
            summary: IngestSummary::default(),
        }
    }

    fn limit_reached(&self) -> bool {
        self.options
            .limit
            .is_some_and(|limit| self.summary.items >= limit)
    }

    /// Stream one feed through the pipeline.
    pub fn feed<R: BufRead>(&mut self, name: &str, reader: R) -> Result<()> {
        info!(feed = name, "ingesting feed");
        let mut stream = ItemStream::new(reader);
        let mut batch: Vec<IndexDocument> = Vec::with_capacity(self.batch_size);
        let mut parsed = 0u64;

        while !self.limit_reached() {
            let item = match stream.next() {
                Some(result) => result.with_context(|| {
                    format!("Malformed feed {} after {} items", name, parsed)
                })?,
                None => break,
            };
            parsed += 1;
            self.summary.items += 1;
            if parsed % PROGRESS_INTERVAL == 0 {
                self.progress.report(IngestProgressEvent::Parsing {
                    feed: name.to_string(),
                    items: parsed,
                });
            }

            if !self.options.dry_run {
                self.item_sink.accept(&item)?;
            }

            match self.builder.build(&item) {
                Some(doc) => {
                    self.summary.documents += 1;
                    self.summary.children += doc.child_count() as u64;
                    batch.push(doc);
                }
                None => self.summary.skipped += 1,
            }

            if batch.len() >= self.batch_size {
                self.flush(&mut batch)?;
            }
        }
        self.flush(&mut batch)?;

        if !self.options.dry_run {
            self.doc_sink.commit()?;
            self.summary.commits += 1;
        }
        debug!(feed = name, items = parsed, "feed done");
        self.summary.feeds.push(name.to_string());
        Ok(())
    }

    fn flush(&mut self, batch: &mut Vec<IndexDocument>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if !self.options.dry_run {
            self.doc_sink.submit(batch)?;
            self.summary.batches += 1;
        }
        batch.clear();
        Ok(())
    }

    pub fn finish(self) -> Result<IngestSummary> {
        if !self.options.dry_run {
            self.item_sink.finish()?;
        }
        Ok(self.summary)
    }
}

/// Run the pipeline over `feeds` in order.
pub fn run_ingest(
    config: &Config,
    feeds: &[PathBuf],
    options: IngestOptions,
    item_sink: &mut dyn ItemSink,
    doc_sink: &mut dyn DocumentSink,
    progress: &dyn IngestProgressReporter,
) -> Result<IngestSummary> {
    let mut ingest = Ingest::new(config, options, item_sink, doc_sink, progress);
    for path in feeds {
        if ingest.limit_reached() {
            break;
        }
        let file = File::open(path)
            .with_context(|| format!("Failed to open feed: {}", path.display()))?;
        ingest.feed(&path.display().to_string(), BufReader::new(file))?;
    }
    ingest.finish()
}
