//! Downstream collaborators of the ingest pipeline.
//!
//! Parsed items and built documents leave the pipeline through two traits:
//!
//! - [`ItemSink`] receives every parsed [`Item`] in document order. It stands
//!   in for the catalog store, which is keyed by part number and decides on
//!   its own what to do with items the index rejects.
//! - [`DocumentSink`] receives batches of [`IndexDocument`]s and a final
//!   commit. It stands in for the search index client.
//!
//! The JSON implementations write one record per line so their output can be
//! replayed against a real store or index with ordinary line tools.
//!
//! ```text
//! ItemStream ──▶ ItemSink::accept ──▶ ... ──▶ ItemSink::finish
//!      │
//!      └──▶ DocumentBuilder ──▶ DocumentSink::submit (batch) ──▶ DocumentSink::commit
//! ```

use anyhow::{Context, Result};
use catalog_indexer_core::{IndexDocument, Item};
use std::io::Write;

/// Persistence collaborator: takes items one at a time, in document order.
pub trait ItemSink {
    fn accept(&mut self, item: &Item) -> Result<()>;

    /// Called once after the last item of a run.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Search index collaborator: takes document batches, then one commit.
pub trait DocumentSink {
    fn submit(&mut self, batch: &[IndexDocument]) -> Result<()>;

    /// Make everything submitted so far visible.
    fn commit(&mut self) -> Result<()>;
}

/// Discards items.
#[derive(Debug, Default)]
pub struct NullItemSink;

impl ItemSink for NullItemSink {
    fn accept(&mut self, _item: &Item) -> Result<()> {
        Ok(())
    }
}

/// Writes each item as one JSON object per line.
pub struct JsonLinesItemSink<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> JsonLinesItemSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ItemSink for JsonLinesItemSink<W> {
    fn accept(&mut self, item: &Item) -> Result<()> {
        serde_json::to_writer(&mut self.out, item)
            .with_context(|| format!("Failed to write item {}", item.part_number))?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush item output")
    }
}

/// Keeps every item in memory.
#[derive(Debug, Default)]
pub struct MemoryItemSink {
    pub items: Vec<Item>,
    pub finished: bool,
}

impl ItemSink for MemoryItemSink {
    fn accept(&mut self, item: &Item) -> Result<()> {
        self.items.push(item.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes each submitted batch as one JSON array per line, in the index's
/// nested update format, and `{"commit":{}}` on commit.
pub struct JsonDocumentSink<W: Write> {
    out: W,
}

impl<W: Write> JsonDocumentSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DocumentSink for JsonDocumentSink<W> {
    fn submit(&mut self, batch: &[IndexDocument]) -> Result<()> {
        serde_json::to_writer(&mut self.out, batch).context("Failed to write document batch")?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        serde_json::to_writer(&mut self.out, &serde_json::json!({ "commit": {} }))?;
        self.out.write_all(b"\n")?;
        self.out.flush().context("Failed to flush document output")
    }
}

/// Keeps submitted batches in memory and counts commits.
#[derive(Debug, Default)]
pub struct MemoryDocumentSink {
    pub batches: Vec<Vec<IndexDocument>>,
    pub commits: usize,
}

impl MemoryDocumentSink {
    pub fn documents(&self) -> impl Iterator<Item = &IndexDocument> {
        self.batches.iter().flatten()
    }
}

impl DocumentSink for MemoryDocumentSink {
    fn submit(&mut self, batch: &[IndexDocument]) -> Result<()> {
        self.batches.push(batch.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_indexer_core::{parse_items, DocumentBuilder};

    fn sample_items() -> Vec<Item> {
        parse_items(
            r#"<Items>
                <Item><PartNumber>A-1</PartNumber><BrandLabel>Acme</BrandLabel></Item>
                <Item><PartNumber>B-2</PartNumber>
                    <Prices><Pricing PriceType="LST"><Price>5.00</Price></Pricing></Prices>
                </Item>
            </Items>"#,
        )
        .unwrap()
    }

    #[test]
    fn json_lines_item_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesItemSink::new(Vec::new());
        for item in sample_items() {
            sink.accept(&item).unwrap();
        }
        sink.finish().unwrap();
        assert_eq!(sink.written(), 2);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["partNumber"], "A-1");
        assert_eq!(first["brandLabel"], "Acme");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["prices"][0]["priceType"], "LST");
    }

    #[test]
    fn json_document_sink_writes_batches_then_commit() {
        let builder = DocumentBuilder::new();
        let docs: Vec<_> = sample_items()
            .iter()
            .filter_map(|item| builder.build(item))
            .collect();

        let mut sink = JsonDocumentSink::new(Vec::new());
        sink.submit(&docs[..1]).unwrap();
        sink.submit(&docs[1..]).unwrap();
        sink.commit().unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        let batch: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(batch[0]["productId"], "B-2");
        assert_eq!(batch[0]["_childDocuments_"][0]["type"], "price - B-2");
        assert_eq!(lines[2], r#"{"commit":{}}"#);
    }

    #[test]
    fn memory_sinks_record_everything() {
        let mut items = MemoryItemSink::default();
        let mut docs = MemoryDocumentSink::default();
        let builder = DocumentBuilder::new();
        let mut batch = Vec::new();
        for item in sample_items() {
            items.accept(&item).unwrap();
            batch.extend(builder.build(&item));
        }
        items.finish().unwrap();
        docs.submit(&batch).unwrap();
        docs.commit().unwrap();

        assert!(items.finished);
        assert_eq!(items.items.len(), 2);
        assert_eq!(docs.documents().count(), 2);
        assert_eq!(docs.commits, 1);
    }
}
