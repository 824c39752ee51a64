//! Ingest progress reporting.
//!
//! Reports observable progress during `catidx index` so users see which feed
//! is being parsed and how many items have been read so far. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// Items between two `Parsing` events.
pub const PROGRESS_INTERVAL: u64 = 1_000;

/// A single progress event for an ingest run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IngestProgressEvent {
    /// Walking the feed root for matching files.
    Discovering { root: String },
    /// Streaming items out of one feed file.
    Parsing { feed: String, items: u64 },
}

/// Reports ingest progress. Implementations write to stderr (human or JSON).
pub trait IngestProgressReporter: Send + Sync {
    fn report(&self, event: IngestProgressEvent);
}

/// Human-friendly progress on stderr: "index feeds/a.xml  parsing  12,000 items".
pub struct StderrProgress;

impl IngestProgressReporter for StderrProgress {
    fn report(&self, event: IngestProgressEvent) {
        let line = match &event {
            IngestProgressEvent::Discovering { root } => {
                format!("index {}  discovering...\n", root)
            }
            IngestProgressEvent::Parsing { feed, items } => {
                format!("index {}  parsing  {} items\n", feed, format_number(*items))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &IngestProgressEvent) -> serde_json::Value {
        match event {
            IngestProgressEvent::Discovering { root } => serde_json::json!({
                "event": "progress",
                "root": root,
                "phase": "discovering"
            }),
            IngestProgressEvent::Parsing { feed, items } => serde_json::json!({
                "event": "progress",
                "feed": feed,
                "phase": "parsing",
                "items": items
            }),
        }
    }
}

impl IngestProgressReporter for JsonProgress {
    fn report(&self, event: IngestProgressEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IngestProgressReporter for NoProgress {
    fn report(&self, _event: IngestProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IngestProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn json_event_shape() {
        let value = JsonProgress::to_json(&IngestProgressEvent::Parsing {
            feed: "a.xml".to_string(),
            items: 2000,
        });
        assert_eq!(value["phase"], "parsing");
        assert_eq!(value["feed"], "a.xml");
        assert_eq!(value["items"], 2000);
    }
}
