//! # Catalog Indexer CLI (`catidx`)
//!
//! The `catidx` binary streams catalog item feeds and turns them into search
//! index documents.
//!
//! ## Usage
//!
//! ```bash
//! catidx --config ./config/catidx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catidx parse <file>` | Print parsed items as JSON lines |
//! | `catidx index [files...]` | Build index documents and write them in batches |
//! | `catidx feeds` | List feed files found under `[feed].root` |
//! | `catidx completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect what the parser sees in a feed
//! catidx parse feeds/parts.xml --limit 5
//!
//! # Index every discovered feed into a file
//! catidx index --output out/documents.jsonl
//!
//! # Count items and documents without writing anything
//! catidx index feeds/parts.xml --dry-run
//! ```

use anyhow::{Context, Result};
use catalog_indexer::config::{self, Config};
use catalog_indexer::ingest::{self, IngestOptions};
use catalog_indexer::logging;
use catalog_indexer::progress::{IngestProgressEvent, ProgressMode};
use catalog_indexer::sink::{
    DocumentSink, ItemSink, JsonDocumentSink, JsonLinesItemSink, NullItemSink,
};
use catalog_indexer::sources;
use catalog_indexer_core::ItemStream;
use clap::{CommandFactory, Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Catalog Indexer CLI: streaming catalog feed parser and search index
/// document builder.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/catidx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "catidx",
    about = "Catalog Indexer: stream catalog item feeds into search index documents",
    version,
    long_about = "Catalog Indexer parses large XML catalog item feeds one item at a time, \
    hands every item to a persistence sink, and builds one search index document per item \
    (flattened text fields plus child documents) which it writes out in batches."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/catidx.toml`. Feed discovery, index batching
    /// and logging settings are read from this file.
    #[arg(long, global = true, default_value = "./config/catidx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Parse a feed and print every item as one JSON object per line.
    ///
    /// Items without a part number are printed too; only the index side
    /// drops them. A malformed feed stops with an error after the items
    /// that were already printed.
    Parse {
        /// Feed file to parse.
        file: PathBuf,

        /// Stop after this many items.
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Build index documents for one or more feeds.
    ///
    /// Documents are written in batches of `[index].batch_size` as one JSON
    /// array per line, followed by a commit marker once a feed has parsed
    /// completely. Without file arguments, every feed under `[feed].root`
    /// is indexed.
    Index {
        /// Feed files. Defaults to the discovered feeds.
        files: Vec<PathBuf>,

        /// Parse and build documents, but write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of items to process across all feeds.
        #[arg(long)]
        limit: Option<u64>,

        /// Document output file. Overrides `[index].output`; stdout when neither is set.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write every parsed item as JSON lines to this file.
        #[arg(long)]
        items: Option<PathBuf>,

        /// Progress on stderr. Defaults to `human` on a terminal, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List feed files under `[feed].root`.
    ///
    /// Applies the configured include and exclude globs and prints each
    /// match with its size.
    Feeds,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "catidx", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = match &cli.command {
        Commands::Parse { .. } => config::load_config_or_default(&cli.config)?,
        Commands::Index { files, .. } if !files.is_empty() => {
            config::load_config_or_default(&cli.config)?
        }
        _ => config::load_config(&cli.config)?,
    };
    logging::init(&cfg.logging.level)?;

    match cli.command {
        Commands::Parse { file, limit } => {
            run_parse(&file, limit)?;
        }
        Commands::Index {
            files,
            dry_run,
            limit,
            output,
            items,
            progress,
        } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let options = IngestOptions { dry_run, limit };
            run_index(&cfg, files, options, output, items, progress)?;
        }
        Commands::Feeds => {
            sources::list_feeds(&cfg)?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
        }
    }

    Ok(())
}

fn run_parse(file: &Path, limit: Option<u64>) -> Result<()> {
    let reader = File::open(file)
        .map(BufReader::new)
        .with_context(|| format!("Failed to open feed: {}", file.display()))?;

    let stdout = std::io::stdout();
    let mut sink = JsonLinesItemSink::new(BufWriter::new(stdout.lock()));
    let mut stream = ItemStream::new(reader);
    loop {
        if limit.is_some_and(|limit| sink.written() >= limit) {
            break;
        }
        let Some(result) = stream.next() else {
            break;
        };
        let item = result.with_context(|| {
            format!("Malformed feed {} after {} items", file.display(), sink.written())
        })?;
        sink.accept(&item)?;
    }
    sink.finish()
}

fn run_index(
    cfg: &Config,
    files: Vec<PathBuf>,
    options: IngestOptions,
    output: Option<PathBuf>,
    items: Option<PathBuf>,
    progress: ProgressMode,
) -> Result<()> {
    let reporter = progress.reporter();

    let feeds = if files.is_empty() {
        reporter.report(IngestProgressEvent::Discovering {
            root: cfg.feed.root.display().to_string(),
        });
        sources::discover_feeds(&cfg.feed)?
            .into_iter()
            .map(|feed| feed.path)
            .collect()
    } else {
        files
    };

    let output = output.or_else(|| cfg.index.output.clone());
    let to_stdout = output.is_none();
    let mut doc_sink: Box<dyn DocumentSink> = match &output {
        Some(path) if !options.dry_run => Box::new(JsonDocumentSink::new(create_output(path)?)),
        _ => Box::new(JsonDocumentSink::new(BufWriter::new(std::io::stdout()))),
    };
    let mut item_sink: Box<dyn ItemSink> = match &items {
        Some(path) if !options.dry_run => Box::new(JsonLinesItemSink::new(create_output(path)?)),
        _ => Box::new(NullItemSink),
    };

    let summary = ingest::run_ingest(
        cfg,
        &feeds,
        options,
        item_sink.as_mut(),
        doc_sink.as_mut(),
        reporter.as_ref(),
    )?;

    // Keep stdout for documents when they are written there.
    if to_stdout && !options.dry_run {
        summary.write_to(&mut std::io::stderr().lock(), &cfg.index.name, options.dry_run)?;
    } else {
        summary.write_to(&mut std::io::stdout().lock(), &cfg.index.name, options.dry_run)?;
    }
    Ok(())
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}
