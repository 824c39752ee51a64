//! Feed discovery.
//!
//! Walks `feed.root` and returns every file matching the include globs and
//! none of the exclude globs, in sorted order. Globs match the path relative
//! to the root.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::config::{Config, FeedConfig};

/// One feed file found under the configured root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFile {
    pub path: PathBuf,
    /// Path relative to the feed root, `/`-separated.
    pub relative: String,
    pub size: u64,
}

pub fn discover_feeds(feed: &FeedConfig) -> Result<Vec<FeedFile>> {
    let root = &feed.root;
    if !root.exists() {
        bail!("Feed root does not exist: {}", root.display());
    }

    let include_set = build_globset(&feed.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/target/**".to_string()];
    default_excludes.extend(feed.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&default_excludes)?;

    let mut feeds = Vec::new();

    let walker = WalkDir::new(root).follow_links(feed.follow_symlinks);
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        feeds.push(FeedFile {
            path: path.to_path_buf(),
            relative: rel_str,
            size,
        });
    }

    feeds.sort_by(|a, b| a.relative.cmp(&b.relative));
    tracing::debug!(root = %root.display(), count = feeds.len(), "discovered feeds");

    Ok(feeds)
}

/// Print the discovered feeds as a table.
pub fn list_feeds(config: &Config) -> Result<()> {
    let feeds = discover_feeds(&config.feed)?;
    if feeds.is_empty() {
        println!("No feeds found under {}", config.feed.root.display());
        return Ok(());
    }

    println!("{:<48} {:>12}", "FEED", "SIZE");
    for feed in &feeds {
        println!("{:<48} {:>12}", feed.relative, feed.size);
    }
    Ok(())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
