//! Tracing subscriber set-up.
//!
//! Logs go to stderr so stdout stays free for JSON output. `RUST_LOG` takes
//! precedence over the configured level.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Keep dependency noise out unless asked for.
        EnvFilter::new(format!(
            "warn,catalog_indexer={level},catalog_indexer_core={level},catidx={level}"
        ))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
