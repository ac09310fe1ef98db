//! Subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the config file's `log_filter` is
//! used.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Pick the filter: `RUST_LOG` first, then `fallback`.
pub fn filter(fallback: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback)
            .with_context(|| format!("invalid log filter {fallback:?}")),
    }
}

/// Install the global fmt subscriber.
pub fn init(fallback: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(fallback)?)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}
