//! Tracing setup for the `ci-shim` binary.
//!
//! Events go to stderr. Stdout is reserved for the rendered report so that
//! `--output json` can be piped.

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ci_shim_core::config::GeneralConfig;

/// Install the global subscriber described by `[general]`.
///
/// `RUST_LOG`, when set, replaces `log_level`. `log_format` is `json` (one
/// object per line, for CI log viewers) or `pretty`.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log level '{}'", config.log_level))?;

    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format.as_str() {
        "json" => registry.with(layer.json()).try_init(),
        "pretty" => registry.with(layer.pretty()).try_init(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };
    installed.context("a tracing subscriber is already installed")
}
