//! Tracing setup for the CLI and the server.
//!
//! Logs always go to stderr. Stdout carries command output only: the streamed answer of
//! `search`, study cards and the JSON printed by `meta` and `tools`, so it can be piped.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directives used when `RUST_LOG` is unset: this crate and request traces at `info`,
/// dependencies (hyper, reqwest) only when they warn.
pub const DEFAULT_FILTER: &str = "warn,trial_scope=info,tower_http=info";

/// Install the stderr subscriber. Calling it again is a no-op.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(fmt_layer).try_init()?;
    tracing::debug!(filter = DEFAULT_FILTER, "tracing initialised");
    Ok(())
}
