//! Tracing subscriber setup for the `brief` binary.
//!
//! Logs go to stderr so command output on stdout stays pipeable.
//! `RUST_LOG` wins over the defaults when set.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter: warnings only, or debug for brieflens crates with `--verbose`.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,brieflens=debug,brieflens_core=debug"
    } else {
        "warn"
    }
}

pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .compact();

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
