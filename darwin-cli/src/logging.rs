//! Log output for the CLI.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.
//! `RUST_LOG` takes precedence over `--verbose`; `DARWIN_LOG_FORMAT` selects
//! `pretty`, `json` or `compact` (the default).

use std::env;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
pub fn init(verbose: bool) {
    let default = if verbose {
        "darwin=debug,darwin_migrate=debug,darwin_postgres=debug,darwin_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // A second initialization (as in tests) is ignored.
    let _ = match env::var("DARWIN_LOG_FORMAT").as_deref() {
        Ok("json") => registry.with(layer.json()).try_init(),
        Ok("pretty") => registry.with(layer.pretty()).try_init(),
        _ => registry.with(layer.compact()).try_init(),
    };
}
