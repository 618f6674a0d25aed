//! Tracing subscriber initialization.
//!
//! Diagnostics go to stderr so they never mix with the text or JSON report
//! on stdout. `RUST_LOG` wins when set; otherwise the level is `warn`, or
//! `debug` when debug mode is on.

use tracing_subscriber::EnvFilter;

fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "warn" }
}

/// Install the global subscriber. Returns `false` when one was already set,
/// in which case nothing changes.
pub fn init(debug: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
