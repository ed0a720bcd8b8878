//! Diagnostic logging.
//!
//! User-facing output goes through [`crate::output`]; this module wires up
//! `tracing` for diagnostics, written to stderr so it never mixes with
//! answers on stdout. `RUST_LOG` overrides the level chosen from flags.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "convo_cli=debug" } else { "convo_cli=warn" }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
