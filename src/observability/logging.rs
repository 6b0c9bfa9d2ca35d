//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick the level from `RUST_LOG`, else from settings or `-v`
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Human-readable `fmt` output; the generator is an operator tool
//! - Verbose mode always wins over the configured level

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate target used in the default filter directive.
const TARGET: &str = "proxy_confgen";

/// Filter directive for a level, `debug` when verbose.
pub fn default_directive(level: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { level };
    format!("{TARGET}={}", level.to_ascii_lowercase())
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(level: &str, verbose: bool) {
    let directive = default_directive(level, verbose);
    let filter = if verbose {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| directive.into())
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
