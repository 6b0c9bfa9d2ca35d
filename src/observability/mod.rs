//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (key, server, domain, path)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, filtered by EnvFilter)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted messages
//! - Skipped inputs (bad upstreams, overrides, predicates) are warnings;
//!   aborts are errors logged once by the generator

pub mod logging;

pub use logging::init_logging;
