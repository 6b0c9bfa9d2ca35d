//! Generator settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GeneratorConfig (validated, immutable)
//!     → generator options (paths, sources, build info)
//! ```
//!
//! # Design Decisions
//! - Settings are read once per run; there is no reload
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BuildConfig, GeneratorConfig};
