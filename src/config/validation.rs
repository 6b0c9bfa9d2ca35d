//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject empty prefixes and escaping include directories
//! - Check the log level is one the subscriber understands
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: `GeneratorConfig` → `Result<(), Vec<ValidationError>>`
//! - File existence is not checked here; the generator reports missing
//!   inputs with their own errors

use std::fmt;
use std::path::{Component, Path};

use crate::config::schema::GeneratorConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every rule and collect all failures.
pub fn validate_config(config: &GeneratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.paths.work_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("paths.work_dir", "must not be empty"));
    }
    if config.paths.conf_prefix.trim().is_empty() {
        errors.push(ValidationError::new("paths.conf_prefix", "must not be empty"));
    }
    if let Some(prefix) = &config.paths.template_prefix {
        if prefix.trim().is_empty() {
            errors.push(ValidationError::new("paths.template_prefix", "must not be empty when set"));
        }
    }
    if !is_relative_inside(Path::new(&config.paths.include_dir)) {
        errors.push(ValidationError::new(
            "paths.include_dir",
            format!(
                "'{}' must be a relative path below the conf directory",
                config.paths.include_dir
            ),
        ));
    }
    if config.sources.directory_snapshot.as_os_str().is_empty() {
        errors.push(ValidationError::new("sources.directory_snapshot", "must not be empty"));
    }
    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_relative_inside(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
