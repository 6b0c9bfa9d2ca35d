//! Crate-wide error type for a generation run.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::directory::DirectoryError;

/// Errors that abort a generation run.
///
/// Recoverable conditions (invalid upstreams, unknown overrides, skipped
/// domains) are logged where they happen and never reach this type.
#[derive(Debug, Error)]
pub enum ProxyConfError {
    /// Directory read failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Generator settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A custom variable was resolved without an update strategy.
    #[error("the custom update of ProxyConfVar with key {0} has to be implemented by override")]
    CustomUpdateMissing(String),

    /// A custom variable was formatted without a format strategy.
    #[error("the custom format of ProxyConfVar with key {0} has to be implemented by override")]
    CustomFormatMissing(String),

    /// Resolved value does not match the declared kind.
    #[error("value of {key} has shape {actual}, expected {expected}")]
    ValueShape {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Host name resolution failed under strict enforcement.
    #[error("{0}")]
    Resolution(String),

    /// Address family conflicts with the configured IP mode.
    #[error("{address} is an {family} address but zimbraIPMode is '{mode}'")]
    IpModeMismatch {
        address: String,
        family: &'static str,
        mode: &'static str,
    },

    /// A domain failed during collection; raised when an explosion reaches it.
    #[error("domain {domain}: {reason}")]
    DomainFailed { domain: String, reason: String },

    /// Unsupported first-line directive.
    #[error("Illegal custom header command: {0}")]
    IllegalCommand(String),

    /// `server(...)` without a service tag.
    #[error("Missing service parameter in custom header command: {0}")]
    MissingServiceParameter(String),

    /// Template file missing or unreadable.
    #[error("template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output or support file could not be written.
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration directory missing or not writable.
    #[error("configuration directory {0} does not exist or is not writable")]
    ConfDirUnusable(PathBuf),

    /// `-s` named a host the directory does not know.
    #[error("Cannot find server: {0}")]
    ServerNotFound(String),

    #[error("No available memcached servers could be contacted")]
    NoMemcacheServers,

    #[error("No available nginx lookup handlers could be contacted")]
    NoLookupHandlers,

    /// Client certificate verification requested with no CA to verify against.
    #[error("client certificate verification is enabled but no client cert CA is configured")]
    ClientCertCaMissing,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, ProxyConfError>;
