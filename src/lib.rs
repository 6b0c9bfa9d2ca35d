//! nginx proxy configuration generator.
//!
//! # Architecture Overview
//!
//! ```text
//!   settings (TOML) ──▶ config ──▶ GenerateOptions
//!                                        │
//!   directory snapshot ─┐                ▼
//!   localconfig ────────┼──▶ generator::Generator
//!   DNS resolver ───────┘        │
//!                                ├─▶ collect   (domains, servers, upstream lists)
//!                                ├─▶ vars      (registry, override resolver, formatter)
//!                                └─▶ template  (substitution, explode directives)
//!                                        │
//!                                        ▼
//!                         <conf>/nginx.conf + <conf>/nginx/includes/*
//! ```

pub mod collect;
pub mod config;
pub mod directory;
pub mod error;
pub mod generator;
pub mod observability;
pub mod template;
pub mod vars;

pub use error::{ProxyConfError, Result};
pub use generator::{create_conf, GenerateOptions, Generator};
