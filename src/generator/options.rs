//! Run options and the file layout derived from them.

use std::path::PathBuf;

use crate::config::schema::{BuildConfig, GeneratorConfig};

const TEMPLATE_SUFFIX: &str = ".template";
const DOMAIN_SSL_DIR: &str = "domaincerts";

/// Where templates are read from and outputs are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub work_dir: PathBuf,
    /// `<work_dir>/conf`; the core output lands here.
    pub conf_dir: PathBuf,
    pub template_dir: PathBuf,
    /// Include directory, relative to `conf_dir`.
    pub include_dir: String,
    pub conf_prefix: String,
    pub template_prefix: String,
}

impl Paths {
    /// Layout rooted at a working directory with stock prefixes.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let conf_dir = work_dir.join("conf");
        Self {
            template_dir: conf_dir.join("nginx").join("templates"),
            conf_dir,
            work_dir,
            include_dir: "nginx/includes".to_string(),
            conf_prefix: "nginx.conf".to_string(),
            template_prefix: "nginx.conf".to_string(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        let paths = &config.paths;
        let mut layout = Self::new(&paths.work_dir)
            .with_include_dir(&paths.include_dir)
            .with_conf_prefix(&paths.conf_prefix);
        if let Some(dir) = &paths.template_dir {
            layout = layout.with_template_dir(dir);
        }
        if let Some(prefix) = &paths.template_prefix {
            layout = layout.with_template_prefix(prefix);
        }
        layout
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_include_dir(mut self, dir: impl Into<String>) -> Self {
        self.include_dir = dir.into();
        self
    }

    /// Sets the output prefix and, like `-p`, the template prefix with it.
    pub fn with_conf_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.conf_prefix = prefix.into();
        self.template_prefix = self.conf_prefix.clone();
        self
    }

    pub fn with_template_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.template_prefix = prefix.into();
        self
    }

    /// `<conf_dir>/<include_dir>`
    pub fn includes_dir(&self) -> PathBuf {
        self.conf_dir.join(&self.include_dir)
    }

    /// Per-domain certificates, keys and client CAs.
    pub fn domain_ssl_dir(&self) -> PathBuf {
        self.conf_dir.join(DOMAIN_SSL_DIR)
    }

    pub fn default_ssl_crt(&self) -> PathBuf {
        self.conf_dir.join("nginx.crt")
    }

    pub fn default_ssl_key(&self) -> PathBuf {
        self.conf_dir.join("nginx.key")
    }

    /// Aggregate client CA bundle written by the generator.
    pub fn default_client_ca(&self) -> PathBuf {
        self.conf_dir.join("nginx.client.ca.crt")
    }

    pub fn default_dhparam(&self) -> PathBuf {
        self.conf_dir.join("dhparam.pem")
    }

    pub fn core_template(&self) -> PathBuf {
        self.template_dir
            .join(format!("{}{TEMPLATE_SUFFIX}", self.template_prefix))
    }

    pub fn core_output(&self) -> PathBuf {
        self.conf_dir.join(&self.conf_prefix)
    }

    /// `<template_dir>/<tprefix>.<name>.template`
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.template_dir
            .join(format!("{}.{name}{TEMPLATE_SUFFIX}", self.template_prefix))
    }

    /// `<includes_dir>/<prefix>.<name>`
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.includes_dir()
            .join(format!("{}.{name}", self.conf_prefix))
    }
}

/// What a run does after the registry is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Resolve and expand every template.
    #[default]
    Generate,
    /// Print stock descriptors and stop before reading the directory.
    DisplayDefaults,
    /// Print resolved descriptors and stop before expanding.
    DisplayDefinitions,
}

/// Everything a single generation run needs besides its data sources.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub paths: Paths,
    pub mode: RunMode,
    /// Log what would be expanded; write nothing.
    pub dry_run: bool,
    /// `key=value` overrides applied after resolution.
    pub overrides: Vec<String>,
    /// Server to generate for (id or name) instead of the local one.
    pub server: Option<String>,
    /// Unresolvable virtual hostnames are fatal.
    pub enforce_dns: bool,
    pub build: BuildConfig,
    pub directory_snapshot: PathBuf,
    pub local_config: Option<PathBuf>,
}

impl GenerateOptions {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            paths: Paths::from_config(config),
            mode: RunMode::Generate,
            dry_run: false,
            overrides: Vec::new(),
            server: None,
            enforce_dns: false,
            build: config.build.clone(),
            directory_snapshot: config.sources.directory_snapshot.clone(),
            local_config: config.sources.local_config.clone(),
        }
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}
