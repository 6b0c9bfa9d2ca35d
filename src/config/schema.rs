//! Generator settings schema.
//!
//! Every section is optional in the settings file; missing fields fall back
//! to the stock `/opt/zimbra` layout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings for a generator run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Working directory, template and output layout.
    pub paths: PathsConfig,

    /// Where the directory snapshot and localconfig come from.
    pub sources: SourcesConfig,

    pub observability: ObservabilityConfig,

    /// Product build information shown in banners.
    pub build: BuildConfig,
}

/// File layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub work_dir: PathBuf,

    /// Template directory; `<work_dir>/conf/nginx/templates` when unset.
    pub template_dir: Option<PathBuf>,

    /// Output file prefix.
    pub conf_prefix: String,

    /// Template file prefix; the output prefix when unset.
    pub template_prefix: Option<String>,

    /// Include directory, relative to `<work_dir>/conf`.
    pub include_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/opt/zimbra"),
            template_dir: None,
            conf_prefix: "nginx.conf".to_string(),
            template_prefix: None,
            include_dir: "nginx/includes".to_string(),
        }
    }
}

/// Input files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Directory snapshot (TOML or JSON).
    pub directory_snapshot: PathBuf,

    /// Flat TOML localconfig; absent means no local overrides.
    pub local_config: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            directory_snapshot: PathBuf::from("/opt/zimbra/conf/directory.toml"),
            local_config: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Build information.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    pub version: String,
    pub release: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            version: "8.8.15_GA".to_string(),
            release: "GA".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        let config: GeneratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.paths.work_dir, PathBuf::from("/opt/zimbra"));
        assert_eq!(config.paths.conf_prefix, "nginx.conf");
        assert_eq!(config.paths.include_dir, "nginx/includes");
        assert!(config.paths.template_dir.is_none());
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.build, BuildConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config: GeneratorConfig = toml::from_str(
            r#"
            [paths]
            work_dir = "/srv/proxy"
            template_prefix = "tmpl"

            [sources]
            directory_snapshot = "/srv/proxy/dir.json"
            local_config = "/srv/proxy/local.toml"

            [build]
            version = "10.1.0"
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.work_dir, PathBuf::from("/srv/proxy"));
        assert_eq!(config.paths.conf_prefix, "nginx.conf");
        assert_eq!(config.paths.template_prefix.as_deref(), Some("tmpl"));
        assert_eq!(
            config.sources.local_config,
            Some(PathBuf::from("/srv/proxy/local.toml"))
        );
        assert_eq!(config.build.version, "10.1.0");
        assert_eq!(config.build.release, "GA");
    }
}
