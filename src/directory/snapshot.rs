//! File-backed directory snapshot.
//!
//! ```toml
//! local_server = "proxy.example.com"
//!
//! [config]
//! zimbraReverseProxyHttpPortAttribute = "zimbraMailPort"
//!
//! [[servers]]
//! zimbraId = "..."
//! zimbraServiceHostname = "mbs1.example.com"
//! zimbraServiceEnabled = ["service", "zimbra"]
//!
//! [[domains]]
//! zimbraDomainName = "example.com"
//! ```
//!
//! Files ending in `.json` are read with the same layout. Server entries
//! inherit every `[config]` attribute they do not set.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{attrs, Directory, DirectoryError, Entry, ServerBy};

/// Attribute value as it may appear in a snapshot file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AttrValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl AttrValue {
    fn into_values(self) -> Vec<String> {
        match self {
            AttrValue::Bool(true) => vec!["TRUE".to_string()],
            AttrValue::Bool(false) => vec!["FALSE".to_string()],
            AttrValue::Int(n) => vec![n.to_string()],
            AttrValue::Text(s) => vec![s],
            AttrValue::List(l) => l,
        }
    }
}

type RawEntry = BTreeMap<String, AttrValue>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SnapshotFile {
    local_server: Option<String>,
    config: RawEntry,
    servers: Vec<RawEntry>,
    domains: Vec<RawEntry>,
}

fn to_entry(raw: RawEntry, name_attr: &str) -> Entry {
    let name = match raw.get(name_attr) {
        Some(AttrValue::Text(s)) => s.clone(),
        _ => String::new(),
    };
    raw.into_iter()
        .fold(Entry::new(name), |entry, (k, v)| {
            entry.with_multi_attr(k, v.into_values())
        })
}

/// In-memory directory loaded from a snapshot file.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDirectory {
    local_server: Option<String>,
    config: Entry,
    servers: Vec<Entry>,
    domains: Vec<Entry>,
}

impl SnapshotDirectory {
    /// Build a directory from entries, mostly for tests and embedding.
    pub fn new(config: Entry, servers: Vec<Entry>, domains: Vec<Entry>) -> Self {
        let servers = servers.into_iter().map(|s| s.inherit(&config)).collect();
        Self {
            local_server: None,
            config,
            servers,
            domains,
        }
    }

    /// Name the server `local_server()` returns.
    pub fn with_local_server(mut self, name: impl Into<String>) -> Self {
        self.local_server = Some(name.into());
        self
    }

    /// Load a TOML or JSON snapshot from disk.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let content = fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DirectoryError> {
        let file: SnapshotFile =
            toml::from_str(content).map_err(|e| DirectoryError::Parse(e.to_string()))?;
        Ok(Self::from_file(file))
    }

    pub fn from_json_str(content: &str) -> Result<Self, DirectoryError> {
        let file: SnapshotFile =
            serde_json::from_str(content).map_err(|e| DirectoryError::Parse(e.to_string()))?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: SnapshotFile) -> Self {
        let config = to_entry(file.config, "cn");
        let servers = file
            .servers
            .into_iter()
            .map(|s| to_entry(s, attrs::SERVICE_HOSTNAME))
            .collect();
        let domains = file
            .domains
            .into_iter()
            .map(|d| to_entry(d, attrs::DOMAIN_NAME))
            .collect();
        let mut dir = Self::new(config, servers, domains);
        dir.local_server = file.local_server;
        dir
    }
}

impl Directory for SnapshotDirectory {
    fn global_config(&self) -> Result<Entry, DirectoryError> {
        Ok(self.config.clone())
    }

    fn local_server(&self) -> Result<Entry, DirectoryError> {
        let name = self
            .local_server
            .as_deref()
            .ok_or(DirectoryError::NoLocalServer)?;
        self.server_by_name(name)?
            .ok_or_else(|| DirectoryError::LocalServerMissing(name.to_string()))
    }

    fn get_server(&self, by: &ServerBy) -> Result<Option<Entry>, DirectoryError> {
        let found = self.servers.iter().find(|s| match by {
            ServerBy::Id(id) => s.get_attr(attrs::ID) == Some(id.as_str()),
            ServerBy::Name(name) => s.name().eq_ignore_ascii_case(name),
        });
        Ok(found.cloned())
    }

    fn all_servers(&self) -> Result<Vec<Entry>, DirectoryError> {
        Ok(self.servers.clone())
    }

    fn all_domains(&self, attrs: &[&str]) -> Result<Vec<Entry>, DirectoryError> {
        Ok(self.domains.iter().map(|d| d.project(attrs)).collect())
    }
}
