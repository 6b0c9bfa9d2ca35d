//! Host-local override file (`localconfig`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::DirectoryError;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LocalValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Flat key/value settings local to this host.
#[derive(Debug, Clone, Default)]
pub struct LocalConfig {
    values: BTreeMap<String, String>,
}

impl LocalConfig {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a flat TOML table.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let content = fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let raw: BTreeMap<String, LocalValue> =
            toml::from_str(&content).map_err(|e| DirectoryError::Parse(e.to_string()))?;
        let values = raw
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    LocalValue::Bool(b) => b.to_string(),
                    LocalValue::Int(n) => n.to_string(),
                    LocalValue::Text(s) => s,
                };
                (k, text)
            })
            .collect();
        Ok(Self { values })
    }

    /// Value for `key`; empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
