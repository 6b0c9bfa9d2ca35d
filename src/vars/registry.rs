//! Ordered variable registry and the rendered key → text map.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use crate::error::Result;

use super::sources::Sources;
use super::value::Value;
use super::var::ConfVar;

/// Variables in registration order, indexed by key.
#[derive(Debug, Default)]
pub struct VarRegistry {
    vars: Vec<ConfVar>,
    index: HashMap<String, usize>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable; a second registration of a key replaces the first in place.
    pub fn register(&mut self, var: ConfVar) {
        match self.index.get(&var.key) {
            Some(&pos) => self.vars[pos] = var,
            None => {
                self.index.insert(var.key.clone(), self.vars.len());
                self.vars.push(var);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfVar> {
        self.index.get(key).map(|&pos| &self.vars[pos])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfVar> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.vars[pos]),
            None => None,
        }
    }

    /// Current raw value of a variable.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).map(|v| &v.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfVar> {
        self.vars.iter()
    }

    /// Update every variable in registration order, then render all of them.
    pub fn resolve_all(&mut self, sources: &Sources<'_>) -> Result<VarMap> {
        for var in &mut self.vars {
            var.update(sources)?;
            tracing::trace!(key = %var.key, value = %var.value.display(), "Resolved variable");
        }
        self.render()
    }

    /// Render current values without updating.
    pub fn render(&self) -> Result<VarMap> {
        let mut map = VarMap::default();
        for var in &self.vars {
            map.set(&var.key, var.conf_value()?);
        }
        Ok(map)
    }

    /// Describe every variable, sorted by key.
    pub fn write_descriptions(&self, out: &mut dyn Write) -> Result<()> {
        let mut vars: Vec<&ConfVar> = self.vars.iter().collect();
        vars.sort_by(|a, b| a.key.cmp(&b.key));
        for var in vars {
            var.write_description(out)?;
        }
        Ok(())
    }
}

/// Rendered variable text keyed by variable name, consumed by templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarMap {
    values: BTreeMap<String, String>,
}

impl VarMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Apply `key=value` overrides to keys that already exist.
    pub fn apply_overrides<S: AsRef<str>>(&mut self, overrides: &[S]) {
        for ov in overrides {
            let ov = ov.as_ref();
            match ov.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    if self.values.contains_key(key) {
                        tracing::info!(key = %key, value = %value, "Overriding config variable");
                        self.values.insert(key.to_string(), value.to_string());
                    } else {
                        tracing::warn!(key = %key, "Ignoring non-existent config variable override");
                    }
                }
                _ => tracing::warn!(override_arg = %ov, "Ignoring malformed override, expected key=value"),
            }
        }
    }
}
