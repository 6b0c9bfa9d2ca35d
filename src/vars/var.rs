//! A single configuration variable and its standard update/format rules.

use std::fmt;
use std::io::Write;

use crate::directory::entry::parse_time_interval;
use crate::directory::Entry;
use crate::error::{ProxyConfError, Result};

use super::sources::Sources;
use super::value::{format_boolean, format_enabler, format_size, OverrideSource, Value, ValueKind};

/// Computes a variable's value from the run's sources.
pub type UpdateFn = Box<dyn Fn(&ConfVar, &Sources<'_>) -> Result<Value>>;

/// Renders a value as config text.
pub type FormatFn = Box<dyn Fn(&ConfVar, &Value) -> Result<String>>;

/// A named, typed configuration variable.
pub struct ConfVar {
    pub key: String,
    /// Directory or localconfig attribute that controls the value.
    pub attribute: Option<String>,
    pub kind: ValueKind,
    pub default: Value,
    pub source: OverrideSource,
    pub value: Value,
    pub description: String,
    update: Option<UpdateFn>,
    format: Option<FormatFn>,
}

impl fmt::Debug for ConfVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfVar")
            .field("key", &self.key)
            .field("attribute", &self.attribute)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("value", &self.value)
            .field("custom_update", &self.update.is_some())
            .field("custom_format", &self.format.is_some())
            .finish()
    }
}

impl ConfVar {
    /// Create a variable whose value starts at its default.
    pub fn new(
        key: &str,
        attribute: Option<&str>,
        default: Value,
        kind: ValueKind,
        source: OverrideSource,
        description: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            attribute: attribute.map(str::to_string),
            kind,
            value: default.clone(),
            default,
            source,
            description: description.to_string(),
            update: None,
            format: None,
        }
    }

    /// Attach a custom update strategy.
    pub fn with_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfVar, &Sources<'_>) -> Result<Value> + 'static,
    {
        self.update = Some(Box::new(f));
        self
    }

    /// Attach a custom format strategy.
    pub fn with_format<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfVar, &Value) -> Result<String> + 'static,
    {
        self.format = Some(Box::new(f));
        self
    }

    /// Recompute the value and check it against the declared kind.
    pub fn update(&mut self, sources: &Sources<'_>) -> Result<()> {
        let value = match &self.update {
            Some(f) => f(self, sources)?,
            None => self.standard_update(sources)?,
        };
        if !value.fits(self.kind) {
            return Err(ProxyConfError::ValueShape {
                key: self.key.clone(),
                expected: self.kind.as_str(),
                actual: value.shape(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Kind-driven read from the declared source, ignoring any custom strategy.
    pub fn standard_update(&self, sources: &Sources<'_>) -> Result<Value> {
        match self.source {
            OverrideSource::None => Ok(self.default.clone()),
            OverrideSource::Custom => Err(ProxyConfError::CustomUpdateMissing(self.key.clone())),
            OverrideSource::Config => self.read_entry(sources.config),
            OverrideSource::Server => self.read_entry(sources.server),
            OverrideSource::LocalConfig => {
                let raw = self
                    .attribute
                    .as_deref()
                    .and_then(|attr| sources.local.get(attr));
                match raw {
                    Some(text) => self.parse_local(text),
                    None => Ok(self.default.clone()),
                }
            }
        }
    }

    fn read_entry(&self, entry: &Entry) -> Result<Value> {
        let Some(attr) = self.attribute.as_deref() else {
            return Ok(self.default.clone());
        };
        let value = match (self.kind, &self.default) {
            (ValueKind::Integer, Value::Integer(d)) => Value::Integer(entry.get_int_attr(attr, *d)),
            (ValueKind::Long, Value::Long(d)) => Value::Long(entry.get_long_attr(attr, *d)),
            (ValueKind::String, Value::Str(d)) => Value::Str(entry.get_attr_or(attr, d)),
            (ValueKind::Boolean | ValueKind::Enabler, Value::Bool(d)) => {
                Value::Bool(entry.get_bool_attr(attr, *d))
            }
            (ValueKind::Time, Value::Time(d)) => Value::Time(entry.get_time_interval(attr, *d)),
            (ValueKind::Custom, _) => {
                return Err(ProxyConfError::CustomUpdateMissing(self.key.clone()))
            }
            _ => self.default.clone(),
        };
        Ok(value)
    }

    fn parse_local(&self, text: &str) -> Result<Value> {
        let value = match (self.kind, &self.default) {
            (ValueKind::Integer, _) => match text.trim().parse() {
                Ok(n) => Value::Integer(n),
                Err(_) => self.local_fallback(text),
            },
            (ValueKind::Long, _) => match text.trim().parse() {
                Ok(n) => Value::Long(n),
                Err(_) => self.local_fallback(text),
            },
            (ValueKind::String, _) => Value::Str(text.to_string()),
            (ValueKind::Boolean | ValueKind::Enabler, _) => {
                Value::Bool(text.trim().eq_ignore_ascii_case("true"))
            }
            (ValueKind::Time, Value::Time(d)) => Value::Time(parse_time_interval(text, *d)),
            (ValueKind::Custom, _) => {
                return Err(ProxyConfError::CustomUpdateMissing(self.key.clone()))
            }
            _ => self.default.clone(),
        };
        Ok(value)
    }

    fn local_fallback(&self, text: &str) -> Value {
        tracing::warn!(
            key = %self.key,
            value = %text,
            "Unparsable localconfig value, using default"
        );
        self.default.clone()
    }

    /// Render the current value.
    pub fn conf_value(&self) -> Result<String> {
        self.format(&self.value)
    }

    /// Render any value with this variable's rules.
    pub fn format(&self, value: &Value) -> Result<String> {
        match &self.format {
            Some(f) => f(self, value),
            None => self.standard_format(value),
        }
    }

    pub fn standard_format(&self, value: &Value) -> Result<String> {
        let text = match (self.kind, value) {
            (ValueKind::Integer, Value::Integer(n)) => n.to_string(),
            (ValueKind::Long, Value::Long(n)) => format_size(*n),
            (ValueKind::String, Value::Str(s)) => s.clone(),
            (ValueKind::Boolean, Value::Bool(b)) => format_boolean(*b).to_string(),
            (ValueKind::Enabler, Value::Bool(b)) => format_enabler(*b).to_string(),
            (ValueKind::Time, Value::Time(ms)) => format!("{ms}ms"),
            (ValueKind::Custom, _) => {
                return Err(ProxyConfError::CustomFormatMissing(self.key.clone()))
            }
            (kind, other) => {
                return Err(ProxyConfError::ValueShape {
                    key: self.key.clone(),
                    expected: kind.as_str(),
                    actual: other.shape(),
                })
            }
        };
        Ok(text)
    }

    /// Human-readable description block.
    pub fn write_description(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "  NGINX Keyword:         {}", self.key)?;
        writeln!(out, "  Description:           {}", self.description)?;
        writeln!(out, "  Value Type:            {}", self.kind.as_str())?;
        writeln!(
            out,
            "  Controlling Attribute: {}",
            self.attribute.as_deref().unwrap_or("(none)")
        )?;
        writeln!(out, "  Default Value:         {}", self.default.display())?;
        writeln!(out, "  Current Value:         {}", self.value.display())?;
        writeln!(out, "  Config Text:           {}", self.conf_value()?)?;
        writeln!(out)?;
        Ok(())
    }
}
