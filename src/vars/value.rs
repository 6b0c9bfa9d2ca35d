//! Value kinds, override sources, and the standard renderers.

/// Declared shape of a variable's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    /// Byte count, rendered with `m`/`k` suffixes.
    Long,
    String,
    /// Rendered `on`/`off`.
    Boolean,
    /// Rendered `""` (directive active) or `#` (commented out).
    Enabler,
    /// Milliseconds, rendered `<n>ms`.
    Time,
    /// Shape and rendering owned by the variable's own strategies.
    Custom,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Integer => "Integer",
            ValueKind::Long => "Long",
            ValueKind::String => "String",
            ValueKind::Boolean => "Boolean",
            ValueKind::Enabler => "Enabler",
            ValueKind::Time => "Time",
            ValueKind::Custom => "Custom",
        }
    }
}

/// Where a variable's effective value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSource {
    /// Compiled default, never updated.
    None,
    /// Global configuration entry.
    Config,
    /// The effective server entry.
    Server,
    /// Host-local override file.
    LocalConfig,
    /// Computed by the variable's update strategy.
    Custom,
}

impl OverrideSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideSource::None => "None",
            OverrideSource::Config => "Config",
            OverrideSource::Server => "Server",
            OverrideSource::LocalConfig => "LocalConfig",
            OverrideSource::Custom => "Custom",
        }
    }
}

/// A parsed `Name: value` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Resolved payload of a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Long(i64),
    Str(String),
    Bool(bool),
    /// Milliseconds.
    Time(i64),
    List(Vec<String>),
    Headers(Vec<KeyValue>),
}

impl Value {
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Str(_) => "String",
            Value::Bool(_) => "Boolean",
            Value::Time(_) => "Time",
            Value::List(_) => "List",
            Value::Headers(_) => "Headers",
        }
    }

    /// Whether this payload is acceptable for `kind`.
    pub fn fits(&self, kind: ValueKind) -> bool {
        matches!(
            (kind, self),
            (ValueKind::Integer, Value::Integer(_))
                | (ValueKind::Long, Value::Long(_))
                | (ValueKind::String, Value::Str(_))
                | (ValueKind::Boolean, Value::Bool(_))
                | (ValueKind::Enabler, Value::Bool(_))
                | (ValueKind::Time, Value::Time(_))
                | (ValueKind::Custom, _)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Raw text used by `describe` output.
    pub fn display(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Long(n) | Value::Time(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::List(l) => format!("[{}]", l.join(", ")),
            Value::Headers(h) => {
                let parts: Vec<String> =
                    h.iter().map(|kv| format!("{}: {}", kv.key, kv.value)).collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }
}

const MIB: i64 = 1024 * 1024;
const KIB: i64 = 1024;

/// `2097152` → `2m`, `4096` → `4k`, `100` → `100`.
pub fn format_size(n: i64) -> String {
    if n % MIB == 0 {
        format!("{}m", n / MIB)
    } else if n % KIB == 0 {
        format!("{}k", n / KIB)
    } else {
        n.to_string()
    }
}

pub fn format_boolean(b: bool) -> &'static str {
    if b {
        "on"
    } else {
        "off"
    }
}

pub fn format_enabler(b: bool) -> &'static str {
    if b {
        ""
    } else {
        "#"
    }
}
