//! Directory entries and typed attribute access.

use std::collections::BTreeMap;

/// A named bag of multi-valued attributes (global config, a server, a domain).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    name: String,
    attrs: BTreeMap<String, Vec<String>>,
}

impl Entry {
    /// Create an empty entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style single value setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style multi value setter.
    pub fn with_multi_attr<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), vec![value.into()]);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keep only the named attributes.
    pub fn project(&self, keys: &[&str]) -> Entry {
        let attrs = self
            .attrs
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Entry {
            name: self.name.clone(),
            attrs,
        }
    }

    /// Take every attribute of `parent` this entry does not set itself.
    pub fn inherit(mut self, parent: &Entry) -> Self {
        for (key, values) in &parent.attrs {
            self.attrs
                .entry(key.clone())
                .or_insert_with(|| values.clone());
        }
        self
    }

    /// First value of an attribute.
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_attr_or(&self, key: &str, default: &str) -> String {
        self.get_attr(key).unwrap_or(default).to_string()
    }

    /// All values of an attribute, empty when unset.
    pub fn get_multi_attr(&self, key: &str) -> &[String] {
        self.attrs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True iff the value is `TRUE`; `default` when unset.
    pub fn get_bool_attr(&self, key: &str, default: bool) -> bool {
        match self.get_attr(key) {
            Some(v) => v.eq_ignore_ascii_case("TRUE"),
            None => default,
        }
    }

    pub fn get_int_attr(&self, key: &str, default: i32) -> i32 {
        self.get_attr(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_long_attr(&self, key: &str, default: i64) -> i64 {
        self.get_attr(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Time interval attribute in milliseconds.
    pub fn get_time_interval(&self, key: &str, default_ms: i64) -> i64 {
        match self.get_attr(key) {
            Some(v) => parse_time_interval(v, default_ms),
            None => default_ms,
        }
    }
}

/// Parse `<n>[d|h|m|s|ms]` into milliseconds. A bare number is seconds.
pub fn parse_time_interval(text: &str, default_ms: i64) -> i64 {
    let text = text.trim();
    if text.is_empty() {
        return default_ms;
    }

    let (digits, factor) = if let Some(n) = text.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = text.strip_suffix('d') {
        (n, 24 * 60 * 60 * 1000)
    } else if let Some(n) = text.strip_suffix('h') {
        (n, 60 * 60 * 1000)
    } else if let Some(n) = text.strip_suffix('m') {
        (n, 60 * 1000)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1000)
    } else {
        (text, 1000)
    };

    digits
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(factor))
        .unwrap_or(default_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_interval_units() {
        assert_eq!(parse_time_interval("10", 0), 10_000);
        assert_eq!(parse_time_interval("10s", 0), 10_000);
        assert_eq!(parse_time_interval("250ms", 0), 250);
        assert_eq!(parse_time_interval("2m", 0), 120_000);
        assert_eq!(parse_time_interval("1h", 0), 3_600_000);
        assert_eq!(parse_time_interval("1d", 0), 86_400_000);
    }

    #[test]
    fn test_time_interval_garbage_falls_back() {
        assert_eq!(parse_time_interval("soon", 42), 42);
        assert_eq!(parse_time_interval("", 42), 42);
        assert_eq!(parse_time_interval("5x", 42), 42);
    }

    #[test]
    fn test_typed_getters() {
        let entry = Entry::new("mbs1")
            .with_attr("zimbraReverseProxyLookupTarget", "TRUE")
            .with_attr("zimbraMailPort", "8080")
            .with_attr("broken", "eighty")
            .with_multi_attr("zimbraServiceEnabled", ["service", "zimbra"]);

        assert!(entry.get_bool_attr("zimbraReverseProxyLookupTarget", false));
        assert!(!entry.get_bool_attr("missing", false));
        assert!(entry.get_bool_attr("missing", true));
        assert_eq!(entry.get_int_attr("zimbraMailPort", 0), 8080);
        assert_eq!(entry.get_int_attr("broken", 7), 7);
        assert_eq!(entry.get_multi_attr("zimbraServiceEnabled").len(), 2);
        assert!(entry.get_multi_attr("missing").is_empty());
    }

    #[test]
    fn test_bool_attr_only_true_is_true() {
        let entry = Entry::new("x").with_attr("flag", "yes");
        assert!(!entry.get_bool_attr("flag", true));
    }

    #[test]
    fn test_project_keeps_named_attrs() {
        let entry = Entry::new("example.com")
            .with_attr("zimbraVirtualHostname", "mail.example.com")
            .with_attr("description", "ignored");
        let projected = entry.project(&["zimbraVirtualHostname"]);
        assert_eq!(projected.get_attr("zimbraVirtualHostname"), Some("mail.example.com"));
        assert_eq!(projected.get_attr("description"), None);
        assert_eq!(projected.name(), "example.com");
    }

    #[test]
    fn test_inherit_keeps_own_values() {
        let config = Entry::new("config")
            .with_attr("zimbraReverseProxyClientCertCA", "CA")
            .with_attr("zimbraMailPort", "80");
        let server = Entry::new("proxy")
            .with_attr("zimbraMailPort", "8080")
            .inherit(&config);
        assert_eq!(server.get_attr("zimbraReverseProxyClientCertCA"), Some("CA"));
        assert_eq!(server.get_int_attr("zimbraMailPort", 0), 8080);
        assert_eq!(server.name(), "proxy");
    }
}
