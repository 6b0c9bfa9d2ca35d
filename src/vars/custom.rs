//! Variables whose value or rendering needs more than a kind-driven read.
//!
//! Each constructor returns a fully described [`ConfVar`] with its update
//! and/or format strategy attached. The default table in `defaults.rs`
//! registers them alongside the plain variables.

use std::path::Path;

use crate::collect::upstream::{
    self, format_lookup_handlers, format_memcache_servers, format_server_list, Pool, PortSource,
};
use crate::directory::{attrs, IpMode};
use crate::error::{ProxyConfError, Result};

use super::sources::Sources;
use super::value::{KeyValue, OverrideSource, Value, ValueKind};
use super::var::ConfVar;

/// Header name used when a configured header line has no `Name: value` shape.
pub const UNKNOWN_HEADER_NAME: &str = "X-Zimbra-Unknown-Header";

/// Upstream cluster names referenced by templates and target schemes.
pub mod upstream_names {
    pub const WEB: &str = "zimbra";
    pub const WEB_CLIENT: &str = "zimbra_webclient";
    pub const WEB_SSL: &str = "zimbra_ssl";
    pub const WEB_CLIENT_SSL: &str = "zimbra_ssl_webclient";
    pub const ADMIN: &str = "zimbra_admin";
    pub const ADMIN_CLIENT: &str = "zimbra_adminclient";
    pub const EWS: &str = "zimbra_ews";
    pub const EWS_SSL: &str = "zimbra_ews_ssl";
    pub const LOGIN: &str = "zimbra_login";
    pub const LOGIN_SSL: &str = "zimbra_login_ssl";
    pub const ZX: &str = "zx";
    pub const ZX_SSL: &str = "zx_ssl";
}

const ERROR_PAGE_CODES: [&str; 2] = ["502", "504"];
const FAIR_SHM_MIN: i32 = 32;
const SSL_PROTOCOLS_ATTR: &str = "zimbraReverseProxySSLProtocols";
const SSL_TO_UPSTREAM_ATTR: &str = "zimbraReverseProxySSLToUpstreamEnabled";
const DEFAULT_SSL_PROTOCOLS: [&str; 3] = ["TLSv1", "TLSv1.1", "TLSv1.2"];
const DEFAULT_IMAP_CAPABILITIES: [&str; 6] =
    ["IMAP4rev1", "ID", "LITERAL+", "SASL-IR", "IDLE", "NAMESPACE"];
const DEFAULT_POP3_CAPABILITIES: [&str; 4] = ["TOP", "USER", "UIDL", "EXPIRE 31 USER"];

/// Parse `Name: value` header lines.
pub fn parse_headers(lines: &[String]) -> Vec<KeyValue> {
    lines.iter().map(|line| parse_header(line)).collect()
}

fn parse_header(line: &str) -> KeyValue {
    if let Some((key, rest)) = line.split_once(':') {
        if !key.is_empty() && rest.starts_with(char::is_whitespace) {
            return KeyValue {
                key: key.to_string(),
                value: rest.trim_start().to_string(),
            };
        }
    }
    KeyValue {
        key: UNKNOWN_HEADER_NAME.to_string(),
        value: line.to_string(),
    }
}

/// One `add_header` directive per header, continuation lines indented.
pub fn format_add_headers(headers: &[KeyValue]) -> String {
    headers
        .iter()
        .map(|h| {
            tracing::debug!(name = %h.key, value = %h.value, "Adding directive add_header");
            format!("add_header {} {};", h.key, h.value)
        })
        .collect::<Vec<_>>()
        .join("\n    ")
}

fn list_value<'v>(var: &ConfVar, value: &'v Value) -> Result<&'v [String]> {
    value.as_list().ok_or_else(|| ProxyConfError::ValueShape {
        key: var.key.clone(),
        expected: "List",
        actual: value.shape(),
    })
}

fn bool_value(var: &ConfVar, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| ProxyConfError::ValueShape {
        key: var.key.clone(),
        expected: "Boolean",
        actual: value.shape(),
    })
}

fn str_value<'v>(var: &ConfVar, value: &'v Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| ProxyConfError::ValueShape {
        key: var.key.clone(),
        expected: "String",
        actual: value.shape(),
    })
}

fn static_list(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| s.to_string()).collect())
}

/// Enabler computed from the sources.
fn computed_enabler<F>(key: &str, attribute: Option<&str>, default: bool, description: &str, f: F) -> ConfVar
where
    F: Fn(&Sources<'_>) -> Result<bool> + 'static,
{
    ConfVar::new(
        key,
        attribute,
        Value::Bool(default),
        ValueKind::Enabler,
        OverrideSource::Custom,
        description,
    )
    .with_update(move |_, sources| f(sources).map(Value::Bool))
}

/// Multi-valued server attribute, falling back to a fixed list when empty.
fn server_list_or_default(
    key: &str,
    attribute: &'static str,
    defaults: &[&str],
    description: &str,
) -> ConfVar {
    ConfVar::new(
        key,
        Some(attribute),
        static_list(defaults),
        ValueKind::Custom,
        OverrideSource::Custom,
        description,
    )
    .with_update(move |var, sources| {
        let values = sources.server.get_multi_attr(attribute);
        if values.is_empty() {
            Ok(var.default.clone())
        } else {
            Ok(Value::List(values.to_vec()))
        }
    })
}

/// `core.ipboth.enabled`, `core.ipv4only.enabled`, `core.ipv6only.enabled`.
pub fn ip_mode_enablers() -> Vec<ConfVar> {
    vec![
        computed_enabler("core.ipv4only.enabled", None, false, "IPv4 Only", |s| {
            Ok(s.ip_mode == IpMode::Ipv4)
        }),
        computed_enabler("core.ipv6only.enabled", None, false, "IPv6 Only", |s| {
            Ok(s.ip_mode == IpMode::Ipv6)
        }),
        computed_enabler("core.ipboth.enabled", None, true, "Both IPv4 and IPv6", |s| {
            Ok(s.ip_mode == IpMode::Both)
        }),
    ]
}

/// Default client CA path; always the generator's own bundle location.
pub fn client_cert_ca_default(default_path: &Path) -> ConfVar {
    ConfVar::new(
        "ssl.clientcertca.default",
        Some(attrs::CLIENT_CERT_CA),
        Value::Str(default_path.display().to_string()),
        ValueKind::String,
        OverrideSource::Custom,
        "CA certificate for authenticating client certificates in nginx proxy (https only)",
    )
    .with_update(|var, _| Ok(var.default.clone()))
}

/// Whether an aggregate client CA bundle was written this run.
pub fn client_cert_ca_enabled(enabled: bool) -> ConfVar {
    ConfVar::new(
        "ssl.clientcertca.enabled",
        None,
        Value::Bool(enabled),
        ValueKind::Enabler,
        OverrideSource::Custom,
        "is there valid client ca cert",
    )
    .with_update(move |_, _| Ok(Value::Bool(enabled)))
}

pub fn imap_capabilities() -> ConfVar {
    server_list_or_default(
        "mail.imapcapa",
        "zimbraReverseProxyImapEnabledCapability",
        &DEFAULT_IMAP_CAPABILITIES,
        "IMAP Capability List",
    )
    .with_format(format_capabilities)
}

pub fn pop3_capabilities() -> ConfVar {
    server_list_or_default(
        "mail.pop3capa",
        "zimbraReverseProxyPop3EnabledCapability",
        &DEFAULT_POP3_CAPABILITIES,
        "POP3 Capability List",
    )
    .with_format(format_capabilities)
}

/// ` "A" "B"`.
fn format_capabilities(var: &ConfVar, value: &Value) -> Result<String> {
    Ok(list_value(var, value)?
        .iter()
        .map(|c| format!(" \"{c}\""))
        .collect())
}

/// `mail.ssl.protocols` or `web.ssl.protocols`.
pub fn ssl_protocols(key: &str, description: &str) -> ConfVar {
    server_list_or_default(key, SSL_PROTOCOLS_ATTR, &DEFAULT_SSL_PROTOCOLS, description)
        .with_format(|var, value| {
            Ok(list_value(var, value)?
                .iter()
                .map(|p| format!(" {p}"))
                .collect())
        })
}

/// Banner greeting exposing the build version when the server asks for it.
pub fn imap_greeting() -> ConfVar {
    greeting(
        "mail.imap.greeting",
        "zimbraReverseProxyImapExposeVersionOnBanner",
        "* OK",
        "IMAP4",
    )
}

pub fn pop3_greeting() -> ConfVar {
    greeting(
        "mail.pop3.greeting",
        "zimbraReverseProxyPop3ExposeVersionOnBanner",
        "+OK",
        "POP3",
    )
}

fn greeting(key: &str, attribute: &'static str, status: &'static str, protocol: &'static str) -> ConfVar {
    ConfVar::new(
        key,
        Some(attribute),
        Value::Str(String::new()),
        ValueKind::String,
        OverrideSource::Custom,
        &format!("Proxy {protocol} banner message (contains build version if {attribute} is true)"),
    )
    .with_update(move |_, sources| {
        let text = if sources.server.get_bool_attr(attribute, false) {
            format!("{status} Zimbra {} {protocol} ready", sources.build.version)
        } else {
            String::new()
        };
        Ok(Value::Str(text))
    })
}

/// Client IPs exempt from login throttling.
pub fn ip_throttle_whitelist() -> ConfVar {
    ConfVar::new(
        "mail.whitelistip.:servers",
        Some("zimbraReverseProxyIPThrottleWhitelist"),
        Value::List(Vec::new()),
        ValueKind::Custom,
        OverrideSource::Custom,
        "List of Client IP addresses immune to IP Throttling",
    )
    .with_update(|_, sources| {
        let ips = sources
            .server
            .get_multi_attr("zimbraReverseProxyIPThrottleWhitelist")
            .to_vec();
        for ip in &ips {
            tracing::debug!(ip = %ip, "Added IP throttle whitelist entry");
        }
        Ok(Value::List(ips))
    })
    .with_format(|var, value| {
        Ok(list_value(var, value)?
            .iter()
            .enumerate()
            .map(|(i, ip)| {
                if i == 0 {
                    format!("mail_whitelist_ip    {ip};\n")
                } else {
                    format!("    mail_whitelist_ip    {ip};\n")
                }
            })
            .collect())
    })
}

/// Integer localconfig timeout plus a fixed offset.
pub fn timeout_with_offset(
    key: &str,
    attribute: &str,
    default: i32,
    offset: i32,
    description: &str,
) -> ConfVar {
    ConfVar::new(
        key,
        Some(attribute),
        Value::Integer(default),
        ValueKind::Integer,
        OverrideSource::LocalConfig,
        description,
    )
    .with_update(move |var, sources| match var.standard_update(sources)? {
        Value::Integer(n) => Ok(Value::Integer(n.saturating_add(offset))),
        other => Ok(other),
    })
}

/// Time variable rendered in whole seconds instead of `<n>ms`.
pub fn time_in_seconds(
    key: &str,
    attribute: &str,
    default_ms: i64,
    source: OverrideSource,
    description: &str,
) -> ConfVar {
    ConfVar::new(
        key,
        Some(attribute),
        Value::Time(default_ms),
        ValueKind::Time,
        source,
        description,
    )
    .with_format(|var, value| match value {
        Value::Time(ms) => Ok((ms / 1000).to_string()),
        other => Err(ProxyConfError::ValueShape {
            key: var.key.clone(),
            expected: "Time",
            actual: other.shape(),
        }),
    })
}

fn mail_mode(sources: &Sources<'_>) -> String {
    sources.server.get_attr_or("zimbraReverseProxyMailMode", "both")
}

/// `web.http.enabled`: on unless the proxy mail mode is `https`.
pub fn http_enabler() -> ConfVar {
    computed_enabler(
        "web.http.enabled",
        None,
        true,
        "Indicates whether HTTP Proxy will accept connections on HTTP (true unless zimbraReverseProxyMailMode is 'https')",
        |s| Ok(!mail_mode(s).eq_ignore_ascii_case("https")),
    )
}

/// `web.https.enabled`: on unless the proxy mail mode is `http`.
pub fn https_enabler() -> ConfVar {
    computed_enabler(
        "web.https.enabled",
        None,
        true,
        "Indicates whether HTTP Proxy will accept connections on HTTPS (true unless zimbraReverseProxyMailMode is 'http')",
        |s| Ok(!mail_mode(s).eq_ignore_ascii_case("http")),
    )
}

/// Upstream `server` directives for one role.
pub fn upstream_list(key: &str, pool: Pool, port: PortSource, description: &str) -> ConfVar {
    ConfVar::new(
        key,
        None,
        Value::List(Vec::new()),
        ValueKind::Custom,
        OverrideSource::Custom,
        description,
    )
    .with_update(move |_, s| {
        upstream::upstream_servers(s.directory, s.config, s.server, pool, port).map(Value::List)
    })
    .with_format(|var, value| Ok(format_server_list(list_value(var, value)?)))
}

/// `error_page` statements, local pages or a redirect to the handler URL.
pub fn error_pages() -> ConfVar {
    ConfVar::new(
        "web.:error_pages",
        Some("zimbraReverseProxyErrorHandlerURL"),
        Value::Str(String::new()),
        ValueKind::String,
        OverrideSource::Server,
        "the error page statements",
    )
    .with_format(|var, value| {
        let url = str_value(var, value)?;
        Ok(ERROR_PAGE_CODES
            .iter()
            .map(|code| {
                if url.is_empty() {
                    format!("error_page {code} /zmerror_upstream_{code}.html;\n")
                } else {
                    format!("error_page {code} {url}?err={code}&up=$upstream_addr;\n")
                }
            })
            .collect())
    })
}

/// `proxy_pass` target: `http://<plain>` or `https://<ssl>` by upstream SSL.
pub fn upstream_target(key: &str, plain: &'static str, ssl: &'static str, description: &str) -> ConfVar {
    ConfVar::new(
        key,
        Some(SSL_TO_UPSTREAM_ATTR),
        Value::Bool(true),
        ValueKind::Boolean,
        OverrideSource::Server,
        description,
    )
    .with_format(move |var, value| {
        Ok(if bool_value(var, value)? {
            format!("https://{ssl}")
        } else {
            format!("http://{plain}")
        })
    })
}

/// XMPP BOSH upstream scheme.
pub fn xmpp_upstream_proto() -> ConfVar {
    ConfVar::new(
        "web.xmpp.upstream.proto",
        Some("zimbraReverseProxyXmppBoshSSL"),
        Value::Bool(true),
        ValueKind::Boolean,
        OverrideSource::Server,
        "The XMPP target of proxy_pass for web proxy",
    )
    .with_format(|var, value| Ok(if bool_value(var, value)? { "https" } else { "http" }.to_string()))
}

pub fn ssl_session_cache_size() -> ConfVar {
    ConfVar::new(
        "ssl.session.cachesize",
        Some("zimbraReverseProxySSLSessionCacheSize"),
        Value::Str("10m".to_string()),
        ValueKind::String,
        OverrideSource::Server,
        "SSL session cache size for the proxy",
    )
    .with_format(|var, value| Ok(format!("shared:SSL:{}", str_value(var, value)?)))
}

/// Enabler that is on when a multi-valued server attribute is populated.
pub fn populated_enabler(key: &str, attribute: &'static str, description: &str) -> ConfVar {
    computed_enabler(key, Some(attribute), false, description, move |s| {
        Ok(!s.server.get_multi_attr(attribute).is_empty())
    })
}

/// `web.xmpp.bosh.upstream.disable`: on only when the external BOSH target is
/// fully configured and enabled.
pub fn xmpp_bosh_enabler() -> ConfVar {
    computed_enabler(
        "web.xmpp.bosh.upstream.disable",
        Some("zimbraReverseProxyXmppBoshEnabled"),
        false,
        "whether to populate the location block for XMPP over BOSH requests to /http-bind path",
        |s| {
            let is_set = |attr: &str| s.server.get_attr(attr).is_some_and(|v| !v.is_empty());
            let port = s.server.get_int_attr("zimbraReverseProxyXmppBoshPort", 0);
            if !is_set("zimbraReverseProxyXmppBoshLocalHttpBindURL")
                || !is_set("zimbraReverseProxyXmppBoshHostname")
                || port == 0
            {
                tracing::debug!("XMPP BOSH upstream disabled because a required attribute is unset");
                return Ok(false);
            }
            Ok(s.server.get_attr("zimbraReverseProxyXmppBoshEnabled") == Some("TRUE"))
        },
    )
}

/// On when the DH parameter file exists.
pub fn dhparam_enabler() -> ConfVar {
    computed_enabler(
        "web.ssl.dhparam.enabled",
        None,
        false,
        "Indicates whether ssl_dhparam directive should be added or not",
        |s| Ok(s.paths.default_dhparam().exists()),
    )
}

/// `upstream_fair_shm_size <n>k;`, never below 32.
pub fn fair_shm_size() -> ConfVar {
    ConfVar::new(
        "upstream.fair.shm.size",
        Some("zimbraReverseProxyUpstreamFairShmSize"),
        Value::Str(FAIR_SHM_MIN.to_string()),
        ValueKind::Custom,
        OverrideSource::Custom,
        "Controls the 'upstream_fair_shm_size' configuration in the proxy configuration file: nginx.conf.web.template.",
    )
    .with_update(|_, s| {
        let setting = s
            .server
            .get_attr_or("zimbraReverseProxyUpstreamFairShmSize", &FAIR_SHM_MIN.to_string());
        let size = match setting.trim().parse::<i32>() {
            Ok(n) => n.max(FAIR_SHM_MIN),
            Err(_) => {
                tracing::info!(
                    value = %setting,
                    "Invalid zimbraReverseProxyUpstreamFairShmSize, falling back to 32"
                );
                FAIR_SHM_MIN
            }
        };
        Ok(Value::Str(size.to_string()))
    })
    .with_format(|var, value| Ok(format!("upstream_fair_shm_size {}k;", str_value(var, value)?)))
}

pub fn strict_server_name() -> ConfVar {
    computed_enabler(
        "web.strict.servername",
        Some("zimbraReverseProxyStrictServerNameEnabled"),
        false,
        "Indicates whether the default server block is generated returning a default HTTP response to all unknown hostnames",
        |s| {
            let enabled = s
                .server
                .get_bool_attr("zimbraReverseProxyStrictServerNameEnabled", false);
            tracing::info!(enabled, "Strict server name enforcement");
            Ok(enabled)
        },
    )
}

/// Explicit virtual IPs that get a catch-all strict server block.
pub fn listen_addresses() -> ConfVar {
    ConfVar::new(
        "listen.:addresses",
        None,
        Value::List(Vec::new()),
        ValueKind::Custom,
        OverrideSource::Custom,
        "List of ip addresses nginx needs to listen to catch all unknown server names",
    )
    .with_update(|_, s| Ok(Value::List(s.domains.listen_addresses.iter().cloned().collect())))
    .with_format(|var, value| {
        let addresses = list_value(var, value)?;
        if addresses.is_empty() {
            return Ok("${web.strict.servername}".to_string());
        }
        Ok(addresses
            .iter()
            .map(|addr| {
                format!(
                    "${{web.strict.servername}}    listen                  {addr}:${{web.https.port}} default_server;"
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    })
}

/// `add_header` lines from the global response header list.
pub fn default_add_headers() -> ConfVar {
    ConfVar::new(
        "web.add.headers.default",
        Some(attrs::RESPONSE_HEADERS),
        Value::Headers(Vec::new()),
        ValueKind::Custom,
        OverrideSource::Custom,
        "add_header directive for default web proxy",
    )
    .with_update(|_, s| {
        Ok(Value::Headers(parse_headers(
            s.config.get_multi_attr(attrs::RESPONSE_HEADERS),
        )))
    })
    .with_format(|var, value| match value {
        Value::Headers(h) => Ok(format_add_headers(h)),
        other => Err(ProxyConfError::ValueShape {
            key: var.key.clone(),
            expected: "Headers",
            actual: other.shape(),
        }),
    })
}

pub fn memcache_servers() -> ConfVar {
    ConfVar::new(
        "memcache.:servers",
        None,
        Value::List(Vec::new()),
        ValueKind::Custom,
        OverrideSource::Custom,
        "List of known memcache servers (i.e. servers having memcached service enabled)",
    )
    .with_update(|_, s| upstream::memcache_servers(s.directory, s.resolver, s.ip_mode).map(Value::List))
    .with_format(|var, value| Ok(format_memcache_servers(list_value(var, value)?)))
}

pub fn lookup_handlers() -> ConfVar {
    ConfVar::new(
        "zmlookup.:handlers",
        Some("zimbraReverseProxyLookupTarget"),
        Value::List(Vec::new()),
        ValueKind::Custom,
        OverrideSource::Custom,
        "List of nginx lookup handlers (i.e. servers for which zimbraReverseProxyLookupTarget is true)",
    )
    .with_update(|_, s| {
        upstream::lookup_handlers(s.directory, s.server, s.resolver, s.ip_mode).map(Value::List)
    })
    .with_format(|var, value| Ok(format_lookup_handlers(list_value(var, value)?)))
}

pub fn lookup_available() -> ConfVar {
    computed_enabler(
        "lookup.available",
        None,
        false,
        "Indicates whether there are available lookup handlers or not",
        |s| Ok(!upstream::lookup_handlers(s.directory, s.server, s.resolver, s.ip_mode)?.is_empty()),
    )
}

pub fn web_available() -> ConfVar {
    computed_enabler(
        "web.available",
        None,
        false,
        "Indicates whether there are available web client servers or not",
        |s| {
            let servers = upstream::upstream_servers(
                s.directory,
                s.config,
                s.server,
                Pool::WebClient,
                PortSource::Indirect(attrs::HTTP_PORT_ATTRIBUTE),
            )?;
            Ok(!servers.is_empty())
        },
    )
}

/// Client certificate verification requested at server level.
pub fn server_client_cert_verify(sources: &Sources<'_>) -> bool {
    let mode = sources.server.get_attr_or(attrs::CLIENT_CERT_MODE, "off");
    mode == "on" || mode == "optional"
}

pub fn sso_certauth_default_enabler() -> ConfVar {
    computed_enabler(
        "web.sso.certauth.default.enabled",
        None,
        false,
        "whether to turn on certauth in global/server level",
        |s| Ok(server_client_cert_verify(s)),
    )
}

pub fn sso_enabler() -> ConfVar {
    computed_enabler(
        "web.sso.enabled",
        Some(attrs::CLIENT_CERT_MODE),
        false,
        "whether enable sso for domain level",
        |s| Ok(s.domains.client_cert_verify_enabled()),
    )
}

pub fn sso_default_enabler() -> ConfVar {
    computed_enabler(
        "web.sso.default.enabled",
        Some(attrs::CLIENT_CERT_MODE),
        false,
        "whether enable sso for global/server level",
        |s| Ok(server_client_cert_verify(s)),
    )
}

pub fn sso_redirect_enabler() -> ConfVar {
    computed_enabler(
        "web.sso.redirect.enabled.default",
        Some(attrs::WEB_CLIENT_LOGIN_URL),
        false,
        "whether to redirect from common http & https to https sso",
        |s| {
            Ok(s.server
                .get_attr(attrs::WEB_CLIENT_LOGIN_URL)
                .is_some_and(|url| !url.is_empty()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Entry;
    use crate::vars::var::tests::Fixture;

    fn resolved(mut var: ConfVar, fx: &Fixture) -> String {
        var.update(&fx.sources()).unwrap();
        var.conf_value().unwrap()
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&[
            "X-Frame-Options: DENY".to_string(),
            "Strict-Transport-Security:   max-age=31536000".to_string(),
            "garbage-without-colon".to_string(),
            "NoSpace:value".to_string(),
        ]);
        assert_eq!(headers[0].key, "X-Frame-Options");
        assert_eq!(headers[0].value, "DENY");
        assert_eq!(headers[1].value, "max-age=31536000");
        assert_eq!(headers[2].key, UNKNOWN_HEADER_NAME);
        assert_eq!(headers[2].value, "garbage-without-colon");
        assert_eq!(headers[3].key, UNKNOWN_HEADER_NAME);
    }

    #[test]
    fn test_format_add_headers() {
        let headers = parse_headers(&["A: 1".to_string(), "B: 2".to_string()]);
        assert_eq!(format_add_headers(&headers), "add_header A 1;\n    add_header B 2;");
        assert_eq!(format_add_headers(&[]), "");
    }

    #[test]
    fn test_capabilities_default_and_override() {
        let fx = Fixture::new(Entry::new("config"), Entry::new("proxy"));
        assert_eq!(
            resolved(pop3_capabilities(), &fx),
            " \"TOP\" \"USER\" \"UIDL\" \"EXPIRE 31 USER\""
        );

        let server = Entry::new("proxy")
            .with_multi_attr("zimbraReverseProxyImapEnabledCapability", ["IMAP4rev1", "IDLE"]);
        let fx = Fixture::new(Entry::new("config"), server);
        assert_eq!(resolved(imap_capabilities(), &fx), " \"IMAP4rev1\" \"IDLE\"");
    }

    #[test]
    fn test_ssl_protocols() {
        let fx = Fixture::new(Entry::new("config"), Entry::new("proxy"));
        assert_eq!(
            resolved(ssl_protocols("web.ssl.protocols", "web"), &fx),
            " TLSv1 TLSv1.1 TLSv1.2"
        );
    }

    #[test]
    fn test_greeting_exposes_version() {
        let server = Entry::new("proxy").with_attr("zimbraReverseProxyImapExposeVersionOnBanner", "TRUE");
        let fx = Fixture::new(Entry::new("config"), server);
        let text = resolved(imap_greeting(), &fx);
        assert_eq!(text, format!("* OK Zimbra {} IMAP4 ready", fx.build.version));
        assert_eq!(resolved(pop3_greeting(), &fx), "");
    }

    #[test]
    fn test_timeout_offset_and_seconds() {
        let mut fx = Fixture::new(Entry::new("config"), Entry::new("proxy"));
        fx.local = crate::directory::LocalConfig::from_pairs([("imap_authenticated_max_idle_time", "600")]);
        let var = timeout_with_offset("mail.imap.proxytimeout", "imap_authenticated_max_idle_time", 1800, 300, "t");
        assert_eq!(resolved(var, &fx), "900");

        let server = Entry::new("proxy").with_attr("zimbraReverseProxyUpstreamReadTimeout", "2m");
        let fx = Fixture::new(Entry::new("config"), server);
        let var = time_in_seconds(
            "web.upstream.read.timeout",
            "zimbraReverseProxyUpstreamReadTimeout",
            60_000,
            OverrideSource::Server,
            "read",
        );
        assert_eq!(resolved(var, &fx), "120");
    }

    #[test]
    fn test_error_pages() {
        let fx = Fixture::new(Entry::new("config"), Entry::new("proxy"));
        assert_eq!(
            resolved(error_pages(), &fx),
            "error_page 502 /zmerror_upstream_502.html;\nerror_page 504 /zmerror_upstream_504.html;\n"
        );

        let server = Entry::new("proxy").with_attr("zimbraReverseProxyErrorHandlerURL", "/err");
        let fx = Fixture::new(Entry::new("config"), server);
        assert!(resolved(error_pages(), &fx)
            .starts_with("error_page 502 /err?err=502&up=$upstream_addr;\n"));
    }

    #[test]
    fn test_mail_mode_enablers() {
        let server = Entry::new("proxy").with_attr("zimbraReverseProxyMailMode", "HTTPS");
        let fx = Fixture::new(Entry::new("config"), server);
        assert_eq!(resolved(http_enabler(), &fx), "#");
        assert_eq!(resolved(https_enabler(), &fx), "");
    }

    #[test]
    fn test_upstream_target_schemes() {
        let server = Entry::new("proxy").with_attr(SSL_TO_UPSTREAM_ATTR, "FALSE");
        let fx = Fixture::new(Entry::new("config"), server);
        let var = upstream_target("web.upstream.target", upstream_names::WEB, upstream_names::WEB_SSL, "t");
        assert_eq!(resolved(var, &fx), "http://zimbra");

        let fx = Fixture::new(Entry::new("config"), Entry::new("proxy"));
        let var = upstream_target("web.upstream.zx", upstream_names::ZX, upstream_names::ZX_SSL, "t");
        assert_eq!(resolved(var, &fx), "https://zx_ssl");
        assert_eq!(resolved(xmpp_upstream_proto(), &fx), "https");
    }

    #[test]
    fn test_fair_shm_minimum() {
        let server = Entry::new("proxy").with_attr("zimbraReverseProxyUpstreamFairShmSize", "16");
        let fx = Fixture::new(Entry::new("config"), server);
        assert_eq!(resolved(fair_shm_size(), &fx), "upstream_fair_shm_size 32k;");

        let server = Entry::new("proxy").with_attr("zimbraReverseProxyUpstreamFairShmSize", "64");
        let fx = Fixture::new(Entry::new("config"), server);
        assert_eq!(resolved(fair_shm_size(), &fx), "upstream_fair_shm_size 64k;");

        let server = Entry::new("proxy").with_attr("zimbraReverseProxyUpstreamFairShmSize", "big");
        let fx = Fixture::new(Entry::new("config"), server);
        assert_eq!(resolved(fair_shm_size(), &fx), "upstream_fair_shm_size 32k;");
    }

    #[test]
    fn test_listen_addresses() {
        let mut fx = Fixture::new(Entry::new("config"), Entry::new("proxy"));
        assert_eq!(resolved(listen_addresses(), &fx), "${web.strict.servername}");

        fx.domains.listen_addresses.insert("10.0.0.2".to_string());
        fx.domains.listen_addresses.insert("10.0.0.1".to_string());
        assert_eq!(
            resolved(listen_addresses(), &fx),
            "${web.strict.servername}    listen                  10.0.0.1:${web.https.port} default_server;\n\
             ${web.strict.servername}    listen                  10.0.0.2:${web.https.port} default_server;"
        );
    }

    #[test]
    fn test_populated_and_xmpp_enablers() {
        let server = Entry::new("proxy").with_multi_attr(attrs::UPSTREAM_EWS_SERVERS, ["mbs1"]);
        let fx = Fixture::new(Entry::new("config"), server);
        let ews = populated_enabler("web.ews.upstream.disable", attrs::UPSTREAM_EWS_SERVERS, "ews");
        let login = populated_enabler("web.login.upstream.disable", attrs::UPSTREAM_LOGIN_SERVERS, "login");
        assert_eq!(resolved(ews, &fx), "");
        assert_eq!(resolved(login, &fx), "#");
        assert_eq!(resolved(xmpp_bosh_enabler(), &fx), "#");

        let server = Entry::new("proxy")
            .with_attr("zimbraReverseProxyXmppBoshEnabled", "TRUE")
            .with_attr("zimbraReverseProxyXmppBoshLocalHttpBindURL", "/http-bind")
            .with_attr("zimbraReverseProxyXmppBoshHostname", "xmpp.example.com")
            .with_attr("zimbraReverseProxyXmppBoshPort", "5280");
        let fx = Fixture::new(Entry::new("config"), server);
        assert_eq!(resolved(xmpp_bosh_enabler(), &fx), "");
    }

    #[test]
    fn test_sso_enablers() {
        let server = Entry::new("proxy").with_attr(attrs::CLIENT_CERT_MODE, "optional");
        let fx = Fixture::new(Entry::new("config"), server);
        assert_eq!(resolved(sso_default_enabler(), &fx), "");
        assert_eq!(resolved(sso_certauth_default_enabler(), &fx), "");
        assert_eq!(resolved(sso_enabler(), &fx), "#");
        assert_eq!(resolved(sso_redirect_enabler(), &fx), "#");
    }

    #[test]
    fn test_default_add_headers_from_config() {
        let config = Entry::new("config")
            .with_multi_attr(attrs::RESPONSE_HEADERS, ["X-Frame-Options: DENY"]);
        let fx = Fixture::new(config, Entry::new("proxy"));
        assert_eq!(
            resolved(default_add_headers(), &fx),
            "add_header X-Frame-Options DENY;"
        );
    }

    #[test]
    fn test_client_ca_vars() {
        let fx = Fixture::new(Entry::new("config"), Entry::new("proxy"));
        let var = client_cert_ca_default(&fx.paths.default_client_ca());
        assert_eq!(resolved(var, &fx), "/opt/zimbra/conf/nginx.client.ca.crt");
        assert_eq!(resolved(client_cert_ca_enabled(false), &fx), "#");
        assert_eq!(resolved(client_cert_ca_enabled(true), &fx), "");
    }
}
