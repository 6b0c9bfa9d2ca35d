//! Upstream server lists for the web, memcache and lookup roles.
//!
//! # Responsibilities
//! - Decide which servers are valid upstreams
//! - Render `server` directives per role and port
//! - Resolve memcache servers and route lookup handlers by IP mode
//!
//! # Design Decisions
//! - Invalid upstreams are skipped with a warning, never fatal
//! - Role lists are recomputed on demand from the directory (they are cheap
//!   and several enablers derive from them)

use crate::directory::dns::{format_host_port, lookup_target_ip};
use crate::directory::{attrs, services, Directory, Entry, HostResolver, IpMode};
use crate::error::{ProxyConfError, Result};

/// Fixed zx upstream ports.
pub const ZX_HTTP_PORT: i32 = 8742;
pub const ZX_HTTPS_PORT: i32 = 8743;

const MEMCACHED_DEFAULT_PORT: i32 = 11211;
const EXTENSION_DEFAULT_PORT: i32 = 7072;
const LOOKUP_PATH: &str = "/service/extension/nginx-lookup";

/// Which servers feed an upstream list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// Servers running the mailstore web application.
    MailClient,
    WebClient,
    AdminClient,
    /// Host names listed in a multi-valued attribute of the effective server.
    Named(&'static str),
}

/// Where an upstream's port comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSource {
    /// Global config attribute naming the server attribute that holds the port.
    Indirect(&'static str),
    Fixed(i32),
}

/// Server must be a lookup target with a web-capable mail mode.
pub fn is_valid_upstream(server: &Entry, name: &str) -> bool {
    if !server.get_bool_attr(attrs::LOOKUP_TARGET, false) {
        return false;
    }
    let mode = server.get_attr_or(attrs::MAIL_MODE, "");
    let valid = ["http", "mixed", "both", "redirect", "https"]
        .iter()
        .any(|m| mode.eq_ignore_ascii_case(m));
    if !valid {
        let shown = if mode.is_empty() { "EMPTY" } else { mode.as_str() };
        tracing::warn!(
            server = %name,
            mail_mode = %shown,
            "Upstream: Ignoring server because of its mail mode"
        );
    }
    valid
}

/// `host:port fail_timeout=Ns[ max_fails=N][ version=V]`.
pub fn server_directive(server: &Entry, name: &str, port: i32) -> String {
    let timeout = server.get_int_attr(attrs::RECONNECT_TIMEOUT, 60);
    let version = server.get_attr_or(attrs::SERVER_VERSION, "");
    let max_fails = server.get_int_attr(attrs::MAX_FAILS, 1);

    let mut directive = format!("{name}:{port} fail_timeout={timeout}s");
    if max_fails != 1 {
        directive.push_str(&format!(" max_fails={max_fails}"));
    }
    if !version.is_empty() {
        directive.push_str(&format!(" version={version}"));
    }
    directive
}

fn pool_servers(directory: &dyn Directory, server: &Entry, pool: Pool) -> Result<Vec<(String, Entry)>> {
    let entries = match pool {
        Pool::MailClient => directory.servers_with_service(services::MAILSTORE)?,
        Pool::WebClient => directory.servers_with_service(services::WEBCLIENT)?,
        Pool::AdminClient => directory.servers_with_service(services::ADMINCLIENT)?,
        Pool::Named(attr) => {
            let mut found = Vec::new();
            for name in server.get_multi_attr(attr) {
                match directory.server_by_name(name)? {
                    Some(entry) => found.push((name.clone(), entry)),
                    None => tracing::warn!(server = %name, attribute = attr, "Upstream: Unknown server"),
                }
            }
            return Ok(found);
        }
    };
    Ok(entries
        .into_iter()
        .map(|e| (e.get_attr_or(attrs::SERVICE_HOSTNAME, ""), e))
        .collect())
}

/// Directives for every valid upstream in `pool`.
pub fn upstream_servers(
    directory: &dyn Directory,
    config: &Entry,
    server: &Entry,
    pool: Pool,
    port: PortSource,
) -> Result<Vec<String>> {
    let port_attr = match port {
        PortSource::Indirect(attr) => Some(config.get_attr_or(attr, "")),
        PortSource::Fixed(_) => None,
    };

    let mut directives = Vec::new();
    for (name, entry) in pool_servers(directory, server, pool)? {
        if !is_valid_upstream(&entry, &name) {
            continue;
        }
        let port = match (&port_attr, port) {
            (Some(attr), _) => entry.get_int_attr(attr, 0),
            (None, PortSource::Fixed(p)) => p,
            (None, PortSource::Indirect(_)) => 0,
        };
        directives.push(server_directive(&entry, &name, port));
        tracing::debug!(server = %name, pool = ?pool, "Added server to upstream");
    }
    Ok(directives)
}

/// `server    a;\n        server    b;\n`.
pub fn format_server_list(servers: &[String]) -> String {
    servers
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == 0 {
                format!("server    {s};\n")
            } else {
                format!("        server    {s};\n")
            }
        })
        .collect()
}

/// `ip:port` of every resolvable memcached server; none at all is fatal.
pub fn memcache_servers(
    directory: &dyn Directory,
    resolver: &dyn HostResolver,
    mode: IpMode,
) -> Result<Vec<String>> {
    let mut servers = Vec::new();
    for mc in directory.servers_with_service(services::MEMCACHED)? {
        let name = mc.get_attr_or(attrs::SERVICE_HOSTNAME, "");
        let port = mc.get_int_attr(attrs::MEMCACHED_BIND_PORT, MEMCACHED_DEFAULT_PORT);
        match lookup_target_ip(resolver, mode, &name) {
            Ok(ip) => servers.push(format_host_port(ip, port)),
            Err(e) => tracing::error!(server = %name, error = %e, "Error resolving memcached host name"),
        }
    }
    if servers.is_empty() {
        return Err(ProxyConfError::NoMemcacheServers);
    }
    Ok(servers)
}

pub fn format_memcache_servers(servers: &[String]) -> String {
    servers.iter().map(|s| format!("  servers   {s};\n")).collect()
}

fn lookup_scheme(server: &Entry) -> &'static str {
    let major = server.get_int_attr("zimbraServerVersionMajor", 0);
    let minor = server.get_int_attr("zimbraServerVersionMinor", 0);
    if (major == 8 && minor >= 7) || major > 8 {
        "https://"
    } else {
        "http://"
    }
}

/// Route lookup handler endpoints (`scheme://ip:port`).
///
/// An empty result is fatal only when some handler failed to resolve.
pub fn lookup_handlers(
    directory: &dyn Directory,
    server: &Entry,
    resolver: &dyn HostResolver,
    mode: IpMode,
) -> Result<Vec<String>> {
    let named = server.get_multi_attr(attrs::AVAILABLE_LOOKUP_TARGETS);
    let candidates = if named.is_empty() {
        directory.all_servers()?
    } else {
        let mut found = Vec::new();
        for name in named {
            match directory.server_by_name(name)? {
                Some(entry) => found.push(entry),
                None => tracing::warn!(
                    handler = %name,
                    "Invalid value found in zimbraReverseProxyAvailableLookupTargets"
                ),
            }
        }
        found
    };

    let mut handlers = Vec::new();
    let mut failed = 0;
    for s in candidates {
        if !s.get_bool_attr(attrs::LOOKUP_TARGET, false) {
            continue;
        }
        let name = s.get_attr_or(attrs::SERVICE_HOSTNAME, "");
        let port = s.get_int_attr(attrs::EXTENSION_BIND_PORT, EXTENSION_DEFAULT_PORT);
        match lookup_target_ip(resolver, mode, &name) {
            Ok(ip) => {
                let handler = format!("{}{}", lookup_scheme(&s), format_host_port(ip, port));
                tracing::debug!(handler = %handler, "Route Lookup: Added server");
                handlers.push(handler);
            }
            Err(e) => {
                failed += 1;
                tracing::error!(server = %name, error = %e, "Error resolving service host name");
            }
        }
    }

    if handlers.is_empty() {
        if failed > 0 {
            return Err(ProxyConfError::NoLookupHandlers);
        }
        tracing::warn!("No available nginx lookup handlers could be found");
    }
    Ok(handlers)
}

pub fn format_lookup_handlers(handlers: &[String]) -> String {
    handlers
        .iter()
        .map(|h| format!("{h}{LOOKUP_PATH}"))
        .collect::<Vec<_>>()
        .join(" ")
}
