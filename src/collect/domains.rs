//! Per-virtual-host domain items.
//!
//! # Data Flow
//! ```text
//! directory domains (projected attrs)
//!     → skip: no virtual hostname, or no cert/key/client-cert settings
//!     → explicit VIPs → listen address set
//!     → one item per virtual hostname (VIP paired by position / first VIP / DNS)
//!     → address resolved now, failures kept as DomainSlot::Failed
//! ```
//!
//! # Design Decisions
//! - All DNS work happens here, before any output is written
//! - A per-domain failure does not abort collection; it aborts the first
//!   template that explodes over it

use std::collections::BTreeSet;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::directory::{attrs, Directory, HostResolver, IpMode};
use crate::error::{ProxyConfError, Result};
use crate::vars::custom::{format_add_headers, parse_headers};
use crate::vars::VarMap;

/// Domain attributes read from the directory.
pub const DOMAIN_ATTRS: &[&str] = &[
    attrs::DOMAIN_NAME,
    attrs::VIRTUAL_HOSTNAME,
    attrs::VIRTUAL_IP,
    attrs::SSL_CERTIFICATE,
    attrs::SSL_PRIVATE_KEY,
    attrs::CLIENT_CERT_MODE,
    attrs::CLIENT_CERT_CA,
    attrs::WEB_CLIENT_LOGIN_URL,
    attrs::RESPONSE_HEADERS,
];

/// Variables set for each domain item during an explosion.
pub const DOMAIN_SCOPED_KEYS: &[&str] = &[
    "vhn",
    "vip",
    "web.add.headers.vhost",
    "ssl.crt",
    "ssl.key",
    "ssl.clientcertmode",
    "web.sso.certauth.enabled",
    "ssl.clientcertca",
];

/// One virtual hostname of a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAttrItem {
    pub domain_name: String,
    pub virtual_hostname: String,
    /// Configured virtual IP, if any.
    pub virtual_ip: Option<String>,
    /// Address the vhost resolved to during collection.
    pub resolved_ip: Option<IpAddr>,
    pub ssl_certificate: Option<String>,
    pub ssl_private_key: Option<String>,
    pub client_cert_mode: Option<String>,
    pub client_cert_ca: Option<String>,
    pub response_headers: Vec<String>,
}

impl DomainAttrItem {
    /// Client certificate verification is `on` or `optional`.
    pub fn client_cert_verify_enabled(&self) -> bool {
        matches!(self.client_cert_mode.as_deref(), Some("on") | Some("optional"))
    }
}

/// A collected item, or a failure to raise when a template reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainSlot {
    Item(DomainAttrItem),
    Failed { domain: String, reason: String },
}

impl DomainSlot {
    pub fn item(&self) -> Option<&DomainAttrItem> {
        match self {
            DomainSlot::Item(item) => Some(item),
            DomainSlot::Failed { .. } => None,
        }
    }

    /// The item, or the recorded failure as an error.
    pub fn require(&self) -> Result<&DomainAttrItem> {
        match self {
            DomainSlot::Item(item) => Ok(item),
            DomainSlot::Failed { domain, reason } => Err(ProxyConfError::DomainFailed {
                domain: domain.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Result of domain collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainCollection {
    pub slots: Vec<DomainSlot>,
    /// Explicit virtual IPs, deduplicated and ordered.
    pub listen_addresses: BTreeSet<String>,
}

impl DomainCollection {
    pub fn items(&self) -> impl Iterator<Item = &DomainAttrItem> {
        self.slots.iter().filter_map(DomainSlot::item)
    }

    pub fn client_cert_verify_enabled(&self) -> bool {
        self.items().any(DomainAttrItem::client_cert_verify_enabled)
    }
}

/// Walks directory domains and builds the collection.
pub struct DomainCollector<'a> {
    pub directory: &'a dyn Directory,
    pub resolver: &'a dyn HostResolver,
    pub ip_mode: IpMode,
    /// Unresolvable virtual hosts are failures instead of warnings.
    pub enforce_dns: bool,
    pub domain_ssl_dir: &'a Path,
}

impl DomainCollector<'_> {
    /// Collect items; empty unless per-virtual-host generation is on.
    pub fn collect(&self, per_vhost: bool) -> Result<DomainCollection> {
        let mut collection = DomainCollection::default();
        if !per_vhost {
            return Ok(collection);
        }

        for domain in self.directory.all_domains(DOMAIN_ATTRS)? {
            let name = domain.get_attr_or(attrs::DOMAIN_NAME, domain.name());
            let hostnames = domain.get_multi_attr(attrs::VIRTUAL_HOSTNAME);
            let vips = domain.get_multi_attr(attrs::VIRTUAL_IP);
            let cert = domain.get_attr(attrs::SSL_CERTIFICATE).map(str::to_string);
            let key = domain.get_attr(attrs::SSL_PRIVATE_KEY).map(str::to_string);
            let mode = domain.get_attr(attrs::CLIENT_CERT_MODE).map(str::to_string);
            let ca = domain.get_attr(attrs::CLIENT_CERT_CA).map(str::to_string);
            let headers = domain.get_multi_attr(attrs::RESPONSE_HEADERS).to_vec();

            if hostnames.is_empty()
                || (cert.is_none() && key.is_none() && mode.is_none() && ca.is_none())
            {
                tracing::debug!(domain = %name, "Skipping domain without virtual host SSL settings");
                continue;
            }

            collection.listen_addresses.extend(vips.iter().cloned());

            for (i, vhn) in hostnames.iter().enumerate() {
                let vip = match vips.len() {
                    0 => None,
                    n if n == hostnames.len() => Some(vips[i].clone()),
                    _ => Some(vips[0].clone()),
                };

                if ca.as_deref().map(|c| !c.is_empty()).unwrap_or(false) {
                    if let Err(e) = fs::create_dir_all(self.domain_ssl_dir) {
                        collection.slots.push(DomainSlot::Failed {
                            domain: name.clone(),
                            reason: format!(
                                "cannot create {}: {e}",
                                self.domain_ssl_dir.display()
                            ),
                        });
                        continue;
                    }
                }

                let slot = match self.resolve(vhn, vip.as_deref()) {
                    Ok(resolved_ip) => DomainSlot::Item(DomainAttrItem {
                        domain_name: name.clone(),
                        virtual_hostname: vhn.clone(),
                        virtual_ip: vip,
                        resolved_ip,
                        ssl_certificate: cert.clone(),
                        ssl_private_key: key.clone(),
                        client_cert_mode: mode.clone(),
                        client_cert_ca: ca.clone(),
                        response_headers: headers.clone(),
                    }),
                    Err(reason) => DomainSlot::Failed {
                        domain: name.clone(),
                        reason,
                    },
                };
                collection.slots.push(slot);
            }
        }

        tracing::info!(
            items = collection.slots.len(),
            listen_addresses = collection.listen_addresses.len(),
            "Loaded domain virtual host attributes"
        );
        Ok(collection)
    }

    fn resolve(&self, vhn: &str, vip: Option<&str>) -> std::result::Result<Option<IpAddr>, String> {
        let target = vip.unwrap_or(vhn);
        let ip = match self.resolver.resolve(target) {
            Ok(addrs) => addrs.first().copied(),
            Err(e) => {
                tracing::debug!(host = %target, error = %e, "Resolution failed");
                None
            }
        };

        let Some(ip) = ip else {
            let err = ProxyConfError::Resolution(format!(
                "virtual host name \"{vhn}\" is not resolvable"
            ));
            if self.enforce_dns {
                tracing::error!(vhn = %vhn, "{}", err);
                return Err(err.to_string());
            }
            tracing::warn!(vhn = %vhn, "{}", err);
            return Ok(None);
        };

        let mismatch = match (self.ip_mode, ip) {
            (IpMode::Ipv4, IpAddr::V6(_)) => Some(("IPv6", "ipv4")),
            (IpMode::Ipv6, IpAddr::V4(_)) => Some(("IPv4", "ipv6")),
            _ => None,
        };
        if let Some((family, mode)) = mismatch {
            let err = ProxyConfError::IpModeMismatch {
                address: ip.to_string(),
                family,
                mode,
            };
            tracing::error!(vhn = %vhn, "{}", err);
            return Err(err.to_string());
        }
        Ok(Some(ip))
    }
}

/// Inputs for per-item variables that do not vary per item.
#[derive(Debug, Clone)]
pub struct DomainVarContext {
    /// `zimbraReverseProxySNIEnabled` on the effective server.
    pub sni: bool,
    pub domain_ssl_dir: PathBuf,
}

/// Set the domain-scoped variables for one item.
pub fn apply_domain_vars(item: &DomainAttrItem, ctx: &DomainVarContext, vars: &mut VarMap) {
    vars.set("vhn", item.virtual_hostname.as_str());

    let vip = match item.resolved_ip {
        Some(IpAddr::V6(v6)) if !ctx.sni => format!("[{v6}]:"),
        Some(IpAddr::V6(_)) => "[::]:".to_string(),
        Some(IpAddr::V4(v4)) if !ctx.sni => format!("{v4}:"),
        _ => String::new(),
    };
    vars.set("vip", vip);

    vars.set(
        "web.add.headers.vhost",
        format_add_headers(&parse_headers(&item.response_headers)),
    );

    let domain_file = |ext: &str| {
        ctx.domain_ssl_dir
            .join(format!("{}{ext}", item.domain_name))
            .display()
            .to_string()
    };
    let default_of = |vars: &VarMap, key: &str| vars.get(key).unwrap_or_default().to_string();

    let crt = match item.ssl_certificate {
        Some(_) => domain_file(".crt"),
        None => default_of(vars, "ssl.crt.default"),
    };
    vars.set("ssl.crt", crt);

    let key = match item.ssl_private_key {
        Some(_) => domain_file(".key"),
        None => default_of(vars, "ssl.key.default"),
    };
    vars.set("ssl.key", key);

    match &item.client_cert_mode {
        Some(mode) => {
            vars.set("ssl.clientcertmode", mode.as_str());
            let enabled = if item.client_cert_verify_enabled() { "" } else { "#" };
            vars.set("web.sso.certauth.enabled", enabled);
        }
        None => {
            let mode = default_of(vars, "ssl.clientcertmode.default");
            vars.set("ssl.clientcertmode", mode);
            let enabled = default_of(vars, "web.sso.certauth.default.enabled");
            vars.set("web.sso.certauth.enabled", enabled);
        }
    }

    let ca = match item.client_cert_ca {
        Some(_) => domain_file(".client.ca.crt"),
        None => default_of(vars, "ssl.clientcertca.default"),
    };
    vars.set("ssl.clientcertca", ca);
}
