//! Read-only access to the provisioning directory.
//!
//! # Data Flow
//! ```text
//! snapshot file (TOML/JSON)
//!     → snapshot.rs (SnapshotDirectory)
//!     → Directory trait (global config, servers, domains)
//!     → vars / collect (attribute reads)
//!
//! localconfig file → local.rs (LocalConfig)
//! host names       → dns.rs (HostResolver)
//! ```
//!
//! # Design Decisions
//! - The generator only sees the `Directory` trait; the store behind it is
//!   somebody else's service
//! - Entries are owned copies, read once per run
//! - Attribute values are strings; typed getters parse on read

use thiserror::Error;

pub mod dns;
pub mod entry;
pub mod local;
pub mod snapshot;

pub use dns::{HostResolver, IpMode, SystemResolver};
pub use entry::Entry;
pub use local::LocalConfig;
pub use snapshot::SnapshotDirectory;

/// Attribute names read outside the variable table.
pub mod attrs {
    pub const SERVICE_HOSTNAME: &str = "zimbraServiceHostname";
    pub const SERVICE_ENABLED: &str = "zimbraServiceEnabled";
    pub const ID: &str = "zimbraId";
    pub const DOMAIN_NAME: &str = "zimbraDomainName";
    pub const SERVER_VERSION: &str = "zimbraServerVersion";
    pub const IP_MODE: &str = "zimbraIPMode";
    pub const MAIL_MODE: &str = "zimbraMailMode";
    pub const LOOKUP_TARGET: &str = "zimbraReverseProxyLookupTarget";
    pub const RECONNECT_TIMEOUT: &str = "zimbraMailProxyReconnectTimeout";
    pub const MAX_FAILS: &str = "zimbraMailProxyMaxFails";
    pub const GEN_CONFIG_PER_VHN: &str = "zimbraReverseProxyGenConfigPerVirtualHostname";
    pub const VIRTUAL_HOSTNAME: &str = "zimbraVirtualHostname";
    pub const VIRTUAL_IP: &str = "zimbraVirtualIPAddress";
    pub const SSL_CERTIFICATE: &str = "zimbraSSLCertificate";
    pub const SSL_PRIVATE_KEY: &str = "zimbraSSLPrivateKey";
    pub const CLIENT_CERT_MODE: &str = "zimbraReverseProxyClientCertMode";
    pub const CLIENT_CERT_CA: &str = "zimbraReverseProxyClientCertCA";
    pub const WEB_CLIENT_LOGIN_URL: &str = "zimbraWebClientLoginURL";
    pub const RESPONSE_HEADERS: &str = "zimbraReverseProxyResponseHeaders";
    pub const SNI_ENABLED: &str = "zimbraReverseProxySNIEnabled";
    pub const HTTP_PORT_ATTRIBUTE: &str = "zimbraReverseProxyHttpPortAttribute";
    pub const HTTPS_PORT_ATTRIBUTE: &str = "zimbraReverseProxyHttpSSLPortAttribute";
    pub const ADMIN_PORT_ATTRIBUTE: &str = "zimbraReverseProxyAdminPortAttribute";
    pub const UPSTREAM_EWS_SERVERS: &str = "zimbraReverseProxyUpstreamEwsServers";
    pub const UPSTREAM_LOGIN_SERVERS: &str = "zimbraReverseProxyUpstreamLoginServers";
    pub const AVAILABLE_LOOKUP_TARGETS: &str = "zimbraReverseProxyAvailableLookupTargets";
    pub const MEMCACHED_BIND_PORT: &str = "zimbraMemcachedBindPort";
    pub const EXTENSION_BIND_PORT: &str = "zimbraExtensionBindPort";
}

/// Service tags found in `zimbraServiceEnabled`.
pub mod services {
    /// Mailbox web application, backs the mail-client pool.
    pub const MAILSTORE: &str = "service";
    pub const WEBCLIENT: &str = "zimbra";
    pub const ADMINCLIENT: &str = "zimbraAdmin";
    pub const MEMCACHED: &str = "memcached";
}

/// Errors raised by directory adapters.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read directory snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse directory data: {0}")]
    Parse(String),

    #[error("directory snapshot does not name a local server")]
    NoLocalServer,

    #[error("local server {0} is not present in the directory")]
    LocalServerMissing(String),
}

/// How a server is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerBy {
    Id(String),
    Name(String),
}

impl ServerBy {
    /// A UUID is taken as a server id, anything else as a service hostname.
    pub fn guess(key: &str) -> Self {
        if uuid::Uuid::parse_str(key).is_ok() {
            ServerBy::Id(key.to_string())
        } else {
            ServerBy::Name(key.to_string())
        }
    }
}

/// Read-only view of the provisioning directory.
pub trait Directory {
    /// The global configuration entry.
    fn global_config(&self) -> Result<Entry, DirectoryError>;

    /// The server this generator runs on.
    fn local_server(&self) -> Result<Entry, DirectoryError>;

    fn get_server(&self, by: &ServerBy) -> Result<Option<Entry>, DirectoryError>;

    /// Every server, in directory order.
    fn all_servers(&self) -> Result<Vec<Entry>, DirectoryError>;

    /// Every domain, projected onto `attrs`.
    fn all_domains(&self, attrs: &[&str]) -> Result<Vec<Entry>, DirectoryError>;

    /// Servers with `service` in `zimbraServiceEnabled`.
    fn servers_with_service(&self, service: &str) -> Result<Vec<Entry>, DirectoryError> {
        Ok(self
            .all_servers()?
            .into_iter()
            .filter(|s| {
                s.get_multi_attr(attrs::SERVICE_ENABLED)
                    .iter()
                    .any(|v| v == service)
            })
            .collect())
    }

    fn server_by_name(&self, name: &str) -> Result<Option<Entry>, DirectoryError> {
        self.get_server(&ServerBy::Name(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_server_by() {
        assert_eq!(
            ServerBy::guess("1b4e28ba-2fa1-11d2-883f-0016d3cca427"),
            ServerBy::Id("1b4e28ba-2fa1-11d2-883f-0016d3cca427".to_string())
        );
        assert_eq!(
            ServerBy::guess("mbs1.example.com"),
            ServerBy::Name("mbs1.example.com".to_string())
        );
    }
}
