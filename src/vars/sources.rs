//! Everything a variable may read while resolving.

use crate::collect::{DomainCollection, ServerAttrItem};
use crate::config::schema::BuildConfig;
use crate::directory::{Directory, Entry, HostResolver, IpMode, LocalConfig};
use crate::generator::Paths;

/// Request-scoped resolution context, built once per run.
pub struct Sources<'a> {
    pub directory: &'a dyn Directory,
    /// Global configuration entry.
    pub config: &'a Entry,
    /// Effective server entry (local host or `-s`).
    pub server: &'a Entry,
    pub local: &'a LocalConfig,
    pub resolver: &'a dyn HostResolver,
    pub ip_mode: IpMode,
    pub domains: &'a DomainCollection,
    pub servers: &'a [ServerAttrItem],
    pub paths: &'a Paths,
    pub build: &'a BuildConfig,
}
